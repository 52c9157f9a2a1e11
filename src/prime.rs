use log::debug;
use num_bigint::{BigUint, RandBigInt};
use num_prime::nt_funcs::is_prime;
use num_traits::{One, ToPrimitive};
use rand_core::{CryptoRng, RngCore};
use crate::crypto::MIN_KEY_BITS;

/// Small primes below this bound are used to screen candidates
/// before running the probabilistic test.
const SIEVE_LIMIT: u32 = 2048;

/// A safe prime `p = 2q + 1` together with its Sophie Germain prime `q`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafePrime {
    pub p: BigUint,
    pub q: BigUint,
}

/// Odd primes up to and including `limit`.
pub fn small_primes(limit: u32) -> Vec<u32> {
    let limit = limit as usize;
    let mut composite = vec![false; limit + 1];
    let mut primes = vec![];
    for i in 3..=limit {
        if i % 2 == 0 || composite[i] {
            continue;
        }
        primes.push(i as u32);
        let mut j = i * i;
        while j <= limit {
            composite[j] = true;
            j += i;
        }
    }
    primes
}

/// Uniform sample from the inclusive range `[lo, hi]`.
pub fn random_in<R: RngCore + CryptoRng>(rng: &mut R, lo: &BigUint, hi: &BigUint) -> BigUint {
    rng.gen_biguint_range(lo, &(hi + 1u32))
}

/// Search for a safe prime with exactly `bits` bits.
///
/// Each attempt examines one candidate `q`. Runs of candidates start at a random
/// odd `q` of `bits - 1` bits and step by two, with residues modulo the small
/// primes updated incrementally so most candidates are rejected without any
/// big-number arithmetic. Returns `None` once `max_attempts` candidates failed,
/// or straight away when `bits` is below `MIN_KEY_BITS`.
pub fn find_safe_prime<R: RngCore + CryptoRng>(rng: &mut R, bits: u64, max_attempts: usize) -> Option<SafePrime> {
    if bits < MIN_KEY_BITS {
        return None;
    }
    let sieve = small_primes(SIEVE_LIMIT);
    let q_bits = bits - 1;
    let mut attempts = 0usize;

    while attempts < max_attempts {
        let mut q = rng.gen_biguint(q_bits);
        q |= BigUint::one() << (q_bits as usize - 1);
        q |= BigUint::one();
        let mut residues: Vec<u32> = sieve.iter()
            .map(|&sp| (&q % sp).to_u32().unwrap_or_default())
            .collect();

        while attempts < max_attempts && q.bits() == q_bits {
            attempts += 1;
            if passes_sieve(&sieve, &residues) {
                let p = (&q << 1usize) + 1u32;
                if is_prime(&q, None).probably() && is_prime(&p, None).probably() {
                    debug!("found {}-bit safe prime after {} attempts", bits, attempts);
                    return Some(SafePrime { p, q });
                }
            }
            q += 2u32;
            for (r, &sp) in residues.iter_mut().zip(&sieve) {
                *r = (*r + 2) % sp;
            }
        }
        debug!("safe prime search restarting after {} attempts", attempts);
    }
    None
}

// Candidates are always larger than SIEVE_LIMIT, so a zero residue means composite.
fn passes_sieve(sieve: &[u32], residues: &[u32]) -> bool {
    sieve.iter().zip(residues).all(|(&sp, &r)| {
        r != 0 && (2 * r + 1) % sp != 0
    })
}

/// Pick a generator of the order-`q` subgroup of quadratic residues mod `p`.
pub fn subgroup_generator<R: RngCore + CryptoRng>(rng: &mut R, p: &BigUint) -> BigUint {
    let two = BigUint::from(2u32);
    let upper = p - 2u32;
    loop {
        let h = random_in(rng, &two, &upper);
        let g = h.modpow(&two, p);
        if !g.is_one() {
            return g;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_small_primes() {
        assert_eq!(small_primes(30), vec![3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(small_primes(2).is_empty());
        assert_eq!(small_primes(SIEVE_LIMIT).last(), Some(&2039));
    }

    #[test]
    fn test_find_safe_prime() {
        let mut rng = ChaChaRng::seed_from_u64(7);
        for bits in [16u64, 32, 64, 128] {
            let SafePrime { p, q } = find_safe_prime(&mut rng, bits, 100_000).unwrap();
            assert_eq!(p.bits(), bits);
            assert_eq!(p, &q * 2u32 + 1u32);
            assert!(is_prime(&p, None).probably());
            assert!(is_prime(&q, None).probably());
        }
    }

    #[test]
    fn test_find_safe_prime_gives_up() {
        let mut rng = ChaChaRng::seed_from_u64(7);
        assert_eq!(find_safe_prime(&mut rng, 256, 1), None);
        assert_eq!(find_safe_prime(&mut rng, 256, 0), None);
    }

    #[test]
    fn test_find_safe_prime_too_few_bits() {
        let mut rng = ChaChaRng::seed_from_u64(7);
        for bits in [0u64, 1, 2, MIN_KEY_BITS - 1] {
            assert_eq!(find_safe_prime(&mut rng, bits, 100_000), None);
        }
    }

    #[test]
    fn test_subgroup_generator() {
        let mut rng = ChaChaRng::from_entropy();
        let SafePrime { p, q } = find_safe_prime(&mut rng, 64, 100_000).unwrap();
        for _ in 0..10 {
            let g = subgroup_generator(&mut rng, &p);
            assert!(!g.is_one());
            assert!(g.modpow(&q, &p).is_one());
        }
    }

    #[quickcheck]
    fn quickcheck_random_in(lo: u64, span: u32) -> TestResult {
        if span == 0 {
            return TestResult::discard();
        }
        let mut rng = ChaChaRng::from_entropy();
        let lo = BigUint::from(lo);
        let hi = &lo + span;
        let x = random_in(&mut rng, &lo, &hi);
        TestResult::from_bool(x >= lo && x <= hi)
    }
}
