use std::fmt;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use crate::error::Error;

/// Smallest modulus size accepted by the key generator.
pub const MIN_KEY_BITS: u64 = 16;
pub const DEFAULT_KEY_BITS: u64 = 256;
pub const DEFAULT_MAX_PRIME_ATTEMPTS: usize = 100_000;
/// Plaintext of a single vote.
pub const VOTE: u64 = 1;

/// Public half of an election key: safe prime `p`, subgroup generator `g`
/// and `y = g^x mod p`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    pub p: BigUint,
    pub g: BigUint,
    pub y: BigUint,
}

impl PublicKey {
    /// Order of the subgroup generated by `g`.
    pub fn q(&self) -> BigUint {
        (&self.p - 1u32) >> 1usize
    }

    /// Exponential encoding `g^m mod p`, so that products of encodings add plaintexts.
    pub fn encode(&self, m: u64) -> BigUint {
        self.g.modpow(&BigUint::from(m), &self.p)
    }

    pub fn check_plaintext(&self, m: u64) -> Result<(), Error> {
        if BigUint::from(m) >= self.q() {
            return Err(Error::InvalidPlaintext(m));
        }
        Ok(())
    }

    /// Whether `v` is a usable ciphertext component, i.e. lies in `[1, p)`.
    pub fn contains(&self, v: &BigUint) -> bool {
        !v.is_zero() && v < &self.p
    }
}

/// Election key pair. The private exponent never leaves this struct.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    public: PublicKey,
    x: BigUint,
}

impl KeyPair {
    pub fn public(&self) -> &PublicKey {
        &self.public
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("x", &"<redacted>")
            .finish()
    }
}

/// An ElGamal ciphertext `(a, b) = (g^k, g^m * y^k)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ciphertext {
    pub(crate) a: BigUint,
    pub(crate) b: BigUint,
}

impl Ciphertext {
    pub fn new(a: BigUint, b: BigUint) -> Ciphertext {
        Ciphertext { a, b }
    }

    /// Encryption of zero with no randomness, the neutral element of [`aggregate::combine_pair`].
    pub fn identity() -> Ciphertext {
        Ciphertext { a: BigUint::one(), b: BigUint::one() }
    }

    pub fn a(&self) -> &BigUint {
        &self.a
    }

    pub fn b(&self) -> &BigUint {
        &self.b
    }

    fn check(&self, pk: &PublicKey) -> Result<(), Error> {
        if pk.contains(&self.a) && pk.contains(&self.b) {
            Ok(())
        } else {
            Err(Error::InvalidCiphertext)
        }
    }
}

pub mod keygen {
    use log::info;
    use rand_core::{CryptoRng, RngCore};
    use crate::prime::{self, SafePrime};
    use super::*;

    /// Generate a fresh election key pair with a `bits`-bit safe prime modulus.
    ///
    /// # Arguments
    /// * `rng` - A cryptographic PRNG.
    /// * `bits` - Size of the modulus `p`, at least [`MIN_KEY_BITS`].
    /// * `max_attempts` - How many prime candidates to examine before giving up.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, bits: u64, max_attempts: usize) -> Result<KeyPair, Error> {
        if bits < MIN_KEY_BITS {
            return Err(Error::KeyGeneration { bits, attempts: 0 });
        }
        let SafePrime { p, .. } = prime::find_safe_prime(rng, bits, max_attempts)
            .ok_or(Error::KeyGeneration { bits, attempts: max_attempts })?;
        let g = prime::subgroup_generator(rng, &p);
        let x = prime::random_in(rng, &BigUint::one(), &(&p - 2u32));
        let y = g.modpow(&x, &p);
        info!("generated {}-bit election key", bits);
        Ok(KeyPair { public: PublicKey { p, g, y }, x })
    }

    pub fn generate_default<R: RngCore + CryptoRng>(rng: &mut R, bits: u64) -> Result<KeyPair, Error> {
        generate(rng, bits, DEFAULT_MAX_PRIME_ATTEMPTS)
    }
}

pub mod cipher {
    use log::error;
    use rand_core::{CryptoRng, RngCore};
    use crate::options::{OptionCode, OptionSet};
    use crate::prime;
    use super::*;

    /// Encrypt `m` with a caller-chosen ephemeral secret `k`.
    ///
    /// `k` must be uniform in `[1, p-2]` and must never be reused: two ciphertexts
    /// sharing `k` reveal `g^(m1-m2)` to anyone holding both.
    pub fn encrypt_with_k(pk: &PublicKey, m: u64, k: &BigUint) -> Result<Ciphertext, Error> {
        pk.check_plaintext(m)?;
        let a = pk.g.modpow(k, &pk.p);
        let b = pk.encode(m) * pk.y.modpow(k, &pk.p) % &pk.p;
        Ok(Ciphertext { a, b })
    }

    pub fn encrypt<R: CryptoRng + RngCore>(rng: &mut R, pk: &PublicKey, m: u64) -> Result<Ciphertext, Error> {
        let k = prime::random_in(rng, &BigUint::one(), &(&pk.p - 2u32));
        encrypt_with_k(pk, m, &k)
    }

    /// Encrypt one vote for `code`, which must be registered in `options`.
    ///
    /// Every vote encodes as `g^1` whatever the option, so an aggregate of the
    /// ballots cast for one option decrypts straight to its vote count.
    pub fn encrypt_option<R: CryptoRng + RngCore>(
        rng: &mut R,
        pk: &PublicKey,
        options: &OptionSet,
        code: OptionCode,
    ) -> Result<Ciphertext, Error> {
        options.check(code)?;
        pk.check_plaintext(code.value())?;
        encrypt(rng, pk, VOTE)
    }

    // b * (a^x)^-1, using a^(p-1-x) as the inverse since p is prime
    fn unmask(keypair: &KeyPair, ct: &Ciphertext) -> Result<BigUint, Error> {
        let pk = &keypair.public;
        ct.check(pk)?;
        let e = &pk.p - 1u32 - &keypair.x;
        Ok(&ct.b * ct.a.modpow(&e, &pk.p) % &pk.p)
    }

    /// Decrypt `ct` and recover the plaintext sum by searching `g^0, g^1, .., g^ceiling`.
    /// For an aggregate of ballots this is the number of votes.
    // TODO(decide): baby-step giant-step once ceilings grow past a few hundred thousand
    pub fn decrypt(keypair: &KeyPair, ct: &Ciphertext, ceiling: u64) -> Result<u64, Error> {
        let pk = &keypair.public;
        let m = unmask(keypair, ct)?;
        let mut candidate = BigUint::one();
        for n in 0..=ceiling {
            if candidate == m {
                return Ok(n);
            }
            candidate = candidate * &pk.g % &pk.p;
        }
        error!("ciphertext did not decode within 0..={}", ceiling);
        Err(Error::DecryptionMismatch { ceiling })
    }
}

pub mod aggregate {
    use super::*;

    pub fn combine_pair(pk: &PublicKey, c1: &Ciphertext, c2: &Ciphertext) -> Ciphertext {
        Ciphertext {
            a: &c1.a * &c2.a % &pk.p,
            b: &c1.b * &c2.b % &pk.p,
        }
    }

    /// Homomorphically add the plaintexts of `cts`, all encrypted under `pk`.
    pub fn combine<'a, I>(pk: &PublicKey, cts: I) -> Result<Ciphertext, Error>
    where
        I: IntoIterator<Item = &'a Ciphertext>,
    {
        let mut cts = cts.into_iter();
        let first = cts.next().ok_or(Error::EmptyAggregation)?;
        first.check(pk)?;
        let mut sum = first.clone();
        for ct in cts {
            ct.check(pk)?;
            sum = combine_pair(pk, &sum, ct);
        }
        Ok(sum)
    }
}
