use log::debug;
use rand_core::{CryptoRng, RngCore};
use crate::config::ElectionConfig;
use crate::crypto::*;
use crate::error::Error;

/// TallyAuthority holds the election private key.
/// It publishes the public key for ballot encryption and
/// is the only party able to decode the aggregated tally.
pub struct TallyAuthority {
    keypair: KeyPair,
}

impl TallyAuthority {
    /// Generate fresh key material.
    ///
    /// # Arguments
    /// * `rng` - A cryptographic PRNG.
    /// * `config` - Supplies the modulus size and prime search bound.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R, config: &ElectionConfig) -> Result<TallyAuthority, Error> {
        let keypair = keygen::generate(rng, config.key_bits, config.max_prime_attempts)?;
        Ok(TallyAuthority { keypair })
    }

    /// Use a previously generated key pair.
    pub fn from_keypair(keypair: KeyPair) -> TallyAuthority {
        TallyAuthority { keypair }
    }

    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public()
    }

    /// Combine the ballots cast for one option and decode how many there were.
    ///
    /// # Arguments
    /// * `ballots` - Every ciphertext cast for the option.
    /// * `ceiling` - Largest count to consider.
    pub fn count(&self, ballots: &[Ciphertext], ceiling: u64) -> Result<u64, Error> {
        let sum = aggregate::combine(self.public_key(), ballots)?;
        debug!("combined {} ballots", ballots.len());
        cipher::decrypt(&self.keypair, &sum, ceiling)
    }
}
