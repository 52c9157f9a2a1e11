use thiserror::Error;
use crate::census::VoterId;
use crate::election::{ElectionId, Stage};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no safe prime of {bits} bits found after {attempts} attempts")]
    KeyGeneration { bits: u64, attempts: usize },
    #[error("plaintext {0} is outside the encodable range")]
    InvalidPlaintext(u64),
    #[error("cannot aggregate an empty set of ciphertexts")]
    EmptyAggregation,
    #[error("ciphertext does not decode to any count in 0..={ceiling}")]
    DecryptionMismatch { ceiling: u64 },
    #[error("ciphertext component is outside the group")]
    InvalidCiphertext,
    #[error("invalid option set: {0}")]
    InvalidOptionSet(String),
    #[error("voter {0} is not in the census")]
    NotInCensus(VoterId),
    #[error("voter {0} has already voted")]
    AlreadyVoted(VoterId),
    #[error("election is {actual}, expected {expected}")]
    WrongStage { expected: Stage, actual: Stage },
    #[error("election keys have not been generated")]
    MissingKeys,
}

/// An [`Error`] raised while driving a particular election.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("election {election}: {source}")]
pub struct ElectionError {
    pub election: ElectionId,
    #[source]
    pub source: Error,
}

impl ElectionError {
    pub fn new(election: ElectionId, source: Error) -> ElectionError {
        ElectionError { election, source }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("key size of {0} bits is below the minimum of {min}", min = crate::crypto::MIN_KEY_BITS)]
    KeyBits(u64),
    #[error("max_prime_attempts must be positive")]
    NoPrimeAttempts,
}
