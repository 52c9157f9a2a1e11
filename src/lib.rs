//! Exponential ElGamal ballot encryption and homomorphic tallying.
//!
//! Every ballot encrypts a single vote as `(g^k, g * y^k)` and is stored under the
//! option code it was cast for. Multiplying the ciphertexts cast for one option adds
//! their exponents, so the tally authority only ever decrypts one aggregate per
//! option and recovers its vote count with a bounded search.

pub mod authority;
pub mod census;
pub mod config;
pub mod crypto;
pub mod election;
pub mod error;
pub mod options;
pub mod prime;
pub mod store;
pub mod tally;

pub use crate::config::{CountCeiling, ElectionConfig};
pub use crate::crypto::{Ciphertext, KeyPair, PublicKey};
pub use crate::election::{Election, ElectionId, Stage};
pub use crate::error::{ConfigError, ElectionError, Error};
pub use crate::options::{OptionCode, OptionSet};
pub use crate::tally::TallyResult;
