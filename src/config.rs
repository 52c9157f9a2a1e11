use serde::{Deserialize, Serialize};
use crate::crypto::{DEFAULT_KEY_BITS, DEFAULT_MAX_PRIME_ATTEMPTS, MIN_KEY_BITS};
use crate::error::ConfigError;

/// Upper bound on the per-option count searched when decoding a tally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountCeiling {
    /// The number of voters in the census.
    VoterRoll,
    Fixed(u64),
}

/// Per-election settings.
///
/// Every field has a default, so `{}` is a valid configuration:
///
/// ```json
/// { "key_bits": 512, "max_prime_attempts": 200000, "count_ceiling": { "fixed": 1000 } }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElectionConfig {
    pub key_bits: u64,
    pub max_prime_attempts: usize,
    pub count_ceiling: CountCeiling,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        ElectionConfig {
            key_bits: DEFAULT_KEY_BITS,
            max_prime_attempts: DEFAULT_MAX_PRIME_ATTEMPTS,
            count_ceiling: CountCeiling::VoterRoll,
        }
    }
}

impl ElectionConfig {
    pub fn from_json(s: &str) -> Result<ElectionConfig, ConfigError> {
        let config: ElectionConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_bits < MIN_KEY_BITS {
            return Err(ConfigError::KeyBits(self.key_bits));
        }
        if self.max_prime_attempts == 0 {
            return Err(ConfigError::NoPrimeAttempts);
        }
        Ok(())
    }
}
