use std::collections::HashSet;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::Error;

/// Number identifying an option within a question. Zero is reserved for the
/// identity encoding and never names a real option.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionCode(pub u64);

impl OptionCode {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub code: OptionCode,
    pub label: String,
}

/// The options a voter may choose from, fixed for the lifetime of an election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionSet {
    options: Vec<QuestionOption>,
}

impl OptionSet {
    /// Build an option set from explicit `(code, label)` pairs.
    /// Codes must be non-zero and unique, and there must be at least one option.
    pub fn new<L: Into<String>>(options: Vec<(u64, L)>) -> Result<OptionSet, Error> {
        if options.is_empty() {
            return Err(Error::InvalidOptionSet("no options".to_string()));
        }
        let mut seen = HashSet::with_capacity(options.len());
        let mut validated = Vec::with_capacity(options.len());
        for (code, label) in options {
            if code == 0 {
                return Err(Error::InvalidOptionSet("option code 0 is reserved".to_string()));
            }
            if !seen.insert(code) {
                return Err(Error::InvalidOptionSet(format!("duplicate option code {}", code)));
            }
            validated.push(QuestionOption { code: OptionCode(code), label: label.into() });
        }
        Ok(OptionSet { options: validated })
    }

    /// Number the labels `1..=n` in order.
    pub fn numbered(labels: &[&str]) -> Result<OptionSet, Error> {
        OptionSet::new(labels.iter().enumerate().map(|(i, l)| (i as u64 + 1, *l)).collect())
    }

    pub fn contains(&self, code: OptionCode) -> bool {
        self.options.iter().any(|o| o.code == code)
    }

    pub fn check(&self, code: OptionCode) -> Result<(), Error> {
        if self.contains(code) {
            Ok(())
        } else {
            Err(Error::InvalidPlaintext(code.value()))
        }
    }

    pub fn label(&self, code: OptionCode) -> Option<&str> {
        self.options.iter().find(|o| o.code == code).map(|o| o.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionOption> {
        self.options.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = OptionCode> + '_ {
        self.options.iter().map(|o| o.code)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl<'de> Deserialize<'de> for OptionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            options: Vec<QuestionOption>,
        }
        let raw = Raw::deserialize(deserializer)?;
        OptionSet::new(raw.options.into_iter().map(|o| (o.code.value(), o.label)).collect())
            .map_err(serde::de::Error::custom)
    }
}
