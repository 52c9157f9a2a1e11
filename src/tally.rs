use serde::{Deserialize, Serialize};
use crate::options::OptionCode;

/// Final count for one option. Serializes as `{"option", "number", "votes"}`,
/// the shape the results visualizer reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionTally {
    #[serde(rename = "option")]
    pub label: String,
    #[serde(rename = "number")]
    pub code: OptionCode,
    pub votes: u64,
}

/// Per-option vote counts of a tallied election, in option order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TallyResult {
    options: Vec<OptionTally>,
}

impl TallyResult {
    pub fn new(options: Vec<OptionTally>) -> TallyResult {
        TallyResult { options }
    }

    pub fn options(&self) -> &[OptionTally] {
        &self.options
    }

    pub fn votes_for(&self, code: OptionCode) -> Option<u64> {
        self.options.iter().find(|o| o.code == code).map(|o| o.votes)
    }

    pub fn total(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }

    /// Options ordered by votes, most first. Ties keep option order.
    pub fn ranked(&self) -> Vec<&OptionTally> {
        let mut ranked: Vec<&OptionTally> = self.options.iter().collect();
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
        ranked
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
