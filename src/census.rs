use std::collections::{HashMap, HashSet};
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::election::ElectionId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterId(pub u64);

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who may vote in an election. Also bounds the tally search when the
/// ceiling follows the roll size.
pub trait VoterRoll {
    fn contains(&self, election: ElectionId, voter: VoterId) -> bool;
    fn size(&self, election: ElectionId) -> usize;
}

/// In-memory census of voters per election.
#[derive(Clone, Debug, Default)]
pub struct Census {
    voters: HashMap<ElectionId, HashSet<VoterId>>,
}

impl Census {
    pub fn new() -> Census {
        Census::default()
    }

    pub fn with_voters<I: IntoIterator<Item = VoterId>>(election: ElectionId, voters: I) -> Census {
        let mut census = Census::new();
        for voter in voters {
            census.add(election, voter);
        }
        census
    }

    /// Returns false if the voter was already registered.
    pub fn add(&mut self, election: ElectionId, voter: VoterId) -> bool {
        self.voters.entry(election).or_default().insert(voter)
    }

    pub fn remove(&mut self, election: ElectionId, voter: VoterId) -> bool {
        self.voters.get_mut(&election).map_or(false, |v| v.remove(&voter))
    }
}

impl VoterRoll for Census {
    fn contains(&self, election: ElectionId, voter: VoterId) -> bool {
        self.voters.get(&election).map_or(false, |v| v.contains(&voter))
    }

    fn size(&self, election: ElectionId) -> usize {
        self.voters.get(&election).map_or(0, |v| v.len())
    }
}

/// Sequential voter ids `first..first+count`.
pub fn create_voters(first: u64, count: usize) -> Vec<VoterId> {
    (first..first + count as u64).map(VoterId).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_census() {
        let e1 = ElectionId(1);
        let e2 = ElectionId(2);
        let mut census = Census::with_voters(e1, create_voters(10, 3));
        assert_eq!(census.size(e1), 3);
        assert_eq!(census.size(e2), 0);
        assert!(census.contains(e1, VoterId(11)));
        assert!(!census.contains(e1, VoterId(13)));
        assert!(!census.contains(e2, VoterId(11)));

        assert!(!census.add(e1, VoterId(10)));
        assert!(census.add(e2, VoterId(10)));
        assert!(census.remove(e1, VoterId(10)));
        assert!(!census.remove(e1, VoterId(10)));
        assert_eq!(census.size(e1), 2);
    }
}
