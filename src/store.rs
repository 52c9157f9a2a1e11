use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::census::VoterId;
use crate::crypto::Ciphertext;
use crate::election::ElectionId;
use crate::options::OptionCode;

/// A cast ballot as kept by the ciphertext store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBallot {
    pub voter: VoterId,
    pub option: OptionCode,
    pub ciphertext: Ciphertext,
}

/// Append-only storage of encrypted ballots, keyed by election and option.
pub trait BallotStore {
    fn append(&mut self, election: ElectionId, ballot: StoredBallot);

    /// Snapshot of all ciphertexts cast for `option`, in cast order.
    fn ballots_for(&self, election: ElectionId, option: OptionCode) -> Vec<Ciphertext>;

    fn has_voted(&self, election: ElectionId, voter: VoterId) -> bool;

    /// Total number of ballots stored for the election.
    fn len(&self, election: ElectionId) -> usize;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryBallotStore {
    ballots: HashMap<ElectionId, Vec<StoredBallot>>,
}

impl MemoryBallotStore {
    pub fn new() -> MemoryBallotStore {
        MemoryBallotStore::default()
    }

    /// All ballots of an election, as a bulletin board would publish them.
    pub fn get_bb(&self, election: ElectionId) -> &[StoredBallot] {
        self.ballots.get(&election).map(Vec::as_slice).unwrap_or_default()
    }
}

impl BallotStore for MemoryBallotStore {
    fn append(&mut self, election: ElectionId, ballot: StoredBallot) {
        self.ballots.entry(election).or_default().push(ballot);
    }

    fn ballots_for(&self, election: ElectionId, option: OptionCode) -> Vec<Ciphertext> {
        self.get_bb(election).iter()
            .filter(|b| b.option == option)
            .map(|b| b.ciphertext.clone())
            .collect()
    }

    fn has_voted(&self, election: ElectionId, voter: VoterId) -> bool {
        self.get_bb(election).iter().any(|b| b.voter == voter)
    }

    fn len(&self, election: ElectionId) -> usize {
        self.get_bb(election).len()
    }
}
