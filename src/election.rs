use std::fmt;
use log::{debug, error, info, warn};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use crate::authority::TallyAuthority;
use crate::census::{VoterId, VoterRoll};
use crate::config::{CountCeiling, ElectionConfig};
use crate::crypto::{cipher, Ciphertext, PublicKey};
use crate::error::{ElectionError, Error};
use crate::options::{OptionCode, OptionSet};
use crate::store::{BallotStore, StoredBallot};
use crate::tally::{OptionTally, TallyResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(pub u64);

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Created,
    KeysGenerated,
    Open,
    Closed,
    Tallied,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Election drives one voting event through its stages:
/// `Created -> KeysGenerated -> Open -> Closed -> Tallied`.
/// It owns the tally authority and talks to the ballot store and the voter roll,
/// but leaves every cryptographic step to the `crypto` module.
pub struct Election<S, V> {
    id: ElectionId,
    question: String,
    options: OptionSet,
    stage: Stage,
    authority: Option<TallyAuthority>,
    store: S,
    roll: V,
    result: Option<TallyResult>,
}

impl<S: BallotStore, V: VoterRoll> Election<S, V> {
    /// Create a new election.
    ///
    /// # Arguments
    /// * `id` - Identifier of the voting event, attached to every error.
    /// * `question` - The question being voted on.
    /// * `options` - The options voters choose from.
    /// * `store` - Where encrypted ballots are kept.
    /// * `roll` - The census of voters allowed to vote.
    pub fn new<Q: Into<String>>(id: ElectionId, question: Q, options: OptionSet, store: S, roll: V) -> Election<S, V> {
        Election {
            id,
            question: question.into(),
            options,
            stage: Stage::Created,
            authority: None,
            store,
            roll,
            result: None,
        }
    }

    pub fn id(&self) -> ElectionId {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn roll(&self) -> &V {
        &self.roll
    }

    /// The last computed tally, if any.
    pub fn result(&self) -> Option<&TallyResult> {
        self.result.as_ref()
    }

    fn fail(&self, source: Error) -> ElectionError {
        ElectionError::new(self.id, source)
    }

    fn expect_stage(&self, expected: Stage) -> Result<(), ElectionError> {
        if self.stage != expected {
            return Err(self.fail(Error::WrongStage { expected, actual: self.stage }));
        }
        Ok(())
    }

    fn advance(&mut self, to: Stage) {
        info!("election {}: {} -> {}", self.id, self.stage, to);
        self.stage = to;
    }

    /// Generate the election key pair. Must be called exactly once, before opening.
    pub fn generate_keys<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        config: &ElectionConfig,
    ) -> Result<&PublicKey, ElectionError> {
        self.expect_stage(Stage::Created)?;
        let authority = TallyAuthority::new(rng, config).map_err(|e| self.fail(e))?;
        self.advance(Stage::KeysGenerated);
        Ok(self.authority.insert(authority).public_key())
    }

    /// The public key ballots must be encrypted against.
    pub fn public_key(&self) -> Result<&PublicKey, ElectionError> {
        self.authority.as_ref()
            .map(|a| a.public_key())
            .ok_or_else(|| self.fail(Error::MissingKeys))
    }

    pub fn open(&mut self) -> Result<(), ElectionError> {
        self.expect_stage(Stage::KeysGenerated)?;
        self.advance(Stage::Open);
        Ok(())
    }

    // stage, census and double-voting checks shared by `cast` and `submit`
    fn admit(&self, voter: VoterId, code: OptionCode) -> Result<(), Error> {
        if self.stage != Stage::Open {
            return Err(Error::WrongStage { expected: Stage::Open, actual: self.stage });
        }
        if !self.roll.contains(self.id, voter) {
            return Err(Error::NotInCensus(voter));
        }
        if self.store.has_voted(self.id, voter) {
            return Err(Error::AlreadyVoted(voter));
        }
        self.options.check(code)
    }

    fn reject(&self, voter: VoterId, source: Error) -> ElectionError {
        warn!("election {}: rejected ballot from voter {}: {}", self.id, voter, source);
        self.fail(source)
    }

    /// Encrypt a vote for `code` on behalf of `voter` and store it.
    ///
    /// # Arguments
    /// * `rng` - A cryptographic PRNG, used for the ballot's ephemeral secret.
    /// * `voter` - The voter casting the ballot, who must be in the census.
    /// * `code` - The chosen option.
    pub fn cast<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        voter: VoterId,
        code: OptionCode,
    ) -> Result<(), ElectionError> {
        self.admit(voter, code).map_err(|e| self.reject(voter, e))?;
        let pk = self.public_key()?;
        let ciphertext = cipher::encrypt_option(rng, pk, &self.options, code)
            .map_err(|e| self.reject(voter, e))?;
        self.store.append(self.id, StoredBallot { voter, option: code, ciphertext });
        Ok(())
    }

    /// Store a ballot that the voter encrypted themselves against [`Election::public_key`].
    pub fn submit(&mut self, voter: VoterId, code: OptionCode, ciphertext: Ciphertext) -> Result<(), ElectionError> {
        self.admit(voter, code).map_err(|e| self.reject(voter, e))?;
        let pk = self.public_key()?;
        if !pk.contains(ciphertext.a()) || !pk.contains(ciphertext.b()) {
            return Err(self.reject(voter, Error::InvalidCiphertext));
        }
        self.store.append(self.id, StoredBallot { voter, option: code, ciphertext });
        Ok(())
    }

    /// Stop accepting ballots. Everything stored before this point is what gets tallied.
    pub fn close(&mut self) -> Result<(), ElectionError> {
        self.expect_stage(Stage::Open)?;
        self.advance(Stage::Closed);
        Ok(())
    }

    fn ceiling(&self, config: &ElectionConfig) -> u64 {
        match config.count_ceiling {
            CountCeiling::VoterRoll => self.roll.size(self.id) as u64,
            CountCeiling::Fixed(n) => n,
        }
    }

    /// Compute the per-option vote counts.
    ///
    /// May be repeated once tallied; with the same stored ballots it gives the same result.
    pub fn tally(&mut self, config: &ElectionConfig) -> Result<&TallyResult, ElectionError> {
        if !matches!(self.stage, Stage::Closed | Stage::Tallied) {
            return Err(self.fail(Error::WrongStage { expected: Stage::Closed, actual: self.stage }));
        }
        let authority = self.authority.as_ref().ok_or_else(|| self.fail(Error::MissingKeys))?;
        let ceiling = self.ceiling(config);

        let mut counts = Vec::with_capacity(self.options.len());
        for option in self.options.iter() {
            let ballots = self.store.ballots_for(self.id, option.code);
            debug!("election {}: counting option {}", self.id, option.code);
            let votes = match authority.count(&ballots, ceiling) {
                Ok(n) => n,
                Err(Error::EmptyAggregation) => 0,
                Err(e) => {
                    error!("election {}: tally of option {} failed: {}", self.id, option.code, e);
                    return Err(self.fail(e));
                }
            };
            counts.push(OptionTally { label: option.label.clone(), code: option.code, votes });
        }

        let result = TallyResult::new(counts);
        info!("election {}: tallied {} ballots", self.id, result.total());
        if self.stage == Stage::Closed {
            self.advance(Stage::Tallied);
        }
        Ok(self.result.insert(result))
    }
}

#[cfg(test)]
mod test {
    use num_bigint::BigUint;
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng;
    use crate::census::{create_voters, Census};
    use crate::crypto::KeyPair;
    use crate::crypto::test::test_keypair;
    use crate::store::MemoryBallotStore;
    use super::*;

    const ID: ElectionId = ElectionId(42);

    fn config() -> ElectionConfig {
        ElectionConfig { key_bits: 64, ..ElectionConfig::default() }
    }

    fn election(voters: usize) -> Election<MemoryBallotStore, Census> {
        let options = OptionSet::numbered(&["Chocolate", "Vainilla", "Frambuesa"]).unwrap();
        let census = Census::with_voters(ID, create_voters(1, voters));
        Election::new(ID, "Tipos de helados", options, MemoryBallotStore::new(), census)
    }

    fn wrong_stage(expected: Stage, actual: Stage) -> ElectionError {
        ElectionError::new(ID, Error::WrongStage { expected, actual })
    }

    // skip key generation by installing the shared test key
    fn with_test_key(e: &mut Election<MemoryBallotStore, Census>, keypair: &KeyPair) {
        e.authority = Some(TallyAuthority::from_keypair(keypair.clone()));
        e.stage = Stage::KeysGenerated;
    }

    #[test]
    fn test_stage_transitions() {
        let mut rng = ChaChaRng::from_entropy();
        let mut e = election(3);
        assert_eq!(e.stage(), Stage::Created);
        assert_eq!(e.public_key().unwrap_err(), ElectionError::new(ID, Error::MissingKeys));
        assert_eq!(e.open().unwrap_err(), wrong_stage(Stage::KeysGenerated, Stage::Created));
        assert_eq!(e.close().unwrap_err(), wrong_stage(Stage::Open, Stage::Created));
        assert_eq!(e.tally(&config()).unwrap_err(), wrong_stage(Stage::Closed, Stage::Created));

        let pk = e.generate_keys(&mut rng, &config()).unwrap().clone();
        assert_eq!(e.stage(), Stage::KeysGenerated);
        assert_eq!(e.public_key().unwrap(), &pk);
        assert_eq!(e.generate_keys(&mut rng, &config()).unwrap_err(), wrong_stage(Stage::Created, Stage::KeysGenerated));
        assert_eq!(e.cast(&mut rng, VoterId(1), OptionCode(1)).unwrap_err(), wrong_stage(Stage::Open, Stage::KeysGenerated));

        e.open().unwrap();
        e.cast(&mut rng, VoterId(1), OptionCode(1)).unwrap();
        e.close().unwrap();
        assert_eq!(e.cast(&mut rng, VoterId(2), OptionCode(1)).unwrap_err(), wrong_stage(Stage::Open, Stage::Closed));
        assert_eq!(e.store().len(ID), 1);

        let result = e.tally(&config()).unwrap().clone();
        assert_eq!(e.stage(), Stage::Tallied);
        assert_eq!(result.votes_for(OptionCode(1)), Some(1));
        assert_eq!(result.votes_for(OptionCode(2)), Some(0));
        assert_eq!(e.result(), Some(&result));
    }

    #[test]
    fn test_key_generation_failure() {
        let mut rng = ChaChaRng::from_entropy();
        let mut e = election(1);
        let config = ElectionConfig { key_bits: 512, max_prime_attempts: 1, ..ElectionConfig::default() };
        assert_eq!(e.generate_keys(&mut rng, &config).unwrap_err(),
                   ElectionError::new(ID, Error::KeyGeneration { bits: 512, attempts: 1 }));
        assert_eq!(e.stage(), Stage::Created);
    }

    #[test]
    fn test_ballot_rejection() {
        let mut rng = ChaChaRng::from_entropy();
        let mut e = election(2);
        with_test_key(&mut e, test_keypair());
        e.open().unwrap();

        assert_eq!(e.cast(&mut rng, VoterId(9), OptionCode(1)).unwrap_err(),
                   ElectionError::new(ID, Error::NotInCensus(VoterId(9))));
        assert_eq!(e.cast(&mut rng, VoterId(1), OptionCode(4)).unwrap_err(),
                   ElectionError::new(ID, Error::InvalidPlaintext(4)));
        e.cast(&mut rng, VoterId(1), OptionCode(2)).unwrap();
        assert_eq!(e.cast(&mut rng, VoterId(1), OptionCode(3)).unwrap_err(),
                   ElectionError::new(ID, Error::AlreadyVoted(VoterId(1))));

        let bad = Ciphertext::new(BigUint::from(0u32), BigUint::from(1u32));
        assert_eq!(e.submit(VoterId(2), OptionCode(3), bad).unwrap_err(),
                   ElectionError::new(ID, Error::InvalidCiphertext));
        assert_eq!(e.store().len(ID), 1);
    }

    #[test]
    fn test_submit_and_retally() {
        let mut rng = ChaChaRng::from_entropy();
        let mut e = election(6);
        with_test_key(&mut e, test_keypair());
        e.open().unwrap();

        let pk = e.public_key().unwrap().clone();
        let options = e.options().clone();
        for (voter, code) in [(1, 3), (2, 3), (3, 1), (4, 3)] {
            let ct = cipher::encrypt_option(&mut rng, &pk, &options, OptionCode(code)).unwrap();
            e.submit(VoterId(voter), OptionCode(code), ct).unwrap();
        }
        e.cast(&mut rng, VoterId(5), OptionCode(1)).unwrap();
        e.close().unwrap();

        let first = e.tally(&config()).unwrap().clone();
        assert_eq!(first.options().iter().map(|o| o.votes).collect::<Vec<_>>(), vec![2, 0, 3]);
        assert_eq!(first.total(), 5);
        let second = e.tally(&config()).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(e.stage(), Stage::Tallied);
    }

    #[test]
    fn test_tally_ceiling() {
        let mut rng = ChaChaRng::from_entropy();
        let mut e = election(5);
        with_test_key(&mut e, test_keypair());
        e.open().unwrap();
        for voter in 1..=4 {
            e.cast(&mut rng, VoterId(voter), OptionCode(2)).unwrap();
        }
        e.close().unwrap();

        let fixed = ElectionConfig { count_ceiling: CountCeiling::Fixed(3), ..config() };
        assert_eq!(e.tally(&fixed).unwrap_err(),
                   ElectionError::new(ID, Error::DecryptionMismatch { ceiling: 3 }));
        assert_eq!(e.stage(), Stage::Closed);
        assert_eq!(e.result(), None);
        assert_eq!(e.tally(&config()).unwrap().votes_for(OptionCode(2)), Some(4));
    }

    #[test]
    fn test_full_roll_on_highest_option() {
        let mut rng = ChaChaRng::from_entropy();
        let mut e = election(3);
        with_test_key(&mut e, test_keypair());
        e.open().unwrap();
        for voter in 1..=3 {
            e.cast(&mut rng, VoterId(voter), OptionCode(3)).unwrap();
        }
        e.close().unwrap();

        // the roll size is the ceiling and every voter chose option 3
        let result = e.tally(&config()).unwrap();
        assert_eq!(result.votes_for(OptionCode(3)), Some(3));
        assert_eq!(result.total(), 3);
    }

    #[test]
    fn test_corrupted_ballot() {
        let mut rng = ChaChaRng::from_entropy();
        let mut e = election(3);
        with_test_key(&mut e, test_keypair());
        e.open().unwrap();
        e.cast(&mut rng, VoterId(1), OptionCode(1)).unwrap();
        // a well-formed ciphertext under a different key
        let pk = e.public_key().unwrap().clone();
        let other = PublicKey { y: pk.g.clone(), ..pk };
        let ct = cipher::encrypt(&mut rng, &other, 1).unwrap();
        e.submit(VoterId(2), OptionCode(1), ct).unwrap();
        e.close().unwrap();

        let err = e.tally(&config()).unwrap_err();
        assert_eq!(err.election, ID);
        assert!(matches!(err.source, Error::DecryptionMismatch { .. }));
    }
}
