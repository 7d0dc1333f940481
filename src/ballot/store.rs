//! Ballot store and running tally

use std::collections::{BTreeMap, HashMap};

use crate::ledger::VoteError;

/// Count of ballots per option
///
/// One entry per configured option, all starting at zero. Cloning yields an
/// independent copy, which is how snapshots are taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: BTreeMap<String, u64>,
}

impl Tally {
    /// Create a tally with a zero entry for every option
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            counts: options.into_iter().map(|o| (o.into(), 0)).collect(),
        }
    }

    /// Count for an option (None if the option is not configured)
    pub fn get(&self, option: &str) -> Option<u64> {
        self.counts.get(option).copied()
    }

    /// Whether the option is one of the configured options
    pub fn has_option(&self, option: &str) -> bool {
        self.counts.contains_key(option)
    }

    /// Sum over all options
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Borrow the underlying counts
    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    fn increment(&mut self, option: &str) -> bool {
        match self.counts.get_mut(option) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (option, count)) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", option, count)?;
        }
        write!(f, "}}")
    }
}

/// At most one ballot per client, plus the tally they add up to
#[derive(Debug)]
pub struct BallotStore {
    /// Configured options, in the order they were given
    options: Vec<String>,
    /// client id -> chosen option
    ballots: HashMap<String, String>,
    tally: Tally,
}

impl BallotStore {
    /// Create a store for the given options
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let tally = Tally::new(options.iter().cloned());

        Self {
            options,
            ballots: HashMap::new(),
            tally,
        }
    }

    /// Record a ballot
    ///
    /// Checks for a prior ballot before checking the option, so a repeat
    /// voter always sees [`VoteError::DuplicateVote`]. Nothing changes on
    /// error.
    pub fn record(&mut self, client_id: &str, option: &str) -> Result<(), VoteError> {
        if self.ballots.contains_key(client_id) {
            return Err(VoteError::DuplicateVote);
        }

        if !self.tally.increment(option) {
            return Err(VoteError::InvalidOption(option.to_string()));
        }

        self.ballots
            .insert(client_id.to_string(), option.to_string());
        Ok(())
    }

    /// Option chosen by a client, if it voted
    pub fn ballot_of(&self, client_id: &str) -> Option<&str> {
        self.ballots.get(client_id).map(String::as_str)
    }

    pub fn has_voted(&self, client_id: &str) -> bool {
        self.ballots.contains_key(client_id)
    }

    /// Number of accepted ballots
    pub fn ballot_count(&self) -> usize {
        self.ballots.len()
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}
