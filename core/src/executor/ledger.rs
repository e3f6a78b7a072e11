use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ExecutorError;
use crate::runner::Outcome;

/// Append-only record of job outcomes, in the order they were decided.
///
/// Each job name can be recorded once. The scheduler owns the ledger for the
/// duration of a run and hands it to the result when the run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: IndexMap<String, Outcome>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, job_name: &str, outcome: Outcome) -> Result<(), ExecutorError> {
        if self.entries.contains_key(job_name) {
            return Err(ExecutorError::DuplicateRecord(job_name.to_string()));
        }
        self.entries.insert(job_name.to_string(), outcome);
        Ok(())
    }

    pub fn get(&self, job_name: &str) -> Option<Outcome> {
        self.entries.get(job_name).copied()
    }

    pub fn contains(&self, job_name: &str) -> bool {
        self.entries.contains_key(job_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Outcome)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Names of jobs that finished with `Outcome::Success`.
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, outcome)| outcome.is_success())
            .map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.entries.values().all(Outcome::is_success)
    }
}
