//! Result aggregation.
//!
//! The [`Aggregator`] is the single point where concurrent completions become a
//! sequential stream: the executor's driving loop feeds it one outcome at a
//! time, so its counters need no locking.

use std::collections::BTreeMap;

use mailbatch_api::Letter;

use crate::outcome::{FailureKind, Outcome};

/// Payload of a successful outcome.
pub trait Payload {
    /// Number of items the payload carries, if it carries countable items.
    ///
    /// Successful outcomes with a count are additionally classified as having
    /// content (positive count) or being empty.
    fn item_count(&self) -> Option<usize> {
        None
    }
}

impl Payload for () {}

impl Payload for Vec<Letter> {
    fn item_count(&self) -> Option<usize> {
        Some(self.len())
    }
}

/// Final summary of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport<T> {
    /// Number of outcomes, equal to `succeeded + failed`.
    pub total: usize,
    /// Successful outcomes.
    pub succeeded: usize,
    /// Failed outcomes.
    pub failed: usize,
    /// Successful outcomes whose payload has a positive item count.
    pub with_content: usize,
    /// Successful outcomes whose payload has an item count of zero.
    pub empty: usize,
    /// Records never dispatched because the run was cancelled.
    pub pending: usize,
    /// Whether cancellation cut the run short: records were left pending or
    /// in-flight calls were cancelled.
    pub interrupted: bool,
    /// Outcomes in arrival order.
    pub outcomes: Vec<Outcome<T>>,
}

impl<T> RunReport<T> {
    /// Successful outcomes in arrival order.
    pub fn successes(&self) -> impl Iterator<Item = &Outcome<T>> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    /// Failed outcomes in arrival order.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome<T>> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Failed outcome counts per failure class.
    #[must_use]
    pub fn failure_counts(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for kind in self.outcomes.iter().filter_map(|o| o.failure) {
            *counts.entry(kind).or_insert(0) += 1;
        }
        counts
    }

    /// Whether every input record produced an outcome.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.pending == 0 && !self.interrupted
    }
}

impl RunReport<Vec<Letter>> {
    /// Successful outcomes that returned at least one letter, with their letters.
    pub fn with_mail(&self) -> impl Iterator<Item = (&str, &[Letter])> {
        self.successes().filter_map(|o| {
            o.payload
                .as_deref()
                .filter(|letters| !letters.is_empty())
                .map(|letters| (o.email.as_str(), letters))
        })
    }

    /// Total number of letters retrieved.
    #[must_use]
    pub fn total_letters(&self) -> usize {
        self.with_mail().map(|(_, letters)| letters.len()).sum()
    }
}

/// Accumulates outcomes into a [`RunReport`].
#[derive(Debug)]
pub struct Aggregator<T> {
    outcomes: Vec<Outcome<T>>,
    succeeded: usize,
    failed: usize,
    with_content: usize,
    empty: usize,
}

impl<T: Payload> Default for Aggregator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> Aggregator<T> {
    /// Creates an empty aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            succeeded: 0,
            failed: 0,
            with_content: 0,
            empty: 0,
        }
    }

    /// Creates an empty aggregator sized for `capacity` outcomes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Records one outcome and returns it.
    ///
    /// Increments exactly one of succeeded/failed; successful outcomes with a
    /// countable payload also increment exactly one of with-content/empty.
    pub fn record(&mut self, outcome: Outcome<T>) -> &Outcome<T> {
        if outcome.is_success() {
            self.succeeded += 1;
            match outcome.payload.as_ref().and_then(Payload::item_count) {
                Some(0) => self.empty += 1,
                Some(_) => self.with_content += 1,
                None => {}
            }
        } else {
            self.failed += 1;
        }

        self.outcomes.push(outcome);
        let last = self.outcomes.len() - 1;
        &self.outcomes[last]
    }

    /// Number of outcomes recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Builds the report.
    #[must_use]
    pub fn finalize(self) -> RunReport<T> {
        RunReport {
            total: self.outcomes.len(),
            succeeded: self.succeeded,
            failed: self.failed,
            with_content: self.with_content,
            empty: self.empty,
            pending: 0,
            interrupted: false,
            outcomes: self.outcomes,
        }
    }
}
