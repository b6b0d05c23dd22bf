//! Rate-limited concurrent batch executor.
//!
//! Records are partitioned into consecutive chunks of `concurrency` records.
//! Chunks run strictly one after another; the records of a chunk run
//! concurrently as independent tasks. When a chunk finishes faster than the
//! pacing interval, the executor waits out the rest of the interval before
//! dispatching the next chunk, so the sustained call rate stays at or below
//! `concurrency / pacing`.
//!
//! # Example
//!
//! ```ignore
//! use mailbatch_core::executor::{BatchExecutor, ExecutorConfig, NullObserver};
//!
//! let executor = BatchExecutor::new(ExecutorConfig::new().concurrency(5));
//! let report = executor
//!     .run(&records, operation, &mut NullObserver, &CancellationToken::new())
//!     .await;
//! assert_eq!(report.succeeded + report.failed, report.total);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::account::AccountRecord;
use crate::operation::Operation;
use crate::outcome::{FailureKind, Outcome};
use crate::report::{Aggregator, RunReport};

/// Default number of records per chunk.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Upper bound for the chunk size (the provider allows 10 requests/second).
pub const MAX_CONCURRENCY: usize = 10;

/// Default minimum wall-clock duration of one chunk.
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Configuration for the batch executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Records per chunk, and the maximum number of calls in flight.
    pub concurrency: usize,
    /// Minimum wall-clock duration per chunk.
    pub pacing: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            pacing: DEFAULT_PACING,
        }
    }
}

impl ExecutorConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk size, clamped to `1..=MAX_CONCURRENCY`.
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Sets the pacing interval.
    #[must_use]
    pub const fn pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

/// One chunk of a [`BatchPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 0-based chunk index.
    pub index: usize,
    /// Position of the chunk's first record in the input.
    pub offset: usize,
    /// Records of this chunk.
    pub records: &'a [AccountRecord],
}

/// Ordered partition of the input into fixed-size chunks.
#[derive(Debug, Clone, Copy)]
pub struct BatchPlan<'a> {
    records: &'a [AccountRecord],
    chunk_size: usize,
}

impl<'a> BatchPlan<'a> {
    /// Plans `records` in chunks of `chunk_size` (at least 1).
    #[must_use]
    pub fn new(records: &'a [AccountRecord], chunk_size: usize) -> Self {
        Self {
            records,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of chunks, `ceil(records / chunk_size)`.
    #[must_use]
    pub const fn chunk_count(&self) -> usize {
        self.records.len().div_ceil(self.chunk_size)
    }

    /// Chunks in input order; the last one may be smaller.
    pub fn chunks(&self) -> impl Iterator<Item = Chunk<'a>> + 'a {
        let chunk_size = self.chunk_size;
        self.records
            .chunks(chunk_size)
            .enumerate()
            .map(move |(index, records)| Chunk {
                index,
                offset: index * chunk_size,
                records,
            })
    }
}

/// Run progress at the moment an outcome arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Outcomes received so far, including the current one.
    pub completed: usize,
    /// Records in the run.
    pub total: usize,
}

/// Receives live events from a run.
///
/// Events are delivered from the executor's driving loop, one at a time.
pub trait RunObserver<T> {
    /// A chunk is about to be dispatched.
    fn chunk_started(&mut self, _chunk: &Chunk<'_>, _chunk_count: usize) {}

    /// An outcome arrived (arrival order within a chunk).
    fn outcome(&mut self, progress: Progress, outcome: &Outcome<T>);

    /// The executor is waiting before the next chunk.
    fn pacing(&mut self, _wait: Duration) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl<T> RunObserver<T> for NullObserver {
    fn outcome(&mut self, _progress: Progress, _outcome: &Outcome<T>) {}
}

/// Executes an [`Operation`] over a list of records in paced chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchExecutor {
    config: ExecutorConfig,
}

impl BatchExecutor {
    /// Creates an executor.
    #[must_use]
    pub const fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// The executor configuration.
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Runs `operation` once for every record.
    ///
    /// Every dispatched record yields exactly one outcome. Cancelling `cancel`
    /// stops dispatching further chunks, turns in-flight calls into
    /// [`FailureKind::Cancelled`] outcomes, and counts undispatched records
    /// as `pending` in the report.
    pub async fn run<O, R>(
        &self,
        records: &[AccountRecord],
        operation: Arc<O>,
        observer: &mut R,
        cancel: &CancellationToken,
    ) -> RunReport<O::Payload>
    where
        O: Operation,
        R: RunObserver<O::Payload> + ?Sized,
    {
        let plan = BatchPlan::new(records, self.config.concurrency);
        let chunk_count = plan.chunk_count();
        let total = records.len();
        let mut aggregator = Aggregator::with_capacity(total);

        info!(
            operation = operation.name(),
            records = total,
            chunks = chunk_count,
            concurrency = self.config.concurrency,
            "Starting batch run"
        );

        for chunk in plan.chunks() {
            if cancel.is_cancelled() {
                warn!(chunk = chunk.index, "Run cancelled before dispatching chunk");
                break;
            }

            let started = Instant::now();
            observer.chunk_started(&chunk, chunk_count);
            debug!(chunk = chunk.index, size = chunk.records.len(), "Dispatching chunk");

            self.run_chunk(&chunk, &operation, &mut aggregator, observer, total, cancel)
                .await;

            let elapsed = started.elapsed();
            let more_chunks = chunk.index + 1 < chunk_count;
            if more_chunks && elapsed < self.config.pacing && !cancel.is_cancelled() {
                let wait = self.config.pacing - elapsed;
                debug!(chunk = chunk.index, wait_ms = wait.as_millis(), "Pacing before next chunk");
                observer.pacing(wait);
                tokio::select! {
                    () = tokio::time::sleep(wait) => {}
                    () = cancel.cancelled() => {}
                }
            }
        }

        let mut report = aggregator.finalize();
        report.pending = total - report.total;
        report.interrupted = report.pending > 0
            || report
                .outcomes
                .iter()
                .any(|o| o.failure == Some(FailureKind::Cancelled));

        info!(
            operation = operation.name(),
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            pending = report.pending,
            "Batch run finished"
        );

        report
    }

    async fn run_chunk<O, R>(
        &self,
        chunk: &Chunk<'_>,
        operation: &Arc<O>,
        aggregator: &mut Aggregator<O::Payload>,
        observer: &mut R,
        total: usize,
        cancel: &CancellationToken,
    ) where
        O: Operation,
        R: RunObserver<O::Payload> + ?Sized,
    {
        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::with_capacity(chunk.records.len());

        for record in chunk.records {
            let operation = Arc::clone(operation);
            let record = record.clone();
            let cancel = cancel.clone();
            let email = record.email.clone();

            let handle = tasks.spawn(async move {
                tokio::select! {
                    outcome = operation.execute(&record) => outcome,
                    () = cancel.cancelled() => {
                        Outcome::failure(&record.email, FailureKind::Cancelled, "cancelled")
                    }
                }
            });
            in_flight.insert(handle.id(), email);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    in_flight.remove(&id);
                    outcome
                }
                Err(err) => {
                    let email = in_flight.remove(&err.id()).unwrap_or_default();
                    error!(%email, error = %err, "Unit of work aborted");
                    Outcome::failure(email, FailureKind::Internal, format!("operation aborted: {err}"))
                }
            };

            if let Some(kind) = outcome.failure {
                debug!(email = %outcome.email, kind = kind.label(), "Record failed");
            }

            let progress = Progress {
                completed: aggregator.len() + 1,
                total,
            };
            let outcome = aggregator.record(outcome);
            observer.outcome(progress, outcome);
        }
    }
}
