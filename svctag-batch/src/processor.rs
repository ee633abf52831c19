//! Concurrent batch lookups.
//!
//! [`BatchProcessor`] drives an [`EntitlementLookup`] over many inputs with
//! a bounded number of lookups in flight. A failing input is recorded and
//! never stops the batch. Outcomes are written to the slot of their input
//! index, so the result order equals the input order whatever order the
//! lookups finish in.

use futures::{StreamExt, future, stream};
use std::sync::Arc;
use svctag_core::{
    BatchResult, EntitlementLookup, FailureKind, InventoryFields, Outcome, TagFailure,
    TagOutcome,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::import::{ImportEntry, TagImport};

/// Default number of lookups in flight.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// One unit of work.
#[derive(Debug)]
enum Job {
    Lookup {
        input: String,
        row: Option<usize>,
        name: Option<String>,
        inventory: InventoryFields,
    },
    Skipped {
        row: usize,
        raw: String,
        reason: String,
    },
}

/// Runs lookups for many inputs.
#[derive(Clone)]
pub struct BatchProcessor {
    lookup: Arc<dyn EntitlementLookup>,
    concurrency: usize,
}

impl BatchProcessor {
    /// Creates a processor with the default concurrency.
    pub fn new(lookup: Arc<dyn EntitlementLookup>) -> Self {
        Self {
            lookup,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the number of lookups in flight. Values below 1 become 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the number of lookups in flight.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Looks up every tag. Duplicates are looked up independently.
    pub async fn process<I, S>(&self, tags: I) -> BatchResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.process_with_cancel(tags, &CancellationToken::new())
            .await
    }

    /// Like [`process`](Self::process), stopping before unstarted tags once
    /// `cancel` fires.
    pub async fn process_with_cancel<I, S>(&self, tags: I, cancel: &CancellationToken) -> BatchResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let jobs = tags
            .into_iter()
            .map(|tag| Job::Lookup {
                input: tag.into(),
                row: None,
                name: None,
                inventory: InventoryFields::default(),
            })
            .collect();
        self.run(jobs, cancel).await
    }

    /// Looks up every row of an import. Skipped rows become validation
    /// failures at their row position.
    pub async fn process_import(&self, import: &TagImport) -> BatchResult {
        self.process_import_with_cancel(import, &CancellationToken::new())
            .await
    }

    /// Like [`process_import`](Self::process_import), with cancellation.
    pub async fn process_import_with_cancel(
        &self,
        import: &TagImport,
        cancel: &CancellationToken,
    ) -> BatchResult {
        let jobs = import
            .entries
            .iter()
            .map(|entry| match entry {
                ImportEntry::Tag(record) => Job::Lookup {
                    input: record.tag.clone(),
                    row: Some(record.row),
                    name: record.name.clone(),
                    inventory: record.inventory.clone(),
                },
                ImportEntry::Skipped(skipped) => Job::Skipped {
                    row: skipped.row,
                    raw: skipped.raw.clone(),
                    reason: skipped.reason.clone(),
                },
            })
            .collect();
        self.run(jobs, cancel).await
    }

    #[instrument(skip_all, fields(inputs = jobs.len(), concurrency = self.concurrency))]
    async fn run(&self, jobs: Vec<Job>, cancel: &CancellationToken) -> BatchResult {
        let total = jobs.len();
        let mut slots: Vec<Option<TagOutcome>> = (0..total).map(|_| None).collect();

        // take_while is polled only when a worker slot frees up, so a
        // cancelled token stops tags that have not started yet.
        let mut completions = stream::iter(jobs.into_iter().enumerate())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|(index, job)| async move { (index, self.run_job(job).await) })
            .buffer_unordered(self.concurrency);

        while let Some((index, outcome)) = completions.next().await {
            slots[index] = Some(outcome);
        }

        let skipped = slots.iter().filter(|s| s.is_none()).count();
        let cancelled = skipped > 0;
        if cancelled {
            warn!(not_started = skipped, "Batch cancelled");
        }

        let result = BatchResult::new(slots.into_iter().flatten().collect(), cancelled);
        info!(
            processed = result.processed(),
            successful = result.successful(),
            failed = result.failed(),
            cancelled,
            "Batch complete"
        );
        result
    }

    async fn run_job(&self, job: Job) -> TagOutcome {
        match job {
            Job::Lookup {
                input,
                row,
                name,
                inventory,
            } => {
                let result = self.lookup.lookup(&input).await;
                match &result {
                    Ok(_) => debug!(input = %input, "Lookup succeeded"),
                    Err(e) => warn!(input = %input, kind = %e.kind(), error = %e, "Lookup failed"),
                }
                TagOutcome {
                    input,
                    row,
                    name,
                    inventory,
                    outcome: Outcome::from_result(result),
                }
            }
            Job::Skipped { row, raw, reason } => {
                debug!(row, reason = %reason, "Recording skipped row");
                TagOutcome::new(
                    raw,
                    Outcome::Failure(TagFailure::new(FailureKind::Validation, reason)),
                )
                .with_row(row)
            }
        }
    }
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
