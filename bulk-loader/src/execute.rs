use crate::plan::{PlanError, plan};
use crate::Hierarchical;
use error_stack::Report;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, warn};

/// The store side of an import.
pub trait BulkInsert<R>: Send + Sync {
    /// Insert every record of `batch` or none of them, returning how many were inserted.
    fn bulk_insert(
        &self,
        batch: Vec<R>,
    ) -> impl Future<Output = Result<usize, Report<InsertError>>> + Send;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Copy, Clone)]
pub enum Violation {
    #[error("a record with the same unique key already exists")]
    DuplicateKey,
    #[error("a referenced record does not exist")]
    MissingReference,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Copy, Clone)]
pub enum InsertError {
    #[error("constraint violated: {0}")]
    Constraint(Violation),
    #[error("store failed to insert the batch")]
    Store,
}

#[derive(Debug, Serialize, PartialEq, Eq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ImportErrorKind {
    DuplicateKey,
    MissingReference,
    UnplacedRecords,
    Store,
}

impl ImportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportErrorKind::DuplicateKey => "duplicate_key",
            ImportErrorKind::MissingReference => "missing_reference",
            ImportErrorKind::UnplacedRecords => "unplaced_records",
            ImportErrorKind::Store => "store",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImportError<K: Debug> {
    #[error("import contains duplicate ids: {0:?}")]
    DuplicateIds(Vec<K>),
    #[error("records have a parent that is never resolved (cycle or self reference): {0:?}")]
    UnplacedRecords(Vec<K>),
    #[error("batch {} of {batches} was rejected, {cause}", batch + 1)]
    Rejected {
        /// zero based
        batch: usize,
        batches: usize,
        cause: InsertError,
    },
}

impl<K: Debug> ImportError<K> {
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            ImportError::DuplicateIds(_) => ImportErrorKind::DuplicateKey,
            ImportError::UnplacedRecords(_) => ImportErrorKind::UnplacedRecords,
            ImportError::Rejected { cause, .. } => match cause {
                InsertError::Constraint(Violation::DuplicateKey) => ImportErrorKind::DuplicateKey,
                InsertError::Constraint(Violation::MissingReference) => {
                    ImportErrorKind::MissingReference
                }
                InsertError::Store => ImportErrorKind::Store,
            },
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq, Copy, Clone, Default)]
pub struct ImportSummary {
    pub batches: usize,
    pub inserted: usize,
}

/// Plan `records` and hand each batch to `store`, in order.
///
/// Nothing is inserted when planning fails. When a batch is rejected the
/// remaining batches are skipped; batches inserted before it stay in the store.
pub async fn execute<S, R>(
    store: &S,
    records: Vec<R>,
) -> Result<ImportSummary, Report<ImportError<R::Key>>>
where
    S: BulkInsert<R>,
    R: Hierarchical + Send,
{
    let plan = match plan(records) {
        Ok(plan) => plan,
        Err(report) => {
            let context = match report.current_context() {
                PlanError::DuplicateIds(ids) => ImportError::DuplicateIds(ids.clone()),
                PlanError::UnplacedRecords(ids) => ImportError::UnplacedRecords(ids.clone()),
            };
            warn!("import rejected before insertion: {context}");
            return Err(report.change_context(context));
        }
    };

    let batches = plan.batch_count();
    let mut summary = ImportSummary {
        batches,
        inserted: 0,
    };

    for (i, batch) in plan.into_iter().enumerate() {
        let size = batch.len();
        match store.bulk_insert(batch).await {
            Ok(count) => {
                debug!("batch {}/{batches}: inserted {count} of {size} records", i + 1);
                summary.inserted += count;
            }
            Err(report) => {
                let cause = *report.current_context();
                warn!("batch {}/{batches} of {size} records failed: {cause}", i + 1);
                let committed = summary.inserted;
                return Err(report
                    .change_context(ImportError::Rejected {
                        batch: i,
                        batches,
                        cause,
                    })
                    .attach(format!(
                        "{committed} records from earlier batches remain committed"
                    )));
            }
        }
    }

    Ok(summary)
}
