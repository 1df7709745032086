use crate::Hierarchical;
use error_stack::Report;
use std::collections::HashSet;
use std::fmt::Debug;
use tracing::debug;

pub type PlanResult<R, K> = Result<Plan<R>, Report<PlanError<K>>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError<K: Debug> {
    #[error("import contains duplicate ids: {0:?}")]
    DuplicateIds(Vec<K>),
    #[error("records could not be placed because their parent is never resolved: {0:?}")]
    UnplacedRecords(Vec<K>),
}

/// Ordered insertion batches. Every record's in-import parent sits in an
/// earlier batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan<R> {
    batches: Vec<Vec<R>>,
}

impl<R> Plan<R> {
    pub fn batches(&self) -> &[Vec<R>] {
        &self.batches
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn record_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn into_batches(self) -> Vec<Vec<R>> {
        self.batches
    }
}

impl<R> IntoIterator for Plan<R> {
    type Item = Vec<R>;
    type IntoIter = std::vec::IntoIter<Vec<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.into_iter()
    }
}

/// Layers `records` breadth-first from their roots.
///
/// Batch 0 holds every record without a parent, or whose parent is not among
/// `records` (that parent is expected to be persisted already). Batch `k + 1`
/// holds the remaining records whose parent was placed in batches `0..=k`.
/// Input order is kept inside each batch.
///
/// Stops as soon as a pass places nothing. Whatever is left at that point
/// belongs to a cycle (or hangs off one) and is reported as
/// [`PlanError::UnplacedRecords`], in input order.
pub fn plan<R>(records: Vec<R>) -> PlanResult<R, R::Key>
where
    R: Hierarchical,
{
    let mut known = HashSet::with_capacity(records.len());
    let mut duplicates = Vec::new();

    for record in &records {
        if !known.insert(record.key().clone()) && !duplicates.contains(record.key()) {
            duplicates.push(record.key().clone());
        }
    }

    if !duplicates.is_empty() {
        return Err(Report::new(PlanError::DuplicateIds(duplicates)));
    }

    let (mut batch, mut remaining): (Vec<R>, Vec<R>) = records
        .into_iter()
        .partition(|r| r.parent_key().is_none_or(|p| !known.contains(p)));

    let mut placed = HashSet::with_capacity(known.len());
    let mut batches = Vec::new();

    while !batch.is_empty() {
        placed.extend(batch.iter().map(|r| r.key().clone()));
        batches.push(batch);

        (batch, remaining) = std::mem::take(&mut remaining)
            .into_iter()
            .partition(|r| r.parent_key().is_some_and(|p| placed.contains(p)));
    }

    if !remaining.is_empty() {
        let unplaced = remaining.iter().map(|r| r.key().clone()).collect();
        return Err(Report::new(PlanError::UnplacedRecords(unplaced)));
    }

    debug!(
        "planned {} records into {} batches",
        placed.len(),
        batches.len()
    );

    Ok(Plan { batches })
}
