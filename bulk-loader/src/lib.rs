//! Loads self-referencing records into a store that enforces a child → parent
//! foreign key.
//!
//! Records arrive in any order. [`plan`] layers them breadth-first so that every
//! record lands in a batch strictly after the batch holding its parent, and
//! [`execute`] feeds those batches, in order, to a [`BulkInsert`] store.
use serde::Deserialize;
use std::fmt::Debug;
use std::hash::Hash;

mod execute;
mod plan;
pub mod tabular;

pub use execute::{BulkInsert, ImportError, ImportErrorKind, ImportSummary, InsertError, Violation, execute};
pub use plan::{Plan, PlanError, plan};

/// Key type a record is identified by. Compared by exact equality only.
pub trait RecordKey: Debug + Clone + Eq + Hash + Send + Sync + 'static {}

impl<T> RecordKey for T where T: Debug + Clone + Eq + Hash + Send + Sync + 'static {}

/// A record that may point at a parent record of the same kind.
pub trait Hierarchical {
    type Key: RecordKey;

    fn key(&self) -> &Self::Key;

    /// `None` for roots. A key that is not part of the imported records is
    /// assumed to already be persisted.
    fn parent_key(&self) -> Option<&Self::Key>;
}

/// A flat, self-referencing import row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportRecord<K> {
    pub id: K,
    pub name: String,
    pub parent_id: Option<K>,
}

impl<K> ImportRecord<K> {
    pub fn new(id: K, name: impl Into<String>, parent_id: Option<K>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }

    pub fn root(id: K, name: impl Into<String>) -> Self {
        Self::new(id, name, None)
    }

    pub fn child(id: K, name: impl Into<String>, parent_id: K) -> Self {
        Self::new(id, name, Some(parent_id))
    }
}

impl<K: RecordKey> Hierarchical for ImportRecord<K> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.id
    }

    fn parent_key(&self) -> Option<&Self::Key> {
        self.parent_id.as_ref()
    }
}
