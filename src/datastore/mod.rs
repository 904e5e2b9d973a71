//! The data-sync client contract the conformance suite is written against.
//!
//! A [`DataStore`] persists typed [`Model`] records and notifies observers
//! about changes. [`MemoryStore`] is the in-memory implementation shipped with
//! the crate. It has no network, no persistence and no conflict resolution.

use std::{fmt::Debug, rc::Rc};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::subscription::Subscription;

pub mod memory;
pub mod model;

pub use memory::MemoryStore;
pub use model::{BasicModel, Comment, Post, make_id};

/// Fields every record carries, managed by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Meta {
    /// Generated on first save when empty.
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A record type a [`DataStore`] can persist.
pub trait Model: Clone + Debug + Serialize + 'static {
    /// The primary key, unique within the model.
    type Key: Clone + Debug + PartialEq + 'static;

    const NAME: &'static str;

    fn key(&self) -> Self::Key;

    fn meta(&self) -> &Meta;

    fn meta_mut(&mut self) -> &mut Meta;

    fn id(&self) -> &str {
        &self.meta().id
    }

    /// Checked before every save.
    fn validate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Clone the record and apply `mutator` to the copy.
    fn copy_of(&self, mutator: impl FnOnce(&mut Self)) -> Self {
        let mut copy = self.clone();
        mutator(&mut copy);
        copy
    }
}

/// Selects records of a model.
pub enum Criteria<M: Model> {
    All,
    Key(M::Key),
    Matching(Rc<dyn Fn(&M) -> bool>),
}

impl<M: Model> Criteria<M> {
    pub fn all() -> Self {
        Self::All
    }

    pub fn key(key: impl Into<M::Key>) -> Self {
        Self::Key(key.into())
    }

    /// The record with the same primary key as `record`.
    pub fn of(record: &M) -> Self {
        Self::Key(record.key())
    }

    pub fn matching(predicate: impl Fn(&M) -> bool + 'static) -> Self {
        Self::Matching(Rc::new(predicate))
    }

    pub fn matches(&self, record: &M) -> bool {
        match self {
            Self::All => true,
            Self::Key(key) => record.key() == *key,
            Self::Matching(predicate) => predicate(record),
        }
    }
}

impl<M: Model> Clone for Criteria<M> {
    fn clone(&self) -> Self {
        match self {
            Self::All => Self::All,
            Self::Key(key) => Self::Key(key.clone()),
            Self::Matching(predicate) => Self::Matching(Rc::clone(predicate)),
        }
    }
}

impl<M: Model> Debug for Criteria<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Self::Matching(_) => write!(f, "Matching(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpType {
    Insert,
    Update,
    Delete,
}

/// A single mutation delivered to [`DataStore::observe`] subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent<M> {
    pub op_type: OpType,
    pub element: M,
}

/// A full result set delivered to [`DataStore::observe_query`] subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<M> {
    pub items: Vec<M>,
    pub is_synced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("{field} is required")]
    MissingField {
        model: &'static str,
        field: &'static str,
    },

    #[error("cannot change the primary key of {model} {id}")]
    ImmutableKey { model: &'static str, id: String },
}

/// Client side of a data-sync engine.
///
/// Mutations resolve once the local state changed. Change notifications are
/// pushed into the subscriptions returned by [`observe`](Self::observe) and
/// [`observe_query`](Self::observe_query).
#[allow(async_fn_in_trait)]
pub trait DataStore {
    /// Insert or update `record`, returning it with id and timestamps populated.
    async fn save<M: Model>(&self, record: M) -> Result<M, StoreError>;

    async fn query<M: Model>(&self, criteria: Criteria<M>) -> Result<Vec<M>, StoreError>;

    async fn query_by_key<M: Model>(&self, key: M::Key) -> Result<Option<M>, StoreError> {
        Ok(self.query(Criteria::Key(key)).await?.pop())
    }

    /// Remove every matching record and return them.
    ///
    /// Nothing matching is not an error, the result is empty then.
    async fn delete<M: Model>(&self, criteria: Criteria<M>) -> Result<Vec<M>, StoreError>;

    fn observe<M: Model>(&self, criteria: Criteria<M>) -> Subscription<ChangeEvent<M>>;

    /// Yields the current result set right away and a fresh one after every matching change.
    fn observe_query<M: Model>(&self, criteria: Criteria<M>) -> Subscription<Snapshot<M>>;

    /// Wipe all local state and close open subscriptions.
    async fn clear(&self) -> Result<(), StoreError>;
}
