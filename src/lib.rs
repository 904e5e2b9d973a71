//! A sequential async test harness for data-sync clients.
//!
//! Tests are registered into a [`Registry`](registry::Registry) with nested
//! `describe` suites, then drained one at a time by the
//! [`SequentialRunner`](runner::SequentialRunner). Bodies assert with
//! [`expect`](expect::expect) and wait for change notifications with the
//! [`collect`] collectors. The [`suite`] module holds a conformance suite for
//! [`DataStore`](datastore::DataStore) implementations.

pub mod collect;
pub mod config;
pub mod datastore;
pub mod expect;
pub mod formatter;
pub mod outcome;
pub mod registry;
pub mod subscription;
pub mod suite;
pub mod test;

mod strategy;
pub use strategy::*;

mod harness;
pub use harness::*;

mod report;
pub use report::*;
