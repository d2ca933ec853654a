//! sheetscope - an interactive query engine over an in-memory tabular dataset
//!
//! Filters, sorts and pages a fixed record set under a composable predicate
//! set, projects the predicates into SQL-like text, and persists named
//! configuration snapshots and per-record annotations through an injected
//! key-value store.

pub mod annotations;
pub mod cli;
pub mod clock;
pub mod configs;
pub mod consent;
pub mod executor;
pub mod insights;
pub mod observability;
pub mod persistence;
pub mod predicate;
pub mod projector;
pub mod records;
pub mod scheduler;
pub mod session;
