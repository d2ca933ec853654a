//! Query Engine subsystem for sheetscope
//!
//! Transforms the static record set into the derived view under the
//! current predicate set.
//!
//! # Execution Flow (strict order)
//!
//! 1. Filter: every constrained dimension must match (AND)
//! 2. Sort: stable, by natural value order of one column
//! 3. Page: 1-based index, clamped into the valid page range
//!
//! # Invariants
//!
//! - Filtered output is a subset of the base records, in input order
//! - Equal sort keys keep their filtered order
//! - A non-empty result never yields an empty page

mod engine;
mod errors;
mod filters;
mod pager;
mod result;
mod sorter;

pub use engine::{compute_view, EngineStats, QueryEngine};
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use filters::PredicateFilter;
pub use pager::PageSpec;
pub use result::{DerivedView, ViewRow};
pub use sorter::ResultSorter;
