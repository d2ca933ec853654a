//! Predicate Set subsystem
//!
//! The working filter state: one criterion per filterable column, a shared
//! case-sensitivity flag, and the sort specification.

mod criterion;
mod set;
mod sort;

pub use criterion::Criterion;
pub use set::PredicateSet;
pub use sort::{SortDirection, SortSpec};

pub(crate) use criterion::{same_set, whole_pair};
