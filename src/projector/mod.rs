//! Schema Projector subsystem
//!
//! Presentational text derived from the predicate set: the SQL-like schema
//! string stored with snapshots, and the filter summary readout.

mod schema;
mod summary;

pub use schema::SchemaProjector;
pub use summary::{QuerySummary, SummaryEntry};
