//! Record Store subsystem
//!
//! Owns the immutable base dataset and the column layout describing it.

mod errors;
mod layout;
mod store;
mod value;

pub use errors::{RecordError, RecordResult};
pub use layout::{CaseMode, ColumnDescriptor, ColumnLayout, FilterKind, RangeBounds, ValueKind};
pub use store::{Dataset, IdentityMode, Record, RecordId, RecordStore};
pub use value::CellValue;
