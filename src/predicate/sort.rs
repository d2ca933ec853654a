//! Sort specification
//!
//! Serialized exactly as the persisted `sortConfig`:
//! `{"key": number|null, "direction": "ascending"|"descending"}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Column to sort by and direction. `key: None` keeps input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: Option<usize>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn asc(column: usize) -> Self {
        Self {
            key: Some(column),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            key: Some(column),
            direction: SortDirection::Descending,
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.key.is_some()
    }

    /// Header-click semantics: the same column toggles direction,
    /// a new column starts ascending.
    pub fn requested(&self, column: usize) -> Self {
        if self.key == Some(column) {
            Self {
                key: Some(column),
                direction: self.direction.flipped(),
            }
        } else {
            Self::asc(column)
        }
    }
}
