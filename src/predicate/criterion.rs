//! Filter criteria, one per dimension

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::records::{FilterKind, RangeBounds};

/// The criterion held for one filter dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    /// Allowed values, in the order they were selected
    Membership { allowed: Vec<String> },
    /// Closed interval, `min <= max`
    Range {
        #[serde(with = "whole_number")]
        min: f64,
        #[serde(with = "whole_number")]
        max: f64,
    },
    /// Substring query; empty means unconstrained
    Text { query: String },
}

impl Criterion {
    /// The unconstrained criterion for a column's filter kind.
    ///
    /// Membership starts with the whole universe selected.
    pub fn unconstrained(filter: &FilterKind, universe: &[String]) -> Option<Self> {
        match filter {
            FilterKind::None => None,
            FilterKind::Membership => Some(Criterion::Membership {
                allowed: universe.to_vec(),
            }),
            FilterKind::Range(bounds) => Some(Criterion::Range {
                min: bounds.min,
                max: bounds.max,
            }),
            FilterKind::Search { .. } => Some(Criterion::Text {
                query: String::new(),
            }),
        }
    }

    /// Whether this criterion has the right shape for the filter kind
    pub fn fits(&self, filter: &FilterKind) -> bool {
        matches!(
            (self, filter),
            (Criterion::Membership { .. }, FilterKind::Membership)
                | (Criterion::Range { .. }, FilterKind::Range(_))
                | (Criterion::Text { .. }, FilterKind::Search { .. })
        )
    }

    /// Whether the criterion excludes nothing.
    ///
    /// A membership selection equal to the universe (as a set) is
    /// unconstrained even though it is recorded verbatim.
    pub fn is_unconstrained(&self, filter: &FilterKind, universe: &[String]) -> bool {
        match (self, filter) {
            (Criterion::Membership { allowed }, _) => same_set(allowed, universe),
            (Criterion::Range { min, max }, FilterKind::Range(bounds)) => {
                covers(*min, *max, bounds)
            }
            (Criterion::Range { .. }, _) => false,
            (Criterion::Text { query }, _) => query.is_empty(),
        }
    }
}

fn covers(min: f64, max: f64, bounds: &RangeBounds) -> bool {
    min <= bounds.min && max >= bounds.max
}

/// Set equality over string lists, ignoring order and duplicates
pub(crate) fn same_set(a: &[String], b: &[String]) -> bool {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

/// Writes whole floats as JSON integers so `[30, 30]` stays `[30, 30]`.
pub(crate) mod whole_number {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        f64::deserialize(deserializer)
    }
}

/// Same as [`whole_number`] for a `[min, max]` pair.
pub(crate) mod whole_pair {
    use serde::ser::SerializeTuple;
    use serde::{Deserialize, Deserializer, Serializer};

    struct Whole(f64);

    impl serde::Serialize for Whole {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            super::whole_number::serialize(&self.0, serializer)
        }
    }

    pub fn serialize<S: Serializer>(pair: &[f64; 2], serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&Whole(pair[0]))?;
        tuple.serialize_element(&Whole(pair[1]))?;
        tuple.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[f64; 2], D::Error> {
        <[f64; 2]>::deserialize(deserializer)
    }
}
