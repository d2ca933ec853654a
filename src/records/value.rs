//! Cell values
//!
//! Datasets arrive as loosely typed JSON. Cells keep their runtime kind so
//! numeric columns compare numerically and text columns lexically.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Absent position in a short row, or a JSON null
    #[default]
    Missing,
}

impl CellValue {
    /// Converts one JSON cell. Anything that isn't a number or string
    /// degrades instead of being rejected.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Missing,
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Int(i)
                } else {
                    n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Missing)
                }
            }
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Converts back to JSON for replies and persistence
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Int(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Missing => Value::Null,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }

    /// Numeric reading of the cell. Numeric text counts, the way the
    /// source's loose comparisons treated it.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Missing => None,
        }
    }

    /// Text used for membership and substring matching. Missing reads as "".
    pub fn display_key(&self) -> String {
        match self {
            CellValue::Missing => String::new(),
            other => other.to_string(),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            CellValue::Missing => 0,
            CellValue::Int(_) | CellValue::Float(_) => 1,
            CellValue::Text(_) => 2,
        }
    }

    /// Natural ordering used by the sorter.
    ///
    /// - Missing < numbers < text
    /// - Numbers compare numerically regardless of int/float
    /// - Text compares lexically
    pub fn natural_cmp(&self, other: &CellValue) -> Ordering {
        let (a_rank, b_rank) = (self.kind_rank(), other.kind_rank());
        if a_rank != b_rank {
            return a_rank.cmp(&b_rank);
        }

        match (self, other) {
            (CellValue::Int(a), CellValue::Int(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let a_f = a.as_f64().unwrap_or(0.0);
                let b_f = b.as_f64().unwrap_or(0.0);
                a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
            }
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(CellValue::from_json(&raw))
    }
}
