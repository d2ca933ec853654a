//! Column layout descriptors
//!
//! A layout gives positional columns a meaning: which filter applies, what
//! the label is, and where each dimension sits in the projected query text.
//! Both predicate evaluation and schema projection are driven from here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::value::CellValue;

/// Declared kind of the values in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Integer,
    Number,
    Status,
}

/// How a search dimension treats letter case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMode {
    /// Honors the predicate set's shared case-sensitivity flag
    FollowsFlag,
    /// Always lowercases both sides
    AlwaysInsensitive,
}

/// Inclusive numeric bounds of a range dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_step() -> f64 {
    1.0
}

impl RangeBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: default_step(),
        }
    }

    /// Clamp a value into the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

impl Default for RangeBounds {
    fn default() -> Self {
        Self::new(0.0, 100.0)
    }
}

/// Which filter a column takes part in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterKind {
    /// Not filterable
    None,
    /// Set of allowed values
    Membership,
    /// Closed numeric interval
    Range(RangeBounds),
    /// Substring match
    Search { case: CaseMode },
}

impl FilterKind {
    pub fn is_filterable(&self) -> bool {
        !matches!(self, FilterKind::None)
    }
}

/// One column of the layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
    pub value_kind: ValueKind,
    pub filter: FilterKind,
    #[serde(default = "default_sortable")]
    pub sortable: bool,
    /// Fixed option list; replaces the observed universe when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

fn default_sortable() -> bool {
    true
}

impl ColumnDescriptor {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        value_kind: ValueKind,
        filter: FilterKind,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value_kind,
            filter,
            sortable: true,
            options: None,
        }
    }

    pub fn membership(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, ValueKind::Text, FilterKind::Membership)
    }

    pub fn range(key: impl Into<String>, label: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(
            key,
            label,
            ValueKind::Integer,
            FilterKind::Range(RangeBounds::new(min, max)),
        )
    }

    pub fn search(key: impl Into<String>, label: impl Into<String>, case: CaseMode) -> Self {
        Self::new(key, label, ValueKind::Text, FilterKind::Search { case })
    }

    pub fn plain(key: impl Into<String>, label: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::new(key, label, value_kind, FilterKind::None)
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_value_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }
}

/// Full table layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    #[serde(default = "default_table_name")]
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Column keys in projected clause order; unlisted keys follow in column order
    #[serde(default)]
    pub projection_order: Vec<String>,
    #[serde(default = "default_rows_per_page_options")]
    pub rows_per_page_options: Vec<usize>,
    #[serde(default = "default_rows_per_page")]
    pub default_rows_per_page: usize,
}

fn default_table_name() -> String {
    "records".to_string()
}

fn default_rows_per_page_options() -> Vec<usize> {
    vec![10, 25, 50, 100]
}

fn default_rows_per_page() -> usize {
    10
}

/// Text columns with at most this many distinct values infer as membership
const INFER_MEMBERSHIP_MAX_DISTINCT: usize = 12;

impl ColumnLayout {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            projection_order: Vec::new(),
            rows_per_page_options: default_rows_per_page_options(),
            default_rows_per_page: default_rows_per_page(),
        }
    }

    pub fn with_projection_order(mut self, keys: &[&str]) -> Self {
        self.projection_order = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// The people directory layout the explorer ships with.
    pub fn people() -> Self {
        Self::new(
            "people",
            vec![
                ColumnDescriptor::search("name", "Name", CaseMode::FollowsFlag),
                ColumnDescriptor::range("age", "Age", 0.0, 100.0),
                ColumnDescriptor::membership("occupation", "Occupation"),
                ColumnDescriptor::membership("hobby", "Hobby"),
                ColumnDescriptor::membership("color", "Color"),
                ColumnDescriptor::membership("pet", "Pet"),
                ColumnDescriptor::search("email", "Email", CaseMode::AlwaysInsensitive),
                ColumnDescriptor::plain("value", "Value", ValueKind::Integer),
                ColumnDescriptor::membership("status", "Status")
                    .with_value_kind(ValueKind::Status)
                    .with_options(&["Active", "Inactive"]),
            ],
        )
        .with_projection_order(&[
            "occupation",
            "age",
            "name",
            "status",
            "hobby",
            "color",
            "pet",
            "email",
        ])
    }

    /// Builds a layout from the data itself.
    ///
    /// Numeric columns become ranges over the observed bounds, low-cardinality
    /// text becomes membership, and other text becomes case-following search.
    pub fn infer(headers: &[String], rows: &[Vec<CellValue>]) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let key = column_key(header, index);
                let cells: Vec<&CellValue> = rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .filter(|cell| !cell.is_missing())
                    .collect();

                if !cells.is_empty() && cells.iter().all(|c| c.is_numeric()) {
                    let values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
                    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    let kind = if cells.iter().all(|c| matches!(c, CellValue::Int(_))) {
                        ValueKind::Integer
                    } else {
                        ValueKind::Number
                    };
                    return ColumnDescriptor::range(key, header.clone(), min, max)
                        .with_value_kind(kind);
                }

                let distinct: HashSet<String> = cells.iter().map(|c| c.display_key()).collect();
                if !distinct.is_empty()
                    && distinct.len() <= INFER_MEMBERSHIP_MAX_DISTINCT
                    && distinct.len() * 2 <= rows.len()
                {
                    ColumnDescriptor::membership(key, header.clone())
                } else {
                    ColumnDescriptor::search(key, header.clone(), CaseMode::FollowsFlag)
                }
            })
            .collect();

        Self::new(default_table_name(), columns)
    }

    /// Extends the layout with unfilterable columns for headers it doesn't cover.
    pub fn cover_headers(&mut self, headers: &[String]) {
        for (index, header) in headers.iter().enumerate().skip(self.columns.len()) {
            self.columns.push(ColumnDescriptor::plain(
                column_key(header, index),
                header.clone(),
                ValueKind::Text,
            ));
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    pub fn descriptor(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Column indices in clause order for projection and summaries
    pub fn projection_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = self
            .projection_order
            .iter()
            .filter_map(|key| self.index_of(key))
            .collect();
        for index in 0..self.columns.len() {
            if !order.contains(&index) {
                order.push(index);
            }
        }
        order
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }
}

/// Lowercased, underscore-separated key derived from a header
fn column_key(header: &str, index: usize) -> String {
    let key: String = header
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if key.is_empty() {
        format!("column_{}", index)
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_people_layout_shape() {
        let layout = ColumnLayout::people();
        assert_eq!(layout.len(), 9);
        assert_eq!(layout.index_of("occupation"), Some(2));
        assert_eq!(layout.index_of("status"), Some(8));
        assert_eq!(
            layout.descriptor("email").unwrap().filter,
            FilterKind::Search {
                case: CaseMode::AlwaysInsensitive
            }
        );
        assert_eq!(layout.rows_per_page_options, vec![10, 25, 50, 100]);
    }

    #[test]
    fn test_projection_order_puts_listed_keys_first() {
        let layout = ColumnLayout::people();
        let order = layout.projection_indices();
        // occupation, age, name, status lead
        assert_eq!(&order[..4], &[2, 1, 0, 8]);
        // value is unlisted and trails
        assert_eq!(*order.last().unwrap(), 7);
        assert_eq!(order.len(), 9);
    }

    #[test]
    fn test_infer_layout() {
        let headers = vec!["Name".to_string(), "Age".to_string(), "Team".to_string()];
        let rows: Vec<Vec<CellValue>> = (0..10)
            .map(|i| {
                vec![
                    CellValue::from(format!("person-{}", i)),
                    CellValue::Int(20 + i),
                    CellValue::from(if i % 2 == 0 { "red" } else { "blue" }),
                ]
            })
            .collect();

        let layout = ColumnLayout::infer(&headers, &rows);

        assert!(matches!(layout.columns[0].filter, FilterKind::Search { .. }));
        assert_eq!(
            layout.columns[1].filter,
            FilterKind::Range(RangeBounds::new(20.0, 29.0))
        );
        assert_eq!(layout.columns[2].filter, FilterKind::Membership);
        assert_eq!(layout.columns[2].key, "team");
    }

    #[test]
    fn test_cover_headers_appends_plain_columns() {
        let mut layout = ColumnLayout::new("t", vec![ColumnDescriptor::membership("a", "A")]);
        layout.cover_headers(&["A".to_string(), "Extra Col".to_string()]);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.columns[1].key, "extra_col");
        assert_eq!(layout.columns[1].filter, FilterKind::None);
    }

    #[test]
    fn test_range_clamp() {
        let bounds = RangeBounds::default();
        assert_eq!(bounds.clamp(-5.0), 0.0);
        assert_eq!(bounds.clamp(150.0), 100.0);
        assert_eq!(bounds.clamp(42.0), 42.0);
    }

    #[test]
    fn test_layout_json_round_trip() {
        let layout = ColumnLayout::people();
        let json = serde_json::to_string(&layout).unwrap();
        let back: ColumnLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
    }
}
