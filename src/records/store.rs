//! Record Store
//!
//! Holds the immutable base dataset: headers, rows of typed cells, and the
//! column layout that gives them meaning. Nothing here mutates after load.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{RecordError, RecordResult};
use super::layout::{ColumnLayout, FilterKind};
use super::value::CellValue;

static MISSING: CellValue = CellValue::Missing;
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Dataset input shape: `{ headers: string[], rows: (string|number)[][] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Parse a dataset from JSON text
    pub fn from_json(json: &str) -> RecordResult<Self> {
        serde_json::from_str(json).map_err(|e| RecordError::DatasetParse(e.to_string()))
    }

    /// Read a dataset file
    pub fn load(path: &Path) -> RecordResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| RecordError::DatasetRead(path.display().to_string(), e.to_string()))?;
        Self::from_json(&content)
    }
}

/// Surrogate identity of a record: its ordinal in the base dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

impl RecordId {
    /// Parses the `row-{n}` form
    pub fn parse(raw: &str) -> Option<Self> {
        raw.strip_prefix("row-")?.parse::<u64>().ok().map(RecordId)
    }
}

/// How annotation owners are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// `row-{n}` surrogate ids, unique per record
    #[default]
    Surrogate,
    /// The first column's display value; collides when values repeat
    FirstColumn,
}

/// A single row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub cells: Vec<CellValue>,
}

impl Record {
    /// Cell at `column`, or `Missing` for short rows
    pub fn cell(&self, column: usize) -> &CellValue {
        self.cells.get(column).unwrap_or(&MISSING)
    }
}

/// The immutable base dataset
#[derive(Debug, Clone)]
pub struct RecordStore {
    headers: Vec<String>,
    records: Vec<Record>,
    layout: ColumnLayout,
    /// Per-column universe; empty for non-membership columns
    universes: Vec<Vec<String>>,
    identity: IdentityMode,
    generation: u64,
}

impl RecordStore {
    /// Creates a store with an explicit layout.
    ///
    /// Headers beyond the layout are appended as unfilterable columns.
    pub fn new(
        headers: Vec<String>,
        rows: Vec<Vec<CellValue>>,
        mut layout: ColumnLayout,
    ) -> RecordResult<Self> {
        if headers.is_empty() {
            return Err(RecordError::NoHeaders);
        }
        if layout.len() > headers.len() {
            return Err(RecordError::LayoutMismatch(layout.len(), headers.len()));
        }

        let mut seen = HashSet::new();
        for column in &layout.columns {
            if !seen.insert(column.key.as_str()) {
                return Err(RecordError::DuplicateColumnKey(column.key.clone()));
            }
        }

        layout.cover_headers(&headers);

        let records: Vec<Record> = rows
            .into_iter()
            .enumerate()
            .map(|(ordinal, cells)| Record {
                id: RecordId(ordinal as u64),
                cells,
            })
            .collect();

        let universes = layout
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| match (&column.filter, &column.options) {
                (FilterKind::Membership, Some(options)) => options.clone(),
                (FilterKind::Membership, None) => observed_values(&records, index),
                _ => Vec::new(),
            })
            .collect();

        Ok(Self {
            headers,
            records,
            layout,
            universes,
            identity: IdentityMode::default(),
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Creates a store whose layout is inferred from the data
    pub fn with_inferred_layout(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> RecordResult<Self> {
        let layout = ColumnLayout::infer(&headers, &rows);
        Self::new(headers, rows, layout)
    }

    /// Builds a store from the JSON input shape
    pub fn from_dataset(dataset: Dataset, layout: Option<ColumnLayout>) -> RecordResult<Self> {
        let rows: Vec<Vec<CellValue>> = dataset
            .rows
            .iter()
            .map(|row| row.iter().map(CellValue::from_json).collect())
            .collect();

        match layout {
            Some(layout) => Self::new(dataset.headers, rows, layout),
            None => Self::with_inferred_layout(dataset.headers, rows),
        }
    }

    pub fn with_identity(mut self, identity: IdentityMode) -> Self {
        self.identity = identity;
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifies this dataset instance for memoization
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn identity(&self) -> IdentityMode {
        self.identity
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.0 as usize)
    }

    /// Distinct values of a membership column, in first-appearance order
    /// (or the descriptor's fixed options).
    pub fn universe(&self, column: usize) -> &[String] {
        self.universes.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Annotation owner key of a record under the configured identity mode
    pub fn owner_key(&self, record: &Record) -> String {
        match self.identity {
            IdentityMode::Surrogate => record.id.to_string(),
            IdentityMode::FirstColumn => record.cell(0).display_key(),
        }
    }

    /// Resolves an owner key back to a record, if it names one
    pub fn resolve_owner(&self, owner: &str) -> Option<&Record> {
        match self.identity {
            IdentityMode::Surrogate => RecordId::parse(owner).and_then(|id| self.get(id)),
            IdentityMode::FirstColumn => self
                .records
                .iter()
                .find(|record| record.cell(0).display_key() == owner),
        }
    }
}

fn observed_values(records: &[Record], column: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for record in records {
        let key = record.cell(column).display_key();
        if seen.insert(key.clone()) {
            values.push(key);
        }
    }
    values
}
