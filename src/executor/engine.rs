//! Query engine
//!
//! Produces the derived view in strict stage order:
//! 1. Filter the base records by every constrained dimension
//! 2. Sort the filtered records (stable)
//! 3. Clamp the page index and window the sorted records
//!
//! Each stage depends only on the previous stage's output plus its own
//! parameters, so `QueryEngine` caches the filter and sort stages and
//! reruns a stage only when its inputs differ structurally.

use std::collections::BTreeMap;

use crate::observability::{trace_event, Event};
use crate::predicate::{Criterion, PredicateSet, SortSpec};
use crate::records::{Record, RecordStore};

use super::errors::ExecutorResult;
use super::filters::PredicateFilter;
use super::pager::PageSpec;
use super::result::{DerivedView, ViewRow};
use super::sorter::ResultSorter;

/// Computes a view with no caching.
///
/// Pure over its inputs: the same store, predicates and page always yield
/// the same view.
pub fn compute_view(
    store: &RecordStore,
    predicates: &PredicateSet,
    page_index: usize,
    page_size: usize,
) -> ExecutorResult<DerivedView> {
    let page = PageSpec::new(page_index, page_size)?;
    let filtered = filter_stage(store, predicates);
    let sorted = sort_stage(store, &filtered, &predicates.sort());
    Ok(page_stage(store, &sorted, page))
}

fn filter_stage(store: &RecordStore, predicates: &PredicateSet) -> Vec<usize> {
    let filter = PredicateFilter::compile(store, predicates);
    store
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| filter.matches(record))
        .map(|(position, _)| position)
        .collect()
}

fn sort_stage(store: &RecordStore, filtered: &[usize], sort: &SortSpec) -> Vec<usize> {
    let records = store.records();
    let mut refs: Vec<&Record> = filtered.iter().map(|&i| &records[i]).collect();
    ResultSorter::sort(&mut refs, sort);
    refs.iter().map(|r| r.id.0 as usize).collect()
}

fn page_stage(store: &RecordStore, sorted: &[usize], page: PageSpec) -> DerivedView {
    let total = sorted.len();
    let records = store.records();
    let rows = sorted[page.window(total)]
        .iter()
        .map(|&i| {
            let record = &records[i];
            ViewRow {
                id: record.id,
                owner: store.owner_key(record),
                cells: record.cells.clone(),
            }
        })
        .collect();

    DerivedView {
        rows,
        page_index: page.clamped_index(total),
        page_size: page.size(),
        total_pages: page.total_pages(total),
        total_filtered: total,
        total_records: store.len(),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FilterKey {
    generation: u64,
    criteria: BTreeMap<String, Criterion>,
    case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct SortKey {
    filtered: Vec<usize>,
    sort: SortSpec,
}

/// How often each stage actually ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub filter_runs: u64,
    pub sort_runs: u64,
}

/// Memoizing query engine
#[derive(Debug, Default)]
pub struct QueryEngine {
    filter_memo: Option<(FilterKey, Vec<usize>)>,
    sort_memo: Option<(SortKey, Vec<usize>)>,
    stats: EngineStats,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the view, reusing cached stages whose inputs are unchanged.
    pub fn compute(
        &mut self,
        store: &RecordStore,
        predicates: &PredicateSet,
        page_index: usize,
        page_size: usize,
    ) -> ExecutorResult<DerivedView> {
        let page = PageSpec::new(page_index, page_size)?;
        Ok(self.compute_page(store, predicates, page))
    }

    /// Same as [`compute`](Self::compute) for an already validated page
    pub fn compute_page(
        &mut self,
        store: &RecordStore,
        predicates: &PredicateSet,
        page: PageSpec,
    ) -> DerivedView {
        let filter_key = FilterKey {
            generation: store.generation(),
            criteria: predicates.criteria().clone(),
            case_sensitive: predicates.case_sensitive(),
        };
        let filtered = match &self.filter_memo {
            Some((key, cached)) if *key == filter_key => cached.clone(),
            _ => {
                self.stats.filter_runs += 1;
                let output = filter_stage(store, predicates);
                self.filter_memo = Some((filter_key, output.clone()));
                output
            }
        };

        let sort_key = SortKey {
            filtered,
            sort: predicates.sort(),
        };
        let sorted = match &self.sort_memo {
            Some((key, cached)) if *key == sort_key => cached.clone(),
            _ => {
                self.stats.sort_runs += 1;
                let output = sort_stage(store, &sort_key.filtered, &sort_key.sort);
                self.sort_memo = Some((sort_key, output.clone()));
                output
            }
        };

        let view = page_stage(store, &sorted, page);

        let effective = view.page_index.to_string();
        if view.page_index != page.index().max(1) {
            let requested = page.index().to_string();
            trace_event(
                Event::PageClamped,
                &[("requested", requested.as_str()), ("effective", effective.as_str())],
            );
        }
        let filtered = view.total_filtered.to_string();
        let total = view.total_records.to_string();
        trace_event(
            Event::ViewComputed,
            &[
                ("filtered", filtered.as_str()),
                ("page", effective.as_str()),
                ("total", total.as_str()),
            ],
        );

        view
    }

    /// Drops both cached stages
    pub fn invalidate(&mut self) {
        self.filter_memo = None;
        self.sort_memo = None;
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}
