//! Query Engine Tests
//!
//! Tests for the derived view pipeline:
//! - Filtered output is exactly the records satisfying every predicate
//! - Reset is idempotent
//! - Full-select collapse on toggle
//! - Page clamping and stable sorting

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sheetscope::executor::{compute_view, QueryEngine};
use sheetscope::predicate::PredicateSet;
use sheetscope::projector::SchemaProjector;
use sheetscope::records::{CaseMode, CellValue, ColumnDescriptor, ColumnLayout, RecordStore};

// =============================================================================
// Helper Functions
// =============================================================================

const NAMES: [&str; 8] = ["Alice", "bob", "Carol", "dave", "Erin", "FRANK", "grace", "Heidi"];
const JOBS: [&str; 4] = ["Engineer", "Designer", "Teacher", "Chef"];

fn three_column_layout() -> ColumnLayout {
    ColumnLayout::new(
        "people",
        vec![
            ColumnDescriptor::search("name", "Name", CaseMode::FollowsFlag),
            ColumnDescriptor::range("age", "Age", 0.0, 100.0),
            ColumnDescriptor::membership("occupation", "Occupation"),
        ],
    )
}

fn headers() -> Vec<String> {
    vec!["Name".into(), "Age".into(), "Occupation".into()]
}

fn row(name: &str, age: i64, job: &str) -> Vec<CellValue> {
    vec![CellValue::from(name), CellValue::Int(age), CellValue::from(job)]
}

fn random_store(rng: &mut StdRng, rows: usize) -> RecordStore {
    let data = (0..rows)
        .map(|_| {
            row(
                NAMES[rng.gen_range(0..NAMES.len())],
                rng.gen_range(0..=100),
                JOBS[rng.gen_range(0..JOBS.len())],
            )
        })
        .collect();
    RecordStore::new(headers(), data, three_column_layout()).unwrap()
}

fn scenario_store() -> RecordStore {
    RecordStore::new(
        headers(),
        vec![
            row("Alice", 30, "Engineer"),
            row("Bob", 45, "Designer"),
            row("Carol", 30, "Engineer"),
        ],
        three_column_layout(),
    )
    .unwrap()
}

fn names(view: &sheetscope::executor::DerivedView) -> Vec<String> {
    view.rows.iter().map(|r| r.cells[0].display_key()).collect()
}

/// Independent evaluation of the three dimensions
fn satisfies(set: &PredicateSet, cells: &[CellValue]) -> bool {
    let name = cells[0].display_key();
    let age = cells[1].as_f64().unwrap();
    let job = cells[2].display_key();

    let query = set.text("name").unwrap_or_default();
    let name_ok = if set.case_sensitive() {
        name.contains(query)
    } else {
        name.to_lowercase().contains(&query.to_lowercase())
    };
    let (min, max) = set.range("age").unwrap();
    let job_ok = set
        .selected("occupation")
        .unwrap()
        .iter()
        .any(|allowed| *allowed == job);

    name_ok && min <= age && age <= max && job_ok
}

fn random_mutation(rng: &mut StdRng, store: &RecordStore, set: &mut PredicateSet) {
    match rng.gen_range(0..7) {
        0 => {
            set.toggle_membership(store, "occupation", JOBS[rng.gen_range(0..JOBS.len())]);
        }
        1 => {
            set.toggle_all(store, "occupation");
        }
        2 => {
            let a = rng.gen_range(0..=100) as f64;
            let b = rng.gen_range(0..=100) as f64;
            set.set_range(store, "age", a.min(b), a.max(b));
        }
        3 => {
            let name = NAMES[rng.gen_range(0..NAMES.len())];
            let start = rng.gen_range(0..name.len());
            let end = rng.gen_range(start..=name.len());
            set.set_text(store, "name", &name[start..end]);
        }
        4 => {
            let flag = rng.gen_bool(0.5);
            set.set_case_sensitive(flag);
        }
        5 => {
            set.set_sort(store, rng.gen_range(0..3));
        }
        _ => set.reset(store),
    }
}

// =============================================================================
// Filter Correctness Tests
// =============================================================================

/// Filtered output equals the brute-force selection for random predicate sets.
#[test]
fn test_filter_has_no_false_positives_or_negatives() {
    let mut rng = StdRng::seed_from_u64(0x5eed_5c09e);

    for _ in 0..40 {
        let rows = rng.gen_range(0..60);
        let store = random_store(&mut rng, rows);
        let mut set = PredicateSet::for_store(&store);

        for _ in 0..12 {
            random_mutation(&mut rng, &store, &mut set);

            let view = compute_view(&store, &set, 1, store.len().max(1)).unwrap();
            let mut returned: Vec<u64> = view.rows.iter().map(|r| r.id.0).collect();
            returned.sort_unstable();

            let expected: Vec<u64> = store
                .records()
                .iter()
                .filter(|r| satisfies(&set, &r.cells))
                .map(|r| r.id.0)
                .collect();

            assert_eq!(returned, expected, "predicates: {:?}", set);
            assert_eq!(view.total_filtered, expected.len());
        }
    }
}

/// Memoized engine agrees with the pure function across random histories.
#[test]
fn test_engine_agrees_with_pure_compute() {
    let mut rng = StdRng::seed_from_u64(42);
    let store = random_store(&mut rng, 50);
    let mut set = PredicateSet::for_store(&store);
    let mut engine = QueryEngine::new();

    for _ in 0..100 {
        random_mutation(&mut rng, &store, &mut set);
        let page = rng.gen_range(0..8);
        let size = rng.gen_range(1..15);
        assert_eq!(
            engine.compute(&store, &set, page, size).unwrap(),
            compute_view(&store, &set, page, size).unwrap()
        );
    }
}

// =============================================================================
// Predicate Management Tests
// =============================================================================

/// Reset twice equals reset once.
#[test]
fn test_reset_is_idempotent() {
    let store = scenario_store();
    let mut set = PredicateSet::for_store(&store);
    set.set_text(&store, "name", "car");
    set.set_range(&store, "age", 40.0, 50.0);
    set.set_sort(&store, 2);

    set.reset(&store);
    let once = set.clone();
    set.reset(&store);
    assert_eq!(set, once);
    assert_eq!(once, PredicateSet::for_store(&store));
}

/// Toggling one value of a fully selected universe isolates it.
#[test]
fn test_toggle_on_full_selection_collapses() {
    let store = RecordStore::new(
        headers(),
        vec![row("a", 1, "A"), row("b", 2, "B"), row("c", 3, "C")],
        three_column_layout(),
    )
    .unwrap();
    let mut set = PredicateSet::for_store(&store);

    set.toggle_membership(&store, "occupation", "B");
    assert_eq!(set.selected("occupation").unwrap(), ["B".to_string()]);
}

// =============================================================================
// Pagination and Sort Tests
// =============================================================================

/// With 25 rows and page size 10, page 5 is page 3.
#[test]
fn test_page_past_end_equals_last_page() {
    let data = (0..25).map(|i| row(&format!("p{}", i), i, "Chef")).collect();
    let store = RecordStore::new(headers(), data, three_column_layout()).unwrap();
    let set = PredicateSet::for_store(&store);

    let last = compute_view(&store, &set, 3, 10).unwrap();
    let past = compute_view(&store, &set, 5, 10).unwrap();

    assert_eq!(past.rows, last.rows);
    assert_eq!(past.page_index, 3);
    assert_eq!(past.len(), 5);
}

/// Ties keep their input order in both directions.
#[test]
fn test_sort_is_stable() {
    let store = RecordStore::new(
        headers(),
        vec![
            row("first", 30, "Chef"),
            row("young", 20, "Chef"),
            row("second", 30, "Chef"),
            row("third", 30, "Chef"),
        ],
        three_column_layout(),
    )
    .unwrap();
    let mut set = PredicateSet::for_store(&store);

    set.set_sort(&store, 1);
    let view = compute_view(&store, &set, 1, 10).unwrap();
    assert_eq!(names(&view), ["young", "first", "second", "third"]);

    set.set_sort(&store, 1);
    let view = compute_view(&store, &set, 1, 10).unwrap();
    assert_eq!(names(&view), ["first", "second", "third", "young"]);
}

// =============================================================================
// Concrete Scenario
// =============================================================================

/// Age 30..30 keeps Alice and Carol in input order and shows in the schema.
#[test]
fn test_three_person_scenario() {
    let store = scenario_store();
    let mut set = PredicateSet::for_store(&store);

    set.set_range(&store, "age", 30.0, 30.0);
    let view = compute_view(&store, &set, 1, 10).unwrap();
    assert_eq!(names(&view), ["Alice", "Carol"]);

    set.set_sort(&store, 1);
    let view = compute_view(&store, &set, 1, 10).unwrap();
    assert_eq!(names(&view), ["Alice", "Carol"]);

    assert!(SchemaProjector::project(&store, &set).contains("Age BETWEEN 30 AND 30"));
}
