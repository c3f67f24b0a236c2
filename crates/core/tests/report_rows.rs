use std::collections::BTreeMap;

use wcs_core::model::{Linkage, RecordStore, WorstCase};
use wcs_core::report::{check_budgets, BudgetViolationKind, StackReport};

fn store_with_bounds(rows: &[(&str, &str, WorstCase)]) -> RecordStore {
    let mut store = RecordStore::new();
    for (tu, name, worst_case) in rows {
        let id = store.register(tu, name, Linkage::Local).expect("register");
        let record = store.get_mut(id);
        record.demangled_name = Some(name.to_string());
        record.set_worst_case(*worst_case);
    }
    store
}

#[test]
fn unbounded_rows_sort_first_then_numeric_descending() {
    let store = store_with_bounds(&[
        ("a.c", "w", WorstCase::Unbounded),
        ("a.c", "x", WorstCase::Bounded(24)),
        ("b.c", "y", WorstCase::Bounded(8)),
        ("b.c", "z", WorstCase::Unbounded),
    ]);

    let report = StackReport::from_store(&store);
    let cells: Vec<(&str, WorstCase)> =
        report.rows.iter().map(|r| (r.function.as_str(), r.worst_case)).collect();
    assert_eq!(
        cells,
        vec![
            ("w", WorstCase::Unbounded),
            ("z", WorstCase::Unbounded),
            ("x", WorstCase::Bounded(24)),
            ("y", WorstCase::Bounded(8)),
        ]
    );
}

#[test]
fn incomplete_rows_sink_to_the_bottom() {
    let store = store_with_bounds(&[
        ("a.c", "pending", WorstCase::Unknown),
        ("a.c", "big", WorstCase::Bounded(512)),
    ]);

    let report = StackReport::from_store(&store);
    assert_eq!(report.rows.last().unwrap().function, "pending");
    let text = report.render_text();
    assert!(text.contains("incomplete"));
}

#[test]
fn provisional_bound_renders_with_unresolved_marker() {
    let mut store = RecordStore::new();
    let id = store.register("a.c", "poll", Linkage::Global).expect("register");
    let record = store.get_mut(id);
    record.demangled_name = Some("poll".into());
    record.unresolved_callees.insert("hal_read".into());
    record.set_worst_case(WorstCase::Bounded(72));

    let report = StackReport::from_store(&store);
    let text = report.render_text();
    assert!(text.contains("unbounded:72"), "table was:\n{text}");
    assert!(text.contains("(hal_read)"), "table was:\n{text}");
}

#[test]
fn superseded_weak_records_are_absent_from_the_report() {
    let mut store = RecordStore::new();
    store.register("a.c", "irq_handler", Linkage::Weak).expect("weak");
    let strong = store.register("b.c", "irq_handler", Linkage::Global).expect("strong");
    store.promote_weak_symbols();
    let record = store.get_mut(strong);
    record.demangled_name = Some("irq_handler".into());
    record.set_worst_case(WorstCase::Bounded(32));

    let report = StackReport::from_store(&store);
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].translation_unit, "b.c");
}

#[test]
fn header_labels_are_present() {
    let store = store_with_bounds(&[("a.c", "main", WorstCase::Bounded(16))]);
    let text = StackReport::from_store(&store).render_text();
    assert!(text.contains("Translation Unit"));
    assert!(text.contains("Function Name"));
    assert!(text.contains("Stack"));
    assert!(text.contains("Unresolved Dependencies"));
}

#[test]
fn budgets_pass_only_on_proven_bounds_within_limit() {
    let store = store_with_bounds(&[
        ("a.c", "fits", WorstCase::Bounded(100)),
        ("a.c", "too_big", WorstCase::Bounded(300)),
        ("a.c", "spins", WorstCase::Unbounded),
        ("a.c", "stuck", WorstCase::Unknown),
    ]);
    let report = StackReport::from_store(&store);

    let budgets = BTreeMap::from([
        ("fits".to_string(), 128),
        ("too_big".to_string(), 128),
        ("spins".to_string(), 128),
        ("stuck".to_string(), 128),
        ("missing".to_string(), 128),
    ]);
    let violations = check_budgets(&report, &budgets);

    assert_eq!(violations.len(), 4);
    let by_name: BTreeMap<&str, &BudgetViolationKind> =
        violations.iter().map(|v| (v.function.as_str(), &v.kind)).collect();
    assert!(!by_name.contains_key("fits"));
    assert_eq!(by_name["too_big"], &BudgetViolationKind::OverBudget { bound: 300 });
    assert_eq!(by_name["spins"], &BudgetViolationKind::Unbounded);
    assert_eq!(by_name["stuck"], &BudgetViolationKind::NotAnalyzed);
    assert_eq!(by_name["missing"], &BudgetViolationKind::NotAnalyzed);
}

#[test]
fn provisional_bound_within_limit_still_violates_its_budget() {
    let mut store = RecordStore::new();
    let id = store.register("a.c", "poll", Linkage::Global).expect("register");
    let record = store.get_mut(id);
    record.demangled_name = Some("poll".into());
    record.unresolved_callees.insert("hal_read".into());
    record.set_worst_case(WorstCase::Bounded(72));

    let report = StackReport::from_store(&store);
    let budgets = BTreeMap::from([("poll".to_string(), 128)]);
    let violations = check_budgets(&report, &budgets);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, BudgetViolationKind::Provisional { bound: 72 });
}
