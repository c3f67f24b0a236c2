//! Memoized, cycle-safe worst-case stack evaluation.
//!
//! The bound for a function is its own frame size plus the *maximum* over
//! its resolved callees: sibling calls never coexist on the stack, so the
//! worst single path dominates. Recursion (direct or mutual) and indirect
//! calls have no finite bound and evaluate to unbounded, which propagates to
//! every caller. Unresolved callees contribute zero bytes but taint the
//! bound through the record's unresolved-name set.

use thiserror::Error;

use crate::diag::Diagnostic;
use crate::model::{FuncId, Readiness, RecordStore, WorstCase};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    /// A traversal reached a record whose required fields were never
    /// populated. Defaulting the missing frame size to zero would produce a
    /// bound that looks sound and is not, so the whole path fails instead.
    #[error("function '{name}' in {translation_unit} is missing ingested data")]
    IncompleteRecord { name: String, translation_unit: String },
}

/// Evaluate every eligible record, memoizing results in the store.
///
/// Evaluation order is irrelevant: memoization makes results
/// path-independent, and the on-path cycle check does not depend on the
/// traversal start point. Records that cannot be evaluated (incomplete
/// ingestion somewhere on their call path) are left at `Unknown` and
/// reported as diagnostics rather than aborting the remaining roots.
pub fn evaluate_all(store: &mut RecordStore) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut on_path = vec![false; store.len()];

    for id in store.ids() {
        if store.get(id).readiness != Readiness::Ready {
            continue;
        }
        if let Err(err) = evaluate(store, id, &mut on_path) {
            let record = store.get(id);
            diagnostics.push(Diagnostic::new(
                format!("{}:{}", record.translation_unit, record.name),
                format!("not evaluated: {err}"),
            ));
            // The failed walk left stale on-path marks behind; start clean.
            on_path.iter_mut().for_each(|mark| *mark = false);
        }
    }
    diagnostics
}

/// Depth-first evaluation of one record.
///
/// `on_path` marks the records on the current DFS path, indexed by
/// [`FuncId`]. Revisiting an on-path record is recursion and terminates that
/// record as unbounded; a plain visited set would also misclassify
/// diamond-shaped (shared subtree, non-cyclic) graphs, which stay boundable
/// here. The memoization check guarantees each record is fully evaluated at
/// most once, so total work is linear in records plus edges.
pub fn evaluate(
    store: &mut RecordStore,
    id: FuncId,
    on_path: &mut [bool],
) -> Result<WorstCase, EvalError> {
    let record = store.get(id);
    if record.worst_case.is_known() {
        return Ok(record.worst_case);
    }
    if record.readiness != Readiness::Ready {
        return Err(EvalError::IncompleteRecord {
            name: record.name.clone(),
            translation_unit: record.translation_unit.clone(),
        });
    }
    if record.has_indirect_call {
        store.get_mut(id).set_worst_case(WorstCase::Unbounded);
        return Ok(WorstCase::Unbounded);
    }
    if on_path[id.0] {
        store.get_mut(id).set_worst_case(WorstCase::Unbounded);
        return Ok(WorstCase::Unbounded);
    }

    on_path[id.0] = true;
    let callees: Vec<FuncId> = store.get(id).resolved_callees.iter().copied().collect();
    let mut deepest_callee = 0u64;

    for callee in callees {
        let result = evaluate(store, callee, on_path)?;
        match result {
            WorstCase::Unbounded => {
                on_path[id.0] = false;
                store.get_mut(id).set_worst_case(WorstCase::Unbounded);
                return Ok(WorstCase::Unbounded);
            }
            WorstCase::Bounded(bytes) => deepest_callee = deepest_callee.max(bytes),
            WorstCase::Unknown => unreachable!("evaluate returned a non-terminal result"),
        }
        // Uncertainty propagates upward: a caller's bound is only as
        // trustworthy as every callee's.
        let tainted: Vec<String> =
            store.get(callee).unresolved_callees.iter().cloned().collect();
        store.get_mut(id).unresolved_callees.extend(tainted);
    }
    on_path[id.0] = false;

    let local = store.get(id).local_stack_bytes.ok_or_else(|| {
        let record = store.get(id);
        EvalError::IncompleteRecord {
            name: record.name.clone(),
            translation_unit: record.translation_unit.clone(),
        }
    })?;
    let bound = WorstCase::Bounded(deepest_callee + local);
    store.get_mut(id).set_worst_case(bound);
    Ok(bound)
}
