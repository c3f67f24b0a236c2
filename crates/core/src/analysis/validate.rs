//! Pre-evaluation completeness check over the record store.

use crate::diag::Diagnostic;
use crate::model::{Readiness, RecordStore};

/// Flip fully-ingested records to `Ready` and report the rest.
///
/// A record that never received its call-graph block or stack-usage entry
/// points at an ingestion gap (artifact mismatch, unparsable line). Such
/// records stay `Pending`: the evaluator refuses them instead of silently
/// treating the missing frame size as zero.
pub fn validate_records(store: &mut RecordStore) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for id in store.ids() {
        let record = store.get(id);
        if record.readiness != Readiness::Pending {
            continue;
        }

        let mut missing = Vec::new();
        if record.demangled_name.is_none() {
            missing.push("call-graph data");
        }
        if record.local_stack_bytes.is_none() {
            missing.push("stack usage");
        }

        if missing.is_empty() {
            store.get_mut(id).readiness = Readiness::Ready;
        } else {
            diagnostics.push(Diagnostic::new(
                format!("{}:{}", record.translation_unit, record.name),
                format!("ingestion incomplete, missing {}", missing.join(" and ")),
            ));
        }
    }
    diagnostics
}
