//! Call-graph construction: raw callee names to record references.

use crate::model::{Readiness, RecordStore};

/// Resolve every record's raw callees against the finished symbol tables.
///
/// Must run only after all units' symbols are registered and weak promotion
/// is done; resolving earlier would spuriously mark cross-unit calls as
/// unresolved. Names that resolve become graph edges; the rest are kept
/// verbatim so the report can show what the bound does not cover.
pub fn resolve_all_calls(store: &mut RecordStore) {
    for id in store.ids() {
        let record = store.get(id);
        if record.readiness == Readiness::Superseded {
            continue;
        }
        let unit = record.translation_unit.clone();
        let raw: Vec<String> = record.raw_callees.iter().cloned().collect();

        for name in raw {
            match store.resolve(&unit, &name) {
                Some(callee) => {
                    store.get_mut(id).resolved_callees.insert(callee);
                }
                None => {
                    store.get_mut(id).unresolved_callees.insert(name);
                }
            }
        }
    }
}
