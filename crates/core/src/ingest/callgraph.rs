//! Call-graph ingestion from GCC RTL dumps (`.dfinish` files).
//!
//! Each dump is a sequence of function blocks. The block header carries the
//! pretty name and the linker name; the lines below it describe call sites.
//! A call with a quoted target name is a direct call; any other line
//! mentioning `call` is a call whose target cannot be determined
//! syntactically, which poisons the function as indirect-calling.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{FuncId, RecordStore};

use super::IngestError;

static FUNCTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^;; Function (.*) \((\S+), funcdef_no=\d+(, [a-z_]+=\d+)*\)( \([a-z ]+\))?$")
        .expect("function header pattern")
});

static DIRECT_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^.*\(call.*"(.*)".*$"#).expect("direct call pattern"));

static OTHER_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*call .*$").expect("indirect call pattern"));

/// Ingest one unit's RTL dump into the store.
///
/// The linker name in each header must already have a symbol-table record;
/// a miss means the dump and the object file disagree and the run aborts.
pub fn ingest_call_graph(
    store: &mut RecordStore,
    translation_unit: &str,
    text: &str,
    artifact: &Path,
) -> Result<(), IngestError> {
    let mut current: Option<FuncId> = None;

    for (index, line) in text.lines().enumerate() {
        if let Some(captures) = FUNCTION_HEADER.captures(line) {
            let pretty = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let linker_name = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

            let id = store.resolve(translation_unit, linker_name).ok_or_else(|| {
                IngestError::MissingFunctionRecord {
                    name: linker_name.to_string(),
                    translation_unit: translation_unit.to_string(),
                }
            })?;
            let record = store.get_mut(id);
            record.demangled_name = Some(pretty.to_string());
            record.raw_callees.clear();
            record.has_indirect_call = false;
            current = Some(id);
            continue;
        }

        if let Some(captures) = DIRECT_CALL.captures(line) {
            let callee = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let id = current.ok_or_else(|| IngestError::StrayCallLine {
                artifact: artifact.to_path_buf(),
                line: index + 1,
            })?;
            store.get_mut(id).raw_callees.insert(callee.to_string());
            continue;
        }

        if OTHER_CALL.is_match(line) {
            let id = current.ok_or_else(|| IngestError::StrayCallLine {
                artifact: artifact.to_path_buf(),
                line: index + 1,
            })?;
            store.get_mut(id).has_indirect_call = true;
        }
    }
    Ok(())
}
