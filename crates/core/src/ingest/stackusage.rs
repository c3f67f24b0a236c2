//! Stack-usage ingestion from GCC `.su` reports.
//!
//! Two line grammars exist in the wild, differing in how the function is
//! spelled after the `file:line:col:` prefix. Both normalize to a pretty
//! name plus a byte count. Functions are matched by pretty name because the
//! report uses decorated names while the symbol table uses linker names.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diag::Diagnostic;
use crate::model::RecordStore;

use super::IngestError;

static SU_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^ :]+):(\d+):(\d+):(.+)\t(\d+)\t(\S+)$").expect("stack-usage pattern")
});

static SU_LINE_ALT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\n:]+):(\d+):(\d+):([\w\d\s\*_]+)\s+([\w\d_]+)\(.*\)\t+(\d+)\t+")
        .expect("alternate stack-usage pattern")
});

/// Ingest one unit's stack-usage report.
///
/// Lines matching neither grammar are recoverable: they become diagnostics
/// and leave the affected record without a frame size, which keeps it out of
/// evaluation. A line naming a function absent from the store is fatal.
pub fn ingest_stack_usage(
    store: &mut RecordStore,
    translation_unit: &str,
    text: &str,
    artifact: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), IngestError> {
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let (pretty_name, bytes_text) = if let Some(captures) = SU_LINE.captures(line) {
            (
                captures.get(4).map_or("", |m| m.as_str()),
                captures.get(5).map_or("", |m| m.as_str()),
            )
        } else if let Some(captures) = SU_LINE_ALT.captures(line) {
            (
                captures.get(5).map_or("", |m| m.as_str()),
                captures.get(6).map_or("", |m| m.as_str()),
            )
        } else {
            diagnostics.push(Diagnostic::new(
                format!("{}:{}", artifact.display(), index + 1),
                "line matches no stack-usage grammar",
            ));
            continue;
        };

        let bytes: u64 = match bytes_text.parse() {
            Ok(value) => value,
            Err(_) => {
                diagnostics.push(Diagnostic::new(
                    format!("{}:{}", artifact.display(), index + 1),
                    format!("stack size '{bytes_text}' does not fit in 64 bits"),
                ));
                continue;
            }
        };

        let id = store.resolve_by_demangled_name(translation_unit, pretty_name).ok_or_else(
            || IngestError::MissingFunctionRecord {
                name: pretty_name.to_string(),
                translation_unit: translation_unit.to_string(),
            },
        )?;
        store.get_mut(id).local_stack_bytes = Some(bytes);
    }
    Ok(())
}
