//! Manual stack-usage overrides (`.msu` files).
//!
//! Overrides exist for functions the toolchain cannot analyze: assembly
//! routines, vendor blobs, ROM entry points. Each line is `name bytes` and
//! seeds a complete leaf record whose declared bound terminates any call
//! path that reaches it.

use std::path::Path;

use crate::diag::Diagnostic;
use crate::model::RecordStore;

use super::IngestError;

/// Ingest a manual-override file.
///
/// Malformed lines are recoverable diagnostics; a name colliding with an
/// already-registered global is fatal, since it would declare a second
/// definition for a function the toolchain already described.
pub fn ingest_manual_overrides(
    store: &mut RecordStore,
    text: &str,
    artifact: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), IngestError> {
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let parsed = match fields.as_slice() {
            [name, bytes] => bytes.parse::<u64>().ok().map(|value| (*name, value)),
            _ => None,
        };
        match parsed {
            Some((name, bytes)) => {
                store.seed_manual(name, bytes)?;
            }
            None => diagnostics.push(Diagnostic::new(
                format!("{}:{}", artifact.display(), index + 1),
                "expected 'name bytes'",
            )),
        }
    }
    Ok(())
}
