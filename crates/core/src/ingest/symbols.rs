//! Symbol-table ingestion: one object file per translation unit.
//!
//! Symbols are obtained by shelling out to a `readelf`-style dumper. The
//! invocation sits behind a trait so tests (and alternative toolchains) can
//! substitute their own dump source.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::model::{Linkage, RecordStore, StoreError};

use super::IngestError;

/// Environment variable naming a directory of canned dumper output.
///
/// When set, `<dir>/<object file name>.txt` is read instead of invoking the
/// real tool, so tests do not need a cross-binutils install.
pub const READELF_FAKE_DIR_ENV: &str = "STACKBOUND_READELF_FAKE_DIR";

/// Environment variable overriding the readelf executable path.
pub const READELF_BIN_ENV: &str = "STACKBOUND_READELF";

/// Source of symbol-table text for an object file.
pub trait SymbolDumper {
    fn dump(&self, object: &Path) -> Result<String, IngestError>;
    fn name(&self) -> &'static str;
}

/// Default dumper: runs `readelf -s -W <object>`.
pub struct ReadelfDumper {
    readelf_path: PathBuf,
}

impl ReadelfDumper {
    pub fn new(readelf_path: impl Into<PathBuf>) -> Self {
        Self { readelf_path: readelf_path.into() }
    }
}

impl Default for ReadelfDumper {
    fn default() -> Self {
        let path = std::env::var_os(READELF_BIN_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("readelf"));
        Self::new(path)
    }
}

impl SymbolDumper for ReadelfDumper {
    fn dump(&self, object: &Path) -> Result<String, IngestError> {
        if let Some(fake_dir) = std::env::var_os(READELF_FAKE_DIR_ENV) {
            let file_name = object
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            let fake = PathBuf::from(fake_dir).join(format!("{file_name}.txt"));
            return fs::read_to_string(&fake).map_err(|e| {
                IngestError::Dumper(format!("failed to read {}: {e}", fake.display()))
            });
        }

        let output = Command::new(&self.readelf_path)
            .args(["-s", "-W"])
            .arg(object)
            .output()
            .map_err(|e| {
                IngestError::Dumper(format!(
                    "failed to spawn {}: {e}",
                    self.readelf_path.display()
                ))
            })?;
        if !output.status.success() {
            return Err(IngestError::Dumper(format!(
                "{} exited with {} for {}",
                self.readelf_path.display(),
                output.status,
                object.display()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn name(&self) -> &'static str {
        "readelf"
    }
}

/// One `FUNC` row from a symbol-table dump, before binding interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol {
    pub name: String,
    pub binding: String,
}

/// Extract named function symbols from `readelf -s -W` output.
///
/// Columns are `Num: Value Size Type Bind Vis Ndx Name`; header lines, blank
/// lines, non-function symbols, and unnamed entries are skipped.
pub fn parse_symbol_table(text: &str) -> Vec<RawSymbol> {
    let mut symbols = Vec::new();
    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 8 || fields[3] != "FUNC" {
            continue;
        }
        symbols.push(RawSymbol { name: fields[7].to_string(), binding: fields[4].to_string() });
    }
    symbols
}

/// Register every function symbol of one unit's object file.
///
/// Must run for all units before any call-graph ingestion so cross-unit
/// resolution sees a complete table.
pub fn ingest_symbols(
    store: &mut RecordStore,
    translation_unit: &str,
    dump_text: &str,
) -> Result<(), IngestError> {
    for symbol in parse_symbol_table(dump_text) {
        let linkage = match symbol.binding.as_str() {
            "GLOBAL" => Linkage::Global,
            "LOCAL" => Linkage::Local,
            "WEAK" => Linkage::Weak,
            other => {
                return Err(StoreError::UnknownBinding {
                    binding: other.to_string(),
                    symbol: symbol.name,
                }
                .into())
            }
        };
        store.register(translation_unit, &symbol.name, linkage)?;
    }
    Ok(())
}
