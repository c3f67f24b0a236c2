//! Artifact ingestion adapters.
//!
//! Each compiled translation unit leaves three artifacts behind: an object
//! file (symbol table), an RTL dump (call graph), and a stack-usage report.
//! The adapters here normalize those textual formats into the record store;
//! the analysis layer never touches raw artifact text.

pub mod callgraph;
pub mod discover;
pub mod manual;
pub mod stackusage;
pub mod symbols;

pub use callgraph::ingest_call_graph;
pub use discover::{
    discover_artifacts, DiscoveredArtifacts, DiscoveryOptions, TranslationUnit,
};
pub use manual::ingest_manual_overrides;
pub use stackusage::ingest_stack_usage;
pub use symbols::{ingest_symbols, parse_symbol_table, RawSymbol, ReadelfDumper, SymbolDumper};

use std::path::PathBuf;

use thiserror::Error;

use crate::model::StoreError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A call-graph or stack-usage entry names a function with no symbol
    /// table record. This is an artifact or ordering mismatch, not a normal
    /// unresolved call, and the analysis cannot trust anything past it.
    #[error("function '{name}' referenced by {translation_unit} has no symbol table entry")]
    MissingFunctionRecord { name: String, translation_unit: String },

    #[error("{artifact}:{line}: call record precedes any function header")]
    StrayCallLine { artifact: PathBuf, line: usize },

    #[error("symbol dumper failed: {0}")]
    Dumper(String),

    #[error("no RTL dumps (*{rtl_ext_end}) found under {dir}; was the code compiled with RTL dumps enabled?")]
    NoRtlDumps { dir: PathBuf, rtl_ext_end: String },

    #[error("no translation units with matching object and stack-usage files found under {dir}")]
    NoTranslationUnits { dir: PathBuf },
}
