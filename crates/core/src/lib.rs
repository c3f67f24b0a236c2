//! wcs-core
//!
//! Core library for static worst-case stack analysis of native programs.
//!
//! This crate defines the function record store, linker-style symbol
//! resolution, call-graph construction, the memoized worst-case evaluator,
//! artifact ingestion adapters (symbol tables, RTL call-graph dumps,
//! stack-usage reports, manual overrides), report assembly, and run-history
//! persistence.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, CI integrations, etc.).

pub mod analysis;
pub mod db;
pub mod diag;
pub mod ingest;
pub mod model;
pub mod report;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
