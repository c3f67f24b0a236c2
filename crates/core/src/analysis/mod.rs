//! Analysis pipeline: ingestion ordering, call resolution, and evaluation.
//!
//! The ingestion order is fixed and global: every unit's symbol table first
//! (so the global/local tables are complete), then weak promotion, then all
//! call-graph dumps, then all stack-usage reports, then manual overrides.
//! Resolving calls before all symbols are registered would spuriously mark
//! cross-unit calls as unresolved.

pub mod builder;
pub mod evaluate;
pub mod validate;

pub use builder::resolve_all_calls;
pub use evaluate::{evaluate, evaluate_all, EvalError};
pub use validate::validate_records;

use std::fs;

use anyhow::{Context, Result};

use crate::diag::Diagnostic;
use crate::ingest::{
    ingest_call_graph, ingest_manual_overrides, ingest_stack_usage, ingest_symbols,
    DiscoveredArtifacts, SymbolDumper,
};
use crate::model::RecordStore;

/// Finalized output of one analysis: the evaluated store plus every
/// recoverable problem encountered along the way.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub store: RecordStore,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full pipeline over a discovered artifact set.
///
/// Fatal conditions (duplicate symbols, unknown bindings, artifact
/// mismatches, unreadable files) abort with an error. Recoverable ones
/// accumulate in [`AnalysisOutcome::diagnostics`] and leave the affected
/// rows annotated rather than silently dropped.
pub fn run_analysis(
    artifacts: &DiscoveredArtifacts,
    dumper: &dyn SymbolDumper,
) -> Result<AnalysisOutcome> {
    let mut store = RecordStore::new();
    let mut diagnostics = Vec::new();

    for unit in &artifacts.units {
        let dump = dumper.dump(&unit.object_path).with_context(|| {
            format!("failed to dump symbols from {}", unit.object_path.display())
        })?;
        ingest_symbols(&mut store, &unit.name, &dump)
            .with_context(|| format!("symbol table of {}", unit.object_path.display()))?;
    }
    store.promote_weak_symbols();
    log::info!("registered {} function records", store.len());

    for unit in &artifacts.units {
        let text = fs::read_to_string(&unit.rtl_path)
            .with_context(|| format!("failed to read {}", unit.rtl_path.display()))?;
        ingest_call_graph(&mut store, &unit.name, &text, &unit.rtl_path)
            .with_context(|| format!("call-graph dump of {}", unit.name))?;
    }

    for unit in &artifacts.units {
        let text = fs::read_to_string(&unit.su_path)
            .with_context(|| format!("failed to read {}", unit.su_path.display()))?;
        ingest_stack_usage(&mut store, &unit.name, &text, &unit.su_path, &mut diagnostics)
            .with_context(|| format!("stack-usage report of {}", unit.name))?;
    }

    for manual in &artifacts.manual_files {
        let text = fs::read_to_string(manual)
            .with_context(|| format!("failed to read {}", manual.display()))?;
        ingest_manual_overrides(&mut store, &text, manual, &mut diagnostics)
            .with_context(|| format!("manual overrides in {}", manual.display()))?;
    }

    diagnostics.extend(validate_records(&mut store));
    resolve_all_calls(&mut store);
    diagnostics.extend(evaluate_all(&mut store));

    log::info!(
        "evaluated {} records, {} diagnostics",
        store.records().iter().filter(|r| r.worst_case.is_known()).count(),
        diagnostics.len()
    );
    Ok(AnalysisOutcome { store, diagnostics })
}
