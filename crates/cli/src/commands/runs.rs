use anyhow::{Context, Result};

use wcs_core::db::HistoryDb;

use crate::canonicalize_or_current;
use crate::commands::resolve_db_path;

/// List persisted analysis runs from the history database.
pub fn runs_command(dir: &str, db: Option<&str>, json: bool) -> Result<()> {
    let root = canonicalize_or_current(dir)?;
    let db_path = resolve_db_path(&root, db);

    if !db_path.is_file() {
        println!("No run history at {}", db_path.display());
        return Ok(());
    }

    let history = HistoryDb::open(&db_path)
        .with_context(|| format!("Failed to open history database at {}", db_path.display()))?;
    let runs = history.list_runs().context("Failed to list runs")?;

    if json {
        let payload: Vec<serde_json::Value> = runs
            .iter()
            .map(|(id, run)| {
                serde_json::json!({
                    "id": id,
                    "work_dir": run.work_dir,
                    "artifacts_hash": run.artifacts_hash,
                    "unit_count": run.unit_count,
                    "diagnostic_count": run.diagnostic_count,
                    "started_at": run.started_at,
                    "finished_at": run.finished_at,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Runs ({}):", runs.len());
    if runs.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for (id, run) in runs {
        let hash = run.artifacts_hash.as_deref().unwrap_or("-");
        println!(
            "  - #{id} {} units={} diagnostics={} hash={}",
            run.started_at, run.unit_count, run.diagnostic_count, hash
        );
    }
    Ok(())
}

/// Show the bounds stored for a single run.
pub fn show_run_command(dir: &str, db: Option<&str>, run_id: i64, json: bool) -> Result<()> {
    let root = canonicalize_or_current(dir)?;
    let db_path = resolve_db_path(&root, db);

    let history = HistoryDb::open(&db_path)
        .with_context(|| format!("Failed to open history database at {}", db_path.display()))?;
    let bounds = history.list_bounds(run_id).context("Failed to list bounds")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bounds)?);
        return Ok(());
    }

    println!("Run #{run_id} ({} functions):", bounds.len());
    for bound in bounds {
        let unresolved = if bound.unresolved.is_empty() {
            String::new()
        } else {
            format!("  ({})", bound.unresolved)
        };
        println!(
            "  - {}  {}  {}{}",
            bound.translation_unit, bound.function, bound.worst_case, unresolved
        );
    }
    Ok(())
}
