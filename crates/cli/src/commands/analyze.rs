use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use wcs_core::analysis::{run_analysis, AnalysisOutcome};
use wcs_core::db::{HistoryDb, RunRecord};
use wcs_core::diag::Diagnostic;
use wcs_core::ingest::{discover_artifacts, DiscoveredArtifacts, DiscoveryOptions, ReadelfDumper};
use wcs_core::report::{check_budgets, BudgetViolation, StackReport};

use crate::{canonicalize_or_current, sha256_file};

/// Relative path of the default history database under the work directory.
pub const DEFAULT_DB_RELATIVE: &str = ".stackbound/history.db";

/// Optional YAML analysis spec: fixed settings for a project so CI and
/// developers run the same analysis without repeating flags.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AnalysisSpec {
    /// Artifact directory, relative to the spec's `--dir` when not absolute.
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default)]
    pub su_ext: Option<String>,
    #[serde(default)]
    pub obj_ext: Option<String>,
    #[serde(default)]
    pub readelf_path: Option<String>,
    #[serde(default)]
    pub dot_c_included: bool,
    /// Per-function stack budgets in bytes, by display name.
    #[serde(default)]
    pub budgets: BTreeMap<String, u64>,
}

impl AnalysisSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis spec at {}", path.display()))?;
        let spec: AnalysisSpec =
            serde_yaml::from_str(&text).context("Failed to parse analysis spec YAML")?;
        Ok(spec)
    }
}

/// Everything `analyze` accepts from the command line.
#[derive(Debug, Default)]
pub struct AnalyzeArgs {
    pub dir: String,
    pub spec: Option<String>,
    pub su_ext: Option<String>,
    pub obj_ext: Option<String>,
    pub readelf_path: Option<String>,
    pub dot_c_included: bool,
    pub json: bool,
    pub save: bool,
    pub db: Option<String>,
}

/// Shape of the machine-readable `analyze --json` output.
#[derive(Debug, Serialize)]
struct AnalyzePayload<'a> {
    report: &'a StackReport,
    diagnostics: &'a [Diagnostic],
    budget_violations: &'a [BudgetViolation],
}

/// Run the full analysis over a work directory and render the report.
///
/// Exits with an error (nonzero status) on fatal artifact problems and on
/// budget violations; recoverable diagnostics go to stderr and still leave a
/// complete report on stdout.
pub fn analyze_command(args: &AnalyzeArgs) -> Result<()> {
    let root = canonicalize_or_current(&args.dir)?;
    let spec = match &args.spec {
        Some(path) => AnalysisSpec::load(Path::new(path))?,
        None => AnalysisSpec::default(),
    };

    let work_dir = match &spec.work_dir {
        Some(dir) if Path::new(dir).is_absolute() => PathBuf::from(dir),
        Some(dir) => root.join(dir),
        None => root.clone(),
    };

    let mut options = DiscoveryOptions::new(&work_dir);
    if let Some(ext) = args.su_ext.clone().or_else(|| spec.su_ext.clone()) {
        options.su_ext = ext;
    }
    if let Some(ext) = args.obj_ext.clone().or_else(|| spec.obj_ext.clone()) {
        options.obj_ext = ext;
    }
    options.dot_c_included = args.dot_c_included || spec.dot_c_included;

    let artifacts = discover_artifacts(&options)
        .with_context(|| format!("Artifact discovery failed under {}", work_dir.display()))?;
    log::info!(
        "discovered {} translation units and {} manual files",
        artifacts.units.len(),
        artifacts.manual_files.len()
    );

    let dumper = match args.readelf_path.clone().or_else(|| spec.readelf_path.clone()) {
        Some(path) => ReadelfDumper::new(path),
        None => ReadelfDumper::default(),
    };

    let started_at = Utc::now().to_rfc3339();
    let outcome = run_analysis(&artifacts, &dumper)?;
    let finished_at = Utc::now().to_rfc3339();

    let report = StackReport::from_store(&outcome.store);
    let violations = check_budgets(&report, &spec.budgets);

    for diagnostic in &outcome.diagnostics {
        eprintln!("warning: {diagnostic}");
    }

    if args.json {
        let payload = AnalyzePayload {
            report: &report,
            diagnostics: &outcome.diagnostics,
            budget_violations: &violations,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!();
        print!("{}", report.render_text());
        if !violations.is_empty() {
            println!();
            println!("Budget violations ({}):", violations.len());
            for violation in &violations {
                println!("  - {violation}");
            }
        }
    }

    if args.save {
        let db_path = resolve_db_path(&work_dir, args.db.as_deref());
        save_run(&db_path, &work_dir, &artifacts, &outcome, &report, started_at, finished_at)?;
        if !args.json {
            println!();
            println!("Saved run to {}", db_path.display());
        }
    }

    if !violations.is_empty() {
        return Err(anyhow!("{} stack budget violation(s)", violations.len()));
    }
    Ok(())
}

/// Default the history DB to a dot-directory under the work dir.
pub fn resolve_db_path(work_dir: &Path, db: Option<&str>) -> PathBuf {
    match db {
        Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
        Some(path) => work_dir.join(path),
        None => work_dir.join(DEFAULT_DB_RELATIVE),
    }
}

fn save_run(
    db_path: &Path,
    work_dir: &Path,
    artifacts: &DiscoveredArtifacts,
    outcome: &AnalysisOutcome,
    report: &StackReport,
    started_at: String,
    finished_at: String,
) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let db = HistoryDb::open(db_path)
        .with_context(|| format!("Failed to open history database at {}", db_path.display()))?;

    let run = RunRecord {
        work_dir: work_dir.to_string_lossy().to_string(),
        artifacts_hash: artifact_set_hash(artifacts).ok(),
        unit_count: artifacts.units.len() as i64,
        diagnostic_count: outcome.diagnostics.len() as i64,
        started_at,
        finished_at,
    };
    let run_id = db.insert_run(&run).context("Failed to insert run record")?;
    db.insert_report(run_id, report).context("Failed to persist report rows")?;
    Ok(())
}

/// Hash the whole artifact set so unchanged builds are recognizable across
/// runs. Per-file digests are folded in discovery order, which is sorted and
/// stable.
pub fn artifact_set_hash(artifacts: &DiscoveredArtifacts) -> Result<String> {
    let mut hasher = Sha256::new();
    for unit in &artifacts.units {
        for path in [&unit.rtl_path, &unit.su_path, &unit.object_path] {
            hasher.update(sha256_file(path)?.as_bytes());
        }
    }
    for manual in &artifacts.manual_files {
        hasher.update(sha256_file(manual)?.as_bytes());
    }
    Ok(format!("{:x}", hasher.finalize()))
}
