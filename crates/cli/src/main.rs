use anyhow::Result;
use clap::{Parser, Subcommand};

use stackbound::commands::{analyze_command, runs_command, show_run_command, AnalyzeArgs};

/// Static worst-case stack analyzer CLI.
///
/// This CLI is a thin wrapper around `wcs-core` (exposed in code as
/// `wcs_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "stackbound",
    version,
    about = "Static worst-case stack analyzer for multi-unit native programs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze compiler artifacts and report each function's worst-case stack.
    ///
    /// Expects a build directory holding, per translation unit: an RTL dump
    /// (*.dfinish), a stack-usage report (*.su), and an object file (*.o),
    /// plus optional manual-override files (*.msu).
    Analyze {
        /// Directory scanned recursively for artifacts. Defaults to the
        /// current working directory.
        #[arg(long, default_value = ".")]
        dir: String,

        /// Optional YAML analysis spec (work dir, extensions, budgets).
        #[arg(long)]
        spec: Option<String>,

        /// Stack-usage file extension (default ".su").
        #[arg(long)]
        su_ext: Option<String>,

        /// Object file extension (default ".o").
        #[arg(long)]
        obj_ext: Option<String>,

        /// readelf executable used to dump symbol tables.
        #[arg(long)]
        readelf_path: Option<String>,

        /// Use when object and stack-usage files are named like
        /// `<file>.c.su` rather than `<file>.su`.
        #[arg(long, default_value_t = false)]
        dot_c_included: bool,

        /// Emit JSON instead of the text table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Persist this run into the history database.
        #[arg(long, default_value_t = false)]
        save: bool,

        /// History database path (defaults to .stackbound/history.db under
        /// the work directory).
        #[arg(long)]
        db: Option<String>,
    },

    /// List analysis runs persisted with `analyze --save`.
    Runs {
        /// Directory whose history database should be read.
        #[arg(long, default_value = ".")]
        dir: String,

        /// History database path override.
        #[arg(long)]
        db: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the per-function bounds stored for one run.
    ShowRun {
        /// Directory whose history database should be read.
        #[arg(long, default_value = ".")]
        dir: String,

        /// History database path override.
        #[arg(long)]
        db: Option<String>,

        /// Run id as printed by `runs`.
        #[arg(long)]
        run_id: i64,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            dir,
            spec,
            su_ext,
            obj_ext,
            readelf_path,
            dot_c_included,
            json,
            save,
            db,
        } => analyze_command(&AnalyzeArgs {
            dir,
            spec,
            su_ext,
            obj_ext,
            readelf_path,
            dot_c_included,
            json,
            save,
            db,
        })?,
        Command::Runs { dir, db, json } => runs_command(&dir, db.as_deref(), json)?,
        Command::ShowRun { dir, db, run_id, json } => {
            show_run_command(&dir, db.as_deref(), run_id, json)?
        }
    }

    Ok(())
}
