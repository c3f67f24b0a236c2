use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

const FAKE_DIR_ENV: &str = "STACKBOUND_READELF_FAKE_DIR";

const A_SYMBOLS: &str = "\
Symbol table '.symtab' contains 4 entries:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     1: 0000000000000000    34 FUNC    GLOBAL DEFAULT    1 main
     2: 0000000000000022    12 FUNC    LOCAL  DEFAULT    1 tick
";

const A_RTL: &str = "\
;; Function main (main, funcdef_no=0)
(call_insn 3 2 4 2 (call (mem:QI (symbol_ref:DI (\"helper\") [flags 0x41]) [0 helper S1 A8]) (const_int 0)))
(call_insn 5 4 6 2 (call (mem:QI (symbol_ref:DI (\"serial_write\") [flags 0x41]) [0 serial_write S1 A8]) (const_int 0)))
(call_insn 7 6 8 2 (call (mem:QI (symbol_ref:DI (\"ext_log\") [flags 0x41]) [0 ext_log S1 A8]) (const_int 0)))
(call_insn 9 8 10 2 (call (mem:QI (symbol_ref:DI (\"tick\") [flags 0x41]) [0 tick S1 A8]) (const_int 0)))

;; Function tick (tick, funcdef_no=1)
(insn 11 10 12 2 (set (reg:SI 87) (const_int 1)))
";

const B_SYMBOLS: &str = "\
Symbol table '.symtab' contains 4 entries:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     1: 0000000000000000    20 FUNC    GLOBAL DEFAULT    1 helper
     2: 0000000000000014    30 FUNC    LOCAL  DEFAULT    1 util
";

const B_RTL: &str = "\
;; Function helper (helper, funcdef_no=0)
(call_insn 3 2 4 2 (call (mem:QI (symbol_ref:DI (\"util\") [flags 0x41]) [0 util S1 A8]) (const_int 0)))

;; Function util (util, funcdef_no=1)
(insn 5 4 6 2 (set (reg:SI 87) (const_int 2)))
";

/// Lay out a two-unit artifact tree plus canned readelf output.
///
/// Returns `(work_dir, fake_dir)` under the given root.
fn write_fixture(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let work = root.join("work");
    let fake = root.join("fake");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&fake).unwrap();

    fs::write(work.join("a.c.270r.dfinish"), A_RTL).unwrap();
    fs::write(work.join("a.su"), "a.c:2:5:main\t32\tstatic\na.c:9:6:tick\t8\tstatic\n").unwrap();
    fs::write(work.join("a.o"), b"obj-a").unwrap();
    fs::write(work.join("b.c.270r.dfinish"), B_RTL).unwrap();
    fs::write(work.join("b.su"), "b.c:1:5:helper\t16\tstatic\nb.c:5:12:util\t24\tstatic\n")
        .unwrap();
    fs::write(work.join("b.o"), b"obj-b").unwrap();
    fs::write(work.join("overrides.msu"), "serial_write 64\n").unwrap();

    fs::write(fake.join("a.o.txt"), A_SYMBOLS).unwrap();
    fs::write(fake.join("b.o.txt"), B_SYMBOLS).unwrap();

    (work, fake)
}

#[test]
fn analyze_renders_ordered_table_with_provisional_bound() {
    let temp = tempdir().unwrap();
    let (work, fake) = write_fixture(temp.path());

    let output = cargo_bin_cmd!("stackbound")
        .arg("analyze")
        .arg("--dir")
        .arg(&work)
        .env(FAKE_DIR_ENV, &fake)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();

    assert!(stdout.contains("unbounded:96"), "output was:\n{stdout}");
    assert!(stdout.contains("(ext_log)"), "output was:\n{stdout}");
    // Descending bound order: main, serial_write, helper, util, tick.
    let positions: Vec<usize> = ["main", "serial_write", "helper", "util", "tick"]
        .iter()
        .map(|name| stdout.find(&format!(" {name} ")).unwrap_or_else(|| {
            panic!("function {name} missing from output:\n{stdout}")
        }))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted, "rows out of order:\n{stdout}");
}

#[test]
fn analyze_json_reports_rows_diagnostics_and_violations() {
    let temp = tempdir().unwrap();
    let (work, fake) = write_fixture(temp.path());

    let output = cargo_bin_cmd!("stackbound")
        .arg("analyze")
        .arg("--dir")
        .arg(&work)
        .arg("--json")
        .env(FAKE_DIR_ENV, &fake)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let payload: Value = serde_json::from_slice(&output).expect("analyze output should be JSON");
    let rows = payload["report"]["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["function"], "main");
    assert_eq!(rows[0]["worst_case"]["bounded"], 96);
    assert_eq!(rows[0]["unresolved"][0], "ext_log");
    assert_eq!(payload["diagnostics"].as_array().unwrap().len(), 0);
    assert_eq!(payload["budget_violations"].as_array().unwrap().len(), 0);
}

#[test]
fn budget_violation_fails_the_run() {
    let temp = tempdir().unwrap();
    let (work, fake) = write_fixture(temp.path());
    let spec_path = temp.path().join("stack.yaml");
    fs::write(&spec_path, "budgets:\n  main: 80\n  tick: 64\n").unwrap();

    cargo_bin_cmd!("stackbound")
        .arg("analyze")
        .arg("--dir")
        .arg(&work)
        .arg("--spec")
        .arg(&spec_path)
        .env(FAKE_DIR_ENV, &fake)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Budget violations (1):"))
        .stdout(predicate::str::contains("exceeds budget"))
        .stderr(predicate::str::contains("budget violation"));
}

#[test]
fn save_then_runs_and_show_run_round_trip() {
    let temp = tempdir().unwrap();
    let (work, fake) = write_fixture(temp.path());

    cargo_bin_cmd!("stackbound")
        .arg("analyze")
        .arg("--dir")
        .arg(&work)
        .arg("--save")
        .env(FAKE_DIR_ENV, &fake)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved run to"));

    cargo_bin_cmd!("stackbound")
        .arg("runs")
        .arg("--dir")
        .arg(&work)
        .assert()
        .success()
        .stdout(predicate::str::contains("Runs (1):"))
        .stdout(predicate::str::contains("units=2"));

    let output = cargo_bin_cmd!("stackbound")
        .arg("runs")
        .arg("--dir")
        .arg(&work)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: Value = serde_json::from_slice(&output).expect("runs output should be JSON");
    let run_id = payload[0]["id"].as_i64().expect("run id");
    assert_eq!(payload[0]["unit_count"], 2);
    assert!(payload[0]["artifacts_hash"].is_string());

    cargo_bin_cmd!("stackbound")
        .arg("show-run")
        .arg("--dir")
        .arg(&work)
        .arg("--run-id")
        .arg(run_id.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("main"))
        .stdout(predicate::str::contains("ext_log"));
}

#[test]
fn runs_without_history_reports_none() {
    let temp = tempdir().unwrap();
    cargo_bin_cmd!("stackbound")
        .arg("runs")
        .arg("--dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No run history"));
}
