use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

const FAKE_DIR_ENV: &str = "STACKBOUND_READELF_FAKE_DIR";

#[test]
fn analyze_on_directory_without_dumps_fails_with_discovery_error() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("main.su"), "a.c:1:1:main\t8\tstatic\n").unwrap();

    cargo_bin_cmd!("stackbound")
        .arg("analyze")
        .arg("--dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Artifact discovery failed"))
        .stderr(predicate::str::contains("no RTL dumps"));
}

#[test]
fn duplicate_global_across_units_is_fatal() {
    let temp = tempdir().unwrap();
    let work = temp.path().join("work");
    let fake = temp.path().join("fake");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&fake).unwrap();

    let rtl = ";; Function init (init, funcdef_no=0)\n";
    let symbols = "\
Symbol table '.symtab' contains 2 entries:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     1: 0000000000000000    34 FUNC    GLOBAL DEFAULT    1 init
";
    for unit in ["a", "b"] {
        fs::write(work.join(format!("{unit}.c.270r.dfinish")), rtl).unwrap();
        fs::write(work.join(format!("{unit}.su")), format!("{unit}.c:1:1:init\t8\tstatic\n"))
            .unwrap();
        fs::write(work.join(format!("{unit}.o")), b"obj").unwrap();
        fs::write(fake.join(format!("{unit}.o.txt")), symbols).unwrap();
    }

    cargo_bin_cmd!("stackbound")
        .arg("analyze")
        .arg("--dir")
        .arg(&work)
        .env(FAKE_DIR_ENV, &fake)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate global symbol 'init'"));
}

#[test]
fn missing_canned_dump_surfaces_the_dumper_failure() {
    let temp = tempdir().unwrap();
    let work = temp.path().join("work");
    let fake = temp.path().join("fake");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&fake).unwrap();
    fs::write(work.join("a.c.270r.dfinish"), ";; Function main (main, funcdef_no=0)\n").unwrap();
    fs::write(work.join("a.su"), "a.c:1:1:main\t8\tstatic\n").unwrap();
    fs::write(work.join("a.o"), b"obj").unwrap();

    cargo_bin_cmd!("stackbound")
        .arg("analyze")
        .arg("--dir")
        .arg(&work)
        .env(FAKE_DIR_ENV, &fake)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to dump symbols"));
}

#[test]
fn unparsable_stack_usage_line_is_a_warning_not_a_failure() {
    let temp = tempdir().unwrap();
    let work = temp.path().join("work");
    let fake = temp.path().join("fake");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&fake).unwrap();
    fs::write(
        work.join("a.c.270r.dfinish"),
        ";; Function main (main, funcdef_no=0)\n(insn 2 1 3 2 (set (reg:SI 87) (const_int 0)))\n",
    )
    .unwrap();
    fs::write(work.join("a.su"), "garbage that matches no grammar\n").unwrap();
    fs::write(work.join("a.o"), b"obj").unwrap();
    fs::write(
        fake.join("a.o.txt"),
        "\
Symbol table '.symtab' contains 2 entries:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     1: 0000000000000000    34 FUNC    GLOBAL DEFAULT    1 main
",
    )
    .unwrap();

    cargo_bin_cmd!("stackbound")
        .arg("analyze")
        .arg("--dir")
        .arg(&work)
        .env(FAKE_DIR_ENV, &fake)
        .assert()
        .success()
        .stderr(predicate::str::contains("matches no stack-usage grammar"))
        .stderr(predicate::str::contains("ingestion incomplete"))
        .stdout(predicate::str::contains("incomplete"));
}
