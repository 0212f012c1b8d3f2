//! End-to-end run of `ssim-regress` against a scripted console.
#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

const CONSOLE_SCRIPT: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
case "$1" in
  --update) echo "Library updated. ID: 5" ;;
  --list)
    if [ "$2" = "--scenarios" ]; then
      printf 'Id    Name      IsResult   IsReadOnly\n1     Base      No         No\n2     Result    Yes        No\n3     Fire      No         No\n'
    else
      printf 'Name   Version   Status\nFoo    2.0       OK\n'
    fi ;;
  --run) echo "Running $3" ;;
esac
exit 0
"#;

fn write_console(dir: &Path) -> PathBuf {
    let path = dir.join("console.sh");
    fs::write(&path, CONSOLE_SCRIPT).expect("write console script");
    let mut perms = fs::metadata(&path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod script");
    path
}

fn write_library_archive(path: &Path) {
    let file = fs::File::create(path).expect("create archive");
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("demo.ssim", zip::write::SimpleFileOptions::default())
        .expect("start entry");
    zip.write_all(b"sqlite").expect("write entry");
    zip.finish().expect("finish archive");
}

#[test]
fn runs_good_library_after_broken_one() {
    let root = tempfile::tempdir().expect("tempdir");
    let console = write_console(root.path());
    let archive = root.path().join("demo.ssimbak");
    write_library_archive(&archive);

    let meta = root.path().join("metadata.xml");
    fs::write(
        &meta,
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<package name="Foo" version="2.1">
  <onlineLibrary name="Missing" libraryLocation="file://{missing}"/>
  <onlineLibrary name="Demo" libraryLocation="file://{archive}"/>
</package>
"#,
            missing = root.path().join("missing.ssimbak").display(),
            archive = archive.display(),
        ),
    )
    .expect("write metadata");

    let work = root.path().join("work");
    let report_path = root.path().join("report.json");
    let output = Command::new(env!("CARGO_BIN_EXE_ssim-regress"))
        .arg(&meta)
        .arg("--console")
        .arg(&console)
        .arg("--tempdir")
        .arg(&work)
        .arg("--timeout-secs")
        .arg("60")
        .arg("--report")
        .arg(&report_path)
        .env_remove("RUST_LOG")
        .output()
        .expect("run ssim-regress");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("FAIL Missing [fetch]"), "stdout: {stdout}");
    assert!(stdout.contains("PASS Demo"), "stdout: {stdout}");
    assert!(stdout.contains("2 libraries: 1 passed, 1 failed"));

    let lib = work.join("1_Demo_unzipped").join("demo.ssim");
    let calls = fs::read_to_string(root.path().join("calls.log")).expect("read call log");
    let expected = [
        format!("--update --lib={}", lib.display()),
        format!("--list --scenarios --lib={}", lib.display()),
        format!("--delete --scenario --sid=2 --lib={} --force", lib.display()),
        format!("--list --scenarios --lib={}", lib.display()),
        format!("--list --packages --lib={}", lib.display()),
        format!("--add --package --pkg=Foo --ver=2.1 --lib={}", lib.display()),
        format!("--run --lib={} --sids=1,3", lib.display()),
    ];
    assert_eq!(calls.lines().collect::<Vec<_>>(), expected);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("read report"))
            .expect("parse report");
    let outcomes = report["outcomes"].as_array().expect("outcomes");
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["failed_step"], "fetch");
    assert_eq!(outcomes[1]["succeeded"].as_bool(), Some(true));
    assert_eq!(outcomes[1]["update_ids"], serde_json::json!([5]));
    assert_eq!(outcomes[1]["sync_action"]["kind"], "reinstall");
}

#[test]
fn unreadable_metadata_is_fatal() {
    let root = tempfile::tempdir().expect("tempdir");
    let status = Command::new(env!("CARGO_BIN_EXE_ssim-regress"))
        .arg(root.path().join("absent.xml"))
        .status()
        .expect("run ssim-regress");
    assert_eq!(status.code(), Some(2));
}
