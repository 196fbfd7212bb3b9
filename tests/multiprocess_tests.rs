// Multi-process orchestration against the real binary: the parent
// re-executes itself, children stream protocol lines, the parent
// aggregates them into one report.

#![allow(deprecated)] // Command::cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn rwperf() -> Command {
    Command::cargo_bin("rwperf").unwrap()
}

#[test]
fn test_two_processes_aggregate_into_one_report() {
    let dir = TempDir::new().unwrap();

    rwperf()
        .args(["-s", "128kb", "--min-size", "1kb", "--max-size", "8kb"])
        .args(["-p", "2", "-t", "2"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("RWPerf Results"))
        .stdout(predicate::str::contains("Processes:      2"))
        // Protocol lines must be consumed by the parent, not printed.
        .stdout(predicate::str::contains("RESULT |").not())
        .stdout(predicate::str::contains("FINISHED").not());

    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 0, "children left files behind");
}

#[test]
fn test_children_deliver_results_from_both_shares() {
    let dir = TempDir::new().unwrap();

    let output = rwperf()
        .args(["-s", "64kb", "--min-size", "1kb", "--max-size", "4kb"])
        .args(["-p", "2"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    let written: u64 = stdout
        .lines()
        .find(|line| line.starts_with("Written:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|count| count.parse().ok())
        .expect("report lacks a Written count");

    // Each 32kb share yields at least 8 files of at most 4kb.
    assert!(written >= 16, "only {written} files written across children");
}

#[test]
fn test_multiprocess_keep_retains_files_from_all_children() {
    let dir = TempDir::new().unwrap();

    rwperf()
        .args(["-s", "64kb", "--min-size", "1kb", "--max-size", "4kb"])
        .args(["-p", "2", "--keep"])
        .arg(dir.path())
        .assert()
        .success();

    let kept = fs::read_dir(dir.path()).unwrap().count();
    assert!(kept >= 16, "only {kept} files kept across children");
}

#[test]
fn test_multiprocess_runs_are_seed_reproducible() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    for dir in [&first, &second] {
        rwperf()
            .args(["-s", "64kb", "--min-size", "1kb", "--max-size", "4kb"])
            .args(["-p", "2", "--seed", "99", "--keep"])
            .arg(dir.path())
            .assert()
            .success();
    }

    let names = |dir: &TempDir| {
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    };

    assert_eq!(names(&first), names(&second));
}
