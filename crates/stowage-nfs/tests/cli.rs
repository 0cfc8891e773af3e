//! Black-box checks of the stownfs binary.
//!
//! Only paths that fail before any mount is attempted are exercised here;
//! mounting itself is covered against scripted tooling in the library
//! tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn stownfs() -> Command {
    Command::cargo_bin("stownfs").unwrap()
}

#[test]
fn test_help_describes_the_destination() {
    stownfs()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("nfs://"))
        .stdout(predicate::str::contains("--mount-root"));
}

#[test]
fn test_foreign_scheme_is_rejected() {
    stownfs()
        .arg("cifs://fileserver/share")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported scheme"));
}

#[test]
fn test_destination_without_export_is_rejected() {
    stownfs()
        .arg("nfs://fileserver")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no export path"));
}

#[test]
fn test_unparseable_interval_is_rejected() {
    stownfs()
        .args(["nfs://fileserver:/exports", "--interval", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--interval"));
}
