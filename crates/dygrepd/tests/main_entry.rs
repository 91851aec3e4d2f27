//! Integration tests for the `dygrepd` binary entry point.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use rstest::rstest;

#[rstest]
#[case("abc")]
#[case("49.5")]
#[case("70000")]
fn non_integer_port_exits_with_failure(#[case] port: &str) {
    let mut command = cargo_bin_cmd!("dygrepd");
    command.args(["--port", port]);
    command
        .assert()
        .failure()
        .code(1)
        .stderr(contains("--port"));
}

#[test]
fn help_exits_successfully() {
    let mut command = cargo_bin_cmd!("dygrepd");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("--only-matching"));
}

#[test]
fn invalid_log_filter_is_reported() {
    let mut command = cargo_bin_cmd!("dygrepd");
    command.args(["--port", "0", "--log-filter", "dygrepd=loudest"]);
    command
        .assert()
        .failure()
        .code(1)
        .stderr(contains("invalid log filter"));
}
