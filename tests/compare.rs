use std::path::Path;
use std::process::{Command, Output};

const MAIN: &str = "\
github.com/microsoft/retina/pkg/a.go:10:\tRun\t\t50.0%
github.com/microsoft/retina/pkg/c.go:4:\tStop\t\t80.0%
total:\t\t\t(statements)\t70.0%
";

const CURRENT: &str = "\
github.com/microsoft/retina/pkg/a.go:10:\tRun\t\t60.0%
github.com/microsoft/retina/pkg/b.go:3:\tNew\t\t90.0%
github.com/microsoft/retina/pkg/c.go:4:\tStop\t\t80.0%
total:\t\t\t(statements)\t75.0%
";

fn covdelta(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_covdelta"))
        .args(args)
        .current_dir(dir)
        .env_remove("GITHUB_TOKEN")
        .env_remove("PULL_REQUEST_NUMBER")
        .env_remove("GITHUB_API_URL")
        .env_remove("COVDELTA_LOG")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn write_dumps(dir: &Path) {
    std::fs::write(dir.join("maincoverageexpanded.out"), MAIN).unwrap();
    std::fs::write(dir.join("coverageexpanded.out"), CURRENT).unwrap();
}

#[test]
fn dry_run_prints_markdown_report() {
    let dir = tempfile::tempdir().unwrap();
    write_dumps(dir.path());

    let output = covdelta(dir.path(), &["compare", "--dry-run"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "# Retina Code Coverage Report\n\n\
         ## Total coverage increased from `70.0%` to `75.0%`  :white_check_mark:\n\n\
         Increased diff\n\
         | Impacted Files | Coverage | |\n\
         | --- | --- | --- |\n\
         | pkg/a.go | `50.0%` ... `60.0%` (`10.0%`) | :arrow_up: |\n\n"
    );
}

#[test]
fn json_format_includes_every_bucket() {
    let dir = tempfile::tempdir().unwrap();
    write_dumps(dir.path());

    let output = covdelta(dir.path(), &["compare", "--dry-run", "--format", "json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total"], "increased");
    assert_eq!(
        value["added"]["github.com/microsoft/retina/pkg/b.go"],
        "`0%` ... `90.0%`"
    );
    assert_eq!(
        value["nochange"]["github.com/microsoft/retina/pkg/c.go"],
        "`80.0%` ... `80.0%`"
    );
}

#[test]
fn explicit_paths_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("base.out"), CURRENT).unwrap();
    std::fs::write(dir.path().join("pr.out"), MAIN).unwrap();

    let output = covdelta(
        dir.path(),
        &["compare", "--dry-run", "--main", "base.out", "--current", "pr.out"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("decreased from `75.0%` to `70.0%`  :x:"));
    assert!(stdout.contains(":arrow_down:"));
}

#[test]
fn missing_token_and_pr_is_a_quiet_success() {
    let dir = tempfile::tempdir().unwrap();

    let output = covdelta(dir.path(), &["compare"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_coverage_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("coverageexpanded.out"), CURRENT).unwrap();

    let output = covdelta(dir.path(), &["compare", "--dry-run"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("maincoverageexpanded.out"));
}

#[test]
fn empty_coverage_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_dumps(dir.path());
    std::fs::write(dir.path().join("coverageexpanded.out"), "").unwrap();

    let output = covdelta(dir.path(), &["compare", "--dry-run"]);
    assert!(!output.status.success());
}

#[test]
fn fetch_without_token_is_a_quiet_success() {
    let dir = tempfile::tempdir().unwrap();

    let output = covdelta(dir.path(), &["fetch", "--pr", "12"]);
    assert!(output.status.success());
    assert!(!dir.path().join("mainbranchcoverage").exists());
}

#[test]
fn fetch_outside_a_pull_request_is_a_quiet_success() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_covdelta"))
        .arg("fetch")
        .current_dir(dir.path())
        .env("GITHUB_TOKEN", "ghp_test")
        .env("GITHUB_API_URL", "http://127.0.0.1:9")
        .env_remove("PULL_REQUEST_NUMBER")
        .env_remove("COVDELTA_LOG")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(!dir.path().join("mainbranchcoverage").exists());
}
