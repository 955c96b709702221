use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn kantest_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kantest"));
    cmd.current_dir(dir)
        .env_remove("KANTRA_CLI_PATH")
        .env_remove("PROJECT_PATH")
        .env_remove("REPORT_OUTPUT_PATH")
        .env_remove("RUST_LOG")
        .env("TERM", "dumb");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    kantest_cmd(dir)
        .args(args)
        .output()
        .expect("failed to run kantest")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_test_report(dir: &Path, outcomes: &[(&str, &str)]) -> std::path::PathBuf {
    let tests: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|(nodeid, outcome)| serde_json::json!({ "nodeid": nodeid, "outcome": outcome }))
        .collect();
    let path = dir.join("report.json");
    fs::write(&path, serde_json::json!({ "tests": tests }).to_string()).unwrap();
    path
}

const ANALYSIS_OUTPUT: &str = r#"
- name: eap8/eap7
  description: JBoss EAP 8 rules
  violations:
    eap8-rule-1:
      description: jakarta namespace
  unmatched: []
  skipped: []
- name: cloud-readiness
  description: Cloud readiness rules
  violations:
    local-storage-00001:
      description: file system usage
  unmatched:
    - local-storage-00002
"#;

#[test]
fn test_summary_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let report = write_test_report(
        dir.path(),
        &[
            ("tests/test_analysis.py::test_a", "passed"),
            ("tests/test_analysis.py::test_b", "failed"),
            ("tests/test_discovery.py::test_c", "passed"),
            ("tests/test_discovery.py::test_d", "skipped"),
        ],
    );

    let output = run(dir.path(), &["summary", report.to_str().unwrap()]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(1), "stdout={out}");
    assert!(out.contains("TEST SUMMARY BY SPEC"), "{out}");
    assert!(out.contains("tests/test_analysis.py"), "{out}");
    assert!(out.contains("tests/test_discovery.py"), "{out}");
    assert!(out.contains("1/4 tests failed"), "{out}");
    assert!(!out.contains('\u{1b}'), "TERM=dumb must not colour: {out}");
}

#[test]
fn test_summary_all_passed() {
    let dir = tempfile::tempdir().unwrap();
    let report = write_test_report(
        dir.path(),
        &[("a.py::t1", "passed"), ("a.py::t2", "passed")],
    );

    let output = run(dir.path(), &["summary", report.to_str().unwrap()]);
    let out = stdout(&output);

    assert!(output.status.success(), "stdout={out}");
    assert!(out.contains("2/2 tests passed"), "{out}");
}

#[test]
fn test_summary_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = write_test_report(dir.path(), &[]);

    let output = run(dir.path(), &["summary", report.to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "No test data found in JSON report.");
}

#[test]
fn test_summary_missing_report() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(dir.path(), &["summary", "does-not-exist.json"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("error reading report file"),
        "stderr={}",
        stderr(&output)
    );
}

#[test]
fn test_summary_uses_configured_report() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results");
    fs::create_dir(&results).unwrap();
    write_test_report(&results, &[("a.py::t1", "passed")]);
    fs::write(
        dir.path().join(".kantest.toml"),
        "[summary]\nreport = \"results/report.json\"\n",
    )
    .unwrap();

    let output = run(dir.path(), &["summary"]);

    assert!(output.status.success(), "stderr={}", stderr(&output));
    assert!(stdout(&output).contains("1/1 tests passed"));
}

#[test]
fn test_summary_json_format() {
    let dir = tempfile::tempdir().unwrap();
    let report = write_test_report(
        dir.path(),
        &[("a.py::t1", "passed"), ("b.py::t1", "error")],
    );

    let output = run(
        dir.path(),
        &["summary", report.to_str().unwrap(), "--format", "json"],
    );
    assert_eq!(output.status.code(), Some(1));

    let parsed: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("summary should be valid JSON");
    assert_eq!(parsed["exit_code"], 1);
    assert_eq!(parsed["totals"]["failed"], 1);
    assert_eq!(parsed["groups"][1]["spec"], "b.py");
}

#[test]
fn test_summary_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let report = write_test_report(dir.path(), &[("a.py::t1", "passed")]);

    let output = run(
        dir.path(),
        &["summary", report.to_str().unwrap(), "--format", "xml"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unknown format"));
}

#[test]
fn test_verify_rules_passes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("output.yaml"), ANALYSIS_OUTPUT).unwrap();

    // A directory resolves to its output.yaml.
    let output = run(
        dir.path(),
        &["verify-rules", ".", "--rule", "eap8-rule-1"],
    );
    let out = stdout(&output);

    assert!(output.status.success(), "stdout={out}");
    assert!(out.contains("RULES VERIFIED"), "{out}");
}

#[test]
fn test_verify_rules_reports_every_finding() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("output.yaml"), ANALYSIS_OUTPUT).unwrap();

    let output = run(
        dir.path(),
        &[
            "verify-rules",
            "output.yaml",
            "--rule",
            "eap8-rule-1",
            "--rule",
            "missing-rule",
            "--rule",
            "local-storage-00001",
        ],
    );
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(1), "stdout={out}");
    assert!(out.contains("RULES FAILED: 2 of 3"), "{out}");
    assert!(
        out.contains("Error for rule ID 'missing-rule': Ruleset not found in output."),
        "{out}"
    );
    assert!(
        out.contains("Error for rule ID 'local-storage-00001': Rule was unmatched."),
        "{out}"
    );
}

#[test]
fn test_verify_rules_expected_unmatched() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("output.yaml"), ANALYSIS_OUTPUT).unwrap();

    let output = run(
        dir.path(),
        &[
            "verify-rules",
            "output.yaml",
            "--rule",
            "local-storage-00001",
            "--expected-unmatched",
            "1",
        ],
    );

    assert!(output.status.success(), "stdout={}", stdout(&output));
}

#[test]
fn test_verify_rules_json_format() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("output.yaml"), ANALYSIS_OUTPUT).unwrap();

    let output = run(
        dir.path(),
        &[
            "verify-rules",
            "output.yaml",
            "--rule",
            "missing-rule",
            "--format",
            "json",
        ],
    );
    assert_eq!(output.status.code(), Some(1));

    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["passed"], false);
    assert_eq!(parsed["failed_rules"], serde_json::json!(["missing-rule"]));
}

#[test]
fn test_plan_prints_commands_with_redacted_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let apps = dir.path().join("data").join("applications");
    fs::create_dir_all(&apps).unwrap();
    fs::write(apps.join("app.ear"), b"").unwrap();
    fs::write(
        dir.path().join("kantest.toml"),
        "[tool]\ncli_path = \"/usr/local/bin/kantra\"\n\n[paths]\nproject_path = \".\"\nreport_output_path = \"out\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("plan.toml"),
        r#"
[[case]]
name = "eap8 bulk"
subcommand = "analyze"
binary = "app.ear"
targets = ["EAP8"]
mode = "bulk"
options = [{ name = "skip-static-report" }]

[[case]]
name = "hub login"
subcommand = "config-login"
hub_url = "https://hub.example.com"
username = "admin"
password = "s3cret"
secure = false
"#,
    )
    .unwrap();

    let output = run(
        dir.path(),
        &["plan", "plan.toml", "--config", "kantest.toml"],
    );
    let out = stdout(&output);
    let err = stderr(&output);

    assert!(output.status.success(), "stdout={out}, stderr={err}");
    assert!(out.contains("eap8 bulk: /usr/local/bin/kantra analyze --bulk --input"), "{out}");
    assert!(out.contains("--target eap8 --skip-static-report"), "{out}");
    assert!(
        out.contains("hub login: /usr/local/bin/kantra config login https://hub.example.com --username ******** --password ******** --insecure"),
        "{out}"
    );
    assert!(!out.contains("s3cret"), "{out}");
    assert!(!err.contains("s3cret"), "{err}");
    assert!(err.contains("insecure transport"), "{err}");
}

#[test]
fn test_plan_json_format() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("plan.toml"),
        "[[case]]\nname = \"targets\"\nsubcommand = \"list\"\nlisting = \"targets\"\n",
    )
    .unwrap();

    let output = kantest_cmd(dir.path())
        .env("KANTRA_CLI_PATH", "/opt/kantra")
        .args(["plan", "plan.toml", "--format", "json"])
        .output()
        .expect("failed to run kantest");
    assert!(output.status.success(), "stderr={}", stderr(&output));

    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed[0]["name"], "targets");
    assert_eq!(parsed[0]["subcommand"], "analyze");
    assert_eq!(parsed[0]["program"], "/opt/kantra");
    assert_eq!(parsed[0]["args"], serde_json::json!(["analyze", "--list-targets"]));
}

#[test]
fn test_plan_invalid_case_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("plan.toml"),
        "[[case]]\nname = \"missing app\"\nsubcommand = \"analyze\"\nbinary = \"nope.war\"\n",
    )
    .unwrap();

    let output = kantest_cmd(dir.path())
        .env("KANTRA_CLI_PATH", "/opt/kantra")
        .args(["plan", "plan.toml"])
        .output()
        .expect("failed to run kantest");
    let err = stderr(&output);

    assert_eq!(output.status.code(), Some(2), "stderr={err}");
    assert!(err.contains("case 'missing app' is invalid"), "{err}");
    assert!(err.contains("does not exist"), "{err}");
}

#[test]
fn test_artifacts_require_manifests() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(dir.path(), &["artifacts", ".", "--require-manifests"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("manifests: 0"));

    fs::write(dir.path().join("manifest.yaml"), "name: app\n").unwrap();
    let output = run(dir.path(), &["artifacts", ".", "--require-manifests"]);
    let out = stdout(&output);
    assert!(output.status.success(), "{out}");
    assert!(out.contains("manifests: 1"), "{out}");
    assert!(out.contains("static report: missing"), "{out}");
}

#[test]
fn test_init_creates_config() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(dir.path(), &["init"]);
    assert!(output.status.success(), "stderr={}", stderr(&output));
    let content = fs::read_to_string(dir.path().join(".kantest.toml")).unwrap();
    assert!(content.contains("[paths]"));
    assert!(content.contains("[summary]"));

    let output = run(dir.path(), &["init"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("already exists"));

    let output = run(dir.path(), &["init", "--force"]);
    assert!(output.status.success());
}
