use assert_cmd::Command;
use predicates::prelude::*;

fn maat() -> Command {
    let mut cmd = Command::cargo_bin("maat").unwrap();
    cmd.env_remove("MAAT_CONFIG").env("RUST_LOG", "warn");
    cmd
}

#[test]
fn config_prints_toml() {
    maat()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[engine.exploratory]"))
        .stdout(predicate::str::contains("[scram]"));
}

#[test]
fn demo_writes_ledger() {
    let dir = tempfile::tempdir().unwrap();
    maat()
        .args(["demo", "--cycles", "3", "--seed", "5", "--out"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cycle   3"));
    let ledger = std::fs::read_to_string(dir.path().join("demo.jsonl")).unwrap();
    assert!(ledger.lines().count() >= 3);
}

#[test]
fn stress_reactor_exits_cleanly_on_scram() {
    let dir = tempfile::tempdir().unwrap();
    maat()
        .args(["reactor", "--stress", "--cycles", "40", "--out"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SCRAM"));
    let report = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert!(json["scram"].is_object());
    assert!(dir.path().join("inner.jsonl").exists());
    assert!(dir.path().join("outer.jsonl").exists());
}

#[test]
fn unreadable_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "engine = 3").unwrap();
    maat()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn demo_reads_scripted_hypotheses() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("claims.txt");
    let claims = "- values stay bounded\n- the signal repeats every 16 steps\n";
    std::fs::write(&script, claims).unwrap();
    maat()
        .args(["demo", "--cycles", "2", "--out"])
        .arg(dir.path())
        .arg("--script")
        .arg(&script)
        .assert()
        .success();
    let ledger = std::fs::read_to_string(dir.path().join("demo.jsonl")).unwrap();
    assert!(ledger.contains("values stay bounded"));
}

#[test]
fn reactor_resumes_learned_state() {
    let dir = tempfile::tempdir().unwrap();
    let run = || {
        maat()
            .args(["reactor", "--cycles", "4", "--use-causal", "--use-policy", "--out"])
            .arg(dir.path())
            .assert()
            .success()
    };
    run().stdout(predicate::str::contains("saved"));
    for file in ["causal_graph.json", "causal_report.json", "policy.json", "policy_report.json"] {
        assert!(dir.path().join(file).exists(), "{file} missing");
    }
    let report = std::fs::read_to_string(dir.path().join("causal_report.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert!(json["stats"]["nodes"].is_u64());

    run().stdout(predicate::str::contains("causal graph:"));
}

#[test]
fn reactor_without_flags_saves_no_state() {
    let dir = tempfile::tempdir().unwrap();
    maat()
        .args(["reactor", "--cycles", "2", "--out"])
        .arg(dir.path())
        .assert()
        .success();
    assert!(!dir.path().join("causal_graph.json").exists());
    assert!(!dir.path().join("policy.json").exists());
}
