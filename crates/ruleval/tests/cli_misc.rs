use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

fn ruleval() -> Command {
    Command::new(cargo::cargo_bin!("ruleval"))
}

#[test]
fn init_writes_a_config_and_refuses_to_overwrite() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    let mut cmd = ruleval();
    cmd.current_dir(dir).arg("init");
    cmd.assert().code(0);

    let text = std::fs::read_to_string(dir.join("ruleval.toml")).unwrap();
    assert!(text.contains("[[rule]]"));
    assert!(text.contains("invoice"));

    // Second run without --force must not clobber the file.
    let mut cmd = ruleval();
    cmd.current_dir(dir).arg("init");
    cmd.assert().code(1);

    let mut cmd = ruleval();
    cmd.current_dir(dir).arg("init").arg("--force");
    cmd.assert().code(0);
}

#[test]
fn rules_prints_the_effective_config() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();
    std::fs::write(
        dir.join("ruleval.toml"),
        r#"
[[rule]]
name = "cat"
pattern = "c.t"
"#,
    )
    .unwrap();

    let mut cmd = ruleval();
    cmd.current_dir(dir).arg("rules");
    let output = cmd.assert().code(0).get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name = \"cat\""));

    let mut cmd = ruleval();
    cmd.current_dir(dir).arg("rules").arg("--format").arg("json");
    let output = cmd.assert().code(0).get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"name\": \"cat\""));
}

#[test]
fn validate_accepts_good_and_rejects_bad_patterns() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();
    std::fs::write(
        dir.join("good.toml"),
        r#"
[[rule]]
name = "cat"
pattern = "c.t"
"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("bad.toml"),
        r#"
[[rule]]
name = "broken"
pattern = "(unclosed"
"#,
    )
    .unwrap();

    let mut cmd = ruleval();
    cmd.current_dir(dir).arg("validate").arg("--config").arg("good.toml");
    cmd.assert().code(0);

    let mut cmd = ruleval();
    cmd.current_dir(dir).arg("validate").arg("--config").arg("bad.toml");
    let output = cmd.assert().code(1).get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken"));
}

#[test]
fn csv_and_confusion_render_from_a_receipt() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();
    std::fs::write(
        dir.join("ruleval.toml"),
        r#"
[[rule]]
name = "cat"
pattern = "c.t"

[[rule]]
name = "dog"
pattern = "d.g"
"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("docs.jsonl"),
        r#"{"id": 1, "text": "I saw a cat", "label": "cat"}
{"id": 2, "text": "I saw a dog", "label": "cat"}
{"id": 3, "text": "nothing here", "label": "other"}
"#,
    )
    .unwrap();

    let mut cmd = ruleval();
    cmd.current_dir(dir)
        .arg("eval")
        .arg("--docs")
        .arg("docs.jsonl")
        .arg("--out")
        .arg("report.json");
    cmd.assert().code(0);

    // Render-only CSV export from the written receipt.
    let mut cmd = ruleval();
    cmd.current_dir(dir)
        .arg("csv")
        .arg("--receipt")
        .arg("report.json")
        .arg("--export-dir")
        .arg("export");
    cmd.assert().code(0);
    assert!(dir.join("export/overmatch_dog.csv").is_file());
    assert!(dir.join("export/undermatch_cat.csv").is_file());

    // Confusion matrix for one rule.
    let mut cmd = ruleval();
    cmd.current_dir(dir)
        .arg("confusion")
        .arg("--receipt")
        .arg("report.json")
        .arg("--rule")
        .arg("cat");
    let output = cmd.assert().code(0).get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("confusion for rule 'cat'"));
    assert!(stdout.contains("labeled"));
    assert!(stdout.contains("unlabeled"));

    // Unknown rule fails and names the known ones.
    let mut cmd = ruleval();
    cmd.current_dir(dir)
        .arg("confusion")
        .arg("--receipt")
        .arg("report.json")
        .arg("--rule")
        .arg("bird");
    let output = cmd.assert().code(1).get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bird"));
    assert!(stderr.contains("cat, dog"));
}

#[test]
fn config_includes_compose_rule_sets() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();
    std::fs::write(
        dir.join("shared.toml"),
        r#"
[[rule]]
name = "cat"
pattern = "c.t"
"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("ruleval.toml"),
        r#"
includes = ["shared.toml"]

[[rule]]
name = "dog"
pattern = "d.g"
"#,
    )
    .unwrap();

    let mut cmd = ruleval();
    cmd.current_dir(dir).arg("rules");
    let output = cmd.assert().code(0).get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name = \"cat\""));
    assert!(stdout.contains("name = \"dog\""));
}
