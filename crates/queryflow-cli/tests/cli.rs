use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::{tempdir, NamedTempFile};

fn queryflow() -> Command {
    Command::new(env!("CARGO_BIN_EXE_queryflow"))
}

fn sql_file(sql: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".sql").tempfile().unwrap();
    write!(file, "{sql}").unwrap();
    file
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = queryflow()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn json_output_for_a_file() {
    let file = sql_file("SELECT id FROM users WHERE id > 1");
    let output = queryflow()
        .args(["-f", "json", "-c"])
        .arg(file.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["summary"]["statementCount"], 1);
    assert_eq!(
        value["queries"][0]["sourceName"],
        file.path().display().to_string()
    );
    assert_eq!(value["queries"][0]["nodes"][0]["label"], "users");
}

#[test]
fn stdin_table_output() {
    let output = run_with_stdin(&["-d", "postgres"], "SELECT * FROM orders;");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("QueryFlow Analysis"));
    assert!(stdout.contains("Source: <stdin>"));
    assert!(stdout.contains("Flow: orders → SELECT → Result"));
    assert!(!stdout.contains('\u{1b}'), "piped output must not be colored");
}

#[test]
fn failed_statement_exits_with_one() {
    let output = run_with_stdin(&["-f", "json"], "SELECT 1; SELECT (1 FROM t");

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["summary"]["errorCount"], 1);
    assert!(value["queries"][1]["error"].is_string());
}

#[test]
fn missing_input_file_exits_with_66() {
    let output = queryflow().arg("/nonexistent/input.sql").output().unwrap();

    assert_eq!(output.status.code(), Some(66));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("queryflow: error: Failed to read file"));
}

#[test]
fn output_flag_writes_to_file() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("report.json");
    let file = sql_file("UPDATE accounts SET active = false");
    let output = queryflow()
        .args(["-f", "json", "--no-lineage", "-o"])
        .arg(&target)
        .arg(file.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(value["queries"][0]["statementType"], "update");
    assert_eq!(
        value["queries"][0]["hints"][0]["message"],
        "UPDATE without WHERE affects every row of the table"
    );
}

#[test]
fn several_files_print_one_batch_each() {
    let first = sql_file("SELECT a FROM t");
    let second = sql_file("SELECT b FROM u; SELECT c FROM v");
    let output = queryflow()
        .args(["-f", "json"])
        .arg(first.path())
        .arg(second.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let batches = value.as_array().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1]["summary"]["statementCount"], 2);
}

#[test]
fn schema_flag_prints_api_schema() {
    let output = queryflow().arg("--schema").output().unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value.get("AnalyzeRequest").is_some());
    assert!(value.get("BatchResult").is_some());
}

#[test]
fn radial_layout_flag_is_applied() {
    let output = run_with_stdin(
        &["-f", "json", "--layout", "radial"],
        "SELECT a.x FROM a JOIN b ON a.id = b.id",
    );

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let nodes = value["queries"][0]["nodes"].as_array().unwrap();
    assert!(nodes.iter().all(|node| node["width"].as_f64().unwrap() > 0.0));
}
