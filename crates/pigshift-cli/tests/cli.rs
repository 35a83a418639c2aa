//! End-to-end tests for the `pigshift` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SCHEMA: &str = r#"{"fields":[{"name":"t2::t1::id","type":10},{"name":"amount","type":25}]}"#;

fn pigshift() -> Command {
    let mut cmd = Command::cargo_bin("pigshift").unwrap();
    cmd.env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY");
    cmd
}

#[test]
fn test_columns_prints_table_and_ddl() {
    let temp_dir = TempDir::new().unwrap();
    let schema = temp_dir.path().join(".pig_schema");
    std::fs::write(&schema, SCHEMA).unwrap();

    pigshift()
        .args(["columns", "--schema"])
        .arg(&schema)
        .args(["--key", "PRIMARY KEY=(id)", "--table", "payments"])
        .assert()
        .success()
        .stdout(predicate::str::contains("t1_id"))
        .stdout(predicate::str::contains("float8"))
        .stdout(predicate::str::contains(
            "CREATE TABLE payments (t1_id integer, amount float8, PRIMARY KEY (id))",
        ));
}

#[test]
fn test_columns_copy_statement_uses_environment_credentials() {
    let temp_dir = TempDir::new().unwrap();
    let schema = temp_dir.path().join(".pig_schema");
    std::fs::write(&schema, SCHEMA).unwrap();

    pigshift()
        .env("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
        .env("AWS_SECRET_ACCESS_KEY", "secret")
        .args(["columns", "--schema"])
        .arg(&schema)
        .args(["--table", "payments", "--copy-from", "s3://bucket/out"])
        .args(["--copy-options", "gzip"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "COPY payments from 's3://bucket/out' CREDENTIALS \
             'aws_access_key_id=AKIDEXAMPLE;aws_secret_access_key=secret' gzip;",
        ));
}

#[test]
fn test_columns_copy_statement_without_credentials_fails() {
    let temp_dir = TempDir::new().unwrap();
    let schema = temp_dir.path().join(".pig_schema");
    std::fs::write(&schema, SCHEMA).unwrap();

    pigshift()
        .args(["columns", "--schema"])
        .arg(&schema)
        .args(["--table", "payments", "--copy-from", "s3://bucket/out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AWS_ACCESS_KEY_ID"));
}

#[test]
fn test_columns_unsupported_type() {
    let temp_dir = TempDir::new().unwrap();
    let schema = temp_dir.path().join(".pig_schema");
    std::fs::write(&schema, r#"{"fields":[{"name":"id","type":999}]}"#).unwrap();

    pigshift()
        .args(["columns", "--schema"])
        .arg(&schema)
        .assert()
        .failure()
        .stderr(predicate::str::contains("999"));
}

#[test]
fn test_columns_missing_schema() {
    let temp_dir = TempDir::new().unwrap();

    pigshift()
        .args(["columns", "--schema"])
        .arg(temp_dir.path().join(".pig_schema"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No schema file located at"));
}

#[test]
fn test_download_then_skip() {
    let temp_dir = TempDir::new().unwrap();
    let remote = temp_dir.path().join("remote");
    let local = temp_dir.path().join("local");
    std::fs::create_dir_all(&remote).unwrap();
    std::fs::write(remote.join("part-m-00000"), b"a\tb\n").unwrap();

    let run = || {
        pigshift()
            .arg("download")
            .arg("--remote")
            .arg(&remote)
            .arg("--local-dir")
            .arg(&local)
            .args(["--file", "part-m-00000"])
            .assert()
            .success()
    };

    run().stdout(predicate::str::contains("copied 4 bytes"));
    assert_eq!(std::fs::read(local.join("part-m-00000")).unwrap(), b"a\tb\n");
    run().stdout(predicate::str::contains("skipped"));
}

#[test]
fn test_upload_missing_local_file() {
    let temp_dir = TempDir::new().unwrap();
    let remote = temp_dir.path().join("remote");
    std::fs::create_dir_all(&remote).unwrap();

    pigshift()
        .arg("upload")
        .arg("--remote")
        .arg(&remote)
        .arg("--local-dir")
        .arg(temp_dir.path())
        .args(["--file", "missing.tsv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed"));
    assert!(!remote.join("missing.tsv").exists());
}
