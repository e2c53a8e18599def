//! End-to-end tests for the `microlector` binary.

use anyhow::Result;
use microlector::testing::*;
use std::path::Path;
use std::process::{Command, Output};

fn microlector(cwd: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_microlector"))
        .current_dir(cwd)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()?)
}

fn workspace() -> Result<TempDirPath> {
    let dir = TempDirPath::new()?;
    std::fs::create_dir(dir.file_path("formats"))?;
    std::fs::write(
        dir.file_path("formats/epf.json"),
        serde_json::to_string_pretty(&household_definition())?,
    )?;
    write_data_file(&dir, "hogares.txt", household_lines())?;
    write_data_file(&dir, "personas.txt", person_lines())?;
    Ok(dir)
}

#[test]
fn test_loads_into_named_database() -> Result<()> {
    let dir = workspace()?;
    let out = microlector(dir.path(), &["epf", "encuesta", "--report", "report.json"])?;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stdout));

    let hogares = std::fs::read_to_string(dir.file_path("data/encuesta/hogares.jsonl"))?;
    assert_eq!(hogares.lines().count(), 3);
    assert!(hogares.starts_with(r#"{"_id":"1","numero":1,"region":"Norte","miembros":1,"personas":[{"ingresos":1234.56}]}"#));

    let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(dir.file_path("report.json"))?)?;
    assert_eq!(report["files"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn test_database_defaults_to_file_type() -> Result<()> {
    let dir = workspace()?;
    let out = microlector(dir.path(), &["epf"])?;
    assert!(out.status.success());
    assert!(dir.file_path("data/epf/hogares.jsonl").is_file());
    Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()> {
    let dir = workspace()?;
    let out = microlector(dir.path(), &["epf", "--dry-run"])?;
    assert!(out.status.success());
    assert!(!dir.file_path("data").exists());
    Ok(())
}

#[test]
fn test_explicit_data_paths() -> Result<()> {
    let dir = workspace()?;
    std::fs::create_dir(dir.file_path("raw"))?;
    std::fs::rename(dir.file_path("personas.txt"), dir.file_path("raw/p2023.txt"))?;

    let out = microlector(dir.path(), &["epf", "--data", "personas=raw/p2023.txt"])?;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stdout));
    Ok(())
}

#[test]
fn test_failure_exits_one_with_message() -> Result<()> {
    let dir = workspace()?;
    let out = microlector(dir.path(), &["eph"])?;
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("no definition found for file type 'eph'"));
    Ok(())
}

#[test]
fn test_partial_load_is_flushed() -> Result<()> {
    let dir = workspace()?;
    write_data_file(&dir, "personas.txt", ["0001123456", "00029999"])?;

    let out = microlector(dir.path(), &["epf"])?;
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("line 2 of 'personas'"));

    let hogares = std::fs::read_to_string(dir.file_path("data/epf/hogares.jsonl"))?;
    assert_eq!(hogares.matches("personas").count(), 1);
    Ok(())
}
