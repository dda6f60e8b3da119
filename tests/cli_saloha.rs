use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "saloha-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const JSON_CONFIG: &str = r#"
{
    "stations": 4,
    "slot_bytes": 125,
    "rate_mbps": 10.0,
    "algorithm": "B",
    "load": 0.2,
    "interarrival": "E",
    "duration_ms": 20.0,
    "warmup_ms": 2.0,
    "seed": 17,
    "significance": 0.05,
    "z": 1.96,
    "resolution": 5.0
}
"#;

#[test]
fn saloha_writes_json_report() {
    let dir = unique_temp_dir("json-report");
    let config = write_file(&dir, "config.json", JSON_CONFIG);
    let out_json = dir.join("report.json");

    let output = Command::new(env!("CARGO_BIN_EXE_saloha"))
        .args([
            "--config",
            config.to_str().unwrap(),
            "--report-json",
            out_json.to_str().unwrap(),
        ])
        .output()
        .expect("run saloha");
    assert!(
        output.status.success(),
        "saloha failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("summary:"), "stdout={stdout}");
    assert!(stdout.contains("theory:"), "stdout={stdout}");

    let raw = fs::read_to_string(&out_json).expect("read report.json");
    let v: Value = serde_json::from_str(&raw).expect("parse report.json");
    assert_eq!(v["run"]["completed"].as_bool(), Some(true));
    assert_eq!(v["run"]["algorithm"].as_str(), Some("B"));
    assert_eq!(v["run"]["total_slots"].as_u64(), Some(200));
    assert_eq!(v["run"]["warmup_slots"].as_u64(), Some(20));

    let per_station = v["delay"]["per_station"]
        .as_array()
        .expect("per-station delay histograms");
    assert_eq!(per_station.len(), 4);
    let station_samples: u64 = per_station
        .iter()
        .map(|h| h["samples"].as_u64().unwrap_or(0))
        .sum();
    assert_eq!(
        v["summary"]["delay_samples"].as_u64(),
        Some(station_samples)
    );
    assert!(v["contenders"].is_null());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn saloha_reads_ordered_text_input_with_overrides() {
    let dir = unique_temp_dir("ordered-input");
    let input = write_file(
        &dir,
        "input.txt",
        "5 125 10 P 0.3 0.1 E 10 1 3 0.05 1.96 5\n",
    );
    let out_json = dir.join("report.json");

    let output = Command::new(env!("CARGO_BIN_EXE_saloha"))
        .args([
            "--input",
            input.to_str().unwrap(),
            "--algorithm",
            "O",
            "--report-json",
            out_json.to_str().unwrap(),
        ])
        .output()
        .expect("run saloha");
    assert!(
        output.status.success(),
        "saloha failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let raw = fs::read_to_string(&out_json).expect("read report.json");
    let v: Value = serde_json::from_str(&raw).expect("parse report.json");
    assert_eq!(v["run"]["algorithm"].as_str(), Some("O"));
    assert_eq!(v["run"]["stations"].as_u64(), Some(5));
    assert!(v["contenders"].is_object(), "optimal-p run reports contenders");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn saloha_rejects_zero_resolution() {
    let dir = unique_temp_dir("zero-r");
    let input = write_file(&dir, "input.txt", "5 125 10 B 0.5 0.1 E 10 1 3 0.05 1.96 0");

    let output = Command::new(env!("CARGO_BIN_EXE_saloha"))
        .args(["--input", input.to_str().unwrap()])
        .output()
        .expect("run saloha");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[ERROR]"), "stderr={stderr}");
    assert!(stderr.contains("nonzero"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn saloha_rejects_unknown_algorithm_override() {
    let dir = unique_temp_dir("bad-algorithm");
    let config = write_file(&dir, "config.json", JSON_CONFIG);

    let output = Command::new(env!("CARGO_BIN_EXE_saloha"))
        .args(["--config", config.to_str().unwrap(), "--algorithm", "X"])
        .output()
        .expect("run saloha");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown contention resolution algorithm"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn saloha_requires_an_input_source() {
    let output = Command::new(env!("CARGO_BIN_EXE_saloha"))
        .output()
        .expect("run saloha");
    assert!(!output.status.success());
}

#[test]
fn saloha_prints_partial_report_when_a_queue_overflows() {
    let dir = unique_temp_dir("overflow");
    let config = write_file(
        &dir,
        "config.json",
        r#"
{
    "stations": 5,
    "slot_bytes": 125,
    "rate_mbps": 10.0,
    "algorithm": "P",
    "persistence": 1.0,
    "load": 1.5,
    "duration_ms": 100.0,
    "warmup_ms": 0.0,
    "seed": 2,
    "significance": 0.05,
    "z": 1.96,
    "resolution": 5.0,
    "queue_capacity": 2
}
        "#,
    );
    let out_json = dir.join("report.json");

    let output = Command::new(env!("CARGO_BIN_EXE_saloha"))
        .args([
            "--config",
            config.to_str().unwrap(),
            "--report-json",
            out_json.to_str().unwrap(),
        ])
        .output()
        .expect("run saloha");
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("completed=false"), "stdout={stdout}");
    assert!(stdout.contains("summary:"), "stdout={stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is full"), "stderr={stderr}");

    let raw = fs::read_to_string(&out_json).expect("read report.json");
    let v: Value = serde_json::from_str(&raw).expect("parse report.json");
    assert_eq!(v["run"]["completed"].as_bool(), Some(false));
    let simulated = v["run"]["simulated_slots"].as_u64().expect("simulated_slots");
    assert!(simulated < 1_000, "simulated = {simulated}");
    let simulated_ms = v["run"]["simulated_ms"].as_f64().expect("simulated_ms");
    assert!((simulated_ms - simulated as f64 * 0.1).abs() < 1e-9);

    let _ = fs::remove_dir_all(&dir);
}
