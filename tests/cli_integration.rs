use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const RATES: &str = r#"{
  "model_ratio": {"gpt-4o-mini": 0.5, "gpt-4o": 1.25},
  "completion_ratio": {"gpt-4o-mini": 2, "gpt-4o": 4},
  "cache_ratio": {"gpt-4o-mini": 0.5},
  "model_price": {"dall-e-3": 0.01},
  "group_ratio": {"default": 1, "vip": 2},
  "quota_per_unit": 500000
}"#;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write test file");
}

fn setup() -> (TempDir, PathBuf) {
    let root = TempDir::new().expect("temp dir");
    let rates = root.path().join("rates.json");
    write_file(&rates, RATES);
    (root, rates)
}

fn run_quotacalc(args: &[&str], home: &Path) -> (bool, Vec<u8>, Vec<u8>) {
    let bin = std::env::var("CARGO_BIN_EXE_quotacalc").unwrap_or_else(|_| {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        if cfg!(windows) {
            path.push("quotacalc.exe");
        } else {
            path.push("quotacalc");
        }
        path.to_string_lossy().into_owned()
    });
    let output = Command::new(bin)
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_CACHE_HOME", home.join(".cache"))
        .output()
        .expect("run quotacalc");
    (output.status.success(), output.stdout, output.stderr)
}

fn approx(value: &Value, expected: f64) -> bool {
    value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}

#[test]
fn cost_json_text_only() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, stdout, stderr) = run_quotacalc(
        &[
            "cost", "-r", &rates, "-j", "-m", "gpt-4o-mini", "-i", "1000000", "-c", "500000",
        ],
        root.path(),
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["mode"].as_str(), Some("ratio"));
    assert!(approx(&json["price_per_million"], 1.0));
    assert!(approx(&json["total_cost"], 2.0));
    assert_eq!(json["quota"].as_i64(), Some(1_000_000));
    assert!(json["derivation"].as_array().is_some_and(|lines| !lines.is_empty()));
}

#[test]
fn cost_json_with_cache_discount() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, stdout, stderr) = run_quotacalc(
        &[
            "cost",
            "-r",
            &rates,
            "-j",
            "-m",
            "gpt-4o-mini",
            "-i",
            "1000000",
            "-c",
            "500000",
            "--cache",
            "200000",
        ],
        root.path(),
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert!(approx(&json["effective_input_tokens"], 900_000.0));
    assert!(approx(&json["total_cost"], 1.9));
    assert_eq!(json["quota"].as_i64(), Some(950_000));
}

#[test]
fn cost_json_fixed_price_ignores_tokens() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, stdout, stderr) = run_quotacalc(
        &[
            "cost", "-r", &rates, "-j", "-m", "dall-e-3", "-g", "vip", "-i", "123456",
        ],
        root.path(),
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["mode"].as_str(), Some("fixed"));
    assert!(approx(&json["total_cost"], 0.02));
}

#[test]
fn cost_unknown_group_fails() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, stdout, stderr) = run_quotacalc(
        &[
            "cost", "-r", &rates, "-m", "gpt-4o", "-g", "vip-legacy", "-i", "10",
        ],
        root.path(),
    );
    assert!(!ok);
    assert!(stdout.is_empty());
    let stderr = String::from_utf8_lossy(&stderr);
    assert!(stderr.contains("Unknown group \"vip-legacy\""), "stderr: {stderr}");
}

#[test]
fn cost_unpriced_model_fails() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, _, stderr) = run_quotacalc(
        &["cost", "-r", &rates, "-m", "mystery", "-i", "10"],
        root.path(),
    );
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("mystery"));
}

#[test]
fn cost_rejects_cache_larger_than_input() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, _, stderr) = run_quotacalc(
        &[
            "cost", "-r", &rates, "-m", "gpt-4o", "-i", "10", "--cache", "20",
        ],
        root.path(),
    );
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("exceeds input_tokens"));
}

#[test]
fn to_quota_uses_flag_unit() {
    let root = TempDir::new().expect("temp dir");
    let (ok, stdout, stderr) = run_quotacalc(
        &["to-quota", "1.9", "--quota-per-unit", "500000"],
        root.path(),
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert_eq!(String::from_utf8_lossy(&stdout).trim(), "950000");
}

#[test]
fn to_quota_reads_unit_from_rates_document() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, stdout, stderr) = run_quotacalc(&["to-quota", "2", "-r", &rates], root.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert_eq!(String::from_utf8_lossy(&stdout).trim(), "1000000");
}

#[test]
fn to_quota_without_unit_fails() {
    let root = TempDir::new().expect("temp dir");
    let (ok, _, stderr) = run_quotacalc(&["to-quota", "1.9"], root.path());
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("QuotaPerUnit"));
}

#[test]
fn to_quota_rejects_non_finite_amount() {
    let root = TempDir::new().expect("temp dir");
    for amount in ["NaN", "inf"] {
        let (ok, stdout, stderr) = run_quotacalc(
            &["to-quota", amount, "--quota-per-unit", "500000"],
            root.path(),
        );
        assert!(!ok, "{amount} printed {}", String::from_utf8_lossy(&stdout));
        assert!(String::from_utf8_lossy(&stderr).contains("cannot be expressed as quota"));
    }
}

#[test]
fn to_currency_without_unit_abbreviates() {
    let root = TempDir::new().expect("temp dir");
    let (ok, stdout, stderr) = run_quotacalc(&["to-currency", "950000", "-j"], root.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert!(json["amount"].is_null());
    assert_eq!(json["display"].as_str(), Some("950.0k"));
}

#[test]
fn to_currency_with_config_file_unit() {
    let root = TempDir::new().expect("temp dir");
    write_file(
        &root.path().join(".config/quotacalc/config.toml"),
        "quota_per_unit = 500000\n",
    );
    let (ok, stdout, stderr) = run_quotacalc(&["to-currency", "950000", "-j"], root.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert!(approx(&json["amount"], 1.9));
    assert!(approx(&json["quota_per_unit"], 500_000.0));
}

#[test]
fn rates_json_lists_priced_models() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, stdout, stderr) = run_quotacalc(&["rates", "-r", &rates, "-j"], root.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    let models: Vec<&str> = json
        .as_array()
        .expect("array output")
        .iter()
        .filter_map(|row| row["model"].as_str())
        .collect();
    assert_eq!(models, vec!["dall-e-3", "gpt-4o", "gpt-4o-mini"]);
}

#[test]
fn rates_unknown_group_fails() {
    let (root, rates) = setup();
    let rates = rates.to_string_lossy();
    let (ok, _, stderr) = run_quotacalc(
        &["rates", "-r", &rates, "-g", "vip-legacy"],
        root.path(),
    );
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("vip-legacy"));
}

#[test]
fn logs_json_recomputes_records() {
    let (root, rates) = setup();
    let log = root.path().join("logs").join("usage.jsonl");
    write_file(
        &log,
        r#"{"created_at":1760000000,"model_name":"gpt-4o-mini","group":"default","prompt_tokens":1000000,"completion_tokens":500000,"quota":1000000}
not json at all
{"created_at":1760000100,"model_name":"dall-e-3","group":"vip","other":{"model_price":0.01,"group_ratio":2},"quota":10000}
{"created_at":1760000200,"model_name":"mystery","prompt_tokens":5}
"#,
    );
    let rates = rates.to_string_lossy();
    let log = log.to_string_lossy();
    let (ok, stdout, stderr) = run_quotacalc(
        &["logs", &log, "-r", &rates, "-j", "--timezone", "UTC"],
        root.path(),
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    let records = json["records"].as_array().expect("records");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["time"].as_str(), Some("2025-10-09 08:53:20"));
    assert!(approx(&records[0]["cost"], 2.0));
    assert_eq!(records[0]["quota_diff"].as_i64(), Some(0));
    assert_eq!(records[1]["rates_source"].as_str(), Some("record"));
    assert!(approx(&records[1]["cost"], 0.02));
    assert!(records[2]["cost"].is_null());
    assert!(records[2]["error"].is_string());

    assert_eq!(json["summary"]["skipped_lines"].as_u64(), Some(1));
    assert_eq!(json["summary"]["unpriced"].as_u64(), Some(1));
    assert!(approx(&json["summary"]["total_cost"], 2.02));
}

#[test]
fn logs_no_matching_files_fails() {
    let root = TempDir::new().expect("temp dir");
    let pattern = root.path().join("missing-*.jsonl");
    let (ok, _, stderr) = run_quotacalc(&["logs", &pattern.to_string_lossy()], root.path());
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("No usage log files matched"));
}
