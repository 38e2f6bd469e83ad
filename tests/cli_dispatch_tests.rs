use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use quartermaster::config::CONFIG_ENV_VAR;

const POOL_CSV: &str = "\
id,name,group,category,price,predicted_score
1,Keeper A,North,GK,5.0,4
2,Keeper B,South,GK,4.0,3
3,Back A,North,DEF,6.0,6
4,Back B,East,DEF,4.5,5
5,Striker A,West,FWD,9.0,9
6,Striker B,South,FWD,7.0,7
";

const CONFIG_YAML: &str = "\
squad_size: 3
category_quota:
  GK: 1
  DEF: 1
  FWD: 1
budget_cap: 20
group_cap: 1
";

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_quartermaster")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("quartermaster-{name}-{stamp}.{extension}"))
}

struct Fixture {
    pool: PathBuf,
    config: PathBuf,
}

impl Fixture {
    fn new(name: &str, pool_csv: &str) -> Self {
        Self::with_config(name, pool_csv, CONFIG_YAML)
    }

    fn with_config(name: &str, pool_csv: &str, config_yaml: &str) -> Self {
        let pool = unique_temp_path(&format!("{name}-pool"), "csv");
        let config = unique_temp_path(&format!("{name}-config"), "yaml");
        fs::write(&pool, pool_csv).expect("pool fixture should be written");
        fs::write(&config, config_yaml).expect("config fixture should be written");
        Self { pool, config }
    }

    fn run(&self, command: &str, extra: &[&str]) -> Output {
        Command::new(bin())
            .env_remove(CONFIG_ENV_VAR)
            .arg(command)
            .arg(&self.pool)
            .arg("--config")
            .arg(&self.config)
            .args(extra)
            .output()
            .expect("binary should run")
    }

    /// Config reaches the binary only through the environment.
    fn run_with_env_config(&self, command: &str, extra: &[&str]) -> Output {
        Command::new(bin())
            .env(CONFIG_ENV_VAR, &self.config)
            .env_remove("RUST_LOG")
            .arg(command)
            .arg(&self.pool)
            .args(extra)
            .output()
            .expect("binary should run")
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.pool);
        let _ = fs::remove_file(&self.config);
    }
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("command should emit json")
}

#[test]
fn solve_breaks_score_ties_by_smallest_ids() {
    let fixture = Fixture::new("solve", POOL_CSV);
    let output = fixture.run("solve", &[]);

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    let mut ids: Vec<u64> = payload["members"]
        .as_array()
        .expect("members array")
        .iter()
        .filter_map(|member| member["id"].as_u64())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 4, 5]);
    assert_eq!(payload["captain"]["id"].as_u64(), Some(5));
    assert_eq!(payload["total_score"].as_f64(), Some(18.0));
    assert_eq!(payload["total_with_bonus"].as_f64(), Some(27.0));
    assert_eq!(payload["optimality"], "certified");
}

#[test]
fn solve_groups_members_under_plural_labels() {
    let fixture = Fixture::new("lineup", POOL_CSV);
    let output = fixture.run("solve", &[]);

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    assert_eq!(payload["lineup"]["goalkeepers"], serde_json::json!([1]));
    assert_eq!(payload["lineup"]["defenders"], serde_json::json!([4]));
    assert_eq!(payload["lineup"]["forwards"], serde_json::json!([5]));
    assert!(payload["lineup"].get("midfielders").is_none());
}

#[test]
fn config_from_environment_sets_the_constraints() {
    let fixture = Fixture::new("env-config", POOL_CSV);
    let output = fixture.run_with_env_config("solve", &[]);

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let payload = stdout_json(&output);
    let mut ids: Vec<u64> = payload["members"]
        .as_array()
        .expect("members array")
        .iter()
        .filter_map(|member| member["id"].as_u64())
        .collect();
    ids.sort_unstable();
    // The built-in 15-member convention would be infeasible on six candidates.
    assert_eq!(ids, vec![1, 4, 5]);
}

#[test]
fn json_log_format_writes_structured_lines_to_stderr() {
    let config = format!("{CONFIG_YAML}logging:\n  level: info\n  format: json\n");
    let fixture = Fixture::with_config("json-logs", POOL_CSV, &config);
    let output = fixture.run_with_env_config("generate", &["--count", "1"]);

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| serde_json::from_str(line).expect("log line should be json"))
        .collect();
    assert!(
        events.iter().any(|event| event["level"] == "INFO"),
        "{stderr}"
    );
    assert_eq!(stdout_json(&output)["squads"].as_array().map(Vec::len), Some(1));
}

#[test]
fn predictions_lists_both_ends() {
    let fixture = Fixture::new("predictions", POOL_CSV);
    let output = fixture.run("predictions", &["--limit", "2"]);

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    let ids = |key: &str| -> Vec<u64> {
        payload[key]
            .as_array()
            .expect("ranked list")
            .iter()
            .filter_map(|entry| entry["id"].as_u64())
            .collect()
    };
    assert_eq!(ids("top"), vec![5, 6]);
    assert_eq!(ids("bottom"), vec![2, 1]);
    assert_eq!(payload["total_candidates"].as_u64(), Some(6));
}

#[test]
fn solve_with_tiny_budget_reports_infeasible() {
    let fixture = Fixture::new("tiny-budget", POOL_CSV);
    let output = fixture.run("solve", &["--budget", "1"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no feasible squad"), "{stderr}");
}

#[test]
fn generate_records_why_it_stopped() {
    let fixture = Fixture::new("generate", POOL_CSV);
    let output = fixture.run("generate", &["--count", "5"]);

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    assert_eq!(payload["squads"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["squads"][0]["label"], "Squad Option 1");
    assert_eq!(payload["stopped_early"]["reason"], "solve_failed");
    assert_eq!(payload["stopped_early"]["kind"], "infeasible");
}

#[test]
fn top_lists_highest_scores_first() {
    let fixture = Fixture::new("top", POOL_CSV);
    let output = fixture.run("top", &["--limit", "2"]);

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    let ids: Vec<u64> = payload
        .as_array()
        .expect("ranking array")
        .iter()
        .filter_map(|row| row["id"].as_u64())
        .collect();
    assert_eq!(ids, vec![5, 6]);
}

#[test]
fn sweep_keeps_budget_order() {
    let fixture = Fixture::new("sweep", POOL_CSV);
    let output = fixture.run("sweep", &["--budgets", "20,12", "--workers", "2"]);

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    let rows = payload.as_array().expect("sweep rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["total_score"].as_f64(), Some(18.0));
    assert!(rows[1]["error"].is_string());
}

#[test]
fn validate_command_returns_non_zero_on_duplicate_ids() {
    let fixture = Fixture::new(
        "invalid",
        "id,name,group,category,price,predicted_score\n1,A,X,GK,4.0,1\n1,B,Y,DEF,4.0,1\n",
    );
    let output = fixture.run("validate", &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate id 1"), "{stderr}");
}

#[test]
fn demo_generates_from_synthetic_league() {
    let output = Command::new(bin())
        .env_remove(CONFIG_ENV_VAR)
        .args(["demo", "--clubs", "6", "--count", "1"])
        .output()
        .expect("demo should run");

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    assert_eq!(payload["squads"][0]["squad"]["members"].as_array().map(Vec::len), Some(15));
}

#[test]
fn unknown_command_is_a_usage_error() {
    let output = Command::new(bin())
        .arg("serve")
        .output()
        .expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_pool_file_fails_cleanly() {
    let output = Command::new(bin())
        .env_remove(CONFIG_ENV_VAR)
        .args(["solve", "/nonexistent/quartermaster-pool.json"])
        .output()
        .expect("binary should run");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pool load failed"), "{stderr}");
}
