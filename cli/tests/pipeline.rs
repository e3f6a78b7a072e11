//! End-to-end runs of the `pipewright` binary against throwaway plans.
#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn pipewright(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pipewright"))
        .args(args)
        .current_dir(root)
        .env("HOME", root)
        .env("RUST_LOG", "warn")
        .env_remove("PIPEWRIGHT_LOG_DIR")
        .env_remove("PIPEWRIGHT_BUILD_ROOT")
        .env_remove("PIPEWRIGHT_OUTPUT_DIR")
        .env_remove("PIPEWRIGHT_SHELL")
        .output()
        .expect("spawn pipewright")
}

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

const WHEEL_RECIPE: &str = r#"set -e
echo "building $PIPEWRIGHT_JOB_NAME"
mkdir -p "$PIPEWRIGHT_BUILD_DIR/dist"
touch "$PIPEWRIGHT_BUILD_DIR/dist/$1-1.0.0-cp312-cp312-linux_x86_64.whl"
"#;

fn write_recipes(root: &Path) {
    write(&root.join("recipes/wheel.sh"), WHEEL_RECIPE);
    write(&root.join("recipes/fail.sh"), "echo 'error: compiler exploded' >&2\nexit 2\n");
}

fn job_names_in_order(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter(|v| v["type"] == "job.end")
        .map(|v| format!("{}:{}", v["job"].as_str().unwrap(), v["outcome"].as_str().unwrap()))
        .collect()
}

#[test]
fn optional_failure_completes_and_collects() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_recipes(root);
    write(
        &root.join("plan.toml"),
        r#"
[[phase]]
name = "A"
  [[phase.job]]
  name = "torch"
  command = ["bash", "recipes/wheel.sh", "torch"]

[[phase]]
name = "B"
  [[phase.job]]
  name = "xformers"
  script = "recipes/fail.sh"
  criticality = "optional"

  [[phase.job]]
  name = "vllm"
  command = ["bash", "recipes/wheel.sh", "vllm"]
  criticality = "optional"
"#,
    );

    let out = pipewright(root, &["run", "--plan", "plan.toml", "--format", "jsonl"]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(0), "{stdout}");
    assert_eq!(
        job_names_in_order(&stdout),
        vec!["torch:success", "xformers:failure", "vllm:success"]
    );
    assert!(root.join("dist/torch-1.0.0-cp312-cp312-linux_x86_64.whl").is_file());
    assert!(root.join("dist/vllm-1.0.0-cp312-cp312-linux_x86_64.whl").is_file());
    assert!(root.join("dist/install.sh").is_file());
    let xformers_log = std::fs::read_to_string(root.join("logs/xformers.log")).unwrap();
    assert!(xformers_log.contains("compiler exploded"));
}

#[test]
fn required_failure_aborts_and_names_the_job() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_recipes(root);
    write(
        &root.join("plan.toml"),
        r#"
[[phase]]
name = "A"
  [[phase.job]]
  name = "job1"
  script = "recipes/fail.sh"

[[phase]]
name = "B"
  [[phase.job]]
  name = "job2"
  command = ["bash", "recipes/wheel.sh", "torch"]
  criticality = "optional"
"#,
    );

    let out = pipewright(root, &["run", "--plan", "plan.toml", "--ascii"]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr.contains("required job 'job1'"), "{stderr}");
    assert!(stdout.contains("aborted at 'job1'"), "{stdout}");
    assert!(stdout.contains("job2  not run"), "{stdout}");
    assert!(root.join("logs/job1.log").is_file());
    assert!(!root.join("logs/job2.log").exists());
    assert!(root.join("dist/install.sh").is_file());
}

#[test]
fn missing_script_is_reported_with_a_log() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("plan.toml"),
        r#"
[[phase]]
name = "A"
  [[phase.job]]
  name = "triton"
  script = "recipes/does_not_exist.sh"
"#,
    );

    let out = pipewright(root, &["run", "--plan", "plan.toml", "--format", "jsonl"]);

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        job_names_in_order(&String::from_utf8_lossy(&out.stdout)),
        vec!["triton:missing_definition"]
    );
    let log = std::fs::read_to_string(root.join("logs/triton.log")).unwrap();
    assert!(log.contains("does_not_exist.sh"));
}

#[test]
fn invalid_plan_exits_with_config_code_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("plan.toml"),
        r#"
[[phase]]
name = "A"
  [[phase.job]]
  name = "torch"
  command = ["true"]
  [[phase.job]]
  name = "torch"
  command = ["true"]
"#,
    );

    let out = pipewright(root, &["run", "--plan", "plan.toml"]);

    assert_eq!(out.status.code(), Some(11));
    assert!(String::from_utf8_lossy(&out.stderr).contains("duplicate job name: torch"));
    assert!(!root.join("logs").exists());
}

#[test]
fn plan_and_collect_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("plan.toml"),
        r#"
[[phase]]
name = "frameworks"
  [[phase.job]]
  name = "torch"
  script = "recipes/build_torch.sh"
"#,
    );

    let out = pipewright(root, &["plan", "--plan", "plan.toml"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("phase 1: frameworks"));

    write(
        &root.join("build/torch/out/torch-2.5.1-cp312-cp312-linux_x86_64.whl"),
        "wheel",
    );
    let out = pipewright(root, &["collect", "--plan", "plan.toml", "--output-dir", "wheels"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(root.join("wheels/torch-2.5.1-cp312-cp312-linux_x86_64.whl").is_file());
    assert!(String::from_utf8_lossy(&out.stdout).contains("[torch 2.5.1] from torch"));
}

#[test]
fn log_failure_mid_run_still_collects_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_recipes(root);
    write(
        &root.join("plan.toml"),
        r#"
[[phase]]
name = "A"
  [[phase.job]]
  name = "torch"
  command = ["bash", "recipes/wheel.sh", "torch"]

[[phase]]
name = "B"
  [[phase.job]]
  name = "xformers"
  command = ["bash", "recipes/wheel.sh", "xformers"]
  criticality = "optional"

  [[phase.job]]
  name = "vllm"
  command = ["bash", "recipes/wheel.sh", "vllm"]
  criticality = "optional"
"#,
    );
    std::fs::create_dir_all(root.join("logs/xformers.log")).unwrap();

    let out = pipewright(root, &["run", "--plan", "plan.toml", "--format", "jsonl"]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(20), "{stdout}");
    assert_eq!(
        job_names_in_order(&stdout),
        vec!["torch:success", "xformers:failure"]
    );
    assert!(stdout.lines().any(|l| l.contains("\"run.report\"")), "{stdout}");
    assert!(root.join("dist/torch-1.0.0-cp312-cp312-linux_x86_64.whl").is_file());
    assert!(root.join("dist/install.sh").is_file());
    assert!(!root.join("logs/vllm.log").exists());
}
