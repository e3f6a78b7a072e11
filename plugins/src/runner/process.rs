use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pipewright_core::runner::{ExitReport, RunnerPlugin, RunnerSession, RunnerStartArgs};
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

/// Runs each job as a local child process.
pub struct ProcessRunnerPlugin {}

impl ProcessRunnerPlugin {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ProcessRunnerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerPlugin for ProcessRunnerPlugin {
    fn name(&self) -> &str {
        "process"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> Result<Box<dyn RunnerSession>> {
        let mut cmd = Command::new(&args.cmd);
        cmd.args(&args.args)
            .envs(&args.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &args.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", args.cmd))?;
        tracing::debug!(pid = ?child.id(), cmd = %args.cmd, "spawned job process");

        Ok(Box::new(ProcessRunnerSession { child }))
    }
}

struct ProcessRunnerSession {
    child: Child,
}

#[async_trait]
impl RunnerSession for ProcessRunnerSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn wait(&mut self) -> Result<ExitReport> {
        let status = self.child.wait().await?;
        Ok(exit_report(status))
    }
}

fn exit_report(status: std::process::ExitStatus) -> ExitReport {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        ExitReport {
            exit_code: status.code(),
            signal: status.signal(),
        }
    }
    #[cfg(not(unix))]
    {
        ExitReport {
            exit_code: status.code(),
            signal: None,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pipewright_core::config::{RunLayout, RunnerConfig};
    use pipewright_core::plan::Job;
    use pipewright_core::runner::{run_job, Outcome, RunJobArgs};
    use pretty_assertions::assert_eq;

    async fn run(dir: &std::path::Path, job: &Job) -> pipewright_core::runner::JobRunResult {
        run_with(dir, job, &RunnerConfig::default()).await
    }

    async fn run_with(
        dir: &std::path::Path,
        job: &Job,
        runner: &RunnerConfig,
    ) -> pipewright_core::runner::JobRunResult {
        let layout = RunLayout::under(dir);
        run_job(RunJobArgs {
            job,
            plugin: &ProcessRunnerPlugin::new(),
            layout: &layout,
            runner,
            base_dir: dir,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn combined_output_lands_in_the_job_log() {
        let dir = tempfile::tempdir().unwrap();
        let job = Job::command(
            "openblas",
            "sh",
            ["-c", "echo configure; echo 'warn: slow' >&2; echo make"],
        );

        let result = run(dir.path(), &job).await;

        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(result.exit, Some(ExitReport::code(0)));
        let log = std::fs::read_to_string(dir.path().join("logs/openblas.log")).unwrap();
        for line in ["configure", "warn: slow", "make"] {
            assert!(log.contains(line), "missing {line:?} in {log:?}");
        }
    }

    #[tokio::test]
    async fn script_sees_its_build_dir_and_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("recipes")).unwrap();
        std::fs::write(
            dir.path().join("recipes/build_torch.sh"),
            "set -e\necho \"rocm=$PYTORCH_ROCM_ARCH\"\ntouch \"$PIPEWRIGHT_BUILD_DIR/torch-2.5.1-cp312-cp312-linux_x86_64.whl\"\n",
        )
        .unwrap();
        let job = Job::script("torch", "recipes/build_torch.sh").with_env("PYTORCH_ROCM_ARCH", "gfx942");

        let result = run(dir.path(), &job).await;

        assert_eq!(result.outcome, Outcome::Success, "{}", result.output_tail);
        assert!(result.output_tail.contains("rocm=gfx942"));
        assert!(dir
            .path()
            .join("build/torch/torch-2.5.1-cp312-cp312-linux_x86_64.whl")
            .is_file());
    }

    #[tokio::test]
    async fn nonzero_exit_and_signal_are_failures() {
        let dir = tempfile::tempdir().unwrap();

        let exited = run(dir.path(), &Job::command("a", "sh", ["-c", "echo boom >&2; exit 3"])).await;
        assert_eq!(exited.outcome, Outcome::Failure);
        assert_eq!(exited.exit, Some(ExitReport::code(3)));
        assert!(exited.output_tail.contains("boom"));

        let killed = run(dir.path(), &Job::command("b", "sh", ["-c", "kill -9 $$"])).await;
        assert_eq!(killed.outcome, Outcome::Failure);
        assert_eq!(killed.exit, Some(ExitReport::signalled(9)));
    }

    #[tokio::test]
    async fn unknown_program_is_missing_definition() {
        let dir = tempfile::tempdir().unwrap();
        let job = Job::command("vllm", "pipewright-no-such-program", Vec::<String>::new());

        let result = run(dir.path(), &job).await;

        assert_eq!(result.outcome, Outcome::MissingDefinition);
        let log = std::fs::read_to_string(&result.log_path).unwrap();
        assert!(log.contains("pipewright-no-such-program"));
    }

    #[tokio::test]
    async fn large_output_does_not_block_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let job = Job::command(
            "big",
            "sh",
            ["-c", "i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done"],
        );

        let result = run(dir.path(), &job).await;

        assert_eq!(result.outcome, Outcome::Success);
        assert!(result.output_tail.ends_with("line-19999\n"));
        assert!(result.bytes_logged > 64 * 1024);
    }

    #[tokio::test]
    async fn background_daemon_holding_the_pipes_does_not_stall_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let job = Job::command("sccache", "sh", ["-c", "sleep 20 & echo built; exit 0"]);
        let runner = RunnerConfig {
            drain_grace_ms: 200,
            ..RunnerConfig::default()
        };

        let started = std::time::Instant::now();
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            run_with(dir.path(), &job, &runner),
        )
        .await
        .expect("job should finish once the shell exits");

        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert_eq!(result.outcome, Outcome::Success);
        let log = std::fs::read_to_string(&result.log_path).unwrap();
        assert!(log.contains("built"), "{log:?}");
    }
}
