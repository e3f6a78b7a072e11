use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{RunLayout, RunnerConfig};
use crate::error::RunnerError;
use crate::plan::{Job, JobUnit};
use crate::util::{absolutize, RingBytes};

use super::io_pump::{self, LogChunk};
use super::traits::RunnerPlugin;
use super::types::{JobRunResult, Outcome, RunnerStartArgs};

const CHUNK_CHANNEL_CAPACITY: usize = 256;

pub struct RunJobArgs<'a> {
    pub job: &'a Job,
    pub plugin: &'a dyn RunnerPlugin,
    pub layout: &'a RunLayout,
    pub runner: &'a RunnerConfig,
    /// Directory that relative job paths and the default cwd resolve against.
    pub base_dir: &'a Path,
}

/// Run one job to completion.
///
/// The log file is created before anything else, so every attempted job
/// leaves one behind. `Err` is reserved for failures of the log itself; a
/// job that cannot be started is `Outcome::MissingDefinition`.
pub async fn run_job(args: RunJobArgs<'_>) -> Result<JobRunResult, RunnerError> {
    let RunJobArgs {
        job,
        plugin,
        layout,
        runner,
        base_dir,
    } = args;

    let started = Instant::now();
    let log_path = layout.log_path(&job.name);
    let build_dir = layout.build_dir(&job.name);

    create_dir(&layout.log_dir).await?;
    create_dir(&build_dir).await?;
    let log = tokio::fs::File::create(&log_path)
        .await
        .map_err(|source| RunnerError::Prepare {
            path: log_path.clone(),
            source,
        })?;

    let start_args = match start_args_for(job, runner, base_dir, &build_dir, &log_path) {
        Ok(start_args) => start_args,
        Err(reason) => return missing_definition(job, log, log_path, reason, started).await,
    };

    tracing::debug!(
        job = %job.name,
        cmd = %start_args.cmd,
        args = ?start_args.args,
        "starting job"
    );

    let mut session = match plugin.start_session(&start_args).await {
        Ok(session) => session,
        Err(e) => {
            let reason = format!("cannot start `{}`: {e:#}", start_args.cmd);
            return missing_definition(job, log, log_path, reason, started).await;
        }
    };

    let ring = RingBytes::new(runner.capture_bytes);
    let (chunk_tx, chunk_rx) = mpsc::channel::<LogChunk>(CHUNK_CHANNEL_CAPACITY);
    let writer = io_pump::spawn_log_writer(
        log,
        log_path.clone(),
        ring.clone(),
        runner.echo_output,
        chunk_rx,
    );
    let out_task = session
        .stdout()
        .map(|rd| io_pump::pump_stdout(rd, chunk_tx.clone()));
    let err_task = session
        .stderr()
        .map(|rd| io_pump::pump_stderr(rd, chunk_tx.clone()));
    drop(chunk_tx);

    let waited = session.wait().await;

    // Output still buffered in the pipes belongs to this job's log, but a
    // daemon forked by the job keeps them open, so draining is bounded.
    let deadline = tokio::time::Instant::now() + Duration::from_millis(runner.drain_grace_ms);
    for task in [out_task, err_task].into_iter().flatten() {
        drain_pump(task, deadline, &job.name).await?;
    }
    let bytes_logged = join_task(writer).await?;

    let (outcome, exit, diagnostic) = match waited {
        Ok(exit) if exit.success() => (Outcome::Success, Some(exit), None),
        Ok(exit) => {
            let reason = match (exit.exit_code, exit.signal) {
                (Some(code), _) => format!("exited with status {code}"),
                (None, Some(sig)) => format!("terminated by signal {sig}"),
                (None, None) => "terminated abnormally".to_string(),
            };
            (Outcome::Failure, Some(exit), Some(reason))
        }
        Err(e) => (Outcome::Failure, None, Some(format!("wait failed: {e:#}"))),
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    match &diagnostic {
        None => tracing::debug!(job = %job.name, duration_ms, "job succeeded"),
        Some(reason) => tracing::warn!(
            job = %job.name,
            duration_ms,
            log = %log_path.display(),
            "job failed: {reason}"
        ),
    }

    Ok(JobRunResult {
        job_name: job.name.clone(),
        outcome,
        exit,
        duration_ms,
        log_path,
        output_tail: ring.to_string_lossy(),
        bytes_logged,
        diagnostic,
    })
}

fn start_args_for(
    job: &Job,
    runner: &RunnerConfig,
    base_dir: &Path,
    build_dir: &Path,
    log_path: &Path,
) -> Result<RunnerStartArgs, String> {
    let (cmd, args) = match &job.unit {
        JobUnit::Script { path } => {
            let path = resolve(base_dir, path);
            if !path.is_file() {
                return Err(format!("build script not found: {}", path.display()));
            }
            (runner.shell.clone(), vec![path.to_string_lossy().into_owned()])
        }
        JobUnit::Command { program, args } => (program.clone(), args.clone()),
    };

    let mut envs: HashMap<String, String> = HashMap::new();
    envs.insert("PIPEWRIGHT_JOB_NAME".into(), job.name.clone());
    envs.insert(
        "PIPEWRIGHT_BUILD_DIR".into(),
        absolutize(build_dir).to_string_lossy().into_owned(),
    );
    envs.insert(
        "PIPEWRIGHT_LOG_FILE".into(),
        absolutize(log_path).to_string_lossy().into_owned(),
    );
    for (k, v) in &job.env {
        envs.insert(k.clone(), v.clone());
    }

    let cwd = match &job.workdir {
        Some(dir) => resolve(base_dir, dir),
        None => base_dir.to_path_buf(),
    };

    Ok(RunnerStartArgs {
        cmd,
        args,
        envs,
        cwd: Some(cwd),
    })
}

async fn missing_definition(
    job: &Job,
    mut log: tokio::fs::File,
    log_path: PathBuf,
    reason: String,
    started: Instant,
) -> Result<JobRunResult, RunnerError> {
    tracing::warn!(job = %job.name, "missing job definition: {reason}");

    let line = format!("pipewright: job '{}' could not be invoked: {reason}\n", job.name);
    let log_err = |source: std::io::Error| RunnerError::LogIo {
        path: log_path.clone(),
        source,
    };
    log.write_all(line.as_bytes()).await.map_err(log_err)?;
    log.flush().await.map_err(log_err)?;

    Ok(JobRunResult {
        job_name: job.name.clone(),
        outcome: Outcome::MissingDefinition,
        exit: None,
        duration_ms: started.elapsed().as_millis() as u64,
        log_path,
        output_tail: String::new(),
        bytes_logged: line.len() as u64,
        diagnostic: Some(reason),
    })
}

async fn create_dir(path: &Path) -> Result<(), RunnerError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| RunnerError::Prepare {
            path: path.to_path_buf(),
            source,
        })
}

async fn join_task(task: JoinHandle<Result<u64, RunnerError>>) -> Result<u64, RunnerError> {
    task.await.map_err(|e| RunnerError::Join(e.to_string()))?
}

async fn drain_pump(
    mut task: JoinHandle<Result<u64, RunnerError>>,
    deadline: tokio::time::Instant,
    job_name: &str,
) -> Result<(), RunnerError> {
    match tokio::time::timeout_at(deadline, &mut task).await {
        Ok(joined) => joined
            .map_err(|e| RunnerError::Join(e.to_string()))?
            .map(|_| ()),
        Err(_) => {
            task.abort();
            tracing::warn!(
                job = %job_name,
                "output still open after the job exited; detaching from it"
            );
            Ok(())
        }
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
