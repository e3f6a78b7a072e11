use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use pipewright_core::api::{
    AppConfig, AppContext, ExitReport, PathsConfig, RunnerPlugin, RunnerSession, RunnerStartArgs,
};
use tokio::io::AsyncRead;

/// What a fake job does when invoked.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Exit 0 after dropping these files into `$PIPEWRIGHT_BUILD_DIR`.
    Produce(Vec<&'static str>),
    Exit(i32),
}

/// In-memory runner keyed by job name. Jobs it does not know cannot be
/// spawned.
#[derive(Default)]
pub struct FakeRunner {
    behaviours: HashMap<String, Behaviour>,
    invoked: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn with(mut self, job: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(job.to_string(), behaviour);
        self
    }

    pub fn invoked(&self) -> Vec<String> {
        self.invoked.lock().unwrap().clone()
    }
}

struct FakeSession {
    output: Vec<u8>,
    exit: ExitReport,
}

#[async_trait]
impl RunnerSession for FakeSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        Some(Box::new(std::io::Cursor::new(std::mem::take(&mut self.output))))
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        None
    }

    async fn wait(&mut self) -> anyhow::Result<ExitReport> {
        Ok(self.exit)
    }
}

#[async_trait]
impl RunnerPlugin for FakeRunner {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start_session(
        &self,
        args: &RunnerStartArgs,
    ) -> anyhow::Result<Box<dyn RunnerSession>> {
        let job = args.envs["PIPEWRIGHT_JOB_NAME"].clone();
        let build_dir = PathBuf::from(&args.envs["PIPEWRIGHT_BUILD_DIR"]);
        let behaviour = self
            .behaviours
            .get(&job)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{}: not found", args.cmd))?;
        self.invoked.lock().unwrap().push(job.clone());

        let exit = match behaviour {
            Behaviour::Produce(files) => {
                for file in files {
                    std::fs::write(build_dir.join(file), job.as_bytes())?;
                }
                ExitReport::code(0)
            }
            Behaviour::Exit(code) => ExitReport::code(code),
        };
        Ok(Box::new(FakeSession {
            output: format!("fake build of {job}\n").into_bytes(),
            exit,
        }))
    }
}

pub fn context_under(root: &Path, runner: std::sync::Arc<FakeRunner>) -> AppContext {
    let mut cfg = AppConfig::default();
    cfg.paths = PathsConfig {
        log_dir: root.join("logs").to_string_lossy().into_owned(),
        build_root: root.join("build").to_string_lossy().into_owned(),
        output_dir: root.join("dist").to_string_lossy().into_owned(),
    };
    AppContext::new(cfg, runner)
}
