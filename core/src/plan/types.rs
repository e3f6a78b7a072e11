use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Whether a failing job stops the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    #[default]
    Required,
    Optional,
}

impl Criticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Required => "required",
            Criticality::Optional => "optional",
        }
    }
}

/// The opaque build body behind a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUnit {
    /// A recipe script run through the configured shell.
    Script { path: PathBuf },
    /// A program invoked directly.
    Command { program: String, args: Vec<String> },
}

impl JobUnit {
    /// Human-readable form used in logs and plan listings.
    pub fn describe(&self) -> String {
        match self {
            JobUnit::Script { path } => path.display().to_string(),
            JobUnit::Command { program, args } => {
                let mut out = program.clone();
                for arg in args {
                    out.push(' ');
                    out.push_str(arg);
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub unit: JobUnit,
    pub criticality: Criticality,
    pub env: BTreeMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl Job {
    pub fn new(name: impl Into<String>, unit: JobUnit) -> Self {
        Self {
            name: name.into(),
            unit,
            criticality: Criticality::Required,
            env: BTreeMap::new(),
            workdir: None,
        }
    }

    pub fn script(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name, JobUnit::Script { path: path.into() })
    }

    pub fn command<I, S>(name: impl Into<String>, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            JobUnit::Command {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn optional(mut self) -> Self {
        self.criticality = Criticality::Optional;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.criticality == Criticality::Required
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub name: String,
    pub jobs: Vec<Job>,
}

impl Phase {
    pub fn new(name: impl Into<String>, jobs: Vec<Job>) -> Self {
        Self {
            name: name.into(),
            jobs,
        }
    }
}

/// Validated, immutable list of phases.
#[derive(Debug, Clone)]
pub struct PhasePlan {
    phases: Vec<Phase>,
    base_dir: PathBuf,
}

impl PhasePlan {
    /// Build a plan rooted at the current directory.
    pub fn new(phases: Vec<Phase>) -> Result<Self, PlanError> {
        Self::with_base_dir(phases, PathBuf::from("."))
    }

    /// Build a plan whose relative paths resolve against `base_dir`.
    pub fn with_base_dir(phases: Vec<Phase>, base_dir: PathBuf) -> Result<Self, PlanError> {
        let mut seen = HashSet::new();
        for phase in &phases {
            if phase.name.trim().is_empty() {
                return Err(PlanError::EmptyPhaseName);
            }
            for job in &phase.jobs {
                validate_job_name(&job.name)?;
                // The ledger is flat, so names are unique across phases too.
                if !seen.insert(job.name.as_str()) {
                    return Err(PlanError::DuplicateJob(job.name.clone()));
                }
                if let JobUnit::Command { program, .. } = &job.unit {
                    if program.trim().is_empty() {
                        return Err(PlanError::EmptyCommand(job.name.clone()));
                    }
                }
            }
        }

        Ok(Self { phases, base_dir })
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// All jobs in execution order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.phases.iter().flat_map(|p| p.jobs.iter())
    }

    pub fn job_count(&self) -> usize {
        self.phases.iter().map(|p| p.jobs.len()).sum()
    }

    /// Job names grouped by phase, for plan rendering.
    pub fn stages(&self) -> Vec<Vec<String>> {
        self.phases
            .iter()
            .map(|p| p.jobs.iter().map(|j| j.name.clone()).collect())
            .collect()
    }
}

fn validate_job_name(name: &str) -> Result<(), PlanError> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(PlanError::InvalidJobName(name.to_string()));
    }
    Ok(())
}
