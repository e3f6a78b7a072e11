use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PlanError;

use super::types::{Criticality, Job, JobUnit, Phase, PhasePlan};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanManifest {
    #[serde(default, rename = "phase")]
    phases: Vec<PhaseEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PhaseEntry {
    name: String,
    #[serde(default, rename = "job")]
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JobEntry {
    name: String,
    #[serde(default)]
    script: Option<PathBuf>,
    #[serde(default)]
    command: Option<Vec<String>>,
    #[serde(default)]
    criticality: Criticality,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    workdir: Option<PathBuf>,
}

/// Read and validate a plan manifest from disk.
///
/// Relative `script` and `workdir` paths resolve against the manifest's
/// directory, so a plan can be launched from anywhere.
pub fn load_plan(path: &Path) -> Result<PhasePlan, PlanError> {
    let src = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    parse_plan(&src, &base_dir)
}

pub fn parse_plan(src: &str, base_dir: &Path) -> Result<PhasePlan, PlanError> {
    let manifest: PlanManifest = toml::from_str(src)?;

    let mut phases = Vec::with_capacity(manifest.phases.len());
    for entry in manifest.phases {
        let mut jobs = Vec::with_capacity(entry.jobs.len());
        for job in entry.jobs {
            jobs.push(job_from_entry(job, base_dir)?);
        }
        phases.push(Phase::new(entry.name, jobs));
    }

    PhasePlan::with_base_dir(phases, base_dir.to_path_buf())
}

fn job_from_entry(entry: JobEntry, base_dir: &Path) -> Result<Job, PlanError> {
    let unit = match (entry.script, entry.command) {
        (Some(_), Some(_)) => return Err(PlanError::AmbiguousUnit(entry.name)),
        (None, None) => return Err(PlanError::MissingUnit(entry.name)),
        (Some(path), None) => JobUnit::Script {
            path: resolve(base_dir, path),
        },
        (None, Some(mut argv)) => {
            if argv.is_empty() {
                return Err(PlanError::EmptyCommand(entry.name));
            }
            let program = argv.remove(0);
            JobUnit::Command {
                program,
                args: argv,
            }
        }
    };

    Ok(Job {
        name: entry.name,
        unit,
        criticality: entry.criticality,
        env: entry.env,
        workdir: entry.workdir.map(|d| resolve(base_dir, d)),
    })
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
