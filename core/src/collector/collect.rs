use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::RunLayout;
use crate::error::CollectError;
use crate::executor::Ledger;
use crate::plan::PhasePlan;

use super::category::ArtifactCategory;

/// A job's private build directory, scanned recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    pub job: String,
    pub dir: PathBuf,
}

/// Build directories of every job that succeeded, in execution order.
pub fn search_roots(ledger: &Ledger, layout: &RunLayout) -> Vec<SearchRoot> {
    ledger
        .succeeded()
        .map(|job| SearchRoot {
            job: job.to_string(),
            dir: layout.build_dir(job),
        })
        .collect()
}

/// Build directories of every declared job, for collecting without a ledger.
pub fn search_roots_for_plan(plan: &PhasePlan, layout: &RunLayout) -> Vec<SearchRoot> {
    plan.jobs()
        .map(|job| SearchRoot {
            job: job.name.clone(),
            dir: layout.build_dir(&job.name),
        })
        .collect()
}

/// A package file relocated into the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub category: String,
    pub file_name: String,
    pub version: Option<String>,
    pub source_job: String,
    /// Where it was found, left untouched.
    pub origin: PathBuf,
    /// Where it was copied to.
    pub path: PathBuf,
}

pub struct ArtifactCollector<'a> {
    categories: &'a [ArtifactCategory],
    output_dir: PathBuf,
}

impl<'a> ArtifactCollector<'a> {
    pub fn new(categories: &'a [ArtifactCategory], output_dir: impl Into<PathBuf>) -> Self {
        Self {
            categories,
            output_dir: output_dir.into(),
        }
    }

    /// Copy every artifact found under `roots` into the flat output directory.
    ///
    /// Originals are never moved or deleted. Re-running copies again; on a
    /// file-name collision the later root wins.
    pub fn collect(&self, roots: &[SearchRoot]) -> Result<Vec<Artifact>, CollectError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| CollectError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut artifacts: Vec<Artifact> = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for root in roots {
            if !root.dir.is_dir() {
                tracing::debug!(job = %root.job, dir = %root.dir.display(), "no build directory");
                continue;
            }

            for category in self.categories {
                for origin in self.scan(&root.dir, category)? {
                    if !seen.insert(origin.clone()) {
                        continue;
                    }
                    let artifact = self.relocate(root, category, origin)?;
                    // Same file name from an earlier root: the copy was just
                    // overwritten, so the listing follows.
                    artifacts.retain(|a| a.file_name != artifact.file_name);
                    artifacts.push(artifact);
                }
            }
        }

        tracing::info!(
            count = artifacts.len(),
            output_dir = %self.output_dir.display(),
            "artifacts collected"
        );
        Ok(artifacts)
    }

    fn scan(&self, dir: &Path, category: &ArtifactCategory) -> Result<Vec<PathBuf>, CollectError> {
        let pattern = format!(
            "{}/**/{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            category.effective_pattern()
        );
        let entries = glob::glob(&pattern).map_err(|source| CollectError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        let mut found = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CollectError::Scan {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            if path.is_file() && !path.starts_with(&self.output_dir) {
                found.push(path);
            }
        }
        Ok(found)
    }

    fn relocate(
        &self,
        root: &SearchRoot,
        category: &ArtifactCategory,
        origin: PathBuf,
    ) -> Result<Artifact, CollectError> {
        let file_name = origin
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = self.output_dir.join(&file_name);

        std::fs::copy(&origin, &path).map_err(|source| CollectError::Copy {
            from: origin.clone(),
            to: path.clone(),
            source,
        })?;
        tracing::debug!(category = %category.name, file = %file_name, job = %root.job, "copied artifact");

        Ok(Artifact {
            category: category.name.clone(),
            version: category.version_of(&file_name),
            file_name,
            source_job: root.job.clone(),
            origin,
            path,
        })
    }
}

/// Mandatory categories with no collected artifact.
pub fn missing_mandatory(categories: &[ArtifactCategory], artifacts: &[Artifact]) -> Vec<String> {
    categories
        .iter()
        .filter(|c| c.mandatory && !artifacts.iter().any(|a| a.category == c.name))
        .map(|c| c.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::default_categories;
    use crate::runner::Outcome;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn touch(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn listing(dir: &Path) -> BTreeSet<(String, String)> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                (
                    e.file_name().to_string_lossy().into_owned(),
                    std::fs::read_to_string(e.path()).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn copies_matches_flat_and_keeps_originals() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::under(dir.path());
        let wheel = layout
            .build_dir("torch")
            .join("pytorch/dist/torch-2.5.1+rocm6.2-cp312-cp312-linux_x86_64.whl");
        touch(&wheel, "torch");
        touch(&layout.build_dir("torch").join("pytorch/build/libtorch.so"), "so");
        touch(
            &layout
                .build_dir("vision")
                .join("torchvision-0.20.1-cp312-cp312-linux_x86_64.whl"),
            "vision",
        );

        let categories = default_categories();
        let collector = ArtifactCollector::new(&categories, &layout.output_dir);
        let roots = vec![
            SearchRoot {
                job: "torch".into(),
                dir: layout.build_dir("torch"),
            },
            SearchRoot {
                job: "vision".into(),
                dir: layout.build_dir("vision"),
            },
        ];
        let artifacts = collector.collect(&roots).unwrap();

        let names: Vec<(&str, &str, Option<&str>)> = artifacts
            .iter()
            .map(|a| (a.category.as_str(), a.source_job.as_str(), a.version.as_deref()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("torch", "torch", Some("2.5.1+rocm6.2")),
                ("torchvision", "vision", Some("0.20.1")),
            ]
        );
        assert!(wheel.exists());
        assert_eq!(listing(&layout.output_dir).len(), 2);
        assert!(missing_mandatory(&categories, &artifacts).is_empty());
    }

    #[test]
    fn collecting_twice_gives_the_same_output_set() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::under(dir.path());
        touch(
            &layout.build_dir("torch").join("torch-2.5.1-cp312-cp312-linux_x86_64.whl"),
            "t",
        );
        touch(
            &layout.build_dir("xformers").join("xformers-0.0.28-cp312-cp312-linux_x86_64.whl"),
            "x",
        );

        let mut ledger = Ledger::new();
        ledger.record("torch", Outcome::Success).unwrap();
        ledger.record("xformers", Outcome::Success).unwrap();
        let roots = search_roots(&ledger, &layout);

        let categories = default_categories();
        let collector = ArtifactCollector::new(&categories, &layout.output_dir);
        let first = collector.collect(&roots).unwrap();
        let first_listing = listing(&layout.output_dir);
        let second = collector.collect(&roots).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_listing, listing(&layout.output_dir));
    }

    #[test]
    fn failed_jobs_are_not_searched() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::under(dir.path());
        touch(
            &layout.build_dir("vllm").join("vllm-0.6.3-cp312-cp312-linux_x86_64.whl"),
            "partial",
        );

        let mut ledger = Ledger::new();
        ledger.record("vllm", Outcome::Failure).unwrap();
        assert!(search_roots(&ledger, &layout).is_empty());

        let categories = default_categories();
        let artifacts = ArtifactCollector::new(&categories, &layout.output_dir)
            .collect(&search_roots(&ledger, &layout))
            .unwrap();
        assert!(artifacts.is_empty());
        assert_eq!(missing_mandatory(&categories, &artifacts), vec!["torch"]);
    }

    #[test]
    fn later_root_wins_on_name_collision() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::under(dir.path());
        let name = "triton-3.1.0-cp312-cp312-linux_x86_64.whl";
        touch(&layout.build_dir("a").join(name), "first");
        touch(&layout.build_dir("b").join(name), "second");

        let categories = default_categories();
        let roots = vec![
            SearchRoot {
                job: "a".into(),
                dir: layout.build_dir("a"),
            },
            SearchRoot {
                job: "b".into(),
                dir: layout.build_dir("b"),
            },
        ];
        let artifacts = ArtifactCollector::new(&categories, &layout.output_dir)
            .collect(&roots)
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].source_job, "b");
        assert_eq!(
            std::fs::read_to_string(layout.output_dir.join(name)).unwrap(),
            "second"
        );
    }
}
