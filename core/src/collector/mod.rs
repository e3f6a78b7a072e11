//! Artifact collection, installer synthesis and the run report.

mod category;
mod collect;
mod installer;
mod report;

use std::path::{Path, PathBuf};

pub use category::{default_categories, ArtifactCategory};
pub use collect::{
    missing_mandatory, search_roots, search_roots_for_plan, Artifact, ArtifactCollector,
    SearchRoot,
};
pub use installer::{render_installer, shell_quote, synthesize_installer};
pub use report::{ReportEntry, RunReport};

use crate::config::AppConfig;
use crate::error::CollectError;

/// Everything one collection pass produced.
#[derive(Debug, Clone)]
pub struct Collection {
    pub artifacts: Vec<Artifact>,
    pub missing_mandatory: Vec<String>,
    pub installer: PathBuf,
}

/// Copy artifacts from `roots` into `output_dir` and write the installer next
/// to them. Any I/O failure here is fatal to the caller.
pub fn collect_and_install(
    cfg: &AppConfig,
    roots: &[SearchRoot],
    output_dir: &Path,
) -> Result<Collection, CollectError> {
    let categories = &cfg.collector.categories;
    for category in categories {
        category.validate()?;
    }

    let artifacts = ArtifactCollector::new(categories, output_dir).collect(roots)?;
    let missing = missing_mandatory(categories, &artifacts);
    for name in &missing {
        tracing::warn!(category = %name, "mandatory artifact not produced");
    }
    let installer = synthesize_installer(categories, &artifacts, &cfg.installer, output_dir)?;

    Ok(Collection {
        artifacts,
        missing_mandatory: missing,
        installer,
    })
}
