use serde::{Deserialize, Serialize};

use crate::error::CollectError;

/// A kind of package artifact the collector knows how to find and install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCategory {
    pub name: String,

    /// File-name glob. Empty means `<name>-*-*.whl`.
    #[serde(default)]
    pub pattern: String,

    /// A run without this artifact cannot be installed.
    #[serde(default)]
    pub mandatory: bool,
}

const PATTERN_CHARS: &str = "_.+-*?[]!";

impl ArtifactCategory {
    pub fn new(name: impl Into<String>, mandatory: bool) -> Self {
        Self {
            name: name.into(),
            pattern: String::new(),
            mandatory,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn effective_pattern(&self) -> String {
        if self.pattern.is_empty() {
            format!("{}-*-*.whl", self.name)
        } else {
            self.pattern.clone()
        }
    }

    /// Names and patterns end up both in glob calls and in a generated shell
    /// script, so only a conservative character set is accepted and a
    /// pattern can never leave the directory it is applied to.
    pub fn validate(&self) -> Result<(), CollectError> {
        let invalid = |reason: &str| CollectError::InvalidCategory {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
        {
            return Err(invalid("name may only contain [A-Za-z0-9_.+-]"));
        }

        let pattern = self.effective_pattern();
        if pattern.contains("..") {
            return Err(invalid("pattern must not contain '..'"));
        }
        if !pattern
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PATTERN_CHARS.contains(c))
        {
            return Err(invalid("pattern must be a plain file-name glob"));
        }
        glob::Pattern::new(&pattern).map_err(|source| CollectError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn matches(&self, file_name: &str) -> bool {
        glob::Pattern::new(&self.effective_pattern())
            .map(|p| p.matches(file_name))
            .unwrap_or(false)
    }

    /// `torch-2.5.1+rocm6.2-cp312-cp312-linux_x86_64.whl` -> `2.5.1+rocm6.2`.
    pub fn version_of(&self, file_name: &str) -> Option<String> {
        let rest = file_name.strip_prefix(self.name.as_str())?.strip_prefix('-')?;
        let version = rest.split('-').next()?;
        let version = version.strip_suffix(".whl").unwrap_or(version);
        if version.is_empty() {
            None
        } else {
            Some(version.to_string())
        }
    }
}

/// A ROCm/CUDA Python ML stack: `torch` is required, the rest are extras.
pub fn default_categories() -> Vec<ArtifactCategory> {
    let mut categories = vec![ArtifactCategory::new("torch", true)];
    categories.extend(
        [
            "triton",
            "torchvision",
            "torchaudio",
            "xformers",
            "flash_attn",
            "bitsandbytes",
            "vllm",
        ]
        .into_iter()
        .map(|name| ArtifactCategory::new(name, false)),
    );
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_only_torch_is_mandatory() {
        let categories = default_categories();
        for c in &categories {
            c.validate().unwrap();
        }
        let mandatory: Vec<&str> = categories
            .iter()
            .filter(|c| c.mandatory)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(mandatory, vec!["torch"]);
    }

    #[test]
    fn default_pattern_does_not_bleed_into_longer_names() {
        let torch = ArtifactCategory::new("torch", true);
        assert!(torch.matches("torch-2.5.1+rocm6.2-cp312-cp312-linux_x86_64.whl"));
        assert!(!torch.matches("torchvision-0.20.1-cp312-cp312-linux_x86_64.whl"));
        assert!(!torch.matches("torch-2.5.1.tar.gz"));
    }

    #[test]
    fn version_is_the_second_dash_field() {
        let c = ArtifactCategory::new("flash_attn", false);
        assert_eq!(
            c.version_of("flash_attn-2.6.3-cp312-cp312-linux_x86_64.whl").as_deref(),
            Some("2.6.3")
        );
        assert_eq!(c.version_of("flash_attn.whl"), None);
        assert_eq!(c.version_of("other-1.0-py3-none-any.whl"), None);
    }

    #[test]
    fn rejects_patterns_that_escape_or_inject() {
        for pattern in ["../torch-*.whl", "sub/torch-*.whl", "torch-*.whl; rm -rf /", "$(id)"] {
            let c = ArtifactCategory::new("torch", true).with_pattern(pattern);
            assert!(c.validate().is_err(), "accepted {pattern}");
        }
        assert!(ArtifactCategory::new("", false).validate().is_err());
        assert!(ArtifactCategory::new("to rch", false).validate().is_err());
    }

    #[test]
    fn custom_pattern_is_used_verbatim() {
        let c = ArtifactCategory::new("rocm-libs", false).with_pattern("rocm-libs-*.tar.gz");
        c.validate().unwrap();
        assert!(c.matches("rocm-libs-6.2.tar.gz"));
    }
}
