use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::InstallerConfig;
use crate::error::CollectError;

use super::category::ArtifactCategory;
use super::collect::Artifact;

/// Quote one word for a POSIX shell.
pub fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:+@%,".contains(c))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

fn shell_array(words: &[String]) -> String {
    words
        .iter()
        .map(|w| shell_quote(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the standalone installer.
///
/// The script globs next to itself at install time, one line per known
/// category, so it keeps working if the output directory is moved. Exit status
/// is non-zero only when a mandatory category is missing or fails to install.
pub fn render_installer(
    categories: &[ArtifactCategory],
    collected: &[Artifact],
    cfg: &InstallerConfig,
) -> String {
    let mut s = String::new();
    s.push_str("#!/usr/bin/env bash\n");
    let _ = writeln!(s, "# Generated by pipewright {}.", env!("CARGO_PKG_VERSION"));
    if collected.is_empty() {
        s.push_str("# No artifacts were collected.\n");
    } else {
        s.push_str("# Collected:\n");
        for a in collected {
            let _ = writeln!(s, "#   {}  ({}, from job {})", a.file_name, a.category, a.source_job);
        }
    }
    s.push_str(
        r#"set -u
shopt -s nullglob

HERE="$(cd "$(dirname "${BASH_SOURCE[0]}")" && pwd)"
"#,
    );
    let _ = writeln!(s, "INSTALL_CMD=({})", shell_array(&cfg.install_command));
    s.push_str(
        r#"status=0

install_category() {
    local name="$1" mandatory="$2"
    shift 2
    if [ "$#" -eq 0 ]; then
        echo "${name}: not found"
        if [ "$mandatory" = "1" ]; then status=1; fi
        return 0
    fi
    if "${INSTALL_CMD[@]}" "$@"; then
        echo "${name}: installed"
    else
        echo "${name}: install failed"
        if [ "$mandatory" = "1" ]; then status=1; fi
    fi
}

"#,
    );

    for c in categories {
        let _ = writeln!(
            s,
            "install_category {} {} \"$HERE\"/{}",
            shell_quote(&c.name),
            u8::from(c.mandatory),
            c.effective_pattern()
        );
    }

    if let Some(verify) = cfg.verify_command.as_ref().filter(|v| !v.is_empty()) {
        let _ = writeln!(s, "\nVERIFY_CMD=({})", shell_array(verify));
        s.push_str(
            r#"if "${VERIFY_CMD[@]}"; then
    echo "verify: ok"
else
    echo "verify: failed"
fi
"#,
        );
    }

    s.push_str("\nexit \"$status\"\n");
    s
}

/// Write `<output_dir>/<script_name>` and make it executable.
pub fn synthesize_installer(
    categories: &[ArtifactCategory],
    collected: &[Artifact],
    cfg: &InstallerConfig,
    output_dir: &Path,
) -> Result<PathBuf, CollectError> {
    std::fs::create_dir_all(output_dir).map_err(|source| CollectError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = output_dir.join(&cfg.script_name);
    let installer_err = |source: std::io::Error| CollectError::Installer {
        path: path.clone(),
        source,
    };
    std::fs::write(&path, render_installer(categories, collected, cfg)).map_err(installer_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .map_err(installer_err)?;
    }

    tracing::info!(path = %path.display(), categories = categories.len(), "installer written");
    Ok(path)
}
