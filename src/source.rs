//! Locating the registration source file.
//!
//! The source normally sits in a decompiled tree under the working root. When
//! it is missing and a decompile command is configured, the command is run
//! once and the tree is searched again.

use crate::config::SourceConfig;
use glob::glob;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no registration source matches '{pattern}' under {root}")]
    NotFound { root: PathBuf, pattern: String },
    #[error("invalid source pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("decompile command needs {{jar}} but no client archive was located")]
    MissingArchive,
    #[error("failed to start decompile command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("decompile command '{program}' exited with {status}")]
    Decompile { program: String, status: std::process::ExitStatus },
}

/// First file matching `root/pattern`, in lexicographic order.
pub fn find_source(root: &Path, pattern: &str) -> Result<Option<PathBuf>, SourceError> {
    let full = root.join(pattern);
    let full = full.to_string_lossy();
    let paths = glob(&full)
        .map_err(|source| SourceError::Pattern { pattern: pattern.to_string(), source })?;

    let mut matches: Vec<PathBuf> = paths.filter_map(Result::ok).filter(|p| p.is_file()).collect();
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Substitute `{jar}` and `{out}` in each argument of a command line.
pub fn expand_command(
    command: &[String],
    jar: Option<&Path>,
    out: &Path,
) -> Result<Vec<String>, SourceError> {
    command
        .iter()
        .map(|arg| {
            let mut arg = arg.replace("{out}", &out.to_string_lossy());
            if arg.contains("{jar}") {
                let jar = jar.ok_or(SourceError::MissingArchive)?;
                arg = arg.replace("{jar}", &jar.to_string_lossy());
            }
            Ok(arg)
        })
        .collect()
}

/// Run the decompile command with `root` as working directory.
pub fn run_decompiler(command: &[String], jar: Option<&Path>, root: &Path) -> Result<(), SourceError> {
    let args = expand_command(command, jar, root)?;
    let Some((program, rest)) = args.split_first() else {
        return Ok(());
    };

    info!("Running decompiler: {}", args.join(" "));
    let status = Command::new(program)
        .args(rest)
        .current_dir(root)
        .status()
        .map_err(|source| SourceError::Spawn { program: program.clone(), source })?;

    if status.success() {
        Ok(())
    } else {
        Err(SourceError::Decompile { program: program.clone(), status })
    }
}

/// Find the registration source, decompiling first if configured and needed.
pub fn locate_source(root: &Path, config: &SourceConfig, jar: Option<&Path>) -> Result<PathBuf, SourceError> {
    if let Some(path) = find_source(root, &config.pattern)? {
        debug!("Registration source: {}", path.display());
        return Ok(path);
    }

    if !config.decompile.is_empty() {
        run_decompiler(&config.decompile, jar, root)?;
        if let Some(path) = find_source(root, &config.pattern)? {
            return Ok(path);
        }
    }

    Err(SourceError::NotFound { root: root.to_path_buf(), pattern: config.pattern.clone() })
}
