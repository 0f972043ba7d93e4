use mirrordiff_common::Result;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Verdict from the external structural-diff tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalDiffOutcome {
    Match,
    Mismatch(String),
    /// The tool is not installed; the caller falls back to the structural
    /// comparator.
    Unavailable,
}

/// Invoke `<command> <local> <remote>` and classify its exit status.
///
/// Exit 0 means match; any other exit means mismatch, with the tool's
/// output carried as detail. A missing binary is not an error.
pub fn run_external_diff(command: &str, local: &Path, remote: &Path) -> Result<ExternalDiffOutcome> {
    let output = match Command::new(command).arg(local).arg(remote).output() {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("External diff tool '{}' not found", command);
            return Ok(ExternalDiffOutcome::Unavailable);
        }
        Err(e) => return Err(e.into()),
    };

    if output.status.success() {
        return Ok(ExternalDiffOutcome::Match);
    }

    let mut detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        if !detail.is_empty() {
            detail.push('\n');
        }
        detail.push_str(stderr);
    }

    Ok(ExternalDiffOutcome::Mismatch(detail))
}
