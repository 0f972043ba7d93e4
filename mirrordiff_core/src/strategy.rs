use crate::abort::AbortToken;
use crate::container::{self, Tolerance};
use crate::external::{self, ExternalDiffOutcome};
use crate::hashing;
use mirrordiff_common::{AppConfig, ComparisonOutcome, HashAlgo, MatchReason, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Per-pair decision pipeline: size check, whole-file hash, optional
/// external diff, structural fallback.
///
/// Size and hash run before the external and structural tiers; the abort
/// token is polled between every tier.
pub struct ComparisonStrategy {
    hash_algo: HashAlgo,
    tolerance: Tolerance,
    use_external_diff: bool,
    external_diff_command: String,
}

impl ComparisonStrategy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            hash_algo: config.hash_algo,
            tolerance: Tolerance {
                rtol: config.rtol,
                atol: config.atol,
            },
            use_external_diff: config.use_external_diff,
            external_diff_command: config.external_diff_command.clone(),
        }
    }

    /// Run the pipeline for one pair present in both trees.
    ///
    /// Never panics and never fails the run: any unexpected error is
    /// captured as an `Error` outcome for this pair alone.
    pub fn compare(
        &self,
        rel: &str,
        local: &Path,
        remote: &Path,
        abort: &AbortToken,
    ) -> ComparisonOutcome {
        match self.compare_inner(local, remote, abort) {
            Ok(outcome) => {
                debug!("{}: {:?}", rel, outcome);
                outcome
            }
            Err(e) => ComparisonOutcome::Error(e.to_string()),
        }
    }

    fn compare_inner(
        &self,
        local: &Path,
        remote: &Path,
        abort: &AbortToken,
    ) -> Result<ComparisonOutcome> {
        if abort.is_aborted() {
            return Ok(ComparisonOutcome::Aborted);
        }

        let size_local = fs::metadata(local)?.len();
        let size_remote = fs::metadata(remote)?.len();
        if size_local != size_remote {
            return Ok(ComparisonOutcome::SizeMismatch);
        }

        if abort.is_aborted() {
            return Ok(ComparisonOutcome::Aborted);
        }
        let hash_local = hashing::hash_file(local, self.hash_algo)?;

        if abort.is_aborted() {
            return Ok(ComparisonOutcome::Aborted);
        }
        let hash_remote = hashing::hash_file(remote, self.hash_algo)?;

        if abort.is_aborted() {
            return Ok(ComparisonOutcome::Aborted);
        }
        if hash_local == hash_remote {
            return Ok(ComparisonOutcome::Match(MatchReason::HashMatch));
        }

        if self.use_external_diff {
            match external::run_external_diff(&self.external_diff_command, local, remote)? {
                ExternalDiffOutcome::Match => {
                    return Ok(ComparisonOutcome::Match(MatchReason::ExternalDiffMatch));
                }
                ExternalDiffOutcome::Mismatch(detail) => {
                    let detail = if detail.is_empty() { None } else { Some(detail) };
                    return Ok(ComparisonOutcome::ContentMismatch(detail));
                }
                ExternalDiffOutcome::Unavailable => {}
            }
            if abort.is_aborted() {
                return Ok(ComparisonOutcome::Aborted);
            }
        }

        let left = container::read_container(local)?;
        if abort.is_aborted() {
            return Ok(ComparisonOutcome::Aborted);
        }
        let right = container::read_container(remote)?;

        match container::compare_containers(&left, &right, self.tolerance) {
            Some(detail) => Ok(ComparisonOutcome::ContentMismatch(Some(detail))),
            None => Ok(ComparisonOutcome::Match(MatchReason::StructuralMatch)),
        }
    }
}
