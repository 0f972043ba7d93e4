use crate::indexer::FileIndex;
use mirrordiff_common::{ReportLine, RunSummary};
use tracing::info;

/// Cheap global invariant check run before any per-file work.
///
/// Returns the aggregate summary and, on failure, the single error line that
/// terminates the run. Count mismatch is checked first; the byte tolerance
/// applies only to the aggregate totals, not per file.
pub fn precheck(
    local: &FileIndex,
    remote: &FileIndex,
    size_tolerance_bytes: u64,
) -> (RunSummary, Option<ReportLine>) {
    let summary = RunSummary {
        local_count: local.file_count(),
        remote_count: remote.file_count(),
        local_bytes: local.total_bytes(),
        remote_bytes: remote.total_bytes(),
    };

    if summary.local_count != summary.remote_count {
        let line = ReportLine::run_error(&format!(
            "File count mismatch: Local={}, Remote={}",
            summary.local_count, summary.remote_count
        ));
        return (summary, Some(line));
    }

    let delta = summary.local_bytes.abs_diff(summary.remote_bytes);
    if delta > size_tolerance_bytes {
        let line = ReportLine::run_error(&format!(
            "Total size mismatch: Local={:.2} MB, Remote={:.2} MB (delta={:.2} MB, tolerance={:.2} MB)",
            summary.local_bytes as f64 / 1e6,
            summary.remote_bytes as f64 / 1e6,
            delta as f64 / 1e6,
            size_tolerance_bytes as f64 / 1e6,
        ));
        return (summary, Some(line));
    }

    info!(
        "Precheck passed: {} files, {} bytes local vs {} bytes remote",
        summary.local_count, summary.local_bytes, summary.remote_bytes
    );
    (summary, None)
}
