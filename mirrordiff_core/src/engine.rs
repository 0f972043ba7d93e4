use crate::abort::AbortToken;
use crate::classify::classify_pairs;
use crate::indexer::{FileIndex, FileIndexer};
use crate::pool::WorkerPool;
use crate::precheck::precheck;
use crate::progress::Progress;
use crate::report::{ReportSink, ReportSubscriber};
use crate::strategy::ComparisonStrategy;
use mirrordiff_common::{AppConfig, ReportLine, Result};
use std::path::Path;
use tracing::{debug, info};

/// Terminal state of a run.
///
/// Per-file outcomes never travel this way; callers observe them through
/// the report stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    PrecheckFailed,
    Aborted,
}

/// Orchestrates one comparison run:
/// precheck -> classify -> worker pool -> drain.
pub struct CompareEngine {
    config: AppConfig,
    abort: AbortToken,
    progress: Progress,
    subscribers: Vec<Box<dyn ReportSubscriber>>,
}

impl CompareEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            abort: AbortToken::new(),
            progress: Progress::new(),
            subscribers: Vec::new(),
        }
    }

    /// Token shared with cancel actions and signal handlers
    pub fn abort_token(&self) -> AbortToken {
        self.abort.clone()
    }

    /// Live (completed, total) counters
    pub fn progress(&self) -> Progress {
        self.progress.clone()
    }

    /// Register a listener for every committed report line
    pub fn add_subscriber(&mut self, subscriber: Box<dyn ReportSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Compare the two trees. Side effects flow through the report sink;
    /// the report always ends with a success summary, a precheck failure
    /// or an abort acknowledgment.
    pub fn run(&mut self, local_root: &Path, remote_root: &Path) -> Result<RunStatus> {
        let report_path = self.config.report_path.clone();
        let sink = ReportSink::create(&report_path, std::mem::take(&mut self.subscribers))?;
        let handle = sink.handle();

        debug!("Run state: Prechecking");
        let indexer = FileIndexer::new(self.config.clone());
        let (local, remote) = match self.build_indexes(&indexer, local_root, remote_root) {
            Ok(indexes) => indexes,
            Err(_) if self.abort.is_aborted() => {
                handle.push(ReportLine::aborted("Comparison stopped by user"));
                sink.close()?;
                return Ok(RunStatus::Aborted);
            }
            Err(e) => {
                handle.push(ReportLine::run_error(&e.to_string()));
                sink.close()?;
                return Err(e);
            }
        };

        let (summary, failure) = precheck(&local, &remote, self.config.size_tolerance_bytes);
        if let Some(line) = failure {
            handle.push(line);
            debug!("Run state: Failed");
            sink.close()?;
            return Ok(RunStatus::PrecheckFailed);
        }
        info!(
            "Precheck passed: {} files / {} bytes local, {} files / {} bytes remote",
            summary.local_count, summary.local_bytes, summary.remote_count, summary.remote_bytes
        );

        let pairs = classify_pairs(&local, &remote);
        self.progress.set_total(pairs.len() as u64);

        debug!("Run state: Comparing");
        let strategy = ComparisonStrategy::from_config(&self.config);
        let pool = WorkerPool::new(self.worker_count());
        pool.run(pairs, &strategy, &handle, &self.abort, &self.progress);

        debug!("Run state: Draining");
        let status = if self.abort.is_aborted() {
            handle.push(ReportLine::aborted("Comparison stopped by user"));
            RunStatus::Aborted
        } else {
            handle.push(ReportLine::info(format!(
                "Comparison finished. Full report saved to: {}",
                report_path.display()
            )));
            RunStatus::Completed
        };
        sink.close()?;
        debug!("Run state: {:?}", status);
        Ok(status)
    }

    fn build_indexes(
        &self,
        indexer: &FileIndexer,
        local_root: &Path,
        remote_root: &Path,
    ) -> Result<(FileIndex, FileIndex)> {
        let local = indexer.index(local_root, &self.abort)?;
        let remote = indexer.index(remote_root, &self.abort)?;
        Ok((local, remote))
    }

    fn worker_count(&self) -> usize {
        if self.config.worker_count == 0 {
            num_cpus::get()
        } else {
            self.config.worker_count
        }
    }
}
