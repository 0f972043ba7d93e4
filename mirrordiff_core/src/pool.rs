use crate::abort::AbortToken;
use crate::progress::Progress;
use crate::report::SinkHandle;
use crate::strategy::ComparisonStrategy;
use crossbeam::channel::bounded;
use mirrordiff_common::{IndexedFile, PathPair, ReportLine};
use tracing::debug;

struct Task {
    rel: String,
    local: IndexedFile,
    remote: IndexedFile,
}

/// Fixed-size pool of comparison workers fed from a bounded task channel.
///
/// Results reach the sink in completion order, not submission order;
/// nothing waits on a slow comparison ahead of it in the queue.
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Dispatch `Both` pairs across the pool.
    ///
    /// Missing pairs bypass the pool and are written directly to the sink.
    /// Submission stops as soon as the abort token is observed; tasks
    /// already queued surface as per-path aborted outcomes because the
    /// strategy polls the token before doing any work.
    pub fn run(
        &self,
        pairs: Vec<PathPair>,
        strategy: &ComparisonStrategy,
        sink: &SinkHandle,
        abort: &AbortToken,
        progress: &Progress,
    ) {
        let (task_tx, task_rx) = bounded::<Task>(self.workers * 2);

        std::thread::scope(|scope| {
            for _ in 0..self.workers {
                let task_rx = task_rx.clone();
                let sink = sink.clone();
                let abort = abort.clone();
                let progress = progress.clone();
                scope.spawn(move || {
                    for task in task_rx.iter() {
                        let outcome = strategy.compare(
                            &task.rel,
                            &task.local.abs_path,
                            &task.remote.abs_path,
                            &abort,
                        );
                        sink.push(outcome.into_line(&task.rel));
                        progress.incr_completed();
                    }
                });
            }
            drop(task_rx);

            for pair in pairs {
                if abort.is_aborted() {
                    debug!("Abort observed; no further tasks submitted");
                    break;
                }
                match pair {
                    PathPair::LocalOnly { rel } => {
                        sink.push(ReportLine::missing_on_remote(&rel));
                        progress.incr_completed();
                    }
                    PathPair::RemoteOnly { rel } => {
                        sink.push(ReportLine::missing_on_local(&rel));
                        progress.incr_completed();
                    }
                    PathPair::Both { rel, local, remote } => {
                        if task_tx.send(Task { rel, local, remote }).is_err() {
                            break;
                        }
                    }
                }
            }
            drop(task_tx);
        });
    }
}
