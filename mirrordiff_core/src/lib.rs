pub mod abort;
pub mod classify;
pub mod container;
pub mod engine;
pub mod external;
pub mod hashing;
pub mod indexer;
pub mod pool;
pub mod precheck;
pub mod progress;
pub mod report;
pub mod strategy;

pub use abort::AbortToken;
pub use classify::classify_pairs;
pub use engine::{CompareEngine, RunStatus};
pub use indexer::{FileIndex, FileIndexer};
pub use pool::WorkerPool;
pub use progress::Progress;
pub use report::{ReportSink, ReportSubscriber, SinkHandle};
pub use strategy::ComparisonStrategy;
