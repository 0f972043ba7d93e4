use mirrordiff_common::{AppConfig, ReportLine};
use mirrordiff_core::container::{write_container, DataNode};
use mirrordiff_core::{CompareEngine, ReportSubscriber, RunStatus};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Helper struct to manage a local/remote tree pair and a report path
struct TestFixture {
    _temp_dir: TempDir,
    local_dir: PathBuf,
    remote_dir: PathBuf,
    report_path: PathBuf,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let local_dir = temp_dir.path().join("local");
        let remote_dir = temp_dir.path().join("remote");
        let report_path = temp_dir.path().join("report.txt");

        fs::create_dir(&local_dir).expect("Failed to create local dir");
        fs::create_dir(&remote_dir).expect("Failed to create remote dir");

        TestFixture {
            _temp_dir: temp_dir,
            local_dir,
            remote_dir,
            report_path,
        }
    }

    fn create_local_file<P: AsRef<Path>>(&self, path: P, content: &[u8]) {
        Self::create_file(&self.local_dir, path, content);
    }

    fn create_remote_file<P: AsRef<Path>>(&self, path: P, content: &[u8]) {
        Self::create_file(&self.remote_dir, path, content);
    }

    fn create_file<P: AsRef<Path>>(base: &Path, path: P, content: &[u8]) {
        let file_path = base.join(path.as_ref());
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    fn create_local_container<P: AsRef<Path>>(&self, path: P, node: &DataNode) {
        write_container(&self.local_dir.join(path.as_ref()), node).unwrap();
    }

    fn create_remote_container<P: AsRef<Path>>(&self, path: P, node: &DataNode) {
        write_container(&self.remote_dir.join(path.as_ref()), node).unwrap();
    }

    fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.worker_count = 2;
        config.use_external_diff = false;
        config.report_path = self.report_path.clone();
        config
    }

    fn engine(&self) -> CompareEngine {
        CompareEngine::new(self.config())
    }

    fn run(&self) -> (RunStatus, String) {
        let mut engine = self.engine();
        let status = engine.run(&self.local_dir, &self.remote_dir).unwrap();
        (status, self.report())
    }

    fn report(&self) -> String {
        fs::read_to_string(&self.report_path).expect("Failed to read report")
    }
}

/// Body of the report without header and final summary, sorted for
/// completion-order independence
fn sorted_body(report: &str) -> Vec<String> {
    let mut body: Vec<String> = report
        .lines()
        .skip(3)
        .filter(|l| !l.is_empty() && !l.starts_with("Comparison finished."))
        .map(|l| l.to_string())
        .collect();
    body.sort();
    body
}

struct Collector {
    lines: Arc<Mutex<Vec<String>>>,
}

impl ReportSubscriber for Collector {
    fn on_line(&mut self, line: &ReportLine) {
        self.lines.lock().unwrap().push(line.text().to_string());
    }
}

#[test]
fn test_identical_trees_all_hash_match() {
    let fixture = TestFixture::new();
    fixture.create_local_file("a.dsc", b"same bytes");
    fixture.create_remote_file("a.dsc", b"same bytes");
    fixture.create_local_file("sub/b.dsc", b"nested");
    fixture.create_remote_file("sub/b.dsc", b"nested");

    let (status, report) = fixture.run();
    assert_eq!(status, RunStatus::Completed);
    assert!(report.contains("[OK] a.dsc (hash match)"));
    assert!(report.contains("[OK] sub/b.dsc (hash match)"));
    assert!(report.contains("Comparison finished. Full report saved to:"));
}

#[test]
fn test_missing_files_reported_without_dispatch() {
    // Equal counts so precheck passes, but the sets differ.
    let fixture = TestFixture::new();
    fixture.create_local_file("common.dsc", b"x");
    fixture.create_remote_file("common.dsc", b"x");
    fixture.create_local_file("b.dsc", b"y");
    fixture.create_remote_file("c.dsc", b"y");

    let (status, report) = fixture.run();
    assert_eq!(status, RunStatus::Completed);
    assert!(report.contains("[MISSING on Remote] b.dsc"));
    assert!(report.contains("[MISSING on LOCAL] c.dsc"));
    assert!(report.contains("[OK] common.dsc (hash match)"));
}

#[test]
fn test_size_mismatch_classified_cheaply() {
    let fixture = TestFixture::new();
    fixture.create_local_file("b.dsc", &vec![0u8; 100]);
    fixture.create_remote_file("b.dsc", &vec![0u8; 200]);

    let (status, report) = fixture.run();
    assert_eq!(status, RunStatus::Completed);
    assert!(report.contains("[DIFFERENT SIZE] b.dsc"));
}

#[test]
fn test_precheck_count_mismatch_short_circuits() {
    let fixture = TestFixture::new();
    fixture.create_local_file("a.dsc", b"x");
    fixture.create_local_file("b.dsc", b"x");
    fixture.create_remote_file("a.dsc", b"x");

    let (status, report) = fixture.run();
    assert_eq!(status, RunStatus::PrecheckFailed);
    assert!(report.contains("[ERROR] File count mismatch: Local=2, Remote=1"));

    // Exactly one error line and zero per-file comparisons.
    assert_eq!(report.matches("[ERROR]").count(), 1);
    assert!(!report.contains("[OK]"));
    assert!(!report.contains("[MISSING"));
    assert!(!report.contains("Comparison finished."));
}

#[test]
fn test_precheck_size_mismatch_short_circuits() {
    let fixture = TestFixture::new();
    fixture.create_local_file("a.dsc", &vec![0u8; 4096]);
    fixture.create_remote_file("a.dsc", &vec![0u8; 16]);

    let mut config = fixture.config();
    config.size_tolerance_bytes = 1024;
    let mut engine = CompareEngine::new(config);
    let status = engine.run(&fixture.local_dir, &fixture.remote_dir).unwrap();

    assert_eq!(status, RunStatus::PrecheckFailed);
    let report = fixture.report();
    assert!(report.contains("[ERROR] Total size mismatch:"));
    assert!(!report.contains("[DIFFERENT SIZE]"));
}

#[test]
fn test_structural_match_within_tolerance() {
    let fixture = TestFixture::new();
    let local = DataNode::group(vec![("signal", DataNode::dataset(vec![1.0, 2.0]))]);
    let remote = DataNode::group(vec![("signal", DataNode::dataset(vec![1.0 + 5e-7, 2.0]))]);
    fixture.create_local_container("run.dsc", &local);
    fixture.create_remote_container("run.dsc", &remote);

    let (status, report) = fixture.run();
    assert_eq!(status, RunStatus::Completed);
    assert!(report.contains("[OK] run.dsc (deep match via structural compare)"));
}

#[test]
fn test_structural_mismatch_reports_detail() {
    let fixture = TestFixture::new();
    let local = DataNode::group(vec![("signal", DataNode::dataset(vec![1.0]))]);
    let remote = DataNode::group(vec![("signal", DataNode::dataset(vec![5.0]))]);
    fixture.create_local_container("run.dsc", &local);
    fixture.create_remote_container("run.dsc", &remote);

    let (status, report) = fixture.run();
    assert_eq!(status, RunStatus::Completed);
    assert!(report.contains("[DIFFERENT] run.dsc"));
    assert!(report.contains("dataset differs: /signal"));
}

#[test]
fn test_per_file_error_does_not_stop_the_run() {
    let fixture = TestFixture::new();
    // Same size, different bytes, not valid containers.
    fixture.create_local_file("bad.dsc", b"garbage-1");
    fixture.create_remote_file("bad.dsc", b"garbage-2");
    fixture.create_local_file("good.dsc", b"same");
    fixture.create_remote_file("good.dsc", b"same");

    let (status, report) = fixture.run();
    assert_eq!(status, RunStatus::Completed);
    assert!(report.contains("[ERROR] bad.dsc:"));
    assert!(report.contains("[OK] good.dsc (hash match)"));
    assert!(report.contains("Comparison finished."));
}

#[test]
fn test_abort_before_run_reaches_aborted() {
    let fixture = TestFixture::new();
    fixture.create_local_file("a.dsc", b"x");
    fixture.create_remote_file("a.dsc", b"x");

    let mut engine = fixture.engine();
    engine.abort_token().request_abort();
    let status = engine.run(&fixture.local_dir, &fixture.remote_dir).unwrap();

    assert_eq!(status, RunStatus::Aborted);
    let report = fixture.report();
    assert!(report.contains("[ABORTED] Comparison stopped by user"));
    assert!(!report.contains("[OK]"));
    assert!(!report.contains("Comparison finished."));
}

#[test]
fn test_rerun_yields_identical_classification() {
    let fixture = TestFixture::new();
    fixture.create_local_file("same.dsc", b"same");
    fixture.create_remote_file("same.dsc", b"same");
    fixture.create_local_file("differs.dsc", &vec![1u8; 10]);
    fixture.create_remote_file("differs.dsc", &vec![2u8; 20]);
    fixture.create_local_file("gone.dsc", b"z");
    fixture.create_remote_file("extra.dsc", b"z");

    let (first_status, first_report) = fixture.run();
    let (second_status, second_report) = fixture.run();

    assert_eq!(first_status, RunStatus::Completed);
    assert_eq!(second_status, RunStatus::Completed);
    assert_eq!(sorted_body(&first_report), sorted_body(&second_report));
}

#[test]
fn test_subscriber_and_progress_observe_the_run() {
    let fixture = TestFixture::new();
    for i in 0..4 {
        fixture.create_local_file(format!("f{}.dsc", i), b"same");
        fixture.create_remote_file(format!("f{}.dsc", i), b"same");
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut engine = fixture.engine();
    engine.add_subscriber(Box::new(Collector { lines: seen.clone() }));
    let progress = engine.progress();

    let status = engine.run(&fixture.local_dir, &fixture.remote_dir).unwrap();
    assert_eq!(status, RunStatus::Completed);

    assert_eq!(progress.snapshot(), (4, 4));

    let seen = seen.lock().unwrap();
    let ok_lines = seen.iter().filter(|l| l.starts_with("[OK]")).count();
    assert_eq!(ok_lines, 4);
    assert!(seen.last().unwrap().starts_with("Comparison finished."));
}
