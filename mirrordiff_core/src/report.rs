use chrono::Local;
use crossbeam::channel::{bounded, Sender};
use mirrordiff_common::{MirrorDiffError, ReportLine, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tracing::warn;

const CHANNEL_CAPACITY: usize = 1024;

enum SinkMessage {
    Line(ReportLine),
    Done,
}

/// Receives every report line as it is committed, after the file write.
///
/// Listeners run on the consumer thread; the file write and the fan-out for
/// a given line form one step, so a subscriber never sees a line that is
/// not already on disk.
pub trait ReportSubscriber: Send {
    fn on_line(&mut self, line: &ReportLine);
}

/// Cloneable producer side of the report queue
#[derive(Clone)]
pub struct SinkHandle {
    tx: Sender<SinkMessage>,
}

impl SinkHandle {
    /// Enqueue a line. The consumer outlives every producer in a run, so a
    /// closed channel only occurs during teardown and the line is dropped.
    pub fn push(&self, line: ReportLine) {
        let _ = self.tx.send(SinkMessage::Line(line));
    }
}

/// Single-writer serialization point for the report.
///
/// All producers push into a bounded channel; exactly one consumer thread
/// appends each line to the report file (flush per line) and forwards it to
/// the subscribers. Consumption ends on a sentinel pushed by `close`.
pub struct ReportSink {
    handle: SinkHandle,
    consumer: Option<JoinHandle<Result<()>>>,
    path: PathBuf,
}

impl ReportSink {
    /// Create the report file, write its header, and start the consumer
    pub fn create(path: &Path, subscribers: Vec<Box<dyn ReportSubscriber>>) -> Result<Self> {
        let mut file = File::create(path)?;
        writeln!(file, "Mirror tree comparison report")?;
        writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "{}", "=".repeat(60))?;

        let (tx, rx) = bounded(CHANNEL_CAPACITY);
        let mut subscribers = subscribers;
        let consumer = std::thread::spawn(move || -> Result<()> {
            // On a write failure keep draining so producers never block on
            // a dead consumer; the error surfaces from close().
            let mut io_failed: Option<MirrorDiffError> = None;
            for msg in rx.iter() {
                match msg {
                    SinkMessage::Line(line) => {
                        if io_failed.is_none() {
                            if let Err(e) = write_line(&mut file, &line) {
                                warn!("Report write failed: {}", e);
                                io_failed = Some(e.into());
                            }
                        }
                        for subscriber in subscribers.iter_mut() {
                            subscriber.on_line(&line);
                        }
                    }
                    SinkMessage::Done => break,
                }
            }
            match io_failed {
                Some(e) => Err(e),
                None => Ok(()),
            }
        });

        Ok(Self {
            handle: SinkHandle { tx },
            consumer: Some(consumer),
            path: path.to_path_buf(),
        })
    }

    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Push the sentinel and wait for the consumer to drain the queue
    pub fn close(mut self) -> Result<()> {
        let _ = self.handle.tx.send(SinkMessage::Done);
        match self.consumer.take() {
            Some(consumer) => consumer
                .join()
                .unwrap_or_else(|_| {
                    Err(MirrorDiffError::Comparison(
                        "Report consumer panicked".to_string(),
                    ))
                }),
            None => Ok(()),
        }
    }
}

fn write_line(file: &mut File, line: &ReportLine) -> std::io::Result<()> {
    writeln!(file, "{}", line)?;
    file.flush()
}
