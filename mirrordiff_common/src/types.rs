use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A file found under one root; the relative path that keys it lives in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedFile {
    pub abs_path: PathBuf,
    pub size: u64,
}

/// A relative path joined across the two trees.
///
/// At least one side is always present; `Both` pairs are the only ones
/// dispatched to the worker pool.
#[derive(Debug, Clone)]
pub enum PathPair {
    LocalOnly {
        rel: String,
    },
    RemoteOnly {
        rel: String,
    },
    Both {
        rel: String,
        local: IndexedFile,
        remote: IndexedFile,
    },
}

impl PathPair {
    pub fn rel(&self) -> &str {
        match self {
            PathPair::LocalOnly { rel } => rel,
            PathPair::RemoteOnly { rel } => rel,
            PathPair::Both { rel, .. } => rel,
        }
    }
}

/// Which tier of the strategy declared a pair equal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    HashMatch,
    ExternalDiffMatch,
    StructuralMatch,
}

impl MatchReason {
    fn annotation(&self) -> &'static str {
        match self {
            MatchReason::HashMatch => "hash match",
            MatchReason::ExternalDiffMatch => "deep match via external tool",
            MatchReason::StructuralMatch => "deep match via structural compare",
        }
    }
}

/// Classified result for a pair present in both trees.
///
/// Produced once per task and consumed exactly once by the report sink.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome {
    Match(MatchReason),
    SizeMismatch,
    ContentMismatch(Option<String>),
    Error(String),
    Aborted,
}

impl ComparisonOutcome {
    /// Render the outcome as the report line for `rel`
    pub fn into_line(self, rel: &str) -> ReportLine {
        match self {
            ComparisonOutcome::Match(reason) => ReportLine::ok(rel, reason),
            ComparisonOutcome::SizeMismatch => ReportLine::different_size(rel),
            ComparisonOutcome::ContentMismatch(detail) => {
                ReportLine::different(rel, detail.as_deref())
            }
            ComparisonOutcome::Error(message) => ReportLine::error(rel, &message),
            ComparisonOutcome::Aborted => ReportLine::aborted(rel),
        }
    }
}

/// Aggregate totals computed by the global precheck, read-only afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub local_count: usize,
    pub remote_count: usize,
    pub local_bytes: u64,
    pub remote_bytes: u64,
}

/// Category tag carried by every report line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LineCategory {
    Ok,
    Different,
    DifferentSize,
    MissingOnLocal,
    MissingOnRemote,
    Error,
    Aborted,
    Info,
}

/// One formatted event flowing through the report sink.
///
/// The text is rendered at construction; a line is written atomically and
/// exactly once, even when a mismatch detail spans embedded newlines.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub category: LineCategory,
    text: String,
}

impl ReportLine {
    pub fn ok(rel: &str, reason: MatchReason) -> Self {
        Self {
            category: LineCategory::Ok,
            text: format!("[OK] {} ({})", rel, reason.annotation()),
        }
    }

    pub fn different(rel: &str, detail: Option<&str>) -> Self {
        let text = match detail {
            Some(detail) if !detail.is_empty() => format!("[DIFFERENT] {}\n{}", rel, detail),
            _ => format!("[DIFFERENT] {}", rel),
        };
        Self {
            category: LineCategory::Different,
            text,
        }
    }

    pub fn different_size(rel: &str) -> Self {
        Self {
            category: LineCategory::DifferentSize,
            text: format!("[DIFFERENT SIZE] {}", rel),
        }
    }

    /// The path exists only on the remote side
    pub fn missing_on_local(rel: &str) -> Self {
        Self {
            category: LineCategory::MissingOnLocal,
            text: format!("[MISSING on LOCAL] {}", rel),
        }
    }

    /// The path exists only on the local side
    pub fn missing_on_remote(rel: &str) -> Self {
        Self {
            category: LineCategory::MissingOnRemote,
            text: format!("[MISSING on Remote] {}", rel),
        }
    }

    pub fn error(rel: &str, message: &str) -> Self {
        Self {
            category: LineCategory::Error,
            text: format!("[ERROR] {}: {}", rel, message),
        }
    }

    /// An error about the run as a whole rather than a single path
    pub fn run_error(message: &str) -> Self {
        Self {
            category: LineCategory::Error,
            text: format!("[ERROR] {}", message),
        }
    }

    pub fn aborted(what: &str) -> Self {
        Self {
            category: LineCategory::Aborted,
            text: format!("[ABORTED] {}", what),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            category: LineCategory::Info,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Digest algorithm used by the whole-file hash tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgo {
    #[default]
    Blake3,
    Sha256,
    Md5,
}

impl HashAlgo {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgo::Blake3 => "blake3",
            HashAlgo::Sha256 => "sha256",
            HashAlgo::Md5 => "md5",
        }
    }
}

impl fmt::Display for HashAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(HashAlgo::Blake3),
            "sha256" => Ok(HashAlgo::Sha256),
            "md5" => Ok(HashAlgo::Md5),
            other => Err(format!("unknown hash algorithm: {}", other)),
        }
    }
}

/// Fixed-length digest over a file's full byte content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}
