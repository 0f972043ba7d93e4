use crate::abort::AbortToken;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;
use mirrordiff_common::{AppConfig, IndexedFile, MirrorDiffError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mapping from forward-slash relative path to the file it names.
///
/// Built once per root per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct FileIndex {
    root: PathBuf,
    entries: BTreeMap<String, IndexedFile>,
}

impl FileIndex {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &BTreeMap<String, IndexedFile> {
        &self.entries
    }

    pub fn get(&self, rel: &str) -> Option<&IndexedFile> {
        self.entries.get(rel)
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|entry| entry.size).sum()
    }
}

/// Walks a root and indexes every file carrying the target extension
pub struct FileIndexer {
    config: AppConfig,
    custom_ignore: Option<Gitignore>,
}

impl FileIndexer {
    pub fn new(config: AppConfig) -> Self {
        let custom_ignore = Self::build_custom_ignore(&config);
        Self {
            config,
            custom_ignore,
        }
    }

    fn build_custom_ignore(config: &AppConfig) -> Option<Gitignore> {
        if config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new("");
        for pattern in &config.ignore_patterns {
            if let Err(err) = builder.add_line(None, pattern) {
                debug!("Failed to add ignore pattern '{}': {}", pattern, err);
            }
        }

        match builder.build() {
            Ok(ignore) => Some(ignore),
            Err(e) => {
                debug!("Failed to build custom ignore: {}", e);
                None
            }
        }
    }

    /// Walk `root` and build the index, honoring the abort token between entries
    pub fn index(&self, root: &Path, abort: &AbortToken) -> Result<FileIndex, MirrorDiffError> {
        let mut entries = BTreeMap::new();

        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(false);

        for entry in walker {
            if abort.is_aborted() {
                return Err(MirrorDiffError::Comparison("Indexing cancelled".to_string()));
            }

            let entry = entry.map_err(|e| {
                MirrorDiffError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Walk error: {}", e),
                ))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.has_target_extension(&path) {
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .map_err(|e| MirrorDiffError::Path(e.to_string()))?;

            if self.should_ignore_with_parents(relative) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                MirrorDiffError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Metadata error: {}", e),
                ))
            })?;

            entries.insert(
                normalize_rel_path(relative),
                IndexedFile {
                    abs_path: path.clone(),
                    size: metadata.len(),
                },
            );
        }

        debug!("Indexed {} files under {:?}", entries.len(), root);
        Ok(FileIndex {
            root: root.to_path_buf(),
            entries,
        })
    }

    fn has_target_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.config.target_extension))
            .unwrap_or(false)
    }

    /// Check the path and every parent directory against the ignore patterns
    fn should_ignore_with_parents(&self, path: &Path) -> bool {
        let Some(ref custom_ignore) = self.custom_ignore else {
            return false;
        };

        if custom_ignore.matched(path, false).is_ignore() {
            return true;
        }

        let mut current = path;
        while let Some(parent) = current.parent() {
            if !parent.as_os_str().is_empty() && custom_ignore.matched(parent, true).is_ignore() {
                return true;
            }
            current = parent;
        }
        false
    }
}

/// Render a relative path with forward-slash separators, the join key
/// shared by both indexes
fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
