use crate::{HashAlgo, MirrorDiffError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "mirrordiff.toml";

/// Engine configuration.
///
/// Roots are run arguments, not configuration; everything here applies to
/// any pair of trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Number of parallel comparison workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Digest algorithm for the whole-file hash tier
    #[serde(default)]
    pub hash_algo: HashAlgo,

    /// Relative tolerance for structural dataset comparison
    #[serde(default = "default_rtol")]
    pub rtol: f64,

    /// Absolute tolerance for structural dataset comparison
    #[serde(default = "default_atol")]
    pub atol: f64,

    /// Allowed aggregate byte delta between the two trees in the precheck
    #[serde(default = "default_size_tolerance_bytes")]
    pub size_tolerance_bytes: u64,

    /// Whether to try the external diff tool before the structural fallback
    #[serde(default = "default_true")]
    pub use_external_diff: bool,

    /// Command invoked as `<command> <local> <remote>`
    #[serde(default = "default_external_diff_command")]
    pub external_diff_command: String,

    /// Where the report file is written
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,

    /// File extension (without dot) selecting files for comparison
    #[serde(default = "default_target_extension")]
    pub target_extension: String,

    /// Ignore patterns (e.g., "*.bak", "scratch/")
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether to follow symbolic links while indexing
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_rtol() -> f64 {
    1e-6
}

fn default_atol() -> f64 {
    1e-12
}

fn default_size_tolerance_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_external_diff_command() -> String {
    "dscdiff".to_string()
}

fn default_report_path() -> PathBuf {
    PathBuf::from("comparison_report.txt")
}

fn default_target_extension() -> String {
    "dsc".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            hash_algo: HashAlgo::default(),
            rtol: default_rtol(),
            atol: default_atol(),
            size_tolerance_bytes: default_size_tolerance_bytes(),
            use_external_diff: default_true(),
            external_diff_command: default_external_diff_command(),
            report_path: default_report_path(),
            target_extension: default_target_extension(),
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            portable_mode: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, MirrorDiffError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    let exists = path.exists();

    let mut config = if exists {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data).map_err(|e| MirrorDiffError::Serialization(e.to_string()))?
    } else {
        AppConfig::default()
    };

    config.portable_mode = portable;

    Ok(LoadedConfig {
        config,
        path,
        exists,
        portable,
    })
}

pub fn ensure_config(prefer_portable: bool) -> Result<LoadedConfig, MirrorDiffError> {
    let loaded = load_config(prefer_portable)?;
    if !loaded.exists {
        save_config(&loaded.path, &loaded.config)?;
    }
    Ok(loaded)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), MirrorDiffError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| MirrorDiffError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), MirrorDiffError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "mirrordiff", "mirrordiff")
        .ok_or_else(|| MirrorDiffError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.hash_algo, HashAlgo::Blake3);
        assert_eq!(config.rtol, 1e-6);
        assert_eq!(config.atol, 1e-12);
        assert_eq!(config.size_tolerance_bytes, 50 * 1024 * 1024);
        assert!(config.use_external_diff);
        assert_eq!(config.external_diff_command, "dscdiff");
        assert_eq!(config.target_extension, "dsc");
        assert!(config.worker_count >= 1);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: AppConfig = toml::from_str(
            r#"
            hash_algo = "sha256"
            worker_count = 3
            use_external_diff = false
            "#,
        )
        .unwrap();
        assert_eq!(config.hash_algo, HashAlgo::Sha256);
        assert_eq!(config.worker_count, 3);
        assert!(!config.use_external_diff);
        assert_eq!(config.rtol, 1e-6);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.worker_count = 2;
        config.ignore_patterns = vec!["*.bak".to_string()];
        save_config(&path, &config).unwrap();

        let data = fs::read_to_string(&path).unwrap();
        let reloaded: AppConfig = toml::from_str(&data).unwrap();
        assert_eq!(reloaded.worker_count, 2);
        assert_eq!(reloaded.ignore_patterns, vec!["*.bak".to_string()]);
    }
}
