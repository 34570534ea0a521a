//! Editor configuration module.
//!
//! Handles loading, validating, and merging `edito.toml`. The user file is
//! merged over the stock defaults key by key, so it only needs the values it
//! wants to change.
//!
//! ## Config File Location
//!
//! `edito.toml` is read from the current directory, or from the path given
//! with `--config`. Without a file the stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [export]
//! quality = 92                     # Starting quality (1-100, 100 = lossless PNG)
//! filename_prefix = "edito-image"  # Export files are <prefix>-<millis>.<ext>
//! output_dir = "."                 # Where `edito export` writes
//!
//! [search]
//! max_iterations = 15              # Encode budget for the binary search (1-100)
//! strategy = "binary"              # "binary" or "linear"
//!
//! [render]
//! sampling = "bilinear"            # "bilinear" or "nearest"
//!
//! [processing]
//! max_threads = 4                  # Rasterizer threads (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{MAX_QUALITY, MIN_QUALITY, Sampling, SearchConfig, SearchStrategy};
use crate::naming::is_valid_prefix;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "edito.toml";

const MAX_SEARCH_ITERATIONS: usize = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `edito.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Starting quality and where exports go.
    pub export: ExportConfig,
    /// Quality search settings.
    pub search: SearchSettings,
    /// Rasterizer settings.
    pub render: RenderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.export.quality) {
            return Err(ConfigError::Validation(
                "export.quality must be 1-100".into(),
            ));
        }
        if !is_valid_prefix(&self.export.filename_prefix) {
            return Err(ConfigError::Validation(format!(
                "export.filename_prefix {:?} is empty or contains path characters",
                self.export.filename_prefix
            )));
        }
        if !(1..=MAX_SEARCH_ITERATIONS).contains(&self.search.max_iterations) {
            return Err(ConfigError::Validation(
                "search.max_iterations must be 1-100".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Search parameters for the imaging layer.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            max_iterations: self.search.max_iterations,
            strategy: self.search.strategy,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Quality percent a freshly loaded image starts at.
    pub quality: u32,
    pub filename_prefix: String,
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            quality: 92,
            filename_prefix: "edito-image".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Quality search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    pub max_iterations: usize,
    pub strategy: SearchStrategy,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let defaults = SearchConfig::default();
        Self {
            max_iterations: defaults.max_iterations,
            strategy: defaults.strategy,
        }
    }
}

/// Rasterizer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub sampling: Sampling,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of rasterizer threads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Stock defaults as a TOML value, the base every user file merges over.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EditorConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Deep-merge two TOML values. Tables merge key by key; anything else in
/// `overlay` replaces the value in `base`.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. A missing file is `None`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge `overlay` over `base`, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EditorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `edito.toml` from `dir`, falling back to the stock defaults.
pub fn load_config(dir: &Path) -> Result<EditorConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Load a config file at an explicit path, falling back to the stock defaults
/// when it does not exist.
pub fn load_config_file(path: &Path) -> Result<EditorConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value(), overlay)
}

/// The documented stock config, as printed by `edito gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# edito configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# edito reads edito.toml from the current directory, or the file passed
# with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Quality a freshly loaded image starts at (1 = smallest, 100 = lossless PNG).
quality = 92

# Exported files are named <prefix>-<milliseconds>.<jpg|png>.
filename_prefix = "edito-image"

# Directory `edito export` writes into.
output_dir = "."

# ---------------------------------------------------------------------------
# Target-size search
# ---------------------------------------------------------------------------
[search]
# Maximum encodes the binary search may spend (1-100).
max_iterations = 15

# "binary" halves the quality range each step and assumes size grows with
# quality. "linear" tries 99, 98, ... and stops at the first fit: slower,
# but exact for images where that assumption does not hold.
strategy = "binary"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# How source pixels are sampled when scaling: "bilinear" or "nearest".
sampling = "bilinear"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum rasterizer threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = EditorConfig::default();
        assert_eq!(config.export.quality, 92);
        assert_eq!(config.export.filename_prefix, "edito-image");
        assert_eq!(config.export.output_dir, PathBuf::from("."));
        assert_eq!(config.search.max_iterations, 15);
        assert_eq!(config.search.strategy, SearchStrategy::Binary);
        assert_eq!(config.render.sampling, Sampling::Bilinear);
        assert_eq!(config.processing.max_threads, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let config: EditorConfig = toml::from_str(
            r#"
            [search]
            strategy = "linear"
            "#,
        )
        .unwrap();
        assert_eq!(config.search.strategy, SearchStrategy::Linear);
        assert_eq!(config.search.max_iterations, 15);
        assert_eq!(config.export.quality, 92);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<EditorConfig, _> = toml::from_str(
            r#"
            [export]
            qualty = 80
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn search_config_mirrors_settings() {
        let mut config = EditorConfig::default();
        config.search.max_iterations = 30;
        config.search.strategy = SearchStrategy::Linear;
        assert_eq!(
            config.search_config(),
            SearchConfig {
                max_iterations: 30,
                strategy: SearchStrategy::Linear,
            }
        );
    }

    // =========================================================================
    // validate
    // =========================================================================

    #[test]
    fn validate_quality_range() {
        for (quality, ok) in [(0, false), (1, true), (100, true), (101, false)] {
            let mut config = EditorConfig::default();
            config.export.quality = quality;
            assert_eq!(config.validate().is_ok(), ok, "quality {quality}");
        }
    }

    #[test]
    fn validate_iteration_range() {
        for (iterations, ok) in [(0, false), (1, true), (100, true), (101, false)] {
            let mut config = EditorConfig::default();
            config.search.max_iterations = iterations;
            assert_eq!(config.validate().is_ok(), ok, "iterations {iterations}");
        }
    }

    #[test]
    fn validate_rejects_path_in_prefix() {
        let mut config = EditorConfig::default();
        config.export.filename_prefix = "out/edit".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("filename_prefix"));
    }

    #[test]
    fn validate_rejects_zero_threads() {
        let mut config = EditorConfig::default();
        config.processing.max_threads = Some(0);
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
            [export]
            quality = 75
            filename_prefix = "holiday"

            [render]
            sampling = "nearest"

            [processing]
            max_threads = 2
            "#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.export.quality, 75);
        assert_eq!(config.export.filename_prefix, "holiday");
        assert_eq!(config.export.output_dir, PathBuf::from("."));
        assert_eq!(config.render.sampling, Sampling::Nearest);
        assert_eq!(config.processing.max_threads, Some(2));
    }

    #[test]
    fn load_config_file_at_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[search]\nmax_iterations = 5\n").unwrap();
        assert_eq!(load_config_file(&path).unwrap().search.max_iterations, 5);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[export\nquality = ").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_out_of_range_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[export]\nquality = 0\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: EditorConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn stock_defaults_value_roundtrips() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    // =========================================================================
    // effective_threads
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_threads: Some(cores + 64),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_threads: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge_preserves_base_keys() {
        let base: toml::Value =
            toml::from_str("[export]\nquality = 92\nfilename_prefix = \"x\"").unwrap();
        let overlay: toml::Value = toml::from_str("[export]\nquality = 50").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["export"]["quality"].as_integer(), Some(50));
        assert_eq!(merged["export"]["filename_prefix"].as_str(), Some("x"));
    }
}
