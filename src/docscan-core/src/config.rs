//! Configuration file for the replay harness
//!
//! ```toml
//! [engine]
//! cpu_thread_num = 2
//! det_long_size = 640
//!
//! [replay]
//! assets_dir = "assets"
//! document = "plate"
//! ```

use anyhow::{Context, Result};
use clap::ValueEnum;
use docscan_ocr::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to extract from recognized text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// Plain recognized lines
    #[default]
    Text,
    /// Identity card photo side
    IdFront,
    /// Identity card emblem side
    IdBack,
    /// Vehicle plate numbers
    Plate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Directory holding `<model_dir>/` with models and dictionary
    pub assets_dir: Option<PathBuf>,

    /// Where staged assets are written (defaults under the local data dir)
    pub cache_dir: Option<PathBuf>,

    #[serde(default)]
    pub document: DocumentKind,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&content).context("Failed to parse config TOML")
    }

    /// Load from an optional path, falling back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolve cache directory with fallback to default
    pub fn resolve_cache_dir(&self) -> PathBuf {
        self.replay.cache_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Docscan")
                .join("cache")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            det_long_size = 640

            [replay]
            assets_dir = "assets"
            document = "id-back"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.det_long_size, 640);
        assert_eq!(config.engine.cpu_thread_num, 4);
        assert_eq!(config.engine.keys_file, "ppocr_keys_v1.txt");
        assert_eq!(config.replay.assets_dir, Some(PathBuf::from("assets")));
        assert_eq!(config.replay.document, DocumentKind::IdBack);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.replay.document, DocumentKind::Text);
    }

    #[test]
    fn test_cache_dir_override() {
        let mut config = Config::default();
        config.replay.cache_dir = Some(PathBuf::from("/tmp/docscan"));
        assert_eq!(config.resolve_cache_dir(), PathBuf::from("/tmp/docscan"));
        assert!(Config::default().resolve_cache_dir().ends_with("Docscan/cache"));
    }

    #[test]
    fn test_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("docscan.toml");
        std::fs::write(&path, "[replay]\ndocument = \"plate\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.replay.document, DocumentKind::Plate);
        assert!(Config::from_file(tmp.path().join("missing.toml")).is_err());
    }
}
