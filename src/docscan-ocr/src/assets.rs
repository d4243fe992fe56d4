//! Staging of model and dictionary assets into a cache directory
//!
//! Files already present with a non-empty size are left alone. There is no
//! integrity check beyond that.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{OcrError, Result};

/// Source of named assets plus a writable cache location
pub trait AssetProvider: Send + Sync {
    /// Open an asset by its `/`-separated path
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Directory that staged files are written under
    fn cache_dir(&self) -> PathBuf;
}

/// Assets read from a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetProvider {
    root: PathBuf,
    cache: PathBuf,
}

impl DirAssetProvider {
    pub fn new(root: impl Into<PathBuf>, cache: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: cache.into(),
        }
    }
}

impl AssetProvider for DirAssetProvider {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let full = path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part));
        Ok(Box::new(File::open(full)?))
    }

    fn cache_dir(&self) -> PathBuf {
        self.cache.clone()
    }
}

fn is_staged(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Copy every asset into `<cache>/<model_dir>`, returning that directory
pub fn stage_assets(provider: &dyn AssetProvider, config: &EngineConfig) -> Result<PathBuf> {
    let cache_path = provider.cache_dir().join(&config.model_dir);
    fs::create_dir_all(&cache_path).map_err(|source| OcrError::AssetStaging {
        name: config.model_dir.clone(),
        source,
    })?;

    let names = config.asset_names();
    let total = names.len();
    for (i, name) in names.iter().enumerate() {
        let dest = cache_path.join(name);
        if is_staged(&dest) {
            debug!("[{}/{}] {} already staged, skipping", i + 1, total, name);
            continue;
        }

        debug!("[{}/{}] copying {} to {:?}", i + 1, total, name, dest);
        let copied = copy_asset(provider, &config.asset_path(name), &dest).map_err(|source| {
            OcrError::AssetStaging {
                name: name.to_string(),
                source,
            }
        })?;
        debug!("copied {} ({} bytes)", name, copied);
    }

    info!("assets staged in {:?}", cache_path);
    Ok(cache_path)
}

/// Copy through a temp file so an interrupted copy never looks staged
fn copy_asset(provider: &dyn AssetProvider, asset_path: &str, dest: &Path) -> io::Result<u64> {
    let mut input = provider.open(asset_path)?;
    let temp_path = dest.with_extension("tmp");

    let written = File::create(&temp_path).and_then(|mut out| {
        let copied = io::copy(&mut input, &mut out)?;
        out.flush()?;
        Ok(copied)
    });

    match written.and_then(|copied| fs::rename(&temp_path, dest).map(|_| copied)) {
        Ok(copied) => Ok(copied),
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                debug!("could not remove {:?}: {}", temp_path, cleanup);
            }
            Err(e)
        }
    }
}

/// Assets that are missing or empty in a staged directory
pub fn missing_assets(staged_dir: &Path, config: &EngineConfig) -> Vec<String> {
    config
        .asset_names()
        .iter()
        .filter(|name| !is_staged(&staged_dir.join(name)))
        .map(|name| name.to_string())
        .collect()
}
