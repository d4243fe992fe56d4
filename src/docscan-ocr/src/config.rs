//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the recognition engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of threads for CPU inference
    pub cpu_thread_num: usize,
    /// Long side the detector resizes images to
    pub det_long_size: u32,
    /// Power mode passed through to the inference runtime
    pub cpu_power: String,
    pub use_opencl: bool,
    /// Asset subdirectory holding models and dictionary
    pub model_dir: String,
    pub det_model: String,
    pub rec_model: String,
    pub cls_model: String,
    pub keys_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cpu_thread_num: 4,
            det_long_size: 960,
            cpu_power: "LITE_POWER_HIGH".to_string(),
            use_opencl: false,
            model_dir: "models".to_string(),
            det_model: "det_db.nb".to_string(),
            rec_model: "rec_crnn.nb".to_string(),
            cls_model: "cls.nb".to_string(),
            keys_file: "ppocr_keys_v1.txt".to_string(),
        }
    }
}

impl EngineConfig {
    /// Config with everything default except threads and detection size
    pub fn with_threads(cpu_thread_num: usize, det_long_size: u32) -> Self {
        Self {
            cpu_thread_num,
            det_long_size,
            ..Self::default()
        }
    }

    /// Files staged into the cache, in staging order
    pub fn asset_names(&self) -> [&str; 4] {
        [
            self.det_model.as_str(),
            self.rec_model.as_str(),
            self.cls_model.as_str(),
            self.keys_file.as_str(),
        ]
    }

    /// Asset path of a file inside the model directory.
    /// Asset paths always use `/` as separator.
    pub fn asset_path(&self, name: &str) -> String {
        format!("{}/{}", self.model_dir, name)
    }

    /// Predictor settings pointing at a staged model directory
    pub fn predictor_config(&self, staged_dir: &Path) -> PredictorConfig {
        PredictorConfig {
            det_model_path: staged_dir.join(&self.det_model),
            rec_model_path: staged_dir.join(&self.rec_model),
            cls_model_path: staged_dir.join(&self.cls_model),
            cpu_thread_num: self.cpu_thread_num,
            cpu_power: self.cpu_power.clone(),
            use_opencl: self.use_opencl,
        }
    }
}

/// What an inference factory needs to build a predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub det_model_path: PathBuf,
    pub rec_model_path: PathBuf,
    pub cls_model_path: PathBuf,
    pub cpu_thread_num: usize,
    pub cpu_power: String,
    pub use_opencl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.cpu_thread_num, 4);
        assert_eq!(config.det_long_size, 960);
        assert!(!config.use_opencl);
        assert_eq!(
            config.asset_names(),
            ["det_db.nb", "rec_crnn.nb", "cls.nb", "ppocr_keys_v1.txt"]
        );
    }

    #[test]
    fn test_asset_path_uses_forward_slash() {
        let config = EngineConfig::default();
        assert_eq!(config.asset_path("cls.nb"), "models/cls.nb");
    }

    #[test]
    fn test_predictor_config_paths() {
        let config = EngineConfig::with_threads(2, 640);
        let predictor = config.predictor_config(Path::new("/cache/models"));
        assert_eq!(predictor.det_model_path, Path::new("/cache/models/det_db.nb"));
        assert_eq!(predictor.cpu_thread_num, 2);
        assert_eq!(predictor.cpu_power, "LITE_POWER_HIGH");
    }
}
