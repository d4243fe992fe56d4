//! Inference stand-in that plays back a recorded engine buffer

use anyhow::{Context, Result};
use docscan_ocr::{Frame, InferParams, InferenceEngine, InferenceFactory, PredictorConfig};
use std::path::Path;
use tracing::{debug, info};

pub struct ReplayInference {
    buffer: Vec<f32>,
}

impl ReplayInference {
    pub fn new(buffer: Vec<f32>) -> Self {
        Self { buffer }
    }
}

impl InferenceEngine for ReplayInference {
    fn infer(&mut self, frame: &Frame, params: &InferParams) -> docscan_ocr::Result<Vec<f32>> {
        debug!(
            "replaying {} values for {}x{} frame (flags {:?})",
            self.buffer.len(),
            frame.width(),
            frame.height(),
            params.flags()
        );
        Ok(self.buffer.clone())
    }
}

/// Factory handing every predictor the same recorded buffer
pub fn factory(buffer: Vec<f32>) -> impl InferenceFactory {
    move |config: &PredictorConfig| -> docscan_ocr::Result<Box<dyn InferenceEngine>> {
        info!(
            "replay predictor for det={:?} ({} threads)",
            config.det_model_path, config.cpu_thread_num
        );
        Ok(Box::new(ReplayInference::new(buffer.clone())))
    }
}

/// Read a recorded buffer: a JSON array of numbers
pub fn load_buffer(path: &Path) -> Result<Vec<f32>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read buffer file {:?}", path))?;
    serde_json::from_str(&content).context("Buffer file is not a JSON array of numbers")
}
