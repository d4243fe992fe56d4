//! Seam to the external detection/recognition runtime

use crate::config::PredictorConfig;
use crate::error::Result;
use crate::frame::Frame;

/// Per-call switches for the engine stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferParams {
    pub max_detection_size: u32,
    pub run_detect: bool,
    pub run_classify: bool,
    pub run_recognize: bool,
}

impl InferParams {
    /// Stage switches as the `0|1` flags native runtimes expect
    pub fn flags(&self) -> [i32; 3] {
        [
            self.run_detect as i32,
            self.run_classify as i32,
            self.run_recognize as i32,
        ]
    }
}

/// A loaded detector/classifier/recognizer.
///
/// `infer` returns the flat record buffer; an empty buffer means nothing was
/// detected.
pub trait InferenceEngine: Send {
    fn infer(&mut self, frame: &Frame, params: &InferParams) -> Result<Vec<f32>>;

    /// Free native resources. Called once when the engine is released.
    fn release(&mut self) {}
}

/// Builds an inference handle from staged model paths
pub trait InferenceFactory: Send + Sync {
    fn create(&self, config: &PredictorConfig) -> Result<Box<dyn InferenceEngine>>;
}

impl<F> InferenceFactory for F
where
    F: Fn(&PredictorConfig) -> Result<Box<dyn InferenceEngine>> + Send + Sync,
{
    fn create(&self, config: &PredictorConfig) -> Result<Box<dyn InferenceEngine>> {
        self(config)
    }
}
