use thiserror::Error;

/// Malformed inference output
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("record at offset {offset} needs {required} values but buffer holds {len}")]
    TruncatedRecord {
        offset: usize,
        required: usize,
        len: usize,
    },

    #[error("invalid {field} count {value} at offset {offset}")]
    InvalidCount {
        offset: usize,
        field: &'static str,
        value: f32,
    },
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("failed to initialize OCR engine: {0}")]
    EngineInitFailed(String),

    #[error("failed to stage asset '{name}': {source}")]
    AssetStaging {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load dictionary: {0}")]
    Dictionary(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("recognition worker is not running")]
    WorkerUnavailable,

    #[error("unexpected fault: {0}")]
    Fault(String),
}

impl OcrError {
    /// Code delivered to async error callbacks
    pub fn code(&self) -> i32 {
        match self {
            OcrError::Decode(_) => -2,
            OcrError::Inference(_) => -3,
            OcrError::WorkerUnavailable => -4,
            _ => -1,
        }
    }
}

pub type Result<T> = std::result::Result<T, OcrError>;
