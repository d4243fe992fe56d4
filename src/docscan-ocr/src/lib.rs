//! Text recognition core for Docscan
//!
//! Turns the flat numeric output of a PaddleOCR-style detection/recognition
//! engine into recognized text lines. The engine itself sits behind the
//! [`InferenceEngine`] trait; this crate handles asset staging, the character
//! dictionary, buffer decoding, and a lifecycle-managed engine with a
//! single background worker.

mod assembler;
mod assets;
mod config;
mod decoder;
mod engine;
mod error;
mod frame;
mod inference;
mod labels;
mod worker;

pub use assembler::{assemble, assemble_all, Orientation, RecognizedText};
pub use assets::{missing_assets, stage_assets, AssetProvider, DirAssetProvider};
pub use config::{EngineConfig, PredictorConfig};
pub use decoder::{decode, encode, Point, TextRegion};
pub use engine::RecognitionEngine;
pub use error::{DecodeError, OcrError, Result};
pub use frame::Frame;
pub use inference::{InferParams, InferenceEngine, InferenceFactory};
pub use labels::{LabelTable, PLACEHOLDER};
pub use worker::RecognizeOptions;

/// Decode a buffer and attach glyphs in one step
pub fn recognize_buffer(buffer: &[f32], labels: &LabelTable) -> Result<Vec<RecognizedText>> {
    let regions = decode(buffer)?;
    Ok(assemble_all(&regions, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_buffer() {
        let labels = LabelTable::parse("A\nB");
        let region = TextRegion {
            points: vec![Point::new(1, 2)],
            word_indices: vec![1, 2],
            confidence: 0.8,
            orientation_class: 0.0,
            orientation_confidence: 1.0,
        };
        let results = recognize_buffer(&encode(&[region]), &labels).unwrap();
        assert_eq!(results[0].text, "AB");
        assert_eq!(&results[0].bbox[..2], &[1.0, 2.0]);
    }

    #[test]
    fn test_recognize_buffer_truncated() {
        let labels = LabelTable::parse("A");
        assert!(matches!(
            recognize_buffer(&[4.0, 1.0, 0.5], &labels),
            Err(OcrError::Decode(_))
        ));
    }
}
