use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decoder::TextRegion;
use crate::labels::LabelTable;

/// Text line orientation reported by the classifier stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Upright,
    Rotated180,
}

impl Orientation {
    /// Class 1 means rotated 180°, every other code is treated as upright
    pub fn from_class(class: f32) -> Self {
        if class == 1.0 {
            Orientation::Rotated180
        } else {
            Orientation::Upright
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Orientation::Upright => "0",
            Orientation::Rotated180 => "180",
        }
    }
}

impl TextRegion {
    pub fn orientation(&self) -> Orientation {
        Orientation::from_class(self.orientation_class)
    }
}

/// Recognized text line with its quadrilateral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub text: String,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// `[x1, y1, x2, y2, x3, y3, x4, y4]` in engine order
    #[serde(rename = "box")]
    pub bbox: [f32; 8],
    pub orientation: Orientation,
}

impl RecognizedText {
    /// Build a result directly, mostly useful for feeding extractors
    pub fn new(text: impl Into<String>, confidence: f32, bbox: [f32; 8]) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
            orientation: Orientation::Upright,
        }
    }
}

impl fmt::Display for RecognizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RecognizedText{{text='{}', confidence={}, box={:?}}}",
            self.text, self.confidence, self.bbox
        )
    }
}

/// Turn a decoded region into text using the dictionary.
///
/// Indices with no glyph are skipped. At most four points are copied into
/// the box and missing slots stay zero.
pub fn assemble(region: &TextRegion, labels: &LabelTable) -> RecognizedText {
    let text: String = region
        .word_indices
        .iter()
        .filter_map(|&index| labels.glyph(index))
        .collect();

    let mut bbox = [0.0f32; 8];
    for (i, point) in region.points.iter().take(4).enumerate() {
        bbox[i * 2] = point.x as f32;
        bbox[i * 2 + 1] = point.y as f32;
    }

    RecognizedText {
        text,
        confidence: region.confidence,
        bbox,
        orientation: region.orientation(),
    }
}

pub fn assemble_all(regions: &[TextRegion], labels: &LabelTable) -> Vec<RecognizedText> {
    regions.iter().map(|r| assemble(r, labels)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Point;

    fn region(points: &[(i32, i32)], words: &[i32], cls: f32) -> TextRegion {
        TextRegion {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            word_indices: words.to_vec(),
            confidence: 0.87,
            orientation_class: cls,
            orientation_confidence: 0.9,
        }
    }

    #[test]
    fn test_assemble_text() {
        let labels = LabelTable::parse("A\nB");
        let result = assemble(&region(&[], &[1, 2], 0.0), &labels);
        assert_eq!(result.text, "AB");
        assert_eq!(result.confidence, 0.87);
    }

    #[test]
    fn test_out_of_range_and_placeholder_skipped() {
        let labels = LabelTable::parse("A\nB");
        let result = assemble(&region(&[], &[0, 2, -1, 9, 1, 3], 0.0), &labels);
        assert_eq!(result.text, "BA ");
    }

    #[test]
    fn test_box_zero_filled() {
        let labels = LabelTable::parse("A");
        let result = assemble(&region(&[(1, 2), (3, 4)], &[], 0.0), &labels);
        assert_eq!(result.bbox, [1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_box_ignores_extra_points() {
        let labels = LabelTable::parse("A");
        let points = [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)];
        let result = assemble(&region(&points, &[], 0.0), &labels);
        assert_eq!(result.bbox, [1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn test_orientation_mapping() {
        assert_eq!(Orientation::from_class(1.0), Orientation::Rotated180);
        assert_eq!(Orientation::from_class(0.0), Orientation::Upright);
        assert_eq!(Orientation::from_class(2.0), Orientation::Upright);
        assert_eq!(Orientation::Rotated180.label(), "180");

        let labels = LabelTable::parse("A");
        let result = assemble(&region(&[], &[1], 1.0), &labels);
        assert_eq!(result.orientation, Orientation::Rotated180);
    }

    #[test]
    fn test_assemble_all_keeps_order() {
        let labels = LabelTable::parse("A\nB\nC");
        let regions = vec![region(&[], &[3], 0.0), region(&[], &[1, 2], 0.0)];
        let texts: Vec<String> = assemble_all(&regions, &labels)
            .into_iter()
            .map(|r| r.text)
            .collect();
        assert_eq!(texts, vec!["C", "AB"]);
    }
}
