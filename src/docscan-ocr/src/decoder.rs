//! Decoding of the engine's flat output buffer
//!
//! Each record is laid out as
//! `[point_count, word_count, confidence, x0, y0, .., word0, .., cls_idx, cls_confidence]`
//! and records repeat until the buffer is exhausted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DecodeError;

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One detected text area before glyph lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// Corner points in the order emitted by the engine
    pub points: Vec<Point>,
    /// Dictionary indices in reading order
    pub word_indices: Vec<i32>,
    pub confidence: f32,
    pub orientation_class: f32,
    pub orientation_confidence: f32,
}

impl TextRegion {
    /// Axis-aligned bounds as `[min_x, min_y, max_x, max_y]`
    pub fn bounds(&self) -> [i32; 4] {
        if self.points.is_empty() {
            return [0, 0, 0, 0];
        }
        self.points.iter().fold(
            [i32::MAX, i32::MAX, i32::MIN, i32::MIN],
            |[min_x, min_y, max_x, max_y], p| {
                [min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y)]
            },
        )
    }
}

/// Header slots (point count, word count, confidence) plus trailing
/// orientation slots (class, confidence)
const FIXED_SLOTS: usize = 5;

/// Round half up, matching the engine's float → int conversion
fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

fn read_count(buffer: &[f32], offset: usize, field: &'static str) -> Result<usize, DecodeError> {
    let value = buffer[offset];
    let rounded = round_half_up(value);
    if !value.is_finite() || rounded < 0 {
        return Err(DecodeError::InvalidCount {
            offset,
            field,
            value,
        });
    }
    Ok(rounded as usize)
}

/// Decode a whole inference buffer into regions, in detection order.
///
/// An empty buffer decodes to no regions. A record that runs past the end of
/// the buffer fails the whole decode; no partial output is returned.
pub fn decode(buffer: &[f32]) -> Result<Vec<TextRegion>, DecodeError> {
    let mut regions = Vec::new();
    let mut begin = 0;

    while begin < buffer.len() {
        if begin + 3 > buffer.len() {
            return Err(DecodeError::TruncatedRecord {
                offset: begin,
                required: FIXED_SLOTS,
                len: buffer.len() - begin,
            });
        }

        let point_count = read_count(buffer, begin, "point")?;
        let word_count = read_count(buffer, begin + 1, "word")?;
        let required = point_count
            .checked_mul(2)
            .and_then(|n| n.checked_add(word_count))
            .and_then(|n| n.checked_add(FIXED_SLOTS))
            .ok_or(DecodeError::InvalidCount {
                offset: begin,
                field: "record",
                value: buffer[begin],
            })?;

        let end = begin + required;
        if end > buffer.len() {
            return Err(DecodeError::TruncatedRecord {
                offset: begin,
                required,
                len: buffer.len() - begin,
            });
        }

        regions.push(parse_record(&buffer[begin..end], point_count, word_count));
        begin = end;
    }

    debug!("decoded {} text regions from {} values", regions.len(), buffer.len());
    Ok(regions)
}

/// Parse one record whose length has already been checked
fn parse_record(record: &[f32], point_count: usize, word_count: usize) -> TextRegion {
    let confidence = record[2];
    let mut current = 3;

    let points = record[current..current + point_count * 2]
        .chunks_exact(2)
        .map(|xy| Point::new(round_half_up(xy[0]), round_half_up(xy[1])))
        .collect();
    current += point_count * 2;

    let word_indices = record[current..current + word_count]
        .iter()
        .map(|&v| round_half_up(v))
        .collect();
    current += word_count;

    TextRegion {
        points,
        word_indices,
        confidence,
        orientation_class: record[current],
        orientation_confidence: record[current + 1],
    }
}

/// Write regions back into the engine layout.
///
/// Used to build buffers for fake inference engines and replay fixtures.
pub fn encode(regions: &[TextRegion]) -> Vec<f32> {
    let mut buffer = Vec::new();
    for region in regions {
        buffer.push(region.points.len() as f32);
        buffer.push(region.word_indices.len() as f32);
        buffer.push(region.confidence);
        for p in &region.points {
            buffer.push(p.x as f32);
            buffer.push(p.y as f32);
        }
        buffer.extend(region.word_indices.iter().map(|&i| i as f32));
        buffer.push(region.orientation_class);
        buffer.push(region.orientation_confidence);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(points: &[(i32, i32)], words: &[i32], confidence: f32, cls: f32) -> TextRegion {
        TextRegion {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            word_indices: words.to_vec(),
            confidence,
            orientation_class: cls,
            orientation_confidence: 0.99,
        }
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(decode(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn test_single_record() {
        let buffer = [
            4.0, 2.0, 0.93, // header
            10.0, 20.0, 110.0, 20.0, 110.0, 60.0, 10.0, 60.0, // points
            5.0, 7.0, // words
            0.0, 0.98, // orientation
        ];
        let regions = decode(&buffer).unwrap();
        assert_eq!(regions.len(), 1);
        let r = &regions[0];
        assert_eq!(r.points.len(), 4);
        assert_eq!(r.points[2], Point::new(110, 60));
        assert_eq!(r.word_indices, vec![5, 7]);
        assert_eq!(r.confidence, 0.93);
        assert_eq!(r.orientation_class, 0.0);
        assert_eq!(r.orientation_confidence, 0.98);
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let regions = vec![
            region(&[(0, 0), (5, 0), (5, 5), (0, 5)], &[1, 2, 3], 0.5, 0.0),
            region(&[(7, 8), (9, 10)], &[], 0.25, 1.0),
            region(&[], &[4], 0.75, 0.0),
        ];
        assert_eq!(decode(&encode(&regions)).unwrap(), regions);
    }

    #[test]
    fn test_counts_are_rounded() {
        let buffer = [0.4, 1.4, 0.8, 3.0, 0.0, 0.5];
        let regions = decode(&buffer).unwrap();
        assert_eq!(regions[0].points.len(), 0);
        assert_eq!(regions[0].word_indices, vec![3]);
    }

    #[test]
    fn test_truncated_mid_record() {
        let mut buffer = encode(&[region(&[(1, 1), (2, 2), (3, 3), (4, 4)], &[1, 2], 0.9, 0.0)]);
        buffer.pop();
        let err = decode(&buffer).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedRecord {
                offset: 0,
                required: 15,
                len: 14,
            }
        );
    }

    #[test]
    fn test_truncated_second_record_fails_whole_decode() {
        let mut buffer = encode(&[region(&[(1, 1)], &[1], 0.9, 0.0)]);
        buffer.extend_from_slice(&[4.0, 1.0]);
        assert!(matches!(
            decode(&buffer),
            Err(DecodeError::TruncatedRecord { offset: 8, .. })
        ));
    }

    #[test]
    fn test_negative_count_rejected() {
        let buffer = [-3.0, 0.0, 0.5, 0.0, 0.0];
        assert!(matches!(
            decode(&buffer),
            Err(DecodeError::InvalidCount { field: "point", .. })
        ));
    }

    #[test]
    fn test_nan_count_rejected() {
        let buffer = [0.0, f32::NAN, 0.5, 0.0, 0.0];
        assert!(matches!(
            decode(&buffer),
            Err(DecodeError::InvalidCount { field: "word", .. })
        ));
    }

    #[test]
    fn test_bounds() {
        let r = region(&[(10, 40), (90, 20), (80, 70), (5, 60)], &[], 1.0, 0.0);
        assert_eq!(r.bounds(), [5, 20, 90, 70]);
        assert_eq!(region(&[], &[], 1.0, 0.0).bounds(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(1.49), 1);
    }
}
