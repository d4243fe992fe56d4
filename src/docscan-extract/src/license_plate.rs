//! Mainland China vehicle plate numbers

use docscan_ocr::RecognizedText;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Province, region and special-use abbreviations that open a plate
const PROVINCES: &str = "京津沪渝冀豫云辽黑湘皖鲁新苏浙赣鄂桂甘晋蒙陕吉闽贵粤青藏川宁琼使领";

static STANDARD_PLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^[{}][A-Z][A-Z0-9]{{5,6}}$", PROVINCES)).unwrap());

static NEW_ENERGY_PLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^[{}][A-Z][DF][A-Z0-9]{{5}}$", PROVINCES)).unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicensePlateRecord {
    pub plate_number: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: [f32; 8],
}

impl fmt::Display for LicensePlateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "车牌: {} ({:.1}%)", self.plate_number, self.confidence * 100.0)
    }
}

/// Strip spaces and upper-case
fn normalize(text: &str) -> String {
    text.replace(' ', "").to_uppercase()
}

/// Whether an already-normalized string is a standard or new-energy plate
pub fn is_valid_plate(text: &str) -> bool {
    let len = text.chars().count();
    if !(7..=8).contains(&len) {
        return false;
    }
    STANDARD_PLATE.is_match(text) || NEW_ENERGY_PLATE.is_match(text)
}

/// Keep the recognized lines that read as plates, in input order
pub fn extract_plates(results: &[RecognizedText]) -> Vec<LicensePlateRecord> {
    let plates: Vec<LicensePlateRecord> = results
        .iter()
        .filter_map(|r| {
            let text = normalize(&r.text);
            is_valid_plate(&text).then(|| LicensePlateRecord {
                plate_number: text,
                confidence: r.confidence,
                bbox: r.bbox,
            })
        })
        .collect();

    debug!("found {} plates in {} lines", plates.len(), results.len());
    plates
}
