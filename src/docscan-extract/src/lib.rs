//! Document field extraction for Docscan
//!
//! Heuristic extractors that read structured records out of recognized text
//! lines: both sides of a resident identity card, and vehicle plate numbers.

pub mod id_card;
pub mod license_plate;
mod rules;

pub use id_card::{parse as parse_id_card, parse_back, parse_front, CardSide, IdCardRecord};
pub use license_plate::{extract_plates, is_valid_plate, LicensePlateRecord};
pub use rules::{classify, Rule};
