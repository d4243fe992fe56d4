//! Chinese resident identity card fields
//!
//! Front and back are parsed by separate rule sets. Each line goes to the
//! first rule it matches. Name and the back-side fields keep the last
//! matching line; address lines accumulate in detection order.

use docscan_ocr::RecognizedText;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

use crate::rules::{classify, Rule};

static NAME_TOKENS: LazyLock<Regex> = LazyLock::new(|| Regex::new("姓名|名").unwrap());
static BIRTH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*[0-9]{4}.*年.*[0-9]{1,2}.*月.*[0-9]{1,2}.*日.*$").unwrap());
static BIRTH_MARKERS: LazyLock<Regex> = LazyLock::new(|| Regex::new("[出生]").unwrap());
static ADDRESS_TOKENS: LazyLock<Regex> = LazyLock::new(|| Regex::new("住址|址").unwrap());

static ID_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{17}[0-9Xx]").unwrap());
static DOTTED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*[0-9]{4}\.[0-9]{2}\.[0-9]{2}.*$").unwrap());
static VALIDITY_TOKENS: LazyLock<Regex> = LazyLock::new(|| Regex::new("有效期限|有效期").unwrap());

/// Glyphs that mark a line as part of an address
const REGION_GLYPHS: [char; 9] = ['省', '市', '县', '区', '镇', '村', '街', '路', '号'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSide {
    Front,
    Back,
}

/// Fields read from one side of an identity card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdCardRecord {
    pub side: CardSide,

    // Front
    pub name: Option<String>,
    pub gender: Option<String>,
    pub nation: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<String>,

    // Back
    pub id_number: Option<String>,
    pub valid_period: Option<String>,
    pub authority: Option<String>,

    /// Recognized lines the record was built from
    pub raw_results: Vec<RecognizedText>,
}

impl IdCardRecord {
    fn empty(side: CardSide, raw_results: Vec<RecognizedText>) -> Self {
        Self {
            side,
            name: None,
            gender: None,
            nation: None,
            birth_date: None,
            address: None,
            id_number: None,
            valid_period: None,
            authority: None,
            raw_results,
        }
    }

    pub fn is_front(&self) -> bool {
        self.side == CardSide::Front
    }

    /// Front needs a name, back needs an 18-character ID number
    pub fn is_valid(&self) -> bool {
        match self.side {
            CardSide::Front => self.name.as_deref().is_some_and(|n| !n.is_empty()),
            CardSide::Back => self
                .id_number
                .as_deref()
                .is_some_and(|n| n.chars().count() == 18),
        }
    }
}

impl fmt::Display for IdCardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        match self.side {
            CardSide::Front => write!(
                f,
                "【身份证正面】\n姓名: {}\n性别: {}\n民族: {}\n出生: {}\n住址: {}",
                field(&self.name),
                field(&self.gender),
                field(&self.nation),
                field(&self.birth_date),
                field(&self.address),
            ),
            CardSide::Back => write!(
                f,
                "【身份证反面】\n身份证号: {}\n有效期: {}\n签发机关: {}",
                field(&self.id_number),
                field(&self.valid_period),
                field(&self.authority),
            ),
        }
    }
}

/// Strip ASCII control characters and spaces from both ends. Full-width
/// spaces (U+3000) are kept.
fn trim(text: &str) -> &str {
    text.trim_matches(|c: char| c <= ' ')
}

struct FrontState {
    record: IdCardRecord,
    address: String,
}

static FRONT_RULES: &[Rule<FrontState>] = &[
    Rule {
        field: "name",
        matches: |line| line.contains("姓名") || line.starts_with('名'),
        apply: |s, line| {
            s.record.name = Some(trim(&NAME_TOKENS.replace_all(line, "")).to_string());
        },
    },
    Rule {
        field: "gender",
        matches: |line| line.contains("性别") || line.contains('男') || line.contains('女'),
        apply: |s, line| {
            if line.contains('男') {
                s.record.gender = Some("男".to_string());
            } else if line.contains('女') {
                s.record.gender = Some("女".to_string());
            }
        },
    },
    Rule {
        field: "nation",
        matches: |line| line.contains("民族"),
        apply: |s, line| {
            s.record.nation = Some(trim(&line.replace("民族", "")).to_string());
        },
    },
    Rule {
        field: "birth_date",
        matches: |line| BIRTH_DATE.is_match(line),
        apply: |s, line| {
            s.record.birth_date = Some(trim(&BIRTH_MARKERS.replace_all(line, "")).to_string());
        },
    },
    Rule {
        field: "address",
        matches: |line| line.contains("住址") || line.contains('址'),
        apply: |s, line| {
            let rest = ADDRESS_TOKENS.replace_all(line, "");
            let rest = trim(&rest);
            if !rest.is_empty() {
                s.address.push_str(rest);
            }
        },
    },
    Rule {
        field: "address_continuation",
        matches: |line| line.contains(REGION_GLYPHS),
        apply: |s, line| s.address.push_str(line),
    },
];

static BACK_RULES: &[Rule<IdCardRecord>] = &[
    Rule {
        field: "id_number",
        matches: |line| ID_NUMBER.is_match(line),
        apply: |record, line| {
            record.id_number = ID_NUMBER.find(line).map(|m| m.as_str().to_uppercase());
        },
    },
    Rule {
        field: "valid_period",
        matches: |line| line.contains("有效期") || DOTTED_DATE.is_match(line),
        apply: |record, line| {
            record.valid_period = Some(trim(&VALIDITY_TOKENS.replace_all(line, "")).to_string());
        },
    },
    Rule {
        field: "authority",
        matches: |line| line.contains("签发机关") || line.contains("公安局"),
        apply: |record, line| {
            record.authority = Some(trim(&line.replace("签发机关", "")).to_string());
        },
    },
];

/// Parse the photo side of a card
pub fn parse_front(results: &[RecognizedText]) -> IdCardRecord {
    let mut state = FrontState {
        record: IdCardRecord::empty(CardSide::Front, results.to_vec()),
        address: String::new(),
    };

    classify(results.iter().map(|r| trim(&r.text)), FRONT_RULES, &mut state);

    let FrontState {
        mut record,
        address,
    } = state;
    if !address.is_empty() {
        record.address = Some(address);
    }

    debug!("parsed id card front, valid: {}", record.is_valid());
    record
}

/// Parse the emblem side of a card
pub fn parse_back(results: &[RecognizedText]) -> IdCardRecord {
    let mut record = IdCardRecord::empty(CardSide::Back, results.to_vec());

    let lines: Vec<String> = results
        .iter()
        .map(|r| trim(&r.text).replace(' ', ""))
        .collect();
    classify(lines.iter().map(String::as_str), BACK_RULES, &mut record);

    debug!("parsed id card back, valid: {}", record.is_valid());
    record
}

/// Parse either side
pub fn parse(results: &[RecognizedText], side: CardSide) -> IdCardRecord {
    match side {
        CardSide::Front => parse_front(results),
        CardSide::Back => parse_back(results),
    }
}
