use crate::types::{ElementType, NumberingStyle};
use once_cell::sync::Lazy;
use regex::Regex;

/// A single line-level match produced by a pattern family.
///
/// Confidence scoring happens in the detector; families only report how
/// specific their pattern is (an unambiguous "Chapter 3:" beats a bare
/// "3." that could be a list item).
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub element_type: ElementType,
    pub title: String,
    pub number: Option<u32>,
    pub raw_number: String,
    pub numbering_style: NumberingStyle,
    /// Base specificity of the matched pattern in [0, 1]
    pub specificity: f32,
}

/// One numbering-style family of heading patterns.
///
/// Families are isolated and independently testable; the detector merges
/// their votes by confidence. No single family is authoritative.
pub trait PatternFamily: Send + Sync {
    /// Family name for logging
    fn name(&self) -> &'static str;

    /// Numbering style this family recognizes
    fn style(&self) -> NumberingStyle;

    /// Try to match a single trimmed line
    fn match_line(&self, line: &str) -> Option<PatternMatch>;
}

static ARABIC_CHAPTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)chapter\s+(\d{1,3})\s*[:.\-]?\s*(.*)$").unwrap());
static ARABIC_SUBSECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.?\s+(\S.*)$").unwrap());
static ARABIC_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})\.(\d{1,3})\.?\s+(\S.*)$").unwrap());
static ARABIC_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})[.:]\s+(\S.*)$").unwrap());

/// Arabic numbering: "Chapter 3", "3.1 Title", "3.1.2 Title", "3. Title"
#[derive(Debug, Clone, Copy, Default)]
pub struct ArabicFamily;

impl PatternFamily for ArabicFamily {
    fn name(&self) -> &'static str {
        "arabic"
    }

    fn style(&self) -> NumberingStyle {
        NumberingStyle::Arabic
    }

    fn match_line(&self, line: &str) -> Option<PatternMatch> {
        if let Some(caps) = ARABIC_CHAPTER.captures(line) {
            let number = caps[1].parse::<u32>().ok()?;
            return Some(PatternMatch {
                element_type: ElementType::Chapter,
                title: caps[2].trim().to_string(),
                number: Some(number),
                raw_number: caps[1].to_string(),
                numbering_style: NumberingStyle::Arabic,
                specificity: 0.9,
            });
        }
        if let Some(caps) = ARABIC_SUBSECTION.captures(line) {
            let number = caps[1].parse::<u32>().ok()?;
            return Some(PatternMatch {
                element_type: ElementType::Subsection,
                title: caps[4].trim().to_string(),
                number: Some(number),
                raw_number: format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]),
                numbering_style: NumberingStyle::Arabic,
                specificity: 0.75,
            });
        }
        if let Some(caps) = ARABIC_SECTION.captures(line) {
            let number = caps[1].parse::<u32>().ok()?;
            return Some(PatternMatch {
                element_type: ElementType::Section,
                title: caps[3].trim().to_string(),
                number: Some(number),
                raw_number: format!("{}.{}", &caps[1], &caps[2]),
                numbering_style: NumberingStyle::Arabic,
                specificity: 0.8,
            });
        }
        if let Some(caps) = ARABIC_BARE.captures(line) {
            // Could just as well be a numbered list item, hence the low base
            let number = caps[1].parse::<u32>().ok()?;
            return Some(PatternMatch {
                element_type: ElementType::Chapter,
                title: caps[2].trim().to_string(),
                number: Some(number),
                raw_number: caps[1].to_string(),
                numbering_style: NumberingStyle::Arabic,
                specificity: 0.45,
            });
        }
        None
    }
}

static ROMAN_CHAPTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)chapter\s+([ivxlcdm]{1,10})\s*[:.\-]?\s*(.*)$").unwrap());
static ROMAN_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([IVXLCDM]{1,10})[.:]\s+(\S.*)$").unwrap());

/// Roman numbering: "Chapter IV", "XII. Title"
#[derive(Debug, Clone, Copy, Default)]
pub struct RomanFamily;

impl PatternFamily for RomanFamily {
    fn name(&self) -> &'static str {
        "roman"
    }

    fn style(&self) -> NumberingStyle {
        NumberingStyle::Roman
    }

    fn match_line(&self, line: &str) -> Option<PatternMatch> {
        if let Some(caps) = ROMAN_CHAPTER.captures(line) {
            let number = roman_to_u32(&caps[1])?;
            return Some(PatternMatch {
                element_type: ElementType::Chapter,
                title: caps[2].trim().to_string(),
                number: Some(number),
                raw_number: caps[1].to_uppercase(),
                numbering_style: NumberingStyle::Roman,
                specificity: 0.9,
            });
        }
        if let Some(caps) = ROMAN_BARE.captures(line) {
            // "I. Introduction" style; uppercase-only to avoid matching
            // ordinary sentences starting with the pronoun "I."
            let number = roman_to_u32(&caps[1])?;
            return Some(PatternMatch {
                element_type: ElementType::Chapter,
                title: caps[2].trim().to_string(),
                number: Some(number),
                raw_number: caps[1].to_string(),
                numbering_style: NumberingStyle::Roman,
                specificity: 0.55,
            });
        }
        None
    }
}

static LETTERED_APPENDIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)appendix\s+([A-Za-z])\s*[:.\-]?\s*(.*)$").unwrap());
static LETTERED_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z])\.(\d{1,3})\.?\s+(\S.*)$").unwrap());

/// Lettered numbering: "Appendix A", "B.2 Title"
#[derive(Debug, Clone, Copy, Default)]
pub struct LetteredFamily;

impl PatternFamily for LetteredFamily {
    fn name(&self) -> &'static str {
        "lettered"
    }

    fn style(&self) -> NumberingStyle {
        NumberingStyle::Lettered
    }

    fn match_line(&self, line: &str) -> Option<PatternMatch> {
        if let Some(caps) = LETTERED_APPENDIX.captures(line) {
            let letter = caps[1].to_uppercase();
            let number = letter.bytes().next().map(|b| u32::from(b - b'A' + 1));
            return Some(PatternMatch {
                element_type: ElementType::Chapter,
                title: caps[2].trim().to_string(),
                number,
                raw_number: letter,
                numbering_style: NumberingStyle::Lettered,
                specificity: 0.85,
            });
        }
        if let Some(caps) = LETTERED_SECTION.captures(line) {
            let letter = caps[1].to_string();
            let number = letter.bytes().next().map(|b| u32::from(b - b'A' + 1));
            return Some(PatternMatch {
                element_type: ElementType::Section,
                title: caps[3].trim().to_string(),
                number,
                raw_number: format!("{}.{}", letter, &caps[2]),
                numbering_style: NumberingStyle::Lettered,
                specificity: 0.7,
            });
        }
        None
    }
}

static WORD_CHAPTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?i)chapter\s+(one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty)\b\s*[:.\-]?\s*(.*)$",
    )
    .unwrap()
});

/// Word numbering: "Chapter One", "Chapter Twelve: Title"
#[derive(Debug, Clone, Copy, Default)]
pub struct WordFamily;

impl PatternFamily for WordFamily {
    fn name(&self) -> &'static str {
        "word"
    }

    fn style(&self) -> NumberingStyle {
        NumberingStyle::Word
    }

    fn match_line(&self, line: &str) -> Option<PatternMatch> {
        let caps = WORD_CHAPTER.captures(line)?;
        let raw = caps[1].to_string();
        let number = word_to_u32(&raw)?;
        Some(PatternMatch {
            element_type: ElementType::Chapter,
            title: caps[2].trim().to_string(),
            number: Some(number),
            raw_number: raw,
            numbering_style: NumberingStyle::Word,
            specificity: 0.9,
        })
    }
}

/// Default family set, most specific first
#[must_use]
pub fn default_families() -> Vec<Box<dyn PatternFamily>> {
    vec![
        Box::new(ArabicFamily),
        Box::new(RomanFamily),
        Box::new(LetteredFamily),
        Box::new(WordFamily),
    ]
}

/// Parse a roman numeral, case-insensitive. Returns None for malformed
/// sequences (e.g. "IIII" is accepted, "IC" is not validated strictly —
/// headings are noisy, additive parsing is enough).
#[must_use]
pub fn roman_to_u32(raw: &str) -> Option<u32> {
    let mut total: u32 = 0;
    let mut prev: u32 = 0;
    for ch in raw.chars().rev() {
        let value = match ch.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
            prev = value;
        }
    }
    if total == 0 {
        None
    } else {
        Some(total)
    }
}

fn word_to_u32(raw: &str) -> Option<u32> {
    let value = match raw.to_ascii_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        _ => return None,
    };
    Some(value)
}
