use crate::types::ContentType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static DEFINITION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(definition|theorem|lemma|corollary|proposition|axiom)\b\s*[\d.]*\s*[:.(]").unwrap()
});
static EXAMPLE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(example|exercise|problem|worked example)\b\s*[\d.]*\s*[:.(]").unwrap()
});
static MATH_INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[^$\n]+\$").unwrap());
static MATH_ENV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\begin\{(equation|align|math|eqnarray|gather)").unwrap());
static MATH_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9)\]]\s*(=|≤|≥|≠|≈|∈|⊆|→)\s*[A-Za-z0-9(\[-]").unwrap());

const MATH_SYMBOLS: &[char] = &[
    '∑', '∫', '√', '∞', '∂', '∇', 'π', 'Δ', 'λ', 'θ', '±', '×', '÷', '≤', '≥', '≠', '≈', '∈',
    '⊆', '∪', '∩', '→', '⇒', '∀', '∃',
];

/// Classify a chunk's content type.
///
/// Explicit markers win over notation: a worked example full of formulas
/// is still an example. Default is prose.
#[must_use]
pub fn classify_content(text: &str) -> ContentType {
    if DEFINITION_MARKER.is_match(text) {
        return ContentType::Definition;
    }
    if EXAMPLE_MARKER.is_match(text) {
        return ContentType::Example;
    }
    if looks_mathematical(text) {
        return ContentType::Math;
    }
    ContentType::Prose
}

fn looks_mathematical(text: &str) -> bool {
    if MATH_ENV.is_match(text) {
        return true;
    }
    if MATH_INLINE.find_iter(text).count() >= 2 {
        return true;
    }
    let symbol_count = text.chars().filter(|c| MATH_SYMBOLS.contains(c)).count();
    if symbol_count >= 3 {
        return true;
    }
    MATH_EXPR.find_iter(text).count() >= 2
}

/// Estimate difficulty in [0, 1] from content type and surface features.
///
/// A coarse signal for downstream learning-path ranking, not a pedagogical
/// model.
#[must_use]
pub fn estimate_difficulty(text: &str, content_type: ContentType) -> f32 {
    let base = match content_type {
        ContentType::Math => 0.7,
        ContentType::Definition => 0.6,
        ContentType::Example => 0.4,
        ContentType::Prose => 0.3,
    };

    let words: Vec<&str> = text.unicode_words().collect();
    if words.is_empty() {
        return base;
    }

    let sentences = text.split_sentence_bounds().count().max(1);
    let words_per_sentence = words.len() as f32 / sentences as f32;
    // Long sentences push difficulty up, to a point
    let length_adjust = ((words_per_sentence - 15.0) / 100.0).clamp(-0.1, 0.15);

    let symbol_density =
        text.chars().filter(|c| MATH_SYMBOLS.contains(c)).count() as f32 / words.len() as f32;
    let symbol_adjust = (symbol_density * 2.0).min(0.15);

    (base + length_adjust + symbol_adjust).clamp(0.0, 1.0)
}

static DEFINED_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:definition|theorem|lemma|corollary|proposition|axiom)\s*[\d.]*\s*[:.(]\s*([A-Za-z][A-Za-z \-']{2,60}?)(?:[).:,]|\s+(?:is|are|states|of)\b)",
    )
    .unwrap()
});
static TITLE_CASE_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]{2,}(?: [A-Z][a-z]{2,}){1,3})\b").unwrap());

const CONCEPT_STOPWORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "Chapter", "Section", "Figure", "Table", "Example",
    "Exercise", "Definition", "Theorem", "Lemma", "Note", "However", "Therefore",
];

/// Extract candidate concept tags from chunk text.
///
/// Two sources: the term a definition-style marker introduces, and
/// title-case phrases that are not sentence furniture. Capped at five
/// tags; casing is normalized to lowercase.
#[must_use]
pub fn extract_concepts(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut concepts = Vec::new();

    for caps in DEFINED_TERM.captures_iter(text) {
        let term = caps[1].trim().to_lowercase();
        if term.len() >= 3 && seen.insert(term.clone()) {
            concepts.push(term);
        }
    }

    for caps in TITLE_CASE_PHRASE.captures_iter(text) {
        // Strip leading sentence furniture ("The Fourier Transform")
        let mut words: Vec<&str> = caps[1].split_whitespace().collect();
        while words
            .first()
            .is_some_and(|w| CONCEPT_STOPWORDS.contains(w))
        {
            words.remove(0);
        }
        if words.len() < 2 {
            continue;
        }
        let term = words.join(" ").to_lowercase();
        if seen.insert(term.clone()) {
            concepts.push(term);
        }
        if concepts.len() >= 5 {
            break;
        }
    }

    concepts.truncate(5);
    concepts
}
