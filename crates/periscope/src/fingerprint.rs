//! Screen fingerprinting
//!
//! Produces a stable hex identifier for a screen from noisy OCR output so
//! that "same screen" is a decidable relation. Dynamic content (clock, badge
//! counters, dates, long copy) is filtered out before hashing; scrolled views
//! of the same list stay equivalent through Jaccard similarity over the
//! surviving texts.

use crate::types::{IconBox, TapPoint, WindowSize};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Fraction of window height treated as the status-bar strip. Kept tighter
/// than the visual bar so navigation titles sitting just under it survive.
pub const STATUS_BAR_FRACTION: f64 = 0.08;

/// Texts longer than this are considered dynamic copy and dropped.
pub const MAX_STABLE_TEXT_LEN: usize = 50;

/// Two structural sets with Jaccard similarity at or above this threshold
/// identify the same screen.
pub const EQUIVALENCE_THRESHOLD: f64 = 0.8;

static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").unwrap());
static BARE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}$").unwrap());
static SHORT_MONTH_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\.? \d{1,2}$").unwrap()
});

const DAY_WORDS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "today",
    "yesterday",
    "tomorrow",
];

const MONTH_WORDS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// True if the text is dynamic pixel content that must not influence screen
/// identity: clock readouts, badge counters, dates, or long copy.
fn is_dynamic_text(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_STABLE_TEXT_LEN {
        return true;
    }
    if TIME_RE.is_match(trimmed) || BARE_NUMBER_RE.is_match(trimmed) {
        return true;
    }
    let lower = trimmed.to_lowercase();
    if DAY_WORDS.contains(&lower.as_str()) || MONTH_WORDS.contains(&lower.as_str()) {
        return true;
    }
    SHORT_MONTH_DATE_RE.is_match(trimmed)
}

/// The subset of OCR texts that survives the dynamic-content filter.
///
/// Elements in the status-bar strip are dropped along with times, 1-3 digit
/// badges, day/month words, "Jan 15"-style dates, and texts over 50
/// characters.
pub fn structural_texts(elements: &[TapPoint], window: &WindowSize) -> BTreeSet<String> {
    let status_bar_limit = window.height * STATUS_BAR_FRACTION;
    elements
        .iter()
        .filter(|e| e.tap_y >= status_bar_limit)
        .filter(|e| !is_dynamic_text(&e.text))
        .map(|e| e.text.trim().to_string())
        .collect()
}

/// Compute the hex fingerprint for a screen.
///
/// Surviving texts are sorted lexicographically, a coarse `icons:<count>`
/// token is appended, and the pipe-joined result is hashed with SHA-256.
/// Deterministic for any input, including the empty element set.
pub fn compute(elements: &[TapPoint], icons: &[IconBox], window: &WindowSize) -> String {
    let texts = structural_texts(elements, window);
    compute_from_texts(&texts, icons.len())
}

/// Fingerprint from an already-filtered structural set.
pub fn compute_from_texts(texts: &BTreeSet<String>, icon_count: usize) -> String {
    let mut joined = texts.iter().cloned().collect::<Vec<_>>();
    joined.push(format!("icons:{icon_count}"));
    let mut hasher = Sha256::new();
    hasher.update(joined.join("|").as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Jaccard index over two structural sets, in 0..=1.
///
/// Two empty sets are equivalent (similarity 1).
pub fn similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// True if the two structural sets identify the same screen.
pub fn equivalent(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    similarity(a, b) >= EQUIVALENCE_THRESHOLD
}
