//! Element role classification
//!
//! Assigns every OCR element one of the five roles used by the planner.
//! Classification is row-aware: elements are grouped into visual rows first
//! so that a label can inherit context from a disclosure chevron or an
//! on/off indicator sitting beside it.

use crate::budget::ExplorationBudget;
use crate::fingerprint::{MAX_STABLE_TEXT_LEN, STATUS_BAR_FRACTION};
use crate::types::{ClassifiedElement, ElementRole, TapPoint, WindowSize};
use once_cell::sync::Lazy;
use regex::Regex;

/// Elements within this vertical gap belong to the same row.
pub const ROW_GAP_PT: f64 = 15.0;

/// Disclosure chevrons that mark a row as navigating forward.
pub const FORWARD_CHEVRONS: [char; 3] = ['>', '\u{203A}', '\u{276F}'];

/// Back chevrons, used by the traversal to find the back button.
pub const BACK_CHEVRONS: [char; 3] = ['<', '\u{2039}', '\u{276E}'];

static VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+(\.\d+)?\s?(gb|mb|kb|tb|%)$").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").unwrap());

const STATE_WORDS: &[&str] = &["on", "off"];

/// Conjunctions that, combined with a comma, mark sentence-like copy.
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "so", "et", "ou", "mais", "donc"];

const HELP_LINK_PHRASES: &[&str] = &[
    "learn more",
    "see how",
    "find out",
    "tap to learn",
    "en savoir plus",
];

/// Group items into visual rows: sort by Y, accumulate while the gap to the
/// previous item stays within [`ROW_GAP_PT`].
pub fn group_rows<T, F>(mut items: Vec<T>, y_of: F) -> Vec<Vec<T>>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| {
        y_of(a)
            .partial_cmp(&y_of(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut rows: Vec<Vec<T>> = Vec::new();
    let mut last_y: Option<f64> = None;
    for item in items {
        let y = y_of(&item);
        let same_row = matches!(last_y, Some(prev) if (y - prev).abs() <= ROW_GAP_PT);
        if same_row {
            if let Some(row) = rows.last_mut() {
                row.push(item);
            }
        } else {
            rows.push(vec![item]);
        }
        last_y = Some(y);
    }
    rows
}

/// True if the trimmed text is a single disclosure or back chevron.
pub fn is_chevron_text(text: &str) -> bool {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => FORWARD_CHEVRONS.contains(&c) || BACK_CHEVRONS.contains(&c),
        _ => false,
    }
}

fn ends_with_forward_chevron(text: &str) -> bool {
    text.trim()
        .chars()
        .last()
        .map(|c| FORWARD_CHEVRONS.contains(&c))
        .unwrap_or(false)
}

fn is_state_word(text: &str) -> bool {
    STATE_WORDS.contains(&text.trim().to_lowercase().as_str())
}

fn is_pure_punctuation(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| !c.is_alphanumeric())
}

fn is_sentence_like(text: &str) -> bool {
    if !text.contains(',') {
        return false;
    }
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphabetic())
        .any(|word| CONJUNCTIONS.contains(&word))
}

fn is_help_link(text: &str) -> bool {
    let lower = text.to_lowercase();
    HELP_LINK_PHRASES.iter().any(|p| lower.contains(p))
}

/// Row-aware OCR element classifier.
#[derive(Debug, Clone)]
pub struct ElementClassifier {
    /// Trimmed texts shorter than this are decoration
    pub min_text_len: usize,
}

impl Default for ElementClassifier {
    fn default() -> Self {
        Self { min_text_len: 2 }
    }
}

impl ElementClassifier {
    pub fn new(min_text_len: usize) -> Self {
        Self { min_text_len }
    }

    /// Classify every element, applying the priority rules per element with
    /// its row context precomputed. Output is ordered by row, then by X
    /// within the row; applying the classifier twice to the same input is
    /// identical.
    pub fn classify(
        &self,
        elements: &[TapPoint],
        window: &WindowSize,
        budget: &ExplorationBudget,
    ) -> Vec<ClassifiedElement> {
        let rows = group_rows(elements.to_vec(), |e| e.tap_y);
        let status_bar_limit = window.height * STATUS_BAR_FRACTION;

        let mut classified = Vec::with_capacity(elements.len());
        for mut row in rows {
            row.sort_by(|a, b| {
                a.tap_x
                    .partial_cmp(&b.tap_x)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let row_has_chevron = row.iter().any(|e| ends_with_forward_chevron(&e.text));
            let row_has_state = row.iter().any(|e| is_state_word(&e.text));

            for element in row {
                let (role, chevron_context) = self.classify_one(
                    &element,
                    row_has_chevron,
                    row_has_state,
                    status_bar_limit,
                    budget,
                );
                classified.push(ClassifiedElement {
                    element,
                    role,
                    has_chevron_context: chevron_context,
                });
            }
        }
        classified
    }

    /// Priority rules, first match wins.
    fn classify_one(
        &self,
        element: &TapPoint,
        row_has_chevron: bool,
        row_has_state: bool,
        status_bar_limit: f64,
        budget: &ExplorationBudget,
    ) -> (ElementRole, bool) {
        let text = element.text.trim();

        // 1. status-bar strip
        if element.tap_y < status_bar_limit {
            return (ElementRole::Decoration, false);
        }
        // 2. chevrons and bare punctuation
        if is_chevron_text(text) || is_pure_punctuation(text) {
            return (ElementRole::Decoration, false);
        }
        // 3. state words, value readouts, times
        if is_state_word(text) || VALUE_RE.is_match(text) || TIME_RE.is_match(text) {
            return (ElementRole::Info, false);
        }
        // 4. too short to be a label
        if text.chars().count() < self.min_text_len {
            return (ElementRole::Decoration, false);
        }
        // 5. skip-listed
        if budget.should_skip(text) {
            return (ElementRole::Destructive, false);
        }
        // 6. label beside an on/off indicator
        if row_has_state && !is_state_word(text) {
            return (ElementRole::StateChange, false);
        }
        // 7. label beside a disclosure chevron
        if row_has_chevron && !ends_with_forward_chevron(text) {
            return (ElementRole::Navigation, true);
        }
        // 8. prose and help links
        if text.len() > MAX_STABLE_TEXT_LEN || is_sentence_like(text) || is_help_link(text) {
            return (ElementRole::Info, false);
        }
        // 9. default
        (ElementRole::Navigation, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(elements: Vec<TapPoint>) -> Vec<ClassifiedElement> {
        let classifier = ElementClassifier::default();
        let window = WindowSize::new(390.0, 844.0);
        let budget = ExplorationBudget::default();
        classifier.classify(&elements, &window, &budget)
    }

    fn role_of<'a>(classified: &'a [ClassifiedElement], text: &str) -> &'a ClassifiedElement {
        classified
            .iter()
            .find(|c| c.text() == text)
            .unwrap_or_else(|| panic!("element '{text}' missing"))
    }

    #[test]
    fn test_toggle_row() {
        let classified = classify(vec![
            TapPoint::new("Wi-Fi", 50.0, 300.0),
            TapPoint::new("On", 350.0, 300.0),
            TapPoint::new(">", 390.0, 300.0),
        ]);
        assert_eq!(role_of(&classified, "Wi-Fi").role, ElementRole::StateChange);
        assert_eq!(role_of(&classified, "On").role, ElementRole::Info);
        assert_eq!(role_of(&classified, ">").role, ElementRole::Decoration);
    }

    #[test]
    fn test_disclosure_row_without_state() {
        let classified = classify(vec![
            TapPoint::new("Wi-Fi", 50.0, 300.0),
            TapPoint::new(">", 390.0, 300.0),
        ]);
        let wifi = role_of(&classified, "Wi-Fi");
        assert_eq!(wifi.role, ElementRole::Navigation);
        assert!(wifi.has_chevron_context);
    }

    #[test]
    fn test_status_bar_is_decoration() {
        let classified = classify(vec![TapPoint::new("Carrier", 20.0, 30.0)]);
        assert_eq!(classified[0].role, ElementRole::Decoration);
    }

    #[test]
    fn test_value_and_time_are_info() {
        let classified = classify(vec![
            TapPoint::new("128 GB", 300.0, 400.0),
            TapPoint::new("45%", 300.0, 430.0),
            TapPoint::new("12:30", 300.0, 460.0),
        ]);
        for c in &classified {
            assert_eq!(c.role, ElementRole::Info, "{}", c.text());
        }
    }

    #[test]
    fn test_destructive_skip_pattern() {
        let classified = classify(vec![TapPoint::new("Delete Account", 100.0, 500.0)]);
        assert_eq!(classified[0].role, ElementRole::Destructive);
    }

    #[test]
    fn test_sentence_like_is_info() {
        let classified = classify(vec![TapPoint::new(
            "Your photos are backed up, and you can access them anywhere",
            100.0,
            500.0,
        )]);
        assert_eq!(classified[0].role, ElementRole::Info);
    }

    #[test]
    fn test_help_link_is_info() {
        let classified = classify(vec![TapPoint::new("Learn more about Privacy", 100.0, 500.0)]);
        assert_eq!(classified[0].role, ElementRole::Info);
    }

    #[test]
    fn test_short_text_is_decoration() {
        let classified = classify(vec![TapPoint::new("a", 100.0, 500.0)]);
        assert_eq!(classified[0].role, ElementRole::Decoration);
    }

    #[test]
    fn test_default_navigation_without_chevron() {
        let classified = classify(vec![TapPoint::new("General", 100.0, 500.0)]);
        assert_eq!(classified[0].role, ElementRole::Navigation);
        assert!(!classified[0].has_chevron_context);
    }

    #[test]
    fn test_empty_input() {
        assert!(classify(vec![]).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let elements = vec![
            TapPoint::new("General", 100.0, 300.0),
            TapPoint::new(">", 380.0, 300.0),
            TapPoint::new("About", 100.0, 350.0),
        ];
        let a = classify(elements.clone());
        let b = classify(elements);
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_element_gets_exactly_one_role() {
        let elements = vec![
            TapPoint::new("General", 100.0, 300.0),
            TapPoint::new("9:41", 20.0, 20.0),
            TapPoint::new("On", 300.0, 350.0),
            TapPoint::new("Privacy", 100.0, 350.0),
        ];
        let classified = classify(elements.clone());
        assert_eq!(classified.len(), elements.len());
    }

    #[test]
    fn test_row_grouping_gap() {
        let rows = group_rows(
            vec![
                TapPoint::new("a", 0.0, 100.0),
                TapPoint::new("b", 0.0, 110.0),
                TapPoint::new("c", 0.0, 140.0),
            ],
            |e| e.tap_y,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 1);
    }
}
