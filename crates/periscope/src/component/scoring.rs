//! Definition-versus-row scoring

use super::{ChevronMode, ComponentDefinition, Zone};
use crate::classifier::FORWARD_CHEVRONS;
use crate::types::{ClassifiedElement, WindowSize};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+([.,]\d+)?$").unwrap());
static BARE_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}$").unwrap());

const DISMISS_WORDS: &[&str] = &["close", "done", "cancel", "dismiss", "ok", "x", "✕", "×"];

const LONG_TEXT_LEN: usize = 50;

/// Precomputed facts about one visual row, consumed by the scorer.
#[derive(Debug, Clone)]
pub struct RowProperties {
    pub element_count: usize,
    pub has_chevron: bool,
    pub has_numeric: bool,
    pub has_long_text: bool,
    pub has_dismiss: bool,
    pub zone: Zone,
    pub avg_confidence: f64,
    pub bare_digit_count: usize,
    pub texts: Vec<String>,
    pub y_min: f64,
    pub y_max: f64,
}

impl RowProperties {
    pub fn from_row(row: &[ClassifiedElement], window: &WindowSize) -> Self {
        let texts: Vec<String> = row.iter().map(|e| e.element.text.trim().to_string()).collect();
        let y_min = row
            .iter()
            .map(|e| e.element.tap_y)
            .fold(f64::INFINITY, f64::min);
        let y_max = row
            .iter()
            .map(|e| e.element.tap_y)
            .fold(f64::NEG_INFINITY, f64::max);
        let avg_confidence = if row.is_empty() {
            0.0
        } else {
            row.iter().map(|e| e.element.confidence).sum::<f64>() / row.len() as f64
        };
        Self {
            element_count: row.len(),
            has_chevron: texts.iter().any(|t| {
                t.chars()
                    .last()
                    .map(|c| FORWARD_CHEVRONS.contains(&c))
                    .unwrap_or(false)
            }),
            has_numeric: texts.iter().any(|t| NUMERIC_RE.is_match(t)),
            has_long_text: texts.iter().any(|t| t.len() > LONG_TEXT_LEN),
            has_dismiss: texts
                .iter()
                .any(|t| DISMISS_WORDS.contains(&t.to_lowercase().as_str())),
            zone: Zone::of(y_min, window),
            avg_confidence,
            bare_digit_count: texts.iter().filter(|t| BARE_DIGIT_RE.is_match(t)).count(),
            texts,
            y_min,
            y_max,
        }
    }

    pub fn row_height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Score a definition against a row.
///
/// Hard constraints rule the definition out entirely (`None`); satisfied
/// constraints contribute bonuses. Tighter element-count ranges and nav/tab
/// bar definitions score a specificity bonus so they win over generic
/// content rows.
pub fn score_definition(def: &ComponentDefinition, row: &RowProperties) -> Option<f64> {
    let mut score = 0.0;

    if def.zone != row.zone {
        return None;
    }
    score += 1.0;

    if row.element_count < def.min_elements || row.element_count > def.max_elements {
        return None;
    }
    score += 1.0;
    let range = def.max_elements.saturating_sub(def.min_elements);
    if range <= 1 {
        score += 2.0;
    } else if range <= 3 {
        score += 1.0;
    }

    if let Some(limit) = def.max_row_height_pt {
        if row.row_height() > limit {
            return None;
        }
        score += 1.0;
    }

    match def.chevron {
        Some(ChevronMode::Required) => {
            if !row.has_chevron {
                return None;
            }
            score += 2.0;
        }
        Some(ChevronMode::Forbidden) => {
            if row.has_chevron {
                return None;
            }
            score += 1.0;
        }
        Some(ChevronMode::Preferred) => {
            if row.has_chevron {
                score += 2.0;
            }
        }
        None => {}
    }

    if def.requires_numeric {
        if !row.has_numeric {
            return None;
        }
        score += 1.0;
    }
    if def.requires_long_text {
        if !row.has_long_text {
            return None;
        }
        score += 1.0;
    }
    if def.requires_dismiss {
        if !row.has_dismiss {
            return None;
        }
        score += 2.0;
    }

    if let Some(min_conf) = def.min_avg_confidence {
        if row.avg_confidence < min_conf {
            return None;
        }
        score += 1.0;
    }

    if let Some(pattern) = &def.text_pattern {
        match Regex::new(pattern) {
            Ok(re) => {
                if !row.texts.iter().any(|t| re.is_match(t)) {
                    return None;
                }
                score += 2.0;
            }
            Err(_) => return None,
        }
    }

    if matches!(def.zone, Zone::NavBar | Zone::TabBar) {
        score += 1.0;
    }

    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementRole, TapPoint};

    fn element(text: &str, x: f64, y: f64) -> ClassifiedElement {
        ClassifiedElement {
            element: TapPoint::new(text, x, y),
            role: ElementRole::Navigation,
            has_chevron_context: false,
        }
    }

    fn props(texts: &[(&str, f64, f64)]) -> RowProperties {
        let row: Vec<_> = texts.iter().map(|(t, x, y)| element(t, *x, *y)).collect();
        RowProperties::from_row(&row, &WindowSize::new(390.0, 844.0))
    }

    #[test]
    fn test_row_properties() {
        let row = props(&[("General", 50.0, 300.0), ("12", 340.0, 300.0), (">", 380.0, 302.0)]);
        assert_eq!(row.element_count, 3);
        assert!(row.has_chevron);
        assert!(row.has_numeric);
        assert_eq!(row.bare_digit_count, 1);
        assert_eq!(row.zone, Zone::Content);
        assert!(!row.has_dismiss);
    }

    #[test]
    fn test_chevron_required_rules_out() {
        let def = ComponentDefinition {
            name: "table-row-disclosure".into(),
            chevron: Some(ChevronMode::Required),
            ..Default::default()
        };
        let without = props(&[("General", 50.0, 300.0)]);
        assert!(score_definition(&def, &without).is_none());

        let with = props(&[("General", 50.0, 300.0), (">", 380.0, 300.0)]);
        assert!(score_definition(&def, &with).is_some());
    }

    #[test]
    fn test_zone_mismatch_rules_out() {
        let def = ComponentDefinition {
            name: "tab-bar-item".into(),
            zone: Zone::TabBar,
            ..Default::default()
        };
        let content_row = props(&[("Home", 50.0, 400.0)]);
        assert!(score_definition(&def, &content_row).is_none());
    }

    #[test]
    fn test_tight_range_scores_higher() {
        let tight = ComponentDefinition {
            name: "tight".into(),
            min_elements: 1,
            max_elements: 2,
            ..Default::default()
        };
        let loose = ComponentDefinition {
            name: "loose".into(),
            min_elements: 1,
            max_elements: 8,
            ..Default::default()
        };
        let row = props(&[("General", 50.0, 300.0)]);
        let tight_score = score_definition(&tight, &row).unwrap();
        let loose_score = score_definition(&loose, &row).unwrap();
        assert!(tight_score > loose_score);
    }

    #[test]
    fn test_dismiss_requirement() {
        let def = ComponentDefinition {
            name: "dismiss-button".into(),
            zone: Zone::NavBar,
            requires_dismiss: true,
            ..Default::default()
        };
        let done = props(&[("Done", 360.0, 50.0)]);
        assert!(score_definition(&def, &done).is_some());
        let other = props(&[("Edit", 360.0, 50.0)]);
        assert!(score_definition(&def, &other).is_none());
    }
}
