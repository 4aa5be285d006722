//! Mobile strategy: tab bars, pushed lists, sheet modals, back taps

use super::BacktrackMethod;
use crate::classifier::group_rows;
use crate::graph::ScoutResult;
use crate::planner::{PlannedInteraction, ScreenPlanner};
use crate::types::{ClassifiedElement, NavigationHints, ScreenType, TapPoint, WindowSize};
use std::collections::{HashMap, HashSet};

/// Bottom fraction of the window scanned for a tab bar.
const TAB_BAR_FRACTION: f64 = 0.12;
/// Tab labels are short.
const TAB_LABEL_MAX_LEN: usize = 12;
/// Rows at or above this count read as a list or settings page.
const LIST_ROW_THRESHOLD: usize = 4;
/// Top fraction of the window scanned for modal dismiss affordances.
const MODAL_TOP_FRACTION: f64 = 0.15;

const MODAL_DISMISS_WORDS: &[&str] = &["close", "done", "cancel", "x", "✕", "×"];

pub(super) fn classify_screen(elements: &[TapPoint], hints: &NavigationHints) -> ScreenType {
    let window = &hints.window;

    let tab_candidates = elements
        .iter()
        .filter(|e| e.tap_y >= window.height * (1.0 - TAB_BAR_FRACTION))
        .filter(|e| {
            let t = e.text.trim();
            !t.is_empty() && t.chars().count() <= TAB_LABEL_MAX_LEN
        })
        .count();
    if tab_candidates >= 3 {
        return ScreenType::TabRoot;
    }

    let modal_dismiss = elements
        .iter()
        .filter(|e| e.tap_y < window.height * MODAL_TOP_FRACTION)
        .any(|e| MODAL_DISMISS_WORDS.contains(&e.text.trim().to_lowercase().as_str()));
    if modal_dismiss {
        return ScreenType::Modal;
    }

    let row_count = group_rows(elements.to_vec(), |e| e.tap_y).len();
    if row_count >= LIST_ROW_THRESHOLD {
        let mentions_settings = elements
            .iter()
            .any(|e| e.text.to_lowercase().contains("settings"));
        return if mentions_settings {
            ScreenType::Settings
        } else {
            ScreenType::List
        };
    }

    if hints.back_chevron.is_some() {
        return ScreenType::Detail;
    }
    ScreenType::Unknown
}

pub(super) fn rank_elements(
    classified: &[ClassifiedElement],
    visited: &HashSet<String>,
    scout_results: &HashMap<String, ScoutResult>,
    window: &WindowSize,
) -> Vec<PlannedInteraction> {
    ScreenPlanner.plan_elements(classified, visited, scout_results, window)
}

pub(super) fn backtrack_method(hints: &NavigationHints) -> BacktrackMethod {
    if hints.back_chevron.is_some() {
        BacktrackMethod::TapBack
    } else {
        // No visible chevron: an edge swipe still pops the stack
        BacktrackMethod::SwipeBack
    }
}
