//! Modal alert detection and dismissal
//!
//! System permission prompts, tracking dialogs and rating nags interrupt
//! exploration. The detector recognizes them from the OCR element set alone;
//! dismissal always picks the most conservative button available.

use crate::boundary::{InputProvider, ScreenDescriber};
use crate::clock::Clock;
use crate::errors::Result;
use crate::types::{ScreenDescription, TapPoint};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// An alert has few recognizable texts.
const MAX_ALERT_ELEMENTS: usize = 10;
const MIN_ALERT_ELEMENTS: usize = 2;

/// Dismiss attempts before giving up.
pub const MAX_DISMISS_ATTEMPTS: u32 = 3;

/// Buttons in ascending priority order: index 0 is the most conservative
/// dismissal and always wins when present.
const BUTTON_PRIORITY: &[&str] = &[
    "don't allow",
    "ask app not to track",
    "not now",
    "cancel",
    "dismiss",
    "no thanks",
    "later",
    "close",
    "ok",
    "allow",
];

/// Phrases that identify a prompt title.
const TITLE_PATTERNS: &[&str] = &[
    "would like to",
    "wants to access",
    "allow tracking",
    "rate",
    "enjoying",
    "leave a review",
    "turn on notifications",
    "permission",
];

/// A detected alert and its chosen dismiss target.
#[derive(Debug, Clone)]
pub struct AlertDetection {
    pub dismiss_target: TapPoint,
    /// Priority index of the chosen button, for logging
    pub priority: usize,
}

fn button_priority(text: &str) -> Option<usize> {
    let lower = text.trim().to_lowercase();
    BUTTON_PRIORITY.iter().position(|b| *b == lower)
}

fn is_title_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    TITLE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Decide whether the element set is an alert, and pick the dismiss target.
///
/// A screen is an alert iff it has between 2 and 9 elements and either two
/// or more priority buttons appear, or one such button appears next to a
/// title-pattern text. The dismiss target is the matched button with the
/// lowest priority index; the choice is stable for a given element set.
pub fn detect(elements: &[TapPoint]) -> Option<AlertDetection> {
    if elements.len() >= MAX_ALERT_ELEMENTS || elements.len() < MIN_ALERT_ELEMENTS {
        return None;
    }

    let mut buttons: Vec<(usize, &TapPoint)> = elements
        .iter()
        .filter_map(|e| button_priority(&e.text).map(|p| (p, e)))
        .collect();
    if buttons.is_empty() {
        return None;
    }
    let has_title = elements.iter().any(|e| is_title_text(&e.text));
    if buttons.len() < 2 && !has_title {
        return None;
    }

    buttons.sort_by_key(|(p, _)| *p);
    let (priority, target) = buttons[0];
    Some(AlertDetection {
        dismiss_target: (*target).clone(),
        priority,
    })
}

/// Capture the screen, dismissing any alerts in the way. Taps the chosen
/// dismiss target, waits for the UI to settle and re-captures, up to
/// [`MAX_DISMISS_ATTEMPTS`] times; returns the first alert-free description
/// (or the last one if the alert refuses to leave).
pub async fn describe_dismissing_alerts(
    describer: &Arc<dyn ScreenDescriber>,
    input: &Arc<dyn InputProvider>,
    clock: &Arc<dyn Clock>,
    settle: Duration,
) -> Result<ScreenDescription> {
    let mut description = describer.describe().await?;
    for attempt in 0..MAX_DISMISS_ATTEMPTS {
        let Some(alert) = detect(&description.elements) else {
            return Ok(description);
        };
        debug!(
            target = %alert.dismiss_target.text,
            priority = alert.priority,
            attempt,
            "dismissing alert"
        );
        input
            .tap(alert.dismiss_target.tap_x, alert.dismiss_target.tap_y)
            .await?;
        clock.sleep(settle).await;
        description = describer.describe().await?;
    }
    if detect(&description.elements).is_some() {
        warn!("alert persisted after {MAX_DISMISS_ATTEMPTS} dismiss attempts");
    }
    Ok(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(texts: &[&str]) -> Vec<TapPoint> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TapPoint::new(*t, 195.0, 300.0 + i as f64 * 50.0))
            .collect()
    }

    #[test]
    fn test_location_prompt_detected() {
        let elements = points(&[
            "\u{201C}Maps\u{201D} would like to use your location",
            "Don't Allow",
            "Allow",
        ]);
        let alert = detect(&elements).expect("alert");
        assert_eq!(alert.dismiss_target.text, "Don't Allow");
        assert_eq!(alert.priority, 0);
    }

    #[test]
    fn test_two_buttons_without_title() {
        let elements = points(&["Cancel", "OK"]);
        let alert = detect(&elements).expect("alert");
        assert_eq!(alert.dismiss_target.text, "Cancel");
    }

    #[test]
    fn test_one_button_without_title_is_not_alert() {
        let elements = points(&["OK", "Welcome back"]);
        assert!(detect(&elements).is_none());
    }

    #[test]
    fn test_busy_screen_is_not_alert() {
        let texts: Vec<String> = (0..12).map(|i| format!("Row {i}x")).collect();
        let mut elements: Vec<TapPoint> = texts
            .iter()
            .map(|t| TapPoint::new(t.clone(), 50.0, 200.0))
            .collect();
        elements.push(TapPoint::new("Cancel", 50.0, 700.0));
        elements.push(TapPoint::new("OK", 250.0, 700.0));
        assert!(detect(&elements).is_none());
    }

    #[test]
    fn test_dismiss_choice_is_stable() {
        let elements = points(&["Allow", "Not Now", "Allow Tracking?"]);
        let first = detect(&elements).expect("alert");
        let second = detect(&elements).expect("alert");
        assert_eq!(first.dismiss_target.text, second.dismiss_target.text);
        assert_eq!(first.dismiss_target.text, "Not Now");
    }

    #[test]
    fn test_single_element_is_not_alert() {
        assert!(detect(&points(&["Loading"])).is_none());
    }
}
