//! Interaction planning
//!
//! Scores and orders the candidate interactions on a screen. Works at the
//! element level by default; when the component detector matched the screen,
//! the component-level scorer is used instead with mirrored weights.

use crate::component::{ClickResult, ScreenComponent};
use crate::graph::ScoutResult;
use crate::types::{ClassifiedElement, ElementRole, WindowSize};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Fraction of window height reserved for the system home gesture; tapping
/// there leaves the app.
pub const HOME_GESTURE_FRACTION: f64 = 0.04;

/// Score weights, shared by both scorers.
const CHEVRON_BONUS: f64 = 3.0;
const NO_CHEVRON_PENALTY: f64 = -1.0;
const SHORT_LABEL_BONUS: f64 = 2.0;
const LONG_LABEL_PENALTY: f64 = -1.0;
const CENTER_BAND_BONUS: f64 = 1.0;
const SCOUT_NAVIGATED_BONUS: f64 = 5.0;
const SCOUT_NO_CHANGE_PENALTY: f64 = -10.0;

/// One ranked candidate interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedInteraction {
    pub text: String,
    pub tap_x: f64,
    pub tap_y: f64,
    pub score: f64,
}

/// Scores candidate interactions on the current screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenPlanner;

impl ScreenPlanner {
    /// Element-level plan: navigation-role elements not yet visited and not
    /// in the home-gesture margin, in descending score order.
    pub fn plan_elements(
        &self,
        classified: &[ClassifiedElement],
        visited: &HashSet<String>,
        scout_results: &HashMap<String, ScoutResult>,
        window: &WindowSize,
    ) -> Vec<PlannedInteraction> {
        let home_limit = window.height * (1.0 - HOME_GESTURE_FRACTION);
        let mut plan: Vec<PlannedInteraction> = classified
            .iter()
            .filter(|c| c.role == ElementRole::Navigation)
            .filter(|c| !visited.contains(c.text()))
            .filter(|c| c.element.tap_y < home_limit)
            .map(|c| {
                let score = label_score(c.text(), window, c.element.tap_y, scout_results)
                    + chevron_score(c.has_chevron_context);
                PlannedInteraction {
                    text: c.text().to_string(),
                    tap_x: c.element.tap_x,
                    tap_y: c.element.tap_y,
                    score,
                }
            })
            .collect();
        sort_plan(&mut plan);
        debug!(candidates = plan.len(), "element plan built");
        plan
    }

    /// Component-level plan: clickable components with an unvisited tap
    /// target outside the home-gesture zone. A component whose click result
    /// is `navigates` gets the chevron-style bonus; others take the no-nav
    /// penalty.
    pub fn plan_components(
        &self,
        components: &[ScreenComponent],
        visited: &HashSet<String>,
        scout_results: &HashMap<String, ScoutResult>,
        window: &WindowSize,
    ) -> Vec<PlannedInteraction> {
        let home_limit = window.height * (1.0 - HOME_GESTURE_FRACTION);
        let mut plan = Vec::new();
        for component in components.iter().filter(|c| c.clickable) {
            let Some(target) = component.tap_target.as_ref() else {
                continue;
            };
            if visited.contains(&target.text) || target.tap_y >= home_limit {
                continue;
            }
            let score = label_score(&target.text, window, target.tap_y, scout_results)
                + chevron_score(component.click_result == ClickResult::Navigates);
            plan.push(PlannedInteraction {
                text: target.text.clone(),
                tap_x: target.tap_x,
                tap_y: target.tap_y,
                score,
            });
        }
        sort_plan(&mut plan);
        debug!(candidates = plan.len(), "component plan built");
        plan
    }
}

fn chevron_score(navigates: bool) -> f64 {
    if navigates {
        CHEVRON_BONUS
    } else {
        NO_CHEVRON_PENALTY
    }
}

fn label_score(
    text: &str,
    window: &WindowSize,
    tap_y: f64,
    scout_results: &HashMap<String, ScoutResult>,
) -> f64 {
    let mut score = 0.0;
    let trimmed = text.trim();
    if !trimmed.contains(' ') && trimmed.chars().count() <= 20 {
        score += SHORT_LABEL_BONUS;
    }
    if trimmed.chars().count() > 30 {
        score += LONG_LABEL_PENALTY;
    }
    let y_fraction = tap_y / window.height;
    if (0.25..=0.75).contains(&y_fraction) {
        score += CENTER_BAND_BONUS;
    }
    match scout_results.get(trimmed) {
        Some(ScoutResult::Navigated) => score += SCOUT_NAVIGATED_BONUS,
        Some(ScoutResult::NoChange) => score += SCOUT_NO_CHANGE_PENALTY,
        None => {}
    }
    score
}

fn sort_plan(plan: &mut [PlannedInteraction]) {
    plan.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.tap_y
                    .partial_cmp(&b.tap_y)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ExplorationBudget;
    use crate::classifier::ElementClassifier;
    use crate::types::TapPoint;

    fn classify(elements: Vec<TapPoint>) -> Vec<ClassifiedElement> {
        ElementClassifier::default().classify(
            &elements,
            &WindowSize::new(390.0, 844.0),
            &ExplorationBudget::default(),
        )
    }

    fn plan(
        classified: &[ClassifiedElement],
        visited: &HashSet<String>,
        scout: &HashMap<String, ScoutResult>,
    ) -> Vec<PlannedInteraction> {
        ScreenPlanner.plan_elements(classified, visited, scout, &WindowSize::new(390.0, 844.0))
    }

    #[test]
    fn test_chevron_row_ranks_first() {
        let classified = classify(vec![
            TapPoint::new("General", 50.0, 300.0),
            TapPoint::new(">", 380.0, 300.0),
            TapPoint::new("Feedback", 50.0, 400.0),
        ]);
        let plan = plan(&classified, &HashSet::new(), &HashMap::new());
        assert_eq!(plan[0].text, "General");
        assert!(plan[0].score > plan[1].score);
    }

    #[test]
    fn test_visited_excluded() {
        let classified = classify(vec![
            TapPoint::new("General", 50.0, 300.0),
            TapPoint::new("Privacy", 50.0, 350.0),
        ]);
        let visited: HashSet<String> = ["General".to_string()].into();
        let plan = plan(&classified, &visited, &HashMap::new());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].text, "Privacy");
    }

    #[test]
    fn test_home_gesture_margin_excluded() {
        let classified = classify(vec![TapPoint::new("Dock", 195.0, 840.0)]);
        let plan = plan(&classified, &HashSet::new(), &HashMap::new());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_scout_results_dominate() {
        let classified = classify(vec![
            TapPoint::new("Alpha", 50.0, 300.0),
            TapPoint::new("Beta", 50.0, 350.0),
        ]);
        let scout: HashMap<String, ScoutResult> = [
            ("Alpha".to_string(), ScoutResult::NoChange),
            ("Beta".to_string(), ScoutResult::Navigated),
        ]
        .into();
        let plan = plan(&classified, &HashSet::new(), &scout);
        assert_eq!(plan[0].text, "Beta");
        assert!(plan[1].score < 0.0);
    }

    #[test]
    fn test_center_band_bonus() {
        let classified = classify(vec![
            TapPoint::new("Upper", 50.0, 150.0),
            TapPoint::new("Middle", 50.0, 420.0),
        ]);
        let plan = plan(&classified, &HashSet::new(), &HashMap::new());
        assert_eq!(plan[0].text, "Middle");
    }

    #[test]
    fn test_component_plan_prefers_navigating() {
        use crate::component::{builtin_catalog, ComponentDetector};
        let detector = ComponentDetector::new(builtin_catalog());
        let classified = classify(vec![
            TapPoint::new("General", 50.0, 300.0),
            TapPoint::new(">", 380.0, 300.0),
            TapPoint::new("Wi-Fi", 50.0, 400.0),
            TapPoint::new("On", 340.0, 400.0),
        ]);
        let components = detector.detect(&classified, &WindowSize::new(390.0, 844.0));
        let plan = ScreenPlanner.plan_components(
            &components,
            &HashSet::new(),
            &HashMap::new(),
            &WindowSize::new(390.0, 844.0),
        );
        assert!(!plan.is_empty());
        assert_eq!(plan[0].text, "General");
    }
}
