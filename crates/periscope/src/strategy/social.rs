//! Social strategy: extra commercial skips, feed interactions ranked last

use crate::budget::ExplorationBudget;
use crate::graph::ScoutResult;
use crate::planner::{PlannedInteraction, ScreenPlanner};
use crate::types::{ClassifiedElement, WindowSize};
use std::collections::{HashMap, HashSet};

/// Purchase and advertising copy social apps surface mid-feed.
const EXTRA_SKIP_PATTERNS: &[&str] = &[
    "promoted",
    "sponsored",
    "shop now",
    "install now",
    "get offer",
    "boost",
    "try premium",
    "go live",
];

/// Feed-interrupting interactions: reachable, but explored last.
const FEED_INTERRUPT_WORDS: &[&str] = &[
    "like",
    "comment",
    "repost",
    "follow",
    "following",
    "add friend",
    "story",
];

const FEED_INTERRUPT_PENALTY: f64 = -6.0;

pub(super) fn should_skip(text: &str, budget: &ExplorationBudget) -> bool {
    if budget.should_skip(text) {
        return true;
    }
    let lower = text.trim().to_lowercase();
    EXTRA_SKIP_PATTERNS.iter().any(|p| lower.contains(p))
}

pub(super) fn rank_elements(
    classified: &[ClassifiedElement],
    visited: &HashSet<String>,
    scout_results: &HashMap<String, ScoutResult>,
    window: &WindowSize,
) -> Vec<PlannedInteraction> {
    let mut plan = ScreenPlanner.plan_elements(classified, visited, scout_results, window);
    for entry in &mut plan {
        let lower = entry.text.to_lowercase();
        if FEED_INTERRUPT_WORDS.iter().any(|w| lower.contains(w)) {
            entry.score += FEED_INTERRUPT_PENALTY;
        }
    }
    plan.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ExplorationBudget;
    use crate::classifier::ElementClassifier;
    use crate::types::TapPoint;

    #[test]
    fn test_extra_skips() {
        let budget = ExplorationBudget::default();
        assert!(should_skip("Sponsored", &budget));
        assert!(should_skip("Shop Now", &budget));
        assert!(should_skip("Delete", &budget));
        assert!(!should_skip("Profile", &budget));
    }

    #[test]
    fn test_feed_items_rank_last() {
        let window = WindowSize::new(390.0, 844.0);
        let classified = ElementClassifier::default().classify(
            &[
                TapPoint::new("Follow", 300.0, 300.0),
                TapPoint::new("Profile", 50.0, 400.0),
            ],
            &window,
            &ExplorationBudget::default(),
        );
        let plan = rank_elements(&classified, &HashSet::new(), &HashMap::new(), &window);
        assert_eq!(plan.last().unwrap().text, "Follow");
    }
}
