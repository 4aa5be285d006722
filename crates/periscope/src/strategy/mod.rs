//! Exploration strategies
//!
//! Policy plug-in for ranking, screen classification and backtracking,
//! keyed by app family. Strategies are a tagged variant with pure dispatch
//! methods; picking one happens once per session via [`StrategyDetector`].

mod desktop;
mod mobile;
mod social;

use crate::budget::ExplorationBudget;
use crate::errors::{ExplorationError, Result};
use crate::fingerprint;
use crate::graph::ScoutResult;
use crate::types::{
    ClassifiedElement, IconBox, NavigationHints, ScreenType, TapPoint, WindowSize,
};
use crate::planner::PlannedInteraction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// How the traversal should leave the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BacktrackMethod {
    PressBack,
    TapBack,
    SwipeBack,
    PressHome,
    None,
}

/// App-family policy variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    Mobile,
    Desktop,
    Social,
}

impl Strategy {
    /// Parse an explicitly requested strategy name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "mobile" => Ok(Strategy::Mobile),
            "desktop" => Ok(Strategy::Desktop),
            "social" => Ok(Strategy::Social),
            other => Err(ExplorationError::UnknownStrategy(other.to_string())),
        }
    }

    /// Coarse structural category for the capture.
    pub fn classify_screen(&self, elements: &[TapPoint], hints: &NavigationHints) -> ScreenType {
        match self {
            Strategy::Mobile => mobile::classify_screen(elements, hints),
            Strategy::Desktop => desktop::classify_screen(elements, hints),
            // Social apps are mobile-shaped; the difference is ranking and skips
            Strategy::Social => mobile::classify_screen(elements, hints),
        }
    }

    /// Rank candidate interactions for the current screen.
    #[allow(clippy::too_many_arguments)]
    pub fn rank_elements(
        &self,
        classified: &[ClassifiedElement],
        icons: &[IconBox],
        visited: &HashSet<String>,
        scout_results: &HashMap<String, ScoutResult>,
        depth: u32,
        screen_type: ScreenType,
        window: &WindowSize,
    ) -> Vec<PlannedInteraction> {
        let _ = (icons, depth, screen_type);
        match self {
            Strategy::Mobile | Strategy::Desktop => {
                mobile::rank_elements(classified, visited, scout_results, window)
            }
            Strategy::Social => social::rank_elements(classified, visited, scout_results, window),
        }
    }

    /// Preferred way to leave a screen.
    pub fn backtrack_method(&self, hints: &NavigationHints, depth: u32) -> BacktrackMethod {
        if depth == 0 {
            return BacktrackMethod::None;
        }
        match self {
            Strategy::Mobile | Strategy::Social => mobile::backtrack_method(hints),
            Strategy::Desktop => BacktrackMethod::PressBack,
        }
    }

    /// True if the element must never be interacted with.
    pub fn should_skip(&self, text: &str, budget: &ExplorationBudget) -> bool {
        match self {
            Strategy::Mobile | Strategy::Desktop => budget.should_skip(text),
            Strategy::Social => social::should_skip(text, budget),
        }
    }

    /// True when a screen offers no further forward progress.
    pub fn is_terminal(
        &self,
        elements: &[TapPoint],
        depth: u32,
        budget: &ExplorationBudget,
        screen_type: ScreenType,
    ) -> bool {
        if depth >= budget.max_depth {
            return true;
        }
        if elements.is_empty() {
            return true;
        }
        // A modal reached below the root is a leaf: dismiss, don't dig
        screen_type == ScreenType::Modal && depth > 0
    }

    /// Screen identity for the capture; all variants share the structural
    /// fingerprint.
    pub fn extract_fingerprint(
        &self,
        elements: &[TapPoint],
        icons: &[IconBox],
        window: &WindowSize,
    ) -> String {
        fingerprint::compute(elements, icons, window)
    }
}

/// Picks the strategy for a session.
///
/// Resolution order: explicit override, then target type, then bundle-id
/// prefix, then app-name word list, then the mobile default. An unknown
/// explicit name is a configuration error and falls back to detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyDetector;

/// Inputs available when a session starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionContext<'a> {
    pub explicit: Option<&'a str>,
    pub target_type: Option<&'a str>,
    pub bundle_id: Option<&'a str>,
    pub app_name: &'a str,
}

const SOCIAL_BUNDLE_PREFIXES: &[&str] = &[
    "com.facebook",
    "com.instagram",
    "com.twitter",
    "com.atebits.tweetie2",
    "com.zhiliaoapp.musically",
    "com.toyopagroup.picaboo",
    "com.reddit",
    "com.pinterest",
    "com.linkedin",
];

const SOCIAL_APP_WORDS: &[&str] = &[
    "instagram",
    "facebook",
    "tiktok",
    "twitter",
    "snapchat",
    "reddit",
    "pinterest",
    "linkedin",
    "threads",
];

impl StrategyDetector {
    pub fn detect(&self, ctx: &DetectionContext<'_>) -> Strategy {
        if let Some(name) = ctx.explicit {
            match Strategy::from_name(name) {
                Ok(strategy) => return strategy,
                Err(e) => warn!(error = %e, "falling back to detection"),
            }
        }
        if ctx.target_type == Some("generic-window") {
            return Strategy::Desktop;
        }
        if let Some(bundle_id) = ctx.bundle_id {
            let lower = bundle_id.to_lowercase();
            if SOCIAL_BUNDLE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
                return Strategy::Social;
            }
        }
        let app_lower = ctx.app_name.to_lowercase();
        if SOCIAL_APP_WORDS
            .iter()
            .any(|w| app_lower.split_whitespace().any(|token| token == *w))
        {
            return Strategy::Social;
        }
        Strategy::Mobile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Strategy::from_name("mobile").unwrap(), Strategy::Mobile);
        assert_eq!(Strategy::from_name(" Desktop ").unwrap(), Strategy::Desktop);
        assert!(Strategy::from_name("web").is_err());
    }

    #[test]
    fn test_detector_resolution_order() {
        let detector = StrategyDetector;
        assert_eq!(
            detector.detect(&DetectionContext {
                explicit: Some("desktop"),
                app_name: "Instagram",
                ..Default::default()
            }),
            Strategy::Desktop
        );
        assert_eq!(
            detector.detect(&DetectionContext {
                target_type: Some("generic-window"),
                app_name: "Notes",
                ..Default::default()
            }),
            Strategy::Desktop
        );
        assert_eq!(
            detector.detect(&DetectionContext {
                bundle_id: Some("com.instagram.ios"),
                app_name: "Unknown",
                ..Default::default()
            }),
            Strategy::Social
        );
        assert_eq!(
            detector.detect(&DetectionContext {
                app_name: "TikTok",
                ..Default::default()
            }),
            Strategy::Social
        );
        assert_eq!(
            detector.detect(&DetectionContext {
                app_name: "Settings",
                ..Default::default()
            }),
            Strategy::Mobile
        );
    }

    #[test]
    fn test_unknown_explicit_falls_back() {
        let detector = StrategyDetector;
        let strategy = detector.detect(&DetectionContext {
            explicit: Some("hologram"),
            app_name: "Settings",
            ..Default::default()
        });
        assert_eq!(strategy, Strategy::Mobile);
    }

    #[test]
    fn test_terminal_depth() {
        let budget = ExplorationBudget {
            max_depth: 2,
            ..Default::default()
        };
        let elements = vec![TapPoint::new("General", 50.0, 300.0)];
        assert!(Strategy::Mobile.is_terminal(&elements, 2, &budget, ScreenType::List));
        assert!(!Strategy::Mobile.is_terminal(&elements, 1, &budget, ScreenType::List));
        assert!(Strategy::Mobile.is_terminal(&elements, 1, &budget, ScreenType::Modal));
        assert!(Strategy::Mobile.is_terminal(&[], 1, &budget, ScreenType::List));
    }
}
