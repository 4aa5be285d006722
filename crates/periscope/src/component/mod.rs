//! Optional component layer
//!
//! Groups classified elements into matched UI components (table rows with
//! disclosure, tab-bar items, dismiss buttons, ...) against a loadable table
//! of definitions. When no definitions are loaded the planner falls back to
//! element-level ranking.

mod catalog;
mod detector;
mod scoring;

pub use catalog::{builtin_catalog, load_catalog_dir};
pub use detector::ComponentDetector;
pub use scoring::{score_definition, RowProperties};

use crate::types::{ClassifiedElement, TapPoint, WindowSize};
use serde::{Deserialize, Serialize};

/// Vertical zone of the screen a definition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Zone {
    NavBar,
    Content,
    TabBar,
}

impl Zone {
    /// Fraction of window height occupied by the navigation bar band.
    pub const NAV_BAR_FRACTION: f64 = 0.15;
    /// Start of the tab-bar band, as a fraction of window height.
    pub const TAB_BAR_FRACTION: f64 = 0.88;

    /// Zone for a Y position.
    pub fn of(y: f64, window: &WindowSize) -> Self {
        if y < window.height * Self::NAV_BAR_FRACTION {
            Zone::NavBar
        } else if y >= window.height * Self::TAB_BAR_FRACTION {
            Zone::TabBar
        } else {
            Zone::Content
        }
    }
}

/// How a definition treats the presence of a disclosure chevron in the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChevronMode {
    Required,
    Forbidden,
    Preferred,
}

/// What clicking a matched component does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClickResult {
    Navigates,
    Toggles,
    Dismisses,
    None,
}

/// Which trailing components an absorbing component may swallow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbsorbCondition {
    /// Absorb anything in range
    Any,
    /// Absorb only rows made of info/decoration elements (subtitles, captions)
    InfoOrDecorationOnly,
}

/// One entry in the component catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentDefinition {
    pub name: String,
    pub zone: Zone,
    pub min_elements: usize,
    pub max_elements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chevron: Option<ChevronMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_row_height_pt: Option<f64>,
    pub requires_numeric: bool,
    pub requires_long_text: bool,
    pub requires_dismiss: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_avg_confidence: Option<f64>,
    /// Regex that must match at least one text in the row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_pattern: Option<String>,
    pub clickable: bool,
    pub click_result: ClickResult,
    /// When > 0, swallow components below within this many points
    pub absorbs_below_within_pt: f64,
    pub absorb_condition: AbsorbCondition,
}

impl Default for ComponentDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            zone: Zone::Content,
            min_elements: 1,
            max_elements: 8,
            chevron: None,
            max_row_height_pt: None,
            requires_numeric: false,
            requires_long_text: false,
            requires_dismiss: false,
            min_avg_confidence: None,
            text_pattern: None,
            clickable: false,
            click_result: ClickResult::None,
            absorbs_below_within_pt: 0.0,
            absorb_condition: AbsorbCondition::Any,
        }
    }
}

/// A group of classified elements matched against a definition, with its tap
/// target and interaction metadata resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenComponent {
    pub definition_name: String,
    pub elements: Vec<ClassifiedElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tap_target: Option<TapPoint>,
    /// Bounding Y range (min, max) of the component
    pub y_range: (f64, f64),
    pub clickable: bool,
    pub click_result: ClickResult,
    /// Carried over from the matching definition for the absorption pass
    pub absorbs_below_within_pt: f64,
    pub absorb_condition: AbsorbCondition,
}

impl ScreenComponent {
    /// Label used for visited-set bookkeeping: the tap target's text.
    pub fn label(&self) -> Option<&str> {
        self.tap_target.as_ref().map(|t| t.text.as_str())
    }
}
