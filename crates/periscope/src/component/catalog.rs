//! Component definition catalogs
//!
//! A built-in catalog covers the common mobile patterns; JSON catalogs under
//! the components config directory extend or replace it. Catalogs load once
//! at session start into an immutable vector.

use super::{AbsorbCondition, ChevronMode, ClickResult, ComponentDefinition, Zone};
use crate::errors::Result;
use std::path::Path;
use tracing::{debug, warn};

/// The built-in component definitions.
pub fn builtin_catalog() -> Vec<ComponentDefinition> {
    vec![
        ComponentDefinition {
            name: "dismiss-button".into(),
            zone: Zone::NavBar,
            min_elements: 1,
            max_elements: 1,
            requires_dismiss: true,
            clickable: true,
            click_result: ClickResult::Dismisses,
            ..Default::default()
        },
        ComponentDefinition {
            name: "nav-bar-title".into(),
            zone: Zone::NavBar,
            min_elements: 1,
            max_elements: 2,
            chevron: Some(ChevronMode::Forbidden),
            clickable: false,
            click_result: ClickResult::None,
            ..Default::default()
        },
        ComponentDefinition {
            name: "tab-bar-item".into(),
            zone: Zone::TabBar,
            min_elements: 1,
            max_elements: 5,
            clickable: true,
            click_result: ClickResult::Navigates,
            ..Default::default()
        },
        ComponentDefinition {
            name: "toggle-row".into(),
            zone: Zone::Content,
            min_elements: 2,
            max_elements: 4,
            chevron: Some(ChevronMode::Forbidden),
            text_pattern: Some("(?i)^(on|off)$".into()),
            clickable: true,
            click_result: ClickResult::Toggles,
            ..Default::default()
        },
        ComponentDefinition {
            name: "table-row-disclosure".into(),
            zone: Zone::Content,
            min_elements: 1,
            max_elements: 4,
            chevron: Some(ChevronMode::Required),
            max_row_height_pt: Some(50.0),
            clickable: true,
            click_result: ClickResult::Navigates,
            // Swallow the subtitle line sitting directly under the row
            absorbs_below_within_pt: 20.0,
            absorb_condition: AbsorbCondition::InfoOrDecorationOnly,
            ..Default::default()
        },
        ComponentDefinition {
            name: "value-row".into(),
            zone: Zone::Content,
            min_elements: 2,
            max_elements: 4,
            requires_numeric: true,
            chevron: Some(ChevronMode::Preferred),
            clickable: true,
            click_result: ClickResult::Navigates,
            ..Default::default()
        },
    ]
}

/// Load every `*.json` catalog file in a directory. Each file holds an array
/// of [`ComponentDefinition`]. Missing directory yields an empty catalog;
/// an unreadable file is skipped with a warning.
pub fn load_catalog_dir(dir: &Path) -> Result<Vec<ComponentDefinition>> {
    let mut catalog = Vec::new();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no component catalog directory");
        return Ok(catalog);
    }
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<ComponentDefinition>>(&raw) {
                Ok(mut defs) => {
                    debug!(file = %path.display(), count = defs.len(), "loaded component catalog");
                    catalog.append(&mut defs);
                }
                Err(e) => warn!(file = %path.display(), error = %e, "skipping malformed catalog"),
            },
            Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable catalog"),
        }
    }
    Ok(catalog)
}
