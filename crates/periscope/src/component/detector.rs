//! Component detection over classified rows

use super::scoring::{score_definition, RowProperties};
use super::{AbsorbCondition, ClickResult, ComponentDefinition, ScreenComponent, Zone};
use crate::classifier::group_rows;
use crate::types::{ClassifiedElement, ElementRole, TapPoint, WindowSize};
use tracing::trace;

/// Matches rows of classified elements against a definition catalog.
///
/// The detector holds an immutable catalog loaded at session start; an empty
/// catalog makes `detect` return per-element fallback components only.
#[derive(Debug, Clone)]
pub struct ComponentDetector {
    catalog: Vec<ComponentDefinition>,
}

impl ComponentDetector {
    pub fn new(catalog: Vec<ComponentDefinition>) -> Self {
        Self { catalog }
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Detect components on one screen.
    ///
    /// Rows are scored against every definition; the highest score wins.
    /// Unmatched rows fall back to one component per element. A trailing
    /// absorption pass lets components swallow rows below them (subtitles,
    /// captions) within their declared range.
    pub fn detect(
        &self,
        classified: &[ClassifiedElement],
        window: &WindowSize,
    ) -> Vec<ScreenComponent> {
        let rows = group_rows(classified.to_vec(), |e| e.element.tap_y);
        let mut components = Vec::new();

        for row in rows {
            let props = RowProperties::from_row(&row, window);
            let best = self
                .catalog
                .iter()
                .filter_map(|def| score_definition(def, &props).map(|score| (def, score)))
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            match best {
                Some((def, score)) => {
                    trace!(definition = %def.name, score, "row matched component");
                    components.push(component_from_row(def, row, &props));
                }
                None => {
                    for element in row {
                        components.push(fallback_component(element));
                    }
                }
            }
        }

        absorb_pass(components, window)
    }
}

/// Build a matched component: the tap target is the first navigation-role
/// element, falling back to the leftmost element.
fn component_from_row(
    def: &ComponentDefinition,
    row: Vec<ClassifiedElement>,
    props: &RowProperties,
) -> ScreenComponent {
    let tap_target = if def.clickable {
        row.iter()
            .find(|e| e.role == ElementRole::Navigation)
            .or_else(|| row.first())
            .map(|e| e.element.clone())
    } else {
        None
    };
    ScreenComponent {
        definition_name: def.name.clone(),
        elements: row,
        tap_target,
        y_range: (props.y_min, props.y_max),
        clickable: def.clickable,
        click_result: def.click_result,
        absorbs_below_within_pt: def.absorbs_below_within_pt,
        absorb_condition: def.absorb_condition,
    }
}

fn fallback_component(element: ClassifiedElement) -> ScreenComponent {
    let (clickable, click_result) = match element.role {
        ElementRole::Navigation => (true, ClickResult::Navigates),
        ElementRole::StateChange => (true, ClickResult::Toggles),
        _ => (false, ClickResult::None),
    };
    let tap_target: Option<TapPoint> = clickable.then(|| element.element.clone());
    let y = element.element.tap_y;
    ScreenComponent {
        definition_name: "element".into(),
        elements: vec![element],
        tap_target,
        y_range: (y, y),
        clickable,
        click_result,
        absorbs_below_within_pt: 0.0,
        absorb_condition: AbsorbCondition::Any,
    }
}

/// Post-process: a component with a positive absorb range swallows the
/// components below it whose zone matches and whose elements satisfy the
/// absorb condition.
fn absorb_pass(mut components: Vec<ScreenComponent>, window: &WindowSize) -> Vec<ScreenComponent> {
    components.sort_by(|a, b| {
        a.y_range
            .0
            .partial_cmp(&b.y_range.0)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out: Vec<ScreenComponent> = Vec::with_capacity(components.len());
    let mut absorbed = vec![false; components.len()];

    for i in 0..components.len() {
        if absorbed[i] {
            continue;
        }
        let mut comp = components[i].clone();
        if comp.absorbs_below_within_pt > 0.0 {
            let zone = Zone::of(comp.y_range.0, window);
            for (j, candidate) in components.iter().enumerate().skip(i + 1) {
                if absorbed[j] {
                    continue;
                }
                if candidate.y_range.0 - comp.y_range.1 > comp.absorbs_below_within_pt {
                    break;
                }
                if Zone::of(candidate.y_range.0, window) != zone {
                    continue;
                }
                if !absorb_condition_holds(comp.absorb_condition, candidate) {
                    continue;
                }
                comp.elements.extend(candidate.elements.iter().cloned());
                comp.y_range.1 = comp.y_range.1.max(candidate.y_range.1);
                absorbed[j] = true;
            }
        }
        out.push(comp);
    }
    out
}

fn absorb_condition_holds(condition: AbsorbCondition, candidate: &ScreenComponent) -> bool {
    match condition {
        AbsorbCondition::Any => true,
        AbsorbCondition::InfoOrDecorationOnly => candidate
            .elements
            .iter()
            .all(|e| matches!(e.role, ElementRole::Info | ElementRole::Decoration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ExplorationBudget;
    use crate::classifier::ElementClassifier;
    use crate::component::builtin_catalog;

    fn classify(elements: Vec<TapPoint>) -> Vec<ClassifiedElement> {
        ElementClassifier::default().classify(
            &elements,
            &WindowSize::new(390.0, 844.0),
            &ExplorationBudget::default(),
        )
    }

    #[test]
    fn test_disclosure_row_detected() {
        let detector = ComponentDetector::new(builtin_catalog());
        let classified = classify(vec![
            TapPoint::new("General", 50.0, 300.0),
            TapPoint::new(">", 380.0, 300.0),
        ]);
        let components = detector.detect(&classified, &WindowSize::new(390.0, 844.0));
        let row = components
            .iter()
            .find(|c| c.definition_name == "table-row-disclosure")
            .expect("disclosure row");
        assert!(row.clickable);
        assert_eq!(row.click_result, ClickResult::Navigates);
        assert_eq!(row.label(), Some("General"));
    }

    #[test]
    fn test_empty_catalog_falls_back_to_elements() {
        let detector = ComponentDetector::new(Vec::new());
        let classified = classify(vec![TapPoint::new("General", 50.0, 300.0)]);
        let components = detector.detect(&classified, &WindowSize::new(390.0, 844.0));
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].definition_name, "element");
        assert!(components[0].clickable);
    }

    #[test]
    fn test_subtitle_absorbed_into_disclosure_row() {
        let detector = ComponentDetector::new(builtin_catalog());
        let classified = classify(vec![
            TapPoint::new("Privacy", 50.0, 300.0),
            TapPoint::new(">", 380.0, 300.0),
            // Subtitle 18pt below, sentence-like so it classifies as info
            TapPoint::new("Location, tracking, and app permissions", 50.0, 318.0),
        ]);
        let components = detector.detect(&classified, &WindowSize::new(390.0, 844.0));
        let row = components
            .iter()
            .find(|c| c.definition_name == "table-row-disclosure")
            .expect("disclosure row");
        assert_eq!(row.elements.len(), 3);
        assert!(!components
            .iter()
            .any(|c| c.definition_name == "element" && c.elements[0].text().starts_with("Location")));
    }

    #[test]
    fn test_tab_bar_items() {
        let detector = ComponentDetector::new(builtin_catalog());
        let classified = classify(vec![
            TapPoint::new("Home", 60.0, 810.0),
            TapPoint::new("Search", 190.0, 810.0),
            TapPoint::new("Profile", 320.0, 810.0),
        ]);
        let components = detector.detect(&classified, &WindowSize::new(390.0, 844.0));
        assert!(components
            .iter()
            .any(|c| c.definition_name == "tab-bar-item"));
    }
}
