//! Skill synthesis
//!
//! Turns a graph snapshot into one or more step scripts plus a manifest.
//! Deep leaf screens yield one skill per reconstructed path; a graph without
//! at least two interesting paths falls back to a single skill generated
//! from the flat screen log.

mod bundle;
mod path_finder;
mod step_formatter;

pub use bundle::{sanitize_filename, Skill, SkillBundle};
pub use path_finder::{find_paths, NamedPath};
pub use step_formatter::{ActionStepFormatter, SkillStep};

use crate::graph::GraphSnapshot;
use crate::session::ScreenRecord;
use crate::types::ActionType;
use tracing::{debug, instrument};

/// One screen along a realized path.
#[derive(Debug, Clone)]
pub struct ExploredScreen {
    pub fingerprint: String,
    /// How this screen was reached; the first screen has neither
    pub action: Option<ActionType>,
    pub element_text: Option<String>,
}

/// Graph snapshot in, skill bundle out.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillSynthesizer;

impl SkillSynthesizer {
    /// Synthesize the bundle for one finalized goal.
    #[instrument(skip_all, fields(app = app_name, goal))]
    pub fn synthesize(
        &self,
        snapshot: &GraphSnapshot,
        screen_log: &[ScreenRecord],
        app_name: &str,
        goal: &str,
    ) -> SkillBundle {
        let paths = find_paths(snapshot);
        debug!(paths = paths.len(), "paths reconstructed");

        let skills: Vec<Skill> = if paths.len() >= 2 {
            paths
                .iter()
                .map(|path| {
                    let screens = realize_path(snapshot, path);
                    bundle::skill_from_steps(&path.name, app_name, steps_for_screens(app_name, &screens))
                })
                .collect()
        } else {
            let name = format!("{app_name} — {goal}");
            let steps = steps_for_log(app_name, screen_log);
            vec![bundle::skill_from_steps(&name, app_name, steps)]
        };

        bundle::generate(app_name, goal, skills)
    }
}

/// Convert a path into its ordered screen sequence: the root first, then the
/// destination of each edge with the action that reached it.
fn realize_path(snapshot: &GraphSnapshot, path: &NamedPath) -> Vec<ExploredScreen> {
    let mut screens = Vec::with_capacity(path.edges.len() + 1);
    if let Some(root) = &snapshot.root {
        screens.push(ExploredScreen {
            fingerprint: root.clone(),
            action: None,
            element_text: None,
        });
    }
    for edge in &path.edges {
        screens.push(ExploredScreen {
            fingerprint: edge.to.clone(),
            action: Some(edge.action),
            element_text: Some(edge.element_text.clone()),
        });
    }
    screens
}

/// Steps for a realized path: launch, then one step per entered screen.
fn steps_for_screens(app_name: &str, screens: &[ExploredScreen]) -> Vec<SkillStep> {
    let mut steps = vec![SkillStep::Launch(app_name.to_string())];
    for screen in screens.iter().skip(1) {
        steps.push(ActionStepFormatter::step(
            screen.action,
            screen.element_text.as_deref(),
        ));
    }
    steps
}

/// Fallback: steps straight from the flat screen log.
fn steps_for_log(app_name: &str, screen_log: &[ScreenRecord]) -> Vec<SkillStep> {
    let mut steps = vec![SkillStep::Launch(app_name.to_string())];
    for record in screen_log.iter().skip(1) {
        steps.push(ActionStepFormatter::step(
            record.arrived_action,
            record.arrived_via.as_deref(),
        ));
    }
    steps
}
