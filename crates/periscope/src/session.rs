//! Exploration session
//!
//! The mutable accumulator covering one exploration run: screen log, action
//! log (including rejected duplicates), flow-start baseline, the graph under
//! construction, and the optional multi-goal queue. All public operations
//! are atomic under one internal mutex; reads return copies.

use crate::errors::{ExplorationError, Result};
use crate::fingerprint;
use crate::graph::{GraphSnapshot, NavigationGraph, TransitionOutcome};
use crate::strategy::Strategy;
use crate::types::{ActionType, IconBox, NavigationHints, TapPoint, WindowSize};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Whether the run chases stated goals or roams freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExplorationMode {
    GoalDriven,
    Discovery,
}

/// One entry in the action log. Rejected duplicate captures are recorded
/// too; they are the source of truth for stuck detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_text: Option<String>,
    pub accepted: bool,
}

/// One entry in the append-only screen log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenRecord {
    pub elements: Vec<TapPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived_action: Option<ActionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived_via: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_base64: Option<String>,
}

/// Result of one capture, with the graph transition when one was recorded.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub accepted: bool,
    pub transition: Option<TransitionOutcome>,
}

/// Everything `finalize` hands back for one goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedGoal {
    pub app_name: String,
    pub goal: String,
    pub screens: Vec<ScreenRecord>,
    pub snapshot: GraphSnapshot,
}

#[derive(Debug)]
struct SessionInner {
    active: bool,
    goals: Vec<String>,
    goal_index: usize,
    mode: ExplorationMode,
    screens: Vec<ScreenRecord>,
    actions: Vec<ActionRecord>,
    baseline: Option<Vec<TapPoint>>,
}

/// Session accumulator. Created by [`ExplorationSession::start`], fed by
/// `capture`, drained by `finalize`.
#[derive(Debug)]
pub struct ExplorationSession {
    id: Uuid,
    app_name: String,
    strategy: Strategy,
    graph: Arc<NavigationGraph>,
    inner: Mutex<SessionInner>,
}

impl ExplorationSession {
    /// Start a session for one goal or an ordered queue of goals. With no
    /// goal at all the session runs in discovery mode.
    #[instrument(skip(goals))]
    pub fn start(
        app_name: &str,
        goal: Option<String>,
        goals: Option<Vec<String>>,
        strategy: Strategy,
    ) -> Self {
        let (goals, mode) = match (goal, goals) {
            (_, Some(queue)) if !queue.is_empty() => (queue, ExplorationMode::GoalDriven),
            (Some(single), _) => (vec![single], ExplorationMode::GoalDriven),
            _ => (
                vec![format!("Explore {app_name}")],
                ExplorationMode::Discovery,
            ),
        };
        let id = Uuid::new_v4();
        info!(%id, app_name, goal_count = goals.len(), ?mode, "session started");
        Self {
            id,
            app_name: app_name.to_string(),
            strategy,
            graph: Arc::new(NavigationGraph::new()),
            inner: Mutex::new(SessionInner {
                active: true,
                goals,
                goal_index: 0,
                mode,
                screens: Vec::new(),
                actions: Vec::new(),
                baseline: None,
            }),
        }
    }

    fn locked<R>(&self, f: impl FnOnce(&mut SessionInner) -> R) -> Result<R> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| ExplorationError::Internal(format!("session lock poisoned: {e}")))?;
        Ok(f(&mut inner))
    }

    /// Record one capture. Returns `false` when the capture is structurally
    /// the previous screen: the rejection still lands in the action log.
    pub fn capture(
        &self,
        elements: Vec<TapPoint>,
        icons: Vec<IconBox>,
        hints: NavigationHints,
        action_type: Option<ActionType>,
        arrived_via: Option<&str>,
        screenshot_base64: Option<String>,
    ) -> Result<bool> {
        self.capture_with_outcome(
            elements,
            icons,
            hints,
            action_type,
            arrived_via,
            screenshot_base64,
        )
        .map(|outcome| outcome.accepted)
    }

    /// [`Self::capture`] plus the graph transition outcome, for callers that
    /// steer the traversal on it.
    #[instrument(skip_all, fields(via = arrived_via.unwrap_or("")))]
    pub fn capture_with_outcome(
        &self,
        elements: Vec<TapPoint>,
        icons: Vec<IconBox>,
        hints: NavigationHints,
        action_type: Option<ActionType>,
        arrived_via: Option<&str>,
        screenshot_base64: Option<String>,
    ) -> Result<CaptureOutcome> {
        let (is_first, duplicate_of_last) = self.locked(|inner| {
            if !inner.active {
                return Err(ExplorationError::Session("capture after finalize".into()));
            }
            let duplicate = inner.screens.last().map(|last| {
                let previous = fingerprint::structural_texts(&last.elements, &hints.window);
                let new = fingerprint::structural_texts(&elements, &hints.window);
                fingerprint::equivalent(&previous, &new)
            });
            Ok((inner.screens.is_empty(), duplicate.unwrap_or(false)))
        })??;

        if duplicate_of_last {
            debug!("rejected duplicate capture");
            self.locked(|inner| {
                inner.actions.push(ActionRecord {
                    action: action_type,
                    element_text: arrived_via.map(str::to_string),
                    accepted: false,
                });
            })?;
            return Ok(CaptureOutcome {
                accepted: false,
                transition: None,
            });
        }

        let screen_type = self.strategy.classify_screen(&elements, &hints);
        let mut transition = None;
        if is_first {
            self.graph.start(
                elements.clone(),
                icons,
                hints,
                screenshot_base64.clone(),
                screen_type,
            )?;
            self.locked(|inner| inner.baseline = Some(elements.clone()))?;
        } else if let (Some(action), Some(via)) = (action_type, arrived_via) {
            let outcome = self.graph.record_transition(
                elements.clone(),
                icons,
                hints,
                screenshot_base64.clone(),
                action,
                via,
                screen_type,
            )?;
            match &outcome {
                TransitionOutcome::Duplicate => {
                    // Structurally the current graph node even though it
                    // differs from the previous log entry; keep the log entry
                    // but the graph is unchanged.
                    debug!("transition collapsed to current node");
                }
                TransitionOutcome::NewScreen(fp) | TransitionOutcome::Revisited(fp) => {
                    debug!(fingerprint = %&fp[..8.min(fp.len())], "transition recorded");
                }
            }
            transition = Some(outcome);
        } else {
            warn!("capture without action context; screen logged, graph unchanged");
        }

        self.locked(|inner| {
            inner.screens.push(ScreenRecord {
                elements,
                arrived_action: action_type,
                arrived_via: arrived_via.map(str::to_string),
                screenshot_base64,
            });
            inner.actions.push(ActionRecord {
                action: action_type,
                element_text: arrived_via.map(str::to_string),
                accepted: true,
            });
        })?;
        Ok(CaptureOutcome {
            accepted: true,
            transition,
        })
    }

    /// Finalize the current goal. Returns its accumulated state; with queued
    /// goals remaining the session advances and stays active, otherwise it
    /// deactivates. Returns `None` once inactive.
    #[instrument(skip(self))]
    pub fn finalize(&self) -> Result<Option<FinalizedGoal>> {
        let snapshot = self.graph.finalize()?;
        let result = self.locked(|inner| {
            if !inner.active {
                return None;
            }
            let goal = inner.goals[inner.goal_index].clone();
            let screens = std::mem::take(&mut inner.screens);
            let finalized = FinalizedGoal {
                app_name: self.app_name.clone(),
                goal,
                screens,
                snapshot,
            };
            if inner.goal_index + 1 < inner.goals.len() {
                inner.goal_index += 1;
                inner.actions.clear();
                inner.baseline = None;
                info!(next_goal = %inner.goals[inner.goal_index], "advancing to next goal");
            } else {
                inner.active = false;
                info!("session deactivated");
            }
            Some(finalized)
        })?;
        if result.is_some() {
            // A fresh goal explores a fresh graph
            if self.is_active()? {
                self.graph.reset()?;
            }
        }
        Ok(result)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn graph(&self) -> Arc<NavigationGraph> {
        Arc::clone(&self.graph)
    }

    pub fn is_active(&self) -> Result<bool> {
        self.locked(|inner| inner.active)
    }

    pub fn mode(&self) -> Result<ExplorationMode> {
        self.locked(|inner| inner.mode)
    }

    pub fn screen_count(&self) -> Result<usize> {
        self.locked(|inner| inner.screens.len())
    }

    pub fn screen_log(&self) -> Result<Vec<ScreenRecord>> {
        self.locked(|inner| inner.screens.clone())
    }

    pub fn action_log(&self) -> Result<Vec<ActionRecord>> {
        self.locked(|inner| inner.actions.clone())
    }

    pub fn current_goal(&self) -> Result<String> {
        self.locked(|inner| inner.goals[inner.goal_index].clone())
    }

    pub fn current_goal_index(&self) -> Result<usize> {
        self.locked(|inner| inner.goal_index)
    }

    pub fn remaining_goals(&self) -> Result<usize> {
        self.locked(|inner| inner.goals.len() - inner.goal_index - 1)
    }

    pub fn flow_baseline(&self) -> Result<Option<Vec<TapPoint>>> {
        self.locked(|inner| inner.baseline.clone())
    }

    /// Flow boundary detection: true when a capture is structurally the
    /// screen the flow started on.
    pub fn is_at_flow_start(&self, elements: &[TapPoint], window: &WindowSize) -> Result<bool> {
        self.locked(|inner| {
            inner.baseline.as_ref().map(|baseline| {
                let start = fingerprint::structural_texts(baseline, window);
                let now = fingerprint::structural_texts(elements, window);
                fingerprint::equivalent(&start, &now)
            })
        })
        .map(|hit| hit.unwrap_or(false))
    }

    /// Stuck when the last `window` actions were all rejected duplicates.
    pub fn is_stuck(&self, window: usize) -> Result<bool> {
        self.locked(|inner| {
            window > 0
                && inner.actions.len() >= window
                && inner.actions[inner.actions.len() - window..]
                    .iter()
                    .all(|a| !a.accepted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WindowSize;

    fn hints() -> NavigationHints {
        NavigationHints::new(WindowSize::new(390.0, 844.0))
    }

    fn elements(texts: &[&str]) -> Vec<TapPoint> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TapPoint::new(*t, 50.0, 200.0 + i as f64 * 40.0))
            .collect()
    }

    fn capture(
        session: &ExplorationSession,
        texts: &[&str],
        action: Option<ActionType>,
        via: Option<&str>,
    ) -> bool {
        session
            .capture(elements(texts), vec![], hints(), action, via, None)
            .unwrap()
    }

    #[test]
    fn test_first_capture_initializes_graph() {
        let session =
            ExplorationSession::start("Settings", Some("Find Wi-Fi".into()), None, Strategy::Mobile);
        assert!(capture(&session, &["Settings", "General", "Privacy"], None, None));
        assert_eq!(session.screen_count().unwrap(), 1);
        assert_eq!(session.graph().node_count().unwrap(), 1);
        assert!(session.flow_baseline().unwrap().is_some());
    }

    #[test]
    fn test_duplicate_capture_rejected() {
        let session =
            ExplorationSession::start("Settings", Some("goal".into()), None, Strategy::Mobile);
        assert!(capture(&session, &["Settings", "General", "Privacy"], None, None));
        let accepted = capture(
            &session,
            &["Settings", "General", "Privacy"],
            Some(ActionType::Tap),
            Some("General"),
        );
        assert!(!accepted);
        assert_eq!(session.screen_count().unwrap(), 1);
        let log = session.action_log().unwrap();
        assert_eq!(log.len(), 2);
        assert!(!log[1].accepted);
    }

    #[test]
    fn test_transition_recorded() {
        let session =
            ExplorationSession::start("Settings", Some("goal".into()), None, Strategy::Mobile);
        capture(&session, &["Settings", "General", "Privacy"], None, None);
        let accepted = capture(
            &session,
            &["About", "Software Update", "Storage"],
            Some(ActionType::Tap),
            Some("General"),
        );
        assert!(accepted);
        assert_eq!(session.graph().node_count().unwrap(), 2);
        assert_eq!(session.graph().edge_count().unwrap(), 1);
    }

    #[test]
    fn test_goal_queue_lifecycle() {
        let session = ExplorationSession::start(
            "Settings",
            None,
            Some(vec!["First".into(), "Second".into()]),
            Strategy::Mobile,
        );
        capture(&session, &["Settings", "General"], None, None);

        let first = session.finalize().unwrap().expect("first goal");
        assert_eq!(first.goal, "First");
        assert_eq!(first.screens.len(), 1);
        assert!(session.is_active().unwrap());
        assert_eq!(session.current_goal().unwrap(), "Second");
        assert_eq!(session.remaining_goals().unwrap(), 0);
        assert_eq!(session.screen_count().unwrap(), 0);
        assert_eq!(session.graph().node_count().unwrap(), 0);

        capture(&session, &["Settings", "Privacy"], None, None);
        let second = session.finalize().unwrap().expect("second goal");
        assert_eq!(second.goal, "Second");
        assert!(!session.is_active().unwrap());
        assert!(session.finalize().unwrap().is_none());
    }

    #[test]
    fn test_capture_after_finalize_fails() {
        let session =
            ExplorationSession::start("Settings", Some("goal".into()), None, Strategy::Mobile);
        session.finalize().unwrap();
        let result = session.capture(
            elements(&["Settings"]),
            vec![],
            hints(),
            None,
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_discovery_mode_without_goal() {
        let session = ExplorationSession::start("Maps", None, None, Strategy::Mobile);
        assert_eq!(session.mode().unwrap(), ExplorationMode::Discovery);
        assert_eq!(session.current_goal().unwrap(), "Explore Maps");
    }

    #[test]
    fn test_flow_start_detection() {
        let session =
            ExplorationSession::start("Settings", Some("goal".into()), None, Strategy::Mobile);
        let window = WindowSize::new(390.0, 844.0);
        assert!(!session
            .is_at_flow_start(&elements(&["Settings"]), &window)
            .unwrap());

        capture(&session, &["Settings", "General", "Privacy"], None, None);
        assert!(session
            .is_at_flow_start(&elements(&["Settings", "General", "Privacy"]), &window)
            .unwrap());
        assert!(!session
            .is_at_flow_start(&elements(&["About", "Storage"]), &window)
            .unwrap());
    }

    #[test]
    fn test_stuck_detection() {
        let session =
            ExplorationSession::start("Settings", Some("goal".into()), None, Strategy::Mobile);
        capture(&session, &["Settings", "General", "Privacy"], None, None);
        for _ in 0..3 {
            capture(
                &session,
                &["Settings", "General", "Privacy"],
                Some(ActionType::Tap),
                Some("General"),
            );
        }
        assert!(session.is_stuck(3).unwrap());
        assert!(!session.is_stuck(4).unwrap());
    }
}
