//! Operation surface for the request transport
//!
//! The core exposes a small set of named operations; the line-delimited
//! request loop, its JSON framing and the CLI all live in the host process.
//! Everything here is typed requests and responses plus the service that
//! owns the live session and explorer.

use crate::boundary::{InputProvider, ScreenDescriber, WindowBridge};
use crate::budget::ExplorationBudget;
use crate::clock::Clock;
use crate::component::ComponentDefinition;
use crate::config::ExplorationConfig;
use crate::errors::{ExplorationError, Result};
use crate::session::{ExplorationMode, ExplorationSession};
use crate::strategy::{DetectionContext, StrategyDetector};
use crate::synthesizer::SkillBundle;
use crate::traversal::{Explorer, StepOutcome};
use crate::types::WindowSize;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Start-exploration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

/// Live counters for status and stats queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub action_count: usize,
    pub elapsed_seconds: u64,
    pub mode: ExplorationMode,
    pub current_goal: String,
}

/// Finalize response: the bundle plus whether queued goals remain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    pub bundle: SkillBundle,
    pub remaining_goals: usize,
    pub active: bool,
}

struct ActiveRun {
    session: Arc<ExplorationSession>,
    explorer: Explorer,
}

/// Owns one exploration run at a time and maps the transport's named
/// operations onto it.
pub struct ExplorationService {
    describer: Arc<dyn ScreenDescriber>,
    input: Arc<dyn InputProvider>,
    clock: Arc<dyn Clock>,
    window: WindowSize,
    bridge: Option<Arc<dyn WindowBridge>>,
    catalog: Vec<ComponentDefinition>,
    budget: ExplorationBudget,
    config: ExplorationConfig,
    run: Option<ActiveRun>,
}

impl ExplorationService {
    pub fn new(
        describer: Arc<dyn ScreenDescriber>,
        input: Arc<dyn InputProvider>,
        clock: Arc<dyn Clock>,
        window: WindowSize,
    ) -> Self {
        Self {
            describer,
            input,
            clock,
            window,
            bridge: None,
            catalog: Vec::new(),
            budget: ExplorationBudget::default(),
            config: ExplorationConfig::default(),
            run: None,
        }
    }

    /// Attach a window bridge; `start` will activate the mirrored window and
    /// refresh the window geometry through it.
    pub fn with_bridge(mut self, bridge: Arc<dyn WindowBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<ComponentDefinition>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_budget(mut self, budget: ExplorationBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_config(mut self, config: ExplorationConfig) -> Self {
        self.config = config;
        self
    }

    /// Start a new exploration, replacing any previous run. With a bridge
    /// attached, the mirrored window is activated and its geometry refreshed
    /// first.
    #[instrument(skip(self))]
    pub async fn start(&mut self, request: StartRequest) -> Result<()> {
        // First start wins; the debug log path is never revised afterwards
        crate::log::init(self.config.debug_log.as_deref());
        if let Some(bridge) = &self.bridge {
            bridge.activate().await?;
            if let Some(info) = bridge.window_info().await {
                self.window = info.size();
            }
        }
        let strategy = StrategyDetector.detect(&DetectionContext {
            explicit: self.config.strategy.as_deref(),
            target_type: request.target_type.as_deref(),
            bundle_id: request.bundle_id.as_deref(),
            app_name: &request.app_name,
        });
        info!(app = %request.app_name, ?strategy, "starting exploration");
        let session = Arc::new(ExplorationSession::start(
            &request.app_name,
            request.goal,
            request.goals,
            strategy,
        ));
        let explorer = self.build_explorer(Arc::clone(&session));
        self.run = Some(ActiveRun { session, explorer });
        Ok(())
    }

    fn build_explorer(&self, session: Arc<ExplorationSession>) -> Explorer {
        Explorer::new(
            session,
            Arc::clone(&self.describer),
            Arc::clone(&self.input),
            Arc::clone(&self.clock),
            self.budget.clone(),
            self.config.clone(),
            self.catalog.clone(),
            self.window,
        )
    }

    fn run_mut(&mut self) -> Result<&mut ActiveRun> {
        self.run
            .as_mut()
            .ok_or_else(|| ExplorationError::Session("no exploration started".into()))
    }

    fn run_ref(&self) -> Result<&ActiveRun> {
        self.run
            .as_ref()
            .ok_or_else(|| ExplorationError::Session("no exploration started".into()))
    }

    /// Advance by one tick. When a goal finishes with more goals queued, the
    /// next step starts the next goal on the same session.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let outcome = {
            let run = self.run_mut()?;
            run.explorer.step().await?
        };
        if matches!(&outcome, StepOutcome::Finished { .. }) {
            let (still_active, session) = {
                let run = self.run_ref()?;
                (run.session.is_active()?, Arc::clone(&run.session))
            };
            if still_active {
                info!("goal finished, re-arming explorer for the next goal");
                let explorer = self.build_explorer(session);
                if let Some(run) = self.run.as_mut() {
                    run.explorer = explorer;
                }
            }
        }
        Ok(outcome)
    }

    /// Live counters.
    pub fn status(&self) -> Result<SessionStats> {
        let run = self.run_ref()?;
        let graph = run.session.graph();
        Ok(SessionStats {
            node_count: graph.node_count()?,
            edge_count: graph.edge_count()?,
            action_count: run.session.action_log()?.len(),
            elapsed_seconds: run.explorer.elapsed_seconds(),
            mode: run.session.mode()?,
            current_goal: run.session.current_goal()?,
        })
    }

    /// End the current goal now and return its bundle.
    pub async fn finalize(&mut self) -> Result<FinalizeResponse> {
        let bundle = {
            let run = self.run_mut()?;
            run.explorer.finalize().await?
        };
        let run = self.run_ref()?;
        let active = run.session.is_active()?;
        let remaining_goals = if active {
            run.session.remaining_goals()? + 1
        } else {
            0
        };
        if active {
            let session = Arc::clone(&run.session);
            let explorer = self.build_explorer(session);
            if let Some(run) = self.run.as_mut() {
                run.explorer = explorer;
            }
        }
        Ok(FinalizeResponse {
            bundle,
            remaining_goals,
            active,
        })
    }

    /// Stop the run at the next tick boundary.
    pub fn cancel(&self) -> Result<()> {
        let run = self.run_ref()?;
        run.explorer.cancellation_token().cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_request_wire_shape() {
        let request: StartRequest = serde_json::from_str(
            r#"{"appName": "Settings", "goals": ["Wi-Fi", "Bluetooth"]}"#,
        )
        .unwrap();
        assert_eq!(request.app_name, "Settings");
        assert_eq!(request.goals.as_deref().unwrap().len(), 2);
        assert!(request.goal.is_none());
    }

    #[test]
    fn test_step_outcome_wire_shape() {
        let outcome = StepOutcome::Paused {
            reason: "no elements".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "paused");
        assert_eq!(json["reason"], "no elements");

        let backtracked: StepOutcome = serde_json::from_value(serde_json::json!({
            "status": "backtracked",
            "from": "aa",
            "to": "bb",
        }))
        .unwrap();
        assert!(matches!(backtracked, StepOutcome::Backtracked { .. }));
    }
}
