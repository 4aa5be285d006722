//! Breadth-first exploration
//!
//! The explorer drives one session tick by tick. Each tick performs at most
//! one planned input, one settling wait and a small number of captures; the
//! outer driver decides when to call [`Explorer::step`] again.
//!
//! Phases: at the root the frontier queue is popped; `navigating` replays a
//! frontier entry's path from the root; `exploring` scouts and works through
//! the per-screen plan; `returning` chains back taps toward the root with a
//! verified landing.

mod backtrack;
mod frontier;
mod scroll;

pub use backtrack::{tap_back, verify_landing, BacktrackLanding};
pub use frontier::{FrontierScreen, PathSegment};
pub use scroll::scroll_to_reveal;

use crate::alert;
use crate::boundary::{ensure_in_window, InputProvider, ScreenDescriber};
use crate::budget::ExplorationBudget;
use crate::classifier::ElementClassifier;
use crate::clock::Clock;
use crate::component::{ComponentDefinition, ComponentDetector};
use crate::config::ExplorationConfig;
use crate::errors::Result;
use crate::fingerprint;
use crate::graph::{ScoutResult, TransitionOutcome, TraversalPhase};
use crate::planner::ScreenPlanner;
use crate::session::ExplorationSession;
use crate::synthesizer::{SkillBundle, SkillSynthesizer};
use crate::types::{ActionType, ClassifiedElement, ScreenDescription, ScreenType, WindowSize};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Depth beyond which a tab-rooted app may chain back taps in one tick.
const FAST_BACKTRACK_MIN_DEPTH: u32 = 2;

/// What one tick did.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Progress was made; keep ticking
    Continue { description: String },
    /// A back chain completed
    Backtracked { from: String, to: String },
    /// A transient failure; the driver may retry on the next tick
    Paused { reason: String },
    /// The run is over and the bundle is final
    Finished { bundle: SkillBundle },
}

#[derive(Debug, Clone)]
enum Phase {
    AtRoot,
    Navigating {
        target: FrontierScreen,
        path_index: usize,
    },
    Exploring {
        screen: FrontierScreen,
    },
    Returning {
        depth_remaining: u32,
    },
}

/// Breadth-first explorer over one session goal.
pub struct Explorer {
    session: Arc<ExplorationSession>,
    describer: Arc<dyn ScreenDescriber>,
    input: Arc<dyn InputProvider>,
    clock: Arc<dyn Clock>,
    budget: ExplorationBudget,
    config: ExplorationConfig,
    detector: ComponentDetector,
    classifier: ElementClassifier,
    planner: ScreenPlanner,
    window: WindowSize,
    frontier: VecDeque<FrontierScreen>,
    phase: Phase,
    actions_on_screen: u32,
    scout_taps_on_screen: u32,
    started_at: Instant,
    cancel: CancellationToken,
    bundle: Option<SkillBundle>,
}

impl Explorer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Arc<ExplorationSession>,
        describer: Arc<dyn ScreenDescriber>,
        input: Arc<dyn InputProvider>,
        clock: Arc<dyn Clock>,
        budget: ExplorationBudget,
        config: ExplorationConfig,
        catalog: Vec<ComponentDefinition>,
        window: WindowSize,
    ) -> Self {
        let started_at = clock.now();
        Self {
            session,
            describer,
            input,
            clock,
            classifier: ElementClassifier::new(config.min_text_len),
            detector: ComponentDetector::new(catalog),
            planner: ScreenPlanner,
            budget,
            config,
            window,
            frontier: VecDeque::new(),
            phase: Phase::AtRoot,
            actions_on_screen: 0,
            scout_taps_on_screen: 0,
            started_at,
            cancel: CancellationToken::new(),
            bundle: None,
        }
    }

    /// Token the host can cancel to end the run at the next tick boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.bundle.is_some()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.now().duration_since(self.started_at).as_secs()
    }

    /// Advance by one tick.
    #[instrument(skip(self))]
    pub async fn step(&mut self) -> Result<StepOutcome> {
        if let Some(bundle) = &self.bundle {
            return Ok(StepOutcome::Finished {
                bundle: bundle.clone(),
            });
        }
        if self.cancel.is_cancelled() {
            let bundle = self.finish("cancelled").await?;
            return Ok(StepOutcome::Finished { bundle });
        }
        if self.elapsed_seconds() >= self.budget.max_seconds {
            let bundle = self.finish("time budget exhausted").await?;
            return Ok(StepOutcome::Finished { bundle });
        }
        if self.session.graph().node_count()? >= self.budget.max_screens {
            let bundle = self.finish("screen budget exhausted").await?;
            return Ok(StepOutcome::Finished { bundle });
        }

        if self.session.graph().root_fingerprint()?.is_none() {
            return self.bootstrap().await;
        }

        match self.phase.clone() {
            Phase::AtRoot => self.tick_at_root().await,
            Phase::Navigating { target, path_index } => {
                self.tick_navigating(target, path_index).await
            }
            Phase::Exploring { screen } => self.tick_exploring(screen).await,
            Phase::Returning { depth_remaining } => self.tick_returning(depth_remaining).await,
        }
    }

    /// First tick: capture the root screen and seed the frontier.
    async fn bootstrap(&mut self) -> Result<StepOutcome> {
        let description = match self.observe().await? {
            Ok(d) => d,
            Err(pause) => return Ok(pause),
        };
        self.session.capture_with_outcome(
            description.elements.clone(),
            description.icons.clone(),
            description.hints.clone(),
            None,
            None,
            description.screenshot_base64.clone(),
        )?;
        let root = self.session.graph().root_fingerprint()?.ok_or_else(|| {
            crate::errors::ExplorationError::Internal("first capture produced no root".into())
        })?;
        self.frontier.push_back(FrontierScreen::root(root.as_str()));
        self.phase = Phase::AtRoot;
        info!(root = %short(&root), "root captured");
        crate::log::append(&format!("root captured {}", short(&root)));
        Ok(StepOutcome::Continue {
            description: "captured root screen".into(),
        })
    }

    async fn tick_at_root(&mut self) -> Result<StepOutcome> {
        let Some(entry) = self.frontier.pop_front() else {
            let bundle = self.finish("frontier exhausted").await?;
            return Ok(StepOutcome::Finished { bundle });
        };
        if entry.path_from_root.is_empty() {
            self.session.graph().set_current_fingerprint(&entry.fingerprint)?;
            self.enter_screen(entry.clone());
            return Ok(StepOutcome::Continue {
                description: "exploring root".into(),
            });
        }
        debug!(target = %short(&entry.fingerprint), depth = entry.depth, "replaying path");
        self.phase = Phase::Navigating {
            target: entry,
            path_index: 0,
        };
        Ok(StepOutcome::Continue {
            description: "navigating to frontier screen".into(),
        })
    }

    async fn tick_navigating(
        &mut self,
        target: FrontierScreen,
        path_index: usize,
    ) -> Result<StepOutcome> {
        let segment = target.path_from_root[path_index].clone();
        if ensure_in_window(segment.tap_x, segment.tap_y, &self.window).is_err() {
            warn!(text = %segment.element_text, "replay segment out of window, skipping entry");
            self.phase = Phase::AtRoot;
            return Ok(StepOutcome::Continue {
                description: "skipped unreachable frontier entry".into(),
            });
        }

        if let Err(pause) = self.tap(segment.tap_x, segment.tap_y).await? {
            return Ok(pause);
        }
        self.clock.sleep(self.config.settle()).await;

        let description = match alert::describe_dismissing_alerts(
            &self.describer,
            &self.input,
            &self.clock,
            self.config.settle(),
        )
        .await
        {
            Ok(d) => d,
            Err(e) if e.is_transient() => {
                // Skip this frontier entry; unwind if the replay had gone deep
                self.phase = if path_index == 0 {
                    Phase::AtRoot
                } else {
                    Phase::Returning {
                        depth_remaining: path_index as u32 + 1,
                    }
                };
                return Ok(StepOutcome::Paused {
                    reason: format!("replay interrupted: {e}"),
                });
            }
            Err(e) => return Err(e),
        };

        if path_index + 1 == target.path_from_root.len() {
            if self.config.replay_verify && !self.replay_landed(&target, &description)? {
                warn!(target = %short(&target.fingerprint), "replay diverged, unwinding");
                self.phase = Phase::Returning {
                    depth_remaining: target.depth,
                };
                return Ok(StepOutcome::Continue {
                    description: "replay diverged from expected screen".into(),
                });
            }
            self.session
                .graph()
                .set_current_fingerprint(&target.fingerprint)?;
            let message = format!("arrived at frontier screen depth {}", target.depth);
            self.enter_screen(target);
            return Ok(StepOutcome::Continue {
                description: message,
            });
        }

        self.phase = Phase::Navigating {
            target,
            path_index: path_index + 1,
        };
        Ok(StepOutcome::Continue {
            description: format!("replayed path segment {}", path_index + 1),
        })
    }

    async fn tick_exploring(&mut self, screen: FrontierScreen) -> Result<StepOutcome> {
        let fingerprint_key = screen.fingerprint.clone();
        let description = match self.observe().await? {
            Ok(d) => d,
            Err(pause) => return Ok(pause),
        };
        let classified =
            self.classifier
                .classify(&description.elements, &self.window, &self.budget);

        let node_phase = self
            .session
            .graph()
            .traversal_phase(&fingerprint_key)?
            .unwrap_or(TraversalPhase::Dive);
        if node_phase == TraversalPhase::Scout {
            return self.tick_scout(&screen, &classified, &description).await;
        }

        if self.actions_on_screen >= self.budget.max_interactions_per_screen {
            return self.scroll_or_finish(&screen).await;
        }

        self.ensure_plan(&fingerprint_key, &classified, &description)?;
        let Some(target) = self.session.graph().next_planned_element(&fingerprint_key)? else {
            return self.scroll_or_finish(&screen).await;
        };

        if self
            .session
            .strategy()
            .should_skip(&target.text, &self.budget)
        {
            self.session
                .graph()
                .mark_element_visited(&fingerprint_key, &target.text)?;
            return Ok(StepOutcome::Continue {
                description: format!("skipped \"{}\"", target.text),
            });
        }

        // Visited before the tap: a planned element is tapped at most once
        self.session
            .graph()
            .mark_element_visited(&fingerprint_key, &target.text)?;

        if ensure_in_window(target.tap_x, target.tap_y, &self.window).is_err() {
            warn!(text = %target.text, "planned tap out of window");
            return Ok(StepOutcome::Continue {
                description: format!("skipped out-of-window \"{}\"", target.text),
            });
        }

        if let Err(pause) = self.tap(target.tap_x, target.tap_y).await? {
            return Ok(pause);
        }
        self.actions_on_screen += 1;
        self.clock.sleep(self.config.settle()).await;

        let after = match self.observe().await? {
            Ok(d) => d,
            Err(pause) => return Ok(pause),
        };
        let outcome = self.session.capture_with_outcome(
            after.elements.clone(),
            after.icons.clone(),
            after.hints.clone(),
            Some(ActionType::Tap),
            Some(&target.text),
            after.screenshot_base64.clone(),
        )?;

        if !outcome.accepted {
            return Ok(StepOutcome::Continue {
                description: format!("tap on \"{}\" changed nothing", target.text),
            });
        }

        match outcome.transition {
            Some(TransitionOutcome::NewScreen(new_fingerprint)) => {
                let new_depth = screen.depth + 1;
                if new_depth < self.budget.max_depth
                    && self.session.graph().node_count()? < self.budget.max_screens
                {
                    self.frontier.push_back(screen.child(
                        new_fingerprint.as_str(),
                        PathSegment::new(target.text.as_str(), target.tap_x, target.tap_y),
                    ));
                    debug!(frontier = self.frontier.len(), "frontier extended");
                }
                self.return_to_screen(&screen, &after).await?;
                Ok(StepOutcome::Backtracked {
                    from: new_fingerprint,
                    to: fingerprint_key,
                })
            }
            Some(TransitionOutcome::Revisited(revisited)) => {
                self.return_to_screen(&screen, &after).await?;
                Ok(StepOutcome::Backtracked {
                    from: revisited,
                    to: fingerprint_key,
                })
            }
            Some(TransitionOutcome::Duplicate) | None => Ok(StepOutcome::Continue {
                description: format!("tap on \"{}\" stayed on screen", target.text),
            }),
        }
    }

    /// Scout phase: probe one plan candidate with a tap and immediate
    /// backtrack, recording whether it navigated.
    async fn tick_scout(
        &mut self,
        screen: &FrontierScreen,
        classified: &[ClassifiedElement],
        description: &ScreenDescription,
    ) -> Result<StepOutcome> {
        let fingerprint_key = screen.fingerprint.clone();
        let graph = self.session.graph();

        if self.scout_taps_on_screen >= self.budget.scout_taps_per_screen {
            graph.set_traversal_phase(&fingerprint_key, TraversalPhase::Dive)?;
            // Rebuild the plan so scout bonuses apply
            graph.clear_screen_plan(&fingerprint_key)?;
            return Ok(StepOutcome::Continue {
                description: "scouting complete".into(),
            });
        }

        self.ensure_plan(&fingerprint_key, classified, description)?;
        let scouted = graph.scout_results(&fingerprint_key)?;
        let node = graph
            .node(&fingerprint_key)?
            .ok_or_else(|| crate::errors::ExplorationError::Internal("node vanished".into()))?;
        let candidate = graph
            .screen_plan(&fingerprint_key)?
            .unwrap_or_default()
            .into_iter()
            .find(|p| {
                !scouted.contains_key(p.text.trim())
                    && !node.visited_elements.contains(p.text.trim())
                    && !self.session.strategy().should_skip(&p.text, &self.budget)
                    && ensure_in_window(p.tap_x, p.tap_y, &self.window).is_ok()
            });
        let Some(candidate) = candidate else {
            graph.set_traversal_phase(&fingerprint_key, TraversalPhase::Dive)?;
            graph.clear_screen_plan(&fingerprint_key)?;
            return Ok(StepOutcome::Continue {
                description: "nothing left to scout".into(),
            });
        };

        if let Err(pause) = self.tap(candidate.tap_x, candidate.tap_y).await? {
            return Ok(pause);
        }
        self.clock.sleep(self.config.settle()).await;
        let after = match self.observe().await? {
            Ok(d) => d,
            Err(pause) => return Ok(pause),
        };

        let before_set = fingerprint::structural_texts(&node.elements, &self.window);
        let after_set = fingerprint::structural_texts(&after.elements, &self.window);
        let result = if fingerprint::equivalent(&before_set, &after_set) {
            ScoutResult::NoChange
        } else {
            // It navigated; come straight back
            tap_back(
                &self.input,
                &self.clock,
                &after.elements,
                &self.window,
                self.config.settle(),
            )
            .await?;
            ScoutResult::Navigated
        };
        graph.record_scout_result(&fingerprint_key, &candidate.text, result)?;
        self.scout_taps_on_screen += 1;
        debug!(text = %candidate.text, ?result, "scouted");
        Ok(StepOutcome::Continue {
            description: format!("scouted \"{}\"", candidate.text),
        })
    }

    async fn tick_returning(&mut self, depth_remaining: u32) -> Result<StepOutcome> {
        let description = match self.observe().await? {
            Ok(d) => d,
            Err(pause) => return Ok(pause),
        };
        tap_back(
            &self.input,
            &self.clock,
            &description.elements,
            &self.window,
            self.config.settle(),
        )
        .await?;

        let remaining = depth_remaining.saturating_sub(1);
        if remaining > 0 {
            self.phase = Phase::Returning {
                depth_remaining: remaining,
            };
            return Ok(StepOutcome::Continue {
                description: format!("returning, {remaining} back taps to go"),
            });
        }

        let graph = self.session.graph();
        let from = graph.current_fingerprint()?.unwrap_or_default();
        let root = graph
            .root_fingerprint()?
            .ok_or_else(|| crate::errors::ExplorationError::Internal("no root".into()))?;
        let (landing, _) = verify_landing(
            &self.describer,
            &self.input,
            &self.clock,
            &graph,
            &root,
            self.config.settle(),
        )
        .await?;
        let to = match landing {
            BacktrackLanding::Expected | BacktrackLanding::Unverified => {
                graph.set_current_fingerprint(&root)?;
                self.phase = Phase::AtRoot;
                root
            }
            BacktrackLanding::Corrected(actual) => {
                graph.set_current_fingerprint(&actual)?;
                let depth = graph.node(&actual)?.map(|n| n.depth).unwrap_or(0);
                self.phase = if depth == 0 {
                    Phase::AtRoot
                } else {
                    Phase::Returning {
                        depth_remaining: depth,
                    }
                };
                actual
            }
        };
        Ok(StepOutcome::Backtracked { from, to })
    }

    /// After a recorded transition away from `screen`, tap back and confirm
    /// we are on `screen` again, correcting the current pointer if not.
    async fn return_to_screen(
        &mut self,
        screen: &FrontierScreen,
        after: &ScreenDescription,
    ) -> Result<()> {
        tap_back(
            &self.input,
            &self.clock,
            &after.elements,
            &self.window,
            self.config.settle(),
        )
        .await?;
        let graph = self.session.graph();
        let (landing, _) = verify_landing(
            &self.describer,
            &self.input,
            &self.clock,
            &graph,
            &screen.fingerprint,
            self.config.settle(),
        )
        .await?;
        match landing {
            BacktrackLanding::Expected | BacktrackLanding::Unverified => {
                graph.set_current_fingerprint(&screen.fingerprint)?;
            }
            BacktrackLanding::Corrected(actual) => {
                graph.set_current_fingerprint(&actual)?;
                let depth = graph.node(&actual)?.map(|n| n.depth).unwrap_or(0);
                self.phase = if depth == 0 {
                    Phase::AtRoot
                } else {
                    Phase::Returning {
                        depth_remaining: depth,
                    }
                };
            }
        }
        Ok(())
    }

    /// No plan target left: scroll for more, or finish the screen.
    async fn scroll_or_finish(&mut self, screen: &FrontierScreen) -> Result<StepOutcome> {
        let fingerprint_key = screen.fingerprint.clone();
        let graph = self.session.graph();

        if graph.scroll_count(&fingerprint_key)? < self.budget.scroll_attempts_per_screen {
            let novel = match scroll_to_reveal(
                &self.input,
                &self.describer,
                &self.clock,
                &graph,
                &fingerprint_key,
                &self.window,
                self.config.settle(),
                self.config.scroll_dedup,
            )
            .await
            {
                Ok(n) => n,
                Err(e) if e.is_transient() => {
                    return Ok(StepOutcome::Paused {
                        reason: e.to_string(),
                    })
                }
                Err(e) => return Err(e),
            };
            if novel > 0 {
                graph.clear_screen_plan(&fingerprint_key)?;
                self.actions_on_screen = 0;
                return Ok(StepOutcome::Continue {
                    description: format!("scroll revealed {novel} new elements"),
                });
            }
            return Ok(StepOutcome::Continue {
                description: "scroll revealed nothing".into(),
            });
        }

        graph.set_traversal_phase(&fingerprint_key, TraversalPhase::Exhausted)?;
        if screen.depth == 0 {
            self.phase = Phase::AtRoot;
            return Ok(StepOutcome::Continue {
                description: "root screen exhausted".into(),
            });
        }

        if screen.depth > FAST_BACKTRACK_MIN_DEPTH && self.fast_backtrack_applies()? {
            return self.fast_backtrack(screen).await;
        }

        self.phase = Phase::Returning {
            depth_remaining: screen.depth,
        };
        Ok(StepOutcome::Continue {
            description: format!("screen exhausted, returning from depth {}", screen.depth),
        })
    }

    /// Fast backtrack: from deep screens of a tab-rooted app with work left
    /// at the root, chain all back taps in one tick.
    async fn fast_backtrack(&mut self, screen: &FrontierScreen) -> Result<StepOutcome> {
        let graph = self.session.graph();
        let from = screen.fingerprint.clone();
        for _ in 0..screen.depth {
            let description = match self.observe().await? {
                Ok(d) => d,
                Err(pause) => return Ok(pause),
            };
            tap_back(
                &self.input,
                &self.clock,
                &description.elements,
                &self.window,
                self.config.settle(),
            )
            .await?;
        }
        let root = graph
            .root_fingerprint()?
            .ok_or_else(|| crate::errors::ExplorationError::Internal("no root".into()))?;
        let (landing, _) = verify_landing(
            &self.describer,
            &self.input,
            &self.clock,
            &graph,
            &root,
            self.config.settle(),
        )
        .await?;
        let to = match landing {
            BacktrackLanding::Expected | BacktrackLanding::Unverified => {
                graph.set_current_fingerprint(&root)?;
                self.phase = Phase::AtRoot;
                root
            }
            BacktrackLanding::Corrected(actual) => {
                graph.set_current_fingerprint(&actual)?;
                let depth = graph.node(&actual)?.map(|n| n.depth).unwrap_or(0);
                self.phase = if depth == 0 {
                    Phase::AtRoot
                } else {
                    Phase::Returning {
                        depth_remaining: depth,
                    }
                };
                actual
            }
        };
        Ok(StepOutcome::Backtracked { from, to })
    }

    fn fast_backtrack_applies(&self) -> Result<bool> {
        let graph = self.session.graph();
        let Some(root) = graph.root_fingerprint()? else {
            return Ok(false);
        };
        let Some(node) = graph.node(&root)? else {
            return Ok(false);
        };
        Ok(node.screen_type == ScreenType::TabRoot && node.unvisited_count() > 0)
    }

    /// Build and cache the per-screen plan when none is cached.
    fn ensure_plan(
        &self,
        fingerprint_key: &str,
        classified: &[ClassifiedElement],
        description: &ScreenDescription,
    ) -> Result<()> {
        let graph = self.session.graph();
        if graph.screen_plan(fingerprint_key)?.is_some() {
            return Ok(());
        }
        let Some(node) = graph.node(fingerprint_key)? else {
            return Ok(());
        };
        let plan = if !self.detector.is_empty() {
            let components = self.detector.detect(classified, &self.window);
            self.planner.plan_components(
                &components,
                &node.visited_elements,
                &node.scout_results,
                &self.window,
            )
        } else {
            self.session.strategy().rank_elements(
                classified,
                &description.icons,
                &node.visited_elements,
                &node.scout_results,
                node.depth,
                node.screen_type,
                &self.window,
            )
        };
        debug!(candidates = plan.len(), "plan cached");
        graph.set_screen_plan(fingerprint_key, plan)
    }

    fn enter_screen(&mut self, screen: FrontierScreen) {
        self.actions_on_screen = 0;
        self.scout_taps_on_screen = 0;
        self.phase = Phase::Exploring { screen };
    }

    /// Replay landed where expected? Structural equivalence, never hash.
    fn replay_landed(
        &self,
        target: &FrontierScreen,
        description: &ScreenDescription,
    ) -> Result<bool> {
        let Some(node) = self.session.graph().node(&target.fingerprint)? else {
            return Ok(false);
        };
        let expected = fingerprint::structural_texts(&node.elements, &node.hints.window);
        let actual = fingerprint::structural_texts(&description.elements, &self.window);
        Ok(fingerprint::equivalent(&expected, &actual))
    }

    /// Capture with alerts dismissed; transient failures become a pause
    /// outcome instead of an error.
    async fn observe(
        &self,
    ) -> Result<std::result::Result<ScreenDescription, StepOutcome>> {
        match alert::describe_dismissing_alerts(
            &self.describer,
            &self.input,
            &self.clock,
            self.config.settle(),
        )
        .await
        {
            Ok(description) if description.elements.is_empty() => Ok(Err(StepOutcome::Paused {
                reason: "capture returned no elements".into(),
            })),
            Ok(description) => Ok(Ok(description)),
            Err(e) if e.is_transient() => Ok(Err(StepOutcome::Paused {
                reason: e.to_string(),
            })),
            Err(e) => Err(e),
        }
    }

    /// One synthesized tap; transient input failures become a pause outcome.
    async fn tap(&self, x: f64, y: f64) -> Result<std::result::Result<(), StepOutcome>> {
        match self.input.tap(x, y).await {
            Ok(()) => Ok(Ok(())),
            Err(e) if e.is_transient() => Ok(Err(StepOutcome::Paused {
                reason: e.to_string(),
            })),
            Err(e) => Err(e),
        }
    }

    /// End the run now and emit the bundle, regardless of remaining work.
    pub async fn finalize(&mut self) -> Result<SkillBundle> {
        if let Some(bundle) = &self.bundle {
            return Ok(bundle.clone());
        }
        self.finish("finalized by caller").await
    }

    /// Finalize the current goal and emit its bundle.
    async fn finish(&mut self, reason: &str) -> Result<SkillBundle> {
        info!(reason, "exploration finished");
        crate::log::append(&format!("exploration finished: {reason}"));
        let bundle = match self.session.finalize()? {
            Some(goal) => SkillSynthesizer.synthesize(
                &goal.snapshot,
                &goal.screens,
                &goal.app_name,
                &goal.goal,
            ),
            None => SkillBundle::empty(self.session.app_name(), ""),
        };
        self.bundle = Some(bundle.clone());
        Ok(bundle)
    }
}

fn short(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(8)]
}
