//! Autonomous UI exploration of a mirrored mobile app
//!
//! Periscope drives a mirrored device surface screen by screen: it
//! fingerprints screens from OCR output, classifies elements, plans which
//! one to tap next, walks the app breadth-first with replayable paths from
//! the root, and synthesizes the discovered graph into reusable skill
//! documents.
//!
//! The device itself stays behind boundary traits ([`boundary`]): the host
//! supplies window discovery, screenshot capture, OCR and input synthesis;
//! the core owns everything from the pixel text up.

use tracing::instrument;

pub mod alert;
pub mod boundary;
pub mod budget;
pub mod classifier;
pub mod clock;
pub mod component;
pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod graph;
pub mod log;
pub mod planner;
pub mod screenshot;
pub mod service;
pub mod session;
pub mod strategy;
pub mod synthesizer;
pub mod traversal;
pub mod types;

pub use boundary::{
    ComposedDescriber, CompositeRecognizer, ContentBounds, IconDetector, InputProvider,
    ProcessHandle, ScreenCapture, ScreenDescriber, TextRecognizer, WindowBridge,
};
pub use budget::ExplorationBudget;
pub use classifier::ElementClassifier;
pub use clock::{Clock, SystemClock, VirtualClock};
pub use component::{ComponentDefinition, ComponentDetector, ScreenComponent};
pub use config::ExplorationConfig;
pub use errors::{ExplorationError, Result};
pub use graph::{
    GraphSnapshot, NavigationEdge, NavigationGraph, ScreenNode, ScrollDedup, TransitionOutcome,
};
pub use planner::{PlannedInteraction, ScreenPlanner};
pub use screenshot::{ScreenshotError, ScreenshotResult, DEFAULT_MAX_DIMENSION};
pub use service::{ExplorationService, FinalizeResponse, SessionStats, StartRequest};
pub use session::{ExplorationMode, ExplorationSession, FinalizedGoal};
pub use strategy::{BacktrackMethod, DetectionContext, Strategy, StrategyDetector};
pub use synthesizer::{sanitize_filename, Skill, SkillBundle, SkillStep, SkillSynthesizer};
pub use tokio_util::sync::CancellationToken;
pub use traversal::{Explorer, FrontierScreen, PathSegment, StepOutcome};
pub use types::{
    ActionType, BridgeState, ClassifiedElement, ElementRole, IconBox, KeyModifier,
    NavigationHints, Orientation, RawTextElement, ScreenDescription, ScreenType, TapPoint,
    TypeTextResult, WindowInfo, WindowSize,
};

/// Convenience entry point: detect the strategy, start a session and build
/// an explorer over the supplied boundary implementations.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(describer, input, clock, catalog))]
pub fn begin_exploration(
    app_name: &str,
    goal: Option<String>,
    goals: Option<Vec<String>>,
    describer: std::sync::Arc<dyn ScreenDescriber>,
    input: std::sync::Arc<dyn InputProvider>,
    clock: std::sync::Arc<dyn Clock>,
    budget: ExplorationBudget,
    config: ExplorationConfig,
    catalog: Vec<ComponentDefinition>,
    window: WindowSize,
) -> (std::sync::Arc<ExplorationSession>, Explorer) {
    let strategy = StrategyDetector.detect(&DetectionContext {
        explicit: config.strategy.as_deref(),
        app_name,
        ..Default::default()
    });
    let session = std::sync::Arc::new(ExplorationSession::start(app_name, goal, goals, strategy));
    let explorer = Explorer::new(
        std::sync::Arc::clone(&session),
        describer,
        input,
        clock,
        budget,
        config,
        catalog,
        window,
    );
    (session, explorer)
}
