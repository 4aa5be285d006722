//! Step vocabulary and rendering

use crate::types::ActionType;
use serde::{Deserialize, Serialize};

/// The output vocabulary of the synthesizer. Skills are ordered lists of
/// these steps; the runner executing an authored skill consumes the same
/// vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "value", rename_all = "snake_case")]
pub enum SkillStep {
    Launch(String),
    Tap(String),
    Type(String),
    PressKey(String),
    Swipe(String),
    WaitFor(String),
    AssertVisible(String),
    AssertNotVisible(String),
    Screenshot(String),
    Home,
    OpenUrl(String),
    Shake,
    ScrollTo(String),
    LongPress(String),
    Remember(String),
    ResetApp,
    SetNetwork(String),
    Measure(String),
    SwitchTarget(String),
    Skipped(String),
}

impl SkillStep {
    /// Human-readable line for the skill markdown.
    pub fn render(&self) -> String {
        match self {
            SkillStep::Launch(app) => format!("Launch **{app}**"),
            SkillStep::Tap(text) => format!("Tap \"{text}\""),
            SkillStep::Type(text) => format!("Type \"{text}\""),
            SkillStep::PressKey(key) => format!("Press **{key}**"),
            SkillStep::Swipe(text) => format!("swipe: \"{text}\""),
            SkillStep::WaitFor(text) => format!("Wait for \"{text}\""),
            SkillStep::AssertVisible(text) => format!("Verify \"{text}\" is visible"),
            SkillStep::AssertNotVisible(text) => format!("Verify \"{text}\" is not visible"),
            SkillStep::Screenshot(name) => format!("Screenshot: \"{name}\""),
            SkillStep::Home => "Press Home".to_string(),
            SkillStep::OpenUrl(url) => format!("Open URL: {url}"),
            SkillStep::Shake => "Shake".to_string(),
            SkillStep::ScrollTo(text) => format!("Scroll until \"{text}\" is visible"),
            SkillStep::LongPress(text) => format!("long_press: \"{text}\""),
            SkillStep::Remember(text) => format!("Remember: {text}"),
            SkillStep::ResetApp => "Reset app".to_string(),
            SkillStep::SetNetwork(state) => format!("Set network: {state}"),
            SkillStep::Measure(name) => format!("Measure: {name}"),
            SkillStep::SwitchTarget(name) => format!("Switch target: {name}"),
            SkillStep::Skipped(reason) => format!("Skipped: {reason}"),
        }
    }
}

/// Maps a recorded (action, element text) pair onto the step vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStepFormatter;

impl ActionStepFormatter {
    /// An unset action defaults to tap; press-home carries no element text.
    pub fn step(action: Option<ActionType>, arrived_via: Option<&str>) -> SkillStep {
        let text = arrived_via.unwrap_or("").to_string();
        match action {
            Some(ActionType::Launch) => SkillStep::Launch(text),
            Some(ActionType::Tap) | None => SkillStep::Tap(text),
            Some(ActionType::Type) => SkillStep::Type(text),
            Some(ActionType::PressKey) => SkillStep::PressKey(text),
            Some(ActionType::Swipe) => SkillStep::Swipe(text),
            Some(ActionType::ScrollTo) => SkillStep::ScrollTo(text),
            Some(ActionType::LongPress) => SkillStep::LongPress(text),
            Some(ActionType::Remember) => SkillStep::Remember(text),
            Some(ActionType::Screenshot) => SkillStep::Screenshot(text),
            Some(ActionType::AssertVisible) => SkillStep::AssertVisible(text),
            Some(ActionType::AssertNotVisible) => SkillStep::AssertNotVisible(text),
            Some(ActionType::OpenUrl) => SkillStep::OpenUrl(text),
            Some(ActionType::PressHome) => SkillStep::Home,
        }
    }

    /// Rendered line for a recorded pair.
    pub fn format(action: Option<ActionType>, arrived_via: Option<&str>) -> String {
        Self::step(action, arrived_via).render()
    }
}
