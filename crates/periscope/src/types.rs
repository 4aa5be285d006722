//! Common types shared across the exploration core

use serde::{Deserialize, Serialize};

/// An OCR-detected text element with its tap point.
///
/// Coordinates are window points with origin top-left, matching the mirrored
/// window's logical point grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapPoint {
    pub text: String,
    pub tap_x: f64,
    pub tap_y: f64,
    /// Recognizer confidence in 0..=1
    pub confidence: f64,
}

impl TapPoint {
    pub fn new(text: impl Into<String>, tap_x: f64, tap_y: f64) -> Self {
        Self {
            text: text.into(),
            tap_x,
            tap_y,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Raw recognizer output before tap-point derivation.
///
/// Top and bottom Y are both carried; the tap point is the vertical midpoint,
/// biased toward the associated icon for short labels (see
/// [`crate::boundary::derive_tap_point`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTextElement {
    pub text: String,
    pub tap_x: f64,
    pub top_y: f64,
    pub bottom_y: f64,
    pub width: f64,
    pub confidence: f64,
}

/// Bounding box of a detected icon, window points, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IconBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl IconBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Logical size of the mirrored window in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f64,
    pub height: f64,
}

impl WindowSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True if the point lies inside the window.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x <= self.width && y <= self.height
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        // iPhone mirroring window at default scale
        Self {
            width: 390.0,
            height: 844.0,
        }
    }
}

/// Role assigned to an OCR element by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementRole {
    /// Tapping likely pushes a new screen
    Navigation,
    /// Tapping toggles state in place (switches, segmented controls)
    StateChange,
    /// Read-only value or descriptive copy
    Info,
    /// Matches a skip pattern; never interacted with
    Destructive,
    /// Chrome, punctuation, status bar content
    Decoration,
}

/// A [`TapPoint`] augmented with its classified role and row context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedElement {
    pub element: TapPoint,
    pub role: ElementRole,
    /// The element's row contained a ">" disclosure chevron
    pub has_chevron_context: bool,
}

impl ClassifiedElement {
    pub fn text(&self) -> &str {
        &self.element.text
    }
}

/// Coarse structural category of a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenType {
    TabRoot,
    List,
    Detail,
    Modal,
    Settings,
    Unknown,
}

/// Synthesized interaction kind, used on graph edges and in skill steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Launch,
    Tap,
    Type,
    PressKey,
    Swipe,
    ScrollTo,
    LongPress,
    Remember,
    Screenshot,
    AssertVisible,
    AssertNotVisible,
    OpenUrl,
    PressHome,
}

/// Orientation of the mirrored device surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Portrait,
    Landscape,
    Unknown,
}

/// Connection state of the window-discovery bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BridgeState {
    Connected,
    Paused,
    NoWindow,
    NotRunning,
}

/// Cheap derived context the describer attaches to every capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationHints {
    pub window: WindowSize,
    pub orientation: Orientation,
    /// A back chevron found in the top zone of the screen, if any
    pub back_chevron: Option<TapPoint>,
}

impl NavigationHints {
    pub fn new(window: WindowSize) -> Self {
        Self {
            window,
            orientation: Orientation::Portrait,
            back_chevron: None,
        }
    }
}

impl Default for NavigationHints {
    fn default() -> Self {
        Self::new(WindowSize::default())
    }
}

/// One captured view of the mirrored surface: OCR elements, icon boxes,
/// navigation hints and the raw screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenDescription {
    pub elements: Vec<TapPoint>,
    pub icons: Vec<IconBox>,
    pub hints: NavigationHints,
    pub screenshot_base64: Option<String>,
}

impl ScreenDescription {
    pub fn new(elements: Vec<TapPoint>, hints: NavigationHints) -> Self {
        Self {
            elements,
            icons: Vec::new(),
            hints,
            screenshot_base64: None,
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.text.as_str()).collect()
    }
}

/// Keyboard modifiers for `press_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyModifier {
    Shift,
    Command,
    Option,
    Control,
}

/// Result of a `type_text` call; typing may partially succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeTextResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Basic geometry of the mirrored window on the host display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub window_id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WindowInfo {
    pub fn size(&self) -> WindowSize {
        WindowSize::new(self.width, self.height)
    }
}
