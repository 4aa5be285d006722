//! Boundary interfaces
//!
//! The exploration core never talks to a device directly; it calls out
//! through these traits. The window bridge, input synthesis, screenshot
//! capture and OCR are supplied by the host process.

use crate::classifier::BACK_CHEVRONS;
use crate::errors::{ExplorationError, Result};
use crate::types::{
    BridgeState, IconBox, KeyModifier, NavigationHints, Orientation, RawTextElement,
    ScreenDescription, TapPoint, TypeTextResult, WindowInfo, WindowSize,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A discovered mirroring process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
}

/// Rectangle of the mirrored content inside a larger capture, window points.
/// OCR on a sub-image is compensated by this offset so tap coordinates always
/// refer to the window's logical point grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Discovery and control of the mirrored-device window.
#[async_trait]
pub trait WindowBridge: Send + Sync {
    async fn find_process(&self) -> Option<ProcessHandle>;
    async fn window_info(&self) -> Option<WindowInfo>;
    async fn state(&self) -> BridgeState;
    async fn orientation(&self) -> Orientation;
    async fn activate(&self) -> Result<()>;

    /// Optional: drive a host menu action. Defaults to unsupported.
    async fn trigger_menu_action(&self, _menu: &str, _item: &str) -> Result<bool> {
        Ok(false)
    }

    /// Optional: press the mirroring resume affordance. Defaults to
    /// unsupported.
    async fn press_resume(&self) -> Result<bool> {
        Ok(false)
    }
}

/// Synthesized input. All coordinates are window points, origin top-left.
#[async_trait]
pub trait InputProvider: Send + Sync {
    async fn tap(&self, x: f64, y: f64) -> Result<()>;
    async fn swipe(
        &self,
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
        duration_ms: u64,
    ) -> Result<()>;
    async fn drag(
        &self,
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
        duration_ms: u64,
    ) -> Result<()>;
    async fn long_press(&self, x: f64, y: f64, duration_ms: u64) -> Result<()>;
    async fn double_tap(&self, x: f64, y: f64) -> Result<()>;
    async fn shake(&self) -> Result<()>;
    async fn type_text(&self, text: &str) -> Result<TypeTextResult>;
    async fn press_key(&self, key: &str, modifiers: &[KeyModifier]) -> Result<()>;
    async fn launch_app(&self, name: &str) -> Result<()>;
    async fn open_url(&self, url: &str) -> Result<()>;
}

/// Pixel capture of the mirrored window.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// PNG-encoded capture bytes, or `None` when nothing is on screen.
    async fn capture_data(&self) -> Result<Option<Vec<u8>>>;

    /// Base64 of `capture_data`.
    async fn capture_base64(&self) -> Result<Option<String>> {
        Ok(self
            .capture_data()
            .await?
            .map(|data| general_purpose::STANDARD.encode(data)))
    }
}

/// Optical text recognition over a capture.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize_text(
        &self,
        image: &[u8],
        window: &WindowSize,
        content_bounds: Option<&ContentBounds>,
    ) -> Result<Vec<RawTextElement>>;
}

/// Chains recognizers; the first one returning a non-empty element list
/// wins. Lets a fast engine front a thorough one.
pub struct CompositeRecognizer {
    recognizers: Vec<Arc<dyn TextRecognizer>>,
}

impl CompositeRecognizer {
    pub fn new(recognizers: Vec<Arc<dyn TextRecognizer>>) -> Self {
        Self { recognizers }
    }
}

#[async_trait]
impl TextRecognizer for CompositeRecognizer {
    async fn recognize_text(
        &self,
        image: &[u8],
        window: &WindowSize,
        content_bounds: Option<&ContentBounds>,
    ) -> Result<Vec<RawTextElement>> {
        for recognizer in &self.recognizers {
            let elements = recognizer.recognize_text(image, window, content_bounds).await?;
            if !elements.is_empty() {
                return Ok(elements);
            }
        }
        Ok(Vec::new())
    }
}

/// One-stop capture + recognize + hint derivation.
#[async_trait]
pub trait ScreenDescriber: Send + Sync {
    async fn describe(&self) -> Result<ScreenDescription>;
}

/// Element-bounding-box detection over a capture (icon glyphs without text).
#[async_trait]
pub trait IconDetector: Send + Sync {
    async fn detect_icons(&self, image: &[u8], window: &WindowSize) -> Result<Vec<IconBox>>;
}

/// Default [`ScreenDescriber`]: capture, recognize, detect icon boxes,
/// derive tap points and navigation hints.
pub struct ComposedDescriber {
    capture: Arc<dyn ScreenCapture>,
    recognizer: Arc<dyn TextRecognizer>,
    icon_detector: Option<Arc<dyn IconDetector>>,
    window: WindowSize,
    content_bounds: Option<ContentBounds>,
}

impl ComposedDescriber {
    pub fn new(
        capture: Arc<dyn ScreenCapture>,
        recognizer: Arc<dyn TextRecognizer>,
        window: WindowSize,
    ) -> Self {
        Self {
            capture,
            recognizer,
            icon_detector: None,
            window,
            content_bounds: None,
        }
    }

    pub fn with_content_bounds(mut self, bounds: ContentBounds) -> Self {
        self.content_bounds = Some(bounds);
        self
    }

    pub fn with_icon_detector(mut self, detector: Arc<dyn IconDetector>) -> Self {
        self.icon_detector = Some(detector);
        self
    }
}

#[async_trait]
impl ScreenDescriber for ComposedDescriber {
    async fn describe(&self) -> Result<ScreenDescription> {
        let Some(data) = self.capture.capture_data().await? else {
            return Err(ExplorationError::Transient("no capture available".into()));
        };
        let raw = self
            .recognizer
            .recognize_text(&data, &self.window, self.content_bounds.as_ref())
            .await?;
        let icons = match &self.icon_detector {
            Some(detector) => detector.detect_icons(&data, &self.window).await?,
            None => Vec::new(),
        };
        let elements: Vec<TapPoint> = raw
            .iter()
            .map(|r| derive_tap_point(r, &icons, self.content_bounds.as_ref()))
            .collect();
        debug!(elements = elements.len(), icons = icons.len(), "screen described");
        Ok(ScreenDescription {
            hints: derive_hints(&elements, &self.window),
            elements,
            icons,
            screenshot_base64: Some(general_purpose::STANDARD.encode(&data)),
        })
    }
}

/// Horizontal reach when associating a short label with an icon.
const ICON_ASSOCIATION_PT: f64 = 48.0;
/// Labels at or below this length get icon-biased tap points.
const SHORT_LABEL_LEN: usize = 4;

/// Tap point for a raw element: vertical midpoint, compensated by the
/// content bounds, and biased toward the nearest associated icon for short
/// labels so the tap lands on the tappable glyph rather than bare text.
pub fn derive_tap_point(
    raw: &RawTextElement,
    icons: &[IconBox],
    content_bounds: Option<&ContentBounds>,
) -> TapPoint {
    let (offset_x, offset_y) = content_bounds.map(|b| (b.x, b.y)).unwrap_or((0.0, 0.0));
    let mut tap_x = raw.tap_x + offset_x;
    let mut tap_y = (raw.top_y + raw.bottom_y) / 2.0 + offset_y;

    if raw.text.trim().chars().count() <= SHORT_LABEL_LEN {
        let nearest = icons
            .iter()
            .map(|icon| {
                let (cx, cy) = icon.center();
                let distance = ((cx - tap_x).powi(2) + (cy - tap_y).powi(2)).sqrt();
                (distance, cx, cy)
            })
            .filter(|(d, _, _)| *d <= ICON_ASSOCIATION_PT)
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        if let Some((_, cx, cy)) = nearest {
            tap_x = (tap_x + cx) / 2.0;
            tap_y = (tap_y + cy) / 2.0;
        }
    }

    TapPoint {
        text: raw.text.clone(),
        tap_x,
        tap_y,
        confidence: raw.confidence,
    }
}

/// Top fraction of the window scanned for a back chevron.
pub const BACK_CHEVRON_ZONE_FRACTION: f64 = 0.15;

/// Find a back chevron in the top zone of the screen.
pub fn find_back_chevron(elements: &[TapPoint], window: &WindowSize) -> Option<TapPoint> {
    elements
        .iter()
        .filter(|e| e.tap_y < window.height * BACK_CHEVRON_ZONE_FRACTION)
        .find(|e| {
            let trimmed = e.text.trim();
            let mut chars = trimmed.chars();
            matches!(
                (chars.next(), chars.next()),
                (Some(c), None) if BACK_CHEVRONS.contains(&c)
            )
        })
        .cloned()
}

/// Derive the navigation hints for a capture.
pub fn derive_hints(elements: &[TapPoint], window: &WindowSize) -> NavigationHints {
    NavigationHints {
        window: *window,
        orientation: if window.width > window.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        },
        back_chevron: find_back_chevron(elements, window),
    }
}

/// Reject coordinates outside the window before handing them to the input
/// provider.
pub fn ensure_in_window(x: f64, y: f64, window: &WindowSize) -> Result<()> {
    if window.contains(x, y) {
        Ok(())
    } else {
        Err(ExplorationError::OutOfBounds {
            x,
            y,
            width: window.width,
            height: window.height,
        })
    }
}
