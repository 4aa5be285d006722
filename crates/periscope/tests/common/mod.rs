//! Shared fake device for integration tests
//!
//! Models a tiny settings-style app: screens are element lists, taps move
//! between them, and an optional permission alert fronts the first capture.

use async_trait::async_trait;
use periscope::boundary::derive_hints;
use periscope::{
    InputProvider, KeyModifier, Result, ScreenDescriber, ScreenDescription, TapPoint,
    TypeTextResult, WindowSize,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const WINDOW: WindowSize = WindowSize {
    width: 390.0,
    height: 844.0,
};

/// Install a subscriber once so `RUST_LOG=debug cargo test` shows the
/// exploration trace.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

const TAP_TOLERANCE: f64 = 20.0;
const BACK_CHEVRONS: [char; 3] = ['<', '\u{2039}', '\u{276E}'];

pub struct FakeScreen {
    pub elements: Vec<TapPoint>,
    pub parent: Option<&'static str>,
    /// tapped element text -> destination screen
    pub nav: Vec<(&'static str, &'static str)>,
}

struct DeviceState {
    screens: HashMap<&'static str, FakeScreen>,
    current: &'static str,
    alert_pending: bool,
    taps: Vec<(f64, f64)>,
    visited_screens: Vec<&'static str>,
}

/// In-memory device mirroring: one struct implements both describer and
/// input provider.
pub struct FakeDevice {
    inner: Mutex<DeviceState>,
}

fn row(label: &str, y: f64) -> Vec<TapPoint> {
    vec![
        TapPoint::new(label, 50.0, y),
        TapPoint::new(">", 380.0, y),
    ]
}

impl FakeDevice {
    /// The fixture app:
    ///
    /// ```text
    /// root ── General ── About
    ///   │        └────── Software Update
    ///   └── Privacy ──── Location Services
    /// ```
    pub fn settings_app(with_alert: bool) -> Arc<Self> {
        let mut screens = HashMap::new();

        let mut root = vec![TapPoint::new("Settings", 160.0, 120.0)];
        root.extend(row("General", 250.0));
        root.extend(row("Privacy", 320.0));
        root.push(TapPoint::new("Erase All Content", 50.0, 620.0));
        screens.insert(
            "root",
            FakeScreen {
                elements: root,
                parent: None,
                nav: vec![("General", "general"), ("Privacy", "privacy")],
            },
        );

        let mut general = vec![
            TapPoint::new("<", 30.0, 110.0),
            TapPoint::new("General", 160.0, 110.0),
        ];
        general.extend(row("About", 250.0));
        general.extend(row("Software Update", 320.0));
        screens.insert(
            "general",
            FakeScreen {
                elements: general,
                parent: Some("root"),
                nav: vec![("About", "about"), ("Software Update", "update")],
            },
        );

        screens.insert(
            "privacy",
            FakeScreen {
                elements: {
                    let mut v = vec![
                        TapPoint::new("<", 30.0, 110.0),
                        TapPoint::new("Privacy", 160.0, 110.0),
                    ];
                    v.extend(row("Location Services", 250.0));
                    v
                },
                parent: Some("root"),
                nav: vec![("Location Services", "location")],
            },
        );

        screens.insert(
            "about",
            FakeScreen {
                elements: vec![
                    TapPoint::new("<", 30.0, 110.0),
                    TapPoint::new("About", 160.0, 110.0),
                    TapPoint::new("14.2 GB", 300.0, 250.0),
                    TapPoint::new("Model Name iPhone", 50.0, 320.0),
                ],
                parent: Some("general"),
                nav: vec![],
            },
        );

        screens.insert(
            "update",
            FakeScreen {
                elements: vec![
                    TapPoint::new("<", 30.0, 110.0),
                    TapPoint::new("Software Update", 160.0, 110.0),
                    TapPoint::new("Your software is up to date", 195.0, 400.0),
                ],
                parent: Some("general"),
                nav: vec![],
            },
        );

        screens.insert(
            "location",
            FakeScreen {
                elements: vec![
                    TapPoint::new("<", 30.0, 110.0),
                    TapPoint::new("Location Services", 160.0, 110.0),
                    TapPoint::new("While Using the App", 50.0, 300.0),
                    TapPoint::new("On", 340.0, 300.0),
                ],
                parent: Some("privacy"),
                nav: vec![],
            },
        );

        Arc::new(Self {
            inner: Mutex::new(DeviceState {
                screens,
                current: "root",
                alert_pending: with_alert,
                taps: Vec::new(),
                visited_screens: vec!["root"],
            }),
        })
    }

    pub fn tap_log(&self) -> Vec<(f64, f64)> {
        self.inner.lock().unwrap().taps.clone()
    }

    pub fn visited_screens(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().visited_screens.clone()
    }

    pub fn current_screen(&self) -> &'static str {
        self.inner.lock().unwrap().current
    }

    fn alert_elements() -> Vec<TapPoint> {
        vec![
            TapPoint::new(
                "\u{201C}Settings\u{201D} would like to send notifications",
                195.0,
                400.0,
            ),
            TapPoint::new("Don't Allow", 120.0, 480.0),
            TapPoint::new("Allow", 270.0, 480.0),
        ]
    }
}

fn nearest_text(elements: &[TapPoint], x: f64, y: f64) -> Option<String> {
    elements
        .iter()
        .map(|e| {
            let d = ((e.tap_x - x).powi(2) + (e.tap_y - y).powi(2)).sqrt();
            (d, e.text.clone())
        })
        .filter(|(d, _)| *d <= TAP_TOLERANCE)
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
        .map(|(_, text)| text)
}

fn is_back_text(text: &str) -> bool {
    let mut chars = text.trim().chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(c), None) if BACK_CHEVRONS.contains(&c)
    )
}

#[async_trait]
impl ScreenDescriber for FakeDevice {
    async fn describe(&self) -> Result<ScreenDescription> {
        let state = self.inner.lock().unwrap();
        let elements = if state.alert_pending {
            Self::alert_elements()
        } else {
            state.screens[state.current].elements.clone()
        };
        Ok(ScreenDescription {
            hints: derive_hints(&elements, &WINDOW),
            elements,
            icons: Vec::new(),
            screenshot_base64: None,
        })
    }
}

#[async_trait]
impl InputProvider for FakeDevice {
    async fn tap(&self, x: f64, y: f64) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.taps.push((x, y));

        if state.alert_pending {
            if let Some(text) = nearest_text(&Self::alert_elements(), x, y) {
                if text == "Don't Allow" || text == "Allow" {
                    state.alert_pending = false;
                }
            }
            return Ok(());
        }

        let screen = &state.screens[state.current];
        let tapped = nearest_text(&screen.elements, x, y);
        let destination = match &tapped {
            Some(text) if is_back_text(text) => screen.parent,
            Some(text) => screen
                .nav
                .iter()
                .find(|(label, _)| label == text)
                .map(|(_, dest)| *dest),
            // Canonical back position with no element under it
            None if (x - WINDOW.width * 0.112).abs() < TAP_TOLERANCE
                && (y - WINDOW.height * 0.135).abs() < TAP_TOLERANCE =>
            {
                screen.parent
            }
            None => None,
        };
        if let Some(dest) = destination {
            state.current = dest;
            state.visited_screens.push(dest);
        }
        Ok(())
    }

    async fn swipe(&self, _: f64, _: f64, _: f64, _: f64, _: u64) -> Result<()> {
        Ok(())
    }

    async fn drag(&self, _: f64, _: f64, _: f64, _: f64, _: u64) -> Result<()> {
        Ok(())
    }

    async fn long_press(&self, _: f64, _: f64, _: u64) -> Result<()> {
        Ok(())
    }

    async fn double_tap(&self, _: f64, _: f64) -> Result<()> {
        Ok(())
    }

    async fn shake(&self) -> Result<()> {
        Ok(())
    }

    async fn type_text(&self, _: &str) -> Result<TypeTextResult> {
        Ok(TypeTextResult {
            success: true,
            warning: None,
            error: None,
        })
    }

    async fn press_key(&self, _: &str, _: &[KeyModifier]) -> Result<()> {
        Ok(())
    }

    async fn launch_app(&self, _: &str) -> Result<()> {
        Ok(())
    }

    async fn open_url(&self, _: &str) -> Result<()> {
        Ok(())
    }
}
