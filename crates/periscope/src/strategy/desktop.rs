//! Desktop strategy: sidebars, dialog modals, back keystrokes

use crate::types::{NavigationHints, ScreenType, TapPoint};

/// Elements left of this X belong to a sidebar.
const SIDEBAR_MAX_X: f64 = 200.0;
/// A dialog has few recognizable texts.
const MODAL_MAX_ELEMENTS: usize = 8;

const DISMISS_WORDS: &[&str] = &["close", "done", "cancel", "ok", "x", "✕", "×"];

pub(super) fn classify_screen(elements: &[TapPoint], hints: &NavigationHints) -> ScreenType {
    let sidebar_count = elements.iter().filter(|e| e.tap_x < SIDEBAR_MAX_X).count();
    if sidebar_count >= 3 {
        return ScreenType::TabRoot;
    }
    let has_dismiss = elements
        .iter()
        .any(|e| DISMISS_WORDS.contains(&e.text.trim().to_lowercase().as_str()));
    if has_dismiss && elements.len() < MODAL_MAX_ELEMENTS {
        return ScreenType::Modal;
    }
    if hints.back_chevron.is_some() {
        return ScreenType::Detail;
    }
    ScreenType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WindowSize;

    fn hints() -> NavigationHints {
        NavigationHints::new(WindowSize::new(1280.0, 800.0))
    }

    #[test]
    fn test_sidebar_reads_as_root() {
        let elements = vec![
            TapPoint::new("Inbox", 40.0, 120.0),
            TapPoint::new("Drafts", 40.0, 160.0),
            TapPoint::new("Sent", 40.0, 200.0),
            TapPoint::new("Subject line", 600.0, 120.0),
        ];
        assert_eq!(classify_screen(&elements, &hints()), ScreenType::TabRoot);
    }

    #[test]
    fn test_dialog_is_modal() {
        let elements = vec![
            TapPoint::new("Discard changes?", 640.0, 380.0),
            TapPoint::new("Cancel", 580.0, 440.0),
            TapPoint::new("OK", 700.0, 440.0),
        ];
        assert_eq!(classify_screen(&elements, &hints()), ScreenType::Modal);
    }
}
