//! Back navigation and landing verification

use crate::alert;
use crate::boundary::{find_back_chevron, InputProvider, ScreenDescriber};
use crate::clock::Clock;
use crate::errors::Result;
use crate::fingerprint;
use crate::graph::NavigationGraph;
use crate::types::{ScreenDescription, TapPoint, WindowSize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Canonical iOS back-button position as window fractions.
pub const CANONICAL_BACK_X_FRACTION: f64 = 0.112;
pub const CANONICAL_BACK_Y_FRACTION: f64 = 0.135;

/// Where a verified backtrack actually landed.
#[derive(Debug, Clone, PartialEq)]
pub enum BacktrackLanding {
    /// The expected parent, possibly after one retry
    Expected,
    /// A different known node; the caller should correct its stack
    Corrected(String),
    /// Nothing matched; the expected parent is trusted anyway
    Unverified,
}

/// Tap whatever goes back on this screen: a back chevron found in the top
/// zone when one is visible, the canonical position otherwise.
pub async fn tap_back(
    input: &Arc<dyn InputProvider>,
    clock: &Arc<dyn Clock>,
    elements: &[TapPoint],
    window: &WindowSize,
    settle: Duration,
) -> Result<()> {
    let target = find_back_chevron(elements, window);
    let (x, y) = match &target {
        Some(chevron) => (chevron.tap_x, chevron.tap_y),
        None => (
            window.width * CANONICAL_BACK_X_FRACTION,
            window.height * CANONICAL_BACK_Y_FRACTION,
        ),
    };
    debug!(x, y, ocr_guided = target.is_some(), "tapping back");
    input.tap(x, y).await?;
    clock.sleep(settle).await;
    Ok(())
}

/// Confirm that a completed back-tap chain landed on the expected node.
///
/// On a structural mismatch the back tap is retried once; if the screen
/// still does not match, the graph is searched for any node equivalent to
/// the capture so the caller can correct its backtrack stack. When nothing
/// matches, the expected parent is trusted and exploration continues.
pub async fn verify_landing(
    describer: &Arc<dyn ScreenDescriber>,
    input: &Arc<dyn InputProvider>,
    clock: &Arc<dyn Clock>,
    graph: &Arc<NavigationGraph>,
    expected_fingerprint: &str,
    settle: Duration,
) -> Result<(BacktrackLanding, ScreenDescription)> {
    let mut description =
        alert::describe_dismissing_alerts(describer, input, clock, settle).await?;

    if matches_node(graph, expected_fingerprint, &description)? {
        return Ok((BacktrackLanding::Expected, description));
    }

    warn!("backtrack landed on an unexpected screen, retrying back tap");
    tap_back(
        input,
        clock,
        &description.elements,
        &description.hints.window,
        settle,
    )
    .await?;
    description = alert::describe_dismissing_alerts(describer, input, clock, settle).await?;
    if matches_node(graph, expected_fingerprint, &description)? {
        return Ok((BacktrackLanding::Expected, description));
    }

    match graph.find_matching_node(&description.elements, &description.hints.window)? {
        Some(actual) => {
            warn!(
                actual = %&actual[..8.min(actual.len())],
                "backtrack corrected to a different known node"
            );
            crate::log::append(&format!(
                "backtrack corrected to {}",
                &actual[..8.min(actual.len())]
            ));
            Ok((BacktrackLanding::Corrected(actual), description))
        }
        None => {
            // Open question: the screen matches nothing we know; trusting
            // the expected parent keeps the traversal moving.
            warn!("backtrack landing unknown, trusting expected parent");
            crate::log::append("backtrack landing unknown, trusting expected parent");
            Ok((BacktrackLanding::Unverified, description))
        }
    }
}

fn matches_node(
    graph: &Arc<NavigationGraph>,
    fingerprint_key: &str,
    description: &ScreenDescription,
) -> Result<bool> {
    let Some(node) = graph.node(fingerprint_key)? else {
        return Ok(false);
    };
    let expected = fingerprint::structural_texts(&node.elements, &node.hints.window);
    let actual =
        fingerprint::structural_texts(&description.elements, &description.hints.window);
    Ok(fingerprint::equivalent(&expected, &actual))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_position() {
        let window = WindowSize::new(390.0, 844.0);
        let x = window.width * CANONICAL_BACK_X_FRACTION;
        let y = window.height * CANONICAL_BACK_Y_FRACTION;
        assert!((x - 43.68).abs() < 0.01);
        assert!((y - 113.94).abs() < 0.01);
    }
}
