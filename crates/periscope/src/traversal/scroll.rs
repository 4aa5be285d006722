//! Scroll-to-reveal

use crate::alert;
use crate::boundary::{InputProvider, ScreenDescriber};
use crate::clock::Clock;
use crate::errors::Result;
use crate::graph::{NavigationGraph, ScrollDedup};
use crate::types::WindowSize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Swipe travel as window-height fractions.
const SCROLL_FROM_FRACTION: f64 = 0.75;
const SCROLL_TO_FRACTION: f64 = 0.25;
const SCROLL_DURATION_MS: u64 = 300;

/// One reveal attempt: swipe up, settle, re-capture, merge novel texts into
/// the node. Returns how many novel elements appeared; the node's scroll
/// count is incremented either way.
#[allow(clippy::too_many_arguments)]
pub async fn scroll_to_reveal(
    input: &Arc<dyn InputProvider>,
    describer: &Arc<dyn ScreenDescriber>,
    clock: &Arc<dyn Clock>,
    graph: &Arc<NavigationGraph>,
    fingerprint: &str,
    window: &WindowSize,
    settle: Duration,
    dedup: ScrollDedup,
) -> Result<usize> {
    let center_x = window.width / 2.0;
    input
        .swipe(
            center_x,
            window.height * SCROLL_FROM_FRACTION,
            center_x,
            window.height * SCROLL_TO_FRACTION,
            SCROLL_DURATION_MS,
        )
        .await?;
    clock.sleep(settle).await;

    let description = alert::describe_dismissing_alerts(describer, input, clock, settle).await?;
    let novel =
        graph.merge_scrolled_elements_with(fingerprint, description.elements, dedup)?;
    graph.increment_scroll_count(fingerprint)?;
    debug!(novel, "scroll attempt finished");
    Ok(novel)
}
