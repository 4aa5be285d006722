//! Screen graph
//!
//! Nodes are screens keyed by fingerprint; edges are the interactions that
//! moved between them, appended in exploration order. The graph also carries
//! per-screen exploration state: the visited-element set, the cached ranked
//! plan, scroll counts, scout results and the per-screen traversal phase.
//!
//! All operations are atomic under a single internal mutex; callers receive
//! copies, never references into the node map.

use crate::errors::{ExplorationError, Result};
use crate::fingerprint;
use crate::planner::PlannedInteraction;
use crate::types::{
    ActionType, IconBox, NavigationHints, ScreenType, TapPoint, WindowSize,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Outcome of a recorded scout tap on one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoutResult {
    /// The tap left the screen
    Navigated,
    /// The tap changed nothing structurally
    NoChange,
}

/// Per-screen traversal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TraversalPhase {
    /// Probing elements with tap-and-backtrack to learn which navigate
    Scout,
    /// Working through the ranked plan
    Dive,
    /// Nothing left to try on this screen
    Exhausted,
}

/// How scrolled-in elements are deduplicated against the node's element set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollDedup {
    /// Exact trimmed-text match
    #[default]
    Exact,
    /// Texts within edit distance 1 of an existing text are duplicates
    EditDistance,
    /// Same text within 40 points vertically is a duplicate; repeated list
    /// items further away count as novel
    Spatial,
}

/// One discovered screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenNode {
    pub fingerprint: String,
    /// OCR elements captured at first discovery, extended by scroll merges
    pub elements: Vec<TapPoint>,
    pub icons: Vec<IconBox>,
    pub hints: NavigationHints,
    pub depth: u32,
    pub screen_type: ScreenType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_base64: Option<String>,
    pub visited_elements: HashSet<String>,
    pub scroll_count: u32,
    pub scout_results: HashMap<String, ScoutResult>,
    pub phase: TraversalPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<PlannedInteraction>>,
}

impl ScreenNode {
    fn structural(&self) -> BTreeSet<String> {
        fingerprint::structural_texts(&self.elements, &self.hints.window)
    }

    fn element_texts(&self) -> HashSet<String> {
        self.elements
            .iter()
            .map(|e| e.text.trim().to_string())
            .collect()
    }

    /// Count of elements not yet visited.
    pub fn unvisited_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| !self.visited_elements.contains(e.text.trim()))
            .count()
    }
}

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEdge {
    pub from: String,
    pub to: String,
    pub action: ActionType,
    pub element_text: String,
}

/// What a recorded transition turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// A fresh node was added at `depth + 1`
    NewScreen(String),
    /// The capture matched an already-known node
    Revisited(String),
    /// The capture is structurally the screen we were already on
    Duplicate,
}

/// Immutable export of the graph at finalize time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: HashMap<String, ScreenNode>,
    pub edges: Vec<NavigationEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl GraphSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, fingerprint: &str) -> Option<&ScreenNode> {
        self.nodes.get(fingerprint)
    }
}

#[derive(Debug, Default)]
struct GraphInner {
    nodes: HashMap<String, ScreenNode>,
    edges: Vec<NavigationEdge>,
    root: Option<String>,
    current: Option<String>,
}

/// Thread-safe navigation graph.
#[derive(Debug, Default)]
pub struct NavigationGraph {
    inner: Mutex<GraphInner>,
}

impl NavigationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked<R>(&self, f: impl FnOnce(&mut GraphInner) -> R) -> Result<R> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| ExplorationError::Internal(format!("graph lock poisoned: {e}")))?;
        Ok(f(&mut inner))
    }

    /// Reset the graph and insert the root node. Returns the root fingerprint.
    pub fn start(
        &self,
        elements: Vec<TapPoint>,
        icons: Vec<IconBox>,
        hints: NavigationHints,
        screenshot_base64: Option<String>,
        screen_type: ScreenType,
    ) -> Result<String> {
        let fp = fingerprint::compute(&elements, &icons, &hints.window);
        self.locked(|inner| {
            *inner = GraphInner::default();
            inner.nodes.insert(
                fp.clone(),
                new_node(fp.clone(), elements, icons, hints, screenshot_base64, 0, screen_type),
            );
            inner.root = Some(fp.clone());
            inner.current = Some(fp.clone());
            debug!(fingerprint = %short(&fp), "graph started");
            fp.clone()
        })
    }

    /// Record a transition from the current node to whatever the new capture
    /// shows. Structural equivalence (hash equality or Jaccard >= 0.8)
    /// against the current node yields `Duplicate` with no edge; against any
    /// other known node yields `Revisited`. Otherwise a new node is created
    /// at `current.depth + 1`. Every non-duplicate outcome appends an edge
    /// and moves the current fingerprint to the destination.
    #[allow(clippy::too_many_arguments)]
    pub fn record_transition(
        &self,
        elements: Vec<TapPoint>,
        icons: Vec<IconBox>,
        hints: NavigationHints,
        screenshot_base64: Option<String>,
        action: ActionType,
        element_text: &str,
        screen_type: ScreenType,
    ) -> Result<TransitionOutcome> {
        let new_set = fingerprint::structural_texts(&elements, &hints.window);
        let new_fp = fingerprint::compute(&elements, &icons, &hints.window);

        self.locked(|inner| {
            let current_fp = inner
                .current
                .clone()
                .ok_or_else(|| ExplorationError::Internal("no current node".into()))?;
            let current = inner
                .nodes
                .get(&current_fp)
                .ok_or_else(|| ExplorationError::Internal("current node missing".into()))?;

            if new_fp == current_fp || fingerprint::equivalent(&new_set, &current.structural()) {
                return Ok(TransitionOutcome::Duplicate);
            }

            let known = inner
                .nodes
                .values()
                .find(|n| fingerprint::equivalent(&new_set, &n.structural()))
                .map(|n| n.fingerprint.clone());

            let (to_fp, outcome) = match known {
                Some(fp) => {
                    debug!(to = %short(&fp), via = element_text, "revisited");
                    (fp.clone(), TransitionOutcome::Revisited(fp))
                }
                None => {
                    let depth = current.depth + 1;
                    inner.nodes.insert(
                        new_fp.clone(),
                        new_node(
                            new_fp.clone(),
                            elements,
                            icons,
                            hints,
                            screenshot_base64,
                            depth,
                            screen_type,
                        ),
                    );
                    debug!(to = %short(&new_fp), depth, via = element_text, "new screen");
                    (new_fp.clone(), TransitionOutcome::NewScreen(new_fp))
                }
            };

            inner.edges.push(NavigationEdge {
                from: current_fp,
                to: to_fp.clone(),
                action,
                element_text: element_text.to_string(),
            });
            inner.current = Some(to_fp);
            Ok(outcome)
        })?
    }

    /// Add an element text to a node's visited set. Texts not present in the
    /// node's element set are refused so the visited set stays a subset of
    /// the discovered texts.
    pub fn mark_element_visited(&self, fingerprint: &str, text: &str) -> Result<()> {
        self.locked(|inner| {
            if let Some(node) = inner.nodes.get_mut(fingerprint) {
                let trimmed = text.trim();
                if node.element_texts().contains(trimmed) {
                    node.visited_elements.insert(trimmed.to_string());
                } else {
                    warn!(text = trimmed, "visited text not on screen, ignoring");
                }
            }
        })
    }

    /// Append scrolled-in elements whose text is novel under the exact
    /// strategy. Returns the novel count.
    pub fn merge_scrolled_elements(
        &self,
        fingerprint: &str,
        new_elements: Vec<TapPoint>,
    ) -> Result<usize> {
        self.merge_scrolled_elements_with(fingerprint, new_elements, ScrollDedup::Exact)
    }

    /// Scroll merge with an explicit dedup strategy.
    pub fn merge_scrolled_elements_with(
        &self,
        fingerprint: &str,
        new_elements: Vec<TapPoint>,
        strategy: ScrollDedup,
    ) -> Result<usize> {
        self.locked(|inner| {
            let Some(node) = inner.nodes.get_mut(fingerprint) else {
                return 0;
            };
            let mut novel = 0;
            for element in new_elements {
                if is_novel(&element, &node.elements, strategy) {
                    node.elements.push(element);
                    novel += 1;
                }
            }
            if novel > 0 {
                debug!(fingerprint = %short(fingerprint), novel, "scroll merged");
            }
            novel
        })
    }

    pub fn set_screen_plan(&self, fingerprint: &str, plan: Vec<PlannedInteraction>) -> Result<()> {
        self.locked(|inner| {
            if let Some(node) = inner.nodes.get_mut(fingerprint) {
                node.plan = Some(plan);
            }
        })
    }

    pub fn screen_plan(&self, fingerprint: &str) -> Result<Option<Vec<PlannedInteraction>>> {
        self.locked(|inner| inner.nodes.get(fingerprint).and_then(|n| n.plan.clone()))
    }

    /// First plan entry whose text is not in the visited set.
    pub fn next_planned_element(&self, fingerprint: &str) -> Result<Option<PlannedInteraction>> {
        self.locked(|inner| {
            inner.nodes.get(fingerprint).and_then(|node| {
                node.plan.as_ref().and_then(|plan| {
                    plan.iter()
                        .find(|p| !node.visited_elements.contains(p.text.trim()))
                        .cloned()
                })
            })
        })
    }

    pub fn clear_screen_plan(&self, fingerprint: &str) -> Result<()> {
        self.locked(|inner| {
            if let Some(node) = inner.nodes.get_mut(fingerprint) {
                node.plan = None;
            }
        })
    }

    pub fn scroll_count(&self, fingerprint: &str) -> Result<u32> {
        self.locked(|inner| {
            inner
                .nodes
                .get(fingerprint)
                .map(|n| n.scroll_count)
                .unwrap_or(0)
        })
    }

    pub fn increment_scroll_count(&self, fingerprint: &str) -> Result<()> {
        self.locked(|inner| {
            if let Some(node) = inner.nodes.get_mut(fingerprint) {
                node.scroll_count += 1;
            }
        })
    }

    pub fn record_scout_result(
        &self,
        fingerprint: &str,
        text: &str,
        result: ScoutResult,
    ) -> Result<()> {
        self.locked(|inner| {
            if let Some(node) = inner.nodes.get_mut(fingerprint) {
                node.scout_results.insert(text.trim().to_string(), result);
            }
        })
    }

    pub fn scout_results(&self, fingerprint: &str) -> Result<HashMap<String, ScoutResult>> {
        self.locked(|inner| {
            inner
                .nodes
                .get(fingerprint)
                .map(|n| n.scout_results.clone())
                .unwrap_or_default()
        })
    }

    pub fn traversal_phase(&self, fingerprint: &str) -> Result<Option<TraversalPhase>> {
        self.locked(|inner| inner.nodes.get(fingerprint).map(|n| n.phase))
    }

    pub fn set_traversal_phase(&self, fingerprint: &str, phase: TraversalPhase) -> Result<()> {
        self.locked(|inner| {
            if let Some(node) = inner.nodes.get_mut(fingerprint) {
                node.phase = phase;
            }
        })
    }

    /// Move the current pointer, e.g. after a back-tap chain. The node must
    /// exist.
    pub fn set_current_fingerprint(&self, fingerprint: &str) -> Result<()> {
        self.locked(|inner| {
            if inner.nodes.contains_key(fingerprint) {
                inner.current = Some(fingerprint.to_string());
                Ok(())
            } else {
                Err(ExplorationError::Internal(format!(
                    "unknown fingerprint {}",
                    short(fingerprint)
                )))
            }
        })?
    }

    pub fn current_fingerprint(&self) -> Result<Option<String>> {
        self.locked(|inner| inner.current.clone())
    }

    pub fn root_fingerprint(&self) -> Result<Option<String>> {
        self.locked(|inner| inner.root.clone())
    }

    /// Find a known node structurally equivalent to the capture. Used by
    /// backtrack verification.
    pub fn find_matching_node(
        &self,
        elements: &[TapPoint],
        window: &WindowSize,
    ) -> Result<Option<String>> {
        let set = fingerprint::structural_texts(elements, window);
        self.locked(|inner| {
            inner
                .nodes
                .values()
                .find(|n| fingerprint::equivalent(&set, &n.structural()))
                .map(|n| n.fingerprint.clone())
        })
    }

    /// Copy of one node.
    pub fn node(&self, fingerprint: &str) -> Result<Option<ScreenNode>> {
        self.locked(|inner| inner.nodes.get(fingerprint).cloned())
    }

    pub fn node_count(&self) -> Result<usize> {
        self.locked(|inner| inner.nodes.len())
    }

    pub fn edge_count(&self) -> Result<usize> {
        self.locked(|inner| inner.edges.len())
    }

    /// Immutable export. `finalize` is the same export under its lifecycle
    /// name.
    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        self.locked(|inner| GraphSnapshot {
            nodes: inner.nodes.clone(),
            edges: inner.edges.clone(),
            root: inner.root.clone(),
        })
    }

    pub fn finalize(&self) -> Result<GraphSnapshot> {
        self.snapshot()
    }

    /// Drop all state, e.g. when a session advances to its next goal.
    pub fn reset(&self) -> Result<()> {
        self.locked(|inner| {
            *inner = GraphInner::default();
        })
    }
}

fn new_node(
    fingerprint: String,
    elements: Vec<TapPoint>,
    icons: Vec<IconBox>,
    hints: NavigationHints,
    screenshot_base64: Option<String>,
    depth: u32,
    screen_type: ScreenType,
) -> ScreenNode {
    ScreenNode {
        fingerprint,
        elements,
        icons,
        hints,
        depth,
        screen_type,
        screenshot_base64,
        visited_elements: HashSet::new(),
        scroll_count: 0,
        scout_results: HashMap::new(),
        phase: TraversalPhase::Scout,
        plan: None,
    }
}

fn is_novel(element: &TapPoint, existing: &[TapPoint], strategy: ScrollDedup) -> bool {
    let text = element.text.trim();
    match strategy {
        ScrollDedup::Exact => !existing.iter().any(|e| e.text.trim() == text),
        ScrollDedup::EditDistance => !existing
            .iter()
            .any(|e| edit_distance(e.text.trim(), text) <= 1),
        ScrollDedup::Spatial => !existing
            .iter()
            .any(|e| e.text.trim() == text && (e.tap_y - element.tap_y).abs() < 40.0),
    }
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            row[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

fn short(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(8)]
}
