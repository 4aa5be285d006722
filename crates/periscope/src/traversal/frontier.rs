//! Frontier queue entries

use serde::{Deserialize, Serialize};

/// One hop of a replayable path: the element that was tapped and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub element_text: String,
    pub tap_x: f64,
    pub tap_y: f64,
}

impl PathSegment {
    pub fn new(element_text: impl Into<String>, tap_x: f64, tap_y: f64) -> Self {
        Self {
            element_text: element_text.into(),
            tap_x,
            tap_y,
        }
    }
}

/// A discovered-but-unexplored screen with its replayable path from the
/// root. The path length equals the discovery depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierScreen {
    pub fingerprint: String,
    pub path_from_root: Vec<PathSegment>,
    pub depth: u32,
}

impl FrontierScreen {
    pub fn root(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            path_from_root: Vec::new(),
            depth: 0,
        }
    }

    pub fn child(&self, fingerprint: impl Into<String>, segment: PathSegment) -> Self {
        let mut path = self.path_from_root.clone();
        path.push(segment);
        Self {
            fingerprint: fingerprint.into(),
            depth: self.depth + 1,
            path_from_root: path,
        }
    }
}
