//! Path reconstruction over the graph snapshot

use crate::graph::{GraphSnapshot, NavigationEdge};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// One reconstructed path, named after its edge labels.
#[derive(Debug, Clone)]
pub struct NamedPath {
    pub name: String,
    pub edges: Vec<NavigationEdge>,
}

/// Reconstruct the interesting paths in a snapshot.
///
/// Leaf nodes are those whose outgoing edges make no forward progress (every
/// edge lands at the same depth or shallower). Each distinct leaf yields the
/// shortest edge path from the root, deepest leaves first. A graph with no
/// such paths falls back to the single longest acyclic path.
pub fn find_paths(snapshot: &GraphSnapshot) -> Vec<NamedPath> {
    let Some(root) = snapshot.root.as_deref() else {
        return Vec::new();
    };

    let adjacency = adjacency_by_from(snapshot);

    let mut leaves: Vec<(&str, u32)> = snapshot
        .nodes
        .values()
        .filter(|node| node.fingerprint != root)
        .filter(|node| {
            adjacency
                .get(node.fingerprint.as_str())
                .map(|edges| {
                    edges.iter().all(|edge| {
                        snapshot
                            .nodes
                            .get(&edge.to)
                            .map(|to| to.depth <= node.depth)
                            .unwrap_or(true)
                    })
                })
                .unwrap_or(true)
        })
        .map(|node| (node.fingerprint.as_str(), node.depth))
        .collect();
    leaves.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut paths = Vec::new();
    let mut seen_names = HashSet::new();
    for (leaf, _) in leaves {
        if let Some(edges) = shortest_path(root, leaf, &adjacency) {
            if edges.is_empty() {
                continue;
            }
            let name = path_name(&edges);
            if seen_names.insert(name.clone()) {
                paths.push(NamedPath { name, edges });
            }
        }
    }

    if paths.is_empty() {
        if let Some(edges) = longest_acyclic_path(root, &adjacency) {
            if !edges.is_empty() {
                let name = path_name(&edges);
                paths.push(NamedPath { name, edges });
            }
        }
    }

    debug!(count = paths.len(), "named paths");
    paths
}

fn adjacency_by_from(snapshot: &GraphSnapshot) -> HashMap<&str, Vec<&NavigationEdge>> {
    let mut adjacency: HashMap<&str, Vec<&NavigationEdge>> = HashMap::new();
    for edge in &snapshot.edges {
        adjacency.entry(edge.from.as_str()).or_default().push(edge);
    }
    adjacency
}

/// Breadth-first shortest edge path from `root` to `target`.
fn shortest_path(
    root: &str,
    target: &str,
    adjacency: &HashMap<&str, Vec<&NavigationEdge>>,
) -> Option<Vec<NavigationEdge>> {
    let mut queue = VecDeque::from([root]);
    let mut parent: HashMap<&str, &NavigationEdge> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::from([root]);

    while let Some(current) = queue.pop_front() {
        if current == target {
            break;
        }
        for edge in adjacency.get(current).into_iter().flatten() {
            if visited.insert(edge.to.as_str()) {
                parent.insert(edge.to.as_str(), edge);
                queue.push_back(edge.to.as_str());
            }
        }
    }

    if !visited.contains(target) {
        return None;
    }
    let mut edges = Vec::new();
    let mut cursor = target;
    while cursor != root {
        let edge = parent.get(cursor)?;
        edges.push((*edge).clone());
        cursor = edge.from.as_str();
    }
    edges.reverse();
    Some(edges)
}

/// Depth-first longest path from `root` that never revisits a node.
fn longest_acyclic_path(
    root: &str,
    adjacency: &HashMap<&str, Vec<&NavigationEdge>>,
) -> Option<Vec<NavigationEdge>> {
    fn dfs<'a>(
        node: &'a str,
        adjacency: &HashMap<&'a str, Vec<&'a NavigationEdge>>,
        on_path: &mut HashSet<&'a str>,
    ) -> Vec<&'a NavigationEdge> {
        let mut best: Vec<&NavigationEdge> = Vec::new();
        for edge in adjacency.get(node).into_iter().flatten() {
            if !on_path.insert(edge.to.as_str()) {
                continue;
            }
            let mut candidate = vec![*edge];
            candidate.extend(dfs(edge.to.as_str(), adjacency, on_path));
            if candidate.len() > best.len() {
                best = candidate;
            }
            on_path.remove(edge.to.as_str());
        }
        best
    }

    let mut on_path = HashSet::from([root]);
    let best = dfs(root, adjacency, &mut on_path);
    if best.is_empty() {
        None
    } else {
        Some(best.into_iter().cloned().collect())
    }
}

fn path_name(edges: &[NavigationEdge]) -> String {
    edges
        .iter()
        .map(|e| e.element_text.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}
