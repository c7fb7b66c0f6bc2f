//! Core data types shared by every stage of the engine.
//!
//! Nodes and edges are owned by the external store and handed in on every
//! computation. The engine only produces [`PositionMap`]s, visibility sets
//! and detail decisions from them.

use std::collections::{HashMap, HashSet};

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Stable node identifier assigned by the store.
pub type NodeId = i64;

/// One crawled page.
///
/// Field names follow the store's row layout so records can be deserialized
/// directly from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: NodeId,
  pub url: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub favicon: Option<String>,
  #[serde(default)]
  pub screenshot: Option<String>,
  /// Stored fallback position (x).
  pub position_x: f64,
  /// Stored fallback position (y).
  pub position_y: f64,
  /// Stored fallback position (z).
  pub position_z: f64,
  #[serde(default = "default_alive")]
  pub is_alive: bool,
  /// Last crawl timestamp as recorded by the store.
  #[serde(default)]
  pub last_crawled: Option<String>,
}

fn default_alive() -> bool {
  true
}

impl Node {
  /// Create a live node with no metadata.
  pub fn new(id: NodeId, url: impl Into<String>, position: DVec3) -> Self {
    Self {
      id,
      url: url.into(),
      title: String::new(),
      favicon: None,
      screenshot: None,
      position_x: position.x,
      position_y: position.y,
      position_z: position.z,
      is_alive: true,
      last_crawled: None,
    }
  }

  /// Stored fallback position.
  #[inline]
  pub fn stored_position(&self) -> DVec3 {
    DVec3::new(self.position_x, self.position_y, self.position_z)
  }
}

/// Link between two pages. Undirected for layout purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
  #[serde(default)]
  pub id: Option<i64>,
  pub source_id: NodeId,
  pub target_id: NodeId,
}

impl Edge {
  pub fn new(source_id: NodeId, target_id: NodeId) -> Self {
    Self {
      id: None,
      source_id,
      target_id,
    }
  }

  #[inline]
  pub fn is_self_loop(&self) -> bool {
    self.source_id == self.target_id
  }
}

/// Node id → position, produced fresh by every layout run.
///
/// Covers every input node id exactly once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionMap {
  positions: HashMap<NodeId, DVec3>,
}

impl PositionMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      positions: HashMap::with_capacity(capacity),
    }
  }

  /// Stored fallback positions for every node.
  pub fn from_stored(nodes: &[Node]) -> Self {
    nodes.iter().map(|n| (n.id, n.stored_position())).collect()
  }

  pub fn insert(&mut self, id: NodeId, position: DVec3) -> Option<DVec3> {
    self.positions.insert(id, position)
  }

  pub fn get(&self, id: NodeId) -> Option<DVec3> {
    self.positions.get(&id).copied()
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.positions.contains_key(&id)
  }

  pub fn len(&self) -> usize {
    self.positions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (NodeId, DVec3)> + '_ {
    self.positions.iter().map(|(id, p)| (*id, *p))
  }

  /// True when the keys are exactly the ids of `nodes`.
  pub fn covers_exactly(&self, nodes: &[Node]) -> bool {
    let ids: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
    ids.len() == self.positions.len() && ids.iter().all(|id| self.positions.contains_key(id))
  }
}

impl FromIterator<(NodeId, DVec3)> for PositionMap {
  fn from_iter<I: IntoIterator<Item = (NodeId, DVec3)>>(iter: I) -> Self {
    Self {
      positions: iter.into_iter().collect(),
    }
  }
}

/// Validated graph snapshot handed to the layout algorithms.
///
/// Duplicate node ids keep their first occurrence. Edges referencing unknown
/// ids are dropped.
#[derive(Clone, Debug, Default)]
pub struct GraphInput {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

impl GraphInput {
  pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
    let mut seen = HashSet::with_capacity(nodes.len());
    let nodes: Vec<Node> = nodes.into_iter().filter(|n| seen.insert(n.id)).collect();

    let total_edges = edges.len();
    let edges: Vec<Edge> = edges
      .into_iter()
      .filter(|e| seen.contains(&e.source_id) && seen.contains(&e.target_id))
      .collect();
    if edges.len() != total_edges {
      tracing::warn!(
        dropped = total_edges - edges.len(),
        "edges reference unknown node ids"
      );
    }

    Self { nodes, edges }
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// Map from node id to its index in `nodes`.
  pub fn index_of(&self) -> HashMap<NodeId, usize> {
    self
      .nodes
      .iter()
      .enumerate()
      .map(|(i, n)| (n.id, i))
      .collect()
  }

  /// Connection count per node, indexed like `nodes`.
  ///
  /// Self-loops count once.
  pub fn degrees(&self) -> Vec<usize> {
    let index = self.index_of();
    let mut degrees = vec![0usize; self.nodes.len()];
    for edge in &self.edges {
      if let (Some(&a), Some(&b)) = (index.get(&edge.source_id), index.get(&edge.target_id)) {
        degrees[a] += 1;
        if a != b {
          degrees[b] += 1;
        }
      }
    }
    degrees
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
