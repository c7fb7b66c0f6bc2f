use std::time::Duration;

use glam::DVec3;

use super::*;
use crate::spatial::{index_positions, OctreeSettings};

/// Nodes on a line along x, camera at +z looking at the origin with a narrow
/// far plane so only the center of the line is in view.
fn line(count: usize) -> PositionMap {
  (0..count as i64)
    .map(|i| (i, DVec3::new((i as f64 - count as f64 / 2.0) * 10.0, 0.0, 0.0)))
    .collect()
}

fn chain(count: usize) -> Vec<Edge> {
  (1..count as i64).map(|i| Edge::new(i - 1, i)).collect()
}

fn camera() -> Camera {
  Camera::look_at(DVec3::new(0.0, 0.0, 100.0), DVec3::ZERO, 0.5, 1.0, 1.0, 500.0)
}

fn culler(threshold: usize) -> VisibilityCuller {
  VisibilityCuller::new(VisibilityConfig {
    cull_threshold: threshold,
    ..Default::default()
  })
}

#[test]
fn test_below_threshold_returns_everything() {
  let positions = line(20);
  let edges = chain(20);
  let set = culler(200).compute(&camera(), &positions, &edges, None);
  assert!(!set.culled);
  assert_eq!(set.nodes.len(), 20);
  assert_eq!(set.edges.len(), 19);
}

#[test]
fn test_indexed_and_linear_paths_agree() {
  let positions = line(400);
  let edges = chain(400);
  let index = index_positions(&positions, OctreeSettings::default());
  let culler = culler(10);

  let indexed = culler.compute(&camera(), &positions, &edges, Some(&index));
  let linear = culler.compute(&camera(), &positions, &edges, None);
  assert!(indexed.culled);
  assert_eq!(indexed.nodes, linear.nodes);
  assert_eq!(indexed.edges, linear.edges);
  assert!(indexed.nodes.contains(&200), "node at the origin is in view");
  assert!(indexed.nodes.len() < 400);
  assert!(!indexed.nodes.is_empty());
}

#[test]
fn test_edge_visible_iff_an_endpoint_is_visible() {
  let positions = line(400);
  let edges = chain(400);
  let set = culler(10).compute(&camera(), &positions, &edges, None);

  for edge in &edges {
    let expected = set.contains(edge.source_id) || set.contains(edge.target_id);
    assert_eq!(set.edges.contains(edge), expected, "edge {:?}", edge);
  }
}

#[test]
fn test_camera_facing_away_sees_nothing() {
  let positions = line(300);
  let camera = Camera::look_at(DVec3::new(0.0, 0.0, 100.0), DVec3::new(0.0, 0.0, 200.0), 0.5, 1.0, 1.0, 500.0);
  let set = culler(10).compute(&camera, &positions, &chain(300), None);
  assert!(set.nodes.is_empty());
  assert!(set.edges.is_empty());
}

#[test]
fn test_update_is_rate_limited() {
  let positions = line(300);
  let edges = chain(300);
  let mut culler = culler(10);
  let start = Instant::now();

  let first = culler.update(start, &camera(), &positions, &edges, None).clone();
  assert!(first.nodes.contains(&150));

  // Camera turned away, but still within the interval.
  let away = Camera::look_at(DVec3::new(0.0, 0.0, 100.0), DVec3::new(0.0, 0.0, 200.0), 0.5, 1.0, 1.0, 500.0);
  let cached = culler.update(start + Duration::from_millis(50), &away, &positions, &edges, None);
  assert_eq!(cached, &first);

  let fresh = culler.update(start + Duration::from_millis(150), &away, &positions, &edges, None);
  assert!(fresh.nodes.is_empty());
}

#[test]
fn test_invalidate_forces_recompute() {
  let positions = line(300);
  let edges = chain(300);
  let mut culler = culler(10);
  let start = Instant::now();
  culler.update(start, &camera(), &positions, &edges, None);

  let away = Camera::look_at(DVec3::new(0.0, 0.0, 100.0), DVec3::new(0.0, 0.0, 200.0), 0.5, 1.0, 1.0, 500.0);
  culler.invalidate();
  let set = culler.update(start, &away, &positions, &edges, None);
  assert!(set.nodes.is_empty());
}

#[test]
fn test_empty_graph() {
  let positions = PositionMap::new();
  let set = culler(0).compute(&camera(), &positions, &[], None);
  assert!(set.nodes.is_empty());
  assert!(set.edges.is_empty());
}
