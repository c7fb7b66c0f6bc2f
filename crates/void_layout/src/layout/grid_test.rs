use std::collections::HashSet;

use glam::DVec3;

use super::*;
use crate::types::Node;

fn nodes(count: i64) -> Vec<Node> {
  (0..count)
    .map(|i| Node::new(i, format!("https://p{i}.test/"), DVec3::ZERO))
    .collect()
}

/// Ten nodes with spacing 20 never share coordinates.
#[test]
fn test_ten_nodes_are_distinct() {
  let graph = GraphInput::new(nodes(10), vec![]);
  let positions = GridParams { spacing: 20.0 }.compute(&graph, &mut |_| {});

  let mut seen = HashSet::new();
  for (_, p) in positions.iter() {
    let key = (p.x.to_bits(), p.y.to_bits(), p.z.to_bits());
    assert!(seen.insert(key), "duplicate position {:?}", p);
  }
  assert_eq!(seen.len(), 10);
}

#[test]
fn test_grid_is_deterministic_and_order_independent() {
  let params = GridParams { spacing: 20.0 };
  let forward = GraphInput::new(nodes(27), vec![]);
  let mut reversed_nodes = nodes(27);
  reversed_nodes.reverse();
  let reversed = GraphInput::new(reversed_nodes, vec![]);

  let a = params.compute(&forward, &mut |_| {});
  let b = params.compute(&forward, &mut |_| {});
  let c = params.compute(&reversed, &mut |_| {});
  assert_eq!(a, b);
  assert_eq!(a, c);
}

#[test]
fn test_lattice_side() {
  assert_eq!(lattice_side(0), 1);
  assert_eq!(lattice_side(1), 1);
  assert_eq!(lattice_side(8), 2);
  assert_eq!(lattice_side(9), 3);
  assert_eq!(lattice_side(27), 3);
  assert_eq!(lattice_side(64), 4);
  assert_eq!(lattice_side(1000), 10);
  assert_eq!(lattice_side(1001), 11);
}

#[test]
fn test_grid_is_centered() {
  let graph = GraphInput::new(nodes(27), vec![]);
  let positions = GridParams { spacing: 10.0 }.compute(&graph, &mut |_| {});
  let sum: DVec3 = positions.iter().map(|(_, p)| p).sum();
  assert!(sum.length() < 1e-9);
  let max = positions.iter().map(|(_, p)| p.abs().max_element()).fold(0.0, f64::max);
  assert_eq!(max, 10.0);
}
