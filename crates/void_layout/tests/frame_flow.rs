//! End-to-end flow: store rows in, positions, visibility, LOD and draw lists out.

use std::collections::HashSet;
use std::time::Duration;

use glam::{DVec2, DVec3};
use void_layout::layout::second_level_domain;
use void_layout::render::{Highlight, Ray};
use void_layout::{
  Camera, DisplaySettings, DrawPath, EngineConfig, GraphScene, LayoutUpdate, LodTable, Node, PositionMap,
  RenderThresholds,
};
use web_time::Instant;

const NODES_JSON: &str = r#"[
  {"id": 1, "url": "https://docs.rust-lang.org/book/", "title": "The Book",
   "position_x": 0.0, "position_y": 0.0, "position_z": 0.0, "is_alive": true},
  {"id": 2, "url": "https://doc.rust-lang.org/std/", "title": "std",
   "position_x": 12.0, "position_y": 3.0, "position_z": -4.0},
  {"id": 3, "url": "https://github.com/rust-lang/rust", "favicon": "gh.ico",
   "position_x": -9.0, "position_y": 1.0, "position_z": 8.0, "is_alive": false},
  {"id": 4, "url": "https://github.com/tokio-rs/tokio",
   "position_x": -14.0, "position_y": -2.0, "position_z": 5.0,
   "last_crawled": "2024-11-02 10:14:00"},
  {"id": 5, "url": "mailto:nobody",
   "position_x": 3.0, "position_y": 9.0, "position_z": 1.0}
]"#;

const EDGES_JSON: &str = r#"[
  {"id": 10, "source_id": 1, "target_id": 2},
  {"source_id": 1, "target_id": 3},
  {"source_id": 3, "target_id": 4},
  {"source_id": 4, "target_id": 4},
  {"source_id": 2, "target_id": 99}
]"#;

fn store_rows() -> (Vec<Node>, Vec<void_layout::Edge>) {
  let nodes: Vec<Node> = serde_json::from_str(NODES_JSON).unwrap();
  let edges = serde_json::from_str(EDGES_JSON).unwrap();
  (nodes, edges)
}

fn camera_at(eye: DVec3) -> Camera {
  Camera::look_at(eye, DVec3::ZERO, 1.0, 16.0 / 9.0, 0.1, 10_000.0)
}

#[test]
fn store_rows_deserialize_with_defaults() {
  let (nodes, edges) = store_rows();
  assert_eq!(nodes.len(), 5);
  assert!(nodes[1].is_alive, "is_alive defaults to true");
  assert!(!nodes[2].is_alive);
  assert_eq!(nodes[2].favicon.as_deref(), Some("gh.ico"));
  assert_eq!(nodes[3].last_crawled.as_deref(), Some("2024-11-02 10:14:00"));
  assert_eq!(edges[0].id, Some(10));
  assert_eq!(edges[1].id, None);
}

#[test]
fn identity_layout_keeps_stored_positions() {
  let (nodes, edges) = store_rows();
  let mut scene = GraphScene::new(EngineConfig::default());
  scene.set_graph(nodes.clone(), edges);
  scene.set_display_settings(DisplaySettings {
    layout_mode: "none".into(),
    ..Default::default()
  });
  assert_eq!(scene.update_layout(), Ok(LayoutUpdate::Applied));
  assert_eq!(*scene.positions(), PositionMap::from_stored(&nodes));
  // The edge to the unknown node 99 was dropped.
  assert_eq!(scene.graph().edges.len(), 4);
}

#[test]
fn cluster_layout_groups_by_domain() {
  let (nodes, edges) = store_rows();
  let mut scene = GraphScene::new(EngineConfig::default());
  scene.set_graph(nodes.clone(), edges);
  scene.set_display_settings(DisplaySettings {
    layout_mode: "cluster".into(),
    ..Default::default()
  });
  scene.update_layout().unwrap();

  let positions = scene.positions();
  assert!(positions.covers_exactly(&nodes));

  // Same domain sits closer together than different domains.
  let gh_a = positions.get(3).unwrap();
  let gh_b = positions.get(4).unwrap();
  let rust = positions.get(1).unwrap();
  assert_eq!(second_level_domain("https://github.com/a"), Some("github.com".into()));
  assert!(gh_a.distance(gh_b) < gh_a.distance(rust));
}

#[test]
fn frame_culls_and_assigns_detail() {
  let config = EngineConfig {
    thresholds: RenderThresholds {
      instancing: 50,
      frustum_culling: 50,
      worker_layout: 10_000,
    },
    ..Default::default()
  };
  let lod = config.lod.clone();
  let mut scene = GraphScene::new(config);

  // Two blobs: one in front of the camera, one behind it.
  let mut nodes = Vec::new();
  for i in 0..60 {
    let offset = DVec3::new((i % 6) as f64, (i / 6 % 5) as f64, 0.0);
    nodes.push(Node::new(i, format!("https://front{}.test/", i), offset));
    nodes.push(Node::new(1000 + i, format!("https://back{}.test/", i), DVec3::new(0.0, 0.0, 900.0) + offset));
  }
  let edges = (0..60).map(|i| void_layout::Edge::new(i, 1000 + i)).collect();
  scene.set_graph(nodes, edges);
  scene.set_display_settings(DisplaySettings {
    layout_mode: "identity".into(),
    ..Default::default()
  });
  scene.update_layout().unwrap();

  let camera = camera_at(DVec3::new(0.0, 0.0, 120.0));
  let output = scene.frame(Instant::now(), &camera);
  assert!(output.plan.frustum_culling);
  assert_eq!(output.plan.draw_path, DrawPath::Instanced);
  assert!(output.visible.culled);

  let visible: HashSet<i64> = output.visible.nodes.iter().copied().collect();
  assert_eq!(visible, (0..60).collect());
  // Every edge touches a visible front node.
  assert_eq!(output.visible.edges.len(), 60);

  for (id, selection) in &output.lods {
    let distance = camera.distance_to(scene.display_position(*id).unwrap());
    assert_eq!(selection.tier, lod.tier(distance));
  }
}

#[test]
fn lod_tiers_never_decrease_with_distance() {
  let lod = LodTable::default();
  let mut previous = 0;
  for step in 0..4000 {
    let tier = lod.tier(step as f64 * 0.25);
    assert!(tier >= previous);
    previous = tier;
  }
}

#[test]
fn background_layout_then_pick() {
  let config = EngineConfig {
    thresholds: RenderThresholds {
      instancing: 10,
      frustum_culling: 10_000,
      worker_layout: 20,
    },
    ..Default::default()
  };
  let mut scene = GraphScene::new(config);
  let nodes: Vec<Node> = (0..40)
    .map(|i| Node::new(i, format!("https://n{}.example.com/", i % 4), DVec3::ZERO))
    .collect();
  let edges = (1..40).map(|i| void_layout::Edge::new(i, (i - 1) / 2)).collect();
  scene.set_graph(nodes.clone(), edges);
  scene.set_display_settings(DisplaySettings {
    layout_mode: "force".into(),
    iterations: Some(30),
    ..Default::default()
  });

  assert!(matches!(scene.update_layout(), Ok(LayoutUpdate::Pending(_))));

  // Frames keep rendering stored positions while the layout runs.
  let camera = camera_at(DVec3::new(0.0, 0.0, 400.0));
  let start = Instant::now();
  let mut now = start;
  let mut applied = false;
  while now.saturating_duration_since(start) < Duration::from_secs(30) {
    let output = scene.frame(now, &camera);
    assert_eq!(output.draw.node_count(), 40);
    if let Some(result) = scene.poll_layout() {
      applied = result.unwrap();
      break;
    }
    std::thread::sleep(Duration::from_millis(2));
    now = Instant::now();
  }
  assert!(applied);
  assert!(scene.positions().covers_exactly(&nodes));

  // Pick the node nearest the screen center along the view ray.
  let output = scene.frame(Instant::now() + Duration::from_secs(1), &camera);
  let ray = Ray::from_camera(&camera, DVec2::ZERO).unwrap();
  if let Some(id) = output.draw.pick(&ray) {
    scene.set_highlight(Highlight {
      hovered: Some(id),
      selected: None,
    });
    let highlighted = scene.frame(Instant::now() + Duration::from_secs(2), &camera);
    let (_, _, color) = highlighted
      .draw
      .node_instances()
      .into_iter()
      .find(|(node, _, _)| *node == id)
      .unwrap();
    assert!(color.x > 0.6, "hovered node is brightened");
  }
  scene.shutdown();
}
