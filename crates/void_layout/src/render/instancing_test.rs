use glam::{DVec2, DVec3, Vec3};

use super::*;

fn nodes(count: i64) -> Vec<(Node, DVec3)> {
  (0..count)
    .map(|i| {
      let position = DVec3::new(i as f64 * 5.0, 0.0, 0.0);
      let mut node = Node::new(i, format!("https://site{}.test/", i), position);
      node.is_alive = i % 3 != 0;
      (node, position)
    })
    .collect()
}

fn appearances(highlight: &Highlight, time: f32) -> Vec<NodeAppearance> {
  nodes(12)
    .iter()
    .map(|(node, position)| {
      NodeAppearance::resolve(
        node,
        *position,
        GeometryDetail::Medium,
        highlight,
        time,
        &AppearanceParams::DEFAULT,
      )
    })
    .collect()
}

fn segments(highlight: &Highlight) -> Vec<EdgeSegment> {
  (1..12)
    .map(|i| {
      EdgeSegment::resolve(
        &Edge::new(i - 1, i),
        DVec3::new((i - 1) as f64 * 5.0, 0.0, 0.0),
        DVec3::new(i as f64 * 5.0, 0.0, 0.0),
        highlight,
      )
    })
    .collect()
}

/// Both draw paths produce the same transforms, colors and picks.
#[test]
fn test_draw_paths_are_visually_equivalent() {
  let highlight = Highlight {
    hovered: Some(4),
    selected: Some(7),
  };
  let looks = appearances(&highlight, 1.25);
  let edges = segments(&highlight);

  let per_object = DrawList::build(DrawPath::PerObject, &looks, &edges);
  let instanced = DrawList::build(DrawPath::Instanced, &looks, &edges);
  assert_eq!(per_object.path(), DrawPath::PerObject);
  assert_eq!(instanced.path(), DrawPath::Instanced);
  assert_eq!(per_object.node_instances(), instanced.node_instances());

  let ray = Ray::new(Vec3::new(20.0, 0.0, 50.0), Vec3::NEG_Z).unwrap();
  assert_eq!(per_object.pick(&ray), Some(4));
  assert_eq!(per_object.pick(&ray), instanced.pick(&ray));

  let miss = Ray::new(Vec3::new(20.0, 30.0, 50.0), Vec3::NEG_Z).unwrap();
  assert_eq!(per_object.pick(&miss), None);
  assert_eq!(instanced.pick(&miss), None);
}

#[test]
fn test_edge_batch_matches_segments() {
  let highlight = Highlight::default();
  let edges = segments(&highlight);
  let batch = EdgeBatch::from_segments(&edges);
  assert_eq!(batch.segment_count(), edges.len());
  for (i, segment) in edges.iter().enumerate() {
    assert_eq!(batch.positions[2 * i], segment.start);
    assert_eq!(batch.positions[2 * i + 1], segment.end);
    assert_eq!(batch.colors[2 * i], segment.color);
  }
}

#[test]
fn test_highlight_colors() {
  let (node, position) = nodes(2).remove(1);
  let params = AppearanceParams::DEFAULT;
  let plain = NodeAppearance::resolve(&node, position, GeometryDetail::High, &Highlight::default(), 0.0, &params);
  let hovered = NodeAppearance::resolve(
    &node,
    position,
    GeometryDetail::High,
    &Highlight {
      hovered: Some(1),
      selected: None,
    },
    0.0,
    &params,
  );
  let selected = NodeAppearance::resolve(
    &node,
    position,
    GeometryDetail::High,
    &Highlight {
      hovered: None,
      selected: Some(1),
    },
    0.0,
    &params,
  );
  assert_eq!(plain.color, ALIVE_COLOR);
  assert_eq!(selected.color, SELECTED_COLOR);
  assert!(hovered.color.x > plain.color.x);
  assert_eq!(plain.radius, hovered.radius);
}

#[test]
fn test_only_live_nodes_pulse() {
  let params = AppearanceParams::DEFAULT;
  let mut node = Node::new(5, "https://a.test/", DVec3::ZERO);
  let radii: Vec<f32> = (0..20)
    .map(|step| {
      NodeAppearance::resolve(&node, DVec3::ZERO, GeometryDetail::High, &Highlight::default(), step as f32 * 0.1, &params)
        .radius
    })
    .collect();
  let (min, max) = radii.iter().fold((f32::MAX, f32::MIN), |(lo, hi), r| (lo.min(*r), hi.max(*r)));
  assert!(max > min);
  assert!(max <= 1.0 + params.pulse_amplitude + 1e-5);
  assert!(min >= 1.0 - params.pulse_amplitude - 1e-5);

  node.is_alive = false;
  let dead = NodeAppearance::resolve(&node, DVec3::ZERO, GeometryDetail::High, &Highlight::default(), 0.7, &params);
  assert_eq!(dead.radius, 1.0);
  assert_eq!(dead.color, DEAD_COLOR);
}

#[test]
fn test_pick_prefers_nearest() {
  let looks = appearances(&Highlight::default(), 0.0);
  let list = DrawList::build(DrawPath::Instanced, &looks, &[]);
  // Along +x from the left: first sphere hit is node 0.
  let ray = Ray::new(Vec3::new(-100.0, 0.0, 0.0), Vec3::X).unwrap();
  assert_eq!(list.pick(&ray), Some(0));
  let ray = Ray::new(Vec3::new(100.0, 0.0, 0.0), Vec3::NEG_X).unwrap();
  assert_eq!(list.pick(&ray), Some(11));
}

#[test]
fn test_ray_from_camera_center_hits_target() {
  let camera = Camera::look_at(DVec3::new(0.0, 0.0, 40.0), DVec3::ZERO, 1.0, 1.0, 0.1, 200.0);
  let ray = Ray::from_camera(&camera, DVec2::ZERO).unwrap();
  assert!(ray.direction.dot(Vec3::NEG_Z) > 0.999);
  assert!(ray.sphere_hit(Vec3::ZERO, 1.0).is_some());
  assert!(ray.sphere_hit(Vec3::new(0.0, 0.0, 80.0), 1.0).is_none());
}

#[test]
fn test_ray_rejects_zero_direction() {
  assert!(Ray::new(Vec3::ZERO, Vec3::ZERO).is_none());
}

#[test]
fn test_stats_by_path() {
  let looks = appearances(&Highlight::default(), 0.0);
  let edges = segments(&Highlight::default());
  let per_object = DrawList::build(DrawPath::PerObject, &looks, &edges).stats();
  let instanced = DrawList::build(DrawPath::Instanced, &looks, &edges).stats();
  assert_eq!(per_object.draw_calls, 12 + 11);
  assert_eq!(instanced.draw_calls, 2);
  assert_eq!(per_object.triangles, instanced.triangles);
  assert_eq!(DrawList::build(DrawPath::Instanced, &[], &[]).stats(), DrawStats::default());
}

/// Mixed LOD tiers get one instanced batch each, so both paths tessellate
/// every node the same way.
#[test]
fn test_instanced_batches_split_by_detail() {
  let tiers = [GeometryDetail::Low, GeometryDetail::High, GeometryDetail::Minimal, GeometryDetail::High];
  let looks: Vec<NodeAppearance> = nodes(12)
    .iter()
    .enumerate()
    .map(|(i, (node, position))| {
      NodeAppearance::resolve(node, *position, tiers[i % 4], &Highlight::default(), 0.0, &AppearanceParams::DEFAULT)
    })
    .collect();

  let per_object = DrawList::build(DrawPath::PerObject, &looks, &[]);
  let instanced = DrawList::build(DrawPath::Instanced, &looks, &[]);
  let DrawList::Instanced { nodes: batches, .. } = &instanced else {
    panic!("expected instanced draw list");
  };

  let details: Vec<GeometryDetail> = batches.iter().map(|b| b.detail).collect();
  assert_eq!(details, vec![GeometryDetail::High, GeometryDetail::Low, GeometryDetail::Minimal]);
  assert_eq!(batches[0].ids, vec![1, 3, 5, 7, 9, 11]);
  assert_eq!(instanced.node_count(), 12);

  let per_object_stats = per_object.stats();
  let instanced_stats = instanced.stats();
  assert_eq!(per_object_stats.triangles, instanced_stats.triangles);
  assert_eq!(instanced_stats.draw_calls, 3);

  let mut a = per_object.node_instances();
  let mut b = instanced.node_instances();
  a.sort_by_key(|(id, _, _)| *id);
  b.sort_by_key(|(id, _, _)| *id);
  assert_eq!(a, b);

  let ray = Ray::new(Vec3::new(10.0, 0.0, 50.0), Vec3::NEG_Z).unwrap();
  assert_eq!(instanced.pick(&ray), Some(2));
  assert_eq!(batches[2].pick(&ray), Some(2));
  assert_eq!(batches[0].pick(&ray), None);
}
