//! Domain-cluster layout.
//!
//! Nodes are grouped by the second-level domain of their URL. Cluster
//! centers follow a Fibonacci sphere scaled by √cluster_count; members of a
//! cluster follow a Fibonacci sphere around their center scaled by
//! ∛cluster_size. URLs without a usable host go to the `"other"` bucket.

use std::collections::BTreeMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use super::sphere::fibonacci_sphere;
use super::{LayoutAlgorithm, ProgressReporter};
use crate::constants::{CLUSTER_NODE_SPACING, CLUSTER_SPACING, OTHER_DOMAIN};
use crate::types::{GraphInput, NodeId, PositionMap};

/// Domain-cluster layout parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
  /// Center spiral scale, multiplied by √cluster_count.
  pub cluster_spacing: f64,
  /// Member spiral scale, multiplied by ∛cluster_size.
  pub node_spacing: f64,
}

impl ClusterParams {
  pub const DEFAULT: Self = Self {
    cluster_spacing: CLUSTER_SPACING,
    node_spacing: CLUSTER_NODE_SPACING,
  };

  /// Group `graph` by domain and place each cluster center.
  ///
  /// Clusters are ordered by domain name; members keep input order.
  pub fn clusters(&self, graph: &GraphInput) -> Vec<Cluster> {
    let mut groups: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
    for node in &graph.nodes {
      let domain = second_level_domain(&node.url).unwrap_or_else(|| {
        tracing::trace!(id = node.id, url = %node.url, "no domain, using fallback bucket");
        OTHER_DOMAIN.to_string()
      });
      groups.entry(domain).or_default().push(node.id);
    }

    let count = groups.len();
    let radius = self.cluster_spacing * (count as f64).sqrt();
    groups
      .into_iter()
      .enumerate()
      .map(|(i, (domain, members))| Cluster {
        domain,
        center: spiral_point(i, count, radius),
        members,
      })
      .collect()
  }
}

impl Default for ClusterParams {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// One domain group.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
  pub domain: String,
  pub center: DVec3,
  pub members: Vec<NodeId>,
}

impl LayoutAlgorithm for ClusterParams {
  fn compute(&self, graph: &GraphInput, progress: &mut dyn FnMut(f64)) -> PositionMap {
    let mut reporter = ProgressReporter::new(progress, graph.node_count());
    let mut positions = PositionMap::with_capacity(graph.node_count());

    for cluster in self.clusters(graph) {
      let size = cluster.members.len();
      let radius = self.node_spacing * (size as f64).cbrt();
      for (slot, id) in cluster.members.iter().enumerate() {
        positions.insert(*id, cluster.center + spiral_point(slot, size, radius));
      }
      reporter.advance(positions.len());
    }

    reporter.finish();
    positions
  }
}

/// Fibonacci-sphere point scaled to `radius`; a lone point sits at the center.
fn spiral_point(index: usize, count: usize, radius: f64) -> DVec3 {
  if count <= 1 {
    DVec3::ZERO
  } else {
    fibonacci_sphere(index, count) * radius
  }
}

/// Second-level domain of `raw`, e.g. `"news.example.com"` → `"example.com"`.
///
/// Returns `None` for unparseable URLs and URLs without a host. IP hosts are
/// returned whole.
pub fn second_level_domain(raw: &str) -> Option<String> {
  let url = Url::parse(raw.trim()).ok()?;
  match url.host()? {
    Host::Domain(domain) => {
      let labels: Vec<&str> = domain
        .trim_end_matches('.')
        .split('.')
        .filter(|label| !label.is_empty())
        .collect();
      if labels.is_empty() {
        return None;
      }
      let start = labels.len().saturating_sub(2);
      Some(labels[start..].join(".").to_ascii_lowercase())
    }
    Host::Ipv4(addr) => Some(addr.to_string()),
    Host::Ipv6(addr) => Some(addr.to_string()),
  }
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod cluster_test;
