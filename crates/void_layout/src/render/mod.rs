//! Render-facing output: draw path selection and batch construction.
//!
//! Nothing here talks to a GPU. The types are plain buffers a renderer
//! uploads as-is.

pub mod instancing;
pub mod strategy;

pub use instancing::{
  AppearanceParams, DrawList, DrawStats, EdgeBatch, EdgeSegment, Highlight, InstanceBatch, NodeAppearance,
  ObjectDraw, Ray,
};
pub use strategy::{DrawPath, RenderPlan, RenderThresholds};
