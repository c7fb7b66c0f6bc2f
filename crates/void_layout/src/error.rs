//! Error types.
//!
//! Nothing in the engine is process-fatal. These errors surface at the few
//! boundaries where a caller has to pick a fallback.

use thiserror::Error;

/// Layout dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
  #[error("unsupported layout mode `{0}`")]
  UnsupportedMode(String),
}

/// LOD table construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LodTableError {
  #[error("LOD table has no levels")]
  Empty,
  #[error("LOD level {index} has a smaller max distance than the level before it")]
  Unsorted { index: usize },
  #[error("last LOD level must have an unbounded max distance")]
  MissingCatchAll,
}

/// Background layout errors.
#[derive(Debug, Error)]
pub enum ComputeError {
  #[error("failed to build background layout pool: {0}")]
  PoolBuild(#[from] rayon::ThreadPoolBuildError),
  #[error("failed to start background layout dispatcher: {0}")]
  Spawn(#[from] std::io::Error),
  #[error("background layout context went away before replying")]
  Disconnected,
  #[error("timed out waiting for background layout")]
  Timeout,
  #[error("background layout failed: {0}")]
  Failed(String),
}

/// Engine configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read engine config: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to parse engine config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("invalid engine config: {0}")]
  Invalid(String),
  #[error(transparent)]
  Lod(#[from] LodTableError),
}
