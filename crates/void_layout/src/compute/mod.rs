//! Off-frame layout computation.

pub mod host;

pub use host::{AsyncComputeHost, ComputeEvent, ComputeRequest, LayoutHandle, RequestToken};
