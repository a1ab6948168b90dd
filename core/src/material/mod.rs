//! Per-mesh-buffer material values.
//!
//! A [`Material`] is copied into every mesh buffer that uses it; nothing
//! here is shared by reference. The draw path only inspects
//! [`Material::polygon_mode`] to decide whether triangle lists are
//! redirected to line or point draws.

mod types;

pub use types::{AlphaMode, Material, PolygonMode};
