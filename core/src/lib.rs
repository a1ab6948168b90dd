//! # Tessera Core
//!
//! CPU-side geometry for the Tessera renderer: vertex formats and their
//! layouts, change-tracked vertex and index buffers, mesh buffers and the
//! shared handles hardware caches key on.

pub mod material;
pub mod math;
pub mod mesh;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
