//! # Tessera Graphics
//!
//! GPU side of the Tessera geometry layer: keeps a GPU copy of each mesh
//! buffer and draws it.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`HardwareBufferCache`] - Maps mesh buffers to GPU buffers, re-uploads
//!   stale data and evicts unused entries
//! - [`GpuBackend`] - Trait for graphics backend implementations
//! - [`draw`] - Upload and draw-call assembly shared by every backend
//! - Multiple backend support: wgpu, and Dummy (for testing)
//!
//! ## Example
//!
//! ```ignore
//! use tessera_graphics::{CacheConfig, HardwareBufferCache, create_backend};
//!
//! let mut cache = HardwareBufferCache::new(create_backend()?, CacheConfig::default());
//! cache.begin_frame();
//! cache.draw_mesh_buffer(&mesh, &material);
//! cache.end_frame();
//! ```

pub mod backend;
pub mod cache;
pub mod draw;
pub mod error;
pub mod types;

pub use tessera_core::{material, mesh};

// Re-export main types for convenience
pub use backend::dummy::DummyBackend;
pub use backend::{GpuBackend, GpuBuffer, create_backend, has_gpu_backend};
pub use cache::{
    CacheConfig, DrawOutcome, FrameStats, HardwareBufferCache, HardwareBufferLink, LinkState,
};
pub use error::GraphicsError;
pub use types::{BufferDescriptor, BufferUsage, UpdateFrequency};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// Logs the version; call once before creating a backend.
pub fn init() {
    log::info!("Tessera Graphics v{} initialized", VERSION);
}
