//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction for GPU backends, so the
//! hardware buffer cache works the same against any GPU API.
//!
//! # Available Backends
//!
//! - `dummy` (always available): Records every call, allocates nothing
//! - `wgpu-backend`: Cross-platform backend using wgpu
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait, which provides:
//! - Buffer creation, upload and release
//! - Draw submission from GPU buffers or, where supported, from CPU memory
//! - Limits the draw path checks before submitting

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_impl;

pub mod dummy;

use std::sync::Arc;

use crate::draw::DrawCall;
use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

/// Handle to a GPU buffer resource.
#[derive(Clone)]
pub enum GpuBuffer {
    /// Dummy backend (no GPU allocation)
    Dummy { id: u64, size: u64 },
    /// wgpu backend buffer
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Buffer>),
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy { id, size } => f
                .debug_struct("GpuBuffer::Dummy")
                .field("id", id)
                .field("size", size)
                .finish(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => f.debug_tuple("GpuBuffer::Wgpu").field(buffer).finish(),
        }
    }
}

impl GpuBuffer {
    /// Allocated size in bytes.
    pub fn size(&self) -> u64 {
        match self {
            Self::Dummy { size, .. } => *size,
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => buffer.size(),
        }
    }
}

static_assertions::assert_impl_all!(GpuBuffer: Send, Sync);

/// GPU backend trait for abstracting different GPU APIs.
///
/// Every call is synchronous from the caller's point of view: data written
/// with [`write_buffer`](Self::write_buffer) is visible to every draw
/// submitted after it returns.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError>;

    /// Write data to a buffer.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8])
    -> Result<(), GraphicsError>;

    /// Release a buffer resource.
    fn destroy_buffer(&self, buffer: GpuBuffer);

    /// Whether [`draw`](Self::draw) accepts vertex or index data straight
    /// from CPU memory.
    fn supports_client_side_draw(&self) -> bool;

    /// Largest primitive count a single draw call may request.
    fn max_primitive_count(&self) -> u32;

    /// Submit one draw call.
    fn draw(&self, call: &DrawCall<'_>) -> Result<(), GraphicsError>;
}

/// Selects and creates the appropriate backend based on available features.
pub fn create_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    // Try wgpu backend if available
    #[cfg(feature = "wgpu-backend")]
    {
        match wgpu_impl::WgpuBackend::new() {
            Ok(backend) => {
                log::info!("Using wgpu backend");
                return Ok(Arc::new(backend));
            }
            Err(e) => {
                log::warn!("Failed to create wgpu backend: {}", e);
            }
        }
    }

    // Fall back to dummy backend
    log::info!("Using dummy backend");
    Ok(Arc::new(dummy::DummyBackend::new()))
}

/// Check if a real GPU backend is available.
pub fn has_gpu_backend() -> bool {
    cfg!(feature = "wgpu-backend")
}
