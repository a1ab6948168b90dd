//! Common utilities for cache integration tests.
//!
//! Builds a [`HardwareBufferCache`] over each test backend and a few mesh
//! buffers of known size.

use std::sync::Arc;

use tessera_graphics::mesh::generators::{generate_cube, generate_grid, generate_quad};
use tessera_graphics::mesh::{SharedMeshBuffer, share};
use tessera_graphics::{CacheConfig, DummyBackend, GpuBackend, HardwareBufferCache};

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Backends the cache is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Dummy backend that can draw from CPU memory.
    Dummy,
    /// Dummy backend limited to GPU buffers, like wgpu.
    DummyHardwareOnly,
    /// wgpu on whatever adapter the machine has.
    WebGpu,
}

impl Backend {
    /// Check if this backend is currently available.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Dummy | Backend::DummyHardwareOnly => true,
            #[cfg(feature = "wgpu-backend")]
            Backend::WebGpu => true,
            #[cfg(not(feature = "wgpu-backend"))]
            Backend::WebGpu => false,
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A cache plus the backend behind it.
pub struct TestContext {
    /// Set for the dummy backends, for inspecting backend activity.
    pub dummy: Option<Arc<DummyBackend>>,
    pub cache: HardwareBufferCache,
}

impl TestContext {
    /// Create a context with a config that caches every mesh buffer.
    pub fn new(backend: Backend) -> Option<Self> {
        Self::with_config(backend, CacheConfig::default().with_min_vertex_count(0))
    }

    /// Create a context, or `None` if the backend is unavailable here.
    pub fn with_config(backend: Backend, config: CacheConfig) -> Option<Self> {
        init_logging();
        if !backend.is_available() {
            return None;
        }
        let (gpu, dummy): (Arc<dyn GpuBackend>, _) = match backend {
            Backend::Dummy => {
                let dummy = Arc::new(DummyBackend::new());
                (dummy.clone(), Some(dummy))
            }
            Backend::DummyHardwareOnly => {
                let dummy = Arc::new(DummyBackend::new().with_client_side_draw(false));
                (dummy.clone(), Some(dummy))
            }
            Backend::WebGpu => (wgpu_backend()?, None),
        };
        Some(Self {
            dummy,
            cache: HardwareBufferCache::new(gpu, config),
        })
    }

    /// The dummy backend. Panics for other backends.
    pub fn dummy(&self) -> &DummyBackend {
        self.dummy.as_deref().expect("dummy backend")
    }

    /// Run `frames` empty frames.
    pub fn idle(&mut self, frames: u32) {
        for _ in 0..frames {
            self.cache.begin_frame();
            self.cache.end_frame();
        }
    }
}

#[cfg(feature = "wgpu-backend")]
fn wgpu_backend() -> Option<Arc<dyn GpuBackend>> {
    match tessera_graphics::backend::wgpu_impl::WgpuBackend::new() {
        Ok(backend) => Some(Arc::new(backend)),
        Err(e) => {
            eprintln!("wgpu backend not available: {e}");
            None
        }
    }
}

#[cfg(not(feature = "wgpu-backend"))]
fn wgpu_backend() -> Option<Arc<dyn GpuBackend>> {
    None
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Mesh Buffers
// ============================================================================

/// 4 vertices, 6 u16 indices.
pub fn quad() -> SharedMeshBuffer {
    share(generate_quad(1.0, 1.0))
}

/// 24 vertices, 36 u16 indices.
#[allow(dead_code)]
pub fn cube() -> SharedMeshBuffer {
    share(generate_cube(0.5))
}

/// 1024 vertices, 5766 u16 indices.
#[allow(dead_code)]
pub fn grid() -> SharedMeshBuffer {
    share(generate_grid(31, 10.0))
}
