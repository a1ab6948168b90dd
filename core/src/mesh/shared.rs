//! Shared ownership of mesh buffers.
//!
//! Owners hold a [`SharedMeshBuffer`]; caches hold a [`WeakMeshBuffer`] so a
//! mesh buffer dropped by every owner is noticed as gone instead of being
//! kept alive by its GPU copy.
//!
//! A typed handle coerces to the erased one without copying:
//!
//! ```ignore
//! let typed = Arc::new(RwLock::new(MeshBuffer::<Vertex>::new(IndexFormat::Uint16)));
//! let shared: SharedMeshBuffer = typed.clone();
//! assert_eq!(MeshBufferId::of(&shared), MeshBufferId::of(&typed));
//! ```

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::error::BufferError;
use super::mesh_buffer::MeshBufferData;

/// Reference-counted, lockable mesh buffer of any format.
pub type SharedMeshBuffer = Arc<RwLock<dyn MeshBufferData>>;

/// Non-owning reference to a [`SharedMeshBuffer`].
pub type WeakMeshBuffer = Weak<RwLock<dyn MeshBufferData>>;

/// Wrap a mesh buffer for shared use.
pub fn share<M: MeshBufferData + 'static>(mesh_buffer: M) -> SharedMeshBuffer {
    Arc::new(RwLock::new(mesh_buffer))
}

/// Identity of a shared mesh buffer.
///
/// Derived from the allocation address. The address stays reserved while
/// any strong or weak reference exists, so an id held next to a
/// [`WeakMeshBuffer`] cannot be reused by another buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshBufferId(usize);

impl MeshBufferId {
    pub fn of<M: MeshBufferData + ?Sized>(mesh_buffer: &Arc<RwLock<M>>) -> Self {
        Self(Arc::as_ptr(mesh_buffer) as *const () as usize)
    }

    pub fn of_weak<M: MeshBufferData + ?Sized>(mesh_buffer: &Weak<RwLock<M>>) -> Self {
        Self(Weak::as_ptr(mesh_buffer) as *const () as usize)
    }
}

/// Append all of `src` to `dst`.
///
/// Appending a buffer to itself is a no-op.
pub fn append_shared(dst: &SharedMeshBuffer, src: &SharedMeshBuffer) -> Result<(), BufferError> {
    if MeshBufferId::of(dst) == MeshBufferId::of(src) {
        log::debug!("ignoring append of a mesh buffer to itself");
        return Ok(());
    }
    let source = src.read();
    dst.write().append_from(&*source)
}
