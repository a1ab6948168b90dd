//! Change tracking and GPU bookkeeping shared by vertex and index buffers.

use bitflags::bitflags;

/// Expected mutation frequency of a buffer.
///
/// This is a usage hint for the GPU upload strategy, never a correctness
/// constraint: a `Static` buffer can still be modified, it just costs more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MappingHint {
    /// Keep the data in CPU memory only.
    Never,
    /// Uploaded once, rarely changed.
    #[default]
    Static,
    /// Changed now and then.
    Dynamic,
    /// Changed every frame.
    Stream,
}

bitflags! {
    /// Selects the vertex buffer, the index buffer, or both, of a mesh buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferKind: u8 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const BOTH = Self::VERTEX.bits() | Self::INDEX.bits();
    }
}

/// Monotonic per-buffer change counter.
///
/// Starts at 1 and grows by one on every mutation. Only ever compared for
/// equality with a snapshot, so wrapping is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeId(u32);

impl Default for ChangeId {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl ChangeId {
    pub const INITIAL: Self = Self(1);

    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn bump(&mut self) {
        *self = self.next();
    }
}

impl From<ChangeId> for u32 {
    fn from(id: ChangeId) -> u32 {
        id.0
    }
}

/// Opaque reference a hardware buffer cache leaves on the buffers it manages.
///
/// The buffer stores it and hands it back, nothing more. The pair
/// identifies the cache instance and the link inside that cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HwBufferHandle {
    cache: u64,
    link: u64,
}

impl HwBufferHandle {
    pub const fn new(cache: u64, link: u64) -> Self {
        Self { cache, link }
    }

    /// Identifier of the owning cache.
    pub const fn cache(&self) -> u64 {
        self.cache
    }

    /// Identifier of the link within the owning cache.
    pub const fn link(&self) -> u64 {
        self.link
    }
}

/// Mutable view over buffer contents.
///
/// Bumps the owning buffer's [`ChangeId`] exactly once when dropped, so
/// raw mutation can never go unnoticed by the cache.
pub struct ChangeGuard<'a, T: ?Sized> {
    data: &'a mut T,
    changed_id: &'a mut ChangeId,
}

impl<'a, T: ?Sized> ChangeGuard<'a, T> {
    pub fn new(data: &'a mut T, changed_id: &'a mut ChangeId) -> Self {
        Self { data, changed_id }
    }
}

impl<T: ?Sized> std::ops::Deref for ChangeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<T: ?Sized> std::ops::DerefMut for ChangeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data
    }
}

impl<T: ?Sized> Drop for ChangeGuard<'_, T> {
    fn drop(&mut self) {
        self.changed_id.bump();
    }
}
