//! One cache entry: the GPU copy of a single mesh buffer.

use tessera_core::mesh::{
    BufferKind, ChangeId, HwBufferHandle, MappingHint, MeshBufferData, VertexType,
    WeakMeshBuffer,
};

use crate::backend::GpuBackend;
use crate::draw::GpuSlot;

/// Whether a link's GPU copy matches its mesh buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Fresh,
    /// At least one side must be uploaded again.
    Stale { vertex: bool, index: bool },
}

impl LinkState {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Snapshot of what was last uploaded for one mesh buffer, plus the backend
/// buffers holding it.
#[derive(Debug)]
pub struct HardwareBufferLink {
    pub(crate) source: WeakMeshBuffer,
    pub(crate) handle: HwBufferHandle,
    pub(crate) vertex_type: VertexType,
    pub(crate) changed_id_vertex: ChangeId,
    pub(crate) changed_id_index: ChangeId,
    pub(crate) mapped_vertex: MappingHint,
    pub(crate) mapped_index: MappingHint,
    pub(crate) last_used: u64,
    pub(crate) vertex_slot: GpuSlot,
    pub(crate) index_slot: GpuSlot,
}

impl HardwareBufferLink {
    pub(crate) fn new(
        source: WeakMeshBuffer,
        handle: HwBufferHandle,
        buffer: &dyn MeshBufferData,
        frame: u64,
    ) -> Self {
        Self {
            source,
            handle,
            vertex_type: buffer.vertex_type(),
            changed_id_vertex: buffer.changed_id(BufferKind::VERTEX),
            changed_id_index: buffer.changed_id(BufferKind::INDEX),
            mapped_vertex: buffer.hardware_mapping_hint(BufferKind::VERTEX),
            mapped_index: buffer.hardware_mapping_hint(BufferKind::INDEX),
            last_used: frame,
            vertex_slot: GpuSlot::default(),
            index_slot: GpuSlot::default(),
        }
    }

    /// Compare the snapshot against the current state of `buffer`.
    ///
    /// A side is stale when its change id or mapping hint moved since the
    /// last upload. A vertex format change makes the vertex side stale.
    pub fn state(&self, buffer: &dyn MeshBufferData) -> LinkState {
        let vertex = self.changed_id_vertex != buffer.changed_id(BufferKind::VERTEX)
            || self.mapped_vertex != buffer.hardware_mapping_hint(BufferKind::VERTEX)
            || self.vertex_type != buffer.vertex_type();
        let index = self.changed_id_index != buffer.changed_id(BufferKind::INDEX)
            || self.mapped_index != buffer.hardware_mapping_hint(BufferKind::INDEX);
        if vertex || index {
            LinkState::Stale { vertex, index }
        } else {
            LinkState::Fresh
        }
    }

    /// Record the vertex side of `buffer` as uploaded.
    pub(crate) fn sync_vertex(&mut self, buffer: &dyn MeshBufferData) {
        self.vertex_type = buffer.vertex_type();
        self.changed_id_vertex = buffer.changed_id(BufferKind::VERTEX);
        self.mapped_vertex = buffer.hardware_mapping_hint(BufferKind::VERTEX);
    }

    /// Record the index side of `buffer` as uploaded.
    pub(crate) fn sync_index(&mut self, buffer: &dyn MeshBufferData) {
        self.changed_id_index = buffer.changed_id(BufferKind::INDEX);
        self.mapped_index = buffer.hardware_mapping_hint(BufferKind::INDEX);
    }

    /// Release both backend buffers. Returns how many were released.
    pub(crate) fn release(&mut self, backend: &dyn GpuBackend) -> u32 {
        u32::from(self.vertex_slot.release(backend)) + u32::from(self.index_slot.release(backend))
    }

    pub fn handle(&self) -> HwBufferHandle {
        self.handle
    }

    pub fn vertex_type(&self) -> VertexType {
        self.vertex_type
    }

    pub fn changed_id_vertex(&self) -> ChangeId {
        self.changed_id_vertex
    }

    pub fn changed_id_index(&self) -> ChangeId {
        self.changed_id_index
    }

    pub fn mapped_vertex(&self) -> MappingHint {
        self.mapped_vertex
    }

    pub fn mapped_index(&self) -> MappingHint {
        self.mapped_index
    }

    /// Frame of the last draw through this link.
    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    pub fn vertex_slot(&self) -> &GpuSlot {
        &self.vertex_slot
    }

    pub fn index_slot(&self) -> &GpuSlot {
        &self.index_slot
    }

    /// Whether the mesh buffer is still owned by someone.
    pub fn is_source_alive(&self) -> bool {
        self.source.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_core::mesh::{IndexFormat, MeshBuffer, Vertex, share};

    fn link_for(buffer: &tessera_core::mesh::SharedMeshBuffer) -> HardwareBufferLink {
        HardwareBufferLink::new(
            Arc::downgrade(buffer),
            HwBufferHandle::new(1, 1),
            &*buffer.read(),
            0,
        )
    }

    #[test]
    fn test_state_tracks_each_side() {
        let mut mb = MeshBuffer::<Vertex>::new(IndexFormat::Uint16);
        mb.append(&[Vertex::default(); 3], &[0, 1, 2]).unwrap();
        let shared = share(mb);
        let mut link = link_for(&shared);
        assert!(link.state(&*shared.read()).is_fresh());

        shared.write().set_dirty(BufferKind::VERTEX);
        assert_eq!(
            link.state(&*shared.read()),
            LinkState::Stale {
                vertex: true,
                index: false
            }
        );
        link.sync_vertex(&*shared.read());
        assert!(link.state(&*shared.read()).is_fresh());

        shared
            .write()
            .set_hardware_mapping_hint(MappingHint::Stream, BufferKind::INDEX);
        assert_eq!(
            link.state(&*shared.read()),
            LinkState::Stale {
                vertex: false,
                index: true
            }
        );
    }

    #[test]
    fn test_source_liveness() {
        let shared = share(MeshBuffer::<Vertex>::new(IndexFormat::Uint16));
        let link = link_for(&shared);
        assert!(link.is_source_alive());
        drop(shared);
        assert!(!link.is_source_alive());
    }
}
