//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations. It keeps a ledger of
//! every buffer it hands out and of the most recent draws it received, so
//! the cache and draw path can be tested without GPU hardware. Allocation
//! failure can be switched on to exercise fallback paths.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tessera_core::mesh::{IndexFormat, PrimitiveTopology, VertexType};

use crate::draw::DrawCall;
use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

use super::{GpuBackend, GpuBuffer};

/// Summary of one draw received by the [`DummyBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub topology: PrimitiveTopology,
    pub primitive_count: u32,
    pub element_count: u32,
    pub vertex_count: u32,
    pub vertex_type: VertexType,
    pub index_format: Option<IndexFormat>,
    /// Ids of the GPU buffers read, `None` for CPU-side data.
    pub vertex_buffer: Option<u64>,
    pub index_buffer: Option<u64>,
}

/// Counters of backend activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DummyStats {
    pub live_buffers: usize,
    pub buffers_created: u64,
    pub buffers_destroyed: u64,
    pub writes: u64,
    pub bytes_written: u64,
    pub draws: u64,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u64,
    live: HashMap<u64, u64>,
    stats: DummyStats,
    draws: VecDeque<DrawRecord>,
    fail_allocations: bool,
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    state: Mutex<DummyState>,
    client_side_draw: bool,
    max_primitive_count: u32,
}

impl DummyBackend {
    /// Number of draws kept in the history. Older ones are dropped; the
    /// total count stays in [`DummyStats::draws`].
    pub const DRAW_HISTORY: usize = 1024;

    /// Create a new dummy backend that supports client-side draws.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DummyState::default()),
            client_side_draw: true,
            max_primitive_count: u32::MAX,
        }
    }

    /// Toggle support for drawing from CPU memory.
    pub fn with_client_side_draw(mut self, supported: bool) -> Self {
        self.client_side_draw = supported;
        self
    }

    /// Set the largest primitive count accepted per draw.
    pub fn with_max_primitive_count(mut self, max: u32) -> Self {
        self.max_primitive_count = max;
        self
    }

    /// Make every subsequent buffer creation fail with
    /// [`GraphicsError::OutOfMemory`].
    pub fn set_fail_allocations(&self, fail: bool) {
        self.state.lock().fail_allocations = fail;
    }

    pub fn stats(&self) -> DummyStats {
        let state = self.state.lock();
        DummyStats {
            live_buffers: state.live.len(),
            ..state.stats
        }
    }

    /// Most recent draws, oldest first.
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.lock().draws.iter().cloned().collect()
    }

    /// Drain the draw history.
    pub fn take_draws(&self) -> Vec<DrawRecord> {
        self.state.lock().draws.drain(..).collect()
    }

    pub fn last_draw(&self) -> Option<DrawRecord> {
        self.state.lock().draws.back().cloned()
    }

    /// Whether the buffer with `id` is allocated.
    pub fn is_live(&self, id: u64) -> bool {
        self.state.lock().live.contains_key(&id)
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn buffer_id(source: &crate::draw::DrawSource<'_>) -> Option<u64> {
    match source {
        crate::draw::DrawSource::Gpu(GpuBuffer::Dummy { id, .. }) => Some(*id),
        _ => None,
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        let mut state = self.state.lock();
        if state.fail_allocations {
            log::trace!(
                "DummyBackend: refusing buffer {:?} (size: {})",
                descriptor.label,
                descriptor.size
            );
            return Err(GraphicsError::OutOfMemory);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id, descriptor.size);
        state.stats.buffers_created += 1;
        log::trace!(
            "DummyBackend: creating buffer {:?} #{} (size: {})",
            descriptor.label,
            id,
            descriptor.size
        );
        Ok(GpuBuffer::Dummy {
            id,
            size: descriptor.size,
        })
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let GpuBuffer::Dummy { id, .. } = buffer else {
            return Err(GraphicsError::Internal(
                "write_buffer called with non-Dummy buffer".to_string(),
            ));
        };
        let mut state = self.state.lock();
        let Some(&size) = state.live.get(id) else {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer #{id} is not live"
            )));
        };
        let end = offset + data.len() as u64;
        if end > size {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at {} overruns buffer #{} of {} bytes",
                data.len(),
                offset,
                id,
                size
            )));
        }
        state.stats.writes += 1;
        state.stats.bytes_written += data.len() as u64;
        log::trace!("DummyBackend: wrote {} bytes to #{}", data.len(), id);
        Ok(())
    }

    fn destroy_buffer(&self, buffer: GpuBuffer) {
        if let GpuBuffer::Dummy { id, .. } = buffer {
            let mut state = self.state.lock();
            if state.live.remove(&id).is_some() {
                state.stats.buffers_destroyed += 1;
                log::trace!("DummyBackend: destroyed buffer #{}", id);
            } else {
                log::warn!("DummyBackend: buffer #{} destroyed twice", id);
            }
        }
    }

    fn supports_client_side_draw(&self) -> bool {
        self.client_side_draw
    }

    fn max_primitive_count(&self) -> u32 {
        self.max_primitive_count
    }

    fn draw(&self, call: &DrawCall<'_>) -> Result<(), GraphicsError> {
        if !self.client_side_draw && !call.is_hardware() {
            return Err(GraphicsError::FeatureNotSupported(
                "client-side draw".to_string(),
            ));
        }
        let record = DrawRecord {
            topology: call.plan.topology,
            primitive_count: call.plan.primitive_count,
            element_count: call.plan.element_count,
            vertex_count: call.vertex_count,
            vertex_type: call.vertex_type,
            index_format: call.indices.map(|_| call.index_format),
            vertex_buffer: buffer_id(&call.vertices),
            index_buffer: call.indices.as_ref().and_then(buffer_id),
        };
        log::trace!("DummyBackend: draw {:?}", record);
        let mut state = self.state.lock();
        state.stats.draws += 1;
        if state.draws.len() == Self::DRAW_HISTORY {
            state.draws.pop_front();
        }
        state.draws.push_back(record);
        Ok(())
    }
}
