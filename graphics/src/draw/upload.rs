//! Uploading vertex and index bytes into backend buffers.

use tessera_core::mesh::{IndexFormat, MappingHint};

use crate::backend::{GpuBackend, GpuBuffer};
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, BufferUsage, UpdateFrequency};

/// A backend buffer that one side (vertex or index) of a mesh buffer is
/// uploaded into. Empty until the first upload.
#[derive(Debug, Default)]
pub struct GpuSlot {
    buffer: Option<GpuBuffer>,
    capacity: u64,
    frequency: UpdateFrequency,
}

/// What an upload did to a [`GpuSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    /// A buffer was created for an empty slot.
    Created,
    /// The old buffer was too small or had the wrong frequency and was replaced.
    Reallocated,
    /// The existing buffer was rewritten in place.
    Updated,
}

impl GpuSlot {
    pub fn buffer(&self) -> Option<&GpuBuffer> {
        self.buffer.as_ref()
    }

    pub fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }

    /// Allocated size in bytes, 0 when empty.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn frequency(&self) -> UpdateFrequency {
        self.frequency
    }

    /// Release the buffer, if any. Returns whether one was released.
    pub fn release(&mut self, backend: &dyn GpuBackend) -> bool {
        self.capacity = 0;
        match self.buffer.take() {
            Some(buffer) => {
                backend.destroy_buffer(buffer);
                true
            }
            None => false,
        }
    }

    /// Write `bytes` into the slot, growing or replacing the buffer if needed.
    ///
    /// On failure the previous buffer, if any, is kept untouched.
    pub fn write(
        &mut self,
        backend: &dyn GpuBackend,
        usage: BufferUsage,
        frequency: UpdateFrequency,
        bytes: &[u8],
        label: &str,
    ) -> Result<SlotWrite, GraphicsError> {
        let size = bytes.len() as u64;
        if let Some(buffer) = &self.buffer
            && self.capacity >= size
            && self.frequency == frequency
        {
            backend.write_buffer(buffer, 0, bytes)?;
            log::trace!("{}: rewrote {} bytes in place", label, size);
            return Ok(SlotWrite::Updated);
        }

        let descriptor = BufferDescriptor::new(size, usage | BufferUsage::COPY_DST)
            .with_label(label)
            .with_frequency(frequency);
        let buffer = backend.create_buffer(&descriptor)?;
        if let Err(e) = backend.write_buffer(&buffer, 0, bytes) {
            backend.destroy_buffer(buffer);
            return Err(e);
        }

        let outcome = match self.buffer.replace(buffer) {
            Some(old) => {
                backend.destroy_buffer(old);
                SlotWrite::Reallocated
            }
            None => SlotWrite::Created,
        };
        self.capacity = size;
        self.frequency = frequency;
        log::trace!("{}: {:?} buffer of {} bytes", label, outcome, size);
        Ok(outcome)
    }
}

/// Bytes and usage hint of one side of an upload.
#[derive(Debug, Clone, Copy)]
pub struct SideData<'a> {
    pub bytes: &'a [u8],
    pub hint: MappingHint,
}

/// Input to [`upload_data`].
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    /// Prefix of the backend buffer labels.
    pub label: &'a str,
    pub vertex_count: usize,
    pub vertex_stride: usize,
    /// Vertex bytes, `None` to leave the vertex slot alone.
    pub vertices: Option<SideData<'a>>,
    pub index_count: usize,
    pub index_format: IndexFormat,
    /// Index bytes, `None` to leave the index slot alone.
    pub indices: Option<SideData<'a>>,
}

/// Bookkeeping of a finished upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub vertex_bytes: u64,
    pub index_bytes: u64,
    pub buffers_created: u32,
    pub buffers_released: u32,
}

impl UploadReport {
    pub fn vertices_uploaded(&self) -> bool {
        self.vertex_bytes > 0
    }

    pub fn indices_uploaded(&self) -> bool {
        self.index_bytes > 0
    }

    fn record(&mut self, write: SlotWrite) {
        match write {
            SlotWrite::Created => self.buffers_created += 1,
            SlotWrite::Reallocated => {
                self.buffers_created += 1;
                self.buffers_released += 1;
            }
            SlotWrite::Updated => {}
        }
    }
}

fn payload<'a>(side: &SideData<'a>, len: usize, what: &str) -> Result<&'a [u8], GraphicsError> {
    side.bytes.get(..len).ok_or_else(|| {
        GraphicsError::InvalidParameter(format!(
            "{} data is {} bytes, expected at least {}",
            what,
            side.bytes.len(),
            len
        ))
    })
}

/// Upload the vertex and index sides of `request` into their slots.
///
/// Refuses when neither side has data. The vertex side uploads
/// `vertex_count * vertex_stride` bytes. The index side uploads
/// `index_count * index_format.size()` bytes, and only once a non-zero
/// vertex count exists; its buffer is created on first use. Each side's
/// backend buffer frequency comes from its mapping hint.
pub fn upload_data(
    backend: &dyn GpuBackend,
    request: &UploadRequest<'_>,
    vertex_slot: &mut GpuSlot,
    index_slot: &mut GpuSlot,
) -> Result<UploadReport, GraphicsError> {
    let vertices = request.vertices.filter(|_| request.vertex_count > 0);
    let indices = request.indices.filter(|_| request.index_count > 0);
    if vertices.is_none() && indices.is_none() {
        log::warn!("{}: upload with no vertex or index data", request.label);
        return Err(GraphicsError::InvalidParameter(
            "upload with no vertex or index data".to_string(),
        ));
    }

    let mut report = UploadReport::default();

    if let Some(side) = &vertices {
        let bytes = payload(side, request.vertex_count * request.vertex_stride, "vertex")?;
        let write = vertex_slot.write(
            backend,
            BufferUsage::VERTEX,
            side.hint.into(),
            bytes,
            &format!("{} vertices", request.label),
        )?;
        report.record(write);
        report.vertex_bytes = bytes.len() as u64;
    }

    if let Some(side) = &indices {
        if request.vertex_count == 0 {
            log::debug!(
                "{}: index upload skipped, no vertices yet",
                request.label
            );
        } else {
            let bytes = payload(
                side,
                request.index_count * request.index_format.size(),
                "index",
            )?;
            let write = index_slot.write(
                backend,
                BufferUsage::INDEX,
                side.hint.into(),
                bytes,
                &format!("{} indices", request.label),
            )?;
            report.record(write);
            report.index_bytes = bytes.len() as u64;
        }
    }

    Ok(report)
}
