//! CPU-resident index storage of a fixed width.

use super::data::{IndexFormat, PrimitiveTopology};
use super::error::BufferError;
use super::tracking::{ChangeGuard, ChangeId, HwBufferHandle, MappingHint};

#[derive(Debug, Clone, PartialEq, Eq)]
enum IndexStorage {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

/// Owns index values of a width chosen at construction.
///
/// Shares the bookkeeping of [`VertexBuffer`](super::VertexBuffer): a change
/// counter bumped by every mutation, a mapping hint and a cache handle slot.
#[derive(Debug, Clone)]
pub struct IndexBuffer {
    storage: IndexStorage,
    changed_id: ChangeId,
    mapping_hint: MappingHint,
    hw_buffer: Option<HwBufferHandle>,
}

impl Default for IndexBuffer {
    fn default() -> Self {
        Self::new(IndexFormat::default())
    }
}

impl IndexBuffer {
    pub fn new(format: IndexFormat) -> Self {
        let storage = match format {
            IndexFormat::Uint16 => IndexStorage::U16(Vec::new()),
            IndexFormat::Uint32 => IndexStorage::U32(Vec::new()),
        };
        Self {
            storage,
            changed_id: ChangeId::INITIAL,
            mapping_hint: MappingHint::default(),
            hw_buffer: None,
        }
    }

    pub fn from_u16(indices: Vec<u16>) -> Self {
        Self {
            storage: IndexStorage::U16(indices),
            ..Self::new(IndexFormat::Uint16)
        }
    }

    pub fn from_u32(indices: Vec<u32>) -> Self {
        Self {
            storage: IndexStorage::U32(indices),
            ..Self::new(IndexFormat::Uint32)
        }
    }

    pub fn index_format(&self) -> IndexFormat {
        match self.storage {
            IndexStorage::U16(_) => IndexFormat::Uint16,
            IndexStorage::U32(_) => IndexFormat::Uint32,
        }
    }

    pub fn count(&self) -> usize {
        match &self.storage {
            IndexStorage::U16(v) => v.len(),
            IndexStorage::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Index `i`, widened to `u32`.
    pub fn get(&self, i: usize) -> u32 {
        match &self.storage {
            IndexStorage::U16(v) => v[i] as u32,
            IndexStorage::U32(v) => v[i],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.count()).map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            IndexStorage::U16(v) => bytemuck::cast_slice(v),
            IndexStorage::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Mutable access to 16-bit storage. `None` for 32-bit buffers.
    pub fn data_mut_u16(&mut self) -> Option<ChangeGuard<'_, Vec<u16>>> {
        match &mut self.storage {
            IndexStorage::U16(v) => Some(ChangeGuard::new(v, &mut self.changed_id)),
            IndexStorage::U32(_) => None,
        }
    }

    /// Mutable access to 32-bit storage. `None` for 16-bit buffers.
    pub fn data_mut_u32(&mut self) -> Option<ChangeGuard<'_, Vec<u32>>> {
        match &mut self.storage {
            IndexStorage::U32(v) => Some(ChangeGuard::new(v, &mut self.changed_id)),
            IndexStorage::U16(_) => None,
        }
    }

    /// Append one index.
    ///
    /// # Panics
    ///
    /// If `value` does not fit the index width. Use [`try_push`](Self::try_push)
    /// for values of unknown range.
    pub fn push(&mut self, value: u32) {
        if let Err(e) = self.try_push(value) {
            panic!("{e}");
        }
    }

    pub fn try_push(&mut self, value: u32) -> Result<(), BufferError> {
        match &mut self.storage {
            IndexStorage::U16(v) => v.push(narrow(value)?),
            IndexStorage::U32(v) => v.push(value),
        }
        self.changed_id.bump();
        Ok(())
    }

    /// Overwrite index `i`.
    ///
    /// # Panics
    ///
    /// If `i` is out of range or `value` does not fit the index width.
    pub fn set(&mut self, i: usize, value: u32) {
        match &mut self.storage {
            IndexStorage::U16(v) => match narrow(value) {
                Ok(narrowed) => v[i] = narrowed,
                Err(e) => panic!("{e}"),
            },
            IndexStorage::U32(v) => v[i] = value,
        }
        self.changed_id.bump();
    }

    /// Append indices, all or nothing.
    pub fn try_extend(&mut self, values: &[u32]) -> Result<(), BufferError> {
        self.try_extend_offset(values, 0)
    }

    /// Append `values[i] + offset` for every value, all or nothing.
    pub fn try_extend_offset(&mut self, values: &[u32], offset: u32) -> Result<(), BufferError> {
        self.check_fits(values, offset)?;
        match &mut self.storage {
            IndexStorage::U16(v) => v.extend(values.iter().map(|&i| (i + offset) as u16)),
            IndexStorage::U32(v) => v.extend(values.iter().map(|&i| i + offset)),
        }
        self.changed_id.bump();
        Ok(())
    }

    /// Check that `values[i] + offset` fits the index width for every value.
    pub fn check_fits(&self, values: &[u32], offset: u32) -> Result<(), BufferError> {
        let format = self.index_format();
        let max = format.max_index() as u64;
        match values.iter().find(|&&v| v as u64 + offset as u64 > max) {
            Some(&bad) => Err(BufferError::IndexOverflow {
                index: bad as u64 + offset as u64,
                format,
            }),
            None => Ok(()),
        }
    }

    pub fn clear(&mut self) {
        match &mut self.storage {
            IndexStorage::U16(v) => v.clear(),
            IndexStorage::U32(v) => v.clear(),
        }
        self.changed_id.bump();
    }

    pub fn reserve(&mut self, additional: usize) {
        match &mut self.storage {
            IndexStorage::U16(v) => v.reserve(additional),
            IndexStorage::U32(v) => v.reserve(additional),
        }
    }

    pub fn set_dirty(&mut self) {
        self.changed_id.bump();
    }

    pub fn changed_id(&self) -> ChangeId {
        self.changed_id
    }

    pub fn hardware_mapping_hint(&self) -> MappingHint {
        self.mapping_hint
    }

    pub fn set_hardware_mapping_hint(&mut self, hint: MappingHint) {
        self.mapping_hint = hint;
    }

    pub fn hw_buffer(&self) -> Option<HwBufferHandle> {
        self.hw_buffer
    }

    pub fn set_hw_buffer(&mut self, handle: Option<HwBufferHandle>) {
        self.hw_buffer = handle;
    }

    /// Take over the bookkeeping of `previous`, which this buffer replaces.
    ///
    /// Keeps this buffer's indices and width. The change counter continues
    /// one past the previous one.
    pub(crate) fn succeed(self, previous: &IndexBuffer) -> Self {
        Self {
            storage: self.storage,
            changed_id: previous.changed_id.next(),
            mapping_hint: previous.mapping_hint,
            hw_buffer: previous.hw_buffer,
        }
    }

    /// Number of primitives the current indices form under `topology`.
    pub fn primitive_count(&self, topology: PrimitiveTopology) -> u32 {
        topology.primitive_count(self.count() as u32)
    }
}

/// Mutable access to an [`IndexBuffer`] owned by a mesh buffer.
///
/// Like [`VertexBufferMut`](super::VertexBufferMut), it forwards every
/// mutation but never hands out the buffer itself.
pub struct IndexBufferMut<'a> {
    buffer: &'a mut IndexBuffer,
}

impl<'a> IndexBufferMut<'a> {
    pub fn new(buffer: &'a mut IndexBuffer) -> Self {
        Self { buffer }
    }

    pub fn data_mut_u16(&mut self) -> Option<ChangeGuard<'_, Vec<u16>>> {
        self.buffer.data_mut_u16()
    }

    pub fn data_mut_u32(&mut self) -> Option<ChangeGuard<'_, Vec<u32>>> {
        self.buffer.data_mut_u32()
    }

    pub fn push(&mut self, value: u32) {
        self.buffer.push(value);
    }

    pub fn try_push(&mut self, value: u32) -> Result<(), BufferError> {
        self.buffer.try_push(value)
    }

    pub fn set(&mut self, i: usize, value: u32) {
        self.buffer.set(i, value);
    }

    pub fn try_extend(&mut self, values: &[u32]) -> Result<(), BufferError> {
        self.buffer.try_extend(values)
    }

    pub fn try_extend_offset(&mut self, values: &[u32], offset: u32) -> Result<(), BufferError> {
        self.buffer.try_extend_offset(values, offset)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.buffer.reserve(additional);
    }

    pub fn set_dirty(&mut self) {
        self.buffer.set_dirty();
    }

    pub fn set_hardware_mapping_hint(&mut self, hint: MappingHint) {
        self.buffer.set_hardware_mapping_hint(hint);
    }

    pub fn set_hw_buffer(&mut self, handle: Option<HwBufferHandle>) {
        self.buffer.set_hw_buffer(handle);
    }
}

impl std::ops::Deref for IndexBufferMut<'_> {
    type Target = IndexBuffer;

    fn deref(&self) -> &Self::Target {
        self.buffer
    }
}

fn narrow(value: u32) -> Result<u16, BufferError> {
    u16::try_from(value).map_err(|_| BufferError::IndexOverflow {
        index: value as u64,
        format: IndexFormat::Uint16,
    })
}
