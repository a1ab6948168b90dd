//! CPU-resident vertex storage with change tracking.

use crate::math::{Vec2, Vec3};

use super::tracking::{ChangeGuard, ChangeId, HwBufferHandle, MappingHint};
use super::vertex::{VertexFormat, VertexParts, VertexType};

/// Type-erased read access to a vertex buffer of any format.
///
/// This is the view the hardware buffer cache and the draw path work with.
pub trait VertexData: Send + Sync {
    fn vertex_type(&self) -> VertexType;

    /// Number of vertex records.
    fn count(&self) -> usize;

    /// Backing storage as raw bytes, `count() * stride` long.
    fn as_bytes(&self) -> &[u8];

    fn changed_id(&self) -> ChangeId;

    fn hardware_mapping_hint(&self) -> MappingHint;

    fn hw_buffer(&self) -> Option<HwBufferHandle>;

    fn position(&self, i: usize) -> Vec3;

    fn normal(&self, i: usize) -> Vec3;

    fn tcoords(&self, i: usize) -> Vec2;

    /// All fields of vertex `i` in format-neutral form.
    fn parts(&self, i: usize) -> VertexParts;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Type-erased bookkeeping mutations of a vertex buffer.
pub trait VertexDataMut: VertexData {
    fn set_dirty(&mut self);

    fn set_hardware_mapping_hint(&mut self, hint: MappingHint);

    fn set_hw_buffer(&mut self, handle: Option<HwBufferHandle>);
}

/// Owns an ordered sequence of vertex records of format `V`.
///
/// Every mutating call bumps [`changed_id`](Self::changed_id) exactly once.
/// Bulk mutation goes through [`data_mut`](Self::data_mut) or
/// [`vertices_mut`](Self::vertices_mut), whose guards bump on drop.
#[derive(Debug, Clone)]
pub struct VertexBuffer<V: VertexFormat> {
    vertices: Vec<V>,
    changed_id: ChangeId,
    mapping_hint: MappingHint,
    hw_buffer: Option<HwBufferHandle>,
}

impl<V: VertexFormat> Default for VertexBuffer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VertexFormat> VertexBuffer<V> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            changed_id: ChangeId::INITIAL,
            mapping_hint: MappingHint::default(),
            hw_buffer: None,
        }
    }

    pub fn from_vec(vertices: Vec<V>) -> Self {
        Self {
            vertices,
            ..Self::new()
        }
    }

    /// Build a buffer that continues the bookkeeping of a buffer it replaces.
    pub(crate) fn succeeding(
        vertices: Vec<V>,
        previous_id: ChangeId,
        mapping_hint: MappingHint,
        hw_buffer: Option<HwBufferHandle>,
    ) -> Self {
        Self {
            vertices,
            changed_id: previous_id.next(),
            mapping_hint,
            hw_buffer,
        }
    }

    /// Number of vertex records.
    pub fn count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn data(&self) -> &[V] {
        &self.vertices
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Mutable access to the records. The change counter is bumped when the
    /// guard is dropped.
    pub fn data_mut(&mut self) -> ChangeGuard<'_, [V]> {
        ChangeGuard::new(&mut self.vertices[..], &mut self.changed_id)
    }

    /// Mutable access to the backing vector, for edits that change the length.
    pub fn vertices_mut(&mut self) -> ChangeGuard<'_, Vec<V>> {
        ChangeGuard::new(&mut self.vertices, &mut self.changed_id)
    }

    /// Force the change counter forward without touching the data.
    pub fn set_dirty(&mut self) {
        self.changed_id.bump();
    }

    pub fn changed_id(&self) -> ChangeId {
        self.changed_id
    }

    pub fn hardware_mapping_hint(&self) -> MappingHint {
        self.mapping_hint
    }

    /// Change the usage hint. Does not bump the change counter.
    pub fn set_hardware_mapping_hint(&mut self, hint: MappingHint) {
        self.mapping_hint = hint;
    }

    pub fn hw_buffer(&self) -> Option<HwBufferHandle> {
        self.hw_buffer
    }

    pub fn set_hw_buffer(&mut self, handle: Option<HwBufferHandle>) {
        self.hw_buffer = handle;
    }

    pub fn push(&mut self, vertex: V) {
        self.vertices.push(vertex);
        self.changed_id.bump();
    }

    pub fn insert(&mut self, index: usize, vertex: V) {
        self.vertices.insert(index, vertex);
        self.changed_id.bump();
    }

    /// Resize to `len` records, filling new slots with `V::default()`.
    pub fn resize(&mut self, len: usize) {
        self.vertices.resize(len, V::default());
        self.changed_id.bump();
    }

    pub fn extend_from_slice(&mut self, vertices: &[V]) {
        self.vertices.extend_from_slice(vertices);
        self.changed_id.bump();
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.changed_id.bump();
    }

    /// Reserve capacity. Not a mutation of the contents.
    pub fn reserve(&mut self, additional: usize) {
        self.vertices.reserve(additional);
    }

    pub fn position(&self, i: usize) -> Vec3 {
        self.vertices[i].position()
    }

    pub fn normal(&self, i: usize) -> Vec3 {
        self.vertices[i].normal_vec()
    }

    pub fn tcoords(&self, i: usize) -> Vec2 {
        self.vertices[i].tcoords_vec()
    }

    pub fn set_position(&mut self, i: usize, pos: Vec3) {
        *self.vertices[i].pos_mut() = pos.into();
        self.changed_id.bump();
    }

    pub fn set_normal(&mut self, i: usize, normal: Vec3) {
        *self.vertices[i].normal_mut() = normal.into();
        self.changed_id.bump();
    }

    pub fn set_tcoords(&mut self, i: usize, tcoords: Vec2) {
        *self.vertices[i].tcoords_mut() = tcoords.into();
        self.changed_id.bump();
    }

    /// Take over the bookkeeping of `previous`, which this buffer replaces.
    ///
    /// The change counter continues one past the previous one, so a cache
    /// holding a snapshot of `previous` always sees the replacement as
    /// modified.
    pub(crate) fn succeed(self, previous: &dyn VertexData) -> Self {
        Self::succeeding(
            self.vertices,
            previous.changed_id(),
            previous.hardware_mapping_hint(),
            previous.hw_buffer(),
        )
    }

    pub(crate) fn into_parts(self) -> (Vec<V>, ChangeId, MappingHint, Option<HwBufferHandle>) {
        (
            self.vertices,
            self.changed_id,
            self.mapping_hint,
            self.hw_buffer,
        )
    }
}

/// Mutable access to a [`VertexBuffer`] owned by a mesh buffer.
///
/// Every mutation of the buffer is available, but the buffer itself cannot
/// be assigned or swapped out, so its change counter, mapping hint and
/// cache handle stay with the owner. Reads go through `Deref`.
pub struct VertexBufferMut<'a, V: VertexFormat> {
    buffer: &'a mut VertexBuffer<V>,
}

impl<'a, V: VertexFormat> VertexBufferMut<'a, V> {
    pub fn new(buffer: &'a mut VertexBuffer<V>) -> Self {
        Self { buffer }
    }

    pub fn data_mut(&mut self) -> ChangeGuard<'_, [V]> {
        self.buffer.data_mut()
    }

    pub fn vertices_mut(&mut self) -> ChangeGuard<'_, Vec<V>> {
        self.buffer.vertices_mut()
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

    pub fn push(&mut self, vertex: V) {
        self.buffer.push(vertex);
    }

    pub fn insert(&mut self, index: usize, vertex: V) {
        self.buffer.insert(index, vertex);
    }

    pub fn resize(&mut self, len: usize) {
        self.buffer.resize(len);
    }

    pub fn extend_from_slice(&mut self, vertices: &[V]) {
        self.buffer.extend_from_slice(vertices);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.buffer.reserve(additional);
    }

    pub fn set_position(&mut self, i: usize, pos: Vec3) {
        self.buffer.set_position(i, pos);
    }

    pub fn set_normal(&mut self, i: usize, normal: Vec3) {
        self.buffer.set_normal(i, normal);
    }

    pub fn set_tcoords(&mut self, i: usize, tcoords: Vec2) {
        self.buffer.set_tcoords(i, tcoords);
    }
}

impl<V: VertexFormat> std::ops::Deref for VertexBufferMut<'_, V> {
    type Target = VertexBuffer<V>;

    fn deref(&self) -> &Self::Target {
        self.buffer
    }
}

impl<V: VertexFormat> VertexData for VertexBuffer<V> {
    fn vertex_type(&self) -> VertexType {
        V::VERTEX_TYPE
    }

    fn count(&self) -> usize {
        self.vertices.len()
    }

    fn as_bytes(&self) -> &[u8] {
        VertexBuffer::as_bytes(self)
    }

    fn changed_id(&self) -> ChangeId {
        self.changed_id
    }

    fn hardware_mapping_hint(&self) -> MappingHint {
        self.mapping_hint
    }

    fn hw_buffer(&self) -> Option<HwBufferHandle> {
        self.hw_buffer
    }

    fn position(&self, i: usize) -> Vec3 {
        VertexBuffer::position(self, i)
    }

    fn normal(&self, i: usize) -> Vec3 {
        VertexBuffer::normal(self, i)
    }

    fn tcoords(&self, i: usize) -> Vec2 {
        VertexBuffer::tcoords(self, i)
    }

    fn parts(&self, i: usize) -> VertexParts {
        self.vertices[i].to_parts()
    }
}

impl<V: VertexFormat> VertexDataMut for VertexBuffer<V> {
    fn set_dirty(&mut self) {
        VertexBuffer::set_dirty(self);
    }

    fn set_hardware_mapping_hint(&mut self, hint: MappingHint) {
        VertexBuffer::set_hardware_mapping_hint(self, hint);
    }

    fn set_hw_buffer(&mut self, handle: Option<HwBufferHandle>) {
        VertexBuffer::set_hw_buffer(self, handle);
    }
}
