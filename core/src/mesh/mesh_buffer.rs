//! Mesh buffers: one vertex buffer, one index buffer, a material and a box.

use crate::material::Material;
use crate::math::{Aabb, Vec3};

use super::data::{IndexFormat, PrimitiveTopology};
use super::error::BufferError;
use super::index_buffer::{IndexBuffer, IndexBufferMut};
use super::tracking::{BufferKind, ChangeId, HwBufferHandle, MappingHint};
use super::vertex::{VertexFormat, VertexType};
use super::vertex_buffer::{VertexBuffer, VertexBufferMut, VertexData, VertexDataMut};

/// Type-erased view of a mesh buffer.
///
/// The hardware buffer cache only ever sees mesh buffers through this trait,
/// so plain and skinned buffers are cached the same way.
pub trait MeshBufferData: Send + Sync {
    fn vertex_data(&self) -> &dyn VertexData;

    fn vertex_data_mut(&mut self) -> &mut dyn VertexDataMut;

    fn indices(&self) -> &IndexBuffer;

    fn indices_mut(&mut self) -> IndexBufferMut<'_>;

    fn material(&self) -> &Material;

    fn bounding_box(&self) -> &Aabb;

    fn topology(&self) -> PrimitiveTopology;

    /// Append every vertex and index of `other`, converting vertices to
    /// this buffer's format.
    fn append_from(&mut self, other: &dyn MeshBufferData) -> Result<(), BufferError>;

    fn vertex_type(&self) -> VertexType {
        self.vertex_data().vertex_type()
    }

    fn vertex_count(&self) -> usize {
        self.vertex_data().count()
    }

    fn index_count(&self) -> usize {
        self.indices().count()
    }

    fn index_format(&self) -> IndexFormat {
        self.indices().index_format()
    }

    /// Byte footprint of the vertex and index data.
    fn size_in_bytes(&self) -> usize {
        self.vertex_count() * self.vertex_type().stride()
            + self.index_count() * self.index_format().size()
    }

    fn changed_id(&self, kind: BufferKind) -> ChangeId {
        if kind == BufferKind::INDEX {
            self.indices().changed_id()
        } else {
            self.vertex_data().changed_id()
        }
    }

    fn hardware_mapping_hint(&self, kind: BufferKind) -> MappingHint {
        if kind == BufferKind::INDEX {
            self.indices().hardware_mapping_hint()
        } else {
            self.vertex_data().hardware_mapping_hint()
        }
    }

    fn set_dirty(&mut self, kind: BufferKind) {
        if kind.contains(BufferKind::VERTEX) {
            self.vertex_data_mut().set_dirty();
        }
        if kind.contains(BufferKind::INDEX) {
            self.indices_mut().set_dirty();
        }
    }

    fn set_hardware_mapping_hint(&mut self, hint: MappingHint, kind: BufferKind) {
        if kind.contains(BufferKind::VERTEX) {
            self.vertex_data_mut().set_hardware_mapping_hint(hint);
        }
        if kind.contains(BufferKind::INDEX) {
            self.indices_mut().set_hardware_mapping_hint(hint);
        }
    }

    /// Handle left by the hardware buffer cache, read from the vertex side.
    fn hw_buffer(&self) -> Option<HwBufferHandle> {
        self.vertex_data().hw_buffer()
    }

    fn set_hw_buffer(&mut self, handle: Option<HwBufferHandle>) {
        self.vertex_data_mut().set_hw_buffer(handle);
        self.indices_mut().set_hw_buffer(handle);
    }
}

/// Append converted vertices and rebased indices to a vertex/index pair,
/// growing `bbox` by the new positions.
///
/// All or nothing: indices are range-checked before anything is modified.
pub(crate) fn append_records<V, I>(
    vertices: &mut VertexBuffer<V>,
    indices: &mut IndexBuffer,
    bbox: &mut Aabb,
    incoming: I,
    new_indices: &[u32],
) -> Result<(), BufferError>
where
    V: VertexFormat,
    I: IntoIterator<Item = V>,
{
    let vertex_count = vertices.count();
    let was_empty = vertex_count == 0;
    let offset = if was_empty {
        0
    } else {
        u32::try_from(vertex_count).map_err(|_| BufferError::IndexOverflow {
            index: vertex_count as u64,
            format: indices.index_format(),
        })?
    };
    indices.check_fits(new_indices, offset)?;

    let converted: Vec<V> = incoming.into_iter().collect();

    for (n, v) in converted.iter().enumerate() {
        let p = v.position();
        if was_empty && n == 0 {
            bbox.reset(p);
        } else {
            bbox.add_point(p);
        }
    }
    if !converted.is_empty() {
        vertices.extend_from_slice(&converted);
    }
    if !new_indices.is_empty() {
        indices.try_extend_offset(new_indices, offset)?;
    }
    Ok(())
}

/// Recompute a box from every vertex position, or a point at the origin
/// when there are none.
pub(crate) fn bounding_box_of(vertices: &dyn VertexData) -> Aabb {
    let mut bbox = Aabb::at(if vertices.is_empty() {
        Vec3::zeros()
    } else {
        vertices.position(0)
    });
    for i in 1..vertices.count() {
        bbox.add_point(vertices.position(i));
    }
    bbox
}

/// Drawable geometry of a single vertex format.
///
/// The bounding box is only updated by [`append`](Self::append) and
/// [`recalculate_bounding_box`](Self::recalculate_bounding_box); editing
/// vertices directly leaves it as it was.
#[derive(Debug, Clone)]
pub struct MeshBuffer<V: VertexFormat> {
    vertices: VertexBuffer<V>,
    indices: IndexBuffer,
    material: Material,
    bounding_box: Aabb,
    topology: PrimitiveTopology,
}

impl<V: VertexFormat> Default for MeshBuffer<V> {
    fn default() -> Self {
        Self::new(IndexFormat::Uint16)
    }
}

impl<V: VertexFormat> MeshBuffer<V> {
    /// Create an empty triangle-list mesh buffer.
    pub fn new(index_format: IndexFormat) -> Self {
        Self {
            vertices: VertexBuffer::new(),
            indices: IndexBuffer::new(index_format),
            material: Material::default(),
            bounding_box: Aabb::default(),
            topology: PrimitiveTopology::default(),
        }
    }

    /// Build from existing buffers and compute the bounding box.
    pub fn from_buffers(vertices: VertexBuffer<V>, indices: IndexBuffer) -> Self {
        let bounding_box = bounding_box_of(&vertices);
        Self {
            vertices,
            indices,
            material: Material::default(),
            bounding_box,
            topology: PrimitiveTopology::default(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_hardware_mapping_hint(mut self, hint: MappingHint, kind: BufferKind) -> Self {
        MeshBufferData::set_hardware_mapping_hint(&mut self, hint, kind);
        self
    }

    pub fn vertices(&self) -> &VertexBuffer<V> {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> VertexBufferMut<'_, V> {
        VertexBufferMut::new(&mut self.vertices)
    }

    /// Replace every vertex record and recompute the bounding box.
    ///
    /// The change history, mapping hint and cache handle of the current
    /// vertex buffer carry over; those of `vertices` are discarded.
    pub fn set_vertices(&mut self, vertices: VertexBuffer<V>) {
        self.vertices = vertices.succeed(&self.vertices);
        self.recalculate_bounding_box();
    }

    pub fn indices(&self) -> &IndexBuffer {
        &self.indices
    }

    pub fn indices_mut(&mut self) -> IndexBufferMut<'_> {
        IndexBufferMut::new(&mut self.indices)
    }

    /// Replace the index buffer, possibly with one of another width.
    ///
    /// Bookkeeping carries over as in [`set_vertices`](Self::set_vertices).
    pub fn set_indices(&mut self, indices: IndexBuffer) {
        self.indices = indices.succeed(&self.indices);
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
    }

    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    pub fn set_bounding_box(&mut self, bbox: Aabb) {
        self.bounding_box = bbox;
    }

    pub fn recalculate_bounding_box(&mut self) {
        self.bounding_box = bounding_box_of(&self.vertices);
    }

    /// Append geometry of any vertex format.
    ///
    /// Vertices are converted to `V`. When this buffer already has vertices,
    /// every new index is rebased by the pre-append vertex count so it points
    /// at the newly appended vertices. On error nothing is modified.
    pub fn append<W: VertexFormat>(
        &mut self,
        vertices: &[W],
        indices: &[u32],
    ) -> Result<(), BufferError> {
        append_records(
            &mut self.vertices,
            &mut self.indices,
            &mut self.bounding_box,
            vertices.iter().map(V::convert_from),
            indices,
        )
    }

    /// Byte footprint of the vertex and index data.
    pub fn size_in_bytes(&self) -> usize {
        MeshBufferData::size_in_bytes(self)
    }
}

impl<V: VertexFormat> MeshBufferData for MeshBuffer<V> {
    fn vertex_data(&self) -> &dyn VertexData {
        &self.vertices
    }

    fn vertex_data_mut(&mut self) -> &mut dyn VertexDataMut {
        &mut self.vertices
    }

    fn indices(&self) -> &IndexBuffer {
        &self.indices
    }

    fn indices_mut(&mut self) -> IndexBufferMut<'_> {
        IndexBufferMut::new(&mut self.indices)
    }

    fn material(&self) -> &Material {
        &self.material
    }

    fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn append_from(&mut self, other: &dyn MeshBufferData) -> Result<(), BufferError> {
        let source = other.vertex_data();
        let indices = other.indices().to_vec();
        append_records(
            &mut self.vertices,
            &mut self.indices,
            &mut self.bounding_box,
            (0..source.count()).map(|i| V::from_parts(&source.parts(i))),
            &indices,
        )
    }
}
