//! Mesh buffer whose vertex format can change at runtime.
//!
//! Animated meshes sometimes need a second texture coordinate set or
//! tangent data added after loading. [`SkinnedMeshBuffer`] stores its
//! vertices as one of the supported formats and converts forward on demand:
//! `Standard -> TwoTCoords` and `Standard | TwoTCoords -> Tangents`.

use crate::material::Material;
use crate::math::Aabb;

use super::data::{IndexFormat, PrimitiveTopology};
use super::error::BufferError;
use super::index_buffer::{IndexBuffer, IndexBufferMut};
use super::mesh_buffer::{MeshBufferData, append_records, bounding_box_of};
use super::vertex::{Vertex, Vertex2TCoords, VertexFormat, VertexTangents, VertexType};
use super::vertex_buffer::{VertexBuffer, VertexBufferMut, VertexData, VertexDataMut};

/// Vertex storage of a [`SkinnedMeshBuffer`].
#[derive(Debug, Clone)]
pub enum SkinnedVertices {
    Standard(VertexBuffer<Vertex>),
    TwoTCoords(VertexBuffer<Vertex2TCoords>),
    Tangents(VertexBuffer<VertexTangents>),
}

impl Default for SkinnedVertices {
    fn default() -> Self {
        Self::Standard(VertexBuffer::new())
    }
}

impl SkinnedVertices {
    pub fn vertex_type(&self) -> VertexType {
        match self {
            Self::Standard(_) => VertexType::Standard,
            Self::TwoTCoords(_) => VertexType::TwoTCoords,
            Self::Tangents(_) => VertexType::Tangents,
        }
    }

    fn as_data(&self) -> &dyn VertexData {
        match self {
            Self::Standard(vb) => vb,
            Self::TwoTCoords(vb) => vb,
            Self::Tangents(vb) => vb,
        }
    }

    fn as_data_mut(&mut self) -> &mut dyn VertexDataMut {
        match self {
            Self::Standard(vb) => vb,
            Self::TwoTCoords(vb) => vb,
            Self::Tangents(vb) => vb,
        }
    }

    fn as_view_mut(&mut self) -> SkinnedVerticesMut<'_> {
        match self {
            Self::Standard(vb) => SkinnedVerticesMut::Standard(VertexBufferMut::new(vb)),
            Self::TwoTCoords(vb) => SkinnedVerticesMut::TwoTCoords(VertexBufferMut::new(vb)),
            Self::Tangents(vb) => SkinnedVerticesMut::Tangents(VertexBufferMut::new(vb)),
        }
    }

    fn succeed(self, previous: &dyn VertexData) -> Self {
        match self {
            Self::Standard(vb) => Self::Standard(vb.succeed(previous)),
            Self::TwoTCoords(vb) => Self::TwoTCoords(vb.succeed(previous)),
            Self::Tangents(vb) => Self::Tangents(vb.succeed(previous)),
        }
    }
}

/// Mutable view of the vertex storage of a [`SkinnedMeshBuffer`].
///
/// The format can only be changed through the conversion methods.
pub enum SkinnedVerticesMut<'a> {
    Standard(VertexBufferMut<'a, Vertex>),
    TwoTCoords(VertexBufferMut<'a, Vertex2TCoords>),
    Tangents(VertexBufferMut<'a, VertexTangents>),
}

/// Build the successor of `old` in format `W`.
///
/// The result inherits the mapping hint and cache handle and carries a
/// change counter one past the old one, so a cache always sees the new
/// storage as modified.
fn convert_buffer<V: VertexFormat, W: VertexFormat>(old: VertexBuffer<V>) -> VertexBuffer<W> {
    let (records, changed_id, hint, hw_buffer) = old.into_parts();
    let converted = records.iter().map(W::convert_from).collect();
    VertexBuffer::succeeding(converted, changed_id, hint, hw_buffer)
}

/// Mesh buffer with runtime-selected vertex format.
#[derive(Debug, Clone)]
pub struct SkinnedMeshBuffer {
    vertices: SkinnedVertices,
    indices: IndexBuffer,
    material: Material,
    bounding_box: Aabb,
    topology: PrimitiveTopology,
}

impl Default for SkinnedMeshBuffer {
    fn default() -> Self {
        Self::new(IndexFormat::Uint16)
    }
}

impl SkinnedMeshBuffer {
    /// Create an empty buffer of standard vertices.
    pub fn new(index_format: IndexFormat) -> Self {
        Self {
            vertices: SkinnedVertices::default(),
            indices: IndexBuffer::new(index_format),
            material: Material::default(),
            bounding_box: Aabb::default(),
            topology: PrimitiveTopology::default(),
        }
    }

    pub fn from_buffers(vertices: SkinnedVertices, indices: IndexBuffer) -> Self {
        let bounding_box = bounding_box_of(vertices.as_data());
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

    pub fn vertices(&self) -> &SkinnedVertices {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> SkinnedVerticesMut<'_> {
        self.vertices.as_view_mut()
    }

    /// Replace the vertex storage, in any format, and recompute the bounding
    /// box. The change history, mapping hint and cache handle carry over.
    pub fn set_vertices(&mut self, vertices: SkinnedVertices) {
        self.vertices = vertices.succeed(self.vertices.as_data());
        self.recalculate_bounding_box();
    }

    pub fn vertex_type(&self) -> VertexType {
        self.vertices.vertex_type()
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
    }

    pub fn recalculate_bounding_box(&mut self) {
        self.bounding_box = bounding_box_of(self.vertices.as_data());
    }

    /// Convert standard vertices to [`Vertex2TCoords`].
    ///
    /// Returns `Ok(false)` if the buffer already holds that format.
    pub fn convert_to_2tcoords(&mut self) -> Result<bool, BufferError> {
        match self.vertex_type() {
            VertexType::TwoTCoords => return Ok(false),
            VertexType::Tangents => {
                return Err(BufferError::UnsupportedConversion {
                    from: VertexType::Tangents,
                    to: VertexType::TwoTCoords,
                });
            }
            VertexType::Standard => {}
        }
        self.replace_vertices(|old| match old {
            SkinnedVertices::Standard(vb) => SkinnedVertices::TwoTCoords(convert_buffer(vb)),
            other => other,
        });
        Ok(true)
    }

    /// Convert to [`VertexTangents`]. Tangent and binormal start zeroed.
    ///
    /// Returns `Ok(false)` if the buffer already holds that format.
    pub fn convert_to_tangents(&mut self) -> Result<bool, BufferError> {
        if self.vertex_type() == VertexType::Tangents {
            return Ok(false);
        }
        self.replace_vertices(|old| match old {
            SkinnedVertices::Standard(vb) => SkinnedVertices::Tangents(convert_buffer(vb)),
            SkinnedVertices::TwoTCoords(vb) => SkinnedVertices::Tangents(convert_buffer(vb)),
            other => other,
        });
        Ok(true)
    }

    // The new storage is fully built before it is swapped in.
    fn replace_vertices(&mut self, convert: impl FnOnce(SkinnedVertices) -> SkinnedVertices) {
        let from = self.vertex_type();
        let old = std::mem::take(&mut self.vertices);
        self.vertices = convert(old);
        log::debug!(
            "skinned mesh buffer converted {:?} -> {:?} ({} vertices)",
            from,
            self.vertex_type(),
            self.vertices.as_data().count()
        );
    }

    /// Append geometry of any vertex format, converting to the current one.
    pub fn append<W: VertexFormat>(
        &mut self,
        vertices: &[W],
        indices: &[u32],
    ) -> Result<(), BufferError> {
        let bbox = &mut self.bounding_box;
        let ib = &mut self.indices;
        match &mut self.vertices {
            SkinnedVertices::Standard(vb) => {
                append_records(vb, ib, bbox, vertices.iter().map(Vertex::convert_from), indices)
            }
            SkinnedVertices::TwoTCoords(vb) => append_records(
                vb,
                ib,
                bbox,
                vertices.iter().map(Vertex2TCoords::convert_from),
                indices,
            ),
            SkinnedVertices::Tangents(vb) => append_records(
                vb,
                ib,
                bbox,
                vertices.iter().map(VertexTangents::convert_from),
                indices,
            ),
        }
    }
}

impl MeshBufferData for SkinnedMeshBuffer {
    fn vertex_data(&self) -> &dyn VertexData {
        self.vertices.as_data()
    }

    fn vertex_data_mut(&mut self) -> &mut dyn VertexDataMut {
        self.vertices.as_data_mut()
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
        let parts = (0..source.count()).map(|i| source.parts(i));
        let bbox = &mut self.bounding_box;
        let ib = &mut self.indices;
        match &mut self.vertices {
            SkinnedVertices::Standard(vb) => append_records(
                vb,
                ib,
                bbox,
                parts.map(|p| Vertex::from_parts(&p)),
                &indices,
            ),
            SkinnedVertices::TwoTCoords(vb) => append_records(
                vb,
                ib,
                bbox,
                parts.map(|p| Vertex2TCoords::from_parts(&p)),
                &indices,
            ),
            SkinnedVertices::Tangents(vb) => append_records(
                vb,
                ib,
                bbox,
                parts.map(|p| VertexTangents::from_parts(&p)),
                &indices,
            ),
        }
    }
}
