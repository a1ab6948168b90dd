//! Draw planning and draw call assembly.

use tessera_core::material::Material;
use tessera_core::mesh::{
    AttributeMode, ComponentType, IndexFormat, PrimitiveTopology, VertexLayout, VertexType,
};

/// Vertices a 16-bit index can address.
const MAX_U16_VERTICES: usize = 65_536;

/// One vertex attribute as bound for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeBinding {
    /// Attribute slot, from the semantic.
    pub slot: u32,
    pub component_count: u8,
    pub component_type: ComponentType,
    pub mode: AttributeMode,
    /// Record stride in bytes.
    pub stride: u32,
    /// Byte offset within the record.
    pub offset: u32,
}

impl AttributeBinding {
    /// Bindings for every attribute in the registry entry of `vertex_type`.
    pub fn for_vertex_type(vertex_type: VertexType) -> Vec<AttributeBinding> {
        let layout = VertexLayout::of(vertex_type);
        layout
            .attributes()
            .iter()
            .map(|attr| AttributeBinding {
                slot: attr.semantic.slot(),
                component_count: attr.component_count,
                component_type: attr.component_type,
                mode: attr.mode,
                stride: layout.stride(),
                offset: attr.offset,
            })
            .collect()
    }
}

/// Where a draw reads vertex or index data from.
#[derive(Debug, Clone, Copy)]
pub enum DrawSource<'a> {
    /// A backend buffer.
    Gpu(&'a crate::backend::GpuBuffer),
    /// CPU memory, for backends that support client-side draws.
    Client(&'a [u8]),
}

impl DrawSource<'_> {
    pub fn is_gpu(&self) -> bool {
        matches!(self, Self::Gpu(_))
    }
}

/// Primitive and element counts for one draw, before any data is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawPlan {
    /// Topology of the source data.
    pub requested: PrimitiveTopology,
    /// Topology actually drawn, after wireframe or point-cloud redirection.
    pub topology: PrimitiveTopology,
    /// Primitives of the requested topology.
    pub primitive_count: u32,
    /// Indices (or vertices, when not indexed) the draw consumes.
    pub element_count: u32,
    /// Whether the index buffer is used.
    pub indexed: bool,
}

impl DrawPlan {
    /// Plan a draw of `index_count` indices over `vertex_count` vertices.
    ///
    /// Returns `None`, after logging, when the draw must be skipped: zero
    /// vertices or indices, a degenerate index count for the topology, or
    /// more primitives than the backend allows.
    pub fn new(
        topology: PrimitiveTopology,
        material: &Material,
        vertex_count: usize,
        index_count: usize,
        index_format: IndexFormat,
        max_primitive_count: u32,
    ) -> Option<Self> {
        if vertex_count == 0 || index_count == 0 {
            log::debug!(
                "skipping draw with {} vertices and {} indices",
                vertex_count,
                index_count
            );
            return None;
        }

        let primitive_count =
            topology.primitive_count(u32::try_from(index_count).unwrap_or(u32::MAX));
        if primitive_count == 0 {
            log::debug!(
                "skipping draw: {} indices form no {:?} primitive",
                index_count,
                topology
            );
            return None;
        }
        if primitive_count > max_primitive_count {
            log::error!(
                "draw requests {} primitives, backend maximum is {}",
                primitive_count,
                max_primitive_count
            );
            return None;
        }

        if index_format == IndexFormat::Uint16 && vertex_count > MAX_U16_VERTICES {
            log::warn!(
                "16-bit indices used with {} vertices, only the first {} are reachable",
                vertex_count,
                MAX_U16_VERTICES
            );
        }

        let plan = match topology {
            PrimitiveTopology::TriangleList if material.wireframe() => Self {
                requested: topology,
                topology: PrimitiveTopology::LineList,
                primitive_count,
                element_count: primitive_count * 3,
                indexed: true,
            },
            PrimitiveTopology::TriangleList if material.point_cloud() => Self {
                requested: topology,
                topology: PrimitiveTopology::PointList,
                primitive_count,
                element_count: primitive_count * 3,
                indexed: true,
            },
            PrimitiveTopology::PointList | PrimitiveTopology::PointSprites => Self {
                requested: topology,
                topology,
                primitive_count,
                element_count: primitive_count.min(vertex_count.min(u32::MAX as usize) as u32),
                indexed: false,
            },
            _ => Self {
                requested: topology,
                topology,
                primitive_count,
                element_count: topology.element_count(primitive_count),
                indexed: true,
            },
        };
        Some(plan)
    }

    /// Whether the drawn topology differs from the source topology.
    pub fn is_redirected(&self) -> bool {
        self.requested != self.topology
    }
}

/// Everything a backend needs to submit one draw.
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub plan: DrawPlan,
    pub vertex_type: VertexType,
    pub vertex_count: u32,
    pub vertices: DrawSource<'a>,
    /// Index data, present when [`DrawPlan::indexed`] is set.
    pub indices: Option<DrawSource<'a>>,
    pub index_format: IndexFormat,
    pub bindings: Vec<AttributeBinding>,
}

impl<'a> DrawCall<'a> {
    /// Assemble a draw, binding attributes from the vertex type registry.
    pub fn new(
        plan: DrawPlan,
        vertex_type: VertexType,
        vertex_count: usize,
        vertices: DrawSource<'a>,
        indices: DrawSource<'a>,
        index_format: IndexFormat,
    ) -> Self {
        Self {
            plan,
            vertex_type,
            vertex_count: u32::try_from(vertex_count).unwrap_or(u32::MAX),
            vertices,
            indices: plan.indexed.then_some(indices),
            index_format,
            bindings: AttributeBinding::for_vertex_type(vertex_type),
        }
    }

    /// True when no data is read from CPU memory.
    pub fn is_hardware(&self) -> bool {
        self.vertices.is_gpu() && self.indices.is_none_or(|i| i.is_gpu())
    }
}
