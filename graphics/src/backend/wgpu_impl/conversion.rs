//! Type conversions between Tessera types and wgpu types.

use tessera_core::mesh::{
    AttributeMode, ComponentType, IndexFormat, PrimitiveTopology, VertexLayout,
};

use crate::types::BufferUsage;

/// Convert BufferUsage flags to wgpu buffer usages.
pub fn convert_buffer_usage(usage: BufferUsage) -> wgpu::BufferUsages {
    let mut result = wgpu::BufferUsages::empty();

    if usage.contains(BufferUsage::VERTEX) {
        result |= wgpu::BufferUsages::VERTEX;
    }
    if usage.contains(BufferUsage::INDEX) {
        result |= wgpu::BufferUsages::INDEX;
    }
    if usage.contains(BufferUsage::COPY_SRC) {
        result |= wgpu::BufferUsages::COPY_SRC;
    }
    if usage.contains(BufferUsage::COPY_DST) {
        result |= wgpu::BufferUsages::COPY_DST;
    }

    result
}

pub fn convert_index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
    }
}

/// Convert a topology to wgpu. Line loops and triangle fans have no wgpu
/// equivalent.
pub fn convert_topology(topology: PrimitiveTopology) -> Option<wgpu::PrimitiveTopology> {
    match topology {
        PrimitiveTopology::PointList | PrimitiveTopology::PointSprites => {
            Some(wgpu::PrimitiveTopology::PointList)
        }
        PrimitiveTopology::LineList => Some(wgpu::PrimitiveTopology::LineList),
        PrimitiveTopology::LineStrip => Some(wgpu::PrimitiveTopology::LineStrip),
        PrimitiveTopology::TriangleList => Some(wgpu::PrimitiveTopology::TriangleList),
        PrimitiveTopology::TriangleStrip => Some(wgpu::PrimitiveTopology::TriangleStrip),
        PrimitiveTopology::LineLoop | PrimitiveTopology::TriangleFan => None,
    }
}

/// Convert an attribute description to a wgpu vertex format.
///
/// wgpu cannot convert integers to float without normalizing, so
/// `Regular` integer attributes have no equivalent.
pub fn convert_vertex_format(
    component_type: ComponentType,
    component_count: u8,
    mode: AttributeMode,
) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    let format = match (component_type, component_count, mode) {
        (ComponentType::Float32, 1, _) => F::Float32,
        (ComponentType::Float32, 2, _) => F::Float32x2,
        (ComponentType::Float32, 3, _) => F::Float32x3,
        (ComponentType::Float32, 4, _) => F::Float32x4,
        (ComponentType::Uint8, 2, AttributeMode::Normalized) => F::Unorm8x2,
        (ComponentType::Uint8, 4, AttributeMode::Normalized) => F::Unorm8x4,
        (ComponentType::Uint8, 2, AttributeMode::Integral) => F::Uint8x2,
        (ComponentType::Uint8, 4, AttributeMode::Integral) => F::Uint8x4,
        (ComponentType::Uint16, 2, AttributeMode::Normalized) => F::Unorm16x2,
        (ComponentType::Uint16, 4, AttributeMode::Normalized) => F::Unorm16x4,
        (ComponentType::Uint16, 2, AttributeMode::Integral) => F::Uint16x2,
        (ComponentType::Uint16, 4, AttributeMode::Integral) => F::Uint16x4,
        (ComponentType::Uint32, 1, AttributeMode::Integral) => F::Uint32,
        (ComponentType::Uint32, 2, AttributeMode::Integral) => F::Uint32x2,
        (ComponentType::Uint32, 3, AttributeMode::Integral) => F::Uint32x3,
        (ComponentType::Uint32, 4, AttributeMode::Integral) => F::Uint32x4,
        (ComponentType::Sint32, 1, AttributeMode::Integral) => F::Sint32,
        (ComponentType::Sint32, 2, AttributeMode::Integral) => F::Sint32x2,
        (ComponentType::Sint32, 3, AttributeMode::Integral) => F::Sint32x3,
        (ComponentType::Sint32, 4, AttributeMode::Integral) => F::Sint32x4,
        _ => return None,
    };
    Some(format)
}

/// Owned wgpu vertex buffer layout for one registry entry.
///
/// Shader locations are the attribute semantic slots.
#[derive(Debug, Clone)]
pub struct WgpuVertexLayout {
    pub array_stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl WgpuVertexLayout {
    /// Borrow as a [`wgpu::VertexBufferLayout`] for pipeline creation.
    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Build the wgpu layout of a registry entry, or `None` if an attribute
/// has no wgpu format.
pub fn vertex_buffer_layout(layout: &VertexLayout) -> Option<WgpuVertexLayout> {
    let attributes = layout
        .attributes()
        .iter()
        .map(|attr| {
            Some(wgpu::VertexAttribute {
                format: convert_vertex_format(attr.component_type, attr.component_count, attr.mode)?,
                offset: attr.offset as u64,
                shader_location: attr.semantic.slot(),
            })
        })
        .collect::<Option<Vec<_>>>()?;
    Some(WgpuVertexLayout {
        array_stride: layout.stride() as u64,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::mesh::VertexType;

    #[test]
    fn test_registry_layouts_convert() {
        for vt in VertexType::ALL {
            let layout = vertex_buffer_layout(VertexLayout::of(vt)).unwrap();
            assert_eq!(layout.array_stride, vt.stride() as u64);
            assert_eq!(
                layout.attributes.len(),
                VertexLayout::of(vt).attributes().len()
            );
        }
    }

    #[test]
    fn test_color_is_unorm() {
        let layout = vertex_buffer_layout(VertexLayout::of(VertexType::Standard)).unwrap();
        assert_eq!(layout.attributes[2].format, wgpu::VertexFormat::Unorm8x4);
        assert_eq!(layout.attributes[2].shader_location, 2);
    }

    #[test]
    fn test_unsupported_topologies() {
        assert!(convert_topology(PrimitiveTopology::LineLoop).is_none());
        assert!(convert_topology(PrimitiveTopology::TriangleFan).is_none());
        assert_eq!(
            convert_topology(PrimitiveTopology::PointSprites),
            Some(wgpu::PrimitiveTopology::PointList)
        );
    }

    #[test]
    fn test_regular_integers_unsupported() {
        assert!(convert_vertex_format(ComponentType::Uint8, 4, AttributeMode::Regular).is_none());
    }
}
