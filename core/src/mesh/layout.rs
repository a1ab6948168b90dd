//! Vertex type registry.
//!
//! Every supported vertex record format has exactly one [`VertexLayout`]
//! describing its byte layout: the record stride plus an ordered list of
//! [`VertexAttribute`]s. The table is built on first use and never mutated
//! afterwards, so layouts are handed out as `&'static` references.
//!
//! ```ignore
//! let layout = VertexLayout::of(VertexType::Tangents);
//! for attr in layout.attributes() {
//!     bind(attr.semantic.slot(), attr.component_count, attr.component_type,
//!          attr.mode, layout.stride(), attr.offset);
//! }
//! ```

use std::mem::{offset_of, size_of};
use std::sync::LazyLock;

use super::vertex::{Vertex, Vertex2TCoords, VertexTangents, VertexType};

/// Semantic meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeSemantic {
    Position,
    Normal,
    Color,
    TexCoord0,
    TexCoord1,
    Tangent,
    Binormal,
}

impl VertexAttributeSemantic {
    /// Attribute binding slot. Stable across all vertex formats, so a shader
    /// can rely on e.g. normals always arriving at slot 1.
    pub const fn slot(self) -> u32 {
        match self {
            Self::Position => 0,
            Self::Normal => 1,
            Self::Color => 2,
            Self::TexCoord0 => 3,
            Self::TexCoord1 => 4,
            Self::Tangent => 5,
            Self::Binormal => 6,
        }
    }
}

/// Scalar type of one attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float32,
    Uint8,
    Uint16,
    Uint32,
    Sint32,
}

impl ComponentType {
    /// Size in bytes of one component.
    pub const fn size(self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Float32 | Self::Uint32 | Self::Sint32 => 4,
        }
    }
}

/// How integer components are presented to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeMode {
    /// Converted to float as-is.
    #[default]
    Regular,
    /// Converted to float and scaled to the unit range.
    Normalized,
    /// Passed to the shader as integers.
    Integral,
}

/// A single attribute within a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub semantic: VertexAttributeSemantic,
    pub component_count: u8,
    pub component_type: ComponentType,
    pub mode: AttributeMode,
    /// Byte offset within the vertex record.
    pub offset: u32,
}

impl VertexAttribute {
    /// Create a regular (non-normalized) attribute.
    pub const fn new(
        semantic: VertexAttributeSemantic,
        component_count: u8,
        component_type: ComponentType,
        offset: usize,
    ) -> Self {
        Self {
            semantic,
            component_count,
            component_type,
            mode: AttributeMode::Regular,
            offset: offset as u32,
        }
    }

    pub const fn with_mode(mut self, mode: AttributeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Size in bytes of this attribute.
    pub const fn size(&self) -> usize {
        self.component_count as usize * self.component_type.size()
    }

    /// First byte past this attribute.
    pub const fn end(&self) -> usize {
        self.offset as usize + self.size()
    }
}

/// Byte layout of one vertex record format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    vertex_type: VertexType,
    stride: u32,
    attributes: Vec<VertexAttribute>,
    label: &'static str,
}

impl VertexLayout {
    fn new(vertex_type: VertexType, stride: usize, label: &'static str) -> Self {
        Self {
            vertex_type,
            stride: stride as u32,
            attributes: Vec::new(),
            label,
        }
    }

    fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Registry entry for `vertex_type`.
    pub fn of(vertex_type: VertexType) -> &'static VertexLayout {
        let registry = &*REGISTRY;
        match vertex_type {
            VertexType::Standard => &registry[0],
            VertexType::TwoTCoords => &registry[1],
            VertexType::Tangents => &registry[2],
        }
    }

    pub fn vertex_type(&self) -> VertexType {
        self.vertex_type
    }

    /// Size in bytes of one vertex record.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Find the attribute with the given semantic.
    pub fn find(&self, semantic: VertexAttributeSemantic) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    pub fn has(&self, semantic: VertexAttributeSemantic) -> bool {
        self.find(semantic).is_some()
    }

    /// Check that every attribute fits inside the stride and that no two
    /// attributes share a semantic.
    pub fn validate(&self) -> bool {
        let fits = self.attributes.iter().all(|a| a.end() <= self.stride as usize);
        let unique = self.attributes.iter().enumerate().all(|(i, a)| {
            self.attributes[i + 1..]
                .iter()
                .all(|b| b.semantic != a.semantic)
        });
        fits && unique
    }
}

use VertexAttributeSemantic as S;

fn standard() -> VertexLayout {
    VertexLayout::new(VertexType::Standard, size_of::<Vertex>(), "standard")
        .with_attribute(VertexAttribute::new(
            S::Position,
            3,
            ComponentType::Float32,
            offset_of!(Vertex, pos),
        ))
        .with_attribute(VertexAttribute::new(
            S::Normal,
            3,
            ComponentType::Float32,
            offset_of!(Vertex, normal),
        ))
        .with_attribute(
            VertexAttribute::new(S::Color, 4, ComponentType::Uint8, offset_of!(Vertex, color))
                .with_mode(AttributeMode::Normalized),
        )
        .with_attribute(VertexAttribute::new(
            S::TexCoord0,
            2,
            ComponentType::Float32,
            offset_of!(Vertex, tcoords),
        ))
}

fn two_tcoords() -> VertexLayout {
    VertexLayout::new(
        VertexType::TwoTCoords,
        size_of::<Vertex2TCoords>(),
        "two_tcoords",
    )
    .with_attribute(VertexAttribute::new(
        S::Position,
        3,
        ComponentType::Float32,
        offset_of!(Vertex2TCoords, pos),
    ))
    .with_attribute(VertexAttribute::new(
        S::Normal,
        3,
        ComponentType::Float32,
        offset_of!(Vertex2TCoords, normal),
    ))
    .with_attribute(
        VertexAttribute::new(
            S::Color,
            4,
            ComponentType::Uint8,
            offset_of!(Vertex2TCoords, color),
        )
        .with_mode(AttributeMode::Normalized),
    )
    .with_attribute(VertexAttribute::new(
        S::TexCoord0,
        2,
        ComponentType::Float32,
        offset_of!(Vertex2TCoords, tcoords),
    ))
    .with_attribute(VertexAttribute::new(
        S::TexCoord1,
        2,
        ComponentType::Float32,
        offset_of!(Vertex2TCoords, tcoords2),
    ))
}

fn tangents() -> VertexLayout {
    VertexLayout::new(
        VertexType::Tangents,
        size_of::<VertexTangents>(),
        "tangents",
    )
    .with_attribute(VertexAttribute::new(
        S::Position,
        3,
        ComponentType::Float32,
        offset_of!(VertexTangents, pos),
    ))
    .with_attribute(VertexAttribute::new(
        S::Normal,
        3,
        ComponentType::Float32,
        offset_of!(VertexTangents, normal),
    ))
    .with_attribute(
        VertexAttribute::new(
            S::Color,
            4,
            ComponentType::Uint8,
            offset_of!(VertexTangents, color),
        )
        .with_mode(AttributeMode::Normalized),
    )
    .with_attribute(VertexAttribute::new(
        S::TexCoord0,
        2,
        ComponentType::Float32,
        offset_of!(VertexTangents, tcoords),
    ))
    .with_attribute(VertexAttribute::new(
        S::Tangent,
        3,
        ComponentType::Float32,
        offset_of!(VertexTangents, tangent),
    ))
    .with_attribute(VertexAttribute::new(
        S::Binormal,
        3,
        ComponentType::Float32,
        offset_of!(VertexTangents, binormal),
    ))
}

// Indexed in `VertexType` declaration order.
static REGISTRY: LazyLock<[VertexLayout; 3]> = LazyLock::new(|| {
    let table = [standard(), two_tcoords(), tangents()];
    log::debug!(
        "vertex type registry initialized ({} formats)",
        table.len()
    );
    table
});
