//! Interleaved vertex records.
//!
//! Three fixed formats are supported, all `#[repr(C)]` and [`bytemuck::Pod`]
//! so buffers of them can be handed to a GPU backend as raw bytes:
//!
//! - [`Vertex`] - position, normal, color, one texture coordinate set
//! - [`Vertex2TCoords`] - [`Vertex`] plus a second texture coordinate set
//! - [`VertexTangents`] - [`Vertex`] plus tangent and binormal
//!
//! Converting between formats goes through [`VertexParts`]. Fields the
//! source does not have are zero in the target.

use bytemuck::{Pod, Zeroable};

use crate::math::{Vec2, Vec3};

/// 32-bit packed ARGB color, stored as a little-endian `u32`.
///
/// In memory the byte order is `b, g, r, a`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color(pub u32);

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    pub const BLACK: Self = Self(0xFF00_0000);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

/// Tag identifying a vertex record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexType {
    /// [`Vertex`]
    #[default]
    Standard,
    /// [`Vertex2TCoords`]
    TwoTCoords,
    /// [`VertexTangents`]
    Tangents,
}

impl VertexType {
    pub const ALL: [VertexType; 3] = [Self::Standard, Self::TwoTCoords, Self::Tangents];

    /// Size in bytes of one record of this format.
    pub const fn stride(self) -> usize {
        match self {
            Self::Standard => std::mem::size_of::<Vertex>(),
            Self::TwoTCoords => std::mem::size_of::<Vertex2TCoords>(),
            Self::Tangents => std::mem::size_of::<VertexTangents>(),
        }
    }
}

/// Standard vertex: position, normal, color and one texture coordinate set.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: Color,
    pub tcoords: [f32; 2],
}

impl Vertex {
    pub fn new(pos: [f32; 3], normal: [f32; 3], color: Color, tcoords: [f32; 2]) -> Self {
        Self {
            pos,
            normal,
            color,
            tcoords,
        }
    }

    /// Vertex at `pos` with a zero normal, white color and zero texture coordinates.
    pub fn at(pos: [f32; 3]) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }
}

/// Vertex with a second texture coordinate set, typically for lightmaps.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex2TCoords {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: Color,
    pub tcoords: [f32; 2],
    pub tcoords2: [f32; 2],
}

/// Vertex with tangent and binormal, for normal mapping.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexTangents {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: Color,
    pub tcoords: [f32; 2],
    pub tangent: [f32; 3],
    pub binormal: [f32; 3],
}

/// Format-neutral superset of every vertex record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexParts {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: Color,
    pub tcoords: [f32; 2],
    pub tcoords2: [f32; 2],
    pub tangent: [f32; 3],
    pub binormal: [f32; 3],
}

/// A concrete vertex record format.
pub trait VertexFormat: Pod + Default + Send + Sync + 'static {
    /// Tag of this format in the vertex type registry.
    const VERTEX_TYPE: VertexType;

    fn to_parts(&self) -> VertexParts;

    fn from_parts(parts: &VertexParts) -> Self;

    fn pos(&self) -> [f32; 3];
    fn pos_mut(&mut self) -> &mut [f32; 3];
    fn normal(&self) -> [f32; 3];
    fn normal_mut(&mut self) -> &mut [f32; 3];
    fn tcoords(&self) -> [f32; 2];
    fn tcoords_mut(&mut self) -> &mut [f32; 2];

    /// Convert a record of any format into this one.
    fn convert_from<W: VertexFormat>(other: &W) -> Self {
        Self::from_parts(&other.to_parts())
    }

    fn position(&self) -> Vec3 {
        Vec3::from(self.pos())
    }

    fn normal_vec(&self) -> Vec3 {
        Vec3::from(self.normal())
    }

    fn tcoords_vec(&self) -> Vec2 {
        Vec2::from(self.tcoords())
    }
}

macro_rules! impl_common_accessors {
    () => {
        fn pos(&self) -> [f32; 3] {
            self.pos
        }

        fn pos_mut(&mut self) -> &mut [f32; 3] {
            &mut self.pos
        }

        fn normal(&self) -> [f32; 3] {
            self.normal
        }

        fn normal_mut(&mut self) -> &mut [f32; 3] {
            &mut self.normal
        }

        fn tcoords(&self) -> [f32; 2] {
            self.tcoords
        }

        fn tcoords_mut(&mut self) -> &mut [f32; 2] {
            &mut self.tcoords
        }
    };
}

impl VertexFormat for Vertex {
    const VERTEX_TYPE: VertexType = VertexType::Standard;

    fn to_parts(&self) -> VertexParts {
        VertexParts {
            pos: self.pos,
            normal: self.normal,
            color: self.color,
            tcoords: self.tcoords,
            ..VertexParts::default()
        }
    }

    fn from_parts(parts: &VertexParts) -> Self {
        Self {
            pos: parts.pos,
            normal: parts.normal,
            color: parts.color,
            tcoords: parts.tcoords,
        }
    }

    impl_common_accessors!();
}

impl VertexFormat for Vertex2TCoords {
    const VERTEX_TYPE: VertexType = VertexType::TwoTCoords;

    fn to_parts(&self) -> VertexParts {
        VertexParts {
            pos: self.pos,
            normal: self.normal,
            color: self.color,
            tcoords: self.tcoords,
            tcoords2: self.tcoords2,
            ..VertexParts::default()
        }
    }

    fn from_parts(parts: &VertexParts) -> Self {
        Self {
            pos: parts.pos,
            normal: parts.normal,
            color: parts.color,
            tcoords: parts.tcoords,
            tcoords2: parts.tcoords2,
        }
    }

    impl_common_accessors!();
}

impl VertexFormat for VertexTangents {
    const VERTEX_TYPE: VertexType = VertexType::Tangents;

    fn to_parts(&self) -> VertexParts {
        VertexParts {
            pos: self.pos,
            normal: self.normal,
            color: self.color,
            tcoords: self.tcoords,
            tangent: self.tangent,
            binormal: self.binormal,
            ..VertexParts::default()
        }
    }

    fn from_parts(parts: &VertexParts) -> Self {
        Self {
            pos: parts.pos,
            normal: parts.normal,
            color: parts.color,
            tcoords: parts.tcoords,
            tangent: parts.tangent,
            binormal: parts.binormal,
        }
    }

    impl_common_accessors!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides() {
        assert_eq!(VertexType::Standard.stride(), 36);
        assert_eq!(VertexType::TwoTCoords.stride(), 44);
        assert_eq!(VertexType::Tangents.stride(), 60);
    }

    #[test]
    fn test_color_channels() {
        let c = Color::from_argb(0x80, 0x10, 0x20, 0x30);
        assert_eq!(c.0, 0x8010_2030);
        assert_eq!(c.alpha(), 0x80);
        assert_eq!(c.red(), 0x10);
        assert_eq!(c.green(), 0x20);
        assert_eq!(c.blue(), 0x30);
    }

    #[test]
    fn test_convert_fills_missing_with_zero() {
        let v = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], Color::BLACK, [0.5, 0.25]);
        let t = VertexTangents::convert_from(&v);
        assert_eq!(t.pos, v.pos);
        assert_eq!(t.color, Color::BLACK);
        assert_eq!(t.tangent, [0.0; 3]);
        assert_eq!(t.binormal, [0.0; 3]);
    }

    #[test]
    fn test_convert_drops_extra_fields() {
        let v = Vertex2TCoords {
            pos: [1.0, 0.0, 0.0],
            tcoords2: [9.0, 9.0],
            ..Default::default()
        };
        let s = Vertex::convert_from(&v);
        assert_eq!(s.pos, [1.0, 0.0, 0.0]);
        let back = Vertex2TCoords::convert_from(&s);
        assert_eq!(back.tcoords2, [0.0, 0.0]);
    }

    #[test]
    fn test_accessors() {
        let mut v = Vertex::at([1.0, 2.0, 3.0]);
        assert_eq!(v.position(), Vec3::new(1.0, 2.0, 3.0));
        *v.tcoords_mut() = [0.5, 0.5];
        assert_eq!(v.tcoords_vec(), Vec2::new(0.5, 0.5));
    }
}
