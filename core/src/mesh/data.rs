//! Primitive topology and index formats.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How an index list is grouped into primitives
//! - [`IndexFormat`] - Index data format (u16 or u32)

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Like [`LineStrip`](Self::LineStrip), with the last vertex joined back to the first.
    LineLoop,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
    /// Every vertex after the second forms a triangle with the first vertex
    /// and its predecessor.
    TriangleFan,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Each vertex is a screen-aligned sprite.
    PointSprites,
}

impl PrimitiveTopology {
    pub const ALL: [PrimitiveTopology; 8] = [
        Self::PointList,
        Self::LineStrip,
        Self::LineLoop,
        Self::LineList,
        Self::TriangleStrip,
        Self::TriangleFan,
        Self::TriangleList,
        Self::PointSprites,
    ];

    /// Number of primitives formed by `count` indices.
    ///
    /// Counts below the topology's minimum (a one-index line strip, a
    /// two-index triangle strip) yield 0 rather than wrapping.
    pub const fn primitive_count(self, count: u32) -> u32 {
        match self {
            Self::PointList | Self::PointSprites | Self::LineLoop => count,
            Self::LineStrip => count.saturating_sub(1),
            Self::LineList => count / 2,
            Self::TriangleStrip | Self::TriangleFan => count.saturating_sub(2),
            Self::TriangleList => count / 3,
        }
    }

    /// Number of elements a draw call consumes to render `primitives`
    /// primitives of this topology.
    ///
    /// Zero primitives always needs zero elements.
    pub const fn element_count(self, primitives: u32) -> u32 {
        if primitives == 0 {
            return 0;
        }
        match self {
            Self::PointList | Self::PointSprites | Self::LineLoop => primitives,
            Self::LineStrip => primitives + 1,
            Self::LineList => primitives * 2,
            Self::TriangleStrip | Self::TriangleFan => primitives + 2,
            Self::TriangleList => primitives * 3,
        }
    }

    /// Whether primitives of this topology are filled triangles.
    pub const fn is_triangles(self) -> bool {
        matches!(
            self,
            Self::TriangleList | Self::TriangleStrip | Self::TriangleFan
        )
    }

    /// Point topologies are drawn straight from the vertex buffer.
    pub const fn is_points(self) -> bool {
        matches!(self, Self::PointList | Self::PointSprites)
    }
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned integers (max 65535 vertices).
    #[default]
    Uint16,
    /// 32-bit unsigned integers (max ~4 billion vertices).
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub const fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    /// Largest index value this format can hold.
    pub const fn max_index(&self) -> u32 {
        match self {
            Self::Uint16 => u16::MAX as u32,
            Self::Uint32 => u32::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::points(PrimitiveTopology::PointList, 7, 7)]
    #[case::line_strip(PrimitiveTopology::LineStrip, 5, 4)]
    #[case::line_loop(PrimitiveTopology::LineLoop, 5, 5)]
    #[case::lines(PrimitiveTopology::LineList, 4, 2)]
    #[case::lines_odd(PrimitiveTopology::LineList, 5, 2)]
    #[case::tri_strip(PrimitiveTopology::TriangleStrip, 5, 3)]
    #[case::tri_fan(PrimitiveTopology::TriangleFan, 6, 4)]
    #[case::triangles(PrimitiveTopology::TriangleList, 9, 3)]
    #[case::sprites(PrimitiveTopology::PointSprites, 3, 3)]
    fn test_primitive_count(
        #[case] topology: PrimitiveTopology,
        #[case] count: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(topology.primitive_count(count), expected);
    }

    #[rstest]
    #[case::line_strip_zero(PrimitiveTopology::LineStrip, 0)]
    #[case::line_strip_one(PrimitiveTopology::LineStrip, 1)]
    #[case::tri_strip_one(PrimitiveTopology::TriangleStrip, 1)]
    #[case::tri_fan_two(PrimitiveTopology::TriangleFan, 2)]
    #[case::triangles_two(PrimitiveTopology::TriangleList, 2)]
    fn test_degenerate_counts_clamp_to_zero(
        #[case] topology: PrimitiveTopology,
        #[case] count: u32,
    ) {
        assert_eq!(topology.primitive_count(count), 0);
    }

    #[test]
    fn test_element_count_inverts_primitive_count() {
        assert_eq!(PrimitiveTopology::TriangleList.element_count(2), 6);
        assert_eq!(PrimitiveTopology::TriangleStrip.element_count(3), 5);
        assert_eq!(PrimitiveTopology::TriangleFan.element_count(4), 6);
        assert_eq!(PrimitiveTopology::LineStrip.element_count(4), 5);
        assert_eq!(PrimitiveTopology::LineList.element_count(2), 4);
        assert_eq!(PrimitiveTopology::LineLoop.element_count(5), 5);
        assert_eq!(PrimitiveTopology::PointList.element_count(7), 7);
        assert_eq!(PrimitiveTopology::TriangleStrip.element_count(0), 0);
    }

    #[test]
    fn test_default_topology() {
        assert_eq!(PrimitiveTopology::default(), PrimitiveTopology::TriangleList);
    }

    #[test]
    fn test_index_format() {
        assert_eq!(IndexFormat::Uint16.size(), 2);
        assert_eq!(IndexFormat::Uint32.size(), 4);
        assert_eq!(IndexFormat::Uint16.max_index(), 65535);
    }
}
