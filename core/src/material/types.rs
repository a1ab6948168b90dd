//! Material data types.

/// How filled primitives are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    /// Draw triangle edges as lines.
    Wireframe,
    /// Draw triangle corners as points.
    PointCloud,
}

/// Alpha rendering mode.
///
/// Affects pipeline state (blend configuration), not buffer contents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AlphaMode {
    /// Fully opaque (alpha ignored).
    #[default]
    Opaque,
    /// Alpha masking with cutoff threshold.
    Mask {
        /// Cutoff value (0.0–1.0). Fragments with alpha below this are discarded.
        cutoff: f32,
    },
    /// Full alpha blending.
    Blend,
}

/// Render state carried by a mesh buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name, used for debug labels only.
    pub name: Option<String>,
    pub polygon_mode: PolygonMode,
    pub alpha_mode: AlphaMode,
    pub backface_culling: bool,
    /// Line width or point size for wireframe and point-cloud modes.
    pub thickness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            polygon_mode: PolygonMode::Fill,
            alpha_mode: AlphaMode::Opaque,
            backface_culling: true,
            thickness: 1.0,
        }
    }
}

impl Material {
    /// Create a filled, opaque material.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_polygon_mode(mut self, mode: PolygonMode) -> Self {
        self.polygon_mode = mode;
        self
    }

    pub fn with_alpha_mode(mut self, mode: AlphaMode) -> Self {
        self.alpha_mode = mode;
        self
    }

    pub fn with_backface_culling(mut self, enabled: bool) -> Self {
        self.backface_culling = enabled;
        self
    }

    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = thickness;
        self
    }

    /// Shorthand for `polygon_mode == Wireframe`.
    pub fn wireframe(&self) -> bool {
        self.polygon_mode == PolygonMode::Wireframe
    }

    /// Shorthand for `polygon_mode == PointCloud`.
    pub fn point_cloud(&self) -> bool {
        self.polygon_mode == PolygonMode::PointCloud
    }
}
