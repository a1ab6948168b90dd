//! Buffer types and descriptors.

use bitflags::bitflags;
use tessera_core::mesh::MappingHint;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// Buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// Buffer can be copied from.
        const COPY_SRC = 1 << 2;
        /// Buffer can be copied to.
        const COPY_DST = 1 << 3;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// How often the contents of a buffer are expected to be rewritten.
///
/// Backends use this to pick a memory placement. Derived from the
/// [`MappingHint`] of the CPU-side buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateFrequency {
    /// Written once, read many times.
    #[default]
    Once,
    /// Rewritten occasionally.
    Frequent,
    /// Rewritten every frame.
    Stream,
}

impl From<MappingHint> for UpdateFrequency {
    fn from(hint: MappingHint) -> Self {
        match hint {
            MappingHint::Never | MappingHint::Static => Self::Once,
            MappingHint::Dynamic => Self::Frequent,
            MappingHint::Stream => Self::Stream,
        }
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Usage flags.
    pub usage: BufferUsage,
    /// Expected rewrite frequency.
    pub frequency: UpdateFrequency,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
            frequency: UpdateFrequency::Once,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the expected rewrite frequency.
    pub fn with_frequency(mut self, frequency: UpdateFrequency) -> Self {
        self.frequency = frequency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_from_hint() {
        assert_eq!(UpdateFrequency::from(MappingHint::Never), UpdateFrequency::Once);
        assert_eq!(UpdateFrequency::from(MappingHint::Static), UpdateFrequency::Once);
        assert_eq!(UpdateFrequency::from(MappingHint::Dynamic), UpdateFrequency::Frequent);
        assert_eq!(UpdateFrequency::from(MappingHint::Stream), UpdateFrequency::Stream);
    }

    #[test]
    fn test_descriptor_builder() {
        let desc = BufferDescriptor::new(256, BufferUsage::VERTEX | BufferUsage::COPY_DST)
            .with_label("mesh vertices")
            .with_frequency(UpdateFrequency::Stream);
        assert_eq!(desc.size, 256);
        assert_eq!(desc.label.as_deref(), Some("mesh vertices"));
        assert!(desc.usage.contains(BufferUsage::COPY_DST));
        assert_eq!(desc.frequency, UpdateFrequency::Stream);
    }
}
