//! Descriptors for GPU buffer resources.

mod buffer;

pub use buffer::{BufferDescriptor, BufferUsage, UpdateFrequency};
