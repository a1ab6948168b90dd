//! CPU-side geometry buffers.
//!
//! This module provides GPU-agnostic geometry storage:
//!
//! - [`VertexBuffer`] / [`IndexBuffer`] - Format-specific storage with change counters
//! - [`VertexLayout`] - Registry of vertex record layouts, one per [`VertexType`]
//! - [`MeshBuffer`] - One vertex buffer, one index buffer, a material and a box
//! - [`SkinnedMeshBuffer`] - Mesh buffer whose vertex format can be converted
//! - [`SharedMeshBuffer`] - Shared, lockable handle used by hardware caches
//! - Generators for common shapes (quad, cube, grid)
//!
//! These types are re-exported by `tessera-graphics` for convenience.

mod data;
mod error;
pub mod generators;
mod index_buffer;
mod layout;
mod mesh_buffer;
mod shared;
mod skinned;
mod tracking;
mod vertex;
mod vertex_buffer;

pub use data::{IndexFormat, PrimitiveTopology};
pub use error::BufferError;
pub use index_buffer::{IndexBuffer, IndexBufferMut};
pub use layout::{AttributeMode, ComponentType, VertexAttribute, VertexAttributeSemantic, VertexLayout};
pub use mesh_buffer::{MeshBuffer, MeshBufferData};
pub use shared::{MeshBufferId, SharedMeshBuffer, WeakMeshBuffer, append_shared, share};
pub use skinned::{SkinnedMeshBuffer, SkinnedVertices, SkinnedVerticesMut};
pub use tracking::{BufferKind, ChangeGuard, ChangeId, HwBufferHandle, MappingHint};
pub use vertex::{Color, Vertex, Vertex2TCoords, VertexFormat, VertexParts, VertexTangents, VertexType};
pub use vertex_buffer::{VertexBuffer, VertexBufferMut, VertexData, VertexDataMut};
