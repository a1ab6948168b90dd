//! Mesh generators for common shapes.
//!
//! These produce [`MeshBuffer<Vertex>`] values with white vertex colors.

use super::data::IndexFormat;
use super::index_buffer::IndexBuffer;
use super::mesh_buffer::MeshBuffer;
use super::vertex::{Color, Vertex};
use super::vertex_buffer::VertexBuffer;

/// Generate a quad on the XY plane, centered at the origin.
///
/// UV coordinates go from (0,0) at top-left to (1,1) at bottom-right.
pub fn generate_quad(half_width: f32, half_height: f32) -> MeshBuffer<Vertex> {
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex::new([-half_width, -half_height, 0.0], n, Color::WHITE, [0.0, 1.0]),
        Vertex::new([half_width, -half_height, 0.0], n, Color::WHITE, [1.0, 1.0]),
        Vertex::new([half_width, half_height, 0.0], n, Color::WHITE, [1.0, 0.0]),
        Vertex::new([-half_width, half_height, 0.0], n, Color::WHITE, [0.0, 0.0]),
    ];
    let indices = vec![0, 1, 2, 2, 3, 0];

    MeshBuffer::from_buffers(VertexBuffer::from_vec(vertices), IndexBuffer::from_u16(indices))
}

/// Generate an axis-aligned cube with per-face normals (24 vertices).
pub fn generate_cube(half_extent: f32) -> MeshBuffer<Vertex> {
    let h = half_extent;
    // (normal, u axis, v axis) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, (n, u, v)) in faces.iter().enumerate() {
        for (su, sv) in corners {
            let pos = [
                h * (n[0] + su * u[0] + sv * v[0]),
                h * (n[1] + su * u[1] + sv * v[1]),
                h * (n[2] + su * u[2] + sv * v[2]),
            ];
            let uv = [(su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5];
            vertices.push(Vertex::new(pos, *n, Color::WHITE, uv));
        }
        let base = (face * 4) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    MeshBuffer::from_buffers(VertexBuffer::from_vec(vertices), IndexBuffer::from_u16(indices))
}

/// Generate an `n` x `n` cell grid on the XZ plane spanning `[0, size]`.
///
/// Grids past 255 cells per side switch to 32-bit indices.
pub fn generate_grid(n: u32, size: f32) -> MeshBuffer<Vertex> {
    let side = n + 1;
    let step = if n == 0 { 0.0 } else { size / n as f32 };
    let format = if side * side > u16::MAX as u32 + 1 {
        IndexFormat::Uint32
    } else {
        IndexFormat::Uint16
    };

    let mut vertices = Vec::with_capacity((side * side) as usize);
    for z in 0..side {
        for x in 0..side {
            vertices.push(Vertex::new(
                [x as f32 * step, 0.0, z as f32 * step],
                [0.0, 1.0, 0.0],
                Color::WHITE,
                [x as f32 / n.max(1) as f32, z as f32 / n.max(1) as f32],
            ));
        }
    }

    let mut indices = Vec::with_capacity((n * n * 6) as usize);
    for z in 0..n {
        for x in 0..n {
            let i = z * side + x;
            indices.extend_from_slice(&[i, i + side, i + 1, i + 1, i + side, i + side + 1]);
        }
    }

    let index_buffer = match format {
        IndexFormat::Uint16 => IndexBuffer::from_u16(indices.iter().map(|&i| i as u16).collect()),
        IndexFormat::Uint32 => IndexBuffer::from_u32(indices),
    };
    MeshBuffer::from_buffers(VertexBuffer::from_vec(vertices), index_buffer)
}
