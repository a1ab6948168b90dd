//! Hardware buffer cache integration tests.
//!
//! These tests drive [`HardwareBufferCache`] frame by frame and check what
//! reaches the backend. Tests are parameterized using `rstest` to run
//! against several backends; the wgpu case is skipped when no adapter is
//! available.
//!
//! # Test Categories
//!
//! - **Freshness Tests**: Only stale sides are uploaded again
//! - **Eviction Tests**: Unused and orphaned links are released
//! - **Failure Tests**: Allocation failures fall back and retry later
//! - **Draw Path Tests**: Topology redirects and non-indexed draws

mod common;

use std::sync::Arc;

use parking_lot::RwLock;
use rstest::rstest;

use common::{Backend, TestContext, cube, grid, quad};
use tessera_graphics::material::{Material, PolygonMode};
use tessera_graphics::mesh::generators::generate_quad;
use tessera_graphics::mesh::{
    BufferKind, IndexBuffer, IndexFormat, MappingHint, MeshBufferId, PrimitiveTopology,
    SharedMeshBuffer, SkinnedMeshBuffer, Vertex, VertexBuffer, VertexType,
};
use tessera_graphics::{CacheConfig, DrawOutcome, HardwareBufferCache, LinkState, cache};

/// Bytes uploaded for a full quad: 4 standard vertices and 6 u16 indices.
const QUAD_BYTES: u64 = 4 * 36 + 6 * 2;

fn draw_frame(ctx: &mut TestContext, mesh: &SharedMeshBuffer, material: &Material) -> DrawOutcome {
    ctx.cache.begin_frame();
    let outcome = ctx.cache.draw_mesh_buffer(mesh, material);
    ctx.cache.end_frame();
    outcome
}

// ============================================================================
// Freshness Tests
// ============================================================================

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::hardware_only(Backend::DummyHardwareOnly)]
#[case::webgpu(Backend::WebGpu)]
fn test_cached_draw_uploads_once(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let mesh = quad();

    ctx.cache.begin_frame();
    assert_eq!(
        ctx.cache.draw_mesh_buffer(&mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    assert_eq!(ctx.cache.frame_stats().bytes_uploaded, QUAD_BYTES);
    assert_eq!(ctx.cache.frame_stats().buffers_created, 2);
    ctx.cache.end_frame();

    ctx.cache.begin_frame();
    assert_eq!(
        ctx.cache.draw_mesh_buffer(&mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    assert_eq!(ctx.cache.frame_stats().bytes_uploaded, 0);
    assert_eq!(ctx.cache.frame_stats().draw_calls, 1);
    assert_eq!(ctx.cache.frame_stats().primitives_drawn, 2);
}

#[test]
fn test_dirty_vertices_reupload_vertex_side_only() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mesh = quad();
    let id = MeshBufferId::of(&mesh);
    draw_frame(&mut ctx, &mesh, &Material::default());
    let index_snapshot = ctx.cache.link(id).unwrap().changed_id_index();

    mesh.write().set_dirty(BufferKind::VERTEX);
    assert_eq!(
        ctx.cache.link(id).unwrap().state(&*mesh.read()),
        LinkState::Stale {
            vertex: true,
            index: false
        }
    );

    ctx.cache.begin_frame();
    ctx.cache.draw_mesh_buffer(&mesh, &Material::default());
    assert_eq!(ctx.cache.frame_stats().bytes_uploaded, 4 * 36);
    assert_eq!(ctx.cache.frame_stats().buffers_created, 0);

    let link = ctx.cache.link(id).unwrap();
    assert!(link.state(&*mesh.read()).is_fresh());
    assert_eq!(link.changed_id_index(), index_snapshot);
    assert_eq!(
        link.changed_id_vertex(),
        mesh.read().changed_id(BufferKind::VERTEX)
    );
}

#[test]
fn test_hint_change_forces_reupload() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mesh = quad();
    let id = MeshBufferId::of(&mesh);
    draw_frame(&mut ctx, &mesh, &Material::default());
    let change_id = mesh.read().changed_id(BufferKind::INDEX);

    mesh.write()
        .set_hardware_mapping_hint(MappingHint::Stream, BufferKind::INDEX);
    assert_eq!(mesh.read().changed_id(BufferKind::INDEX), change_id);

    ctx.cache.begin_frame();
    ctx.cache.draw_mesh_buffer(&mesh, &Material::default());
    let stats = *ctx.cache.frame_stats();
    assert_eq!(stats.bytes_uploaded, 6 * 2);
    // new update frequency, new buffer
    assert_eq!(stats.buffers_created, 1);
    assert_eq!(stats.buffers_released, 1);
    assert_eq!(ctx.cache.link(id).unwrap().mapped_index(), MappingHint::Stream);
    assert_eq!(ctx.dummy().stats().live_buffers, 2);
}

#[test]
fn test_append_grows_both_buffers() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mesh = quad();
    draw_frame(&mut ctx, &mesh, &Material::default());

    let other = quad();
    mesh.write().append_from(&*other.read()).unwrap();

    ctx.cache.begin_frame();
    assert_eq!(
        ctx.cache.draw_mesh_buffer(&mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    let stats = *ctx.cache.frame_stats();
    assert_eq!(stats.bytes_uploaded, 2 * QUAD_BYTES);
    assert_eq!(stats.buffers_created, 2);
    assert_eq!(stats.buffers_released, 2);
    assert_eq!(stats.primitives_drawn, 4);
}

#[test]
fn test_skinned_conversion_reuploads_vertices() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mut skinned = SkinnedMeshBuffer::new(IndexFormat::Uint16);
    skinned
        .append(&[Vertex::default(); 3], &[0, 1, 2])
        .unwrap();
    let typed = Arc::new(RwLock::new(skinned));
    let mesh: SharedMeshBuffer = typed.clone();
    let id = MeshBufferId::of(&mesh);

    draw_frame(&mut ctx, &mesh, &Material::default());
    let handle = mesh.read().hw_buffer();
    assert!(handle.is_some());

    assert!(typed.write().convert_to_tangents().unwrap());
    assert_eq!(mesh.read().hw_buffer(), handle);

    ctx.cache.begin_frame();
    ctx.cache.draw_mesh_buffer(&mesh, &Material::default());
    assert_eq!(ctx.cache.frame_stats().bytes_uploaded, 3 * 60);
    assert_eq!(ctx.cache.frame_stats().buffers_released, 1);

    let link = ctx.cache.link(id).unwrap();
    assert_eq!(link.vertex_type(), VertexType::Tangents);
    assert_eq!(
        ctx.dummy().last_draw().unwrap().vertex_type,
        VertexType::Tangents
    );
}

#[test]
fn test_replaced_buffers_are_reuploaded() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let typed = Arc::new(RwLock::new(generate_quad(1.0, 1.0)));
    let mesh: SharedMeshBuffer = typed.clone();
    let id = MeshBufferId::of(&mesh);
    draw_frame(&mut ctx, &mesh, &Material::default());
    let before = mesh.read().changed_id(BufferKind::VERTEX);

    typed
        .write()
        .set_vertices(VertexBuffer::from_vec(vec![Vertex::at([9.0; 3]); 4]));
    assert_ne!(mesh.read().changed_id(BufferKind::VERTEX), before);
    assert_eq!(
        ctx.cache.link(id).unwrap().state(&*mesh.read()),
        LinkState::Stale {
            vertex: true,
            index: false
        }
    );

    ctx.cache.begin_frame();
    assert_eq!(
        ctx.cache.draw_mesh_buffer(&mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    assert_eq!(ctx.cache.frame_stats().bytes_uploaded, 4 * 36);
    assert_eq!(ctx.cache.frame_stats().buffers_created, 0);
    ctx.cache.end_frame();

    typed
        .write()
        .set_indices(IndexBuffer::from_u32(vec![0, 1, 2, 0, 2, 3]));
    ctx.cache.begin_frame();
    ctx.cache.draw_mesh_buffer(&mesh, &Material::default());
    assert_eq!(ctx.cache.frame_stats().bytes_uploaded, 6 * 4);
    assert!(ctx.cache.link(id).unwrap().state(&*mesh.read()).is_fresh());
    assert_eq!(
        ctx.dummy().last_draw().unwrap().index_format,
        Some(IndexFormat::Uint32)
    );
}

// ============================================================================
// Eviction Tests
// ============================================================================

#[test]
fn test_unused_link_is_evicted_after_threshold() {
    let mut ctx = TestContext::with_config(
        Backend::Dummy,
        CacheConfig::default()
            .with_min_vertex_count(0)
            .with_eviction_threshold(2),
    )
    .unwrap();
    let mesh = quad();

    // drawn in frame 0
    draw_frame(&mut ctx, &mesh, &Material::default());
    ctx.idle(1);
    assert_eq!(ctx.cache.frame(), 2);
    assert!(ctx.cache.contains(&mesh));

    ctx.idle(1);
    assert!(!ctx.cache.contains(&mesh));
    assert_eq!(ctx.dummy().stats().live_buffers, 0);
    assert!(mesh.read().hw_buffer().is_none());

    // a later draw starts over
    assert_eq!(
        draw_frame(&mut ctx, &mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    assert!(ctx.cache.contains(&mesh));
}

#[test]
fn test_regular_draws_keep_link_alive() {
    let mut ctx = TestContext::with_config(
        Backend::Dummy,
        CacheConfig::default()
            .with_min_vertex_count(0)
            .with_eviction_threshold(1),
    )
    .unwrap();
    let mesh = quad();
    for _ in 0..10 {
        draw_frame(&mut ctx, &mesh, &Material::default());
    }
    assert!(ctx.cache.contains(&mesh));
    assert_eq!(ctx.dummy().stats().buffers_created, 2);
}

#[test]
fn test_dropped_mesh_buffer_is_evicted() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mesh = quad();
    draw_frame(&mut ctx, &mesh, &Material::default());
    assert_eq!(ctx.cache.len(), 1);

    drop(mesh);
    ctx.idle(1);
    assert!(ctx.cache.is_empty());
    assert_eq!(ctx.dummy().stats().live_buffers, 0);
}

#[test]
fn test_remove_all_hardware_buffers() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let meshes = [quad(), cube(), grid()];
    ctx.cache.begin_frame();
    for mesh in &meshes {
        ctx.cache.draw_mesh_buffer(mesh, &Material::default());
    }
    assert_eq!(ctx.cache.len(), 3);
    assert_eq!(ctx.dummy().stats().live_buffers, 6);

    ctx.cache.remove_all_hardware_buffers();
    assert!(ctx.cache.is_empty());
    assert_eq!(ctx.dummy().stats().live_buffers, 0);
    assert!(meshes.iter().all(|m| m.read().hw_buffer().is_none()));
}

// ============================================================================
// Failure Tests
// ============================================================================

#[rstest]
#[case::client_fallback(Backend::Dummy, DrawOutcome::Client)]
#[case::absent_this_frame(Backend::DummyHardwareOnly, DrawOutcome::Skipped)]
fn test_allocation_failure_rate_limits_retries(
    #[case] backend: Backend,
    #[case] fallback: DrawOutcome,
) {
    let mut ctx = TestContext::with_config(
        backend,
        CacheConfig::default()
            .with_min_vertex_count(0)
            .with_retry_interval(3),
    )
    .unwrap();
    let mesh = quad();

    ctx.dummy().set_fail_allocations(true);
    assert_eq!(draw_frame(&mut ctx, &mesh, &Material::default()), fallback);
    assert!(ctx.cache.is_empty());
    assert!(ctx.cache.is_retry_pending(&mesh));
    assert!(mesh.read().hw_buffer().is_none());

    // memory is back, but the retry waits for its frame
    ctx.dummy().set_fail_allocations(false);
    assert_eq!(draw_frame(&mut ctx, &mesh, &Material::default()), fallback);
    assert_eq!(draw_frame(&mut ctx, &mesh, &Material::default()), fallback);
    assert_eq!(ctx.dummy().stats().buffers_created, 0);

    assert_eq!(
        draw_frame(&mut ctx, &mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    assert!(!ctx.cache.is_retry_pending(&mesh));
    assert_eq!(ctx.dummy().stats().live_buffers, 2);
}

// ============================================================================
// Recommendation Tests
// ============================================================================

#[rstest]
#[case::small_client(Backend::Dummy, false, DrawOutcome::Client)]
#[case::large_client(Backend::Dummy, true, DrawOutcome::Hardware)]
#[case::small_hardware_only(Backend::DummyHardwareOnly, false, DrawOutcome::Hardware)]
fn test_min_vertex_count(
    #[case] backend: Backend,
    #[case] large: bool,
    #[case] expected: DrawOutcome,
) {
    let mut ctx = TestContext::with_config(backend, CacheConfig::default()).unwrap();
    let mesh = if large { grid() } else { quad() };

    ctx.cache.begin_frame();
    assert_eq!(ctx.cache.draw_mesh_buffer(&mesh, &Material::default()), expected);
    assert_eq!(ctx.cache.contains(&mesh), expected == DrawOutcome::Hardware);
    assert_eq!(
        ctx.cache.frame_stats().fallback_draws,
        u32::from(expected == DrawOutcome::Client)
    );
}

#[test]
fn test_cpu_only_hint_drops_link() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mesh = quad();
    draw_frame(&mut ctx, &mesh, &Material::default());
    assert!(ctx.cache.contains(&mesh));

    mesh.write()
        .set_hardware_mapping_hint(MappingHint::Never, BufferKind::BOTH);
    assert_eq!(
        draw_frame(&mut ctx, &mesh, &Material::default()),
        DrawOutcome::Client
    );
    assert!(!ctx.cache.contains(&mesh));
    assert!(mesh.read().hw_buffer().is_none());
    assert_eq!(ctx.dummy().stats().live_buffers, 0);
}

#[test]
fn test_handle_owned_by_other_cache() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mut other = HardwareBufferCache::new(
        ctx.cache.backend().clone(),
        CacheConfig::default().with_min_vertex_count(0),
    );
    let mesh = quad();

    draw_frame(&mut ctx, &mesh, &Material::default());
    assert_eq!(
        other.draw_mesh_buffer(&mesh, &Material::default()),
        DrawOutcome::Client
    );
    assert!(other.is_empty());
    assert_eq!(mesh.read().hw_buffer().unwrap().cache(), ctx.cache.id());

    ctx.cache.remove_hardware_buffer(&mesh);
    assert_eq!(
        other.draw_mesh_buffer(&mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    assert_eq!(mesh.read().hw_buffer().unwrap().cache(), other.id());
}

#[test]
fn test_handle_of_dropped_cache_is_ignored() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mut first = HardwareBufferCache::new(
        ctx.cache.backend().clone(),
        CacheConfig::default().with_min_vertex_count(0),
    );
    let mesh = quad();
    first.draw_mesh_buffer(&mesh, &Material::default());
    let handle = mesh.read().hw_buffer().unwrap();
    assert!(cache::is_handle_live(handle));

    // the read lock keeps the drop from clearing the handle
    {
        let _reader = mesh.read();
        drop(first);
    }
    assert_eq!(mesh.read().hw_buffer(), Some(handle));
    assert!(!cache::is_handle_live(handle));

    assert_eq!(
        draw_frame(&mut ctx, &mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    assert_eq!(mesh.read().hw_buffer().unwrap().cache(), ctx.cache.id());
}

// ============================================================================
// Draw Path Tests
// ============================================================================

#[rstest]
#[case::wireframe(PolygonMode::Wireframe, PrimitiveTopology::LineList)]
#[case::point_cloud(PolygonMode::PointCloud, PrimitiveTopology::PointList)]
fn test_polygon_mode_redirect(#[case] mode: PolygonMode, #[case] drawn: PrimitiveTopology) {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mesh = quad();
    let material = Material::new().with_polygon_mode(mode);

    assert_eq!(draw_frame(&mut ctx, &mesh, &material), DrawOutcome::Hardware);
    let draw = ctx.dummy().last_draw().unwrap();
    assert_eq!(draw.topology, drawn);
    assert_eq!(draw.primitive_count, 2);
    assert_eq!(draw.element_count, 6);
    assert!(draw.index_buffer.is_some());
}

#[rstest]
#[case::points(PrimitiveTopology::PointList)]
#[case::point_sprites(PrimitiveTopology::PointSprites)]
fn test_points_draw_without_indices(#[case] topology: PrimitiveTopology) {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mesh = cube();

    ctx.cache.begin_frame();
    assert_eq!(
        ctx.cache
            .draw_mesh_buffer_as(&mesh, &Material::default(), topology),
        DrawOutcome::Hardware
    );
    let draw = ctx.dummy().last_draw().unwrap();
    assert_eq!(draw.topology, topology);
    assert!(draw.index_buffer.is_none());
    assert!(draw.index_format.is_none());
    // 36 indices, but only 24 vertices to draw
    assert_eq!(draw.element_count, 24);
}

#[test]
fn test_hardware_draw_uses_link_buffers() {
    let mut ctx = TestContext::new(Backend::Dummy).unwrap();
    let mesh = quad();
    draw_frame(&mut ctx, &mesh, &Material::default());

    let draw = ctx.dummy().last_draw().unwrap();
    let vertex_buffer = draw.vertex_buffer.unwrap();
    let index_buffer = draw.index_buffer.unwrap();
    assert!(ctx.dummy().is_live(vertex_buffer));
    assert!(ctx.dummy().is_live(index_buffer));
    assert_eq!(draw.index_format, Some(IndexFormat::Uint16));
    assert_eq!(draw.vertex_count, 4);
}

#[cfg(feature = "wgpu-backend")]
#[test]
fn test_wgpu_records_hardware_draws() {
    use tessera_graphics::backend::wgpu_impl::WgpuBackend;

    common::init_logging();
    let backend = match WgpuBackend::new() {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            eprintln!("wgpu backend not available, skipping: {e}");
            return;
        }
    };
    let mut cache = HardwareBufferCache::new(
        backend.clone(),
        CacheConfig::default().with_min_vertex_count(0),
    );
    let mesh = quad();

    assert_eq!(
        cache.draw_mesh_buffer(&mesh, &Material::default()),
        DrawOutcome::Hardware
    );
    let draws = backend.take_draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].element_count, 6);
    assert!(draws[0].index_buffer.is_some());

    // no fan topology in wgpu
    assert_eq!(
        cache.draw_mesh_buffer_as(&mesh, &Material::default(), PrimitiveTopology::TriangleFan),
        DrawOutcome::Skipped
    );
    assert_eq!(backend.pending_draws(), 0);
}

#[cfg(feature = "wgpu-backend")]
#[test]
fn test_wgpu_pending_draw_survives_reallocation() {
    use tessera_graphics::backend::wgpu_impl::WgpuBackend;

    common::init_logging();
    let backend = match WgpuBackend::new() {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            eprintln!("wgpu backend not available, skipping: {e}");
            return;
        }
    };
    let mut cache = HardwareBufferCache::new(
        backend.clone(),
        CacheConfig::default().with_min_vertex_count(0),
    );
    let mesh = quad();
    cache.draw_mesh_buffer(&mesh, &Material::default());

    // growing the mesh reallocates both GPU buffers before the first draw
    // is encoded
    let other = quad();
    mesh.write().append_from(&*other.read()).unwrap();
    cache.draw_mesh_buffer(&mesh, &Material::default());
    cache.remove_all_hardware_buffers();

    let draws = backend.take_draws();
    assert_eq!(draws.len(), 2);
    assert!(!Arc::ptr_eq(&draws[0].vertex_buffer, &draws[1].vertex_buffer));

    // writing to a destroyed buffer is a validation error
    let device = backend.device();
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    for draw in &draws {
        backend.queue().write_buffer(&draw.vertex_buffer, 0, &[0; 4]);
        if let Some((buffer, _)) = &draw.index_buffer {
            backend.queue().write_buffer(buffer, 0, &[0; 4]);
        }
    }
    backend.queue().submit(std::iter::empty());
    let error = pollster::block_on(device.pop_error_scope());
    assert!(error.is_none(), "pending draw used a destroyed buffer: {error:?}");
}
