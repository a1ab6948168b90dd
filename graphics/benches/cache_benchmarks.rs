use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tessera_graphics::mesh::generators::{generate_cube, generate_grid};
use tessera_graphics::mesh::{BufferKind, SharedMeshBuffer, share};
use tessera_graphics::{CacheConfig, DummyBackend, HardwareBufferCache, material::Material};

fn cache() -> (Arc<DummyBackend>, HardwareBufferCache) {
    let backend = Arc::new(DummyBackend::new());
    let cache = HardwareBufferCache::new(
        backend.clone(),
        CacheConfig::default().with_min_vertex_count(0),
    );
    (backend, cache)
}

// ---------------------------------------------------------------------------
// Cache hits
// ---------------------------------------------------------------------------

fn bench_cache_hit(c: &mut Criterion) {
    let (backend, mut cache) = cache();
    let material = Material::default();
    let meshes: Vec<SharedMeshBuffer> = (0..100).map(|_| share(generate_cube(0.5))).collect();
    for mesh in &meshes {
        cache.draw_mesh_buffer(mesh, &material);
    }

    c.bench_function("cache_hit_100_cubes", |b| {
        b.iter(|| {
            cache.begin_frame();
            for mesh in &meshes {
                black_box(cache.draw_mesh_buffer(mesh, &material));
            }
            cache.end_frame();
            backend.take_draws();
        });
    });
}

// ---------------------------------------------------------------------------
// Re-uploads
// ---------------------------------------------------------------------------

fn bench_reupload_vertices(c: &mut Criterion) {
    let (_backend, mut cache) = cache();
    let material = Material::default();
    let mesh = share(generate_grid(64, 10.0));
    cache.draw_mesh_buffer(&mesh, &material);

    c.bench_function("reupload_grid_64_vertices", |b| {
        b.iter(|| {
            mesh.write().set_dirty(BufferKind::VERTEX);
            black_box(cache.draw_mesh_buffer(&mesh, &material));
        });
    });
}

fn bench_first_upload(c: &mut Criterion) {
    let (_backend, mut cache) = cache();
    let material = Material::default();

    c.bench_function("first_upload_and_evict_cube", |b| {
        b.iter(|| {
            let mesh = share(generate_cube(0.5));
            black_box(cache.draw_mesh_buffer(&mesh, &material));
            cache.remove_hardware_buffer(&mesh);
        });
    });
}

criterion_group!(
    benches,
    bench_cache_hit,
    bench_reupload_vertices,
    bench_first_upload
);
criterion_main!(benches);
