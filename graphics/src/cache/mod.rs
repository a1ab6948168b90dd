//! Hardware buffer cache.
//!
//! Maps each mesh buffer, by identity, to a [`HardwareBufferLink`] holding
//! its GPU copy. Every draw compares the link's snapshot with the mesh
//! buffer's change ids and mapping hints and re-uploads only the stale
//! side. Links not drawn for a while, or whose mesh buffer has been
//! dropped, are evicted by the sweep in [`HardwareBufferCache::end_frame`].
//!
//! GPU failures never reach the caller as errors. They are logged, the
//! mesh buffer is drawn from CPU memory when the backend can do that, and
//! the upload is retried only after [`CacheConfig::retry_interval`] frames.
//!
//! ```ignore
//! let mut cache = HardwareBufferCache::new(backend, CacheConfig::default());
//! loop {
//!     cache.begin_frame();
//!     for mesh in &meshes {
//!         cache.draw_mesh_buffer(mesh, &material);
//!     }
//!     cache.end_frame();
//! }
//! ```

mod config;
mod link;
mod stats;

pub use config::CacheConfig;
pub use link::{HardwareBufferLink, LinkState};
pub use stats::FrameStats;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use tessera_core::material::Material;
use tessera_core::mesh::{
    BufferKind, HwBufferHandle, MappingHint, MeshBufferData, MeshBufferId, PrimitiveTopology,
    SharedMeshBuffer, WeakMeshBuffer,
};

use crate::backend::GpuBackend;
use crate::draw::{DrawCall, DrawPlan, DrawSource, SideData, UploadRequest, upload_data};
use crate::error::GraphicsError;

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

/// Handles of every live link, across all caches.
///
/// A handle left on a mesh buffer that could not be cleared on release
/// (the buffer was locked elsewhere) is not in here, so no cache mistakes
/// it for an owner.
static LIVE_HANDLES: LazyLock<Mutex<HashSet<HwBufferHandle>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Whether `handle` belongs to a link that has not been released.
pub fn is_handle_live(handle: HwBufferHandle) -> bool {
    LIVE_HANDLES.lock().contains(&handle)
}

/// How a draw request was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Drawn from GPU buffers owned by the cache.
    Hardware,
    /// Drawn from CPU memory.
    Client,
    /// Nothing was drawn this frame.
    Skipped,
}

/// A mesh buffer whose upload failed, waiting for its retry frame.
#[derive(Debug)]
struct Failure {
    source: WeakMeshBuffer,
    retry_frame: u64,
}

/// Per-backend cache of GPU copies of mesh buffers.
pub struct HardwareBufferCache {
    id: u64,
    backend: Arc<dyn GpuBackend>,
    config: CacheConfig,
    links: HashMap<MeshBufferId, HardwareBufferLink>,
    failures: HashMap<MeshBufferId, Failure>,
    frame: u64,
    next_link: u64,
    stats: FrameStats,
}

impl std::fmt::Debug for HardwareBufferCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareBufferCache")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .field("links", &self.links.len())
            .field("frame", &self.frame)
            .finish()
    }
}

impl HardwareBufferCache {
    pub fn new(backend: Arc<dyn GpuBackend>, config: CacheConfig) -> Self {
        let id = NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("hardware buffer cache #{} on {}", id, backend.name());
        Self {
            id,
            backend,
            config,
            links: HashMap::new(),
            failures: HashMap::new(),
            frame: 0,
            next_link: 1,
            stats: FrameStats::default(),
        }
    }

    // =========================================================================
    // Frame lifecycle
    // =========================================================================

    /// Start a frame. Resets [`frame_stats`](Self::frame_stats).
    pub fn begin_frame(&mut self) {
        self.stats = FrameStats::default();
    }

    /// Finish a frame: advance the frame counter and sweep.
    ///
    /// A link is evicted when its mesh buffer is gone or when it was last
    /// drawn more than [`CacheConfig::eviction_threshold`] frames ago.
    pub fn end_frame(&mut self) {
        self.frame += 1;
        let frame = self.frame;
        let threshold = self.config.eviction_threshold;

        let expired: Vec<MeshBufferId> = self
            .links
            .iter()
            .filter(|(_, link)| {
                !link.is_source_alive() || frame.saturating_sub(link.last_used) > threshold
            })
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(link) = self.links.remove(&id) {
                log::debug!(
                    "evicting hardware buffer link {} (last used frame {}, frame {})",
                    link.handle.link(),
                    link.last_used,
                    frame
                );
                self.release_link(link);
            }
        }

        self.failures
            .retain(|_, failure| failure.source.strong_count() > 0);
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Draw `mesh_buffer` with its own topology.
    pub fn draw_mesh_buffer(
        &mut self,
        mesh_buffer: &SharedMeshBuffer,
        material: &Material,
    ) -> DrawOutcome {
        let topology = mesh_buffer.read().topology();
        self.draw_mesh_buffer_as(mesh_buffer, material, topology)
    }

    /// Draw `mesh_buffer` as `topology`, uploading stale data first.
    ///
    /// Holds the mesh buffer's write lock for the duration of the call, to
    /// record the cache handle on it. The caller must not hold a lock on it.
    pub fn draw_mesh_buffer_as(
        &mut self,
        mesh_buffer: &SharedMeshBuffer,
        material: &Material,
        topology: PrimitiveTopology,
    ) -> DrawOutcome {
        let id = MeshBufferId::of(mesh_buffer);
        let mut buffer = mesh_buffer.write();

        let Some(plan) = DrawPlan::new(
            topology,
            material,
            buffer.vertex_count(),
            buffer.index_count(),
            buffer.index_format(),
            self.backend.max_primitive_count(),
        ) else {
            return DrawOutcome::Skipped;
        };

        if let Some(handle) = buffer.hw_buffer()
            && handle.cache() != self.id
        {
            if is_handle_live(handle) {
                log::debug!(
                    "mesh buffer is cached by hardware buffer cache #{}, not #{}",
                    handle.cache(),
                    self.id
                );
                return self.draw_client(&*buffer, plan);
            }
            log::debug!(
                "clearing released handle of hardware buffer cache #{}",
                handle.cache()
            );
            buffer.set_hw_buffer(None);
        }

        if !self.is_recommended(&*buffer) {
            if let Some(link) = self.links.remove(&id) {
                log::debug!("hardware buffer link {} no longer recommended", link.handle.link());
                self.release_link(link);
                buffer.set_hw_buffer(None);
            }
            return self.draw_client(&*buffer, plan);
        }

        if let Some(failure) = self.failures.get(&id)
            && self.frame < failure.retry_frame
        {
            return self.draw_client(&*buffer, plan);
        }

        if let Err(e) = self.update_link(id, mesh_buffer, &mut *buffer) {
            log::warn!(
                "hardware buffer upload failed, retrying in {} frames: {}",
                self.config.retry_interval,
                e
            );
            if let Some(link) = self.links.remove(&id) {
                self.release_link(link);
            }
            buffer.set_hw_buffer(None);
            self.failures.insert(
                id,
                Failure {
                    source: Arc::downgrade(mesh_buffer),
                    retry_frame: self.frame + self.config.retry_interval,
                },
            );
            return self.draw_client(&*buffer, plan);
        }
        self.failures.remove(&id);

        let Some(link) = self.links.get(&id) else {
            return self.draw_client(&*buffer, plan);
        };
        let (Some(vertices), Some(indices)) = (link.vertex_slot.buffer(), link.index_slot.buffer())
        else {
            return self.draw_client(&*buffer, plan);
        };
        let call = DrawCall::new(
            plan,
            buffer.vertex_type(),
            buffer.vertex_count(),
            DrawSource::Gpu(vertices),
            DrawSource::Gpu(indices),
            buffer.index_format(),
        );
        submit(self.backend.as_ref(), &mut self.stats, &call, false)
    }

    /// Whether `buffer` should get GPU buffers of its own.
    ///
    /// Small or CPU-only mesh buffers are drawn from CPU memory, unless the
    /// backend cannot draw that way.
    fn is_recommended(&self, buffer: &dyn MeshBufferData) -> bool {
        if !self.backend.supports_client_side_draw() {
            return true;
        }
        let cpu_only = buffer.hardware_mapping_hint(BufferKind::VERTEX) == MappingHint::Never
            && buffer.hardware_mapping_hint(BufferKind::INDEX) == MappingHint::Never;
        !cpu_only && buffer.vertex_count() >= self.config.min_vertex_count
    }

    /// Create the link of `id` if missing, then upload its stale sides.
    fn update_link(
        &mut self,
        id: MeshBufferId,
        mesh_buffer: &SharedMeshBuffer,
        buffer: &mut dyn MeshBufferData,
    ) -> Result<(), GraphicsError> {
        let frame = self.frame;
        let state = match self.links.get(&id) {
            Some(link) => link.state(buffer),
            None => {
                let handle = HwBufferHandle::new(self.id, self.next_link);
                self.next_link += 1;
                log::debug!(
                    "creating hardware buffer link {} ({} vertices, {} indices)",
                    handle.link(),
                    buffer.vertex_count(),
                    buffer.index_count()
                );
                self.links.insert(
                    id,
                    HardwareBufferLink::new(Arc::downgrade(mesh_buffer), handle, buffer, frame),
                );
                LIVE_HANDLES.lock().insert(handle);
                buffer.set_hw_buffer(Some(handle));
                LinkState::Stale {
                    vertex: true,
                    index: true,
                }
            }
        };

        let Some(link) = self.links.get_mut(&id) else {
            return Err(GraphicsError::Internal("link vanished".to_string()));
        };
        link.last_used = frame;

        let LinkState::Stale { vertex, index } = state else {
            return Ok(());
        };
        log::debug!(
            "uploading hardware buffer link {} (vertex: {}, index: {})",
            link.handle.link(),
            vertex,
            index
        );

        let label = format!("{} #{}", self.config.label_prefix, link.handle.link());
        let request = UploadRequest {
            label: &label,
            vertex_count: buffer.vertex_count(),
            vertex_stride: buffer.vertex_type().stride(),
            vertices: vertex.then(|| SideData {
                bytes: buffer.vertex_data().as_bytes(),
                hint: buffer.hardware_mapping_hint(BufferKind::VERTEX),
            }),
            index_count: buffer.index_count(),
            index_format: buffer.index_format(),
            indices: index.then(|| SideData {
                bytes: buffer.indices().as_bytes(),
                hint: buffer.hardware_mapping_hint(BufferKind::INDEX),
            }),
        };
        let report = upload_data(
            self.backend.as_ref(),
            &request,
            &mut link.vertex_slot,
            &mut link.index_slot,
        )?;
        self.stats.record_upload(&report);

        if report.vertices_uploaded() {
            link.sync_vertex(buffer);
        }
        if report.indices_uploaded() {
            link.sync_index(buffer);
        }
        Ok(())
    }

    fn draw_client(&mut self, buffer: &dyn MeshBufferData, plan: DrawPlan) -> DrawOutcome {
        if !self.backend.supports_client_side_draw() {
            log::debug!("{} cannot draw from CPU memory, skipping", self.backend.name());
            return DrawOutcome::Skipped;
        }
        let call = DrawCall::new(
            plan,
            buffer.vertex_type(),
            buffer.vertex_count(),
            DrawSource::Client(buffer.vertex_data().as_bytes()),
            DrawSource::Client(buffer.indices().as_bytes()),
            buffer.index_format(),
        );
        submit(self.backend.as_ref(), &mut self.stats, &call, true)
    }


    // =========================================================================
    // Removal
    // =========================================================================

    /// Drop the GPU copy of `mesh_buffer`, if any.
    pub fn remove_hardware_buffer(&mut self, mesh_buffer: &SharedMeshBuffer) -> bool {
        let id = MeshBufferId::of(mesh_buffer);
        self.failures.remove(&id);
        match self.links.remove(&id) {
            Some(link) => {
                self.release_link(link);
                true
            }
            None => false,
        }
    }

    /// Drop every GPU copy held by this cache.
    pub fn remove_all_hardware_buffers(&mut self) {
        let count = self.links.len();
        let links: Vec<_> = self.links.drain().map(|(_, link)| link).collect();
        for link in links {
            self.release_link(link);
        }
        self.failures.clear();
        if count > 0 {
            log::debug!("removed all {} hardware buffer links", count);
        }
    }

    /// Release the backend buffers of `link` and clear the handle it left
    /// on its mesh buffer.
    ///
    /// A mesh buffer locked elsewhere keeps its handle. The handle leaves
    /// the live set either way, so every cache treats it as absent.
    fn release_link(&mut self, mut link: HardwareBufferLink) {
        LIVE_HANDLES.lock().remove(&link.handle);
        self.stats.buffers_released += link.release(self.backend.as_ref());
        if let Some(source) = link.source.upgrade()
            && let Some(mut buffer) = source.try_write()
            && buffer.hw_buffer() == Some(link.handle)
        {
            buffer.set_hw_buffer(None);
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Identifier stored in the handles this cache leaves on mesh buffers.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, mesh_buffer: &SharedMeshBuffer) -> bool {
        self.links.contains_key(&MeshBufferId::of(mesh_buffer))
    }

    pub fn link(&self, id: MeshBufferId) -> Option<&HardwareBufferLink> {
        self.links.get(&id)
    }

    /// Whether `mesh_buffer` is waiting out a retry interval.
    pub fn is_retry_pending(&self, mesh_buffer: &SharedMeshBuffer) -> bool {
        self.failures
            .get(&MeshBufferId::of(mesh_buffer))
            .is_some_and(|failure| self.frame < failure.retry_frame)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn frame_stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }
}

fn submit(
    backend: &dyn GpuBackend,
    stats: &mut FrameStats,
    call: &DrawCall<'_>,
    fallback: bool,
) -> DrawOutcome {
    match backend.draw(call) {
        Ok(()) => {
            stats.record_draw(call.plan.primitive_count, fallback);
            if fallback {
                DrawOutcome::Client
            } else {
                DrawOutcome::Hardware
            }
        }
        Err(e) => {
            log::warn!("{} rejected draw: {}", backend.name(), e);
            DrawOutcome::Skipped
        }
    }
}

static_assertions::assert_impl_all!(HardwareBufferCache: Send, Sync);

impl Drop for HardwareBufferCache {
    fn drop(&mut self) {
        self.remove_all_hardware_buffers();
    }
}
