//! wgpu GPU backend implementation.
//!
//! This backend uses wgpu for cross-platform GPU access, supporting
//! Vulkan, Metal, DX12, and WebGPU.
//!
//! Buffers are real device buffers written through the queue. wgpu has no
//! client-side vertex arrays, so every draw must come from uploaded
//! buffers. Draws are recorded and replayed into a caller-owned render
//! pass with [`WgpuBackend::encode`], since pipelines and targets belong to
//! the renderer above this layer.

pub mod conversion;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::draw::{DrawCall, DrawSource};
use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

use super::{GpuBackend, GpuBuffer};

/// A draw recorded for replay into a render pass.
#[derive(Debug, Clone)]
pub struct RecordedDraw {
    pub topology: wgpu::PrimitiveTopology,
    pub vertex_buffer: Arc<wgpu::Buffer>,
    pub index_buffer: Option<(Arc<wgpu::Buffer>, wgpu::IndexFormat)>,
    pub element_count: u32,
}

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    lost: Arc<AtomicBool>,
    recorded: Mutex<Vec<RecordedDraw>>,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .field("recorded", &self.recorded.lock().len())
            .finish()
    }
}

impl WgpuBackend {
    /// Create a new wgpu backend on any available native backend.
    pub fn new() -> Result<Self, GraphicsError> {
        Self::with_backends(wgpu::Backends::PRIMARY)
    }

    /// Create a new wgpu backend restricted to `backends`.
    pub fn with_backends(backends: wgpu::Backends) -> Result<Self, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("No compatible GPU adapter: {e}"))
        })?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Tessera Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("Device creation failed: {e}"))
        })?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            if matches!(reason, wgpu::DeviceLostReason::Destroyed) {
                return;
            }
            log::error!("wgpu device lost ({:?}): {}", reason, message);
            flag.store(true, Ordering::Release);
        });

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            lost,
            recorded: Mutex::new(Vec::new()),
        })
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Whether the device has been lost. Every call fails afterwards.
    pub fn is_device_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    fn check_device(&self) -> Result<(), GraphicsError> {
        if self.is_device_lost() {
            Err(GraphicsError::DeviceLost)
        } else {
            Ok(())
        }
    }

    /// Number of draws waiting for [`encode`](Self::encode).
    pub fn pending_draws(&self) -> usize {
        self.recorded.lock().len()
    }

    /// Take the recorded draws without encoding them.
    pub fn take_draws(&self) -> Vec<RecordedDraw> {
        std::mem::take(&mut *self.recorded.lock())
    }

    /// Replay every recorded draw into `render_pass`, oldest first.
    ///
    /// The caller sets the pipeline matching each draw's topology and
    /// vertex layout; see [`conversion::vertex_buffer_layout`].
    pub fn encode(&self, render_pass: &mut wgpu::RenderPass<'_>) -> usize {
        let draws = self.take_draws();
        for draw in &draws {
            render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
            match &draw.index_buffer {
                Some((buffer, format)) => {
                    render_pass.set_index_buffer(buffer.slice(..), *format);
                    render_pass.draw_indexed(0..draw.element_count, 0, 0..1);
                }
                None => render_pass.draw(0..draw.element_count, 0..1),
            }
        }
        draws.len()
    }

    /// Block until submitted queue work has finished.
    pub fn wait_idle(&self) {
        let _ = self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(10)),
        });
    }
}

fn wgpu_buffer(source: DrawSource<'_>) -> Result<&Arc<wgpu::Buffer>, GraphicsError> {
    match source {
        DrawSource::Gpu(buffer) => match buffer {
            GpuBuffer::Wgpu(buffer) => Ok(buffer),
            GpuBuffer::Dummy { .. } => Err(GraphicsError::Internal(
                "draw called with non-wgpu buffer".to_string(),
            )),
        },
        DrawSource::Client(_) => Err(GraphicsError::FeatureNotSupported(
            "client-side draw".to_string(),
        )),
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        self.check_device()?;
        // Queue writes must be a multiple of COPY_BUFFER_ALIGNMENT
        let size = descriptor.size.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT)
            * wgpu::COPY_BUFFER_ALIGNMENT;
        let max = self.device.limits().max_buffer_size;
        if size > max {
            log::warn!(
                "wgpu: buffer {:?} of {} bytes exceeds device maximum {}",
                descriptor.label,
                size,
                max
            );
            return Err(GraphicsError::OutOfMemory);
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size,
            usage: conversion::convert_buffer_usage(descriptor.usage),
            mapped_at_creation: false,
        });
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if out_of_memory.is_some() {
            return Err(GraphicsError::OutOfMemory);
        }
        if let Some(e) = validation {
            return Err(GraphicsError::ResourceCreationFailed(e.to_string()));
        }
        log::trace!(
            "wgpu: created buffer {:?} ({} bytes, {:?})",
            descriptor.label,
            size,
            descriptor.frequency
        );
        Ok(GpuBuffer::Wgpu(Arc::new(buffer)))
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let GpuBuffer::Wgpu(buffer) = buffer else {
            return Err(GraphicsError::Internal(
                "write_buffer called with non-wgpu buffer".to_string(),
            ));
        };
        self.check_device()?;
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "write offset {offset} is not {}-byte aligned",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }

        let padding = data.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize) - data.len();
        if offset + (data.len() + padding) as u64 > buffer.size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at {} overruns buffer of {} bytes",
                data.len(),
                offset,
                buffer.size()
            )));
        }

        if padding == 0 {
            self.queue.write_buffer(buffer, offset, data);
        } else {
            let mut padded = Vec::with_capacity(data.len() + padding);
            padded.extend_from_slice(data);
            padded.resize(data.len() + padding, 0);
            self.queue.write_buffer(buffer, offset, &padded);
        }
        Ok(())
    }

    // Recorded draws may still hold the buffer; wgpu frees it once the
    // last reference and any command buffer using it are gone.
    fn destroy_buffer(&self, buffer: GpuBuffer) {
        if let GpuBuffer::Wgpu(buffer) = buffer {
            log::trace!(
                "wgpu: released buffer of {} bytes ({} other references)",
                buffer.size(),
                Arc::strong_count(&buffer) - 1
            );
        }
    }

    fn supports_client_side_draw(&self) -> bool {
        false
    }

    fn max_primitive_count(&self) -> u32 {
        u32::MAX
    }

    fn draw(&self, call: &DrawCall<'_>) -> Result<(), GraphicsError> {
        self.check_device()?;
        let Some(topology) = conversion::convert_topology(call.plan.topology) else {
            log::warn!("wgpu: {:?} has no wgpu topology", call.plan.topology);
            return Err(GraphicsError::FeatureNotSupported(format!(
                "{:?} topology",
                call.plan.topology
            )));
        };

        let vertex_buffer = wgpu_buffer(call.vertices)?.clone();
        let index_buffer = match call.indices {
            Some(source) => Some((
                wgpu_buffer(source)?.clone(),
                conversion::convert_index_format(call.index_format),
            )),
            None => None,
        };

        self.recorded.lock().push(RecordedDraw {
            topology,
            vertex_buffer,
            index_buffer,
            element_count: call.plan.element_count,
        });
        Ok(())
    }
}
