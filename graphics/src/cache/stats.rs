//! Per-frame cache statistics.

use crate::draw::UploadReport;

/// Counters for the current frame, reset by
/// [`begin_frame`](super::HardwareBufferCache::begin_frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draws submitted to the backend, hardware and client-side.
    pub draw_calls: u32,
    /// Primitives of the source topology across all draws.
    pub primitives_drawn: u64,
    pub bytes_uploaded: u64,
    pub buffers_created: u32,
    pub buffers_released: u32,
    /// Draws served from CPU memory.
    pub fallback_draws: u32,
}

impl FrameStats {
    pub(crate) fn record_upload(&mut self, report: &UploadReport) {
        self.bytes_uploaded += report.vertex_bytes + report.index_bytes;
        self.buffers_created += report.buffers_created;
        self.buffers_released += report.buffers_released;
    }

    pub(crate) fn record_draw(&mut self, primitives: u32, fallback: bool) {
        self.draw_calls += 1;
        self.primitives_drawn += u64::from(primitives);
        if fallback {
            self.fallback_draws += 1;
        }
    }

    /// Draws served from GPU buffers.
    pub fn hardware_draws(&self) -> u32 {
        self.draw_calls - self.fallback_draws
    }
}
