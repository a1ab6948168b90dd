//! GPU upload and draw path.
//!
//! [`upload_data`] moves the bytes of a mesh buffer into backend buffers.
//! [`DrawPlan`] derives primitive and element counts from the topology and
//! material, and [`DrawCall`] binds everything for one backend draw.

mod call;
mod upload;

pub use call::{AttributeBinding, DrawCall, DrawPlan, DrawSource};
pub use upload::{GpuSlot, SideData, SlotWrite, UploadReport, UploadRequest, upload_data};
