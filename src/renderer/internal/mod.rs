pub mod buffers;
pub mod context;
pub mod pipeline;

pub(crate) use buffers::{DynamicUniformSlots, ObjectsBuffer};
pub(crate) use context::{GpuContext, DEPTH_STENCIL_FORMAT};
pub use context::DepthStencil;
pub(crate) use pipeline::{PipelineCache, PipelineKey, RasterKey};
