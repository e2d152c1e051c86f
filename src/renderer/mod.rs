pub mod batch;
pub mod error;
pub mod gfx;
pub mod gpu;
mod internal;
pub mod material;
pub mod pipeline_builder;
pub mod portal;
pub mod primitives;
pub mod program;
pub mod recording;
pub mod state;
pub mod uniforms;

pub use batch::{draw_opaque, DrawStats, NoTransparentPass, TransparentPass};
pub use error::RenderError;
pub use gfx::{CompareFunction, GraphicsContext, StencilOperation, UniformLocation, STENCIL_ALL};
pub use gpu::{FrameTargets, GpuRenderer};
pub use material::{Material, MaterialData, MaterialFlags};
pub use pipeline_builder::PipelineBuilder;
pub use portal::{PortalPrograms, PortalRenderer};
pub use primitives::{cube, quad};
pub use program::{ProgramKind, ShaderProgram, MODEL_MATRIX, MODEL_NORMAL_MATRIX};
pub use recording::{GfxCommand, RasterState, RecordingContext};
pub use state::{PortalPasses, PortalPhase};
pub use uniforms::{set_view_parameters, CameraUniform, ObjectData};
