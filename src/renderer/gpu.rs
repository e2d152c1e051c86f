// renderer/gpu.rs
//
// wgpu backend. A frame is recorded through `RecordingContext` and replayed
// here: raster state selects cached pipelines, view and material writes land
// in dynamic-offset uniform slots, per-draw matrices go to a storage buffer
// indexed by instance, and every stencil clear starts a new render pass.

use std::collections::HashMap;

use bytemuck::Zeroable;
use glam::{Mat3, Mat4};
use wgpu::util::DeviceExt;

use crate::asset::{Assets, Handle, Mesh};
use crate::renderer::internal::{
    DynamicUniformSlots, GpuContext, ObjectsBuffer, PipelineCache, PipelineKey, RasterKey,
};
use crate::renderer::program::{MODEL_MATRIX, MODEL_NORMAL_MATRIX};
use crate::renderer::recording::{GfxCommand, RasterState};
use crate::renderer::{CameraUniform, MaterialData, ObjectData, ProgramKind, RenderError, ShaderProgram};

pub use crate::renderer::internal::DepthStencil;

const INITIAL_OBJECTS_CAPACITY: u32 = 1024;
const INITIAL_VIEW_SLOTS: u32 = 16;
const INITIAL_MATERIAL_SLOTS: u32 = 64;

#[derive(Debug)]
pub enum GpuError {
    Adapter(wgpu::RequestAdapterError),
    Device(wgpu::RequestDeviceError),
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::Adapter(e) => write!(f, "No suitable adapter: {}", e),
            GpuError::Device(e) => write!(f, "Failed to create device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {}

/// Attachments a frame is replayed into.
pub struct FrameTargets<'a> {
    pub color: &'a wgpu::TextureView,
    /// Must be a depth/stencil view in `Depth24PlusStencil8`.
    pub depth_stencil: &'a wgpu::TextureView,
    pub clear_color: wgpu::Color,
}

/// Color texture plus depth/stencil sized for offscreen rendering.
pub struct OffscreenTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: DepthStencil,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    pub fn targets(&self, clear_color: wgpu::Color) -> FrameTargets<'_> {
        FrameTargets {
            color: &self.color_view,
            depth_stencil: &self.depth.view,
            clear_color,
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Geometry {
    Mesh(Handle<Mesh>),
    ScreenQuad,
}

#[derive(Debug, Clone, Copy)]
struct DrawOp {
    pipeline: PipelineKey,
    stencil_reference: u32,
    camera_offset: u32,
    material_offset: u32,
    geometry: Geometry,
    instance: u32,
}

#[derive(Debug, Default)]
struct PassOps {
    clear_stencil: bool,
    draws: Vec<DrawOp>,
}

/// Replay cursor: the context state a recorded frame has built up so far.
struct ReplayState {
    raster: RasterState,
    program: Option<Handle<ShaderProgram>>,
    camera_offset: u32,
    material_offset: u32,
    model: Mat4,
    normal: Mat3,
}

pub struct GpuRenderer {
    context: GpuContext,
    color_format: wgpu::TextureFormat,
    views: DynamicUniformSlots<CameraUniform>,
    materials: DynamicUniformSlots<MaterialData>,
    objects: ObjectsBuffer,
    pipelines: PipelineCache,
    meshes: HashMap<Handle<Mesh>, GpuMesh>,
}

impl GpuRenderer {
    pub async fn new(color_format: wgpu::TextureFormat) -> Result<Self, GpuError> {
        let context = GpuContext::new_headless().await?;
        let views = DynamicUniformSlots::new(
            &context,
            "ViewSlots",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            INITIAL_VIEW_SLOTS,
        );
        let materials = DynamicUniformSlots::new(
            &context,
            "MaterialSlots",
            wgpu::ShaderStages::FRAGMENT,
            INITIAL_MATERIAL_SLOTS,
        );
        let objects = ObjectsBuffer::new(&context, INITIAL_OBJECTS_CAPACITY);
        let pipelines = PipelineCache::new(
            &context.device,
            &[&views.bind_layout, &objects.bind_layout, &materials.bind_layout],
            color_format,
        );

        Ok(Self {
            context,
            color_format,
            views,
            materials,
            objects,
            pipelines,
            meshes: HashMap::new(),
        })
    }

    pub fn new_blocking(color_format: wgpu::TextureFormat) -> Result<Self, GpuError> {
        pollster::block_on(Self::new(color_format))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.pipeline_count()
    }

    pub fn create_offscreen(&self, width: u32, height: u32) -> OffscreenTarget {
        let (width, height) = (width.max(1), height.max(1));
        let color = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("OffscreenColor"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        OffscreenTarget {
            color,
            color_view,
            depth: DepthStencil::new(&self.context.device, width, height),
            width,
            height,
        }
    }

    /// Compiles every program and uploads every mesh in `assets`.
    pub fn prepare(&mut self, assets: &Assets) {
        for (handle, program) in assets.programs.iter() {
            self.pipelines.compile(&self.context.device, handle, program);
        }

        for (handle, mesh) in assets.meshes.iter() {
            if mesh.indices.is_empty() {
                log::warn!("Mesh '{}' has no indices; it will not be drawn", mesh.label);
                continue;
            }
            let vertex_buffer =
                self.context
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&mesh.label),
                        contents: bytemuck::cast_slice(&mesh.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
            let index_buffer =
                self.context
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&mesh.label),
                        contents: bytemuck::cast_slice(&mesh.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    });
            self.meshes.insert(
                handle,
                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.index_count(),
                },
            );
        }

        log::info!(
            "Prepared {} programs and {} meshes",
            assets.programs.len(),
            self.meshes.len()
        );
    }

    /// Replays one recorded frame into `targets` and submits it.
    pub fn submit(
        &mut self,
        commands: &[GfxCommand],
        targets: &FrameTargets,
    ) -> Result<(), RenderError> {
        let passes = self.build_passes(commands)?;

        self.views.flush(&self.context);
        self.materials.flush(&self.context);
        self.objects.flush(&self.context);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("FrameEncoder"),
                });

        for (index, pass) in passes.iter().enumerate() {
            self.encode_pass(&mut encoder, pass, index == 0, targets);
        }

        self.context.queue.submit(Some(encoder.finish()));
        log::debug!(
            "Submitted {} passes, {} draws",
            passes.len(),
            passes.iter().map(|p| p.draws.len()).sum::<usize>()
        );
        Ok(())
    }

    fn build_passes(&mut self, commands: &[GfxCommand]) -> Result<Vec<PassOps>, RenderError> {
        self.views.begin_frame();
        self.materials.begin_frame();
        self.objects.begin_frame();

        let mut state = ReplayState {
            raster: RasterState::default(),
            program: None,
            camera_offset: self.views.push(&CameraUniform::default()),
            material_offset: self.materials.push(&MaterialData::zeroed()),
            model: Mat4::IDENTITY,
            normal: Mat3::IDENTITY,
        };
        let mut passes = Vec::new();
        let mut current = PassOps::default();

        for command in commands {
            state.raster.apply(command);
            match command {
                GfxCommand::UseProgram(program) => state.program = Some(*program),
                GfxCommand::SetUniformMat4 { location, value } => {
                    if self.pipelines.uniform_name(location.program, location.slot)
                        == Some(MODEL_MATRIX)
                    {
                        state.model = *value;
                    }
                }
                GfxCommand::SetUniformMat3 { location, value } => {
                    if self.pipelines.uniform_name(location.program, location.slot)
                        == Some(MODEL_NORMAL_MATRIX)
                    {
                        state.normal = *value;
                    }
                }
                GfxCommand::ApplyMaterial { data, .. } => {
                    state.material_offset = self.materials.push(data);
                }
                GfxCommand::WriteViewData(data) => {
                    state.camera_offset = self.views.push(data);
                }
                GfxCommand::ClearStencil => {
                    // Stencil can only be cleared at pass start.
                    if !current.draws.is_empty() {
                        passes.push(std::mem::take(&mut current));
                    }
                    current.clear_stencil = true;
                }
                GfxCommand::DrawMesh(mesh) => {
                    if !self.meshes.contains_key(mesh) {
                        return Err(RenderError::UnknownMesh(*mesh));
                    }
                    if let Some(op) = self.draw_op(&state, Geometry::Mesh(*mesh))? {
                        current.draws.push(op);
                    }
                }
                GfxCommand::DrawScreenQuad => {
                    if let Some(op) = self.draw_op(&state, Geometry::ScreenQuad)? {
                        current.draws.push(op);
                    }
                }
                // Mesh binding is implied by each draw; raster commands were applied above.
                GfxCommand::BindMesh(_)
                | GfxCommand::SetStencilTest(_)
                | GfxCommand::StencilFunc { .. }
                | GfxCommand::StencilOp { .. }
                | GfxCommand::StencilWriteMask(_)
                | GfxCommand::ColorMask(_)
                | GfxCommand::DepthFunc(_) => {}
            }
        }

        passes.push(current);
        Ok(passes)
    }

    fn draw_op(
        &mut self,
        state: &ReplayState,
        geometry: Geometry,
    ) -> Result<Option<DrawOp>, RenderError> {
        let Some(program) = state.program else {
            log::warn!("Draw without a program skipped");
            return Ok(None);
        };
        let expected = match geometry {
            Geometry::Mesh(_) => ProgramKind::Mesh,
            Geometry::ScreenQuad => ProgramKind::FullscreenQuad,
        };
        if self.pipelines.kind(program)? != expected {
            log::warn!("Program {:?} cannot draw {:?}; skipped", program, geometry);
            return Ok(None);
        }

        let pipeline = PipelineKey {
            program,
            raster: RasterKey::from(&state.raster),
        };
        self.pipelines.ensure(&self.context.device, pipeline)?;

        let instance = match geometry {
            Geometry::Mesh(_) => self.objects.push(ObjectData::new(state.model, state.normal)),
            Geometry::ScreenQuad => 0,
        };

        Ok(Some(DrawOp {
            pipeline,
            stencil_reference: state.raster.stencil_reference,
            camera_offset: state.camera_offset,
            material_offset: state.material_offset,
            geometry,
            instance,
        }))
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &PassOps,
        first: bool,
        targets: &FrameTargets,
    ) {
        let (color_load, depth_load) = if first {
            (wgpu::LoadOp::Clear(targets.clear_color), wgpu::LoadOp::Clear(1.0))
        } else {
            (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
        };
        let stencil_load = if first || pass.clear_stencil {
            wgpu::LoadOp::Clear(0)
        } else {
            wgpu::LoadOp::Load
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ScenePass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: targets.color,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: targets.depth_stencil,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: stencil_load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_bind_group(1, &self.objects.bind_group, &[]);
        let mut bound_pipeline: Option<PipelineKey> = None;
        let mut bound_mesh: Option<Handle<Mesh>> = None;

        for op in &pass.draws {
            if bound_pipeline != Some(op.pipeline) {
                let Some(pipeline) = self.pipelines.get(&op.pipeline) else {
                    log::warn!("Pipeline {:?} missing at encode time", op.pipeline);
                    continue;
                };
                rpass.set_pipeline(pipeline);
                bound_pipeline = Some(op.pipeline);
            }
            rpass.set_stencil_reference(op.stencil_reference);
            rpass.set_bind_group(0, &self.views.bind_group, &[op.camera_offset]);
            rpass.set_bind_group(2, &self.materials.bind_group, &[op.material_offset]);

            match op.geometry {
                Geometry::Mesh(handle) => {
                    let Some(mesh) = self.meshes.get(&handle) else {
                        continue;
                    };
                    if bound_mesh != Some(handle) {
                        rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        bound_mesh = Some(handle);
                    }
                    rpass.draw_indexed(0..mesh.index_count, 0, op.instance..op.instance + 1);
                }
                Geometry::ScreenQuad => rpass.draw(0..4, 0..1),
            }
        }
    }
}
