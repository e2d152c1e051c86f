use std::collections::HashMap;

use crate::asset::{Handle, Vertex};
use crate::renderer::gfx::{CompareFunction, StencilOperation};
use crate::renderer::internal::DEPTH_STENCIL_FORMAT;
use crate::renderer::recording::RasterState;
use crate::renderer::{PipelineBuilder, ProgramKind, RenderError, ShaderProgram};

/// Raster state baked into a pipeline. The stencil reference is excluded: it
/// is dynamic pass state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RasterKey {
    stencil: Option<StencilKey>,
    color_writes: bool,
    depth_compare: CompareFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StencilKey {
    compare: CompareFunction,
    fail: StencilOperation,
    depth_fail: StencilOperation,
    pass: StencilOperation,
    read_mask: u32,
    write_mask: u32,
}

impl From<&RasterState> for RasterKey {
    fn from(state: &RasterState) -> Self {
        let stencil = state.stencil_test.then_some(StencilKey {
            compare: state.stencil_compare,
            fail: state.stencil_fail,
            depth_fail: state.depth_fail,
            pass: state.stencil_pass,
            read_mask: state.stencil_read_mask,
            write_mask: state.stencil_write_mask,
        });
        Self {
            stencil,
            color_writes: state.color_writes,
            depth_compare: state.depth_compare,
        }
    }
}

impl RasterKey {
    fn stencil_state(&self) -> wgpu::StencilState {
        match self.stencil {
            // Stencil test off: always pass, never write.
            None => wgpu::StencilState::default(),
            Some(s) => {
                let face = wgpu::StencilFaceState {
                    compare: to_wgpu_compare(s.compare),
                    fail_op: to_wgpu_stencil_op(s.fail),
                    depth_fail_op: to_wgpu_stencil_op(s.depth_fail),
                    pass_op: to_wgpu_stencil_op(s.pass),
                };
                wgpu::StencilState {
                    front: face,
                    back: face,
                    read_mask: s.read_mask,
                    write_mask: s.write_mask,
                }
            }
        }
    }

    fn color_write_mask(&self) -> wgpu::ColorWrites {
        if self.color_writes {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub(crate) program: Handle<ShaderProgram>,
    pub(crate) raster: RasterKey,
}

pub(crate) fn to_wgpu_compare(compare: CompareFunction) -> wgpu::CompareFunction {
    match compare {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub(crate) fn to_wgpu_stencil_op(op: StencilOperation) -> wgpu::StencilOperation {
    match op {
        StencilOperation::Keep => wgpu::StencilOperation::Keep,
        StencilOperation::Zero => wgpu::StencilOperation::Zero,
        StencilOperation::Replace => wgpu::StencilOperation::Replace,
        StencilOperation::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
        StencilOperation::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
        StencilOperation::Invert => wgpu::StencilOperation::Invert,
    }
}

struct ProgramModule {
    label: String,
    module: wgpu::ShaderModule,
    kind: ProgramKind,
    double_sided: bool,
    uniforms: Vec<&'static str>,
}

/// Compiled programs plus one pipeline per (program, raster state) seen so far.
pub(crate) struct PipelineCache {
    layout: wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    programs: HashMap<Handle<ShaderProgram>, ProgramModule>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub(crate) fn new(
        device: &wgpu::Device,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("SceneLayout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });
        Self {
            layout,
            color_format,
            programs: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    pub(crate) fn compile(
        &mut self,
        device: &wgpu::Device,
        handle: Handle<ShaderProgram>,
        program: &ShaderProgram,
    ) {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&program.label),
            source: wgpu::ShaderSource::Wgsl(program.source.clone()),
        });
        // Recompiling invalidates pipelines built from the old module.
        self.pipelines.retain(|key, _| key.program != handle);
        self.programs.insert(
            handle,
            ProgramModule {
                label: program.label.clone(),
                module,
                kind: program.kind,
                double_sided: program.double_sided,
                uniforms: program.uniforms().to_vec(),
            },
        );
    }

    pub(crate) fn kind(&self, program: Handle<ShaderProgram>) -> Result<ProgramKind, RenderError> {
        self.programs
            .get(&program)
            .map(|p| p.kind)
            .ok_or(RenderError::UnknownProgram(program))
    }

    /// Name of the uniform at `slot` in a compiled program.
    pub(crate) fn uniform_name(&self, program: Handle<ShaderProgram>, slot: u32) -> Option<&'static str> {
        self.programs
            .get(&program)?
            .uniforms
            .get(slot as usize)
            .copied()
    }

    pub(crate) fn ensure(&mut self, device: &wgpu::Device, key: PipelineKey) -> Result<(), RenderError> {
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        let program = self
            .programs
            .get(&key.program)
            .ok_or(RenderError::UnknownProgram(key.program))?;

        log::debug!("Building pipeline for '{}' with {:?}", program.label, key.raster);
        let mut builder = PipelineBuilder::new(device, &self.layout, &program.module)
            .with_label(&program.label)
            .with_color_target(
                self.color_format,
                Some(wgpu::BlendState::REPLACE),
                key.raster.color_write_mask(),
            )
            .with_depth_stencil(
                DEPTH_STENCIL_FORMAT,
                true,
                to_wgpu_compare(key.raster.depth_compare),
                key.raster.stencil_state(),
            );
        builder = match program.kind {
            ProgramKind::Mesh => builder.with_vertex_buffer(Vertex::layout()),
            ProgramKind::FullscreenQuad => {
                builder.with_topology(wgpu::PrimitiveTopology::TriangleStrip)
            }
        };
        if program.double_sided {
            builder = builder.with_no_culling();
        }

        let pipeline = builder.build();
        self.pipelines.insert(key, pipeline);
        Ok(())
    }

    pub(crate) fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub(crate) fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::gfx::STENCIL_ALL;

    #[test]
    fn disabled_stencil_ignores_stencil_registers() {
        let mut a = RasterState::default();
        let mut b = RasterState::default();
        a.stencil_compare = CompareFunction::Equal;
        b.stencil_reference = 7;
        assert_eq!(RasterKey::from(&a), RasterKey::from(&b));
        assert_eq!(RasterKey::from(&a).stencil_state(), wgpu::StencilState::default());
    }

    #[test]
    fn stencil_reference_does_not_split_pipelines() {
        let mut a = RasterState {
            stencil_test: true,
            stencil_compare: CompareFunction::Equal,
            ..Default::default()
        };
        let b = RasterState {
            stencil_reference: 3,
            ..a
        };
        assert_eq!(RasterKey::from(&a), RasterKey::from(&b));

        a.stencil_write_mask = 0;
        assert_ne!(RasterKey::from(&a), RasterKey::from(&b));
    }

    #[test]
    fn enabled_stencil_maps_to_both_faces() {
        let state = RasterState {
            stencil_test: true,
            stencil_compare: CompareFunction::Always,
            stencil_pass: StencilOperation::Replace,
            stencil_write_mask: STENCIL_ALL,
            color_writes: false,
            ..Default::default()
        };
        let key = RasterKey::from(&state);
        let stencil = key.stencil_state();

        assert_eq!(stencil.front, stencil.back);
        assert_eq!(stencil.front.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(stencil.front.compare, wgpu::CompareFunction::Always);
        assert_eq!(stencil.write_mask, 0xFF);
        assert_eq!(key.color_write_mask(), wgpu::ColorWrites::empty());
    }
}
