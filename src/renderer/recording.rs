// renderer/recording.rs
//
// Headless context: records every command in submission order and mirrors
// the raster registers so callers can inspect the state a frame leaves behind.
// The GPU backend replays these recordings.

use std::collections::HashMap;

use glam::{Mat3, Mat4};

use crate::asset::{Assets, Handle, Mesh};
use crate::renderer::gfx::{
    CompareFunction, GraphicsContext, StencilOperation, UniformLocation, STENCIL_ALL,
};
use crate::renderer::{CameraUniform, Material, MaterialData, ShaderProgram};

#[derive(Debug, Clone, PartialEq)]
pub enum GfxCommand {
    UseProgram(Handle<ShaderProgram>),
    SetUniformMat4 {
        location: UniformLocation,
        value: Mat4,
    },
    SetUniformMat3 {
        location: UniformLocation,
        value: Mat3,
    },
    ApplyMaterial {
        material: Handle<Material>,
        data: MaterialData,
    },
    BindMesh(Handle<Mesh>),
    DrawMesh(Handle<Mesh>),
    DrawScreenQuad,
    WriteViewData(CameraUniform),
    SetStencilTest(bool),
    ClearStencil,
    StencilFunc {
        compare: CompareFunction,
        reference: u32,
        read_mask: u32,
    },
    StencilOp {
        stencil_fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    },
    StencilWriteMask(u32),
    ColorMask(bool),
    DepthFunc(CompareFunction),
}

impl GfxCommand {
    /// True for commands that change raster registers rather than draw or bind.
    pub fn is_raster_state(&self) -> bool {
        matches!(
            self,
            Self::SetStencilTest(_)
                | Self::ClearStencil
                | Self::StencilFunc { .. }
                | Self::StencilOp { .. }
                | Self::StencilWriteMask(_)
                | Self::ColorMask(_)
                | Self::DepthFunc(_)
        )
    }
}

/// Snapshot of the stencil, depth and color-mask registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    pub stencil_test: bool,
    pub stencil_compare: CompareFunction,
    pub stencil_reference: u32,
    pub stencil_read_mask: u32,
    pub stencil_fail: StencilOperation,
    pub depth_fail: StencilOperation,
    pub stencil_pass: StencilOperation,
    pub stencil_write_mask: u32,
    pub color_writes: bool,
    pub depth_compare: CompareFunction,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            stencil_test: false,
            stencil_compare: CompareFunction::Always,
            stencil_reference: 0,
            stencil_read_mask: STENCIL_ALL,
            stencil_fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            stencil_pass: StencilOperation::Keep,
            stencil_write_mask: STENCIL_ALL,
            color_writes: true,
            depth_compare: CompareFunction::Less,
        }
    }
}

impl RasterState {
    /// Applies a raster command; other commands leave the state untouched.
    pub fn apply(&mut self, command: &GfxCommand) {
        match *command {
            GfxCommand::SetStencilTest(enabled) => self.stencil_test = enabled,
            GfxCommand::StencilFunc {
                compare,
                reference,
                read_mask,
            } => {
                self.stencil_compare = compare;
                self.stencil_reference = reference;
                self.stencil_read_mask = read_mask;
            }
            GfxCommand::StencilOp {
                stencil_fail,
                depth_fail,
                pass,
            } => {
                self.stencil_fail = stencil_fail;
                self.depth_fail = depth_fail;
                self.stencil_pass = pass;
            }
            GfxCommand::StencilWriteMask(mask) => self.stencil_write_mask = mask,
            GfxCommand::ColorMask(enabled) => self.color_writes = enabled,
            GfxCommand::DepthFunc(compare) => self.depth_compare = compare,
            _ => {}
        }
    }
}

#[derive(Default)]
pub struct RecordingContext {
    programs: HashMap<Handle<ShaderProgram>, Vec<&'static str>>,
    commands: Vec<GfxCommand>,
    state: RasterState,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that knows the uniforms of every program in `assets`.
    pub fn from_assets(assets: &Assets) -> Self {
        let mut ctx = Self::new();
        for (handle, program) in assets.programs.iter() {
            ctx.register_program(handle, program);
        }
        ctx
    }

    pub fn register_program(&mut self, handle: Handle<ShaderProgram>, program: &ShaderProgram) {
        self.programs.insert(handle, program.uniforms().to_vec());
    }

    pub fn commands(&self) -> &[GfxCommand] {
        &self.commands
    }

    /// Hands the recorded frame over and starts a new one. Raster state
    /// carries over, as it would on a real context.
    pub fn take_commands(&mut self) -> Vec<GfxCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn state(&self) -> &RasterState {
        &self.state
    }

    pub fn count(&self, predicate: impl Fn(&GfxCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    pub fn draw_calls(&self) -> usize {
        self.count(|c| matches!(c, GfxCommand::DrawMesh(_) | GfxCommand::DrawScreenQuad))
    }

    fn record(&mut self, command: GfxCommand) {
        self.state.apply(&command);
        log::trace!("gfx: {:?}", command);
        self.commands.push(command);
    }
}

impl GraphicsContext for RecordingContext {
    fn use_program(&mut self, program: Handle<ShaderProgram>) {
        self.record(GfxCommand::UseProgram(program));
    }

    fn uniform_location(
        &mut self,
        program: Handle<ShaderProgram>,
        name: &str,
    ) -> Option<UniformLocation> {
        let uniforms = self.programs.get(&program)?;
        let slot = uniforms.iter().position(|u| *u == name)?;
        Some(UniformLocation {
            program,
            slot: slot as u32,
        })
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: Mat4) {
        self.record(GfxCommand::SetUniformMat4 { location, value });
    }

    fn set_uniform_mat3(&mut self, location: UniformLocation, value: Mat3) {
        self.record(GfxCommand::SetUniformMat3 { location, value });
    }

    fn apply_material(&mut self, material: Handle<Material>, data: &MaterialData) {
        self.record(GfxCommand::ApplyMaterial {
            material,
            data: *data,
        });
    }

    fn bind_mesh(&mut self, mesh: Handle<Mesh>) {
        self.record(GfxCommand::BindMesh(mesh));
    }

    fn draw_mesh(&mut self, mesh: Handle<Mesh>) {
        self.record(GfxCommand::DrawMesh(mesh));
    }

    fn draw_screen_quad(&mut self) {
        self.record(GfxCommand::DrawScreenQuad);
    }

    fn write_view_data(&mut self, data: &CameraUniform) {
        self.record(GfxCommand::WriteViewData(*data));
    }

    fn set_stencil_test(&mut self, enabled: bool) {
        self.record(GfxCommand::SetStencilTest(enabled));
    }

    fn clear_stencil(&mut self) {
        self.record(GfxCommand::ClearStencil);
    }

    fn stencil_func(&mut self, compare: CompareFunction, reference: u32, read_mask: u32) {
        self.record(GfxCommand::StencilFunc {
            compare,
            reference,
            read_mask,
        });
    }

    fn stencil_op(
        &mut self,
        stencil_fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    ) {
        self.record(GfxCommand::StencilOp {
            stencil_fail,
            depth_fail,
            pass,
        });
    }

    fn stencil_write_mask(&mut self, mask: u32) {
        self.record(GfxCommand::StencilWriteMask(mask));
    }

    fn color_mask(&mut self, enabled: bool) {
        self.record(GfxCommand::ColorMask(enabled));
    }

    fn depth_func(&mut self, compare: CompareFunction) {
        self.record(GfxCommand::DepthFunc(compare));
    }
}
