//! The immediate-mode graphics context the scene renders through.
//!
//! Everything here is a command against one implicit, single-writer state
//! machine: the stencil/depth/color-mask registers, the active program, the
//! bound mesh and the shared view buffer. Commands take effect in submission
//! order and the renderer is responsible for leaving state the way the next
//! caller expects it.

use glam::{Mat3, Mat4};

use crate::asset::{Handle, Mesh};
use crate::renderer::{CameraUniform, Material, MaterialData, ShaderProgram};

/// Opaque location of a named uniform within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub program: Handle<ShaderProgram>,
    pub slot: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
}

/// Full mask for 8-bit stencil buffers.
pub const STENCIL_ALL: u32 = 0xFF;

pub trait GraphicsContext {
    fn use_program(&mut self, program: Handle<ShaderProgram>);

    /// `None` when the program does not expose `name`.
    fn uniform_location(
        &mut self,
        program: Handle<ShaderProgram>,
        name: &str,
    ) -> Option<UniformLocation>;

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: Mat4);

    fn set_uniform_mat3(&mut self, location: UniformLocation, value: Mat3);

    /// Uploads a material's fixed uniform block for subsequent draws.
    fn apply_material(&mut self, material: Handle<Material>, data: &MaterialData);

    fn bind_mesh(&mut self, mesh: Handle<Mesh>);

    /// Draws the currently bound mesh.
    fn draw_mesh(&mut self, mesh: Handle<Mesh>);

    fn bind_and_draw(&mut self, mesh: Handle<Mesh>) {
        self.bind_mesh(mesh);
        self.draw_mesh(mesh);
    }

    /// Four-vertex strip covering the viewport, drawn with the active program.
    fn draw_screen_quad(&mut self);

    /// Replaces the contents of the shared view buffer.
    fn write_view_data(&mut self, data: &CameraUniform);

    fn set_stencil_test(&mut self, enabled: bool);

    /// Clears the stencil buffer to zero, honoring the stencil write mask.
    fn clear_stencil(&mut self);

    fn stencil_func(&mut self, compare: CompareFunction, reference: u32, read_mask: u32);

    fn stencil_op(
        &mut self,
        stencil_fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    );

    fn stencil_write_mask(&mut self, mask: u32);

    fn color_mask(&mut self, enabled: bool);

    fn depth_func(&mut self, compare: CompareFunction);
}
