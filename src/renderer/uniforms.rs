// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::renderer::GraphicsContext;

/// Shared view buffer consumed by every shader: one write per viewpoint.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn new() -> Self {
        Self::from_view_projection(Mat4::IDENTITY, Mat4::IDENTITY)
    }

    pub fn from_view_projection(view: Mat4, projection: Mat4) -> Self {
        let camera_pos = view.inverse().w_axis.truncate();
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            view_proj: (projection * view).to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            _padding: 0.0,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection)
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Uploads an arbitrary view/projection pair into the shared view buffer,
/// independent of any camera.
pub fn set_view_parameters(ctx: &mut dyn GraphicsContext, view: Mat4, projection: Mat4) {
    ctx.write_view_data(&CameraUniform::from_view_projection(view, projection));
}

/// Per-draw instance data written by the GPU backend.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct ObjectData {
    pub model: [[f32; 4]; 4],  // 64 bytes
    pub normal: [[f32; 4]; 3], // 48 bytes, mat3x3 columns padded to vec4
}

impl ObjectData {
    pub fn new(model: Mat4, normal: Mat3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: [
                normal.x_axis.extend(0.0).to_array(),
                normal.y_axis.extend(0.0).to_array(),
                normal.z_axis.extend(0.0).to_array(),
            ],
        }
    }
}

impl Default for ObjectData {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat3::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn camera_uniform_is_208_bytes() {
        // 3 * mat4x4<f32> = 192 bytes, vec3<f32> = 12 bytes, padding = 4 bytes
        assert_eq!(std::mem::size_of::<CameraUniform>(), 208);
    }

    #[test]
    fn object_data_is_112_bytes() {
        assert_eq!(std::mem::size_of::<ObjectData>(), 112);
    }

    #[test]
    fn camera_position_is_recovered_from_view() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let uniform = CameraUniform::from_view_projection(view, Mat4::IDENTITY);

        assert!(Vec3::from_array(uniform.camera_pos).abs_diff_eq(eye, 1e-5));
        assert!(uniform.view().abs_diff_eq(view, 1e-6));
    }

    #[test]
    fn view_parameters_are_written_once() {
        use crate::renderer::{GfxCommand, RecordingContext};

        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);
        let mut ctx = RecordingContext::new();
        set_view_parameters(&mut ctx, view, projection);

        assert_eq!(
            ctx.commands(),
            &[GfxCommand::WriteViewData(CameraUniform::from_view_projection(
                view, projection
            ))]
        );
        assert_eq!(*ctx.state(), Default::default());
    }
}
