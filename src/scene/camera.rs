use glam::{Mat4, Vec3, Vec4};

use crate::renderer::{CameraUniform, GraphicsContext};
use crate::scene::Transform;

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    /// World transform; scale is ignored.
    pub transform: Transform,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn looking_at(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            transform: Transform::looking_at(eye, target, Vec3::Y),
            aspect,
            ..Default::default()
        }
    }

    /// Rigid world matrix of the camera.
    pub fn world(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.transform.rotation, self.transform.translation)
    }

    pub fn view(&self) -> Mat4 {
        self.world().inverse()
    }

    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform::from_view_projection(self.view(), self.proj())
    }

    /// Writes this camera's view and projection into the shared view buffer.
    pub fn activate(&self, ctx: &mut dyn GraphicsContext) {
        ctx.write_view_data(&self.uniform());
    }

    /// Projection whose near plane is replaced by `clip_plane` (view space,
    /// `xyz` pointing into the kept half-space). Depth stays in [0, 1] and the
    /// far plane is kept as tight as the skew allows. Falls back to the plain
    /// projection when the camera is not behind the plane or the plane is
    /// parallel to the view direction.
    pub fn oblique_projection(&self, clip_plane: Vec4) -> Mat4 {
        let proj = self.proj();
        if clip_plane.w >= 0.0 {
            return proj;
        }

        // Far corner of the frustum on the plane's side, in view space.
        let clip = proj.inverse().transpose() * clip_plane;
        let q = proj.inverse() * Vec4::new(clip.x.signum(), clip.y.signum(), 1.0, 1.0);
        let denom = clip_plane.dot(q);
        if denom.abs() < 1e-5 {
            return proj;
        }

        let c = clip_plane / denom;
        let mut m = proj.to_cols_array_2d();
        m[0][2] = c.x;
        m[1][2] = c.y;
        m[2][2] = c.z;
        m[3][2] = c.w;
        Mat4::from_cols_array_2d(&m)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::looking_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y),
            fov_y_radians: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}
