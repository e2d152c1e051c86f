// renderer/portal.rs
//
// Draws the scene as seen through a portal into the stencil-masked aperture
// of that portal, recursing into portals visible through it until the depth
// limit. Every level leaves the raster state exactly as it found it.

use crate::asset::{Assets, Handle};
use crate::renderer::batch::{draw_opaque, DrawStats, TransparentPass};
use crate::renderer::gfx::{GraphicsContext, UniformLocation};
use crate::renderer::program::MODEL_MATRIX;
use crate::renderer::state::PortalPasses;
use crate::renderer::{set_view_parameters, CameraUniform, RenderError, ShaderProgram};
use crate::scene::{Camera, ObjectRegistry, Portal};
use crate::settings::{DEFAULT_CLEAR_COLOR, MAX_STENCIL_DEPTH};

/// The two helper programs the portal protocol draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalPrograms {
    /// Writes depth and stencil only; exposes `modelMatrix`.
    pub holdout: Handle<ShaderProgram>,
    /// Full-screen pass writing the far plane into depth.
    pub depth_reset: Handle<ShaderProgram>,
}

impl PortalPrograms {
    pub fn register(assets: &mut Assets) -> Self {
        Self::register_with_background(assets, DEFAULT_CLEAR_COLOR)
    }

    /// Registers both programs, the depth reset painting `background`.
    pub fn register_with_background(assets: &mut Assets, background: [f32; 4]) -> Self {
        Self {
            holdout: assets.add_program(ShaderProgram::portal_holdout()),
            depth_reset: assets.add_program(ShaderProgram::depth_reset_with_background(
                background,
            )),
        }
    }
}

/// Everything a portal view needs, borrowed for one frame.
pub struct PortalRenderer<'a> {
    pub assets: &'a Assets,
    pub registry: &'a ObjectRegistry,
    pub portals: &'a [Portal],
    /// Supplies the base projection for every secondary view.
    pub camera: &'a Camera,
    pub programs: PortalPrograms,
    pub transparent: &'a dyn TransparentPass,
    /// Deepest nesting level rendered; 1 draws no portal inside a portal.
    pub max_depth: u32,
}

impl PortalRenderer<'_> {
    /// Renders every portal as seen from the primary camera.
    pub fn render_all(&self, ctx: &mut dyn GraphicsContext) -> Result<DrawStats, RenderError> {
        let max_depth = self.max_depth.clamp(1, MAX_STENCIL_DEPTH);
        if max_depth != self.max_depth {
            log::warn!(
                "Portal depth {} out of range, rendering {} levels",
                self.max_depth,
                max_depth
            );
        }
        self.render_level(ctx, &self.camera.uniform(), 1, max_depth)
    }

    fn render_level(
        &self,
        ctx: &mut dyn GraphicsContext,
        viewer: &CameraUniform,
        level: u32,
        max_depth: u32,
    ) -> Result<DrawStats, RenderError> {
        let mut stats = DrawStats::default();
        for portal in self.portals {
            stats += self.render_portal(ctx, portal, viewer, level, max_depth)?;
        }
        Ok(stats)
    }

    /// Composites `portal` into the frame at nesting `level`, as seen by
    /// `viewer`. Once the mask is written the restore phases always run, so
    /// an error from the secondary view still leaves the parent's state.
    fn render_portal(
        &self,
        ctx: &mut dyn GraphicsContext,
        portal: &Portal,
        viewer: &CameraUniform,
        level: u32,
        max_depth: u32,
    ) -> Result<DrawStats, RenderError> {
        let model = self.holdout_model_location(ctx)?;
        if !self.assets.meshes.contains(portal.mesh) {
            return Err(RenderError::UnknownMesh(portal.mesh));
        }
        if !self.assets.programs.contains(self.programs.depth_reset) {
            return Err(RenderError::UnknownProgram(self.programs.depth_reset));
        }

        let mut passes = PortalPasses::new(level);
        let mut stats = DrawStats {
            portals: 1,
            ..Default::default()
        };
        log::trace!("Portal '{}' at level {}", portal.label, level);

        passes.begin_mask(ctx);
        self.draw_surface(ctx, portal, viewer, model);

        passes.begin_depth_reset(ctx);
        ctx.use_program(self.programs.depth_reset);
        ctx.draw_screen_quad();
        passes.end_depth_reset(ctx);

        let view = portal.secondary_view(viewer.view());
        let projection = self.camera.oblique_projection(portal.clip_plane(view));
        set_view_parameters(ctx, view, projection);

        passes.begin_secondary_draw();
        let secondary = CameraUniform::from_view_projection(view, projection);
        let drawn = self.draw_secondary(ctx, &secondary, level, max_depth);
        if let Err(err) = &drawn {
            log::debug!("Restoring after failed portal '{}' at level {}: {}", portal.label, level, err);
        }

        passes.begin_restore(ctx);
        self.draw_surface(ctx, portal, viewer, model);
        passes.end_portal(ctx);

        stats += drawn?;
        Ok(stats)
    }

    /// Scene content inside the aperture: opaque objects, nested portals,
    /// then the transparent pass.
    fn draw_secondary(
        &self,
        ctx: &mut dyn GraphicsContext,
        secondary: &CameraUniform,
        level: u32,
        max_depth: u32,
    ) -> Result<DrawStats, RenderError> {
        let mut stats = draw_opaque(ctx, self.assets, self.registry, None)?;
        if level < max_depth {
            // Each nested portal restores the view buffer to `secondary`.
            stats += self.render_level(ctx, secondary, level + 1, max_depth)?;
        }
        stats += self
            .transparent
            .draw_transparent(ctx, self.assets, self.registry)?;
        Ok(stats)
    }

    fn holdout_model_location(
        &self,
        ctx: &mut dyn GraphicsContext,
    ) -> Result<UniformLocation, RenderError> {
        let program = self.programs.holdout;
        if !self.assets.programs.contains(program) {
            return Err(RenderError::UnknownProgram(program));
        }
        ctx.uniform_location(program, MODEL_MATRIX)
            .ok_or(RenderError::MissingUniform {
                program,
                name: MODEL_MATRIX,
            })
    }

    /// Portal mesh with the holdout program from the viewer's point of view.
    fn draw_surface(
        &self,
        ctx: &mut dyn GraphicsContext,
        portal: &Portal,
        viewer: &CameraUniform,
        model: UniformLocation,
    ) {
        ctx.write_view_data(viewer);
        ctx.use_program(self.programs.holdout);
        ctx.set_uniform_mat4(model, portal.transform.matrix());
        ctx.bind_and_draw(portal.mesh);
    }
}
