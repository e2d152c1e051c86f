// renderer/batch.rs
use crate::asset::{Assets, Handle, Mesh};
use crate::renderer::gfx::{GraphicsContext, UniformLocation};
use crate::renderer::program::{MODEL_MATRIX, MODEL_NORMAL_MATRIX};
use crate::renderer::{Material, RenderError, ShaderProgram};
use crate::scene::{ObjectId, ObjectRegistry};

/// State changes and draws issued by a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub programs_bound: usize,
    pub materials_applied: usize,
    pub meshes_bound: usize,
    pub draw_calls: usize,
    pub portals: usize,
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: Self) {
        self.programs_bound += rhs.programs_bound;
        self.materials_applied += rhs.materials_applied;
        self.meshes_bound += rhs.meshes_bound;
        self.draw_calls += rhs.draw_calls;
        self.portals += rhs.portals;
    }
}

/// Hook for drawing blended geometry after the opaque pass of a view.
pub trait TransparentPass {
    fn draw_transparent(
        &self,
        ctx: &mut dyn GraphicsContext,
        assets: &Assets,
        registry: &ObjectRegistry,
    ) -> Result<DrawStats, RenderError>;
}

/// Draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransparentPass;

impl TransparentPass for NoTransparentPass {
    fn draw_transparent(
        &self,
        _ctx: &mut dyn GraphicsContext,
        _assets: &Assets,
        registry: &ObjectRegistry,
    ) -> Result<DrawStats, RenderError> {
        log::trace!("Transparent pass skipped ({} objects)", registry.len());
        Ok(DrawStats::default())
    }
}

struct InstanceUniforms {
    model: UniformLocation,
    normal: UniformLocation,
}

impl InstanceUniforms {
    fn resolve(
        ctx: &mut dyn GraphicsContext,
        program: Handle<ShaderProgram>,
    ) -> Result<Self, RenderError> {
        let mut lookup = |name: &'static str| {
            ctx.uniform_location(program, name)
                .ok_or(RenderError::MissingUniform { program, name })
        };
        Ok(Self {
            model: lookup(MODEL_MATRIX)?,
            normal: lookup(MODEL_NORMAL_MATRIX)?,
        })
    }
}

/// Draws every registered object with its own program and material, or with
/// `override_material` for all of them.
///
/// Grouped mode changes program, material and mesh exactly once per distinct
/// group; only the per-object matrices are uploaded per draw. Objects whose
/// material is alpha-blended are left to the [`TransparentPass`]; an override
/// replaces their material, so override mode draws them too.
pub fn draw_opaque(
    ctx: &mut dyn GraphicsContext,
    assets: &Assets,
    registry: &ObjectRegistry,
    override_material: Option<Handle<Material>>,
) -> Result<DrawStats, RenderError> {
    match override_material {
        Some(material) => draw_with_override(ctx, assets, registry, material),
        None => draw_grouped(ctx, assets, registry),
    }
}

fn draw_grouped(
    ctx: &mut dyn GraphicsContext,
    assets: &Assets,
    registry: &ObjectRegistry,
) -> Result<DrawStats, RenderError> {
    let mut stats = DrawStats::default();

    for (program, materials) in registry.index().programs() {
        if !assets.programs.contains(program) {
            return Err(RenderError::UnknownProgram(program));
        }
        ctx.use_program(program);
        stats.programs_bound += 1;
        let uniforms = InstanceUniforms::resolve(ctx, program)?;

        for (&material, meshes) in materials {
            let resolved = assets
                .materials
                .get(material)
                .ok_or(RenderError::UnknownMaterial(material))?;
            if resolved.is_transparent() {
                log::trace!("Deferring '{}' to the transparent pass", resolved.label);
                continue;
            }
            ctx.apply_material(material, &resolved.data());
            stats.materials_applied += 1;

            for (&mesh, ids) in meshes {
                draw_bucket(ctx, registry, &uniforms, mesh, ids, &mut stats);
            }
        }
    }

    log::trace!("Grouped opaque pass: {:?}", stats);
    Ok(stats)
}

fn draw_with_override(
    ctx: &mut dyn GraphicsContext,
    assets: &Assets,
    registry: &ObjectRegistry,
    material: Handle<Material>,
) -> Result<DrawStats, RenderError> {
    let mut stats = DrawStats::default();
    let overriding = assets
        .materials
        .get(material)
        .ok_or(RenderError::UnknownMaterial(material))?;
    let program = overriding.program;
    if !assets.programs.contains(program) {
        return Err(RenderError::UnknownProgram(program));
    }

    ctx.use_program(program);
    ctx.apply_material(material, &overriding.data());
    stats.programs_bound += 1;
    stats.materials_applied += 1;
    let uniforms = InstanceUniforms::resolve(ctx, program)?;

    for (mesh, ids) in registry.index().by_mesh() {
        draw_bucket(ctx, registry, &uniforms, mesh, &ids, &mut stats);
    }

    log::trace!("Override opaque pass with {:?}: {:?}", material, stats);
    Ok(stats)
}

fn draw_bucket(
    ctx: &mut dyn GraphicsContext,
    registry: &ObjectRegistry,
    uniforms: &InstanceUniforms,
    mesh: Handle<Mesh>,
    ids: &[ObjectId],
    stats: &mut DrawStats,
) {
    ctx.bind_mesh(mesh);
    stats.meshes_bound += 1;

    for &id in ids {
        let Some(object) = registry.get_by_id(id) else {
            debug_assert!(false, "index refers to missing object {:?}", id);
            continue;
        };
        ctx.set_uniform_mat4(uniforms.model, object.transform.matrix());
        ctx.set_uniform_mat3(uniforms.normal, object.transform.normal_matrix());
        ctx.draw_mesh(mesh);
        stats.draw_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{cube, quad, GfxCommand, RecordingContext};
    use crate::scene::DrawableObject;

    struct Fixture {
        assets: Assets,
        registry: ObjectRegistry,
        red: Handle<Material>,
        holdout: Handle<ShaderProgram>,
    }

    fn fixture() -> Fixture {
        let mut assets = Assets::new();
        let lit = assets.add_program(ShaderProgram::lit());
        let holdout = assets.add_program(ShaderProgram::portal_holdout());
        let red = assets.add_material(Material::rgb("red", lit, 255, 0, 0));
        let blue = assets.add_material(Material::rgb("blue", lit, 0, 0, 255));
        let cube = assets.add_mesh(cube());
        let quad = assets.add_mesh(quad());

        let mut registry = ObjectRegistry::new();
        for (name, mesh, material) in [
            ("a", cube, red),
            ("b", quad, red),
            ("c", cube, blue),
            ("d", cube, red),
        ] {
            registry
                .add(DrawableObject::new(name, mesh, material), &assets)
                .unwrap();
        }
        Fixture {
            assets,
            registry,
            red,
            holdout,
        }
    }

    #[test]
    fn grouped_pass_changes_state_once_per_group() {
        let f = fixture();
        let mut ctx = RecordingContext::from_assets(&f.assets);
        let stats = draw_opaque(&mut ctx, &f.assets, &f.registry, None).unwrap();

        assert_eq!(stats.programs_bound, 1);
        assert_eq!(stats.materials_applied, 2);
        assert_eq!(stats.meshes_bound, 3);
        assert_eq!(stats.draw_calls, 4);
        assert_eq!(ctx.count(|c| matches!(c, GfxCommand::BindMesh(_))), 3);
        assert_eq!(ctx.count(|c| matches!(c, GfxCommand::SetUniformMat3 { .. })), 4);
    }

    #[test]
    fn grouped_pass_leaves_blended_materials_to_transparent_pass() {
        let mut f = fixture();
        let lit = f.assets.program_of(f.red).unwrap();
        let glass = f
            .assets
            .add_material(Material::rgb("glass", lit, 200, 200, 255).with_alpha());
        let cube = Handle::new(0);
        f.registry
            .add(DrawableObject::new("pane", cube, glass), &f.assets)
            .unwrap();

        let mut ctx = RecordingContext::from_assets(&f.assets);
        let stats = draw_opaque(&mut ctx, &f.assets, &f.registry, None).unwrap();

        assert_eq!(stats.materials_applied, 2);
        assert_eq!(stats.draw_calls, 4);
        assert_eq!(
            ctx.count(|c| matches!(c, GfxCommand::ApplyMaterial { material, .. } if *material == glass)),
            0
        );

        let stats = draw_opaque(&mut ctx, &f.assets, &f.registry, Some(f.red)).unwrap();
        assert_eq!(stats.draw_calls, 5);
    }

    #[test]
    fn override_pass_uses_one_material() {
        let f = fixture();
        let mut ctx = RecordingContext::from_assets(&f.assets);
        let stats = draw_opaque(&mut ctx, &f.assets, &f.registry, Some(f.red)).unwrap();

        assert_eq!(stats.programs_bound, 1);
        assert_eq!(stats.materials_applied, 1);
        assert_eq!(stats.meshes_bound, 2);
        assert_eq!(stats.draw_calls, 4);
        assert!(ctx.commands().iter().all(|c| match c {
            GfxCommand::ApplyMaterial { material, .. } => *material == f.red,
            _ => true,
        }));
    }

    #[test]
    fn missing_normal_matrix_is_reported() {
        let mut f = fixture();
        let unlit = f
            .assets
            .add_material(Material::rgb("holdout", f.holdout, 0, 0, 0));
        let mut ctx = RecordingContext::from_assets(&f.assets);

        let err = draw_opaque(&mut ctx, &f.assets, &f.registry, Some(unlit)).unwrap_err();
        assert_eq!(
            err,
            RenderError::MissingUniform {
                program: f.holdout,
                name: MODEL_NORMAL_MATRIX,
            }
        );
        assert_eq!(ctx.draw_calls(), 0);
    }

    #[test]
    fn unknown_override_material_is_reported() {
        let f = fixture();
        let mut ctx = RecordingContext::from_assets(&f.assets);
        let missing = Handle::new(42);
        assert_eq!(
            draw_opaque(&mut ctx, &f.assets, &f.registry, Some(missing)),
            Err(RenderError::UnknownMaterial(missing))
        );
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn no_transparent_pass_draws_nothing() {
        let f = fixture();
        let mut ctx = RecordingContext::from_assets(&f.assets);
        let stats = NoTransparentPass
            .draw_transparent(&mut ctx, &f.assets, &f.registry)
            .unwrap();
        assert_eq!(stats, DrawStats::default());
        assert!(ctx.commands().is_empty());
    }
}
