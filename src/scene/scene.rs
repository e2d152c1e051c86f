// scene/scene.rs
use crate::asset::{Assets, Handle};
use crate::renderer::{
    draw_opaque, DrawStats, GraphicsContext, Material, NoTransparentPass, PortalPrograms,
    PortalRenderer, RenderError, TransparentPass,
};
use crate::scene::{
    AddError, Camera, DrawableObject, ObjectId, ObjectRegistry, Portal, SceneError, Transform,
};
use crate::settings::{RenderSettings, MAX_STENCIL_DEPTH};

/// Frame driver: owns the objects, portals and camera of one scene and draws
/// them through a [`GraphicsContext`].
pub struct Scene {
    pub assets: Assets,
    registry: ObjectRegistry,
    portals: Vec<Portal>,
    camera: Camera,
    programs: PortalPrograms,
    transparent: Box<dyn TransparentPass>,
    max_portal_depth: u32,
}

impl Scene {
    /// Takes ownership of `assets` and adds the portal helper programs to it.
    pub fn new(mut assets: Assets) -> Self {
        let programs = PortalPrograms::register(&mut assets);
        Self::with_programs(assets, programs)
    }

    /// Like [`Scene::new`], with portal apertures painted in the configured
    /// clear color.
    pub fn with_settings(mut assets: Assets, settings: &RenderSettings) -> Self {
        let programs = PortalPrograms::register_with_background(&mut assets, settings.clear_color);
        let mut scene = Self::with_programs(assets, programs);
        scene.camera.aspect = settings.aspect_ratio();
        scene.set_max_portal_depth(settings.max_portal_depth);
        scene
    }

    fn with_programs(assets: Assets, programs: PortalPrograms) -> Self {
        Self {
            assets,
            registry: ObjectRegistry::new(),
            portals: Vec::new(),
            camera: Camera::default(),
            programs,
            transparent: Box::new(NoTransparentPass),
            max_portal_depth: 1,
        }
    }

    pub fn add_object(&mut self, object: DrawableObject) -> Result<ObjectId, AddError> {
        self.registry.add(object, &self.assets)
    }

    pub fn remove_object(&mut self, name: &str) -> Result<DrawableObject, SceneError> {
        self.registry.remove(name)
    }

    pub fn object(&self, name: &str) -> Option<&DrawableObject> {
        self.registry.get(name)
    }

    pub fn set_transform(&mut self, name: &str, transform: Transform) -> Result<(), SceneError> {
        self.registry.set_transform(name, transform)
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn add_portal(&mut self, portal: Portal) {
        log::debug!("Added portal '{}'", portal.label);
        self.portals.push(portal);
    }

    pub fn remove_portal(&mut self, label: &str) -> Result<Portal, SceneError> {
        let pos = self
            .portals
            .iter()
            .position(|p| p.label == label)
            .ok_or_else(|| SceneError::PortalNotFound(label.to_string()))?;
        Ok(self.portals.remove(pos))
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn portal_programs(&self) -> PortalPrograms {
        self.programs
    }

    pub fn max_portal_depth(&self) -> u32 {
        self.max_portal_depth
    }

    pub fn set_max_portal_depth(&mut self, depth: u32) {
        self.max_portal_depth = depth.clamp(1, MAX_STENCIL_DEPTH);
    }

    pub fn set_transparent_pass(&mut self, pass: Box<dyn TransparentPass>) {
        self.transparent = pass;
    }

    /// Opaque pass from whatever view is currently in the view buffer.
    pub fn draw_opaque(
        &self,
        ctx: &mut dyn GraphicsContext,
        override_material: Option<Handle<Material>>,
    ) -> Result<DrawStats, RenderError> {
        draw_opaque(ctx, &self.assets, &self.registry, override_material)
    }

    /// Draws one frame: opaque geometry, then every portal, then the
    /// transparent pass from the primary camera.
    pub fn draw_scene(
        &self,
        ctx: &mut dyn GraphicsContext,
        draw_portals: bool,
    ) -> Result<DrawStats, RenderError> {
        self.camera.activate(ctx);
        let mut stats = self.draw_opaque(ctx, None)?;

        if draw_portals {
            let portals = PortalRenderer {
                assets: &self.assets,
                registry: &self.registry,
                portals: &self.portals,
                camera: &self.camera,
                programs: self.programs,
                transparent: self.transparent.as_ref(),
                max_depth: self.max_portal_depth,
            };
            stats += portals.render_all(ctx)?;
        }

        self.camera.activate(ctx);
        stats += self
            .transparent
            .draw_transparent(ctx, &self.assets, &self.registry)?;

        log::trace!("Frame: {:?}", stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{cube, quad, GfxCommand, RecordingContext, ShaderProgram};
    use glam::Vec3;

    fn scene() -> Scene {
        let mut assets = Assets::new();
        let lit = assets.add_program(ShaderProgram::lit());
        let grey = assets.add_material(Material::rgb("grey", lit, 128, 128, 128));
        let cube = assets.add_mesh(cube());
        assets.add_mesh(quad());

        let mut scene = Scene::new(assets);
        scene
            .add_object(DrawableObject::new("box", cube, grey))
            .unwrap();
        scene
    }

    #[test]
    fn frame_without_portals_activates_camera_twice() {
        let scene = scene();
        let mut ctx = RecordingContext::from_assets(&scene.assets);
        let stats = scene.draw_scene(&mut ctx, true).unwrap();

        assert_eq!(stats.portals, 0);
        assert_eq!(stats.draw_calls, 1);
        let expected = GfxCommand::WriteViewData(scene.camera().uniform());
        assert_eq!(ctx.commands().first(), Some(&expected));
        assert_eq!(ctx.commands().last(), Some(&expected));
    }

    #[test]
    fn disabled_portals_are_skipped() {
        let mut scene = scene();
        let quad = Handle::new(1);
        scene.add_portal(Portal::new(
            "door",
            quad,
            Transform::from_translation(Vec3::new(0.0, 0.0, -1.0)),
            Transform::from_translation(Vec3::new(5.0, 0.0, -1.0)),
        ));

        let mut ctx = RecordingContext::from_assets(&scene.assets);
        let stats = scene.draw_scene(&mut ctx, false).unwrap();
        assert_eq!(stats.portals, 0);
        assert_eq!(ctx.count(|c| *c == GfxCommand::SetStencilTest(true)), 0);

        let stats = scene.draw_scene(&mut ctx, true).unwrap();
        assert_eq!(stats.portals, 1);
    }

    #[test]
    fn portal_background_follows_clear_color() {
        let settings = RenderSettings {
            clear_color: [0.0, 0.5, 1.0, 1.0],
            ..Default::default()
        };
        let scene = Scene::with_settings(Assets::new(), &settings);
        let reset = scene
            .assets
            .programs
            .get(scene.portal_programs().depth_reset)
            .unwrap();
        assert!(reset
            .source
            .contains("vec4<f32>(0.000000, 0.500000, 1.000000, 1.000000)"));
    }

    #[test]
    fn removing_unknown_portal_is_an_error() {
        let mut scene = scene();
        assert_eq!(
            scene.remove_portal("nowhere"),
            Err(SceneError::PortalNotFound("nowhere".into()))
        );
    }
}
