use glam::{Quat, Vec3};
use log::info;
use portal_scene::asset::Assets;
use portal_scene::renderer::{cube, quad, Material, ShaderProgram};
use portal_scene::scene::{Camera, DrawableObject, Portal, Scene, Transform};
use portal_scene::RenderSettings;

#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum DemoScene {
    /// One doorway into a second room far along +X.
    Doorway,
    /// A portal whose exit sits behind the viewer, so it shows itself nested.
    Recursive { depth: u32 },
}

impl DemoScene {
    pub fn build(self, settings: &RenderSettings) -> Scene {
        let mut assets = Assets::new();
        let lit = assets.add_program(ShaderProgram::lit());
        let red = assets.add_material(Material::rgb("Red", lit, 200, 40, 40));
        let green = assets.add_material(Material::rgb("Green", lit, 40, 180, 60).with_roughness(0.3).with_emissive(0.4));
        let grey = assets.add_material(Material::rgb("Grey", lit, 120, 120, 120));
        let cube = assets.add_mesh(cube());
        let quad = assets.add_mesh(quad());

        let mut scene = Scene::with_settings(assets, settings);
        scene.set_camera(Camera::looking_at(
            Vec3::new(0.0, 0.5, 4.0),
            Vec3::new(0.0, 0.5, 0.0),
            settings.aspect_ratio(),
        ));

        let mut add = |name: &str, material, transform| {
            let object = DrawableObject::new(name, cube, material).with_transform(transform);
            if let Err(err) = scene.add_object(object) {
                log::warn!("Demo object skipped: {}", err);
            }
        };

        let floor = Transform::from_trs(Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY, Vec3::new(8.0, 0.1, 8.0));
        add("floor", grey, floor);
        add("pillar_left", red, Transform::from_translation(Vec3::new(-2.0, 0.0, -1.0)));
        add("pillar_right", red, Transform::from_translation(Vec3::new(2.0, 0.0, -1.0)));

        let aperture = Transform::from_trs(Vec3::new(0.0, 0.5, -2.0), Quat::IDENTITY, Vec3::new(1.5, 2.5, 1.0));
        match self {
            DemoScene::Doorway => {
                let far_floor = Transform::from_trs(
                    Vec3::new(40.0, -1.0, -4.0),
                    Quat::IDENTITY,
                    Vec3::new(8.0, 0.1, 8.0),
                );
                add("far_floor", grey, far_floor);
                add("far_marker", green, Transform::from_translation(Vec3::new(40.0, 0.0, -6.0)));

                let exit = Transform {
                    translation: Vec3::new(40.0, 0.5, -2.0),
                    ..aperture
                };
                scene.add_portal(Portal::new("doorway", quad, aperture, exit));
            }
            DemoScene::Recursive { depth } => {
                add("marker", green, Transform::from_translation(Vec3::new(0.0, 0.0, -4.0)));

                let exit = Transform {
                    translation: Vec3::new(0.0, 0.5, 3.0),
                    ..aperture
                };
                scene.add_portal(Portal::new("loop", quad, aperture, exit));
                scene.set_max_portal_depth(depth);
            }
        }

        info!(
            "Built {:?}: {} objects, {} portals, depth {}",
            self,
            scene.registry().len(),
            scene.portals().len(),
            scene.max_portal_depth()
        );
        scene
    }
}
