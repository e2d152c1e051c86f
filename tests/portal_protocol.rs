//! Stencil protocol of a full frame, observed through the recording context.

use glam::Vec3;
use portal_scene::asset::Assets;
use portal_scene::renderer::{
    cube, quad, CompareFunction, GfxCommand, Material, RasterState, RecordingContext,
    RenderError, ShaderProgram, StencilOperation, STENCIL_ALL,
};
use portal_scene::scene::{DrawableObject, Portal, Scene, Transform};

fn portal_scene() -> Scene {
    let mut assets = Assets::new();
    let lit = assets.add_program(ShaderProgram::lit());
    let grey = assets.add_material(Material::rgb("grey", lit, 128, 128, 128));
    let cube = assets.add_mesh(cube());
    let quad = assets.add_mesh(quad());

    let mut scene = Scene::new(assets);
    scene
        .add_object(DrawableObject::new("near", cube, grey))
        .unwrap();
    scene
        .add_object(
            DrawableObject::new("far", cube, grey)
                .with_transform(Transform::from_translation(Vec3::new(20.0, 0.0, -5.0))),
        )
        .unwrap();
    scene.add_portal(Portal::new(
        "door",
        quad,
        Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
        Transform::from_translation(Vec3::new(20.0, 0.0, -2.0)),
    ));
    scene
}

fn position(commands: &[GfxCommand], from: usize, wanted: &GfxCommand) -> usize {
    from + commands[from..]
        .iter()
        .position(|c| c == wanted)
        .unwrap_or_else(|| panic!("{:?} not found after {}", wanted, from))
}

#[test]
fn single_portal_follows_stencil_protocol() {
    let scene = portal_scene();
    let mut ctx = RecordingContext::from_assets(&scene.assets);
    let stats = scene.draw_scene(&mut ctx, true).unwrap();
    assert_eq!(stats.portals, 1);

    let commands = ctx.commands();
    let enabled = position(commands, 0, &GfxCommand::SetStencilTest(true));
    let cleared = position(commands, enabled, &GfxCommand::ClearStencil);
    let written = position(
        commands,
        cleared,
        &GfxCommand::StencilOp {
            stencil_fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::Replace,
        },
    );
    let restricted = position(
        commands,
        written,
        &GfxCommand::StencilFunc {
            compare: CompareFunction::Equal,
            reference: 1,
            read_mask: STENCIL_ALL,
        },
    );
    position(commands, restricted, &GfxCommand::SetStencilTest(false));

    assert_eq!(ctx.count(|c| *c == GfxCommand::SetStencilTest(true)), 1);
    assert_eq!(ctx.count(|c| *c == GfxCommand::SetStencilTest(false)), 1);
    assert_eq!(ctx.count(|c| *c == GfxCommand::ColorMask(false)), 2);
    assert_eq!(ctx.count(|c| *c == GfxCommand::ColorMask(true)), 2);

    // Color goes off before it comes back on, twice.
    let toggles: Vec<bool> = commands
        .iter()
        .filter_map(|c| match c {
            GfxCommand::ColorMask(on) => Some(*on),
            _ => None,
        })
        .collect();
    assert_eq!(toggles, vec![false, true, false, true]);

    assert_eq!(*ctx.state(), RasterState::default());
}

#[test]
fn secondary_scene_draws_inside_the_stencil() {
    let scene = portal_scene();
    let mut ctx = RecordingContext::from_assets(&scene.assets);
    let stats = scene.draw_scene(&mut ctx, true).unwrap();

    // Both objects drawn from the camera and again through the portal.
    assert_eq!(stats.draw_calls, 4);
    assert_eq!(ctx.count(|c| *c == GfxCommand::DrawScreenQuad), 1);
    // Portal surface drawn for the mask and for the depth restore.
    let holdout = scene.portal_programs().holdout;
    assert_eq!(ctx.count(|c| *c == GfxCommand::UseProgram(holdout)), 2);
}

#[test]
fn nested_portal_restricts_to_parent_and_increments() {
    let mut scene = portal_scene();
    scene.set_max_portal_depth(2);

    let mut ctx = RecordingContext::from_assets(&scene.assets);
    let stats = scene.draw_scene(&mut ctx, true).unwrap();
    assert_eq!(stats.portals, 2);

    let commands = ctx.commands();
    let increment = GfxCommand::StencilOp {
        stencil_fail: StencilOperation::Keep,
        depth_fail: StencilOperation::Keep,
        pass: StencilOperation::IncrementClamp,
    };
    let inc = position(commands, 0, &increment);
    let parent = GfxCommand::StencilFunc {
        compare: CompareFunction::Equal,
        reference: 1,
        read_mask: STENCIL_ALL,
    };
    assert!(commands[..inc].contains(&parent));

    let inner = position(
        commands,
        inc,
        &GfxCommand::StencilFunc {
            compare: CompareFunction::Equal,
            reference: 2,
            read_mask: STENCIL_ALL,
        },
    );
    position(
        commands,
        inner,
        &GfxCommand::StencilOp {
            stencil_fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::DecrementClamp,
        },
    );

    // Only the outermost portal toggles the stencil test.
    assert_eq!(ctx.count(|c| *c == GfxCommand::SetStencilTest(true)), 1);
    assert_eq!(*ctx.state(), RasterState::default());
}

#[test]
fn depth_limit_bounds_self_visible_recursion() {
    let mut scene = portal_scene();
    scene.set_max_portal_depth(4);

    let mut ctx = RecordingContext::from_assets(&scene.assets);
    let stats = scene.draw_scene(&mut ctx, true).unwrap();

    assert_eq!(stats.portals, 4);
    assert_eq!(ctx.count(|c| *c == GfxCommand::DrawScreenQuad), 4);
    assert_eq!(*ctx.state(), RasterState::default());
}

#[test]
fn holdout_without_model_uniform_fails_before_drawing() {
    let mut assets = Assets::new();
    let lit = assets.add_program(ShaderProgram::lit());
    let grey = assets.add_material(Material::rgb("grey", lit, 128, 128, 128));
    let quad_mesh = assets.add_mesh(quad());

    let mut scene = Scene::new(assets);
    scene
        .add_object(DrawableObject::new("wall", quad_mesh, grey))
        .unwrap();
    scene.add_portal(Portal::new(
        "door",
        quad_mesh,
        Transform::default(),
        Transform::from_translation(Vec3::X * 5.0),
    ));

    // A context that knows the holdout program but none of its uniforms.
    let mut ctx = RecordingContext::new();
    ctx.register_program(lit, &ShaderProgram::lit());
    let holdout = scene.portal_programs().holdout;
    ctx.register_program(holdout, &ShaderProgram::new("bare", ""));

    let err = scene.draw_scene(&mut ctx, true).unwrap_err();
    assert!(matches!(err, RenderError::MissingUniform { program, .. } if program == holdout));
    assert_eq!(ctx.count(|c| *c == GfxCommand::SetStencilTest(true)), 0);
}
