mod demo_scenes;

use demo_scenes::DemoScene;
use log::{error, info, warn};
use portal_scene::renderer::{GpuRenderer, RecordingContext};
use portal_scene::RenderSettings;

const ACTIVE_SCENE: DemoScene = DemoScene::Recursive { depth: 3 };

fn main() {
    portal_scene::init_logging();

    let settings = RenderSettings::load();
    let scene = ACTIVE_SCENE.build(&settings);

    let mut ctx = RecordingContext::from_assets(&scene.assets);
    match scene.draw_scene(&mut ctx, settings.draw_portals) {
        Ok(stats) => info!("Recorded frame: {:?}", stats),
        Err(err) => {
            error!("Frame recording failed: {}", err);
            return;
        }
    }
    let commands = ctx.take_commands();

    let mut gpu = match GpuRenderer::new_blocking(wgpu::TextureFormat::Rgba8UnormSrgb) {
        Ok(gpu) => gpu,
        Err(err) => {
            warn!("{}; recorded {} commands without submitting", err, commands.len());
            return;
        }
    };

    gpu.prepare(&scene.assets);
    let target = gpu.create_offscreen(settings.resolution.width, settings.resolution.height);
    match gpu.submit(&commands, &target.targets(settings.wgpu_clear_color())) {
        Ok(()) => info!(
            "Submitted {} commands to a {}x{} target using {} pipelines",
            commands.len(),
            target.width,
            target.height,
            gpu.pipeline_count()
        ),
        Err(err) => error!("Frame submission failed: {}", err),
    }
}
