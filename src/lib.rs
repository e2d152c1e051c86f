pub mod asset;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use settings::RenderSettings;

/// Installs `env_logger`, defaulting to `Info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
