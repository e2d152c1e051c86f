use portal_scene::settings::{RenderSettings, MAX_STENCIL_DEPTH};

fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("portal_scene_{}_{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let settings = RenderSettings::load_from_path("/definitely/not/here/settings.json");
    assert!(settings.draw_portals);
    assert_eq!(settings.max_portal_depth, 1);
    assert_eq!(settings.resolution.width, 1280);
    assert_eq!(settings.resolution.height, 720);
}

#[test]
fn file_values_are_loaded_and_validated() {
    let path = temp_file(
        "valid.json",
        r#"{ "draw_portals": false, "max_portal_depth": 1000, "resolution": { "width": 640, "height": 0 } }"#,
    );
    let settings = RenderSettings::load_from_path(&path);
    std::fs::remove_file(&path).ok();

    assert!(!settings.draw_portals);
    assert_eq!(settings.max_portal_depth, MAX_STENCIL_DEPTH);
    assert_eq!(settings.resolution.width, 1280);
    assert_eq!(settings.resolution.height, 720);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let path = temp_file("broken.json", "{ draw_portals: nope");
    let settings = RenderSettings::load_from_path(&path);
    std::fs::remove_file(&path).ok();

    assert!(settings.draw_portals);
    assert_eq!(settings.max_portal_depth, 1);
}
