use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Deepest portal nesting an 8-bit stencil buffer can address.
pub const MAX_STENCIL_DEPTH: u32 = 255;
/// Background behind the scene and inside every portal aperture.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.12, 1.0];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "RenderSettings::default_draw_portals")]
    pub draw_portals: bool,
    #[serde(default = "RenderSettings::default_max_portal_depth")]
    pub max_portal_depth: u32,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "RenderSettings::default_clear_color")]
    pub clear_color: [f32; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            draw_portals: Self::default_draw_portals(),
            max_portal_depth: Self::default_max_portal_depth(),
            resolution: Resolution::default(),
            clear_color: Self::default_clear_color(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    /// Parses and validates settings; missing fields take their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RenderSettings>(contents).map(RenderSettings::validate)
    }

    fn validate(mut self) -> Self {
        if self.max_portal_depth == 0 {
            warn!("Portal depth must be at least 1. Using 1 instead.");
            self.max_portal_depth = 1;
        } else if self.max_portal_depth > MAX_STENCIL_DEPTH {
            warn!(
                "Portal depth {} exceeds the stencil range. Clamping to {}.",
                self.max_portal_depth, MAX_STENCIL_DEPTH
            );
            self.max_portal_depth = MAX_STENCIL_DEPTH;
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if self.clear_color.iter().any(|c| !c.is_finite()) {
            warn!("Clear color must be finite. Using default clear color.");
            self.clear_color = Self::default_clear_color();
        }

        self
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.resolution.width as f32 / self.resolution.height as f32
    }

    pub fn wgpu_clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }

    const fn default_draw_portals() -> bool {
        true
    }

    const fn default_max_portal_depth() -> u32 {
        1
    }

    const fn default_clear_color() -> [f32; 4] {
        DEFAULT_CLEAR_COLOR
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_settings() -> RenderSettings {
        RenderSettings {
            draw_portals: false,
            max_portal_depth: 0,
            resolution: Resolution {
                width: 0,
                height: 0,
            },
            clear_color: [f32::NAN, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let validated = invalid_settings().validate();

        assert_eq!(validated.max_portal_depth, 1);
        assert!(!validated.draw_portals);
        assert_eq!(validated.resolution.width, Resolution::default().width);
        assert_eq!(validated.resolution.height, Resolution::default().height);
        assert_eq!(
            validated.clear_color,
            RenderSettings::default().clear_color
        );
    }

    #[test]
    fn validate_clamps_portal_depth_to_stencil_range() {
        let deep = RenderSettings {
            max_portal_depth: 1000,
            ..RenderSettings::default()
        };
        assert_eq!(deep.validate().max_portal_depth, MAX_STENCIL_DEPTH);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = RenderSettings {
            draw_portals: false,
            max_portal_depth: 4,
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            clear_color: [0.0, 0.5, 1.0, 1.0],
        };

        let validated = valid.clone().validate();

        assert_eq!(validated.draw_portals, valid.draw_portals);
        assert_eq!(validated.max_portal_depth, valid.max_portal_depth);
        assert_eq!(validated.resolution.width, valid.resolution.width);
        assert_eq!(validated.resolution.height, valid.resolution.height);
        assert_eq!(validated.clear_color, valid.clear_color);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings = RenderSettings::from_json(r#"{ "max_portal_depth": 3 }"#).unwrap();
        assert!(settings.draw_portals);
        assert_eq!(settings.max_portal_depth, 3);
        assert_eq!(settings.resolution.width, 1280);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(RenderSettings::from_json("{ draw_portals: yes").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = RenderSettings::load_from_path("does/not/exist/settings.json");
        assert_eq!(settings.max_portal_depth, 1);
        assert!(settings.draw_portals);
    }
}
