// renderer/material.rs
use crate::asset::Handle;
use crate::renderer::ShaderProgram;
use bytemuck::{Pod, Zeroable};

/// Fixed uniform parameters applied to every mesh drawn with this material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub label: String,
    pub program: Handle<ShaderProgram>,
    pub base_color: [u8; 4],
    pub flags: MaterialFlags,

    // Stored as u8, converted to f32 when uploaded
    pub metallic_factor: u8,
    pub roughness_factor: u8,
    pub emissive_strength: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialFlags(u32);

impl MaterialFlags {
    pub const NONE: Self = Self(0);
    pub const UNLIT: Self = Self(1 << 0);
    pub const ALPHA_BLEND: Self = Self(1 << 1);

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for MaterialFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for MaterialFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Material {
    pub fn new(label: impl Into<String>, program: Handle<ShaderProgram>, color: [u8; 4]) -> Self {
        Self {
            label: label.into(),
            program,
            base_color: color,
            flags: MaterialFlags::NONE,
            metallic_factor: 0,
            roughness_factor: 255, // Default to rough
            emissive_strength: 0,
        }
    }

    pub fn rgb(label: impl Into<String>, program: Handle<ShaderProgram>, r: u8, g: u8, b: u8) -> Self {
        Self::new(label, program, [r, g, b, 255])
    }

    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic_factor = (metallic.clamp(0.0, 1.0) * 255.0) as u8;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness_factor = (roughness.clamp(0.0, 1.0) * 255.0) as u8;
        self
    }

    pub fn with_emissive(mut self, strength: f32) -> Self {
        self.emissive_strength = (strength.clamp(0.0, 1.0) * 255.0) as u8;
        self
    }

    pub fn with_alpha(mut self) -> Self {
        self.flags |= MaterialFlags::ALPHA_BLEND;
        self
    }

    pub fn with_unlit(mut self) -> Self {
        self.flags |= MaterialFlags::UNLIT;
        self
    }

    pub fn color_f32(&self) -> [f32; 4] {
        [
            self.base_color[0] as f32 / 255.0,
            self.base_color[1] as f32 / 255.0,
            self.base_color[2] as f32 / 255.0,
            self.base_color[3] as f32 / 255.0,
        ]
    }

    pub fn metallic_f32(&self) -> f32 {
        self.metallic_factor as f32 / 255.0
    }

    pub fn roughness_f32(&self) -> f32 {
        self.roughness_factor as f32 / 255.0
    }

    pub fn emissive_f32(&self) -> f32 {
        self.emissive_strength as f32 / 255.0
    }

    /// Alpha-blended materials belong to the transparent pass.
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(MaterialFlags::ALPHA_BLEND)
    }

    pub fn data(&self) -> MaterialData {
        MaterialData::from_material(self)
    }
}

/// Uniform block layout of a material, as seen by shaders.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct MaterialData {
    pub color: [f32; 4],        // 16 bytes
    pub material_flags: u32,    // 4 bytes
    pub metallic_factor: f32,   // 4 bytes
    pub roughness_factor: f32,  // 4 bytes
    pub emissive_strength: f32, // 4 bytes
}

impl MaterialData {
    pub fn from_material(material: &Material) -> Self {
        Self {
            color: material.color_f32(),
            material_flags: material.flags.bits(),
            metallic_factor: material.metallic_f32(),
            roughness_factor: material.roughness_f32(),
            emissive_strength: material.emissive_f32(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_data_is_32_bytes() {
        assert_eq!(std::mem::size_of::<MaterialData>(), 32);
    }

    #[test]
    fn material_data_pbr_factors() {
        let material = Material::new("m", Handle::new(0), [255, 255, 255, 255])
            .with_metallic(0.75)
            .with_roughness(0.25)
            .with_emissive(0.5)
            .with_unlit();

        assert_eq!(material.metallic_factor, 191);
        assert_eq!(material.roughness_factor, 63);

        let gpu = material.data();

        assert!((gpu.metallic_factor - 0.75).abs() < 0.01);
        assert!((gpu.roughness_factor - 0.25).abs() < 0.01);
        assert!((gpu.emissive_strength - 0.5).abs() < 0.01);
        assert_eq!(gpu.material_flags & MaterialFlags::UNLIT.bits(), 1);
        assert_eq!(gpu.material_flags & MaterialFlags::ALPHA_BLEND.bits(), 0);
    }

    #[test]
    fn alpha_materials_are_transparent() {
        let program = Handle::new(3);
        assert!(!Material::rgb("opaque", program, 1, 2, 3).is_transparent());
        assert!(Material::rgb("glass", program, 1, 2, 3)
            .with_alpha()
            .is_transparent());
    }
}
