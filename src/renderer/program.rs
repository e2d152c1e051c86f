use std::borrow::Cow;

use crate::settings::DEFAULT_CLEAR_COLOR;

/// Per-instance model matrix uniform.
pub const MODEL_MATRIX: &str = "modelMatrix";
/// Per-instance normal matrix uniform (inverse transpose of the model's upper 3x3).
pub const MODEL_NORMAL_MATRIX: &str = "modelNormalMatrix";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Draws bound mesh geometry.
    Mesh,
    /// Draws a four-vertex strip covering the viewport; no mesh is bound.
    FullscreenQuad,
}

/// A compiled shader pipeline unit as seen by the scene: its source, how it
/// rasterizes and which named uniforms it exposes.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub label: String,
    pub source: Cow<'static, str>,
    pub kind: ProgramKind,
    pub double_sided: bool,
    uniforms: Vec<&'static str>,
}

impl ShaderProgram {
    pub fn new(label: impl Into<String>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            kind: ProgramKind::Mesh,
            double_sided: false,
            uniforms: Vec::new(),
        }
    }

    /// Standard lit mesh program exposing both per-instance matrices.
    pub fn lit() -> Self {
        Self::new("Lit", include_str!("../shader/mesh.wgsl"))
            .with_uniform(MODEL_MATRIX)
            .with_uniform(MODEL_NORMAL_MATRIX)
    }

    /// Depth-and-stencil-only program used to draw portal apertures.
    pub fn portal_holdout() -> Self {
        Self::new("PortalHoldout", include_str!("../shader/portal_holdout.wgsl"))
            .with_uniform(MODEL_MATRIX)
            .double_sided()
    }

    /// Full-screen pass that writes the far plane into the depth buffer.
    pub fn depth_reset() -> Self {
        Self::depth_reset_with_background(DEFAULT_CLEAR_COLOR)
    }

    /// Depth reset that paints `background` into the aperture; pass the
    /// frame clear color so portal views match the primary view.
    pub fn depth_reset_with_background(background: [f32; 4]) -> Self {
        let [r, g, b, a] = background;
        let source = include_str!("../shader/depth_reset.wgsl")
            .replace("BACKGROUND_RGBA", &format!("{r:.6}, {g:.6}, {b:.6}, {a:.6}"));
        Self::new("DepthReset", source)
            .with_kind(ProgramKind::FullscreenQuad)
            .double_sided()
    }

    pub fn with_uniform(mut self, name: &'static str) -> Self {
        if !self.uniforms.contains(&name) {
            self.uniforms.push(name);
        }
        self
    }

    pub fn with_kind(mut self, kind: ProgramKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    pub fn uniforms(&self) -> &[&'static str] {
        &self.uniforms
    }

    /// Slot of a declared uniform, in declaration order.
    pub fn uniform_slot(&self, name: &str) -> Option<u32> {
        self.uniforms
            .iter()
            .position(|u| *u == name)
            .map(|slot| slot as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_programs_declare_expected_uniforms() {
        let lit = ShaderProgram::lit();
        assert_eq!(lit.uniform_slot(MODEL_MATRIX), Some(0));
        assert_eq!(lit.uniform_slot(MODEL_NORMAL_MATRIX), Some(1));

        let holdout = ShaderProgram::portal_holdout();
        assert_eq!(holdout.uniform_slot(MODEL_MATRIX), Some(0));
        assert_eq!(holdout.uniform_slot(MODEL_NORMAL_MATRIX), None);

        let reset = ShaderProgram::depth_reset();
        assert_eq!(reset.kind, ProgramKind::FullscreenQuad);
        assert!(reset.uniforms().is_empty());
    }

    #[test]
    fn depth_reset_paints_the_given_background() {
        let reset = ShaderProgram::depth_reset_with_background([0.25, 0.5, 0.75, 1.0]);
        assert!(reset
            .source
            .contains("vec4<f32>(0.250000, 0.500000, 0.750000, 1.000000)"));
        assert!(!reset.source.contains("BACKGROUND_RGBA"));

        let default = ShaderProgram::depth_reset();
        assert!(default
            .source
            .contains("vec4<f32>(0.100000, 0.100000, 0.120000, 1.000000)"));
    }

    #[test]
    fn declaring_a_uniform_twice_keeps_one_slot() {
        let program = ShaderProgram::new("p", "")
            .with_uniform(MODEL_MATRIX)
            .with_uniform(MODEL_MATRIX);
        assert_eq!(program.uniforms(), &[MODEL_MATRIX]);
    }
}
