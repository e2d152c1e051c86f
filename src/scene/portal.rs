use glam::{Mat4, Vec4};

use crate::asset::{Handle, Mesh};
use crate::scene::Transform;

/// A window from `transform` (the source surface) to `target`.
///
/// Both transforms face the direction of travel: a viewer looking along the
/// source's forward sees what lies along the target's forward.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    pub label: String,
    pub mesh: Handle<Mesh>,
    pub transform: Transform,
    pub target: Transform,
    /// Maps world space at the source onto world space at the target.
    pub offset: Mat4,
}

impl Portal {
    pub fn new(
        label: impl Into<String>,
        mesh: Handle<Mesh>,
        source: Transform,
        target: Transform,
    ) -> Self {
        let offset = target.matrix() * source.matrix().inverse();
        Self::with_offset(label, mesh, source, target, offset)
    }

    pub fn with_offset(
        label: impl Into<String>,
        mesh: Handle<Mesh>,
        source: Transform,
        target: Transform,
        offset: Mat4,
    ) -> Self {
        Self {
            label: label.into(),
            mesh,
            transform: source,
            target,
            offset,
        }
    }

    /// View matrix of the viewer carried through the portal.
    pub fn secondary_view(&self, viewer_view: Mat4) -> Mat4 {
        (self.offset * viewer_view.inverse()).inverse()
    }

    /// Target surface plane in world space, normal along the target's forward.
    pub fn world_clip_plane(&self) -> Vec4 {
        let f = self.target.forward();
        f.extend(-f.dot(self.target.position()))
    }

    /// Target surface plane in the space of `view`.
    pub fn clip_plane(&self, view: Mat4) -> Vec4 {
        view.inverse().transpose() * self.world_clip_plane()
    }
}
