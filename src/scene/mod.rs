// scene/mod.rs

pub mod camera;
pub mod error;
pub mod object;
pub mod portal;
pub mod registry;
pub mod render_key;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use camera::Camera;
pub use error::{AddError, SceneError};
pub use object::{DrawableObject, ObjectId};
pub use portal::Portal;
pub use registry::ObjectRegistry;
pub use render_key::{RenderGroupIndex, RenderKey};
pub use scene::Scene;
pub use transform::Transform;
