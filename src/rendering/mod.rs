pub mod animation;
pub mod light;
pub mod scene;
pub mod surface;

pub use surface::{HeadlessSurface, RenderSurface};
