pub mod manager;
pub mod material;
pub mod mesh;
pub mod texture;

pub use manager::{AssetLoader, AssetResolver, LoadError};
pub use mesh::ColladaModelLoader;
pub use texture::{CompositeTexture, ImageFileLoader, TextureCategory, TextureCompositor};
