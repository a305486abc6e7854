use super::texture::CompositeTexture;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalMapType {
    /// The only space the model exporters produce
    TangentSpace,
}

/// Surface description of a mesh node.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Color map. Shared, since one composite is usually applied to several meshes.
    pub map: Option<Arc<CompositeTexture>>,
    /// Set whenever `map` changes so the renderer re-uploads it
    pub needs_update: bool,
    pub transparent: bool,
    pub shininess: f32,
    pub side: Side,
    pub normal_map_type: NormalMapType,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            map: None,
            needs_update: false,
            transparent: false,
            shininess: 30.0,
            side: Side::Front,
            normal_map_type: NormalMapType::TangentSpace,
        }
    }

    pub fn set_map(&mut self, texture: Arc<CompositeTexture>) {
        self.map = Some(texture);
        self.needs_update = true;
    }
}
