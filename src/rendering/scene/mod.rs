pub mod graph;

pub use graph::SceneGraph;

use crate::assets::material::Material;
use crate::rendering::animation::{AnimationClip, AnimationMixer};
use crate::utils::Vector3;
use crate::world::avatar::TextureRegion;

/// Handle to a node inside one [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Plain container
    Group,
    Mesh,
    /// Mesh deformed by a bone rig
    SkinnedMesh,
    Bone,
}

impl NodeKind {
    pub fn is_mesh(&self) -> bool {
        matches!(self, NodeKind::Mesh | NodeKind::SkinnedMesh)
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    name: String,
    region: Option<TextureRegion>,
    pub kind: NodeKind,
    pub visible: bool,
    pub scale: Vector3,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub material: Option<Material>,
    /// Name of the asset this node was loaded from (set on model roots)
    pub source_asset: Option<String>,
    pub animations: Vec<AnimationClip>,
    /// Created on the first `set_animation`
    pub mixer: Option<AnimationMixer>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let name = name.into();
        Self {
            region: TextureRegion::from_node_name(&name),
            name,
            kind,
            visible: true,
            scale: Vector3::one(),
            cast_shadow: false,
            receive_shadow: false,
            material: None,
            source_asset: None,
            animations: Vec::new(),
            mixer: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_animations(mut self, animations: Vec<AnimationClip>) -> Self {
        self.animations = animations;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node; its texture region is re-resolved from the new name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.region = TextureRegion::from_node_name(&self.name);
    }

    pub fn region(&self) -> Option<TextureRegion> {
        self.region
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
