//! Loading part meshes and mutating the avatar's node hierarchy.

use crate::assets::manager::{AssetLoader, AssetResolver, LoadError};
use crate::assets::material::{NormalMapType, Side};
use crate::assets::texture::CompositeTexture;
use crate::rendering::animation::{AnimationMixer, LoopMode};
use crate::rendering::scene::{NodeId, NodeKind, SceneGraph};
use crate::utils::Vector3;
use crate::world::avatar::{ModelSlot, TextureRegion};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// The rigged base model plus the parts grafted onto it.
#[derive(Debug)]
pub struct AvatarModel {
    pub graph: SceneGraph,
    parts: BTreeMap<ModelSlot, NodeId>,
}

impl AvatarModel {
    pub fn new(graph: SceneGraph) -> Self {
        Self {
            graph,
            parts: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.graph.root()
    }

    /// Root node of the part currently attached at `slot`, if one was swapped in
    pub fn part(&self, slot: ModelSlot) -> Option<NodeId> {
        self.parts.get(&slot).copied()
    }

    pub fn parts(&self) -> impl Iterator<Item = (ModelSlot, NodeId)> + '_ {
        self.parts.iter().map(|(slot, id)| (*slot, *id))
    }
}

/// Shared between the executor (writes between loads) and the frame loop.
pub type SceneHandle = Arc<RwLock<AvatarModel>>;

pub fn read_scene(scene: &SceneHandle) -> RwLockReadGuard<'_, AvatarModel> {
    scene.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_scene(scene: &SceneHandle) -> RwLockWriteGuard<'_, AvatarModel> {
    scene.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOutcome {
    Replaced(NodeId),
    /// The model variant has no node for this slot; nothing changed
    SlotAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    Started,
    MissingModel,
    /// Nothing to play; no mixer was created
    NoClips,
    ClipOutOfRange { index: usize, available: usize },
}

/// Fetches model files by asset name.
#[derive(Clone)]
pub struct ModelLoader {
    resolver: AssetResolver,
    loader: Arc<dyn AssetLoader<SceneGraph>>,
}

impl ModelLoader {
    pub fn new(resolver: AssetResolver, loader: Arc<dyn AssetLoader<SceneGraph>>) -> Self {
        Self { resolver, loader }
    }

    /// Load `root/[slot/]name.ext` and prepare it for display: every mesh casts
    /// and receives shadows, materials are transparent, matte, and culled per
    /// `double_sided`. The root is tagged with `name`.
    pub async fn create_model(
        &self,
        name: &str,
        double_sided: bool,
        slot: Option<ModelSlot>,
    ) -> Result<SceneGraph, LoadError> {
        let path = self.resolver.resolve(name, slot.map(|s| s.name()));
        let mut graph = match self.loader.load(&path).await {
            Ok(graph) => graph,
            Err(e) => {
                error!("resource path: {} is error: {}", path.display(), e);
                return Err(e);
            }
        };

        let side = if double_sided { Side::Double } else { Side::Front };
        for id in graph.traverse(graph.root()) {
            let Some(node) = graph.get_mut(id) else {
                continue;
            };
            if node.kind.is_mesh() {
                node.cast_shadow = true;
                node.receive_shadow = true;
            }
            if let Some(material) = node.material.as_mut() {
                material.normal_map_type = NormalMapType::TangentSpace;
                material.shininess = 0.0;
                material.transparent = true;
                material.side = side;
            }
        }
        let root = graph.root();
        if let Some(node) = graph.get_mut(root) {
            node.source_asset = Some(name.to_string());
        }

        info!("Created model {} from {}", name, path.display());
        Ok(graph)
    }
}

/// Swap the node named after `slot` for `part`. The part root is renamed to
/// the slot and takes the old node's place under the same parent.
pub fn replace_part(model: &mut AvatarModel, part: SceneGraph, slot: ModelSlot) -> PartOutcome {
    let Some(old) = model.graph.find_by_name(slot.name()).into_iter().next() else {
        warn!("{} is not part of this model, keeping it unchanged", slot);
        return PartOutcome::SlotAbsent;
    };
    let Some(parent) = model.graph.get(old).and_then(|node| node.parent()) else {
        return PartOutcome::SlotAbsent;
    };
    let index = model
        .graph
        .get(parent)
        .and_then(|node| node.children().iter().position(|child| *child == old))
        .unwrap_or(usize::MAX);

    let mut part = part;
    let part_root = part.root();
    if let Some(node) = part.get_mut(part_root) {
        node.set_name(slot.name());
    }

    model.graph.detach(old);
    match model.graph.graft(parent, index, part) {
        Some(id) => {
            model.parts.insert(slot, id);
            debug!("Replaced {} part", slot);
            PartOutcome::Replaced(id)
        }
        None => {
            model.parts.remove(&slot);
            PartOutcome::SlotAbsent
        }
    }
}

/// Hide every node named after `slot`. Returns how many were hidden.
pub fn hide_part(graph: &mut SceneGraph, slot: ModelSlot) -> usize {
    let targets = graph.find_by_name(slot.name());
    if targets.is_empty() {
        warn!("{} is not part of this model, nothing to hide", slot);
    }
    for id in &targets {
        if let Some(node) = graph.get_mut(*id) {
            node.visible = false;
        }
    }
    targets.len()
}

/// Put `texture` on every skinned mesh of `region`. Nodes are matched on the
/// region their name resolves to, anywhere in the hierarchy, so meshes inside
/// a swapped-in part are reached as well. Returns how many materials changed.
pub fn apply_texture(graph: &mut SceneGraph, region: TextureRegion, texture: Arc<CompositeTexture>) -> usize {
    let mut updated = 0;
    for id in graph.traverse(graph.root()) {
        let Some(node) = graph.get_mut(id) else {
            continue;
        };
        if node.region() != Some(region) || node.kind != NodeKind::SkinnedMesh {
            continue;
        }
        if let Some(material) = node.material.as_mut() {
            material.set_map(texture.clone());
            updated += 1;
        }
    }
    if updated == 0 {
        debug!("No {} mesh to texture", region.name());
    }
    updated
}

pub fn set_scale(graph: &mut SceneGraph, id: NodeId, scale: Vector3) {
    match graph.get_mut(id) {
        Some(node) => node.scale = scale,
        None => warn!("No model"),
    }
}

/// Advance the node's mixer by `delta` seconds, if it has one
pub fn play_animation(graph: &mut SceneGraph, id: NodeId, delta: f32) {
    let Some(node) = graph.get_mut(id) else {
        warn!("No model");
        return;
    };
    if let Some(mixer) = node.mixer.as_mut() {
        mixer.update(delta);
    }
}

pub fn reset_animation(graph: &mut SceneGraph, id: NodeId) {
    let Some(node) = graph.get_mut(id) else {
        info!("No model");
        return;
    };
    if let Some(mixer) = node.mixer.as_mut() {
        mixer.set_time(0.0);
    }
}

/// Bind clip `index` and start it from zero, ping-ponging when `looped`.
pub fn set_animation(
    graph: &mut SceneGraph,
    id: NodeId,
    index: usize,
    looped: bool,
    time_scale: f32,
) -> AnimationOutcome {
    let Some(node) = graph.get_mut(id) else {
        info!("No model");
        return AnimationOutcome::MissingModel;
    };
    let asset = node.source_asset.as_deref().unwrap_or(node.name()).to_string();
    if node.animations.is_empty() {
        error!("{} no animations", asset);
        return AnimationOutcome::NoClips;
    }
    let Some(clip) = node.animations.get(index) else {
        let available = node.animations.len();
        error!("{} has no animation {} ({} available)", asset, index, available);
        return AnimationOutcome::ClipOutOfRange { index, available };
    };

    let mixer = node.mixer.get_or_insert_with(AnimationMixer::new);
    let action = mixer.clip_action(index, clip);
    action.time_scale = time_scale;
    action.loop_mode = if looped { LoopMode::PingPong } else { LoopMode::Once };
    mixer.set_time(0.0);
    if let Some(action) = mixer.action_mut() {
        action.play();
    }
    AnimationOutcome::Started
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::material::Material;
    use crate::rendering::animation::AnimationClip;
    use crate::rendering::scene::SceneNode;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    fn skinned(name: &str) -> SceneNode {
        SceneNode::new(name, NodeKind::SkinnedMesh).with_material(Material::new(name))
    }

    fn base_model() -> AvatarModel {
        let mut graph = SceneGraph::new(
            SceneNode::group("avatar_main").with_animations(vec![AnimationClip::new("idle", 2.0)]),
        );
        let root = graph.root();
        graph.add_child(root, skinned("head")).unwrap();
        graph.add_child(root, skinned("ear_L")).unwrap();
        graph.add_child(root, skinned("body_up_A")).unwrap();
        graph.add_child(root, skinned("hand")).unwrap();
        graph.add_child(root, SceneNode::new("hips", NodeKind::Bone)).unwrap();
        AvatarModel::new(graph)
    }

    fn head_part() -> SceneGraph {
        let mut part = SceneGraph::new(
            SceneNode::group("head_02").with_animations(vec![AnimationClip::new("idle", 1.0)]),
        );
        let root = part.root();
        let rig = part.add_child(root, SceneNode::group("rig")).unwrap();
        part.add_child(rig, SceneNode::new("neck", NodeKind::Bone)).unwrap();
        part.add_child(root, skinned("head_02_mesh")).unwrap();
        part
    }

    fn texture(px: [u8; 4]) -> Arc<CompositeTexture> {
        Arc::new(CompositeTexture::new(RgbaImage::from_pixel(2, 2, Rgba(px))))
    }

    fn map_of(graph: &SceneGraph, name: &str) -> Option<Arc<CompositeTexture>> {
        let id = graph.traverse(graph.root()).into_iter().find(|id| graph.get(*id).unwrap().name() == name)?;
        graph.get(id)?.material.as_ref()?.map.clone()
    }

    #[test]
    fn test_replace_part_in_place() {
        let mut model = base_model();
        let root = model.root();
        let before: Vec<_> = model.graph.get(root).unwrap().children().to_vec();

        let outcome = replace_part(&mut model, head_part(), ModelSlot::Head);
        let PartOutcome::Replaced(id) = outcome else {
            panic!("head should be replaced");
        };

        let children = model.graph.get(root).unwrap().children().to_vec();
        assert_eq!(children.len(), before.len());
        assert_eq!(children[0], id);
        assert_eq!(&children[1..], &before[1..]);
        assert_eq!(model.graph.get(id).unwrap().name(), "head");
        assert_eq!(model.part(ModelSlot::Head), Some(id));
        assert!(!model.graph.contains(before[0]));
    }

    #[test]
    fn test_replace_absent_slot_is_noop() {
        let mut model = base_model();
        let root = model.root();
        model.graph.detach(model.graph.find_by_name("hand")[0]);
        let len = model.graph.len();

        assert_eq!(replace_part(&mut model, head_part(), ModelSlot::Hand), PartOutcome::SlotAbsent);
        assert_eq!(model.graph.len(), len);
        assert_eq!(model.part(ModelSlot::Hand), None);
        assert_eq!(model.graph.get(root).unwrap().children().len(), 4);
    }

    #[test]
    fn test_hide_part_keeps_node() {
        let mut model = base_model();
        assert_eq!(hide_part(&mut model.graph, ModelSlot::BodyUpA), 1);
        let id = model.graph.find_by_name("body_up_A")[0];
        assert!(!model.graph.get(id).unwrap().visible);
        assert_eq!(hide_part(&mut model.graph, ModelSlot::BodyUpA), 1);
    }

    #[test]
    fn test_apply_texture_matches_region_and_skinned_only() {
        let mut model = base_model();
        let root = model.root();
        model.graph.add_child(root, SceneNode::new("hand_static", NodeKind::Mesh).with_material(Material::new("s"))).unwrap();

        let tex = texture([1, 2, 3, 255]);
        assert_eq!(apply_texture(&mut model.graph, TextureRegion::Hand, tex.clone()), 1);

        let applied = map_of(&model.graph, "hand").unwrap();
        assert!(Arc::ptr_eq(&applied, &tex));
        assert!(map_of(&model.graph, "hand_static").is_none());
        assert!(map_of(&model.graph, "head").is_none());

        let id = model.graph.find_by_name("hand")[0];
        assert!(model.graph.get(id).unwrap().material.as_ref().unwrap().needs_update);
    }

    #[test]
    fn test_apply_texture_reaches_swapped_part() {
        let mut model = base_model();
        replace_part(&mut model, head_part(), ModelSlot::Head);

        let face = texture([9, 9, 9, 255]);
        assert_eq!(apply_texture(&mut model.graph, TextureRegion::Head, face.clone()), 1);
        assert!(Arc::ptr_eq(&map_of(&model.graph, "head_02_mesh").unwrap(), &face));
    }

    #[test]
    fn test_apply_texture_without_match_is_noop() {
        let mut graph = SceneGraph::new(SceneNode::group("empty"));
        assert_eq!(apply_texture(&mut graph, TextureRegion::Ear, texture([0, 0, 0, 255])), 0);
    }

    #[test]
    fn test_set_animation_without_clips_creates_no_mixer() {
        let mut graph = SceneGraph::new(SceneNode::group("static"));
        let root = graph.root();
        assert_eq!(set_animation(&mut graph, root, 0, true, 1.0), AnimationOutcome::NoClips);
        assert!(graph.get(root).unwrap().mixer.is_none());
    }

    #[test]
    fn test_set_animation_out_of_range() {
        let mut model = base_model();
        let root = model.root();
        assert_eq!(
            set_animation(&mut model.graph, root, 3, true, 1.0),
            AnimationOutcome::ClipOutOfRange { index: 3, available: 1 }
        );
        assert!(model.graph.get(root).unwrap().mixer.is_none());
    }

    #[test]
    fn test_animation_lifecycle() {
        let mut model = base_model();
        let root = model.root();

        // Uninitialized: play and reset are no-ops
        play_animation(&mut model.graph, root, 0.5);
        reset_animation(&mut model.graph, root);
        assert!(model.graph.get(root).unwrap().mixer.is_none());

        assert_eq!(set_animation(&mut model.graph, root, 0, true, 1.0), AnimationOutcome::Started);
        let mixer = model.graph.get(root).unwrap().mixer.as_ref().unwrap();
        let action = mixer.action().unwrap();
        assert_eq!(mixer.time(), 0.0);
        assert_eq!(action.loop_mode, LoopMode::PingPong);
        assert!(action.is_playing());

        play_animation(&mut model.graph, root, 0.25);
        assert_eq!(model.graph.get(root).unwrap().mixer.as_ref().unwrap().time(), 0.25);

        reset_animation(&mut model.graph, root);
        assert_eq!(model.graph.get(root).unwrap().mixer.as_ref().unwrap().time(), 0.0);
    }

    #[test]
    fn test_set_animation_play_once() {
        let mut model = base_model();
        let root = model.root();
        set_animation(&mut model.graph, root, 0, false, 2.0);
        let action = model.graph.get(root).unwrap().mixer.as_ref().unwrap().action().unwrap().clone();
        assert_eq!(action.loop_mode, LoopMode::Once);
        assert_eq!(action.time_scale, 2.0);
    }

    #[test]
    fn test_missing_node_does_not_panic() {
        let mut model = base_model();
        let hips = model.graph.find_by_name("hips")[0];
        model.graph.detach(hips);
        play_animation(&mut model.graph, hips, 0.1);
        reset_animation(&mut model.graph, hips);
        assert_eq!(set_animation(&mut model.graph, hips, 0, true, 1.0), AnimationOutcome::MissingModel);
    }

    struct MemoryModels {
        models: Vec<(PathBuf, SceneGraph)>,
        requests: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl AssetLoader<SceneGraph> for MemoryModels {
        async fn load(&self, path: &Path) -> Result<SceneGraph, LoadError> {
            self.requests.lock().unwrap().push(path.to_path_buf());
            self.models
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, graph)| graph.clone())
                .ok_or_else(|| LoadError::NotFound { path: path.to_path_buf() })
        }
    }

    #[tokio::test]
    async fn test_create_model_applies_render_defaults() {
        let loader = Arc::new(MemoryModels {
            models: vec![(PathBuf::from("res/head/head_02.dae"), head_part())],
            requests: Mutex::new(Vec::new()),
        });
        let models = ModelLoader::new(AssetResolver::new("res", "dae"), loader.clone());

        let graph = models.create_model("head_02", false, Some(ModelSlot::Head)).await.unwrap();
        assert_eq!(graph.root_node().source_asset.as_deref(), Some("head_02"));

        let mesh = graph.find_by_name("head_02_mesh")[0];
        let node = graph.get(mesh).unwrap();
        assert!(node.cast_shadow && node.receive_shadow);
        let material = node.material.as_ref().unwrap();
        assert_eq!(material.side, Side::Front);
        assert!(material.transparent);
        assert_eq!(material.shininess, 0.0);

        let neck = graph.find_by_name("neck")[0];
        assert!(!graph.get(neck).unwrap().cast_shadow);
    }

    #[tokio::test]
    async fn test_create_model_failure_carries_path() {
        let loader = Arc::new(MemoryModels { models: Vec::new(), requests: Mutex::new(Vec::new()) });
        let models = ModelLoader::new(AssetResolver::new("res", "dae"), loader);

        let err = models.create_model("avatar_main", true, None).await.unwrap_err();
        assert_eq!(err.path(), Path::new("res/avatar_main.dae"));
    }
}
