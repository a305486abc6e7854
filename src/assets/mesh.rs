use super::manager::{AssetLoader, LoadError};
use super::material::Material;
use crate::rendering::animation::{AnimationChannel, AnimationClip};
use crate::rendering::scene::{NodeId, NodeKind, SceneGraph, SceneNode};
use anyhow::anyhow;
use async_trait::async_trait;
use collada::document::ColladaDocument;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, info};

/// Name of the single clip built from all animation channels of a file
pub const DEFAULT_CLIP_NAME: &str = "idle";

/// Loads `.dae` (COLLADA) model files into a [`SceneGraph`].
///
/// The root is a group named after the file. Joints become bone nodes,
/// geometries become mesh nodes (skinned when a skin controller binds them),
/// and every animation channel in the file is merged into one clip.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColladaModelLoader;

#[async_trait]
impl AssetLoader<SceneGraph> for ColladaModelLoader {
    async fn load(&self, path: &Path) -> Result<SceneGraph, LoadError> {
        let xml = tokio::fs::read_to_string(path).await.map_err(|source| {
            error!("Failed to read model: {:?}, error: {}", path, source);
            LoadError::Io { path: path.to_path_buf(), source }
        })?;

        let root_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();

        match parse_collada(&xml, root_name) {
            Ok(graph) => {
                info!("Loaded model: {:?} ({} nodes)", path, graph.len());
                Ok(graph)
            }
            Err(e) => {
                error!("Failed to decode model: {:?}, error: {}", path, e);
                Err(LoadError::Model { path: path.to_path_buf(), reason: e.to_string() })
            }
        }
    }
}

pub fn parse_collada(xml: &str, root_name: &str) -> anyhow::Result<SceneGraph> {
    let document = ColladaDocument::from_str(xml).map_err(|e| anyhow!("{}", e))?;

    let skinned: HashSet<String> = document
        .get_bind_data_set()
        .map(|set| set.bind_data.into_iter().map(|bind| bind.object_name).collect())
        .unwrap_or_default();

    let channels: Vec<AnimationChannel> = document
        .get_animations()
        .unwrap_or_default()
        .into_iter()
        .map(|animation| AnimationChannel {
            target: animation.target,
            sample_times: animation.sample_times,
        })
        .collect();
    let clips = if channels.is_empty() {
        Vec::new()
    } else {
        vec![AnimationClip::from_channels(DEFAULT_CLIP_NAME, channels)]
    };

    let mut graph = SceneGraph::new(SceneNode::group(root_name).with_animations(clips));
    let root = graph.root();

    for skeleton in document.get_skeletons().unwrap_or_default() {
        let mut bones: Vec<NodeId> = Vec::with_capacity(skeleton.joints.len());
        for joint in &skeleton.joints {
            // parents always precede their children; anything else hangs off the root
            let parent = bones.get(joint.parent_index as usize).copied().unwrap_or(root);
            let bone = graph
                .add_child(parent, SceneNode::new(joint.name.clone(), NodeKind::Bone))
                .ok_or_else(|| anyhow!("dangling joint parent for {}", joint.name))?;
            bones.push(bone);
        }
    }

    let objects = document
        .get_obj_set()
        .ok_or_else(|| anyhow!("no geometry library"))?
        .objects;
    for object in objects {
        let kind = if skinned.contains(&object.name) || skinned.contains(&object.id) {
            NodeKind::SkinnedMesh
        } else {
            NodeKind::Mesh
        };
        debug!("Model {} mesh {} ({:?})", root_name, object.name, kind);
        let node = SceneNode::new(object.name.clone(), kind).with_material(Material::new(object.name));
        graph
            .add_child(root, node)
            .ok_or_else(|| anyhow!("model root missing"))?;
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: &str = "1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1";

    /// Two geometries (head bound by a skin controller, ear_L plain), a three
    /// joint skeleton and two animated channels.
    fn rigged_head() -> String {
        format!(
            r##"<COLLADA>
<library_geometries>
<geometry id="head-mesh" name="head">
<mesh>
<source id="head-pos"><float_array id="head-pos-array" count="9">0 0 0 1 0 0 0 1 0</float_array></source>
<vertices id="head-verts"><input semantic="POSITION" source="#head-pos"/></vertices>
<triangles count="1"><input semantic="VERTEX" source="#head-verts" offset="0"/><p>0 1 2</p></triangles>
</mesh>
</geometry>
<geometry id="ear-mesh" name="ear_L">
<mesh>
<source id="ear-pos"><float_array id="ear-pos-array" count="9">0 0 1 1 0 1 0 1 1</float_array></source>
<vertices id="ear-verts"><input semantic="POSITION" source="#ear-pos"/></vertices>
<triangles count="1"><input semantic="VERTEX" source="#ear-verts" offset="0"/><p>0 1 2</p></triangles>
</mesh>
</geometry>
</library_geometries>
<library_controllers>
<controller id="head-skin" name="Armature">
<skin source="#head-mesh">
<source id="head-joints"><Name_array id="head-joints-array" count="2">hips spine</Name_array></source>
<source id="head-bind-poses"><float_array id="head-bind-poses-array" count="32">{m} {m}</float_array></source>
<source id="head-weights"><float_array id="head-weights-array" count="1">1</float_array></source>
<joints><input semantic="JOINT" source="#head-joints"/><input semantic="INV_BIND_MATRIX" source="#head-bind-poses"/></joints>
<vertex_weights count="3">
<input semantic="JOINT" source="#head-joints" offset="0"/>
<input semantic="WEIGHT" source="#head-weights" offset="1"/>
<vcount>1 1 1</vcount>
<v>0 0 1 0 1 0</v>
</vertex_weights>
</skin>
</controller>
</library_controllers>
<library_animations>
<animation id="hips-anim">
<source id="hips-time"><float_array id="hips-time-array" count="3">0 0.5 1.25</float_array></source>
<source id="hips-pose"><float_array id="hips-pose-array" count="48">{m} {m} {m}</float_array></source>
<sampler id="hips-sampler"><input semantic="INPUT" source="#hips-time"/><input semantic="OUTPUT" source="#hips-pose"/></sampler>
<channel source="#hips-sampler" target="hips/transform"/>
</animation>
<animation id="neck-anim">
<source id="neck-time"><float_array id="neck-time-array" count="2">0 2</float_array></source>
<source id="neck-pose"><float_array id="neck-pose-array" count="32">{m} {m}</float_array></source>
<sampler id="neck-sampler"><input semantic="INPUT" source="#neck-time"/><input semantic="OUTPUT" source="#neck-pose"/></sampler>
<channel source="#neck-sampler" target="neck/transform"/>
</animation>
</library_animations>
<library_visual_scenes>
<visual_scene id="Scene" name="Scene">
<node id="Armature" name="Armature" type="NODE">
<node id="hips" name="hips" sid="hips" type="JOINT">
<matrix sid="transform">{m}</matrix>
<node id="spine" name="spine" sid="spine" type="JOINT"><matrix sid="transform">{m}</matrix></node>
<node id="neck" name="neck" sid="neck" type="JOINT"><matrix sid="transform">{m}</matrix></node>
</node>
</node>
<node id="head" name="head" type="NODE">
<instance_controller url="#head-skin"><skeleton>#hips</skeleton></instance_controller>
</node>
</visual_scene>
</library_visual_scenes>
</COLLADA>"##,
            m = IDENTITY
        )
    }

    fn names(graph: &SceneGraph) -> Vec<String> {
        graph
            .traverse(graph.root())
            .into_iter()
            .map(|id| graph.get(id).unwrap().name().to_string())
            .collect()
    }

    fn node<'a>(graph: &'a SceneGraph, name: &str) -> &'a SceneNode {
        graph.get(graph.find_by_name(name)[0]).unwrap()
    }

    #[test]
    fn test_parse_skinned_model() {
        let graph = parse_collada(&rigged_head(), "head_03").unwrap();
        assert_eq!(names(&graph), ["head_03", "hips", "spine", "neck", "head", "ear_L"]);

        // the skin binds the geometry by id, not by name
        assert_eq!(node(&graph, "head").kind, NodeKind::SkinnedMesh);
        assert_eq!(node(&graph, "ear_L").kind, NodeKind::Mesh);
        assert_eq!(node(&graph, "head").material.as_ref().unwrap().name, "head");
        assert_eq!(node(&graph, "hips").kind, NodeKind::Bone);

        let hips = graph.find_by_name("hips")[0];
        assert_eq!(node(&graph, "hips").parent(), Some(graph.root()));
        assert_eq!(node(&graph, "spine").parent(), Some(hips));
        assert_eq!(node(&graph, "neck").parent(), Some(hips));

        let clips = &graph.root_node().animations;
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].name, DEFAULT_CLIP_NAME);
        assert_eq!(clips[0].duration, 2.0);
        let targets: Vec<_> = clips[0].channels.iter().map(|c| c.target.as_str()).collect();
        assert_eq!(targets, ["hips/transform", "neck/transform"]);
        assert_eq!(clips[0].channels[0].sample_times, [0.0, 0.5, 1.25]);
    }

    #[tokio::test]
    async fn test_load_names_root_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("head_03.dae");
        std::fs::write(&path, rigged_head()).unwrap();

        let graph = ColladaModelLoader.load(&path).await.unwrap();
        assert_eq!(graph.root_node().name(), "head_03");
        assert_eq!(graph.find_by_name("head").len(), 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_collada("this is not xml", "broken").is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("head").join("head_09.dae");
        let err = ColladaModelLoader.load(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_undecodable_file_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.dae");
        std::fs::write(&path, "<COLLADA").unwrap();
        let err = ColladaModelLoader.load(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::Model { .. }));
    }
}
