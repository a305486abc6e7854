use crate::rendering::light::{LightingState, ShadowParams};
use crate::utils::{Rgb, Vector3};
use crate::world::model::{read_scene, SceneHandle};
use tracing::{debug, info};

/// Where the avatar gets drawn. Every call is synchronous and fire-and-forget.
pub trait RenderSurface: Send {
    /// Take the scene to draw; replaces any previous one
    fn set_scene(&mut self, scene: SceneHandle);
    /// Draw one frame
    fn render(&mut self);
    fn set_background_color(&mut self, color: Rgb);
    fn set_hemisphere_light(&mut self, sky_color: Rgb, ground_color: Rgb, intensity: f32);
    fn set_hemisphere_light_position(&mut self, x: f32, y: f32, z: f32);
    fn set_directional_light(&mut self, color: Rgb, intensity: f32);
    fn set_directional_light_position(&mut self, x: f32, y: f32, z: f32);
    fn set_shadow_parameters(&mut self, params: &ShadowParams);
}

/// Surface without a GPU behind it. Keeps the renderer state and counts
/// frames, which is all the binary and the tests need.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    scene: Option<SceneHandle>,
    background: Option<Rgb>,
    lighting: LightingState,
    frames_rendered: u64,
    visible_meshes: usize,
}

impl HeadlessSurface {
    pub fn new(lighting: LightingState) -> Self {
        let mut surface = Self::default();
        let LightingState { hemisphere, directional, shadow } = lighting;
        surface.set_hemisphere_light(hemisphere.sky_color, hemisphere.ground_color, hemisphere.intensity);
        surface.set_hemisphere_light_position(hemisphere.position.x, hemisphere.position.y, hemisphere.position.z);
        surface.set_directional_light(directional.color, directional.intensity);
        surface.set_directional_light_position(directional.position.x, directional.position.y, directional.position.z);
        surface.set_shadow_parameters(&shadow);
        surface
    }

    pub fn scene(&self) -> Option<&SceneHandle> {
        self.scene.as_ref()
    }

    pub fn background(&self) -> Option<Rgb> {
        self.background
    }

    pub fn lighting(&self) -> &LightingState {
        &self.lighting
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Visible mesh nodes seen by the last frame
    pub fn visible_meshes(&self) -> usize {
        self.visible_meshes
    }
}

impl RenderSurface for HeadlessSurface {
    fn set_scene(&mut self, scene: SceneHandle) {
        self.scene = Some(scene);
    }

    fn render(&mut self) {
        let Some(scene) = self.scene.as_ref() else {
            info!("No scene attached, skipping frame");
            return;
        };
        let model = read_scene(scene);
        let graph = &model.graph;
        // hidden nodes take their whole subtree with them
        let mut meshes = 0;
        let mut stack = vec![graph.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = graph.get(id).filter(|node| node.visible) else {
                continue;
            };
            if node.kind.is_mesh() {
                meshes += 1;
            }
            stack.extend(node.children().iter().copied());
        }
        self.visible_meshes = meshes;
        self.frames_rendered += 1;
        debug!("Frame {} drew {} meshes", self.frames_rendered, self.visible_meshes);
    }

    fn set_background_color(&mut self, color: Rgb) {
        self.background = Some(color);
    }

    fn set_hemisphere_light(&mut self, sky_color: Rgb, ground_color: Rgb, intensity: f32) {
        let light = &mut self.lighting.hemisphere;
        light.sky_color = sky_color;
        light.ground_color = ground_color;
        light.intensity = intensity;
    }

    fn set_hemisphere_light_position(&mut self, x: f32, y: f32, z: f32) {
        self.lighting.hemisphere.position = Vector3::new(x, y, z);
    }

    fn set_directional_light(&mut self, color: Rgb, intensity: f32) {
        self.lighting.directional.color = color;
        self.lighting.directional.intensity = intensity;
    }

    fn set_directional_light_position(&mut self, x: f32, y: f32, z: f32) {
        self.lighting.directional.position = Vector3::new(x, y, z);
    }

    fn set_shadow_parameters(&mut self, params: &ShadowParams) {
        self.lighting.shadow = params.clone();
    }
}
