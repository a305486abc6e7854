//! Avatar orchestration: every appearance change goes through [`AvatarExecutor`].
//!
//! Operations are queued on one async mutex and run strictly one after
//! another. The scene lock is only held for the synchronous mutation between
//! asset loads, so the frame loop keeps rendering while a part is loading.

use crate::assets::manager::{AssetLoader, AssetResolver, LoadError};
use crate::assets::mesh::ColladaModelLoader;
use crate::assets::texture::{CompositeTexture, ImageFileLoader, TextureCategory, TextureCompositor};
use crate::config::settings::AvatarSettings;
use crate::rendering::scene::SceneGraph;
use crate::rendering::surface::RenderSurface;
use crate::utils::{Rgb, Vector3};
use crate::world::avatar::{AvatarState, FaceSlot, ModelSlot, TextureRegion};
use crate::world::model::{self, write_scene, AvatarModel, ModelLoader, PartOutcome, SceneHandle};
use image::RgbaImage;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Clip started on the base model and every part
const IDLE_CLIP: usize = 0;

#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Where textures and models come from.
pub struct AssetSources {
    pub textures: Arc<dyn AssetLoader<RgbaImage>>,
    pub models: Arc<dyn AssetLoader<SceneGraph>>,
}

impl AssetSources {
    /// Decode from disk: PNG textures and COLLADA models
    pub fn files() -> Self {
        Self {
            textures: Arc::new(ImageFileLoader),
            models: Arc::new(ColladaModelLoader),
        }
    }
}

pub struct AvatarExecutor {
    compositor: TextureCompositor,
    models: ModelLoader,
    settings: AvatarSettings,
    queue: Mutex<AvatarState>,
    scene: SceneHandle,
}

impl AvatarExecutor {
    /// Load the base model, dress it per `state` and hand it to `surface`.
    pub async fn initialize(
        settings: AvatarSettings,
        state: AvatarState,
        sources: AssetSources,
        surface: &mut dyn RenderSurface,
    ) -> Result<Self, AvatarError> {
        let assets = &settings.assets;
        let compositor = TextureCompositor::new(
            AssetResolver::new(&assets.root, &assets.texture_extension),
            sources.textures,
        );
        let models = ModelLoader::new(
            AssetResolver::new(&assets.root, &assets.model_extension),
            sources.models,
        );

        let mut graph = models.create_model(&assets.main_model, true, None).await?;
        let root = graph.root();
        model::set_scale(&mut graph, root, Vector3::splat(settings.display.model_scale));

        let skin = Self::build_skin(&compositor, &settings, state.skin()).await?;
        let face = Self::build_face(&compositor, &settings, &state).await?;
        for region in TextureRegion::SKIN {
            model::apply_texture(&mut graph, region, skin.clone());
        }
        model::apply_texture(&mut graph, TextureRegion::Head, face);

        let scene: SceneHandle = Arc::new(RwLock::new(AvatarModel::new(graph)));
        {
            let mut avatar = write_scene(&scene);
            model::reset_animation(&mut avatar.graph, root);
            model::set_animation(&mut avatar.graph, root, IDLE_CLIP, true, 1.0);
        }
        let executor = Self {
            compositor,
            models,
            settings,
            queue: Mutex::new(AvatarState::default()),
            scene,
        };

        {
            let mut current = executor.queue.lock().await;
            *current = state.clone();
            for (slot, name) in state.selected_models() {
                executor.attach_part(&current, slot, name).await?;
            }
        }

        // The surface only ever sees a fully dressed avatar.
        surface.set_scene(executor.scene.clone());
        info!("Avatar {} ready", executor.settings.assets.main_model);
        Ok(executor)
    }

    /// [`initialize`](Self::initialize) with assets decoded from disk.
    pub async fn from_settings(
        settings: AvatarSettings,
        surface: &mut dyn RenderSurface,
    ) -> Result<Self, AvatarError> {
        let state = settings.default_avatar.clone();
        Self::initialize(settings, state, AssetSources::files(), surface).await
    }

    pub fn scene(&self) -> SceneHandle {
        self.scene.clone()
    }

    pub fn settings(&self) -> &AvatarSettings {
        &self.settings
    }

    /// Snapshot of the current selections
    pub async fn state(&self) -> AvatarState {
        self.queue.lock().await.clone()
    }

    pub async fn change_face(&self, slot: FaceSlot, texture_name: &str) -> Result<(), AvatarError> {
        let mut state = self.queue.lock().await;
        state.set_face(slot, texture_name);
        self.refresh_face(&state).await
    }

    pub async fn change_skin(&self, color: Rgb) -> Result<(), AvatarError> {
        let mut state = self.queue.lock().await;
        state.set_skin(color);

        let skin = Self::build_skin(&self.compositor, &self.settings, color).await?;
        {
            let mut avatar = write_scene(&self.scene);
            for region in TextureRegion::SKIN {
                model::apply_texture(&mut avatar.graph, region, skin.clone());
            }
        }
        self.refresh_face(&state).await
    }

    pub async fn change_model(&self, slot: ModelSlot, asset_name: &str) -> Result<(), AvatarError> {
        let mut state = self.queue.lock().await;
        state.set_model(slot, asset_name);
        self.attach_part(&state, slot, asset_name).await
    }

    /// Hide the part at `slot`. The node stays in the hierarchy.
    pub async fn remove_model_part(&self, slot: ModelSlot) -> usize {
        let mut state = self.queue.lock().await;
        state.set_model(slot, "");
        let mut avatar = write_scene(&self.scene);
        model::hide_part(&mut avatar.graph, slot)
    }

    pub async fn remove_texture(&self, slot: FaceSlot) -> Result<(), AvatarError> {
        let mut state = self.queue.lock().await;
        state.set_face(slot, "");
        self.refresh_face(&state).await
    }

    async fn refresh_face(&self, state: &AvatarState) -> Result<(), AvatarError> {
        let face = Self::build_face(&self.compositor, &self.settings, state).await?;
        let mut avatar = write_scene(&self.scene);
        model::apply_texture(&mut avatar.graph, TextureRegion::Head, face);
        Ok(())
    }

    async fn attach_part(&self, state: &AvatarState, slot: ModelSlot, name: &str) -> Result<(), AvatarError> {
        let mut part = self.models.create_model(name, true, Some(slot)).await?;
        match slot {
            ModelSlot::Head => {
                let face = Self::build_face(&self.compositor, &self.settings, state).await?;
                model::apply_texture(&mut part, TextureRegion::Head, face);
            }
            ModelSlot::Hand => {
                let skin = Self::build_skin(&self.compositor, &self.settings, state.skin()).await?;
                model::apply_texture(&mut part, TextureRegion::Hand, skin);
            }
            ModelSlot::BodyUpA => {}
        }

        let mut avatar = write_scene(&self.scene);
        if let PartOutcome::Replaced(id) = model::replace_part(&mut avatar, part, slot) {
            debug!("Attached {} at {} as {:?}", name, slot, id);
        }

        let root = avatar.root();
        model::reset_animation(&mut avatar.graph, root);
        let parts: Vec<_> = avatar.parts().map(|(_, id)| id).collect();
        for id in parts {
            let has_clips = avatar.graph.get(id).is_some_and(|node| !node.animations.is_empty());
            if has_clips {
                model::reset_animation(&mut avatar.graph, id);
                model::set_animation(&mut avatar.graph, id, IDLE_CLIP, true, 1.0);
            }
        }
        model::set_animation(&mut avatar.graph, root, IDLE_CLIP, true, 1.0);
        Ok(())
    }

    async fn build_skin(
        compositor: &TextureCompositor,
        settings: &AvatarSettings,
        color: Rgb,
    ) -> Result<Arc<CompositeTexture>, LoadError> {
        let base = compositor.load(&settings.assets.skin_texture, TextureCategory::Skin).await?;
        Ok(Arc::new(TextureCompositor::recolor(&base, color)))
    }

    /// Tinted skin with the eyes, mouth and face layers on top
    async fn build_face(
        compositor: &TextureCompositor,
        settings: &AvatarSettings,
        state: &AvatarState,
    ) -> Result<Arc<CompositeTexture>, LoadError> {
        let base = compositor.load(&settings.assets.skin_texture, TextureCategory::Skin).await?;
        let mut layers = vec![TextureCompositor::recolor(&base, state.skin())];
        for slot in FaceSlot::ALL {
            layers.push(compositor.load(state.face(slot), slot.into()).await?);
        }
        Ok(Arc::new(TextureCompositor::composite(&layers)))
    }
}

/// Render one frame and advance the base model and every attached part by `step`.
pub fn animate_frame(scene: &SceneHandle, surface: &mut dyn RenderSurface, step: f32) {
    surface.render();
    let mut avatar = write_scene(scene);
    let root = avatar.root();
    model::play_animation(&mut avatar.graph, root, step);
    let parts: Vec<_> = avatar.parts().map(|(_, id)| id).collect();
    for id in parts {
        model::play_animation(&mut avatar.graph, id, step);
    }
}
