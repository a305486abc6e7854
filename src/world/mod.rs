pub mod avatar;
pub mod executor;
pub mod model;

pub use avatar::{AvatarEntry, AvatarState, FaceSlot, ModelSlot, TextureRegion};
pub use executor::{animate_frame, AssetSources, AvatarError, AvatarExecutor};
pub use model::{AnimationOutcome, AvatarModel, PartOutcome, SceneHandle};
