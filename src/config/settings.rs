use crate::rendering::light::LightingState;
use crate::utils::Rgb;
use crate::world::avatar::{AvatarState, FaceSlot, ModelSlot};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_FILE: &str = "avatar.toml";
/// Overrides `assets.root` from the settings file
pub const ASSET_ROOT_ENV: &str = "AVATAR_ASSET_ROOT";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub root: PathBuf,
    pub model_extension: String,
    pub texture_extension: String,
    /// Rigged base model every part is grafted onto
    pub main_model: String,
    /// Texture under `skin/` that gets tinted with the skin color
    pub skin_texture: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("res/avatar"),
            model_extension: "dae".to_string(),
            texture_extension: "png".to_string(),
            main_model: "avatar_main".to_string(),
            skin_texture: "skin_base".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub model_scale: f32,
    /// Seconds the mixers advance per rendered frame
    pub frame_step: f32,
    pub background_color: Rgb,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            model_scale: 0.3,
            frame_step: 0.01,
            background_color: Rgb(0xf7fbe9),
        }
    }
}

/// What the property panel offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarCatalog {
    pub models: BTreeMap<ModelSlot, Vec<String>>,
    /// Face layer textures, e.g. `eyes_01`, `mouth_03`
    pub textures: Vec<String>,
    pub skin_colors: Vec<Rgb>,
}

impl AvatarCatalog {
    /// Which face slot a catalog texture belongs to, from its name prefix
    pub fn catalog_entry_slot(texture_name: &str) -> Option<FaceSlot> {
        FaceSlot::from_texture_name(texture_name)
    }

    pub fn textures_for(&self, slot: FaceSlot) -> impl Iterator<Item = &str> + '_ {
        self.textures
            .iter()
            .map(String::as_str)
            .filter(move |name| Self::catalog_entry_slot(name) == Some(slot))
    }

    pub fn models_for(&self, slot: ModelSlot) -> &[String] {
        self.models.get(&slot).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarSettings {
    pub assets: AssetSettings,
    pub display: DisplaySettings,
    pub lighting: LightingState,
    pub catalog: AvatarCatalog,
    pub default_avatar: AvatarState,
}

impl AvatarSettings {
    pub fn from_toml(data: &str, path: &Path) -> Result<Self, SettingsError> {
        toml::from_str(data).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let mut settings = match fs::read_to_string(path) {
            Ok(data) => Self::from_toml(&data, path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings at {:?}, using defaults", path);
                Self::default()
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).map_err(io_err)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(root) = std::env::var_os(ASSET_ROOT_ENV).filter(|v| !v.is_empty()) {
            self.assets.root = PathBuf::from(root);
        }
    }
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "avatar", "avatar-rust")
        .map(|proj| proj.config_dir().join(CONFIG_FILE))
}

/// Load from the platform config directory, falling back to defaults when
/// the file is missing or unreadable.
pub fn load_settings() -> AvatarSettings {
    let Some(path) = config_path() else {
        let mut settings = AvatarSettings::default();
        settings.apply_env_overrides();
        return settings;
    };
    match AvatarSettings::load_from(&path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("{}, using defaults", e);
            let mut settings = AvatarSettings::default();
            settings.apply_env_overrides();
            settings
        }
    }
}

/// Write the default settings to `path` unless a file is already there.
/// Returns whether a file was written.
pub fn seed_settings_file(path: &Path) -> Result<bool, SettingsError> {
    if path.exists() {
        return Ok(false);
    }
    AvatarSettings::default().save_to(path)?;
    info!("Wrote default settings to {:?}", path);
    Ok(true)
}

/// Seed the platform config directory so there is a file to edit.
pub fn seed_settings() -> Result<bool, SettingsError> {
    match config_path() {
        Some(path) => seed_settings_file(&path),
        None => Ok(false),
    }
}
