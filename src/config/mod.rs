pub mod settings;

pub use settings::{
    load_settings, seed_settings, seed_settings_file, AssetSettings, AvatarCatalog, AvatarSettings,
    DisplaySettings, SettingsError,
};
