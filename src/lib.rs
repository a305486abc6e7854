// avatar-rust: avatar customization core
// Part swapping, texture compositing and idle animation over a render surface

pub mod utils;
pub mod config;
pub mod rendering;
pub mod assets;
pub mod world;

pub use config::AvatarSettings;
pub use world::{AvatarExecutor, AvatarState};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
