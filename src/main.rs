use anyhow::Context;
use avatar_rust::config::{load_settings, seed_settings};
use avatar_rust::rendering::{HeadlessSurface, RenderSurface};
use avatar_rust::utils::logging::{init_logging, log_session_info};
use avatar_rust::world::{animate_frame, AvatarExecutor};
use tracing::{info, warn};

/// Frames drawn before the headless viewer exits
const FRAMES: u32 = 120;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    if let Err(e) = seed_settings() {
        warn!("{}", e);
    }
    let settings = load_settings();
    log_session_info(&settings.assets.root);

    let mut surface = HeadlessSurface::new(settings.lighting.clone());
    surface.set_background_color(settings.display.background_color);

    let step = settings.display.frame_step;
    let executor = AvatarExecutor::from_settings(settings, &mut surface)
        .await
        .context("Failed to load avatar")?;

    let scene = executor.scene();
    for _ in 0..FRAMES {
        animate_frame(&scene, &mut surface, step);
    }

    let state = executor.state().await;
    info!(
        "{} {} rendered {} frames, {} visible meshes",
        avatar_rust::APP_NAME,
        avatar_rust::VERSION,
        surface.frames_rendered(),
        surface.visible_meshes()
    );
    info!("Avatar: {}", serde_json::to_string(&state)?);
    Ok(())
}
