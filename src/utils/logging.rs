use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};
use std::env;
use std::fs;
use std::io;
use std::path::Path;

const LOG_FILE: &str = "avatar.log";

/// Initialize logging for the avatar viewer.
///
/// Console output is always enabled. When `AVATAR_LOG_FILE=1` a session log is
/// written to `avatar.log` in the working directory (truncated on startup).
pub fn init_logging() {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let enable_file_logging = env::var("AVATAR_LOG_FILE").unwrap_or_else(|_| "0".to_string()) == "1";
    let enable_backtrace = env::var("RUST_BACKTRACE").unwrap_or_else(|_| "0".to_string()) == "1";

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let mut filter = EnvFilter::new(&log_level);
            if let Ok(directive) = "avatar_rust=debug".parse() {
                filter = filter.add_directive(directive);
            }
            filter
        });

    let file_layer = if enable_file_logging {
        match open_session_log(Path::new(LOG_FILE)) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .boxed(),
            ),
            Err(e) => {
                eprintln!("Warning: Failed to create {}: {}", LOG_FILE, e);
                None
            }
        }
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
        )
        .with(file_layer);

    // Tests and embedders may have installed a subscriber already.
    if subscriber.try_init().is_err() {
        return;
    }

    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("Panic occurred: {}", panic_info);

        if let Some(location) = panic_info.location() {
            tracing::error!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }

        if enable_backtrace {
            tracing::error!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
        }
    }));

    tracing::info!("Logging initialized with level: {}", log_level);
    tracing::info!("File logging enabled: {}", enable_file_logging);
    tracing::info!("Backtrace enabled: {}", enable_backtrace);
}

fn open_session_log(path: &Path) -> io::Result<fs::File> {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            return Err(e);
        }
    }
    fs::File::create(path)
}

/// Log the asset configuration the session was started with
pub fn log_session_info(asset_root: &Path) {
    tracing::info!("=== Avatar Session ===");
    tracing::info!("OS: {}", std::env::consts::OS);
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Asset root: {}", asset_root.display());
    tracing::info!("======================");
}
