// logging.rs — tracing subscriber setup for the injected library.
//
// GRANNY_OVERLAY_FILTER  filter directives, default "info"
// GRANNY_OVERLAY_LOG     append to this file instead of stderr
//
// The host may already have installed a global subscriber; in that case
// ours is silently not installed and events go to the host's.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub const FILTER_ENV: &str = "GRANNY_OVERLAY_FILTER";
pub const LOG_PATH_ENV: &str = "GRANNY_OVERLAY_LOG";

static INIT: Once = Once::new();

/// Install the subscriber. Safe to call more than once.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(tracing::Level::INFO.into())
            .with_env_var(FILTER_ENV)
            .from_env_lossy();

        if let Ok(path) = std::env::var(LOG_PATH_ENV) {
            if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(file)
                    .try_init();
                return;
            }
        }

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
