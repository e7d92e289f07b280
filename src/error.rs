// error.rs — Error type for the fallible setup paths (config, offsets, logging).
//
// The per-frame core never returns these: it degrades to sentinels instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("invalid offset literal {0:?}")]
    InvalidOffset(String),

    #[error("module {0} is not loaded")]
    ModuleNotLoaded(String),

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
