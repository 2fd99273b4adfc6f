//! Library side of the `thumb` binary: settings, image fetching and the
//! subcommands, kept out of `main.rs` so they can be tested.

pub mod commands;
pub mod fetch;
pub mod settings;

pub use fetch::{FetchError, Fetcher, Source};
pub use settings::{FontArg, Settings};

use std::path::PathBuf;
use thiserror::Error;
use thumb_core::StoreError;
use thumb_render::{ExportError, FontError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid thumbnail JSON in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot load font {}: {source}", path.display())]
    Font {
        path: PathBuf,
        #[source]
        source: FontError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
