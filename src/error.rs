use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),

    #[error("invalid Spotify id: {0}")]
    InvalidId(#[from] rspotify::model::IdError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("prompt aborted: {0}")]
    Prompt(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}
