use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the metadata reader, writer, and container.
///
/// A file that simply has no metadata chunk is not an error: reads return an
/// empty list in that case.
#[derive(Debug, Error)]
pub enum Error {
    /// `save_new` / `create_new` target is already occupied. Nothing was written.
    #[error("target file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// The PNG header could not be decoded, even after growing the read buffer once.
    #[error("malformed PNG header in {}: {source}", path.display())]
    MalformedHeader {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },

    /// The async read observed a cancellation request.
    #[error("metadata read cancelled")]
    Cancelled,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata chunk exists but its JSON blob could not be (de)serialized.
    #[error("invalid metadata blob in {}: {source}", path.display())]
    Blob {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The PNG chunk layout could not be parsed for splicing.
    #[error("failed to parse PNG chunks of {}: {source}", path.display())]
    Container {
        path: PathBuf,
        #[source]
        source: img_parts::Error,
    },

    /// PNG text keywords are 1 to 79 printable Latin-1 characters.
    #[error("invalid PNG text keyword {0:?}: expected 1-79 printable Latin-1 characters")]
    InvalidKeyword(String),

    #[error("cannot determine parent directory of {}", .0.display())]
    NoParent(PathBuf),

    #[error("failed to parse config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
