//! Module system error types.

use std::path::PathBuf;

/// Errors that can occur during module resolution and loading.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The request name violated the input contract.
    #[error("invalid module name: {0:?}")]
    InvalidName(String),

    /// No candidate path resolved to an existing regular file.
    ///
    /// The message carries the name as the caller requested it; `tried`
    /// lists every candidate path that was checked.
    #[error("cannot load such file -- {name}")]
    NotFound { name: String, tried: Vec<PathBuf> },

    /// File I/O error while reading source or canonicalizing a path.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A loader collaborator failed.
    #[error("{0}")]
    Loader(String),
}
