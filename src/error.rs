use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindgenError>;

#[derive(Error, Debug)]
pub enum BindgenError {
    #[error("header file does not exist: {}", .0.display())]
    HeaderNotFound(PathBuf),

    /// The AST front end could not be loaded. Only ever seen inside
    /// `parser::select_parser`, which falls back to the regex parser.
    #[error("AST parser unavailable: {0}")]
    ParseUnavailable(String),

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BindgenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BindgenError::Io {
            path: path.into(),
            source,
        }
    }
}
