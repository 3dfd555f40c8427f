use std::path::PathBuf;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures that abort processing of a single file.
///
/// Recoverable conditions (unbalanced class braces, no inject fields) never
/// surface here; they resolve to a skip inside the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("class {class} has parameter '{name}' more than once after merging")]
    NameCollision { class: String, name: String },
    #[error("class {class} declares more than one constructor (lines {first} and {second})")]
    AmbiguousConstructor {
        class: String,
        first: usize,
        second: usize,
    },
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
