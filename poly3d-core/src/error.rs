/// Error taxonomy for model loading, the run loop and per-frame rendering
use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single line of a model file was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("too few values for `{directive}`: expected at least {expected}, found {found}")]
    TooFewValues {
        directive: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("too many values for `{directive}`: expected at most {expected}, found {found}")]
    TooManyValues {
        directive: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("bad {field} value `{value}`")]
    InvalidNumber { field: &'static str, value: String },
    #[error("face references vertex {index} but only {count} vertices are declared")]
    VertexOutOfRange { index: usize, count: usize },
    #[error("color references face {index}, must be between 1 and {count}")]
    FaceOutOfRange { index: usize, count: usize },
}

/// A fatal model parse error carrying the 1-based source line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}: {text}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{0} not found")]
    NotFound(PathBuf),
    #[error("{path} can not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors raised when a model is assembled programmatically
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("vertex index {index} out of range (model has {count} vertices)")]
    VertexOutOfRange { index: usize, count: usize },
    #[error("face index {index} out of range (model has {count} faces)")]
    FaceOutOfRange { index: usize, count: usize },
}

/// Failures reported by the windowing/rendering collaborator
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("platform I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to initialize platform: {0}")]
    Init(String),
    #[error("failed to create surface: {0}")]
    Surface(String),
}

/// Fatal setup errors of the run loop
#[derive(Error, Debug)]
pub enum CanvasError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("failed to spawn tick thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A non-fatal failure while drawing or presenting a frame
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("render I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("{0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FontError {
    #[error("font source {0} not found")]
    MissingSource(PathBuf),
    #[error("fonts have been released")]
    Released,
}

/// Log a per-frame error with the caller's location and carry on
#[track_caller]
pub fn trap<E: std::fmt::Display>(result: Result<(), E>) {
    if let Err(err) = result {
        let location = Location::caller();
        log::error!(
            "trapped unexpected error from {}:{}: {}",
            location.file(),
            location.line(),
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_line() {
        let err = ParseError {
            line: 7,
            kind: ParseErrorKind::InvalidNumber {
                field: "y",
                value: "abc".to_string(),
            },
            text: "v 1 abc 3".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("line 7:"));
        assert!(message.contains("bad y value `abc`"));
    }

    #[test]
    fn test_trap_swallows_errors() {
        trap(Err::<(), _>(RenderError::Backend("dropped frame".to_string())));
        trap(Ok::<(), RenderError>(()));
    }
}
