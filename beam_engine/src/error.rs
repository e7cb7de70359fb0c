//! Error types for the Beam engine
//!
//! This module defines the error types used throughout the engine,
//! including device access, schema validation, shader building and
//! resource management.
//!
//! Most anomalies met while drawing are *not* errors: they are logged and
//! skipped so a frame still renders. Only the cases below surface to callers.

use std::fmt;
use crate::graphics_device::ShaderStage;

/// Result type for Beam engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Beam engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (GL driver, lock poisoning, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown key, mismatched kind, destroyed object, etc.)
    InvalidResource(String),

    /// Initialization failed (context acquisition, surface)
    InitializationFailed(String),

    /// Schema declaration rejected (duplicate key, wrong type for category)
    InvalidSchema(String),

    /// A shader stage failed to compile
    ShaderCompilation {
        /// Stage that failed
        stage: ShaderStage,
        /// Driver info log
        log: String,
    },

    /// The program failed to link (driver info log)
    ProgramLink(String),

    /// Draw requested with a shader whose program never linked
    ShaderUnavailable,

    /// `run` called with a command name that was never defined
    UnknownCommand(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidSchema(msg) => write!(f, "Invalid schema: {}", msg),
            Error::ShaderCompilation { stage, log } => {
                write!(f, "Error compiling {:?} shader: {}", stage, log)
            }
            Error::ProgramLink(log) => write!(f, "Error linking program: {}", log),
            Error::ShaderUnavailable => write!(f, "Shader has no linked program"),
            Error::UnknownCommand(name) => write!(f, "Unknown command: {}", name),
        }
    }
}

impl std::error::Error for Error {}

/// Build an [`Error`] variant carrying a formatted message, logging it at
/// ERROR level with file:line on the way out.
///
/// # Example
///
/// ```no_run
/// # use beam_engine::engine_err;
/// let err = engine_err!("beam::VertexBuffers", InvalidResource, "unknown key '{}'", "pos");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $kind:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::beam::Error::$kind(message)
    }};
}

/// Log and return early with an [`Error`] variant (see [`engine_err!`]).
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $kind:ident, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $kind, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
