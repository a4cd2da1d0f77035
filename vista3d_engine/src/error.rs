//! Error types for the Vista3D engine
//!
//! Only context creation failures travel up to the application. Every other
//! degraded state (missing extension, pending resource, unknown uniform,
//! degenerate math) is reported through the logger and a readiness flag.

use std::fmt;

/// Result type for Vista3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Vista3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (GL, GLES, WebGL driver message)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, mesh, shader, framebuffer)
    InvalidResource(String),

    /// Initialization failed (context, subsystems)
    InitializationFailed(String),

    /// The platform cannot produce a usable graphics surface
    GraphicsUnsupported(String),

    /// Operation rejected by the engine state (duplicate name, wrong capability)
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::GraphicsUnsupported(msg) => write!(f, "Graphics unsupported: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::InvalidOperation` from it
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("vista3d::TargetManager", "RenderTarget '{}' not found", name);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::vista3d::Error::InvalidOperation(message)
    }};
}

/// Log an ERROR message and return early with an `Error::InvalidOperation`
///
/// # Example
///
/// ```ignore
/// engine_bail!("vista3d::TargetManager", "RenderTarget '{}' already exists", name);
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
