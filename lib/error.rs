//! Error types for lovepack.

use std::path::PathBuf;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result type for lovepack operations.
pub type BundleResult<T> = Result<T, BundleError>;

/// Error type for lovepack operations.
#[derive(Debug, Error)]
pub enum BundleError {
    /// package.json missing from the project directory.
    #[error("package.json not found in {0}")]
    ProjectNotFound(PathBuf),

    /// package.json present but unusable.
    #[error("Invalid project manifest: {0}")]
    InvalidProject(String),

    /// lovepack.toml present but unusable.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// TypeScript source failed to parse.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Deploy root could not be resolved for this platform.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Deploy root would clear or overwrite the project itself.
    #[error("Unsafe deploy root {root}: {reason}")]
    UnsafeDeployRoot { root: PathBuf, reason: String },

    /// The external compiler could not be started.
    #[error("Failed to spawn compiler `{program}`: {source}")]
    CompilerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external compiler exited unsuccessfully.
    #[error("Compiler failed for {file} with {status}")]
    CompilerFailed {
        /// Auxiliary script being compiled.
        file: String,
        /// Exit status description.
        status: String,
        /// Captured stderr (may be empty).
        stderr: String,
    },

    /// The external compiler did not finish (or produce output) in time.
    #[error("Compiler timed out after {secs}s for {file}")]
    CompilerTimedOut { file: String, secs: u64 },

    /// Compiler output vanished before it could be deployed.
    #[error("Compiler output {path} missing for {file}")]
    CompilerOutputMissing { file: String, path: PathBuf },

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Include pattern error.
    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Walkdir error.
    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path strip error.
    #[error("Path error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl BundleError {
    /// Returns true for the timeout kind (distinct from other compiler failures).
    pub fn is_timeout(&self) -> bool {
        matches!(self, BundleError::CompilerTimedOut { .. })
    }
}
