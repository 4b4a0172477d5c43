//! Error types for annotation-processing runs.
//!
//! Covers the failure modes of one processing step: configuration,
//! toolchain discovery, dependency resolution, include patterns,
//! change scanning, compiler invocation, state-file encoding, and the
//! build-fatal wrapper raised by `AnnotationProcessor::execute`.

use thiserror::Error;

/// Errors that can occur while driving an annotation-processing run.
#[derive(Debug, Error)]
pub enum AptError {
    /// Processor configuration is missing or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No Java compiler could be located.
    #[error("{0}")]
    ToolchainMissing(String),

    /// The project model could not resolve classpath elements.
    #[error("Dependency resolution required: {0}")]
    DependencyResolution(String),

    /// An include pattern could not be turned into a path glob.
    #[error("Invalid include pattern '{pattern}': {reason}")]
    InvalidIncludePattern { pattern: String, reason: String },

    /// The change scanner failed to walk or record the source tree.
    #[error("Scan failed: {0}")]
    Scan(String),

    /// The compiler process could not be started or driven.
    #[error("Compiler invocation failed: {0}")]
    Compiler(String),

    /// A stamp or build record could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Build-fatal wrapper; carries the original error's message.
    #[error("{message}")]
    BuildFailed {
        message: String,
        #[source]
        cause: Box<AptError>,
    },
}

impl AptError {
    /// Wrap an error as build-fatal, keeping its message verbatim.
    pub fn build_failed(cause: AptError) -> Self {
        match cause {
            already @ AptError::BuildFailed { .. } => already,
            other => AptError::BuildFailed {
                message: other.to_string(),
                cause: Box::new(other),
            },
        }
    }

    /// The underlying error for a `BuildFailed`, or `self` otherwise.
    pub fn root_cause(&self) -> &AptError {
        match self {
            AptError::BuildFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Result type for annotation-processing operations.
pub type AptResult<T> = Result<T, AptError>;
