//! Error types.
//!
//! Resolution itself never fails; "no operation available" is reported
//! through [`crate::ResolutionOutcome`]. The errors here cover type
//! declaration, module registration and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::ModuleId;

/// Errors raised while declaring types in a [`crate::TypeTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("type name must not be empty")]
    EmptyName,

    #[error("type `{0}` is already declared with a different shape")]
    Conflict(String),

    #[error("type `{name}` cannot derive from `{base}`: {reason}")]
    InvalidBase {
        name: String,
        base: String,
        reason: &'static str,
    },
}

/// Diagnostics produced while registering a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The module could not be introspected; it contributes no candidates.
    #[error("module {module} could not be loaded: {message}")]
    Extraction { module: ModuleId, message: String },

    /// A single descriptor was rejected; the rest of the batch still counts.
    #[error("candidate `{signature}` rejected: {reason}")]
    Rejected { signature: String, reason: String },
}

impl RegistrationError {
    /// Convenience constructor for extractors reporting an upstream failure.
    pub fn extraction(module: ModuleId, message: impl Into<String>) -> Self {
        Self::Extraction {
            module,
            message: message.into(),
        }
    }
}

/// Errors loading an [`crate::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
