//! Probe Manifest
//!
//! A TOML description of a dispatch universe and the calls to try against it:
//!
//! ```toml
//! [engine]
//! log_ambiguity = false
//!
//! [[types]]
//! name = "Bar"
//! kind = "class"
//!
//! [[modules]]
//! name = "Structure_Engine"
//!
//! [[modules.candidates]]
//! operation = "area"
//! subject = "Bar"
//! params = ["double"]
//!
//! [[queries]]
//! operation = "area"
//! subject = "Bar"
//! args = ["null"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use polycall::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal used for a null subject or argument in queries.
pub const NULL: &str = "null";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("type `{name}` refers to undeclared type `{missing}`")]
    UnknownType { name: String, missing: String },

    #[error("cannot declare type `{name}`: {source}")]
    Declare {
        name: String,
        #[source]
        source: polycall::TypeError,
    },
}

/// Top-level manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub engine: EngineConfig,
    pub types: Vec<TypeDecl>,
    pub modules: Vec<ModuleDecl>,
    pub queries: Vec<Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    #[default]
    Class,
    Interface,
    Value,
}

/// A declared type. Types may only refer to types declared before them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: DeclKind,
    /// Parent class, classes only.
    #[serde(default)]
    pub parent: Option<String>,
    /// Implemented interfaces, or extended ones for an interface.
    #[serde(default)]
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    #[serde(default)]
    pub candidates: Vec<CandidateDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDecl {
    pub operation: String,
    pub subject: String,
    #[serde(default)]
    pub params: Vec<String>,
}

/// A call to resolve. Type names, or [`NULL`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub operation: String,
    pub subject: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Manifest {
    pub fn from_toml_str(s: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
