//! Runtime multiple dispatch.
//!
//! `polycall` picks, among an open-ended and incrementally registered pool of
//! candidate implementations, the single one that best matches the runtime
//! types of a subject and its arguments, then optionally calls it.
//!
//! ```
//! use polycall::{CandidateDescriptor, Engine, ModuleId, Value};
//!
//! let engine = Engine::new();
//! let types = engine.types();
//! let double = types.declare_value("double", &[]).unwrap();
//! let bar = types.declare_class("Bar", None, &[]).unwrap();
//!
//! let d = double.clone();
//! let scale = CandidateDescriptor::builder("scale", bar.clone())
//!     .param(double.clone())
//!     .build(move |_, args| {
//!         let k = args[0].as_ref().and_then(|v| v.downcast_ref::<f64>()).copied();
//!         Ok(Value::new(d.clone(), k.unwrap_or(1.0) * 2.0))
//!     });
//! engine.register_module(ModuleId::named("geometry"), vec![scale]);
//!
//! let subject = Value::new(bar, ());
//! let out = engine
//!     .try_invoke("scale", Some(&subject), &[Some(Value::new(double, 4.0_f64))])
//!     .unwrap();
//! assert_eq!(out.and_then(|v| v.downcast_ref::<f64>().copied()), Some(8.0));
//! ```
//!
//! # Architecture
//!
//! - [`types`] - Declared types with precomputed ancestry
//! - [`value`] - Runtime values tagged with their type
//! - [`dispatch`] - Classification, candidate index, resolution and cache
//! - [`registry`] - Module registration
//! - [`engine`] - The facade tying it together
//! - [`config`] - Engine configuration

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod registry;
pub mod types;
pub mod value;

pub use config::{CacheConfig, EngineConfig};
pub use dispatch::{
    classify, CandidateDescriptor, Compatibility, ResolutionOutcome, Tier, UnmatchedReason,
};
pub use engine::{Engine, EngineStats, Invoked};
pub use error::{ConfigError, RegistrationError, TypeError};
pub use registry::{CandidateSource, LoadReport, ModuleId, ModuleRegistry, RegistrationResult};
pub use types::{TypeId, TypeKind, TypeRef, TypeTable};
pub use value::Value;
