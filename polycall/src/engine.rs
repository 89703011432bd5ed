//! The dispatch engine facade.
//!
//! Ties the type table, module registry, candidate index and resolution
//! cache together behind two entry points used by the rest of a host
//! application: registering modules and invoking operations by name.
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌────────────┐
//! │ModuleRegistry│──►│ CandidateIndex │──►│ Dispatcher │
//! └──────────────┘   └────────────────┘   └─────▲──────┘
//!                                               │ on miss
//!                    ┌────────────────┐         │
//!  resolve/invoke ──►│ResolutionCache │─────────┘
//!                    └────────────────┘
//! ```
//!
//! Cached outcomes are not revisited when modules are registered later, so a
//! late module that adds a more specific candidate only affects keys that
//! were not resolved before it arrived.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dispatch::{
    CacheStats, CandidateDescriptor, Dispatcher, ResolutionCache, ResolutionKey, ResolutionOutcome,
    UnmatchedReason,
};
use crate::registry::{CandidateSource, LoadReport, ModuleId, ModuleRegistry, RegistrationResult};
use crate::types::{TypeRef, TypeTable};
use crate::value::Value;

/// Result of [`Engine::invoke`].
#[derive(Debug, Clone)]
pub struct Invoked {
    pub outcome: ResolutionOutcome,
    /// The candidate's return value; `None` unless the outcome is matched.
    pub value: Option<Value>,
}

/// Statistics about an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub types: usize,
    pub modules: usize,
    pub candidates: usize,
    pub cache: CacheStats,
}

/// A dispatch engine.
///
/// Construct one per isolated universe with [`Engine::new`]; hosts that want
/// a single shared instance use [`Engine::global`].
pub struct Engine {
    types: TypeTable,
    registry: ModuleRegistry,
    cache: ResolutionCache,
    config: EngineConfig,
}

static GLOBAL: OnceLock<Engine> = OnceLock::new();

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            types: TypeTable::new(),
            registry: ModuleRegistry::new(),
            cache: ResolutionCache::new(config.cache.clone()),
            config,
        }
    }

    /// The process-wide engine, created with default configuration on first use.
    pub fn global() -> &'static Engine {
        GLOBAL.get_or_init(Engine::new)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a batch of candidates extracted from one module.
    pub fn register_module(
        &self,
        module: ModuleId,
        descriptors: Vec<CandidateDescriptor>,
    ) -> RegistrationResult {
        self.registry.register(module, descriptors)
    }

    /// Extract and register a single source.
    pub fn register_source(&self, source: &dyn CandidateSource) -> RegistrationResult {
        let module = source.module_id();
        if self.registry.is_registered(&module) {
            return RegistrationResult::AlreadyRegistered;
        }
        self.registry
            .register_extracted(module, source.extract(&self.types))
    }

    /// Register every source, continuing past failures.
    pub fn load_all<'s>(
        &self,
        sources: impl IntoIterator<Item = &'s dyn CandidateSource>,
    ) -> LoadReport {
        let mut report = LoadReport::default();
        for source in sources {
            let result = self.register_source(source);
            report.results.push((source.module_id(), result));
        }
        let failed = report.failed().count();
        if failed > 0 {
            warn!(failed, "some modules could not be loaded");
        }
        report
    }

    /// Resolve `operation` against a subject and arguments. `None` is null.
    pub fn resolve(
        &self,
        operation: &str,
        subject: Option<&Value>,
        args: &[Option<Value>],
    ) -> ResolutionOutcome {
        let arg_types: Vec<Option<&TypeRef>> =
            args.iter().map(|a| a.as_ref().map(Value::type_ref)).collect();
        self.resolve_types(operation, subject.map(Value::type_ref), &arg_types)
    }

    /// Resolve from runtime type markers alone.
    pub fn resolve_types(
        &self,
        operation: &str,
        subject: Option<&TypeRef>,
        args: &[Option<&TypeRef>],
    ) -> ResolutionOutcome {
        if subject.is_none() {
            return ResolutionOutcome::Unmatched(UnmatchedReason::NullSubject);
        }

        let key = ResolutionKey::new(operation, subject, args);
        self.cache.get_or_resolve(key, || {
            let outcome = Dispatcher::new(self.registry.index()).resolve(operation, subject, args);
            debug!(operation, %outcome, "resolved");
            if self.config.log_ambiguity && outcome.is_ambiguous() {
                warn!(operation, %outcome, "ambiguous dispatch");
            }
            outcome
        })
    }

    /// Resolve and, on a match, call the winning candidate.
    ///
    /// No applicable operation is not an error: the returned value is `None`.
    /// Errors raised by the candidate itself are passed through unchanged.
    pub fn invoke(
        &self,
        operation: &str,
        subject: Option<&Value>,
        args: &[Option<Value>],
    ) -> anyhow::Result<Invoked> {
        let outcome = self.resolve(operation, subject, args);
        let value = match (&outcome, subject) {
            (ResolutionOutcome::Matched(candidate), Some(subject)) => {
                Some(candidate.invoke(subject, args)?)
            }
            _ => None,
        };
        Ok(Invoked { outcome, value })
    }

    /// Like [`Engine::invoke`], keeping only the value.
    pub fn try_invoke(
        &self,
        operation: &str,
        subject: Option<&Value>,
        args: &[Option<Value>],
    ) -> anyhow::Result<Option<Value>> {
        Ok(self.invoke(operation, subject, args)?.value)
    }

    /// Whether a unique candidate applies to these arguments.
    pub fn has_operation(
        &self,
        operation: &str,
        subject: Option<&Value>,
        args: &[Option<Value>],
    ) -> bool {
        self.resolve(operation, subject, args).is_matched()
    }

    /// Every registered candidate for `operation`, all arities.
    pub fn candidates(&self, operation: &str) -> Vec<Arc<CandidateDescriptor>> {
        self.registry.index().candidates_named(operation)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            types: self.types.len(),
            modules: self.registry.module_count(),
            candidates: self.registry.index().len(),
            cache: self.cache.stats(),
        }
    }

    /// Forget all modules, candidates and cached outcomes. Declared types
    /// are kept. Intended for test harnesses.
    pub fn reset(&self) {
        // Registry first: a resolve that read the index before this point
        // started before the cache epoch moves, so its outcome is dropped.
        self.registry.clear();
        self.cache.clear();
        info!("dispatch registry reset");
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("stats", &self.stats())
            .field("config", &self.config)
            .finish()
    }
}
