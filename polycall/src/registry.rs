//! Module registration.
//!
//! A module is one externally loaded unit of code that contributes a batch
//! of candidates. Modules are identified by a [`ModuleId`]; registering the
//! same id twice is a no-op. One broken module never prevents the others
//! from registering.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::dispatch::{CandidateDescriptor, CandidateIndex};
use crate::error::RegistrationError;
use crate::types::TypeTable;

/// Identity of a module.
///
/// A BLAKE3 digest, either of the module's name or of its content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId([u8; 32]);

impl ModuleId {
    /// Identity derived from a module name, e.g. `"Structure_Engine"`.
    pub fn named(name: &str) -> Self {
        Self::of(name.as_bytes())
    }

    /// Identity derived from arbitrary content bytes.
    pub fn of(content: &[u8]) -> Self {
        Self(*blake3::hash(content).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters.
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.short())
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.short())
    }
}

/// Outcome of one registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationResult {
    /// Every descriptor was accepted.
    Registered { accepted: usize },
    /// The id was registered before; nothing changed.
    AlreadyRegistered,
    /// Some descriptors were rejected; the rest were registered.
    PartiallyRegistered {
        accepted: usize,
        rejected: Vec<RegistrationError>,
    },
    /// The module could not be introspected and contributes nothing. The id
    /// stays unregistered so a later attempt may succeed.
    Failed(RegistrationError),
}

impl RegistrationResult {
    /// Number of candidates this call added to the index.
    pub fn accepted(&self) -> usize {
        match self {
            RegistrationResult::Registered { accepted }
            | RegistrationResult::PartiallyRegistered { accepted, .. } => *accepted,
            RegistrationResult::AlreadyRegistered | RegistrationResult::Failed(_) => 0,
        }
    }

    /// Diagnostics produced by this call.
    pub fn diagnostics(&self) -> Vec<RegistrationError> {
        match self {
            RegistrationResult::PartiallyRegistered { rejected, .. } => rejected.clone(),
            RegistrationResult::Failed(err) => vec![err.clone()],
            _ => Vec::new(),
        }
    }
}

/// A producer of candidates for one module.
pub trait CandidateSource {
    fn module_id(&self) -> ModuleId;

    /// Introspect the module. Declares any types it needs in `types`.
    fn extract(&self, types: &TypeTable) -> Result<Vec<CandidateDescriptor>, RegistrationError>;
}

/// Summary of loading several sources.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub results: Vec<(ModuleId, RegistrationResult)>,
}

impl LoadReport {
    pub fn accepted(&self) -> usize {
        self.results.iter().map(|(_, r)| r.accepted()).sum()
    }

    pub fn diagnostics(&self) -> Vec<RegistrationError> {
        self.results.iter().flat_map(|(_, r)| r.diagnostics()).collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ModuleId> {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, RegistrationResult::Failed(_)))
            .map(|(id, _)| id)
    }
}

/// Registered modules and the candidates they contributed.
pub struct ModuleRegistry {
    modules: Mutex<FxHashMap<ModuleId, Vec<Arc<CandidateDescriptor>>>>,
    index: CandidateIndex,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: Mutex::new(FxHashMap::default()),
            index: CandidateIndex::new(),
        }
    }

    pub fn index(&self) -> &CandidateIndex {
        &self.index
    }

    /// Register a module's descriptors.
    ///
    /// The id check and the index publication happen under one lock, so two
    /// threads registering the same id cannot both add candidates.
    pub fn register(
        &self,
        module: ModuleId,
        descriptors: Vec<CandidateDescriptor>,
    ) -> RegistrationResult {
        let mut modules = self.modules.lock();
        if modules.contains_key(&module) {
            debug!(%module, "module already registered");
            return RegistrationResult::AlreadyRegistered;
        }

        let mut accepted: Vec<Arc<CandidateDescriptor>> = Vec::with_capacity(descriptors.len());
        let mut rejected = Vec::new();
        for descriptor in descriptors {
            match validate(&descriptor, &accepted) {
                Ok(()) => accepted.push(Arc::new(descriptor)),
                Err(err) => {
                    warn!(%module, "{}", err);
                    rejected.push(err);
                }
            }
        }

        let count = accepted.len();
        self.index.add_all(accepted.iter().cloned());
        modules.insert(module, accepted);
        debug!(%module, accepted = count, rejected = rejected.len(), "module registered");

        if rejected.is_empty() {
            RegistrationResult::Registered { accepted: count }
        } else {
            RegistrationResult::PartiallyRegistered {
                accepted: count,
                rejected,
            }
        }
    }

    /// Register the outcome of an extraction that may have failed upstream.
    pub fn register_extracted(
        &self,
        module: ModuleId,
        extracted: Result<Vec<CandidateDescriptor>, RegistrationError>,
    ) -> RegistrationResult {
        match extracted {
            Ok(descriptors) => self.register(module, descriptors),
            Err(err) => {
                warn!(%module, "{}", err);
                RegistrationResult::Failed(err)
            }
        }
    }

    pub fn is_registered(&self, module: &ModuleId) -> bool {
        self.modules.lock().contains_key(module)
    }

    pub fn module_count(&self) -> usize {
        self.modules.lock().len()
    }

    /// Candidates contributed by `module`, if it is registered.
    pub fn module_candidates(&self, module: &ModuleId) -> Option<Vec<Arc<CandidateDescriptor>>> {
        self.modules.lock().get(module).cloned()
    }

    /// Forget every module and candidate.
    pub(crate) fn clear(&self) {
        let mut modules = self.modules.lock();
        modules.clear();
        self.index.clear();
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.module_count())
            .field("index", &self.index)
            .finish()
    }
}

fn validate(
    descriptor: &CandidateDescriptor,
    accepted: &[Arc<CandidateDescriptor>],
) -> Result<(), RegistrationError> {
    if descriptor.operation().trim().is_empty() {
        return Err(RegistrationError::Rejected {
            signature: descriptor.signature(),
            reason: "operation name is empty".to_string(),
        });
    }
    if accepted.iter().any(|a| a.same_signature(descriptor)) {
        return Err(RegistrationError::Rejected {
            signature: descriptor.signature(),
            reason: "duplicate signature within the module".to_string(),
        });
    }
    Ok(())
}
