//! Polycall Probe
//!
//! Builds an [`Engine`] from a [`Manifest`] and reports how each query
//! resolves. Every candidate, when invoked, returns its own signature as a
//! string so that the reported value shows which implementation ran.

pub mod manifest;

use polycall::{
    CandidateDescriptor, CandidateSource, Engine, EngineConfig, EngineStats, LoadReport, ModuleId,
    RegistrationError, ResolutionOutcome, TypeRef, TypeTable, Value,
};
use serde::Serialize;
use tracing::{debug, info};

pub use manifest::{CandidateDecl, DeclKind, Manifest, ManifestError, ModuleDecl, Query, TypeDecl, NULL};

/// Runtime type of the values candidates return.
const LABEL_TYPE: &str = "probe.label";

/// An engine populated from a manifest.
pub struct Probe {
    pub engine: Engine,
    pub load: LoadReport,
}

/// How one query resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryReport {
    /// The call, e.g. `area(Bar, null)`.
    pub call: String,
    /// `matched`, `unmatched` or `ambiguous`.
    pub outcome: &'static str,
    /// Winner, or the tied candidates, by signature.
    pub candidates: Vec<String>,
    /// Why nothing matched, when unmatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Return value of the invoked candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Full probe output.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub modules_loaded: usize,
    pub candidates_accepted: usize,
    pub diagnostics: Vec<String>,
    pub queries: Vec<QueryReport>,
}

/// A manifest module as a candidate source.
struct ManifestModule<'m> {
    decl: &'m ModuleDecl,
    label: TypeRef,
}

impl CandidateSource for ManifestModule<'_> {
    fn module_id(&self) -> ModuleId {
        ModuleId::named(&self.decl.name)
    }

    fn extract(&self, types: &TypeTable) -> Result<Vec<CandidateDescriptor>, RegistrationError> {
        let lookup = |name: &str| {
            types.get(name).ok_or_else(|| {
                RegistrationError::extraction(
                    self.module_id(),
                    format!("module `{}` uses undeclared type `{}`", self.decl.name, name),
                )
            })
        };

        self.decl
            .candidates
            .iter()
            .map(|c| {
                let params = c
                    .params
                    .iter()
                    .map(|p| lookup(p.as_str()))
                    .collect::<Result<Vec<_>, _>>()?;
                let label = self.label.clone();
                let signature = format!("{}({}{})", c.operation, c.subject, params_suffix(&c.params));
                Ok(CandidateDescriptor::builder(c.operation.as_str(), lookup(c.subject.as_str())?)
                    .params(params)
                    .build(move |_, _| Ok(Value::new(label.clone(), signature.clone()))))
            })
            .collect()
    }
}

fn params_suffix(params: &[String]) -> String {
    params.iter().map(|p| format!(", {}", p)).collect()
}

/// Declare every manifest type in order.
pub fn declare_types(types: &TypeTable, decls: &[TypeDecl]) -> Result<(), ManifestError> {
    for decl in decls {
        let lookup = |missing: &str| {
            types.get(missing).ok_or_else(|| ManifestError::UnknownType {
                name: decl.name.clone(),
                missing: missing.to_string(),
            })
        };
        let interfaces = decl
            .interfaces
            .iter()
            .map(|i| lookup(i.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let declared = match decl.kind {
            DeclKind::Class => {
                let parent = decl.parent.as_deref().map(lookup).transpose()?;
                types.declare_class(&decl.name, parent.as_ref(), &interfaces)
            }
            DeclKind::Interface => types.declare_interface(&decl.name, &interfaces),
            DeclKind::Value => types.declare_value(&decl.name, &interfaces),
        };
        declared.map_err(|source| ManifestError::Declare {
            name: decl.name.clone(),
            source,
        })?;
        debug!(name = %decl.name, kind = ?decl.kind, "declared type");
    }
    Ok(())
}

impl Probe {
    /// Build an engine from `manifest`, using `config` in place of the
    /// manifest's `[engine]` table when given.
    pub fn build(manifest: &Manifest, config: Option<EngineConfig>) -> Result<Self, ManifestError> {
        let engine = Engine::with_config(config.unwrap_or_else(|| manifest.engine.clone()));
        declare_types(engine.types(), &manifest.types)?;
        let label = engine
            .types()
            .declare_class(LABEL_TYPE, None, &[])
            .map_err(|source| ManifestError::Declare {
                name: LABEL_TYPE.to_string(),
                source,
            })?;

        let modules: Vec<ManifestModule<'_>> = manifest
            .modules
            .iter()
            .map(|decl| ManifestModule {
                decl,
                label: label.clone(),
            })
            .collect();
        let load = engine.load_all(modules.iter().map(|m| m as &dyn CandidateSource));
        info!(
            modules = engine.stats().modules,
            candidates = load.accepted(),
            "manifest loaded"
        );

        Ok(Self { engine, load })
    }

    /// Resolve and invoke one query.
    pub fn run_query(&self, query: &Query) -> anyhow::Result<QueryReport> {
        let subject = self.value_of(&query.subject)?;
        let args = query
            .args
            .iter()
            .map(|a| self.value_of(a))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let invoked = self.engine.invoke(&query.operation, subject.as_ref(), &args)?;
        let (outcome, candidates, reason) = match &invoked.outcome {
            ResolutionOutcome::Matched(c) => ("matched", vec![c.signature()], None),
            ResolutionOutcome::Unmatched(r) => ("unmatched", Vec::new(), Some(r.to_string())),
            ResolutionOutcome::Ambiguous(cs) => {
                ("ambiguous", cs.iter().map(|c| c.signature()).collect(), None)
            }
        };

        Ok(QueryReport {
            call: format!("{}({}{})", query.operation, query.subject, params_suffix(&query.args)),
            outcome,
            candidates,
            reason,
            value: invoked
                .value
                .and_then(|v| v.downcast_ref::<String>().cloned()),
        })
    }

    /// Run every query in order.
    pub fn run(&self, queries: &[Query]) -> anyhow::Result<ProbeReport> {
        let queries = queries
            .iter()
            .map(|q| self.run_query(q))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(ProbeReport {
            modules_loaded: self.engine.stats().modules,
            candidates_accepted: self.load.accepted(),
            diagnostics: self.load.diagnostics().iter().map(|d| d.to_string()).collect(),
            queries,
        })
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    fn value_of(&self, name: &str) -> anyhow::Result<Option<Value>> {
        if name == NULL {
            return Ok(None);
        }
        let ty = self
            .engine
            .types()
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("query uses undeclared type `{}`", name))?;
        Ok(Some(Value::new(ty, ())))
    }
}
