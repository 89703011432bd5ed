//! Candidate implementations.

use std::fmt;
use std::sync::Arc;

use crate::types::TypeRef;
use crate::value::Value;

/// Callable body of a candidate, invoked as `(subject, args)`.
pub type InvokeFn = dyn Fn(&Value, &[Option<Value>]) -> anyhow::Result<Value> + Send + Sync;

/// One registered implementation of an operation.
///
/// Immutable once built. `arity` always counts the subject plus every
/// declared parameter.
#[derive(Clone)]
pub struct CandidateDescriptor {
    operation: Arc<str>,
    subject_type: TypeRef,
    param_types: Vec<TypeRef>,
    invoke: Arc<InvokeFn>,
}

impl CandidateDescriptor {
    /// Start building a candidate for `operation` dispatching on `subject_type`.
    pub fn builder(operation: impl Into<Arc<str>>, subject_type: TypeRef) -> CandidateBuilder {
        CandidateBuilder {
            operation: operation.into(),
            subject_type,
            param_types: Vec::new(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub(crate) fn operation_key(&self) -> &Arc<str> {
        &self.operation
    }

    pub fn subject_type(&self) -> &TypeRef {
        &self.subject_type
    }

    /// Declared types of the parameters after the subject.
    pub fn param_types(&self) -> &[TypeRef] {
        &self.param_types
    }

    pub fn arity(&self) -> usize {
        1 + self.param_types.len()
    }

    /// Declared type at `position`, where position 0 is the subject.
    pub fn declared_at(&self, position: usize) -> Option<&TypeRef> {
        match position {
            0 => Some(&self.subject_type),
            n => self.param_types.get(n - 1),
        }
    }

    /// Whether two candidates have the same name and declared types.
    pub fn same_signature(&self, other: &CandidateDescriptor) -> bool {
        self.operation == other.operation
            && self.subject_type == other.subject_type
            && self.param_types == other.param_types
    }

    /// Human-readable signature, e.g. `area(Bar, object, Panel, object)`.
    pub fn signature(&self) -> String {
        self.to_string()
    }

    pub fn invoke(&self, subject: &Value, args: &[Option<Value>]) -> anyhow::Result<Value> {
        (self.invoke)(subject, args)
    }
}

impl fmt::Display for CandidateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.operation, self.subject_type)?;
        for ty in &self.param_types {
            write!(f, ", {}", ty)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for CandidateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Candidate({})", self)
    }
}

/// Builder for [`CandidateDescriptor`].
pub struct CandidateBuilder {
    operation: Arc<str>,
    subject_type: TypeRef,
    param_types: Vec<TypeRef>,
}

impl CandidateBuilder {
    /// Append one declared parameter type.
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.param_types.push(ty);
        self
    }

    /// Append several declared parameter types.
    pub fn params(mut self, tys: impl IntoIterator<Item = TypeRef>) -> Self {
        self.param_types.extend(tys);
        self
    }

    pub fn build<F>(self, invoke: F) -> CandidateDescriptor
    where
        F: Fn(&Value, &[Option<Value>]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        CandidateDescriptor {
            operation: self.operation,
            subject_type: self.subject_type,
            param_types: self.param_types,
            invoke: Arc::new(invoke),
        }
    }
}
