//! Dynamically typed runtime values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::TypeRef;

/// A runtime value tagged with the type it dispatches as.
///
/// Cloning is cheap; the payload is shared. Null is not a `Value`: call sites
/// express a missing argument as `None` in an `&[Option<Value>]`.
#[derive(Clone)]
pub struct Value {
    ty: TypeRef,
    data: Arc<dyn Any + Send + Sync>,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(ty: TypeRef, data: T) -> Self {
        Self {
            ty,
            data: Arc::new(data),
        }
    }

    /// The runtime type used for dispatch.
    pub fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.downcast_ref::<f64>() {
            return write!(f, "{}({})", self.ty, v);
        }
        if let Some(v) = self.downcast_ref::<String>() {
            return write!(f, "{}({:?})", self.ty, v);
        }
        write!(f, "{}(..)", self.ty)
    }
}
