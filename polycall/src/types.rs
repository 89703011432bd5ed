//! Runtime type descriptions.
//!
//! Every type the engine can dispatch on is declared once in a [`TypeTable`]
//! and handed out as a shared [`TypeRef`]. Ancestor chains and the transitive
//! set of implemented interfaces are computed at declaration time, so the
//! compatibility checks performed on every call are plain set lookups.
//!
//! ```text
//! object (Any)
//!   ├── Bar            class
//!   ├── Panel          class  : IElement2D
//!   └── double         value type
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::TypeError;

/// Name of the universal type every table starts with.
pub const OBJECT: &str = "object";

/// Identifier of a declared type.
///
/// Carries the identity of the owning [`TypeTable`], so types declared in
/// different tables never compare equal even when they share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId {
    table: u32,
    index: u32,
}

impl TypeId {
    /// Position within the owning table, `object` is 0.
    pub fn index(self) -> u32 {
        self.index
    }
}

static NEXT_TABLE: AtomicU32 = AtomicU32::new(0);

/// Classification of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A concrete class or value type.
    Class,
    /// An interface; never the runtime type of a value in practice.
    Interface,
    /// The universal type, compatible with every runtime type.
    Any,
}

/// Immutable description of one declared type.
#[derive(Debug)]
pub struct TypeInfo {
    id: TypeId,
    name: Arc<str>,
    kind: TypeKind,
    value_type: bool,
    /// Strict class ancestors, nearest first.
    ancestors: Vec<TypeId>,
    /// Every interface implemented, directly or through ancestors and
    /// interface inheritance.
    interfaces: FxHashSet<TypeId>,
}

impl TypeInfo {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Value types can never hold a null runtime value.
    pub fn is_value_type(&self) -> bool {
        self.value_type
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_any(&self) -> bool {
        self.kind == TypeKind::Any
    }

    pub fn ancestors(&self) -> &[TypeId] {
        &self.ancestors
    }

    /// Whether `other` is a strict class ancestor of this type.
    pub fn has_ancestor(&self, other: TypeId) -> bool {
        self.ancestors.contains(&other)
    }

    /// Whether this type implements the interface `other`.
    pub fn implements(&self, other: TypeId) -> bool {
        self.interfaces.contains(&other)
    }
}

/// Shared handle to a declared type.
///
/// Equality and hashing only look at the [`TypeId`], so two handles obtained
/// from the same table for the same name always compare equal. Handles from
/// different tables are always distinct.
#[derive(Clone)]
pub struct TypeRef(Arc<TypeInfo>);

impl std::ops::Deref for TypeRef {
    type Target = TypeInfo;

    fn deref(&self) -> &TypeInfo {
        &self.0
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.name, self.0.id.index)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Registry of declared types.
///
/// Declarations only ever grow the table; a name, once declared, keeps its
/// [`TypeRef`] for the lifetime of the table.
pub struct TypeTable {
    table: u32,
    inner: RwLock<TableInner>,
}

struct TableInner {
    by_name: FxHashMap<Arc<str>, TypeRef>,
    next_id: u32,
}

/// Shape of a declaration, used to decide whether a re-declaration matches.
#[derive(PartialEq, Eq)]
struct Shape {
    kind: TypeKind,
    value_type: bool,
    parent: Option<TypeId>,
    interfaces: Vec<TypeId>,
}

impl TypeTable {
    /// Create a table containing only the universal `object` type.
    pub fn new() -> Self {
        let table = NEXT_TABLE.fetch_add(1, Ordering::Relaxed);
        let object = TypeRef(Arc::new(TypeInfo {
            id: TypeId { table, index: 0 },
            name: Arc::from(OBJECT),
            kind: TypeKind::Any,
            value_type: false,
            ancestors: Vec::new(),
            interfaces: FxHashSet::default(),
        }));
        let mut by_name = FxHashMap::default();
        by_name.insert(Arc::from(OBJECT), object);
        Self {
            table,
            inner: RwLock::new(TableInner { by_name, next_id: 1 }),
        }
    }

    /// The universal type.
    pub fn object(&self) -> TypeRef {
        self.inner.read().by_name[OBJECT].clone()
    }

    /// Look up a declared type by name.
    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.inner.read().by_name.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Declare a reference class with an optional parent class and a list of
    /// directly implemented interfaces.
    pub fn declare_class(
        &self,
        name: &str,
        parent: Option<&TypeRef>,
        interfaces: &[TypeRef],
    ) -> Result<TypeRef, TypeError> {
        self.declare(name, TypeKind::Class, false, parent, interfaces)
    }

    /// Declare a value type (e.g. `double`). Value types have no parent class
    /// and reject null arguments.
    pub fn declare_value(&self, name: &str, interfaces: &[TypeRef]) -> Result<TypeRef, TypeError> {
        self.declare(name, TypeKind::Class, true, None, interfaces)
    }

    /// Declare an interface extending zero or more other interfaces.
    pub fn declare_interface(&self, name: &str, extends: &[TypeRef]) -> Result<TypeRef, TypeError> {
        self.declare(name, TypeKind::Interface, false, None, extends)
    }

    fn declare(
        &self,
        name: &str,
        kind: TypeKind,
        value_type: bool,
        parent: Option<&TypeRef>,
        bases: &[TypeRef],
    ) -> Result<TypeRef, TypeError> {
        if name.is_empty() {
            return Err(TypeError::EmptyName);
        }
        if let Some(parent) = parent {
            if parent.kind != TypeKind::Class || parent.value_type {
                return Err(TypeError::InvalidBase {
                    name: name.to_string(),
                    base: parent.name().to_string(),
                    reason: "parent must be a reference class",
                });
            }
        }
        if let Some(base) = bases.iter().find(|b| !b.is_interface()) {
            return Err(TypeError::InvalidBase {
                name: name.to_string(),
                base: base.name().to_string(),
                reason: "only interfaces can be implemented or extended",
            });
        }

        let mut ancestors = Vec::new();
        let mut interfaces = FxHashSet::default();
        if let Some(parent) = parent {
            ancestors.push(parent.id);
            ancestors.extend_from_slice(&parent.ancestors);
            interfaces.extend(parent.interfaces.iter().copied());
        }
        for base in bases {
            interfaces.insert(base.id);
            interfaces.extend(base.interfaces.iter().copied());
        }
        let shape = Shape {
            kind,
            value_type,
            parent: parent.map(|p| p.id),
            interfaces: sorted(&interfaces),
        };

        let mut inner = self.inner.write();
        if let Some(existing) = inner.by_name.get(name) {
            if existing.is_any() || shape_of(existing) != shape {
                return Err(TypeError::Conflict(name.to_string()));
            }
            return Ok(existing.clone());
        }

        let id = TypeId {
            table: self.table,
            index: inner.next_id,
        };
        inner.next_id += 1;
        let name: Arc<str> = Arc::from(name);
        let ty = TypeRef(Arc::new(TypeInfo {
            id,
            name: name.clone(),
            kind,
            value_type,
            ancestors,
            interfaces,
        }));
        inner.by_name.insert(name, ty.clone());
        Ok(ty)
    }
}

fn shape_of(ty: &TypeRef) -> Shape {
    Shape {
        kind: ty.kind,
        value_type: ty.value_type,
        parent: ty.ancestors.first().copied(),
        interfaces: sorted(&ty.interfaces),
    }
}

fn sorted(ids: &FxHashSet<TypeId>) -> Vec<TypeId> {
    let mut ids: Vec<TypeId> = ids.iter().copied().collect();
    ids.sort_unstable();
    ids
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTable").field("types", &self.len()).finish()
    }
}
