//! Type compatibility between a runtime argument and a declared parameter.

use crate::types::TypeRef;

/// How closely a runtime type matches a declared parameter type.
///
/// Lower tiers are more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Runtime type equals the declared type.
    Exact = 0,
    /// Declared type is a strict class ancestor.
    Ancestor = 1,
    /// Declared type is an interface the runtime type implements.
    Interface = 2,
    /// Declared type is the universal type.
    Any = 3,
}

/// Verdict for one (argument, parameter) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compatibility {
    Incompatible,
    Tier(Tier),
    /// Null argument against a reference parameter: accepted, but carries no
    /// specificity information.
    NullWildcard,
}

impl Compatibility {
    pub fn is_compatible(self) -> bool {
        self != Compatibility::Incompatible
    }

    pub fn tier(self) -> Option<Tier> {
        match self {
            Compatibility::Tier(t) => Some(t),
            _ => None,
        }
    }
}

/// Classify a runtime type (`None` for a null argument) against a declared
/// parameter type.
///
/// A runtime type from another [`crate::TypeTable`] only matches a declared
/// universal type.
pub fn classify(runtime: Option<&TypeRef>, declared: &TypeRef) -> Compatibility {
    let Some(runtime) = runtime else {
        return if declared.is_value_type() {
            Compatibility::Incompatible
        } else {
            Compatibility::NullWildcard
        };
    };

    if runtime == declared {
        Compatibility::Tier(Tier::Exact)
    } else if declared.is_any() {
        Compatibility::Tier(Tier::Any)
    } else if runtime.has_ancestor(declared.id()) {
        Compatibility::Tier(Tier::Ancestor)
    } else if declared.is_interface() && runtime.implements(declared.id()) {
        Compatibility::Tier(Tier::Interface)
    } else {
        Compatibility::Incompatible
    }
}
