//! Resolution outcomes.

use std::fmt;
use std::sync::Arc;

use super::candidate::CandidateDescriptor;

/// Why a resolution produced no candidate at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnmatchedReason {
    /// The subject was null; there is no runtime type to dispatch on.
    NullSubject,
    /// Nothing is registered under this name and arity.
    NoCandidates,
    /// Candidates exist but none accepts the supplied argument types.
    NoneApplicable,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnmatchedReason::NullSubject => "subject is null",
            UnmatchedReason::NoCandidates => "no candidates registered",
            UnmatchedReason::NoneApplicable => "no candidate accepts these argument types",
        })
    }
}

/// Result of dispatch resolution.
///
/// `Unmatched` and `Ambiguous` both mean "no operation available" to a
/// caller; they are kept apart for diagnostics.
#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    /// A unique most specific candidate was found.
    Matched(Arc<CandidateDescriptor>),
    /// No viable candidate.
    Unmatched(UnmatchedReason),
    /// Several viable candidates, none of which dominates the others.
    Ambiguous(Vec<Arc<CandidateDescriptor>>),
}

impl ResolutionOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, ResolutionOutcome::Matched(_))
    }

    pub fn is_unmatched(&self) -> bool {
        matches!(self, ResolutionOutcome::Unmatched(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolutionOutcome::Ambiguous(_))
    }

    /// The winning candidate, if any.
    pub fn matched(&self) -> Option<&Arc<CandidateDescriptor>> {
        match self {
            ResolutionOutcome::Matched(c) => Some(c),
            _ => None,
        }
    }

    /// Signature of the winner, handy in assertions and logs.
    pub fn matched_signature(&self) -> Option<String> {
        self.matched().map(|c| c.signature())
    }
}

/// Outcomes are equal when they name the same candidates (by identity).
impl PartialEq for ResolutionOutcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolutionOutcome::Matched(a), ResolutionOutcome::Matched(b)) => Arc::ptr_eq(a, b),
            (ResolutionOutcome::Unmatched(a), ResolutionOutcome::Unmatched(b)) => a == b,
            (ResolutionOutcome::Ambiguous(a), ResolutionOutcome::Ambiguous(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| Arc::ptr_eq(x, y)))
            }
            _ => false,
        }
    }
}

impl Eq for ResolutionOutcome {}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionOutcome::Matched(c) => write!(f, "matched {}", c),
            ResolutionOutcome::Unmatched(reason) => write!(f, "unmatched: {}", reason),
            ResolutionOutcome::Ambiguous(candidates) => {
                write!(f, "ambiguous between ")?;
                for (i, c) in candidates.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                Ok(())
            }
        }
    }
}
