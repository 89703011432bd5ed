//! Dispatch resolution over runtime argument types.
//!
//! 1. **Null subject**: nothing to dispatch on, unmatched
//! 2. **Collect candidates**: same name, arity = 1 + number of arguments
//! 3. **Filter applicable**: classify every position, drop incompatible
//! 4. **Select best**: the candidate that Pareto-dominates every other
//!    survivor wins; otherwise the call is ambiguous
//!
//! Null arguments never discriminate between candidates. When every
//! differentiating position is null the result is ambiguous even if one
//! candidate declares more specific types there.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::trace;

use super::candidate::CandidateDescriptor;
use super::classify::{classify, Compatibility};
use super::index::CandidateIndex;
use super::result::{ResolutionOutcome, UnmatchedReason};
use crate::types::TypeRef;

/// A viable candidate together with its per-position classification.
#[derive(Debug, Clone)]
pub struct Applicable {
    pub candidate: Arc<CandidateDescriptor>,
    /// Position 0 is the subject.
    pub positions: Vec<Compatibility>,
}

/// Resolution context over a candidate index.
pub struct Dispatcher<'a> {
    index: &'a CandidateIndex,
}

impl<'a> Dispatcher<'a> {
    pub fn new(index: &'a CandidateIndex) -> Self {
        Self { index }
    }

    /// Resolve `operation` for a subject type and argument types, where
    /// `None` stands for a null value.
    pub fn resolve(
        &self,
        operation: &str,
        subject: Option<&TypeRef>,
        args: &[Option<&TypeRef>],
    ) -> ResolutionOutcome {
        let Some(subject) = subject else {
            return ResolutionOutcome::Unmatched(UnmatchedReason::NullSubject);
        };

        let candidates = self.index.candidates_for(operation, 1 + args.len());
        if candidates.is_empty() {
            return ResolutionOutcome::Unmatched(UnmatchedReason::NoCandidates);
        }

        let applicable: Vec<Applicable> = candidates
            .iter()
            .filter_map(|c| self.applicability(c, subject, args))
            .collect();

        match applicable.len() {
            0 => ResolutionOutcome::Unmatched(UnmatchedReason::NoneApplicable),
            1 => ResolutionOutcome::Matched(applicable[0].candidate.clone()),
            _ => self.select(applicable),
        }
    }

    /// Classify every position of `candidate`, or `None` if any position is
    /// incompatible.
    pub fn applicability(
        &self,
        candidate: &Arc<CandidateDescriptor>,
        subject: &TypeRef,
        args: &[Option<&TypeRef>],
    ) -> Option<Applicable> {
        if candidate.arity() != 1 + args.len() {
            return None;
        }

        let mut positions = Vec::with_capacity(candidate.arity());
        let runtime = std::iter::once(Some(subject)).chain(args.iter().copied());
        let declared = std::iter::once(candidate.subject_type()).chain(candidate.param_types());
        for (i, (arg, param)) in runtime.zip(declared).enumerate() {
            let verdict = classify(arg, param);
            if !verdict.is_compatible() {
                trace!(candidate = %candidate, position = i, "eliminated");
                return None;
            }
            positions.push(verdict);
        }

        Some(Applicable {
            candidate: candidate.clone(),
            positions,
        })
    }

    fn select(&self, applicable: Vec<Applicable>) -> ResolutionOutcome {
        let winner = applicable.iter().position(|a| {
            applicable
                .iter()
                .all(|b| std::ptr::eq(a, b) || dominates(a, b))
        });
        if let Some(i) = winner {
            return ResolutionOutcome::Matched(applicable[i].candidate.clone());
        }

        let mut maximal = find_maximal(&applicable);
        maximal.sort_by_key(|c| c.signature());
        ResolutionOutcome::Ambiguous(maximal)
    }
}

/// Survivors that no other survivor dominates.
fn find_maximal(applicable: &[Applicable]) -> Vec<Arc<CandidateDescriptor>> {
    applicable
        .iter()
        .filter(|a| {
            !applicable
                .iter()
                .any(|other| !std::ptr::eq(*a, other) && dominates(other, a))
        })
        .map(|a| a.candidate.clone())
        .collect()
}

/// Whether `a` Pareto-dominates `b`: at least as specific at every position
/// where both have a tier, strictly more specific at one of them.
pub fn dominates(a: &Applicable, b: &Applicable) -> bool {
    compare_specificity(a, b) == Some(Ordering::Less)
}

/// Compare two viable candidates position by position.
///
/// Returns `Less` if `a` dominates, `Greater` if `b` dominates, `Equal` if
/// they tie everywhere and `None` if they are incomparable. Positions where
/// either side is a null wildcard are skipped.
pub fn compare_specificity(a: &Applicable, b: &Applicable) -> Option<Ordering> {
    let mut a_better = false;
    let mut b_better = false;

    for (pa, pb) in a.positions.iter().zip(&b.positions) {
        let (Some(ta), Some(tb)) = (pa.tier(), pb.tier()) else {
            continue;
        };
        match ta.cmp(&tb) {
            Ordering::Less => a_better = true,
            Ordering::Greater => b_better = true,
            Ordering::Equal => {}
        }
    }

    match (a_better, b_better) {
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        (false, false) => Some(Ordering::Equal),
        (true, true) => None,
    }
}
