//! Multiple dispatch over runtime types.
//!
//! Selects, among candidates registered under an operation name, the one
//! implementation that best matches the runtime types of a subject and its
//! arguments.
//!
//! # Module Structure
//!
//! - [`classify`] - Per-position compatibility tiers
//! - [`candidate`] - Candidate descriptors and their builder
//! - [`index`] - Append-only `(operation, arity)` candidate table
//! - [`resolver`] - Applicability filtering and Pareto selection
//! - [`result`] - Resolution outcomes
//! - [`cache`] - Memoized outcomes keyed by runtime type pattern

pub mod cache;
pub mod candidate;
pub mod classify;
pub mod index;
pub mod resolver;
pub mod result;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, ResolutionCache, ResolutionKey, TypeMarker};
pub use candidate::{CandidateBuilder, CandidateDescriptor, InvokeFn};
pub use classify::{classify, Compatibility, Tier};
pub use index::CandidateIndex;
pub use resolver::{compare_specificity, dominates, Applicable, Dispatcher};
pub use result::{ResolutionOutcome, UnmatchedReason};
