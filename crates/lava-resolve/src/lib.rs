//! Hierarchy linking, generic inference and overload resolution.
//!
//! Everything stateful lives behind a [`session::Session`]: flattened
//! hierarchy views, inherited member tables and ancestor parameterizations
//! are built lazily per class and shared across threads. On top of that sit
//! [`infer::Inferrer`], which scores one candidate against one call shape,
//! and [`lookup::find_method`] / [`lookup::find_field`], which pick the
//! winner.

pub mod candidates;
pub mod generics;
pub mod hierarchy;
pub mod infer;
pub mod lookup;
pub mod session;

pub use candidates::{Candidate, CandidateSet};
pub use generics::{infer_generic, least_upper_bound, AncestorArgs};
pub use hierarchy::{common_ancestor, AncestorEntry, HierarchyView};
pub use infer::{
    Applicability, FilledArg, InferenceError, InferenceErrorKind, InferenceResult, Inferrer,
    LEVEL_DEPTH, VARARGS_DISTANCE,
};
pub use lookup::{
    find_field, find_method, BoundMethod, FieldResolution, LookupFlags, MethodResolution,
    Rejection, Scope,
};
pub use session::{AccessorKind, AccessorRequest, LinkedClass, Session};

pub use lava_types::error::ResolveError;
