//! Structural failures.
//!
//! These indicate that the input program or its resolution path is unsound
//! (cyclic inheritance, missing descriptors, malformed generic signatures),
//! as opposed to an overload merely not fitting. They short-circuit the whole
//! resolution request; per-candidate failures stay ordinary values.

use thiserror::Error;

use crate::ty::ClassName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cyclic inheritance involving `{0}`")]
    CyclicInheritance(ClassName),
    #[error("class `{0}` was not found on the resolution path")]
    MissingClass(ClassName),
    #[error("malformed generic signature on `{owner}`: {detail}")]
    MalformedGenerics { owner: ClassName, detail: String },
}
