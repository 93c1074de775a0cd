//! Type algebra for a class-based, statically typed language with
//! single inheritance, interfaces, type-erasure generics, autoboxing and
//! varargs.
//!
//! This crate owns the pure pieces: the [`ty::Type`] model, the conformance
//! classifier in [`cast`], and the class-descriptor interface the rest of the
//! front-end consumes. The stateful hierarchy and overload machinery lives in
//! `lava-resolve`.

pub mod cast;
pub mod descriptor;
pub mod error;
pub mod store;
pub mod ty;

pub use cast::{Cast, CastKind, ClassGraph, TypeChecker, BOXING_DISTANCE};
pub use descriptor::{
    ClassDescriptor, ClassProvider, DefaultValue, FieldDescriptor, MethodDescriptor, Modifiers,
    TypeParamDecl, Visibility,
};
pub use error::ResolveError;
pub use store::TypeStore;
pub use ty::{Capture, ClassName, Primitive, Type, Variance};
