//! Name lookup: overload selection and field resolution.
//!
//! The lookup loop runs every visible candidate through the [`Inferrer`] and
//! keeps the strict distance minimum. Ties are ambiguities, never arbitrary
//! picks; inapplicable and inaccessible candidates are retained so the caller
//! can report why nothing matched.

use std::sync::Arc;

use lava_types::descriptor::{FieldDescriptor, MethodDescriptor, Modifiers, Visibility};
use lava_types::error::ResolveError;
use lava_types::ty::{
    fill_default_type_params, substitute_type_params, ClassName, Type, OBJECT,
};

use crate::generics::infer_generic;
use crate::infer::{Applicability, InferenceError, InferenceResult, Inferrer};
use crate::session::{AccessorKind, AccessorRequest, Session};

/// Where the reference occurs, for access control.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub from_class: Option<ClassName>,
}

impl Scope {
    pub fn in_class(name: impl Into<ClassName>) -> Scope {
        Scope { from_class: Some(name.into()) }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LookupFlags {
    /// Only static members qualify (static context or type-qualified access).
    pub static_only: bool,
    /// Do not consider inherited declarations.
    pub this_type_only: bool,
    /// Never enqueue synthetic-accessor requests for this lookup.
    pub suppress_accessor: bool,
}

/// A candidate identified by owner and declaration, for reporting.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    pub owner: ClassName,
    pub method: Arc<MethodDescriptor>,
}

/// One inapplicable candidate and the reason it was dropped.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub owner: ClassName,
    pub method: Arc<MethodDescriptor>,
    pub error: InferenceError,
}

#[derive(Debug)]
pub enum MethodResolution {
    Found(Box<InferenceResult>),
    /// Two or more applicable candidates at the same distance.
    Ambiguous(Vec<BoundMethod>),
    /// Candidates existed but none accepted the arguments.
    NoneApplicable(Vec<Rejection>),
    /// Candidates existed but none was visible from the scope.
    Inaccessible(Vec<BoundMethod>),
    NotFound,
}

#[derive(Debug)]
pub enum FieldResolution {
    Found {
        owner: ClassName,
        field: Arc<FieldDescriptor>,
        /// Declared field type with the receiver's instantiation applied.
        ty: Type,
    },
    Inaccessible(Vec<(ClassName, Arc<FieldDescriptor>)>),
    NotFound,
}

/// Select the best applicable overload of `name` on `receiver`.
///
/// Constructors resolve through the name `<init>`. A `MissingClass` or
/// `CyclicInheritance` error aborts the lookup; everything else comes back
/// as a [`MethodResolution`].
#[allow(clippy::too_many_arguments)]
pub fn find_method(
    session: &Session,
    scope: &Scope,
    receiver: &Type,
    name: &str,
    explicit_type_args: Option<&[Type]>,
    args: &[Type],
    named_args: &[(String, Type)],
    flags: LookupFlags,
) -> Result<MethodResolution, ResolveError> {
    let Some(class_name) = receiver_class_name(receiver) else {
        return Ok(MethodResolution::NotFound);
    };
    let linked = session.linked(&class_name)?;
    let table = linked.methods(session)?;
    let Some(set) = table.get(name) else { return Ok(MethodResolution::NotFound) };

    let inferrer = Inferrer::new(session);
    let mut best: Option<Box<InferenceResult>> = None;
    let mut duplicates: Vec<BoundMethod> = Vec::new();
    let mut rejections: Vec<Rejection> = Vec::new();
    let mut inaccessible: Vec<BoundMethod> = Vec::new();

    for candidate in set.candidates() {
        let method = &candidate.member;
        if flags.this_type_only && candidate.owner != class_name {
            continue;
        }
        let bound = || BoundMethod { owner: candidate.owner.clone(), method: Arc::clone(method) };
        if flags.static_only && !method.modifiers.is_static && !method.is_constructor() {
            inaccessible.push(bound());
            continue;
        }
        let Some(owner_desc) = session.descriptor(&candidate.owner) else { continue };
        if !is_accessible(session, scope, &owner_desc.name, owner_desc.package(), &method.modifiers)? {
            inaccessible.push(bound());
            continue;
        }

        match inferrer.infer(
            &owner_desc,
            method,
            Some(receiver),
            explicit_type_args,
            args,
            named_args,
        )? {
            Applicability::Applicable(result) => match &best {
                Some(current) if result.distance > current.distance => {}
                Some(current) if result.distance == current.distance => {
                    duplicates.push(BoundMethod {
                        owner: result.owner.clone(),
                        method: Arc::clone(&result.method),
                    });
                }
                _ => {
                    best = Some(result);
                    duplicates.clear();
                }
            },
            Applicability::Inapplicable(error) => {
                rejections.push(Rejection {
                    owner: candidate.owner.clone(),
                    method: Arc::clone(method),
                    error,
                });
            }
        }
    }

    if let Some(best) = best {
        if !duplicates.is_empty() {
            let mut all =
                vec![BoundMethod { owner: best.owner.clone(), method: Arc::clone(&best.method) }];
            all.extend(duplicates);
            return Ok(MethodResolution::Ambiguous(all));
        }
        if !flags.suppress_accessor {
            let visibility = best.method.modifiers.visibility;
            maybe_request_accessor(
                session,
                scope,
                &best.owner,
                &best.method.name,
                visibility,
                AccessorKind::Method,
            );
        }
        return Ok(MethodResolution::Found(best));
    }
    if !rejections.is_empty() {
        return Ok(MethodResolution::NoneApplicable(rejections));
    }
    if !inaccessible.is_empty() {
        return Ok(MethodResolution::Inaccessible(inaccessible));
    }
    Ok(MethodResolution::NotFound)
}

/// Resolve a field of `name` on `receiver`: the first accessible declaration
/// along the hierarchy wins, with the receiver's instantiation substituted
/// into the declared type.
pub fn find_field(
    session: &Session,
    scope: &Scope,
    receiver: &Type,
    name: &str,
    flags: LookupFlags,
) -> Result<FieldResolution, ResolveError> {
    let Some(class_name) = receiver_class_name(receiver) else {
        return Ok(FieldResolution::NotFound);
    };
    let linked = session.linked(&class_name)?;
    let table = linked.fields(session)?;
    let Some(set) = table.get(name) else { return Ok(FieldResolution::NotFound) };

    let mut inaccessible: Vec<(ClassName, Arc<FieldDescriptor>)> = Vec::new();
    for candidate in set.candidates() {
        let field = &candidate.member;
        if flags.this_type_only && candidate.owner != class_name {
            continue;
        }
        if flags.static_only && !field.modifiers.is_static {
            inaccessible.push((candidate.owner.clone(), Arc::clone(field)));
            continue;
        }
        let Some(owner_desc) = session.descriptor(&candidate.owner) else { continue };
        if !is_accessible(session, scope, &owner_desc.name, owner_desc.package(), &field.modifiers)?
        {
            inaccessible.push((candidate.owner.clone(), Arc::clone(field)));
            continue;
        }

        let ty = if owner_desc.type_params.is_empty() {
            field.ty.clone()
        } else {
            let bounds = owner_desc.type_param_bounds();
            let mut exact = std::collections::HashMap::new();
            if let Some(args) = infer_generic(session, receiver, &owner_desc.name)? {
                if args.len() == owner_desc.type_params.len() {
                    for (tp, arg) in owner_desc.type_params.iter().zip(args) {
                        exact.insert(tp.name.clone(), arg);
                    }
                }
            }
            fill_default_type_params(&bounds, &mut exact);
            substitute_type_params(&field.ty, &exact, &bounds)
        };
        if !flags.suppress_accessor {
            maybe_request_accessor(
                session,
                scope,
                &candidate.owner,
                &field.name,
                field.modifiers.visibility,
                AccessorKind::Field,
            );
        }
        return Ok(FieldResolution::Found {
            owner: candidate.owner.clone(),
            field: Arc::clone(field),
            ty,
        });
    }
    if !inaccessible.is_empty() {
        return Ok(FieldResolution::Inaccessible(inaccessible));
    }
    Ok(FieldResolution::NotFound)
}

/// The class whose member tables serve this receiver. Arrays answer through
/// the root object type; primitives have no members.
fn receiver_class_name(receiver: &Type) -> Option<ClassName> {
    let erased = receiver.erased();
    if erased.array_depth() > 0 {
        return Some(OBJECT.to_string());
    }
    erased.name().map(String::from)
}

fn package_of(name: &str) -> &str {
    match name.rfind('/') {
        Some(i) => &name[..i],
        None => "",
    }
}

/// The top-level class of a possibly nested class name.
fn top_level(name: &str) -> &str {
    match name.find('$') {
        Some(i) => &name[..i],
        None => name,
    }
}

fn is_accessible(
    session: &Session,
    scope: &Scope,
    owner: &str,
    owner_package: &str,
    modifiers: &Modifiers,
) -> Result<bool, ResolveError> {
    match modifiers.visibility {
        Visibility::Public => Ok(true),
        Visibility::Package => Ok(scope
            .from_class
            .as_deref()
            .map_or(false, |from| package_of(from) == owner_package)),
        Visibility::Protected => {
            let Some(from) = scope.from_class.as_deref() else { return Ok(false) };
            if package_of(from) == owner_package {
                return Ok(true);
            }
            match session.linked(from) {
                Ok(linked) => Ok(linked.hierarchy(session)?.contains(owner)),
                Err(ResolveError::MissingClass(_)) => Ok(false),
                Err(err) => Err(err),
            }
        }
        Visibility::Private => {
            let Some(from) = scope.from_class.as_deref() else { return Ok(false) };
            Ok(top_level(from) == top_level(owner))
        }
    }
}

/// Private members reached from a sibling class in the same top-level type
/// need a synthetic accessor; record the request for codegen.
fn maybe_request_accessor(
    session: &Session,
    scope: &Scope,
    owner: &str,
    member: &str,
    visibility: Visibility,
    kind: AccessorKind,
) {
    if visibility == Visibility::Private && scope.from_class.as_deref() != Some(owner) {
        session.push_accessor_request(AccessorRequest {
            owner: owner.to_string(),
            member: member.to_string(),
            kind,
        });
    }
}
