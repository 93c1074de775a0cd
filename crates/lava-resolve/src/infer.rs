//! Per-candidate applicability and signature instantiation.
//!
//! [`Inferrer::infer`] decides whether one method can accept one argument
//! list, at what total conversion distance, and with which type-parameter
//! bindings. It never reports diagnostics; an inapplicable candidate comes
//! back as a structured [`InferenceError`] the lookup loop can keep or drop.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lava_types::cast::{CastKind, TypeChecker};
use lava_types::descriptor::{ClassDescriptor, DefaultValue, MethodDescriptor};
use lava_types::error::ResolveError;
use lava_types::ty::{
    fill_default_type_params, substitute_type_params, Capture, ClassName, Type, Variance,
};

use crate::generics::{infer_generic, least_upper_bound};
use crate::session::Session;

/// Distance gap between conversion tiers. One boxing step anywhere costs a
/// whole tier; matching through the variable-arity tail costs two.
pub const LEVEL_DEPTH: i32 = 5120;
pub const VARARGS_DISTANCE: i32 = 2 * LEVEL_DEPTH;

/// How a parameter slot with no positional argument was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilledArg {
    /// Index into the caller's named-argument list.
    Named(usize),
    /// The parameter's declared default-value expression.
    Default(DefaultValue),
}

#[derive(Debug, Clone)]
pub struct InferenceResult {
    pub owner: ClassName,
    pub method: Arc<MethodDescriptor>,
    /// Total conversion cost; lower wins across candidates.
    pub distance: i32,
    /// The trailing argument was already the vararg array itself.
    pub direct_varargs: bool,
    pub used_boxing: bool,
    pub type_args: HashMap<String, Type>,
    /// Parameter types with type parameters substituted out.
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
    /// Slots satisfied by named arguments or defaults, by parameter index.
    pub filled_params: Vec<(usize, FilledArg)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InferenceError {
    pub kind: InferenceErrorKind,
    pub index: Option<usize>,
    pub expected: Option<Type>,
    pub actual: Option<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceErrorKind {
    ArgCount,
    GenericArity,
    /// An argument does not conform to its parameter; carries the verdict.
    Conformance(CastKind),
    /// Two arguments bind the same type parameter to incompatible types.
    Unmergeable,
}

impl InferenceError {
    fn of(kind: InferenceErrorKind) -> InferenceError {
        InferenceError { kind, index: None, expected: None, actual: None }
    }

    fn at(kind: InferenceErrorKind, index: usize, expected: Type, actual: Type) -> InferenceError {
        InferenceError { kind, index: Some(index), expected: Some(expected), actual: Some(actual) }
    }
}

/// The verdict for one candidate.
#[derive(Debug, Clone)]
pub enum Applicability {
    Applicable(Box<InferenceResult>),
    Inapplicable(InferenceError),
}

enum Reject {
    Session(ResolveError),
    Inapplicable(InferenceError),
}

impl From<ResolveError> for Reject {
    fn from(err: ResolveError) -> Reject {
        Reject::Session(err)
    }
}

pub struct Inferrer<'a> {
    session: &'a Session,
}

impl<'a> Inferrer<'a> {
    pub fn new(session: &'a Session) -> Inferrer<'a> {
        Inferrer { session }
    }

    /// Classify one candidate against one call shape.
    ///
    /// `receiver` carries the instantiation of the owner's type parameters;
    /// `explicit_type_args` are caller-written witnesses for the method's own
    /// parameters and must match their count exactly. `named_args` fill
    /// trailing parameters the positional `args` left uncovered, falling back
    /// to declared defaults.
    pub fn infer(
        &self,
        owner: &ClassDescriptor,
        method: &Arc<MethodDescriptor>,
        receiver: Option<&Type>,
        explicit_type_args: Option<&[Type]>,
        args: &[Type],
        named_args: &[(String, Type)],
    ) -> Result<Applicability, ResolveError> {
        let mut bounds: HashMap<String, Vec<Type>> = HashMap::new();
        for tp in &method.type_params {
            let tp_bounds =
                if tp.bounds.is_empty() { vec![Type::object()] } else { tp.bounds.clone() };
            bounds.insert(tp.name.clone(), tp_bounds);
        }
        for (name, declared) in owner.type_param_bounds() {
            bounds.entry(name).or_insert(declared);
        }
        let has_type_params = !bounds.is_empty();

        let mut exact: HashMap<String, Type> = HashMap::new();
        if let Some(hints) = explicit_type_args {
            if hints.len() != method.type_params.len() {
                return Ok(Applicability::Inapplicable(InferenceError::of(
                    InferenceErrorKind::GenericArity,
                )));
            }
            for (tp, hint) in method.type_params.iter().zip(hints) {
                exact.insert(tp.name.clone(), hint.clone());
            }
        }
        if !owner.type_params.is_empty() {
            if let Some(receiver) = receiver {
                if let Some(view_args) = self.receiver_instantiation(owner, receiver)? {
                    if view_args.len() != owner.type_params.len() {
                        return Ok(Applicability::Inapplicable(InferenceError::of(
                            InferenceErrorKind::GenericArity,
                        )));
                    }
                    for (tp, arg) in owner.type_params.iter().zip(view_args) {
                        exact.entry(tp.name.clone()).or_insert(arg);
                    }
                }
            }
        }

        let declared = method.params.len();
        let is_varargs = method.modifiers.is_varargs;
        if is_varargs && declared == 0 {
            return Err(ResolveError::MalformedGenerics {
                owner: owner.name.clone(),
                detail: format!("variable-arity method {} has no parameters", method.name),
            });
        }
        let fixed = if is_varargs { declared - 1 } else { declared };

        // Fill uncovered trailing fixed slots from named arguments, then from
        // declared defaults.
        let mut effective: Vec<Type> = args.to_vec();
        let mut filled: Vec<(usize, FilledArg)> = Vec::new();
        let mut defaulted: HashSet<usize> = HashSet::new();
        for index in args.len()..fixed {
            let param_name = method.param_names.as_ref().and_then(|names| names.get(index));
            let named = param_name
                .and_then(|pn| named_args.iter().position(|(n, _)| n == pn));
            if let Some(ni) = named {
                effective.push(named_args[ni].1.clone());
                filled.push((index, FilledArg::Named(ni)));
            } else if let Some(default) = method.default_for(index) {
                // The slot is satisfied by the declaration itself; it takes
                // no part in conformance or inference.
                effective.push(method.params[index].clone());
                filled.push((index, FilledArg::Default(default.clone())));
                defaulted.insert(index);
            } else {
                return Ok(Applicability::Inapplicable(InferenceError {
                    kind: InferenceErrorKind::ArgCount,
                    index: Some(index),
                    expected: Some(method.params[index].clone()),
                    actual: None,
                }));
            }
        }
        if !is_varargs && effective.len() != declared {
            return Ok(Applicability::Inapplicable(InferenceError::of(
                InferenceErrorKind::ArgCount,
            )));
        }

        let checker = TypeChecker::new(self.session).with_type_params(bounds.clone());
        let mut distance = 0i32;
        let mut direct_varargs = false;
        let mut used_boxing = false;
        let mut merge_pairs: Vec<(Type, Type)> = Vec::new();

        if is_varargs {
            let vararg = declared - 1;
            if effective.len() < vararg {
                return Ok(Applicability::Inapplicable(InferenceError::of(
                    InferenceErrorKind::ArgCount,
                )));
            }
            distance += VARARGS_DISTANCE;

            let vararg_param = &method.params[vararg];
            if vararg_param.array_depth() == 0 {
                return Err(ResolveError::MalformedGenerics {
                    owner: owner.name.clone(),
                    detail: format!(
                        "variable-arity parameter of {} is not an array",
                        method.name
                    ),
                });
            }
            let component = vararg_param.with_array_depth(vararg_param.array_depth() - 1);

            if effective.len() == vararg {
                // Empty variable part. A lone vararg parameter must not
                // outrank by less than a full tier, so the component's own
                // distance to the root object type is refunded.
                if vararg == 0 {
                    let cast = checker.classify(&component, &Type::object())?;
                    if cast.is_ok() {
                        distance -= cast.distance;
                    }
                }
            } else {
                let mut i = vararg;
                let mut bound = effective[i].clone();
                let mut first = None;
                if i + 1 == effective.len() {
                    let direct = checker.classify(&bound, vararg_param)?;
                    if direct.is_ok() {
                        direct_varargs = true;
                        first = Some(direct);
                    }
                }
                let first = match first {
                    Some(cast) => cast,
                    None => {
                        let cast = checker.classify(&bound, &component)?;
                        if !cast.is_ok() {
                            return Ok(Applicability::Inapplicable(InferenceError::at(
                                InferenceErrorKind::Conformance(cast.kind),
                                i,
                                component.clone(),
                                bound,
                            )));
                        }
                        cast
                    }
                };
                if matches!(first.kind, CastKind::Boxing | CastKind::Unboxing) {
                    used_boxing = true;
                }
                distance += first.distance;
                i += 1;

                while i < effective.len() {
                    let from = &effective[i];
                    let mut cast = checker.classify(from, &bound)?;
                    if !cast.is_ok() {
                        // Widen the running element bound and re-check it
                        // against the declared component.
                        bound = least_upper_bound(self.session, from, &bound)?;
                        cast = checker.classify(&bound, &component)?;
                        if !cast.is_ok() {
                            return Ok(Applicability::Inapplicable(InferenceError::at(
                                InferenceErrorKind::Conformance(cast.kind),
                                i,
                                component.clone(),
                                from.clone(),
                            )));
                        }
                    }
                    if matches!(cast.kind, CastKind::Boxing | CastKind::Unboxing) {
                        used_boxing = true;
                    }
                    distance += cast.distance;
                    i += 1;
                }

                if has_type_params {
                    let target = if direct_varargs { vararg_param.clone() } else { component };
                    merge_pairs.push((bound, target));
                }
            }
        }

        for i in 0..fixed {
            if defaulted.contains(&i) {
                continue;
            }
            let from = &effective[i];
            let to = &method.params[i];
            let cast = checker.classify(from, to)?;
            if !cast.is_ok() {
                return Ok(Applicability::Inapplicable(InferenceError::at(
                    InferenceErrorKind::Conformance(cast.kind),
                    i,
                    to.clone(),
                    from.clone(),
                )));
            }
            if matches!(cast.kind, CastKind::Boxing | CastKind::Unboxing) {
                used_boxing = true;
            }
            distance += cast.distance;
            if has_type_params {
                merge_pairs.push((from.clone(), to.clone()));
            }
        }
        if used_boxing {
            distance += LEVEL_DEPTH;
        }

        if has_type_params {
            for (actual, declared_ty) in &merge_pairs {
                match self.merge_bound(&checker, &mut exact, actual, declared_ty) {
                    Ok(()) => {}
                    Err(Reject::Inapplicable(err)) => {
                        return Ok(Applicability::Inapplicable(err));
                    }
                    Err(Reject::Session(err)) => return Err(err),
                }
            }
            fill_default_type_params(&bounds, &mut exact);
        }

        let instantiate = |ty: &Type| {
            if has_type_params {
                substitute_type_params(ty, &exact, &bounds)
            } else {
                ty.clone()
            }
        };
        let params = method.params.iter().map(instantiate).collect();
        let return_type = instantiate(&method.return_type);
        let throws = method.throws.iter().map(instantiate).collect();

        Ok(Applicability::Applicable(Box::new(InferenceResult {
            owner: owner.name.clone(),
            method: Arc::clone(method),
            distance,
            direct_varargs,
            used_boxing,
            type_args: exact,
            params,
            return_type,
            throws,
            filled_params: filled,
        })))
    }

    /// The receiver's instantiation of the owner's type parameters, viewed
    /// through the hierarchy when the receiver is a subtype.
    fn receiver_instantiation(
        &self,
        owner: &ClassDescriptor,
        receiver: &Type,
    ) -> Result<Option<Vec<Type>>, ResolveError> {
        let receiver = match receiver {
            Type::Wildcard(Capture::Concrete { value, .. }) => (**value).clone(),
            other => other.clone(),
        };
        if receiver.name() == Some(owner.name.as_str()) {
            return Ok(match &receiver {
                Type::Parameterized { args, .. } if !Type::is_raw_args(args) => Some(args.clone()),
                // A raw or erased receiver leaves the parameters to default
                // to their declared-bound captures.
                _ => None,
            });
        }
        infer_generic(self.session, &receiver, &owner.name)
    }

    /// Walk an actual argument type alongside the declared parameter type,
    /// accumulating type-parameter bindings.
    fn merge_bound(
        &self,
        checker: &TypeChecker<'_>,
        exact: &mut HashMap<String, Type>,
        actual: &Type,
        declared: &Type,
    ) -> Result<(), Reject> {
        match declared {
            Type::TypeParamRef { name, array, variance } => {
                self.add_bound(checker, exact, name, *array, *variance, actual)
            }
            Type::Parameterized { name, args: declared_args, .. } => {
                if Type::is_raw_args(declared_args) {
                    return Ok(());
                }
                let viewed = infer_generic(self.session, actual, name)?;
                let Some(actual_args) = viewed else { return Ok(()) };
                if actual_args.len() != declared_args.len() {
                    return Ok(());
                }
                for (a, d) in actual_args.iter().zip(declared_args) {
                    self.merge_bound(checker, exact, a, d)?;
                }
                Ok(())
            }
            Type::Wildcard(Capture::Concrete { value, .. }) => {
                self.merge_bound(checker, exact, actual, value)
            }
            _ => Ok(()),
        }
    }

    fn add_bound(
        &self,
        checker: &TypeChecker<'_>,
        exact: &mut HashMap<String, Type>,
        name: &str,
        array: u8,
        variance: Variance,
        actual: &Type,
    ) -> Result<(), Reject> {
        if !checker.type_params.contains_key(name) {
            return Ok(());
        }
        let mut value = actual.clone();
        if let Type::Wildcard(Capture::Concrete { value: inner, .. }) = &value {
            value = (**inner).clone();
        }
        if array > 0 {
            if value.array_depth() < array {
                return Ok(());
            }
            value = value.with_array_depth(value.array_depth() - array);
        }
        // A primitive meeting a reference-bound parameter binds its wrapper.
        if value.is_primitive() {
            value = value.boxed();
        }
        if variance != Variance::Invariant {
            value = match value {
                Type::Parameterized { .. } | Type::TypeParamRef { .. } => {
                    value.with_variance(variance)
                }
                Type::Nominal { name, array } => {
                    Type::parameterized_with(name, array, variance, Vec::new())
                }
                other => other,
            };
        }

        let merged = match exact.get(name) {
            None => value,
            Some(existing) if *existing == value => value,
            Some(existing) => self.common_child(checker, existing, &value)?,
        };
        exact.insert(name.to_string(), merged);
        Ok(())
    }

    /// Of two bindings for one parameter, the one the other converts into;
    /// when neither direction conforms the bindings cannot be merged.
    fn common_child(
        &self,
        checker: &TypeChecker<'_>,
        a: &Type,
        b: &Type,
    ) -> Result<Type, Reject> {
        let ab = checker.classify(a, b)?;
        if ab.is_ok() {
            return Ok(b.clone());
        }
        let ba = checker.classify(b, a)?;
        if ba.is_ok() {
            return Ok(a.clone());
        }
        Err(Reject::Inapplicable(InferenceError {
            kind: InferenceErrorKind::Unmergeable,
            index: None,
            expected: Some(a.clone()),
            actual: Some(b.clone()),
        }))
    }
}
