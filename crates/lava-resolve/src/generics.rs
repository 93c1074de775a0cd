//! Generic-argument inference and the least upper bound.
//!
//! `infer_generic` answers "viewed as ancestor `X`, what are this instance's
//! type arguments?" by walking inheritance edges and substituting per edge.
//! `least_upper_bound` computes the type both operands conform to, recursing
//! through shared parameterizations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lava_types::descriptor::ClassDescriptor;
use lava_types::error::ResolveError;
use lava_types::ty::{
    fill_default_type_params, mentions_type_param, substitute_type_params, Capture, ClassName,
    Primitive, Type, Variance, CLONEABLE, NUMBER,
};

use crate::hierarchy::common_ancestor;
use crate::session::{LinkedClass, Session};

/// Declared type arguments for one ancestor, as propagated along inheritance
/// edges. `dynamic` marks argument lists that mention the declaring class's
/// own type parameters and therefore need per-instance substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct AncestorArgs {
    pub args: Vec<Type>,
    pub dynamic: bool,
}

pub(crate) fn build_ancestor_args(
    session: &Session,
    descriptor: &ClassDescriptor,
) -> Result<HashMap<ClassName, AncestorArgs>, ResolveError> {
    let mut visiting = HashSet::new();
    visiting.insert(descriptor.name.clone());
    build_args_map(session, descriptor, &mut visiting)
}

fn build_args_map(
    session: &Session,
    descriptor: &ClassDescriptor,
    visiting: &mut HashSet<ClassName>,
) -> Result<HashMap<ClassName, AncestorArgs>, ResolveError> {
    let mut map = HashMap::new();
    for (target, args) in inheritance_edges(descriptor) {
        match session.linked(target) {
            Ok(linked) => {
                let inherited = edge_ancestor_args(session, &linked, visiting)?;
                for (name, entry) in inherited.iter() {
                    map.entry(name.clone()).or_insert_with(|| entry.clone());
                }
            }
            Err(ResolveError::MissingClass(_)) => {
                tracing::debug!(class = %descriptor.name, edge = %target, "edge class is missing; generic propagation truncated");
            }
            Err(err) => return Err(err),
        }
        if let Some(args) = args {
            let dynamic = args.iter().any(mentions_type_param);
            map.insert(target.clone(), AncestorArgs { args: args.clone(), dynamic });
        }
    }
    Ok(map)
}

/// The propagated arguments of one inheritance edge. As with hierarchy views,
/// a finished build is reused and an unfinished one computed in place under
/// `visiting`, never waiting on another thread's slot.
fn edge_ancestor_args(
    session: &Session,
    linked: &LinkedClass,
    visiting: &mut HashSet<ClassName>,
) -> Result<Arc<HashMap<ClassName, AncestorArgs>>, ResolveError> {
    if let Some(map) = linked.ancestor_args_if_ready() {
        return Ok(map);
    }
    let name = &linked.descriptor().name;
    if !visiting.insert(name.clone()) {
        return Err(ResolveError::CyclicInheritance(name.clone()));
    }
    let map = build_args_map(session, linked.descriptor(), visiting)?;
    visiting.remove(name);
    Ok(Arc::new(map))
}

fn inheritance_edges(descriptor: &ClassDescriptor) -> Vec<(&ClassName, Option<&Vec<Type>>)> {
    let mut edges = Vec::with_capacity(1 + descriptor.interfaces.len());
    if let Some(parent) = &descriptor.parent {
        edges.push((parent, descriptor.parent_args.as_ref()));
    }
    for (i, iface) in descriptor.interfaces.iter().enumerate() {
        edges.push((iface, descriptor.interface_args_at(i)));
    }
    edges
}

/// Default capture per type parameter, standing in for arguments of a raw or
/// erased instance.
fn erased_own_args(descriptor: &ClassDescriptor) -> Vec<Type> {
    let mut exact = HashMap::new();
    fill_default_type_params(&descriptor.type_param_bounds(), &mut exact);
    descriptor
        .type_params
        .iter()
        .map(|tp| exact.get(&tp.name).cloned().unwrap_or_else(Type::unbounded))
        .collect()
}

/// The type arguments of `instance` when viewed as `target`.
///
/// `Ok(None)` means `target` is not a parameterized ancestor of the instance
/// (or the instance has no nominal shape); a raw instance yields its declared
/// bounds as produced-only captures, modeling erasure.
pub fn infer_generic(
    session: &Session,
    instance: &Type,
    target: &str,
) -> Result<Option<Vec<Type>>, ResolveError> {
    let Some(name) = instance.name() else { return Ok(None) };

    if name == target {
        return match instance {
            Type::Parameterized { args, .. } if Type::is_raw_args(args) => {
                match session.linked(target) {
                    Ok(linked) => Ok(Some(erased_own_args(linked.descriptor()))),
                    Err(ResolveError::MissingClass(_)) => Ok(None),
                    Err(err) => Err(err),
                }
            }
            Type::Parameterized { args, .. } => Ok(Some(args.clone())),
            _ => Ok(None),
        };
    }

    let linked = match session.linked(name) {
        Ok(linked) => linked,
        Err(ResolveError::MissingClass(_)) => {
            tracing::debug!(class = %name, "instance class is missing; no generic view");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };
    let ancestor_args = linked.ancestor_args(session)?;
    let Some(entry) = ancestor_args.get(target) else { return Ok(None) };
    if !entry.dynamic {
        return Ok(Some(entry.args.clone()));
    }

    let descriptor = Arc::clone(linked.descriptor());
    let own_args = match instance {
        Type::Parameterized { args, .. } if !Type::is_raw_args(args) => args.clone(),
        _ => erased_own_args(&descriptor),
    };
    walk_edges(session, descriptor, own_args, target)
}

/// Follow inheritance edges from `descriptor` towards `target`, substituting
/// the current instantiation through each edge's declared arguments.
fn walk_edges(
    session: &Session,
    mut descriptor: Arc<ClassDescriptor>,
    mut args: Vec<Type>,
    target: &str,
) -> Result<Option<Vec<Type>>, ResolveError> {
    loop {
        if args.len() != descriptor.type_params.len() {
            return Err(ResolveError::MalformedGenerics {
                owner: descriptor.name.clone(),
                detail: format!(
                    "{} type arguments for {} type parameters",
                    args.len(),
                    descriptor.type_params.len()
                ),
            });
        }
        let exact: HashMap<String, Type> = descriptor
            .type_params
            .iter()
            .map(|tp| tp.name.clone())
            .zip(args.iter().cloned())
            .collect();
        let bounds = descriptor.type_param_bounds();

        let linked = session.linked(&descriptor.name)?;
        let via_interface = linked
            .hierarchy(session)?
            .entry(target)
            .map_or(false, |e| e.via_interface);
        let mut edges = inheritance_edges(&descriptor);
        if via_interface && descriptor.parent.is_some() && edges.len() > 1 {
            // The target was reached through an interface; scan those first.
            edges.rotate_left(1);
        }

        let mut next: Option<(Arc<ClassDescriptor>, Vec<Type>)> = None;
        for (edge_name, edge_args) in edges {
            if edge_name == target {
                let resolved = match edge_args {
                    Some(declared) => declared
                        .iter()
                        .map(|t| substitute_type_params(t, &exact, &bounds))
                        .collect(),
                    // Raw edge to a generic ancestor: the view is erased.
                    None => Vec::new(),
                };
                return Ok(Some(resolved));
            }
            let Ok(edge_linked) = session.linked(edge_name) else { continue };
            if edge_linked.hierarchy(session)?.contains(target) {
                let edge_desc = Arc::clone(edge_linked.descriptor());
                let next_args = match edge_args {
                    Some(declared) => declared
                        .iter()
                        .map(|t| substitute_type_params(t, &exact, &bounds))
                        .collect(),
                    None => erased_own_args(&edge_desc),
                };
                next = Some((edge_desc, next_args));
                break;
            }
        }
        match next {
            Some((d, a)) => {
                descriptor = d;
                args = a;
            }
            None => return Ok(None),
        }
    }
}

/// The operand a capture contributes to a least-upper-bound computation, or
/// `None` when it constrains nothing.
fn capture_operand(ty: &Type) -> Option<Type> {
    match ty {
        Type::Wildcard(Capture::Unbounded) | Type::Any => None,
        Type::Wildcard(Capture::Bounded { bounds }) => bounds.first().cloned(),
        Type::Wildcard(Capture::Concrete { value, .. }) => Some((**value).clone()),
        other => Some(other.clone()),
    }
}

fn numeric_cap(ty: &Type) -> u8 {
    match ty {
        Type::Primitive(p) => p.rank().unwrap_or(0),
        _ => 8,
    }
}

/// The most specific type both operands conform to.
///
/// Two distinct numeric primitives meet at their shared numeric superclass;
/// mixing `boolean` in is reported at debug level and falls back to the root
/// object type. Arrays of mismatched depth meet at the array marker
/// interface; a shared parameterized ancestor recurses per argument, with a
/// self-referential parameterization collapsing to the unbounded wildcard.
pub fn least_upper_bound(session: &Session, a: &Type, b: &Type) -> Result<Type, ResolveError> {
    if a == b {
        return Ok(a.clone());
    }
    let Some(a) = capture_operand(a) else { return Ok(b.boxed()) };
    let Some(b) = capture_operand(b) else { return Ok(a.boxed()) };
    if a == b {
        return Ok(a);
    }

    let (ca, cb) = (numeric_cap(&a), numeric_cap(&b));
    if (1..=7).contains(&ca) && (1..=7).contains(&cb) {
        return Ok(Type::nominal(NUMBER));
    }
    if ca < 8 && cb < 8 {
        tracing::debug!(left = %a, right = %b, "boolean mixed into a numeric join");
        return Ok(Type::object());
    }
    if matches!((&a, &b), (Type::Primitive(Primitive::Void), _) | (_, Type::Primitive(Primitive::Void))) {
        return Ok(Type::object());
    }
    let a = a.boxed();
    let b = b.boxed();

    let (da, db) = (a.array_depth(), b.array_depth());
    if da != db {
        return Ok(if da.min(db) == 0 { Type::object() } else { Type::nominal(CLONEABLE) });
    }

    let (Some(na), Some(nb)) = (a.name(), b.name()) else { return Ok(Type::object()) };
    let view_a = match session.linked(na) {
        Ok(linked) => linked.hierarchy(session)?,
        Err(ResolveError::MissingClass(_)) => return Ok(Type::object()),
        Err(err) => return Err(err),
    };
    let view_b = match session.linked(nb) {
        Ok(linked) => linked.hierarchy(session)?,
        Err(ResolveError::MissingClass(_)) => return Ok(Type::object()),
        Err(err) => return Err(err),
    };
    let common = common_ancestor(&view_a, &view_b);

    let (wa, wb) = (a.variance(), b.variance());
    let mut variance = wa;
    if wa != wb {
        if wa == Variance::Super || wb == Variance::Super {
            return Ok(Type::unbounded());
        }
        variance = Variance::Extends;
    }

    let args_a = infer_generic(session, &a, &common)?;
    let args_b = infer_generic(session, &b, &common)?;
    match (args_a, args_b) {
        (None, None) => Ok(if variance == Variance::Invariant {
            Type::nominal_array(common, da)
        } else {
            Type::parameterized_with(common, da, variance, Vec::new())
        }),
        (Some(args_a), Some(args_b)) if args_a.len() == args_b.len() => {
            let mut args = Vec::with_capacity(args_a.len());
            for (xa, xb) in args_a.iter().zip(&args_b) {
                // A parameterization naming the operands themselves would
                // recurse forever; it carries no information anyway.
                if capture_operand(xa).as_ref() == Some(&a)
                    && capture_operand(xb).as_ref() == Some(&b)
                {
                    args.push(Type::unbounded());
                    continue;
                }
                args.push(least_upper_bound(session, xa, xb)?);
            }
            Ok(Type::Parameterized { name: common, array: da, variance, args })
        }
        _ => {
            tracing::debug!(class = %common, "asymmetric parameterization; erasing the join");
            Ok(Type::nominal_array(common, da))
        }
    }
}
