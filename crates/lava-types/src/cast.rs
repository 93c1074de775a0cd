//! The conformance classifier.
//!
//! [`TypeChecker::classify`] answers "can a value of type `from` flow into a
//! slot of type `to`, and at what cost". The answer is always a [`Cast`]
//! value; nothing here reports diagnostics. [`CastKind::InsufficientData`] is
//! the one outcome the caller must surface, since it means a referenced class
//! could not be found rather than that the conversion is wrong.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::descriptor::ClassDescriptor;
use crate::error::ResolveError;
use crate::ty::{
    mentions_type_param, Capture, Primitive, Type, Variance, ARRAY_INTERFACES, OBJECT,
};

/// Fixed penalty added by any boxing or unboxing conversion.
pub const BOXING_DISTANCE: i32 = 1;

/// Hierarchy queries the classifier needs. Implemented by the resolver's
/// session; tests provide small stubs.
pub trait ClassGraph {
    fn descriptor(&self, name: &str) -> Option<Arc<ClassDescriptor>>;

    /// Up-cast distance from `from` to `ancestor`, or `None` when `ancestor`
    /// is not in `from`'s linearized hierarchy.
    fn cast_distance(&self, from: &str, ancestor: &str) -> Result<Option<u32>, ResolveError>;

    /// The type arguments `instance` supplies to `ancestor`, propagated along
    /// the declared inheritance edges. `None` when they cannot be inferred.
    fn type_args_as(&self, instance: &Type, ancestor: &str)
        -> Result<Option<Vec<Type>>, ResolveError>;
}

/// Conversion categories, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    UpCast,
    NumericUpCast,
    Unboxing,
    Boxing,
    /// Narrowing that stays inside the int range; legal only with a cast.
    ExplicitCastRequired,
    /// Narrowing out of long/float/double; legal only with a cast.
    NumericDowncast,
    /// Runtime-checked reference narrowing; legal only with a cast.
    DownCast,
    ObjectToPrimitive,
    PrimitiveToObject,
    GenericArityMismatch,
    /// A referenced class descriptor is missing; the caller must surface this.
    InsufficientData,
    Never,
}

impl CastKind {
    pub fn is_ok(self) -> bool {
        matches!(
            self,
            CastKind::UpCast | CastKind::NumericUpCast | CastKind::Unboxing | CastKind::Boxing
        )
    }

    /// Whether an explicit source-level cast can still make the conversion legal.
    pub fn allows_explicit_cast(self) -> bool {
        self.is_ok()
            || matches!(
                self,
                CastKind::ExplicitCastRequired | CastKind::NumericDowncast | CastKind::DownCast
            )
    }
}

/// The classifier's verdict. `distance` is meaningful only when
/// `kind.is_ok()`; failures carry `-1`. Callers must branch on `kind` first.
#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub kind: CastKind,
    pub distance: i32,
    /// The primitive kind routed through a wrapper, for boxing/unboxing.
    pub boxed: Option<Primitive>,
    /// The type a nested generic comparison (or a checkcast) should target.
    pub retarget: Option<Type>,
}

impl Cast {
    fn ok(kind: CastKind, distance: i32) -> Cast {
        Cast { kind, distance, boxed: None, retarget: None }
    }

    fn fail(kind: CastKind) -> Cast {
        Cast { kind, distance: -1, boxed: None, retarget: None }
    }

    fn retargeted(mut self, to: Type) -> Cast {
        self.retarget = Some(to);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.kind.is_ok()
    }
}

/// Classifies conversions against a class graph and an in-scope
/// type-parameter environment (bounds per parameter name). A separate target
/// environment applies when source and target sides see different scopes.
pub struct TypeChecker<'a> {
    graph: &'a dyn ClassGraph,
    pub type_params: HashMap<String, Vec<Type>>,
    pub target_type_params: Option<HashMap<String, Vec<Type>>>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(graph: &'a dyn ClassGraph) -> TypeChecker<'a> {
        TypeChecker { graph, type_params: HashMap::new(), target_type_params: None }
    }

    pub fn with_type_params(mut self, type_params: HashMap<String, Vec<Type>>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn classify(&self, from: &Type, to: &Type) -> Result<Cast, ResolveError> {
        self.classify_in(from, to, None)
    }

    /// `variance` is `None` at the top level and `Some(_)` inside a generic
    /// argument position, where primitives never convert and `Super` swaps
    /// the comparison direction.
    fn classify_in(
        &self,
        from: &Type,
        to: &Type,
        variance: Option<Variance>,
    ) -> Result<Cast, ResolveError> {
        if from == to {
            return Ok(Cast::ok(CastKind::UpCast, 0));
        }

        // Normalize the target down to a comparable shape.
        let mut to = to.clone();
        loop {
            match &to {
                Type::TypeParamRef { .. } => {
                    let env = self.target_type_params.as_ref().unwrap_or(&self.type_params);
                    to = self.resolve_type_param(&to, env);
                }
                Type::Any => return Ok(Cast::ok(CastKind::UpCast, 0)),
                Type::Wildcard(Capture::Unbounded) => {
                    if from.is_primitive() {
                        tracing::debug!(%from, "primitive flowing into an unbounded capture");
                    }
                    return Ok(Cast::ok(CastKind::UpCast, 0).retargeted(from.clone()));
                }
                Type::Wildcard(Capture::Bounded { bounds }) => {
                    to = bounds.first().cloned().unwrap_or_else(Type::object);
                }
                Type::Wildcard(Capture::Concrete { value, .. }) => to = (**value).clone(),
                _ => break,
            }
        }

        // Normalize the source, peeling captures.
        let mut from = from.clone();
        loop {
            match &from {
                Type::TypeParamRef { .. } => {
                    from = self.resolve_type_param(&from, &self.type_params);
                }
                // The error-recovery placeholder conforms to nothing exactly;
                // an explicit cast is always accepted.
                Type::Any => return Ok(Cast::fail(CastKind::DownCast).retargeted(to)),
                Type::Wildcard(Capture::Unbounded) => {
                    if to.is_primitive() {
                        return Ok(Cast::fail(CastKind::ObjectToPrimitive));
                    }
                    return Ok(Cast::ok(CastKind::UpCast, 0).retargeted(to));
                }
                Type::Wildcard(Capture::Bounded { bounds }) => {
                    let primary = self.resolve_type_param(
                        bounds.first().unwrap_or(&Type::object()),
                        &self.type_params,
                    );
                    let mut result = self.generic_cast(&primary, &to, variance)?;
                    if !result.kind.is_ok() {
                        for alt in bounds.iter().skip(1) {
                            let r = self.generic_cast(alt, &to, variance)?;
                            if r.kind.is_ok() {
                                result = r;
                                break;
                            }
                        }
                    }
                    if result.kind.is_ok() && result.distance != 0 && result.retarget.is_none() {
                        result.retarget = Some(primary.erased());
                    }
                    return Ok(result);
                }
                Type::Wildcard(Capture::Concrete { value, bound }) => {
                    let base = self.generic_cast(bound, &to, variance)?;
                    let direct = self.generic_cast(value, &to, variance)?;
                    if direct.kind.is_ok() {
                        // Distance is measured from the declared bound so
                        // ranking stays stable across instantiations.
                        let distance = if base.kind.is_ok() { base.distance } else { direct.distance };
                        return Ok(Cast { distance, ..direct });
                    }
                    return Ok(base.retargeted((**bound).clone()));
                }
                _ => break,
            }
        }

        self.generic_cast(&from, &to, variance)
    }

    /// Erased shapes first; per-argument containment only if that succeeds.
    fn generic_cast(
        &self,
        from: &Type,
        to: &Type,
        mut variance: Option<Variance>,
    ) -> Result<Cast, ResolveError> {
        if from == to {
            return Ok(Cast::ok(CastKind::UpCast, 0));
        }

        let mut tc: Option<Vec<Type>> = None;
        if let Type::Parameterized { variance: v, args, .. } = to {
            variance = Some(*v);
            tc = Some(args.clone());
        }

        let r = self.raw_cast(&from.erased(), &to.erased(), variance)?;

        let mut fc: Option<Vec<Type>> = None;
        if let Type::Parameterized { args, .. } = from {
            if Type::is_raw_args(args) {
                // Raw source: erasure already compared, nothing to contain.
                return Ok(if r.kind == CastKind::UpCast { r.retargeted(to.clone()) } else { r });
            }
            fc = Some(args.clone());
        }

        if r.kind != CastKind::UpCast && r.kind != CastKind::DownCast {
            return Ok(r);
        }

        if let (Some(from_name), Some(to_name)) = (from.name(), to.name()) {
            let tc = match tc {
                Some(v) => Some(v),
                None => self.graph.type_args_as(to, from_name)?,
            };
            let fc = match fc {
                Some(v) => Some(v),
                None => self.graph.type_args_as(from, to_name)?,
            };
            if let (Some(fc), Some(tc)) = (fc, tc) {
                if Type::is_raw_args(&tc) {
                    return Ok(r);
                }
                if fc.len() != tc.len() {
                    return Ok(Cast::fail(CastKind::GenericArityMismatch));
                }
                for (fa, ta) in fc.iter().zip(&tc) {
                    if !self.contains_arg(fa, ta)? {
                        return Ok(Cast::fail(CastKind::Never));
                    }
                }
            }
        }

        Ok(r)
    }

    /// Per-argument containment under the argument's declared variance:
    /// `extends` is covariant, `super` contravariant, invariant requires
    /// equality or one side erased to the unbounded wildcard.
    fn contains_arg(&self, fa: &Type, ta: &Type) -> Result<bool, ResolveError> {
        fn unconstrained(ty: &Type) -> bool {
            matches!(ty, Type::Any | Type::Wildcard(Capture::Unbounded))
        }
        fn strip_capture(ty: &Type) -> &Type {
            match ty {
                Type::Wildcard(Capture::Concrete { value, .. }) => strip_capture(value),
                other => other,
            }
        }

        if unconstrained(fa) || unconstrained(ta) {
            return Ok(true);
        }
        match ta {
            Type::Wildcard(Capture::Bounded { .. }) => {
                let cast = self.classify_in(fa, ta, Some(Variance::Extends))?;
                Ok(cast.kind == CastKind::UpCast)
            }
            _ => match ta.variance() {
                Variance::Extends | Variance::Super => {
                    let cast = self.classify_in(fa, ta, None)?;
                    Ok(cast.kind == CastKind::UpCast)
                }
                Variance::Invariant => Ok(strip_capture(fa) == strip_capture(ta)),
            },
        }
    }

    /// Erased-shape conversion: the primitive ladder, boxing routes, array
    /// widening, and the hierarchy walk.
    fn raw_cast(
        &self,
        from: &Type,
        to: &Type,
        ctx: Option<Variance>,
    ) -> Result<Cast, ResolveError> {
        if from == to {
            return Ok(Cast::ok(CastKind::UpCast, 0));
        }
        if matches!(from, Type::Primitive(Primitive::Void))
            || matches!(to, Type::Primitive(Primitive::Void))
        {
            return Ok(Cast::fail(CastKind::Never));
        }

        if let Type::Primitive(fp) = from {
            if let Type::Primitive(tp) = to {
                // Primitives never occur inside a generic argument position.
                if ctx.is_some() {
                    return Ok(Cast::fail(CastKind::Never));
                }
                return Ok(primitive_cast(*fp, *tp));
            }
            // Boxing: try the canonical wrapper, then widen to the target's
            // wrapped primitive (so byte still reaches Integer).
            let mut boxed = *fp;
            let mut cast = self.raw_cast(&Type::nominal(fp.wrapper()), to, ctx)?;
            if !cast.kind.is_ok() {
                let Some(tp) = to.unboxed() else {
                    return Ok(Cast::fail(CastKind::PrimitiveToObject));
                };
                cast = self.raw_cast(from, &Type::Primitive(tp), ctx)?;
                if !cast.kind.is_ok() {
                    return Ok(Cast::fail(CastKind::PrimitiveToObject));
                }
                boxed = tp;
            }
            cast.kind = CastKind::Boxing;
            cast.distance += BOXING_DISTANCE;
            cast.boxed = Some(boxed);
            return Ok(cast);
        }

        if let Type::Primitive(tp) = to {
            if ctx.is_some() {
                return Ok(Cast::fail(CastKind::Never));
            }
            let Some(fp) = from.unboxed() else {
                return Ok(Cast::fail(CastKind::ObjectToPrimitive));
            };
            let mut cast = if fp == *tp {
                Cast::ok(CastKind::Unboxing, 0)
            } else {
                let widened = self.raw_cast(&Type::Primitive(fp), to, None)?;
                if !widened.kind.is_ok() {
                    return Ok(widened);
                }
                widened
            };
            cast.kind = CastKind::Unboxing;
            cast.distance += BOXING_DISTANCE;
            cast.boxed = Some(*tp);
            return Ok(cast);
        }

        // Both reference. Super variance reverses the comparison.
        let (from, to) = if ctx == Some(Variance::Super) { (to, from) } else { (from, to) };

        let fd = from.array_depth();
        let td = to.array_depth();
        if fd < td {
            // To a higher dimension only by downcast out of the root object
            // type or the universal array supertypes.
            return Ok(match from.name() {
                Some(name) if name == OBJECT || ARRAY_INTERFACES.contains(&name) => {
                    Cast::fail(CastKind::DownCast).retargeted(to.clone())
                }
                _ => Cast::fail(CastKind::Never),
            });
        }
        if fd > td {
            return Ok(match to.name() {
                Some(name) if name == OBJECT => Cast::ok(CastKind::UpCast, 2),
                Some(name) if ARRAY_INTERFACES.contains(&name) => Cast::ok(CastKind::UpCast, 1),
                _ => Cast::fail(CastKind::Never),
            });
        }

        // Equal depth: covariant reference arrays reduce to their components.
        let (Some(from_name), Some(to_name)) = (from.name(), to.name()) else {
            return Ok(Cast::fail(CastKind::Never));
        };
        self.hierarchy_cast(from_name, to_name, to)
    }

    fn hierarchy_cast(
        &self,
        from_name: &str,
        to_name: &str,
        to: &Type,
    ) -> Result<Cast, ResolveError> {
        let Some(from_class) = self.graph.descriptor(from_name) else {
            return Ok(Cast::fail(CastKind::InsufficientData));
        };
        if self.graph.descriptor(to_name).is_none() {
            return Ok(Cast::fail(CastKind::InsufficientData));
        }
        if let Some(distance) = self.graph.cast_distance(from_name, to_name)? {
            return Ok(Cast::ok(CastKind::UpCast, distance as i32));
        }
        // A final source has no subtypes; a runtime check can never succeed.
        if from_class.modifiers.is_final {
            return Ok(Cast::fail(CastKind::Never));
        }
        Ok(Cast::fail(CastKind::DownCast).retargeted(to.clone()))
    }

    /// Resolve type-parameter references through `env` to bound captures,
    /// with a seen set breaking cyclic bound references.
    fn resolve_type_param(&self, ty: &Type, env: &HashMap<String, Vec<Type>>) -> Type {
        if !mentions_type_param(ty) {
            return ty.clone();
        }
        let mut seen = HashSet::new();
        self.resolve_ref(ty, env, &mut seen)
    }

    fn resolve_ref(
        &self,
        ty: &Type,
        env: &HashMap<String, Vec<Type>>,
        seen: &mut HashSet<String>,
    ) -> Type {
        match ty {
            Type::TypeParamRef { name, array, .. } => {
                if !seen.insert(name.clone()) {
                    return Type::Any;
                }
                let Some(bounds) = env.get(name) else {
                    tracing::debug!(param = %name, "type parameter not in scope while classifying");
                    return Type::Any;
                };
                let resolved: Vec<Type> =
                    bounds.iter().map(|b| self.resolve_ref(b, env, seen)).collect();
                seen.remove(name);
                let capture = if resolved.is_empty() {
                    Type::unbounded()
                } else {
                    Type::Wildcard(Capture::Bounded { bounds: resolved })
                };
                if *array == 0 {
                    capture
                } else {
                    capture.erased().plus_array_depth(*array)
                }
            }
            Type::Parameterized { name, array, variance, args } => Type::Parameterized {
                name: name.clone(),
                array: *array,
                variance: *variance,
                args: args.iter().map(|a| self.resolve_ref(a, env, seen)).collect(),
            },
            Type::Wildcard(Capture::Bounded { bounds }) => Type::Wildcard(Capture::Bounded {
                bounds: bounds.iter().map(|b| self.resolve_ref(b, env, seen)).collect(),
            }),
            Type::Wildcard(Capture::Concrete { value, bound }) => {
                Type::Wildcard(Capture::Concrete {
                    value: Box::new(self.resolve_ref(value, env, seen)),
                    bound: Box::new(self.resolve_ref(bound, env, seen)),
                })
            }
            other => other.clone(),
        }
    }
}

/// The numeric ladder. `boolean` converts with nothing; `char` and `short`
/// are cross-rank siblings requiring an explicit cast between them.
fn primitive_cast(fp: Primitive, tp: Primitive) -> Cast {
    let (Some(f), Some(t)) = (fp.rank(), tp.rank()) else {
        return Cast::fail(CastKind::Never);
    };
    if f == 0 || t == 0 {
        return Cast::fail(CastKind::Never);
    }
    if f > t {
        let kind =
            if f > 4 { CastKind::NumericDowncast } else { CastKind::ExplicitCastRequired };
        return Cast::fail(kind);
    }
    let distance = i32::from(t - f);
    if t <= 4 {
        let explicit = (f == 2 && t != 4) || t == 2;
        return if explicit {
            Cast::fail(CastKind::ExplicitCastRequired)
        } else {
            Cast::ok(CastKind::UpCast, distance)
        };
    }
    Cast::ok(CastKind::NumericUpCast, distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TypeStore;
    use crate::ty::{CLONEABLE, NUMBER, STRING};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    struct StubGraph {
        store: TypeStore,
    }

    impl StubGraph {
        fn minimal() -> StubGraph {
            StubGraph { store: TypeStore::with_minimal_rt() }
        }
    }

    impl ClassGraph for StubGraph {
        fn descriptor(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
            use crate::descriptor::ClassProvider;
            self.store.get_class_descriptor(name)
        }

        fn cast_distance(&self, from: &str, ancestor: &str) -> Result<Option<u32>, ResolveError> {
            let mut queue = VecDeque::from([(from.to_string(), 0u32)]);
            let mut seen = HashSet::new();
            while let Some((name, d)) = queue.pop_front() {
                if name == ancestor {
                    return Ok(Some(d));
                }
                if !seen.insert(name.clone()) {
                    continue;
                }
                let Some(class) = self.descriptor(&name) else { continue };
                if let Some(parent) = &class.parent {
                    queue.push_back((parent.clone(), d + 1));
                }
                for iface in &class.interfaces {
                    queue.push_back((iface.clone(), d + 1));
                }
            }
            Ok(None)
        }

        fn type_args_as(
            &self,
            _instance: &Type,
            _ancestor: &str,
        ) -> Result<Option<Vec<Type>>, ResolveError> {
            Ok(None)
        }
    }

    fn prim(p: Primitive) -> Type {
        Type::Primitive(p)
    }

    #[test]
    fn reflexivity_is_free() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);
        for ty in [prim(Primitive::Int), Type::string(), Type::nominal_array(STRING, 2)] {
            let cast = tc.classify(&ty, &ty).unwrap();
            assert_eq!((cast.kind, cast.distance), (CastKind::UpCast, 0));
        }
    }

    #[test]
    fn ladder_widens_and_refuses_narrowing() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let up = tc.classify(&prim(Primitive::Byte), &prim(Primitive::Int)).unwrap();
        assert_eq!((up.kind, up.distance), (CastKind::UpCast, 3));

        let wide = tc.classify(&prim(Primitive::Int), &prim(Primitive::Long)).unwrap();
        assert_eq!((wide.kind, wide.distance), (CastKind::NumericUpCast, 1));

        let down = tc.classify(&prim(Primitive::Long), &prim(Primitive::Int)).unwrap();
        assert_eq!(down.kind, CastKind::NumericDowncast);

        let narrow = tc.classify(&prim(Primitive::Int), &prim(Primitive::Byte)).unwrap();
        assert_eq!(narrow.kind, CastKind::ExplicitCastRequired);
    }

    #[test]
    fn char_and_short_are_cross_siblings() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        for (a, b) in [(Primitive::Char, Primitive::Short), (Primitive::Short, Primitive::Char)] {
            let cast = tc.classify(&prim(a), &prim(b)).unwrap();
            assert_eq!(cast.kind, CastKind::ExplicitCastRequired);
        }
        let through_int = tc.classify(&prim(Primitive::Char), &prim(Primitive::Int)).unwrap();
        assert_eq!((through_int.kind, through_int.distance), (CastKind::UpCast, 2));
        let wide = tc.classify(&prim(Primitive::Char), &prim(Primitive::Long)).unwrap();
        assert_eq!(wide.kind, CastKind::NumericUpCast);
    }

    #[test]
    fn boolean_converts_with_nothing() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);
        let cast = tc.classify(&prim(Primitive::Boolean), &prim(Primitive::Int)).unwrap();
        assert_eq!(cast.kind, CastKind::Never);
        let cast = tc.classify(&prim(Primitive::Int), &prim(Primitive::Boolean)).unwrap();
        assert_eq!(cast.kind, CastKind::Never);
    }

    #[test]
    fn boxing_routes_through_the_wrapper() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let direct = tc.classify(&prim(Primitive::Int), &Type::nominal("java/lang/Integer")).unwrap();
        assert_eq!((direct.kind, direct.distance), (CastKind::Boxing, BOXING_DISTANCE));
        assert_eq!(direct.boxed, Some(Primitive::Int));

        // byte reaches Integer by widening first.
        let hop = tc.classify(&prim(Primitive::Byte), &Type::nominal("java/lang/Integer")).unwrap();
        assert_eq!((hop.kind, hop.distance), (CastKind::Boxing, 3 + BOXING_DISTANCE));
        assert_eq!(hop.boxed, Some(Primitive::Int));

        // Integer is two hierarchy steps from Object, plus the box.
        let to_obj = tc.classify(&prim(Primitive::Int), &Type::object()).unwrap();
        assert_eq!((to_obj.kind, to_obj.distance), (CastKind::Boxing, 2 + BOXING_DISTANCE));

        let impossible = tc.classify(&prim(Primitive::Int), &Type::string()).unwrap();
        assert_eq!(impossible.kind, CastKind::PrimitiveToObject);
    }

    #[test]
    fn unboxing_adds_the_fixed_penalty() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let exact = tc.classify(&Type::nominal("java/lang/Integer"), &prim(Primitive::Int)).unwrap();
        assert_eq!((exact.kind, exact.distance), (CastKind::Unboxing, BOXING_DISTANCE));

        let widened =
            tc.classify(&Type::nominal("java/lang/Integer"), &prim(Primitive::Long)).unwrap();
        assert_eq!((widened.kind, widened.distance), (CastKind::Unboxing, 1 + BOXING_DISTANCE));

        let impossible = tc.classify(&Type::string(), &prim(Primitive::Int)).unwrap();
        assert_eq!(impossible.kind, CastKind::ObjectToPrimitive);
    }

    #[test]
    fn box_then_unbox_sums_both_penalties() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);
        let boxed = tc.classify(&prim(Primitive::Int), &Type::nominal("java/lang/Integer")).unwrap();
        let unboxed =
            tc.classify(&Type::nominal("java/lang/Integer"), &prim(Primitive::Int)).unwrap();
        assert_eq!(boxed.distance + unboxed.distance, 2 * BOXING_DISTANCE);
        assert!(boxed.distance > 0);
    }

    #[test]
    fn reference_upcast_uses_hierarchy_distance() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let up = tc.classify(&Type::string(), &Type::object()).unwrap();
        assert_eq!((up.kind, up.distance), (CastKind::UpCast, 1));

        let down = tc.classify(&Type::object(), &Type::string()).unwrap();
        assert_eq!(down.kind, CastKind::DownCast);
        assert_eq!(down.retarget, Some(Type::string()));

        // String is final; a sideways cast can never succeed.
        let never = tc.classify(&Type::string(), &Type::nominal(NUMBER)).unwrap();
        assert_eq!(never.kind, CastKind::Never);

        let missing = tc.classify(&Type::nominal("com/example/Ghost"), &Type::object()).unwrap();
        assert_eq!(missing.kind, CastKind::InsufficientData);
    }

    #[test]
    fn arrays_widen_to_the_universal_supertypes() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let arr = Type::nominal_array(STRING, 1);
        let to_obj = tc.classify(&arr, &Type::object()).unwrap();
        assert_eq!((to_obj.kind, to_obj.distance), (CastKind::UpCast, 2));

        let to_cloneable = tc.classify(&arr, &Type::nominal(CLONEABLE)).unwrap();
        assert_eq!((to_cloneable.kind, to_cloneable.distance), (CastKind::UpCast, 1));

        // Covariant object arrays reduce to their components.
        let covariant = tc.classify(&arr, &Type::nominal_array(OBJECT, 1)).unwrap();
        assert_eq!((covariant.kind, covariant.distance), (CastKind::UpCast, 1));

        // Gaining a dimension needs a downcast out of Object.
        let gain = tc.classify(&Type::object(), &arr).unwrap();
        assert_eq!(gain.kind, CastKind::DownCast);
        let never = tc.classify(&Type::string(), &arr).unwrap();
        assert_eq!(never.kind, CastKind::Never);
    }

    #[test]
    fn generic_arguments_are_invariant() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let list_str = Type::parameterized("java/util/List", vec![Type::string()]);
        let list_obj = Type::parameterized("java/util/List", vec![Type::object()]);
        let cast = tc.classify(&list_str, &list_obj).unwrap();
        assert_eq!(cast.kind, CastKind::Never);

        let list_ext = Type::parameterized(
            "java/util/List",
            vec![Type::Wildcard(Capture::Bounded { bounds: vec![Type::object()] })],
        );
        let cast = tc.classify(&list_str, &list_ext).unwrap();
        assert_eq!((cast.kind, cast.distance), (CastKind::UpCast, 0));
    }

    #[test]
    fn raw_source_short_circuits_with_a_retarget() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let raw = Type::parameterized("java/util/List", Type::raw_args());
        let list_str = Type::parameterized("java/util/List", vec![Type::string()]);
        let cast = tc.classify(&raw, &list_str).unwrap();
        assert_eq!((cast.kind, cast.distance), (CastKind::UpCast, 0));
        assert_eq!(cast.retarget, Some(list_str));
    }

    #[test]
    fn type_params_resolve_through_their_bounds() {
        let graph = StubGraph::minimal();
        let mut env = HashMap::new();
        env.insert("T".to_string(), vec![Type::nominal(NUMBER)]);
        let tc = TypeChecker::new(&graph).with_type_params(env);

        let up = tc.classify(&Type::type_param("T"), &Type::object()).unwrap();
        assert_eq!(up.kind, CastKind::UpCast);
        assert_eq!(up.distance, 1);

        let never = tc.classify(&Type::type_param("T"), &Type::string()).unwrap();
        assert!(!never.kind.is_ok());
    }

    #[test]
    fn unbounded_wildcards_capture_either_side() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let as_source = tc.classify(&Type::unbounded(), &Type::string()).unwrap();
        assert_eq!((as_source.kind, as_source.distance), (CastKind::UpCast, 0));
        assert_eq!(as_source.retarget, Some(Type::string()));

        let to_primitive = tc.classify(&Type::unbounded(), &prim(Primitive::Int)).unwrap();
        assert_eq!(to_primitive.kind, CastKind::ObjectToPrimitive);

        let as_target = tc.classify(&Type::string(), &Type::unbounded()).unwrap();
        assert_eq!((as_target.kind, as_target.distance), (CastKind::UpCast, 0));
        assert_eq!(as_target.retarget, Some(Type::string()));
    }

    #[test]
    fn concrete_captures_prefer_the_direct_cast() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);

        let capture = Type::Wildcard(Capture::Concrete {
            value: Box::new(Type::string()),
            bound: Box::new(Type::object()),
        });
        let cast = tc.classify(&capture, &Type::string()).unwrap();
        assert_eq!(cast.kind, CastKind::UpCast);

        let cast = tc.classify(&capture, &Type::nominal(NUMBER)).unwrap();
        assert!(!cast.kind.is_ok());
    }

    #[test]
    fn void_participates_in_no_conversion() {
        let graph = StubGraph::minimal();
        let tc = TypeChecker::new(&graph);
        let cast = tc.classify(&prim(Primitive::Void), &Type::object()).unwrap();
        assert_eq!(cast.kind, CastKind::Never);
        let cast = tc.classify(&prim(Primitive::Int), &prim(Primitive::Void)).unwrap();
        assert_eq!(cast.kind, CastKind::Never);
    }
}
