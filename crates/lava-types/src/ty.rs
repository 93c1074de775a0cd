//! The algebraic type model.
//!
//! Types are immutable values compared structurally. Array depth and variance
//! are orthogonal to the base shape: `? extends Foo<T>[]` is a
//! [`Type::Parameterized`] with `array = 1` and `variance = Extends`.
//! Substitution returns new values; shared types are never mutated in place.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Internal (slash-separated) fully qualified class name, e.g. `java/lang/Object`.
pub type ClassName = String;

pub const OBJECT: &str = "java/lang/Object";
pub const STRING: &str = "java/lang/String";
pub const NUMBER: &str = "java/lang/Number";
pub const CLONEABLE: &str = "java/lang/Cloneable";
pub const SERIALIZABLE: &str = "java/io/Serializable";

/// Interfaces every array type implements, in distance order.
pub const ARRAY_INTERFACES: [&str; 2] = [CLONEABLE, SERIALIZABLE];

/// Primitive kinds, including `void` (which participates in no conversion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    /// Position on the numeric widening ladder:
    /// `boolean(0) < byte(1) < char(2)/short(3) < int(4) < long(5) < float(6) < double(7)`.
    ///
    /// `boolean` holds rank 0 but never widens; `char` and `short` are
    /// cross-rank siblings that only interconvert with an explicit cast.
    pub fn rank(self) -> Option<u8> {
        Some(match self {
            Primitive::Boolean => 0,
            Primitive::Byte => 1,
            Primitive::Char => 2,
            Primitive::Short => 3,
            Primitive::Int => 4,
            Primitive::Long => 5,
            Primitive::Float => 6,
            Primitive::Double => 7,
            Primitive::Void => return None,
        })
    }

    /// The canonical wrapper class for this primitive.
    pub fn wrapper(self) -> &'static str {
        match self {
            Primitive::Boolean => "java/lang/Boolean",
            Primitive::Byte => "java/lang/Byte",
            Primitive::Char => "java/lang/Character",
            Primitive::Short => "java/lang/Short",
            Primitive::Int => "java/lang/Integer",
            Primitive::Long => "java/lang/Long",
            Primitive::Float => "java/lang/Float",
            Primitive::Double => "java/lang/Double",
            Primitive::Void => "java/lang/Void",
        }
    }

    /// Reverse wrapper lookup.
    pub fn from_wrapper(name: &str) -> Option<Primitive> {
        Some(match name {
            "java/lang/Boolean" => Primitive::Boolean,
            "java/lang/Byte" => Primitive::Byte,
            "java/lang/Character" => Primitive::Char,
            "java/lang/Short" => Primitive::Short,
            "java/lang/Integer" => Primitive::Int,
            "java/lang/Long" => Primitive::Long,
            "java/lang/Float" => Primitive::Float,
            "java/lang/Double" => Primitive::Double,
            "java/lang/Void" => Primitive::Void,
            _ => return None,
        })
    }

    fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }
}

/// Whether a generic argument position accepts subtypes, supertypes, or
/// requires exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Variance {
    #[default]
    Invariant,
    Extends,
    Super,
}

/// A bound-carrying capture variable.
///
/// `Unbounded` is the plain `?`. `Bounded` is a produced-only capture of a
/// type parameter's declared bounds (primary bound first). `Concrete` is an
/// instantiated type-parameter occurrence that keeps its declared bound so a
/// nested generic comparison can be re-targeted through it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capture {
    Unbounded,
    Bounded { bounds: Vec<Type> },
    Concrete { value: Box<Type>, bound: Box<Type> },
}

/// The type algebra.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(Primitive),
    /// Erased reference type, possibly an array of it.
    Nominal { name: ClassName, array: u8 },
    /// Reference type carrying generic arguments.
    ///
    /// `args.len()` must equal the declaring type's parameter count, except
    /// for the single-element raw sentinel (see [`Type::raw_args`]).
    Parameterized {
        name: ClassName,
        array: u8,
        variance: Variance,
        args: Vec<Type>,
    },
    /// Reference to an in-scope type parameter by name.
    TypeParamRef {
        name: String,
        array: u8,
        variance: Variance,
    },
    Wildcard(Capture),
    /// The unresolved / error-recovery placeholder.
    Any,
}

impl Type {
    pub fn nominal(name: impl Into<ClassName>) -> Type {
        Type::Nominal { name: name.into(), array: 0 }
    }

    pub fn nominal_array(name: impl Into<ClassName>, array: u8) -> Type {
        Type::Nominal { name: name.into(), array }
    }

    pub fn object() -> Type {
        Type::nominal(OBJECT)
    }

    pub fn string() -> Type {
        Type::nominal(STRING)
    }

    pub fn parameterized(name: impl Into<ClassName>, args: Vec<Type>) -> Type {
        Type::Parameterized { name: name.into(), array: 0, variance: Variance::Invariant, args }
    }

    pub fn parameterized_with(
        name: impl Into<ClassName>,
        array: u8,
        variance: Variance,
        args: Vec<Type>,
    ) -> Type {
        Type::Parameterized { name: name.into(), array, variance, args }
    }

    pub fn type_param(name: impl Into<String>) -> Type {
        Type::TypeParamRef { name: name.into(), array: 0, variance: Variance::Invariant }
    }

    pub fn unbounded() -> Type {
        Type::Wildcard(Capture::Unbounded)
    }

    /// The argument list marking a raw (argument-stripped) use of a generic
    /// type, for which declared bounds stand in for concrete arguments.
    pub fn raw_args() -> Vec<Type> {
        vec![Type::Any]
    }

    pub fn is_raw_args(args: &[Type]) -> bool {
        args.len() == 1 && args[0] == Type::Any
    }

    pub fn array_depth(&self) -> u8 {
        match self {
            Type::Nominal { array, .. }
            | Type::Parameterized { array, .. }
            | Type::TypeParamRef { array, .. } => *array,
            _ => 0,
        }
    }

    /// A copy of this type at the given array depth.
    pub fn with_array_depth(&self, depth: u8) -> Type {
        let mut out = self.clone();
        match &mut out {
            Type::Nominal { array, .. }
            | Type::Parameterized { array, .. }
            | Type::TypeParamRef { array, .. } => *array = depth,
            _ => {}
        }
        out
    }

    pub fn plus_array_depth(&self, extra: u8) -> Type {
        self.with_array_depth(self.array_depth() + extra)
    }

    /// The nominal name of a reference shape, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Nominal { name, .. } | Type::Parameterized { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn variance(&self) -> Variance {
        match self {
            Type::Parameterized { variance, .. } | Type::TypeParamRef { variance, .. } => *variance,
            _ => Variance::Invariant,
        }
    }

    pub fn with_variance(&self, variance: Variance) -> Type {
        let mut out = self.clone();
        match &mut out {
            Type::Parameterized { variance: v, .. } | Type::TypeParamRef { variance: v, .. } => {
                *v = variance
            }
            _ => {}
        }
        out
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// The argument-stripped shape. Captures erase through their bound; the
    /// unbounded wildcard and the placeholder erase to the root object type.
    pub fn erased(&self) -> Type {
        match self {
            Type::Parameterized { name, array, .. } => Type::nominal_array(name.clone(), *array),
            Type::Wildcard(Capture::Unbounded) | Type::Any => Type::object(),
            Type::Wildcard(Capture::Bounded { bounds }) => {
                bounds.first().map(Type::erased).unwrap_or_else(Type::object)
            }
            Type::Wildcard(Capture::Concrete { value, .. }) => value.erased(),
            other => other.clone(),
        }
    }

    /// The primitive kind this type unboxes to, resolving captures through
    /// their concrete value first.
    pub fn unboxed(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(*p),
            Type::Nominal { name, array: 0 } | Type::Parameterized { name, array: 0, .. } => {
                Primitive::from_wrapper(name)
            }
            Type::Wildcard(Capture::Concrete { value, .. }) => value.unboxed(),
            Type::Wildcard(Capture::Bounded { bounds }) => bounds.first()?.unboxed(),
            _ => None,
        }
    }

    /// The wrapper type of a primitive, or the type itself otherwise.
    pub fn boxed(&self) -> Type {
        match self {
            Type::Primitive(p) => Type::nominal(p.wrapper()),
            other => other.clone(),
        }
    }
}

/// Whether any type-parameter reference occurs in `ty`.
pub fn mentions_type_param(ty: &Type) -> bool {
    match ty {
        Type::TypeParamRef { .. } => true,
        Type::Parameterized { args, .. } => args.iter().any(mentions_type_param),
        Type::Wildcard(Capture::Bounded { bounds }) => bounds.iter().any(mentions_type_param),
        Type::Wildcard(Capture::Concrete { value, bound }) => {
            mentions_type_param(value) || mentions_type_param(bound)
        }
        _ => false,
    }
}

/// For every type parameter without an exact binding, bind it to a
/// produced-only capture of its declared bounds with the variance inverted:
/// a declared upper bound becomes an extends-capture on the unbound side.
pub fn fill_default_type_params(
    bounds: &HashMap<String, Vec<Type>>,
    exact: &mut HashMap<String, Type>,
) {
    for (name, declared) in bounds {
        if exact.contains_key(name) {
            continue;
        }
        let capture = if declared.is_empty() {
            Type::unbounded()
        } else {
            Type::Wildcard(Capture::Bounded { bounds: declared.clone() })
        };
        exact.insert(name.clone(), capture);
    }
}

/// Substitute resolved type-parameter bindings through `ty`, returning a new
/// value. An instantiated occurrence is wrapped in a [`Capture::Concrete`]
/// that keeps the parameter's declared bound.
pub fn substitute_type_params(
    ty: &Type,
    exact: &HashMap<String, Type>,
    bounds: &HashMap<String, Vec<Type>>,
) -> Type {
    match ty {
        Type::TypeParamRef { name, array, variance } => {
            let Some(binding) = exact.get(name) else {
                tracing::debug!(param = %name, "no binding for type parameter during substitution");
                return Type::Any;
            };
            if let Type::Wildcard(_) = binding {
                return binding.clone();
            }
            if *binding == Type::Any {
                return Type::object();
            }
            let value = if *array > 0 { binding.plus_array_depth(*array) } else { binding.clone() };
            if *variance == Variance::Super {
                tracing::warn!(param = %name, "super-variant type parameter occurrence; using binding as-is");
                return value;
            }
            let declared = bounds
                .get(name)
                .and_then(|b| b.first().cloned())
                .unwrap_or_else(Type::object);
            Type::Wildcard(Capture::Concrete { value: Box::new(value), bound: Box::new(declared) })
        }
        Type::Parameterized { name, array, variance, args } => Type::Parameterized {
            name: name.clone(),
            array: *array,
            variance: *variance,
            args: args.iter().map(|a| substitute_type_params(a, exact, bounds)).collect(),
        },
        Type::Wildcard(Capture::Bounded { bounds: bs }) => Type::Wildcard(Capture::Bounded {
            bounds: bs.iter().map(|b| substitute_type_params(b, exact, bounds)).collect(),
        }),
        Type::Wildcard(Capture::Concrete { value, bound }) => Type::Wildcard(Capture::Concrete {
            value: Box::new(substitute_type_params(value, exact, bounds)),
            bound: Box::new(substitute_type_params(bound, exact, bounds)),
        }),
        other => other.clone(),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn dotted(name: &str) -> String {
            name.replace('/', ".")
        }
        fn prefix(f: &mut fmt::Formatter<'_>, variance: Variance) -> fmt::Result {
            match variance {
                Variance::Invariant => Ok(()),
                Variance::Extends => write!(f, "? extends "),
                Variance::Super => write!(f, "? super "),
            }
        }
        fn arrays(f: &mut fmt::Formatter<'_>, depth: u8) -> fmt::Result {
            for _ in 0..depth {
                write!(f, "[]")?;
            }
            Ok(())
        }

        match self {
            Type::Primitive(p) => write!(f, "{}", p.keyword()),
            Type::Nominal { name, array } => {
                write!(f, "{}", dotted(name))?;
                arrays(f, *array)
            }
            Type::Parameterized { name, array, variance, args } => {
                prefix(f, *variance)?;
                write!(f, "{}<", dotted(name))?;
                if Type::is_raw_args(args) {
                    // raw use, rendered as a diamond
                } else {
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                }
                write!(f, ">")?;
                arrays(f, *array)
            }
            Type::TypeParamRef { name, array, variance } => {
                prefix(f, *variance)?;
                write!(f, "{name}")?;
                arrays(f, *array)
            }
            Type::Wildcard(Capture::Unbounded) => write!(f, "?"),
            Type::Wildcard(Capture::Bounded { bounds }) => {
                write!(f, "? extends ")?;
                for (i, b) in bounds.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{b}")?;
                }
                Ok(())
            }
            Type::Wildcard(Capture::Concrete { value, .. }) => write!(f, "{value}"),
            Type::Any => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wrapper_table_round_trips() {
        for p in [
            Primitive::Boolean,
            Primitive::Byte,
            Primitive::Char,
            Primitive::Short,
            Primitive::Int,
            Primitive::Long,
            Primitive::Float,
            Primitive::Double,
        ] {
            assert_eq!(Primitive::from_wrapper(p.wrapper()), Some(p));
        }
    }

    #[test]
    fn ladder_ranks_are_strictly_ordered() {
        let ranks: Vec<u8> = [
            Primitive::Boolean,
            Primitive::Byte,
            Primitive::Char,
            Primitive::Short,
            Primitive::Int,
            Primitive::Long,
            Primitive::Float,
            Primitive::Double,
        ]
        .iter()
        .map(|p| p.rank().unwrap())
        .collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(Primitive::Void.rank(), None);
    }

    #[test]
    fn substitution_wraps_instantiations_in_concrete_captures() {
        let mut exact = HashMap::new();
        exact.insert("T".to_string(), Type::string());
        let mut bounds = HashMap::new();
        bounds.insert("T".to_string(), vec![Type::object()]);

        let out = substitute_type_params(&Type::type_param("T"), &exact, &bounds);
        assert_eq!(
            out,
            Type::Wildcard(Capture::Concrete {
                value: Box::new(Type::string()),
                bound: Box::new(Type::object()),
            })
        );
    }

    #[test]
    fn unbound_params_default_to_inverted_variance_captures() {
        let mut bounds = HashMap::new();
        bounds.insert("T".to_string(), vec![Type::nominal(NUMBER)]);
        let mut exact = HashMap::new();
        fill_default_type_params(&bounds, &mut exact);
        assert_eq!(
            exact.get("T"),
            Some(&Type::Wildcard(Capture::Bounded { bounds: vec![Type::nominal(NUMBER)] }))
        );
    }

    #[test]
    fn display_renders_java_like_spellings() {
        let ty = Type::parameterized_with(
            "java/util/List",
            1,
            Variance::Extends,
            vec![Type::nominal(NUMBER)],
        );
        assert_eq!(ty.to_string(), "? extends java.util.List<java.lang.Number>[]");
        assert_eq!(Type::Primitive(Primitive::Int).to_string(), "int");
    }
}
