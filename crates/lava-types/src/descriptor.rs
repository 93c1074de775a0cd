//! Class descriptors: the narrow interface to the classpath/import layer.
//!
//! The engine never loads class files itself; it consumes declared shapes
//! through [`ClassProvider`]. Descriptors carry erased member signatures plus
//! the declared generic parameterization of every inheritance edge, optional
//! parameter names, and declared default-value expressions.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ty::{ClassName, Type, OBJECT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_synthetic: bool,
    pub is_bridge: bool,
    pub is_varargs: bool,
}

impl Modifiers {
    pub fn public() -> Modifiers {
        Modifiers { visibility: Visibility::Public, ..Modifiers::default() }
    }
}

/// A declared type parameter; the first bound is the erasure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeParamDecl {
    pub name: String,
    pub bounds: Vec<Type>,
}

impl TypeParamDecl {
    pub fn new(name: impl Into<String>, bounds: Vec<Type>) -> TypeParamDecl {
        TypeParamDecl { name: name.into(), bounds }
    }

    pub fn erasure(&self) -> Type {
        self.bounds.first().map(Type::erased).unwrap_or_else(Type::object)
    }
}

/// A declared default-value expression, opaque to this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValue(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub modifiers: Modifiers,
    pub ty: Type,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: Type) -> FieldDescriptor {
        FieldDescriptor { name: name.into(), modifiers: Modifiers::public(), ty }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
    /// Declared parameter names; may be absent (the name table is optional).
    pub param_names: Option<Vec<String>>,
    /// Declared default-value expressions, one slot per parameter.
    pub param_defaults: Vec<Option<DefaultValue>>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> MethodDescriptor {
        MethodDescriptor {
            name: name.into(),
            modifiers: Modifiers::public(),
            type_params: Vec::new(),
            params,
            return_type,
            throws: Vec::new(),
            param_names: None,
            param_defaults: Vec::new(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Parameter shapes with generic arguments stripped, used to decide
    /// whether a more-derived declaration hides this one.
    pub fn erased_shape(&self) -> Vec<Type> {
        self.params.iter().map(Type::erased).collect()
    }

    pub fn default_for(&self, index: usize) -> Option<&DefaultValue> {
        self.param_defaults.get(index).and_then(|d| d.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: ClassName,
    pub modifiers: Modifiers,
    pub is_interface: bool,
    pub parent: Option<ClassName>,
    /// Declared parameterization of the superclass edge, if generic.
    pub parent_args: Option<Vec<Type>>,
    pub interfaces: Vec<ClassName>,
    /// Declared parameterization per interface edge, parallel to `interfaces`.
    pub interface_args: Vec<Option<Vec<Type>>>,
    pub type_params: Vec<TypeParamDecl>,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<ClassName>) -> ClassDescriptor {
        let name = name.into();
        let parent = if name == OBJECT { None } else { Some(OBJECT.to_string()) };
        ClassDescriptor {
            name,
            modifiers: Modifiers::public(),
            is_interface: false,
            parent,
            parent_args: None,
            interfaces: Vec::new(),
            interface_args: Vec::new(),
            type_params: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<ClassName>) -> ClassDescriptor {
        let mut c = ClassDescriptor::new(name);
        c.is_interface = true;
        c.modifiers.is_abstract = true;
        c
    }

    pub fn extends(mut self, parent: impl Into<ClassName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn extends_generic(mut self, parent: impl Into<ClassName>, args: Vec<Type>) -> Self {
        self.parent = Some(parent.into());
        self.parent_args = Some(args);
        self
    }

    pub fn implements(mut self, iface: impl Into<ClassName>) -> Self {
        self.interfaces.push(iface.into());
        self.interface_args.push(None);
        self
    }

    pub fn implements_generic(mut self, iface: impl Into<ClassName>, args: Vec<Type>) -> Self {
        self.interfaces.push(iface.into());
        self.interface_args.push(Some(args));
        self
    }

    pub fn with_type_param(mut self, name: impl Into<String>, bounds: Vec<Type>) -> Self {
        self.type_params.push(TypeParamDecl::new(name, bounds));
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn final_(mut self) -> Self {
        self.modifiers.is_final = true;
        self
    }

    pub fn package(&self) -> &str {
        match self.name.rfind('/') {
            Some(i) => &self.name[..i],
            None => "",
        }
    }

    /// The declared parameterization of interface edge `i`, if any.
    pub fn interface_args_at(&self, i: usize) -> Option<&Vec<Type>> {
        self.interface_args.get(i).and_then(|a| a.as_ref())
    }

    /// First declared bound per type parameter, standing in for concrete
    /// arguments when the type is used raw.
    pub fn declared_bounds(&self) -> Vec<Type> {
        self.type_params
            .iter()
            .map(|tp| tp.bounds.first().cloned().unwrap_or_else(Type::object))
            .collect()
    }

    /// Declared bounds keyed by parameter name.
    pub fn type_param_bounds(&self) -> HashMap<String, Vec<Type>> {
        self.type_params
            .iter()
            .map(|tp| {
                let bounds =
                    if tp.bounds.is_empty() { vec![Type::object()] } else { tp.bounds.clone() };
                (tp.name.clone(), bounds)
            })
            .collect()
    }
}

/// The class-descriptor provider consumed by the engine.
pub trait ClassProvider: Send + Sync {
    fn get_class_descriptor(&self, name: &str) -> Option<Arc<ClassDescriptor>>;
}
