//! In-memory class-descriptor store.
//!
//! Production front-ends implement [`ClassProvider`] over the real classpath;
//! tests use [`TypeStore::with_minimal_rt`], a hand-built slice of the runtime
//! library that is just large enough to exercise boxing, hierarchy walks, and
//! generic inference.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::descriptor::{ClassDescriptor, ClassProvider, MethodDescriptor};
use crate::ty::{Primitive, Type, CLONEABLE, NUMBER, OBJECT, SERIALIZABLE, STRING};

#[derive(Default)]
pub struct TypeStore {
    classes: RwLock<HashMap<String, Arc<ClassDescriptor>>>,
}

impl TypeStore {
    pub fn new() -> TypeStore {
        TypeStore::default()
    }

    pub fn insert(&self, class: ClassDescriptor) -> Arc<ClassDescriptor> {
        let class = Arc::new(class);
        let mut classes = match self.classes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        classes.insert(class.name.clone(), Arc::clone(&class));
        class
    }

    /// A store seeded with a minimal slice of the runtime library: the root
    /// object, the eight wrappers plus `Void`, `String` and its interfaces,
    /// and a small generic collection chain.
    pub fn with_minimal_rt() -> TypeStore {
        let store = TypeStore::new();

        store.insert(ClassDescriptor::new(OBJECT));
        store.insert(ClassDescriptor::interface(CLONEABLE));
        store.insert(ClassDescriptor::interface(SERIALIZABLE));
        store.insert(ClassDescriptor::interface("java/lang/CharSequence"));
        store.insert(
            ClassDescriptor::interface("java/lang/Comparable").with_type_param("T", vec![]),
        );

        store.insert(
            ClassDescriptor::new(STRING)
                .final_()
                .implements("java/lang/CharSequence")
                .implements(SERIALIZABLE)
                .implements_generic("java/lang/Comparable", vec![Type::string()])
                .with_method(MethodDescriptor::new(
                    "length",
                    vec![],
                    Type::Primitive(Primitive::Int),
                )),
        );

        store.insert(
            ClassDescriptor::new(NUMBER)
                .implements(SERIALIZABLE)
                .with_method(MethodDescriptor::new(
                    "intValue",
                    vec![],
                    Type::Primitive(Primitive::Int),
                )),
        );

        for p in [
            Primitive::Byte,
            Primitive::Short,
            Primitive::Int,
            Primitive::Long,
            Primitive::Float,
            Primitive::Double,
        ] {
            store.insert(
                ClassDescriptor::new(p.wrapper())
                    .final_()
                    .extends(NUMBER)
                    .implements_generic("java/lang/Comparable", vec![Type::nominal(p.wrapper())]),
            );
        }
        for p in [Primitive::Boolean, Primitive::Char] {
            store.insert(
                ClassDescriptor::new(p.wrapper())
                    .final_()
                    .implements(SERIALIZABLE)
                    .implements_generic("java/lang/Comparable", vec![Type::nominal(p.wrapper())]),
            );
        }
        store.insert(ClassDescriptor::new(Primitive::Void.wrapper()).final_());

        store.insert(
            ClassDescriptor::interface("java/lang/Iterable").with_type_param("T", vec![]),
        );
        store.insert(
            ClassDescriptor::interface("java/util/Collection")
                .with_type_param("E", vec![])
                .implements_generic("java/lang/Iterable", vec![Type::type_param("E")])
                .with_method(MethodDescriptor::new(
                    "size",
                    vec![],
                    Type::Primitive(Primitive::Int),
                ))
                .with_method(MethodDescriptor::new(
                    "add",
                    vec![Type::type_param("E")],
                    Type::Primitive(Primitive::Boolean),
                )),
        );
        store.insert(
            ClassDescriptor::interface("java/util/List")
                .with_type_param("E", vec![])
                .implements_generic("java/util/Collection", vec![Type::type_param("E")])
                .with_method(MethodDescriptor::new(
                    "get",
                    vec![Type::Primitive(Primitive::Int)],
                    Type::type_param("E"),
                )),
        );
        store.insert(
            ClassDescriptor::new("java/util/ArrayList")
                .with_type_param("E", vec![])
                .implements_generic("java/util/List", vec![Type::type_param("E")])
                .implements(CLONEABLE)
                .with_method(MethodDescriptor::new("<init>", vec![], Type::Primitive(Primitive::Void))),
        );

        store
    }
}

impl ClassProvider for TypeStore {
    fn get_class_descriptor(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        let classes = match self.classes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        classes.get(name).cloned()
    }
}
