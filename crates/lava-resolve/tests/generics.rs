use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tracing_subscriber::{layer::Context, prelude::*, Layer};

use lava_resolve::{infer_generic, least_upper_bound, ResolveError, Session};
use lava_types::descriptor::ClassDescriptor;
use lava_types::ty::{Capture, CLONEABLE, NUMBER, OBJECT};
use lava_types::{Type, TypeStore};

fn session() -> Session {
    Session::new(Arc::new(TypeStore::with_minimal_rt()))
}

fn erased(args: &[Type]) -> Vec<Type> {
    args.iter().map(Type::erased).collect()
}

#[test]
fn instance_at_its_own_class_reads_arguments_directly() {
    let session = session();
    let list = Type::parameterized("java/util/List", vec![Type::string()]);
    let args = infer_generic(&session, &list, "java/util/List").unwrap().unwrap();
    assert_eq!(args, vec![Type::string()]);
}

#[test]
fn arguments_thread_through_interface_edges() {
    let session = session();
    let list = Type::parameterized("java/util/ArrayList", vec![Type::string()]);

    let as_list = infer_generic(&session, &list, "java/util/List").unwrap().unwrap();
    assert_eq!(erased(&as_list), vec![Type::string()]);

    let as_iterable = infer_generic(&session, &list, "java/lang/Iterable").unwrap().unwrap();
    assert_eq!(erased(&as_iterable), vec![Type::string()]);
}

#[test]
fn concrete_edge_arguments_need_no_instance() {
    let store = TypeStore::with_minimal_rt();
    store.insert(
        ClassDescriptor::new("test/Strings")
            .implements_generic("java/util/List", vec![Type::string()]),
    );
    store.insert(ClassDescriptor::new("test/MoreStrings").extends("test/Strings"));
    let session = Session::new(Arc::new(store));

    // The parameterization is fixed at the edge; an erased instance suffices,
    // and it propagates through a plain subclass edge unchanged.
    let direct = infer_generic(&session, &Type::nominal("test/Strings"), "java/util/List");
    assert_eq!(direct.unwrap(), Some(vec![Type::string()]));
    let inherited = infer_generic(&session, &Type::nominal("test/MoreStrings"), "java/util/List");
    assert_eq!(inherited.unwrap(), Some(vec![Type::string()]));
}

#[test]
fn raw_instance_erases_to_declared_bounds() {
    let store = TypeStore::with_minimal_rt();
    store.insert(
        ClassDescriptor::new("test/NumberList")
            .with_type_param("T", vec![Type::nominal(NUMBER)])
            .implements_generic("java/util/List", vec![Type::type_param("T")]),
    );
    let session = Session::new(Arc::new(store));

    let raw = Type::parameterized("test/NumberList", Type::raw_args());
    let args = infer_generic(&session, &raw, "java/util/List").unwrap().unwrap();
    assert_eq!(
        args,
        vec![Type::Wildcard(Capture::Bounded { bounds: vec![Type::nominal(NUMBER)] })]
    );
}

#[test]
fn non_parameterized_ancestors_have_no_view() {
    let session = session();
    let list = Type::parameterized("java/util/ArrayList", vec![Type::string()]);
    assert_eq!(infer_generic(&session, &list, OBJECT).unwrap(), None);
    assert_eq!(infer_generic(&session, &Type::Primitive(lava_types::Primitive::Int), "java/util/List").unwrap(), None);
}

#[test]
fn join_of_two_numerics_is_number() {
    let session = session();
    let int = Type::Primitive(lava_types::Primitive::Int);
    let long = Type::Primitive(lava_types::Primitive::Long);
    assert_eq!(least_upper_bound(&session, &int, &long).unwrap(), Type::nominal(NUMBER));
}

#[test]
fn join_with_boolean_falls_back_to_object() {
    let session = session();
    let int = Type::Primitive(lava_types::Primitive::Int);
    let boolean = Type::Primitive(lava_types::Primitive::Boolean);
    assert_eq!(least_upper_bound(&session, &int, &boolean).unwrap(), Type::object());
}

#[test]
fn join_of_wrappers_meets_at_number() {
    let session = session();
    let a = Type::nominal("java/lang/Integer");
    let b = Type::nominal("java/lang/Long");
    assert_eq!(least_upper_bound(&session, &a, &b).unwrap(), Type::nominal(NUMBER));
}

#[test]
fn join_is_symmetric_for_unrelated_classes() {
    let store = TypeStore::with_minimal_rt();
    store.insert(ClassDescriptor::new("test/Foo"));
    store.insert(ClassDescriptor::new("test/Bar"));
    let session = Session::new(Arc::new(store));

    let foo = Type::nominal("test/Foo");
    let bar = Type::nominal("test/Bar");
    assert_eq!(least_upper_bound(&session, &foo, &bar).unwrap(), Type::object());
    assert_eq!(least_upper_bound(&session, &bar, &foo).unwrap(), Type::object());
}

#[test]
fn join_recurses_into_shared_parameterizations() {
    let session = session();
    let a = Type::parameterized("java/util/List", vec![Type::nominal("java/lang/Integer")]);
    let b = Type::parameterized("java/util/List", vec![Type::nominal("java/lang/Long")]);
    assert_eq!(
        least_upper_bound(&session, &a, &b).unwrap(),
        Type::parameterized("java/util/List", vec![Type::nominal(NUMBER)])
    );
}

#[test]
fn self_referential_parameterization_collapses_to_wildcard() {
    let session = session();
    // String and Integer meet at Comparable, whose argument would name the
    // operands themselves.
    let joined = least_upper_bound(&session, &Type::string(), &Type::nominal("java/lang/Integer"))
        .unwrap();
    assert_eq!(
        joined,
        Type::parameterized("java/lang/Comparable", vec![Type::unbounded()])
    );
}

#[test]
fn array_depth_mismatch_joins_at_object_or_the_array_marker() {
    let session = session();
    let flat = Type::string();
    let arr = Type::nominal_array("java/lang/String", 1);
    let arr2 = Type::nominal_array("java/lang/String", 2);

    assert_eq!(least_upper_bound(&session, &flat, &arr).unwrap(), Type::object());
    assert_eq!(least_upper_bound(&session, &arr, &arr2).unwrap(), Type::nominal(CLONEABLE));
}

#[test]
fn cyclic_generic_edges_error_instead_of_hanging() {
    let store = TypeStore::with_minimal_rt();
    store.insert(
        ClassDescriptor::interface("test/I").implements_generic("test/J", vec![Type::string()]),
    );
    store.insert(
        ClassDescriptor::interface("test/J").implements_generic("test/I", vec![Type::string()]),
    );
    let session = Arc::new(Session::new(Arc::new(store)));

    // Argument propagation walks the same cyclic edges; one thread starts
    // from each end.
    let barrier = Arc::new(std::sync::Barrier::new(2));
    let handles: Vec<_> = ["test/I", "test/J"]
        .into_iter()
        .map(|name| {
            let session = Arc::clone(&session);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                infer_generic(&session, &Type::nominal(name), "java/util/List")
            })
        })
        .collect();
    for handle in handles {
        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(err, ResolveError::CyclicInheritance(_)));
    }
}

#[derive(Clone)]
struct TargetCapture {
    targets: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> Layer<S> for TargetCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.targets.lock().unwrap().push(event.metadata().target().to_string());
    }
}

#[test]
fn boolean_numeric_join_reports_a_debug_event() {
    let targets = Arc::new(Mutex::new(Vec::new()));
    let subscriber =
        tracing_subscriber::registry().with(TargetCapture { targets: Arc::clone(&targets) });
    tracing::subscriber::with_default(subscriber, || {
        let session = session();
        let int = Type::Primitive(lava_types::Primitive::Int);
        let boolean = Type::Primitive(lava_types::Primitive::Boolean);
        assert_eq!(least_upper_bound(&session, &int, &boolean).unwrap(), Type::object());
    });
    assert!(targets.lock().unwrap().iter().any(|t| t == "lava_resolve::generics"));
}

#[test]
fn unbounded_capture_yields_the_other_operand() {
    let session = session();
    let joined = least_upper_bound(&session, &Type::unbounded(), &Type::string()).unwrap();
    assert_eq!(joined, Type::string());
    let boxed =
        least_upper_bound(&session, &Type::Primitive(lava_types::Primitive::Int), &Type::unbounded())
            .unwrap();
    assert_eq!(boxed, Type::nominal("java/lang/Integer"));
}
