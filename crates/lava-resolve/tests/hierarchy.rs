use std::sync::Arc;

use pretty_assertions::assert_eq;

use lava_resolve::{common_ancestor, ResolveError, Session};
use lava_types::descriptor::ClassDescriptor;
use lava_types::ty::{CLONEABLE, OBJECT};
use lava_types::TypeStore;

fn session() -> Session {
    Session::new(Arc::new(TypeStore::with_minimal_rt()))
}

#[test]
fn superclass_chain_distances() {
    let session = session();
    let view = session.linked("java/lang/Integer").unwrap().hierarchy(&session).unwrap();

    assert_eq!(view.distance_to("java/lang/Integer"), Some(0));
    assert_eq!(view.distance_to("java/lang/Number"), Some(1));
    assert_eq!(view.distance_to(OBJECT), Some(2));
    assert_eq!(view.distance_to("java/lang/String"), None);
}

#[test]
fn interface_closure_distances() {
    let session = session();
    let view = session.linked("java/util/ArrayList").unwrap().hierarchy(&session).unwrap();

    // Direct interfaces sit one step away; their superinterfaces add theirs.
    assert_eq!(view.distance_to("java/util/List"), Some(1));
    assert_eq!(view.distance_to(CLONEABLE), Some(1));
    assert_eq!(view.distance_to("java/util/Collection"), Some(2));
    assert_eq!(view.distance_to("java/lang/Iterable"), Some(3));
}

#[test]
fn shortest_interface_path_wins() {
    let store = TypeStore::with_minimal_rt();
    // Both a direct edge and a longer path through List reach Collection.
    store.insert(
        ClassDescriptor::new("test/Both")
            .implements_generic("java/util/List", vec![lava_types::Type::string()])
            .implements_generic("java/util/Collection", vec![lava_types::Type::string()]),
    );
    let session = Session::new(Arc::new(store));
    let view = session.linked("test/Both").unwrap().hierarchy(&session).unwrap();

    assert_eq!(view.distance_to("java/util/Collection"), Some(1));
}

#[test]
fn self_is_first_in_derivation_order() {
    let session = session();
    let view = session.linked("java/lang/String").unwrap().hierarchy(&session).unwrap();
    assert_eq!(view.names_in_order().next().map(String::as_str), Some("java/lang/String"));
}

#[test]
fn superclass_cycle_is_an_error_not_a_hang() {
    let store = TypeStore::with_minimal_rt();
    store.insert(ClassDescriptor::new("test/A").extends("test/B"));
    store.insert(ClassDescriptor::new("test/B").extends("test/A"));
    let session = Session::new(Arc::new(store));

    let err = session.linked("test/A").unwrap().hierarchy(&session).unwrap_err();
    assert!(matches!(err, ResolveError::CyclicInheritance(_)));
}

#[test]
fn interface_cycle_is_an_error_not_a_hang() {
    let store = TypeStore::with_minimal_rt();
    store.insert(ClassDescriptor::interface("test/I").implements("test/J"));
    store.insert(ClassDescriptor::interface("test/J").implements("test/I"));
    let session = Session::new(Arc::new(store));

    let err = session.linked("test/I").unwrap().hierarchy(&session).unwrap_err();
    assert!(matches!(err, ResolveError::CyclicInheritance(_)));
}

#[test]
fn concurrent_builders_of_an_interface_cycle_both_error() {
    let store = TypeStore::with_minimal_rt();
    store.insert(ClassDescriptor::interface("test/I").implements("test/J"));
    store.insert(ClassDescriptor::interface("test/J").implements("test/I"));
    let session = Arc::new(Session::new(Arc::new(store)));

    // One thread links the cycle from each end; neither may end up waiting
    // for the other's build to finish.
    let barrier = Arc::new(std::sync::Barrier::new(2));
    let handles: Vec<_> = ["test/I", "test/J"]
        .into_iter()
        .map(|name| {
            let session = Arc::clone(&session);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                session.linked(name).unwrap().hierarchy(&session)
            })
        })
        .collect();
    for handle in handles {
        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(err, ResolveError::CyclicInheritance(_)));
    }
}

#[test]
fn failed_build_does_not_poison_other_classes() {
    let store = TypeStore::with_minimal_rt();
    store.insert(ClassDescriptor::new("test/A").extends("test/B"));
    store.insert(ClassDescriptor::new("test/B").extends("test/A"));
    store.insert(ClassDescriptor::new("test/Ok"));
    let session = Session::new(Arc::new(store));

    assert!(session.linked("test/A").unwrap().hierarchy(&session).is_err());
    let view = session.linked("test/Ok").unwrap().hierarchy(&session).unwrap();
    assert_eq!(view.distance_to(OBJECT), Some(1));
}

#[test]
fn common_ancestor_prefers_the_nearest_shared_class() {
    let session = session();
    let a = session.linked("java/lang/Integer").unwrap().hierarchy(&session).unwrap();
    let b = session.linked("java/lang/Long").unwrap().hierarchy(&session).unwrap();

    assert_eq!(common_ancestor(&a, &b), "java/lang/Number");
    assert_eq!(common_ancestor(&b, &a), "java/lang/Number");
}

#[test]
fn unrelated_classes_meet_at_the_root() {
    let store = TypeStore::with_minimal_rt();
    store.insert(ClassDescriptor::new("test/Foo"));
    store.insert(ClassDescriptor::new("test/Bar"));
    let session = Session::new(Arc::new(store));

    let a = session.linked("test/Foo").unwrap().hierarchy(&session).unwrap();
    let b = session.linked("test/Bar").unwrap().hierarchy(&session).unwrap();
    assert_eq!(common_ancestor(&a, &b), OBJECT);
}

#[test]
fn concurrent_queries_share_one_built_view() {
    let session = Arc::new(session());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                session.linked("java/util/ArrayList").unwrap().hierarchy(&session).unwrap()
            })
        })
        .collect();
    let views: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for view in &views[1..] {
        assert!(Arc::ptr_eq(&views[0], view));
    }
}

#[test]
fn missing_superclass_truncates_instead_of_failing() {
    let store = TypeStore::with_minimal_rt();
    store.insert(ClassDescriptor::new("test/Orphan").extends("test/Ghost"));
    let session = Session::new(Arc::new(store));

    let view = session.linked("test/Orphan").unwrap().hierarchy(&session).unwrap();
    assert_eq!(view.distance_to("test/Ghost"), Some(1));
    assert_eq!(view.distance_to(OBJECT), None);
}
