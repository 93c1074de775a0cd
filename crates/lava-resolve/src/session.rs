//! The per-compilation cache owner.
//!
//! A [`Session`] wraps a [`ClassProvider`] and hands out [`LinkedClass`]
//! handles whose hierarchy, member tables and ancestor parameterizations are
//! built lazily, once, under a per-slot lock. Concurrent first-queriers block
//! until the builder finishes; a same-thread re-entry into a slot that is
//! still building means the inheritance graph is cyclic. A builder itself
//! never waits on another class's slot (see `hierarchy::interface_view`), so
//! cyclic input errors under any thread interleaving.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use lava_types::cast::ClassGraph;
use lava_types::descriptor::{ClassDescriptor, ClassProvider, FieldDescriptor, MethodDescriptor};
use lava_types::error::ResolveError;
use lava_types::ty::{ClassName, Type};

use crate::candidates::{build_field_table, build_method_table, CandidateSet};
use crate::generics::{build_ancestor_args, infer_generic, AncestorArgs};
use crate::hierarchy::{build_hierarchy, HierarchyView};

pub type MethodTable = HashMap<String, CandidateSet<MethodDescriptor>>;
pub type FieldTable = HashMap<String, CandidateSet<FieldDescriptor>>;

/// A synthetic-accessor materialization request, drained by codegen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorRequest {
    pub owner: ClassName,
    pub member: String,
    pub kind: AccessorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Method,
    Field,
}

enum SlotState<T> {
    Empty,
    Building(ThreadId),
    Ready(Arc<T>),
}

/// A once-built cache slot with same-thread re-entry detection.
struct LazySlot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> LazySlot<T> {
    fn new() -> LazySlot<T> {
        LazySlot { state: Mutex::new(SlotState::Empty), ready: Condvar::new() }
    }

    /// The built value, if a build has already finished. Never blocks.
    fn peek(&self) -> Option<Arc<T>> {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            SlotState::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    fn get_or_build<F>(&self, owner: &str, build: F) -> Result<Arc<T>, ResolveError>
    where
        F: FnOnce() -> Result<T, ResolveError>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                SlotState::Ready(value) => return Ok(Arc::clone(value)),
                SlotState::Building(tid) if *tid == thread::current().id() => {
                    return Err(ResolveError::CyclicInheritance(owner.to_string()));
                }
                SlotState::Building(_) => {
                    state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
                SlotState::Empty => break,
            }
        }
        *state = SlotState::Building(thread::current().id());
        drop(state);

        let built = build();

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match built {
            Ok(value) => {
                let value = Arc::new(value);
                *state = SlotState::Ready(Arc::clone(&value));
                self.ready.notify_all();
                Ok(value)
            }
            Err(err) => {
                *state = SlotState::Empty;
                self.ready.notify_all();
                Err(err)
            }
        }
    }
}

/// A class descriptor plus its lazily built resolution caches.
pub struct LinkedClass {
    descriptor: Arc<ClassDescriptor>,
    hierarchy: LazySlot<HierarchyView>,
    methods: LazySlot<MethodTable>,
    fields: LazySlot<FieldTable>,
    ancestor_args: LazySlot<HashMap<ClassName, AncestorArgs>>,
}

impl LinkedClass {
    fn new(descriptor: Arc<ClassDescriptor>) -> LinkedClass {
        LinkedClass {
            descriptor,
            hierarchy: LazySlot::new(),
            methods: LazySlot::new(),
            fields: LazySlot::new(),
            ancestor_args: LazySlot::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<ClassDescriptor> {
        &self.descriptor
    }

    pub fn hierarchy(&self, session: &Session) -> Result<Arc<HierarchyView>, ResolveError> {
        self.hierarchy
            .get_or_build(&self.descriptor.name, || build_hierarchy(session, &self.descriptor))
    }

    /// The hierarchy view if its build has finished, without blocking. The
    /// builders use this so two threads linking a cyclic graph from opposite
    /// ends cannot wait on each other's slot.
    pub(crate) fn hierarchy_if_ready(&self) -> Option<Arc<HierarchyView>> {
        self.hierarchy.peek()
    }

    pub(crate) fn ancestor_args_if_ready(
        &self,
    ) -> Option<Arc<HashMap<ClassName, AncestorArgs>>> {
        self.ancestor_args.peek()
    }

    pub fn methods(&self, session: &Session) -> Result<Arc<MethodTable>, ResolveError> {
        self.methods
            .get_or_build(&self.descriptor.name, || build_method_table(session, &self.descriptor))
    }

    pub fn fields(&self, session: &Session) -> Result<Arc<FieldTable>, ResolveError> {
        self.fields
            .get_or_build(&self.descriptor.name, || build_field_table(session, &self.descriptor))
    }

    pub fn ancestor_args(
        &self,
        session: &Session,
    ) -> Result<Arc<HashMap<ClassName, AncestorArgs>>, ResolveError> {
        self.ancestor_args
            .get_or_build(&self.descriptor.name, || build_ancestor_args(session, &self.descriptor))
    }
}

/// Owns every cache for one compilation. Cheap to share behind an `Arc`;
/// never a process-wide static.
pub struct Session {
    provider: Arc<dyn ClassProvider>,
    linked: Mutex<HashMap<ClassName, Arc<LinkedClass>>>,
    accessor_requests: Mutex<Vec<AccessorRequest>>,
}

impl Session {
    pub fn new(provider: Arc<dyn ClassProvider>) -> Session {
        Session {
            provider,
            linked: Mutex::new(HashMap::new()),
            accessor_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn descriptor(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.provider.get_class_descriptor(name)
    }

    pub fn linked(&self, name: &str) -> Result<Arc<LinkedClass>, ResolveError> {
        let mut linked = self.linked.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(class) = linked.get(name) {
            return Ok(Arc::clone(class));
        }
        let Some(descriptor) = self.provider.get_class_descriptor(name) else {
            return Err(ResolveError::MissingClass(name.to_string()));
        };
        let class = Arc::new(LinkedClass::new(descriptor));
        linked.insert(name.to_string(), Arc::clone(&class));
        Ok(class)
    }

    pub fn push_accessor_request(&self, request: AccessorRequest) {
        let mut requests = self.accessor_requests.lock().unwrap_or_else(PoisonError::into_inner);
        requests.push(request);
    }

    /// Hands the accumulated accessor requests to codegen.
    pub fn drain_accessor_requests(&self) -> Vec<AccessorRequest> {
        let mut requests = self.accessor_requests.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *requests)
    }
}

impl ClassGraph for Session {
    fn descriptor(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        Session::descriptor(self, name)
    }

    fn cast_distance(&self, from: &str, ancestor: &str) -> Result<Option<u32>, ResolveError> {
        let linked = match self.linked(from) {
            Ok(linked) => linked,
            Err(ResolveError::MissingClass(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        Ok(linked.hierarchy(self)?.distance_to(ancestor))
    }

    fn type_args_as(
        &self,
        instance: &Type,
        ancestor: &str,
    ) -> Result<Option<Vec<Type>>, ResolveError> {
        infer_generic(self, instance, ancestor)
    }
}
