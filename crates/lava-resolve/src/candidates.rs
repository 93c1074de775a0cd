//! Inherited member tables.
//!
//! For each member name a class sees one [`CandidateSet`], built by walking
//! its hierarchy from most-derived to least-derived. A declaration whose
//! erased parameter shape matches a more-derived one is hidden; compiler
//! synthesized and bridge declarations never become candidates, though a
//! bridge still hides what it bridges.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lava_types::descriptor::{ClassDescriptor, FieldDescriptor, MethodDescriptor};
use lava_types::error::ResolveError;
use lava_types::ty::{ClassName, Type};

use crate::session::{FieldTable, MethodTable, Session};

/// One visible declaration together with the class that declared it.
#[derive(Debug, Clone)]
pub struct Candidate<M> {
    pub owner: ClassName,
    pub member: Arc<M>,
}

/// The declarations a name resolves to, pre-collapsed when unambiguous.
#[derive(Debug, Clone)]
pub enum CandidateSet<M> {
    Single(Candidate<M>),
    Multiple(Vec<Candidate<M>>),
}

impl<M> CandidateSet<M> {
    pub fn candidates(&self) -> &[Candidate<M>] {
        match self {
            CandidateSet::Single(c) => std::slice::from_ref(c),
            CandidateSet::Multiple(cs) => cs,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collapse(mut list: Vec<Candidate<M>>) -> CandidateSet<M> {
        if list.len() == 1 {
            if let Some(single) = list.pop() {
                return CandidateSet::Single(single);
            }
        }
        CandidateSet::Multiple(list)
    }
}

fn is_candidate_method(method: &MethodDescriptor) -> bool {
    if method.is_constructor() {
        return true;
    }
    !method.modifiers.is_synthetic && !method.modifiers.is_bridge
}

pub(crate) fn build_method_table(
    session: &Session,
    descriptor: &ClassDescriptor,
) -> Result<MethodTable, ResolveError> {
    let view = session.linked(&descriptor.name)?.hierarchy(session)?;
    let mut lists: HashMap<String, Vec<Candidate<MethodDescriptor>>> = HashMap::new();
    let mut seen_shapes: HashMap<String, HashSet<Vec<Type>>> = HashMap::new();

    for ancestor in view.names_in_order() {
        let is_self = *ancestor == descriptor.name;
        let Some(desc) = session.descriptor(ancestor) else { continue };
        for method in &desc.methods {
            // Constructors are not inherited.
            if method.is_constructor() && !is_self {
                continue;
            }
            let shape = method.erased_shape();
            let shapes = seen_shapes.entry(method.name.clone()).or_default();
            if !shapes.insert(shape) {
                continue;
            }
            if !is_candidate_method(method) {
                continue;
            }
            lists.entry(method.name.clone()).or_default().push(Candidate {
                owner: ancestor.clone(),
                member: Arc::new(method.clone()),
            });
        }
    }

    Ok(lists
        .into_iter()
        .filter(|(_, list)| !list.is_empty())
        .map(|(name, list)| (name, CandidateSet::collapse(list)))
        .collect())
}

pub(crate) fn build_field_table(
    session: &Session,
    descriptor: &ClassDescriptor,
) -> Result<FieldTable, ResolveError> {
    let view = session.linked(&descriptor.name)?.hierarchy(session)?;
    let mut lists: HashMap<String, Vec<Candidate<FieldDescriptor>>> = HashMap::new();

    // A more-derived field hides a less-derived one of the same name, but
    // the hidden declaration stays behind it for access fallback.
    for ancestor in view.names_in_order() {
        let Some(desc) = session.descriptor(ancestor) else { continue };
        for field in &desc.fields {
            if field.modifiers.is_synthetic {
                continue;
            }
            lists.entry(field.name.clone()).or_default().push(Candidate {
                owner: ancestor.clone(),
                member: Arc::new(field.clone()),
            });
        }
    }

    Ok(lists
        .into_iter()
        .map(|(name, list)| (name, CandidateSet::collapse(list)))
        .collect())
}
