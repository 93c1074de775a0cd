//! Flattened ancestor views.
//!
//! Every class gets a [`HierarchyView`]: each ancestor (self included) mapped
//! to its cast distance and its position in a fixed derivation order. The
//! superclass chain is laid down first, then each chain member's interfaces
//! with their transitive interface closures; when an interface is reachable
//! along several paths the shortest distance wins.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lava_types::descriptor::ClassDescriptor;
use lava_types::error::ResolveError;
use lava_types::ty::{ClassName, OBJECT};

use crate::session::{LinkedClass, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AncestorEntry {
    /// Position in derivation order; unique within one view.
    pub order: u32,
    /// Up-cast distance from the viewed class to this ancestor.
    pub distance: u32,
    /// Reached through an interface of a direct interface rather than along
    /// the superclass chain.
    pub via_interface: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyView {
    entries: HashMap<ClassName, AncestorEntry>,
    order: Vec<ClassName>,
}

impl HierarchyView {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn entry(&self, name: &str) -> Option<&AncestorEntry> {
        self.entries.get(name)
    }

    pub fn distance_to(&self, name: &str) -> Option<u32> {
        self.entries.get(name).map(|e| e.distance)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ancestor names in derivation order, the viewed class first.
    pub fn names_in_order(&self) -> impl Iterator<Item = &ClassName> {
        self.order.iter()
    }

    fn insert(&mut self, name: ClassName, distance: u32, via_interface: bool) {
        let order = self.order.len() as u32;
        match self.entries.get_mut(&name) {
            Some(existing) => {
                if distance < existing.distance {
                    existing.distance = distance;
                    existing.via_interface = via_interface;
                }
            }
            None => {
                self.entries
                    .insert(name.clone(), AncestorEntry { order, distance, via_interface });
                self.order.push(name);
            }
        }
    }
}

pub(crate) fn build_hierarchy(
    session: &Session,
    descriptor: &ClassDescriptor,
) -> Result<HierarchyView, ResolveError> {
    let mut visiting = HashSet::new();
    visiting.insert(descriptor.name.clone());
    build_view(session, descriptor, &mut visiting)
}

fn build_view(
    session: &Session,
    descriptor: &ClassDescriptor,
    visiting: &mut HashSet<ClassName>,
) -> Result<HierarchyView, ResolveError> {
    let mut view = HierarchyView::default();
    view.insert(descriptor.name.clone(), 0, false);

    // Superclass chain first.
    let mut chain: Vec<Arc<ClassDescriptor>> = Vec::new();
    let mut parent = descriptor.parent.clone();
    let mut distance = 1u32;
    while let Some(name) = parent {
        if view.contains(&name) {
            return Err(ResolveError::CyclicInheritance(descriptor.name.clone()));
        }
        let Some(desc) = session.descriptor(&name) else {
            tracing::warn!(class = %descriptor.name, missing = %name, "superclass is missing; hierarchy truncated");
            view.insert(name, distance, false);
            break;
        };
        view.insert(name, distance, false);
        parent = desc.parent.clone();
        chain.push(desc);
        distance += 1;
    }

    // Interfaces of every chain member, plus their transitive closures.
    for (depth, desc) in std::iter::once(descriptor)
        .chain(chain.iter().map(Arc::as_ref))
        .enumerate()
    {
        // A class at chain depth d sees its interfaces at d + 1 and each
        // interface's ancestors at d + 1 + k; shortest path wins.
        let cast_distance = depth as u32 + 1;
        for iface in &desc.interfaces {
            let Ok(linked) = session.linked(iface) else {
                tracing::warn!(class = %desc.name, interface = %iface, "interface is missing; hierarchy truncated");
                continue;
            };
            view.insert(iface.clone(), cast_distance, false);
            let iface_view = interface_view(session, &linked, visiting)?;
            for name in iface_view.names_in_order() {
                if name == iface || name == OBJECT {
                    continue;
                }
                let Some(entry) = iface_view.entry(name) else { continue };
                view.insert(name.clone(), cast_distance + entry.distance, cast_distance == 1);
            }
        }
    }

    Ok(view)
}

/// The ancestor view of one interface edge. A finished build is reused; an
/// unfinished one is computed in place, with `visiting` catching cycles. A
/// builder never waits on another class's slot, so two threads linking a
/// cyclic graph from opposite ends both error instead of deadlocking.
fn interface_view(
    session: &Session,
    linked: &LinkedClass,
    visiting: &mut HashSet<ClassName>,
) -> Result<Arc<HierarchyView>, ResolveError> {
    if let Some(view) = linked.hierarchy_if_ready() {
        return Ok(view);
    }
    let name = &linked.descriptor().name;
    if !visiting.insert(name.clone()) {
        return Err(ResolveError::CyclicInheritance(name.clone()));
    }
    let view = build_view(session, linked.descriptor(), visiting)?;
    visiting.remove(name);
    Ok(Arc::new(view))
}

/// The most-derived class both views share, by smallest `(distance, order)`
/// in the larger view. Views always share the root object type, so the
/// fallback only covers truncated hierarchies.
pub fn common_ancestor(a: &HierarchyView, b: &HierarchyView) -> ClassName {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut best: Option<(u32, u32, &ClassName)> = None;
    for name in small.names_in_order() {
        if let Some(entry) = large.entry(name) {
            let better = match best {
                Some((d, o, _)) => (entry.distance, entry.order) < (d, o),
                None => true,
            };
            if better {
                best = Some((entry.distance, entry.order, name));
            }
        }
    }
    match best {
        Some((_, _, name)) => name.clone(),
        None => OBJECT.to_string(),
    }
}
