//! Connectivity grouping over explicit `connections` lists.
//!
//! DESIGN
//! ======
//! A union-find is built once per call from the entities' connection lists.
//! `union(a, b)` always re-parents `b`'s root under `a`'s root (no rank or
//! size balancing), so for a fixed entity order the chosen roots are fully
//! determined. `find` is iterative with full path compression, which keeps
//! long connection chains from recursing.
//!
//! Connections to IDs outside the entity list are recorded in the parent
//! table but never show up in the output, since only listed entities are
//! enumerated.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::geometry::{Entity, EntityId};
use crate::palette::{Color, default_color, group_color};

/// Parent table with path compression.
#[derive(Debug, Default)]
struct UnionFind {
    parent: HashMap<EntityId, EntityId>,
}

impl UnionFind {
    fn add(&mut self, id: EntityId) {
        self.parent.entry(id).or_insert(id);
    }

    fn find(&mut self, id: EntityId) -> EntityId {
        self.add(id);

        let mut root = id;
        while let Some(&parent) = self.parent.get(&root) {
            if parent == root {
                break;
            }
            root = parent;
        }

        // Second pass: point every node on the walked path straight at the root.
        let mut node = id;
        while node != root {
            let next = self.parent.get(&node).copied().unwrap_or(root);
            self.parent.insert(node, root);
            node = next;
        }

        root
    }

    fn union(&mut self, a: EntityId, b: EntityId) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent.insert(root_b, root_a);
        }
    }
}

/// One connected component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub root: EntityId,
    pub color: Color,
    /// Members in ascending ID order.
    pub members: Vec<EntityId>,
}

/// Result of [`group_by_connectivity`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grouping {
    /// Entity → root of its component.
    pub roots: BTreeMap<EntityId, EntityId>,
    /// Root → group color.
    pub colors: BTreeMap<EntityId, Color>,
    /// Roots in first-observation order.
    order: Vec<EntityId>,
}

impl Grouping {
    #[must_use]
    pub fn root_of(&self, id: EntityId) -> Option<EntityId> {
        self.roots.get(&id).copied()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn same_group(&self, a: EntityId, b: EntityId) -> bool {
        matches!((self.root_of(a), self.root_of(b)), (Some(ra), Some(rb)) if ra == rb)
    }

    /// Color a render consumer should draw `id` with.
    ///
    /// An explicit per-entity color wins, then the group color, then a
    /// fallback from the default palette indexed by `fallback_index`.
    #[must_use]
    pub fn color_for<'a>(&self, id: EntityId, explicit: Option<&'a str>, fallback_index: usize) -> &'a str {
        if let Some(color) = explicit.filter(|c| !c.is_empty()) {
            return color;
        }
        self.root_of(id)
            .and_then(|root| self.colors.get(&root).copied())
            .unwrap_or_else(|| default_color(fallback_index))
    }

    /// Components in first-observation order with their members.
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        let mut members: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for (id, root) in &self.roots {
            members.entry(*root).or_default().push(*id);
        }
        self.order
            .iter()
            .map(|root| Group {
                root: *root,
                color: self.colors.get(root).copied().unwrap_or_else(|| group_color(0)),
                members: members.remove(root).unwrap_or_default(),
            })
            .collect()
    }
}

/// Partition entities into connected components and color each component.
///
/// Connection lists may be asymmetric; an edge declared on either side joins
/// both entities. Roots are enumerated in the order they are first seen while
/// walking `entities`, and the `i`-th root gets `GROUP_PALETTE[i % 10]`.
#[must_use]
pub fn group_by_connectivity(entities: &[Entity]) -> Grouping {
    let mut uf = UnionFind::default();
    for entity in entities {
        uf.add(entity.id);
    }
    for entity in entities {
        for &connected in &entity.connections {
            uf.union(entity.id, connected);
        }
    }

    let mut grouping = Grouping::default();
    for entity in entities {
        let root = uf.find(entity.id);
        grouping.roots.insert(entity.id, root);
        if !grouping.colors.contains_key(&root) {
            grouping.colors.insert(root, group_color(grouping.order.len()));
            grouping.order.push(root);
        }
    }
    grouping
}
