//! Grouping service: connectivity groups and legacy name similarity.

#[cfg(test)]
#[path = "grouping_test.rs"]
mod grouping_test;

use std::collections::BTreeMap;

use layout::group::Group;
use layout::similarity::{SimilarPair, similar_pairs};
use layout::{Entity, EntityId, group_by_connectivity};
use serde::Serialize;

use crate::services::roster::Member;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub groups: Vec<Group>,
    /// Entity → color to draw it with (explicit, then group, then default).
    pub colors: BTreeMap<EntityId, String>,
}

#[must_use]
pub fn group_view(members: &[Member]) -> GroupView {
    let entities: Vec<Entity> = members.iter().map(|m| m.entity.clone()).collect();
    let grouping = group_by_connectivity(&entities);
    let colors = members
        .iter()
        .enumerate()
        .map(|(index, m)| (m.entity.id, grouping.color_for(m.entity.id, m.color.as_deref(), index).to_owned()))
        .collect();
    GroupView { groups: grouping.groups(), colors }
}

/// Name pairs scoring at least `threshold`, in roster order.
#[must_use]
pub fn similar_names(members: &[Member], threshold: f64) -> Vec<SimilarPair> {
    let names: Vec<(EntityId, &str)> = members.iter().map(|m| (m.entity.id, m.name.as_str())).collect();
    similar_pairs(&names, threshold)
}
