//! Contamination relation between groups.
//!
//! Two groups contaminate each other when they share an identity. Identities
//! and groups both get dense ids; the identity→groups relation is stored as
//! sorted adjacency lists and each group's contaminator set is the union of the
//! lists of its identities, minus the group itself.

use std::collections::HashMap;

use tracing::info;

use crate::identity::IdentityResolver;
use crate::metrics::{ContaminationStats, contamination_stats};
use crate::partition::Partition;
use crate::types::{GroupId, IdentityIdx};

/// Identity index plus per-group contaminator sets.
#[derive(Clone, Debug, Default)]
pub struct ContaminationGraph {
    num_identities: usize,
    group_identities: Vec<Vec<IdentityIdx>>,
    contaminators: Vec<Vec<GroupId>>,
}

impl ContaminationGraph {
    /// Build the graph for every group in `partition`.
    pub fn build<R>(partition: &Partition, resolver: &R) -> Self
    where
        R: IdentityResolver + ?Sized,
    {
        let num_groups = partition.groups.len();
        let mut identity_ids: HashMap<&str, IdentityIdx> = HashMap::new();
        let mut group_identities: Vec<Vec<IdentityIdx>> = Vec::with_capacity(num_groups);
        let mut identity_groups: Vec<Vec<GroupId>> = Vec::new();

        for group in &partition.groups {
            let mut ids: Vec<IdentityIdx> = partition
                .members(group)
                .map(|example| {
                    let identity = resolver.resolve(&example.utterance_id);
                    let next = identity_ids.len();
                    *identity_ids.entry(identity).or_insert_with(|| {
                        identity_groups.push(Vec::new());
                        next
                    })
                })
                .collect();
            ids.sort_unstable();
            ids.dedup();
            // Groups are visited in id order, so each adjacency list stays sorted.
            for &identity in &ids {
                identity_groups[identity].push(group.id);
            }
            group_identities.push(ids);
        }

        let mut contaminators: Vec<Vec<GroupId>> = Vec::with_capacity(num_groups);
        let mut last_seen: Vec<GroupId> = vec![GroupId::MAX; num_groups];
        for (group_id, ids) in group_identities.iter().enumerate() {
            let mut set = Vec::new();
            for &identity in ids {
                for &other in &identity_groups[identity] {
                    if other != group_id && last_seen[other] != group_id {
                        last_seen[other] = group_id;
                        set.push(other);
                    }
                }
            }
            set.sort_unstable();
            contaminators.push(set);
        }

        let graph = Self {
            num_identities: identity_groups.len(),
            group_identities,
            contaminators,
        };
        if let Some(stats) = graph.stats() {
            info!(
                groups = stats.groups,
                identities = graph.num_identities(),
                min = stats.min,
                max = stats.max,
                mean = stats.mean,
                uncontaminated = stats.uncontaminated,
                "built contamination graph"
            );
        }
        graph
    }

    /// Number of groups covered.
    pub fn num_groups(&self) -> usize {
        self.contaminators.len()
    }

    /// Number of distinct identities.
    pub fn num_identities(&self) -> usize {
        self.num_identities
    }

    /// Sorted identity indices represented in `group`.
    pub fn group_identities(&self, group: GroupId) -> &[IdentityIdx] {
        &self.group_identities[group]
    }

    /// Number of distinct identities across `groups`.
    pub fn distinct_identities(&self, groups: &[GroupId]) -> usize {
        let mut ids: Vec<IdentityIdx> = groups
            .iter()
            .flat_map(|&group| self.group_identities(group).iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Sorted ids of the other groups that must leave training if `group` is held out.
    pub fn contaminators(&self, group: GroupId) -> &[GroupId] {
        &self.contaminators[group]
    }

    /// `|contaminators(group)|`.
    pub fn contamination_count(&self, group: GroupId) -> usize {
        self.contaminators[group].len()
    }

    /// Contaminator-set sizes in group-id order.
    pub fn contamination_counts(&self) -> Vec<usize> {
        self.contaminators.iter().map(Vec::len).collect()
    }

    /// Summary of contaminator-set sizes, `None` for an empty graph.
    pub fn stats(&self) -> Option<ContaminationStats> {
        contamination_stats(&self.contamination_counts())
    }
}
