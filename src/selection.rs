//! Held-out and matched-training subset selection.
//!
//! Groups are ranked by how many other groups they contaminate. The held-out
//! subset is sampled from the least-contaminating `proportion` of that ranking,
//! the matched subset from whatever is still trainable once the held-out groups
//! and everything they contaminate are removed. Training keeps the rest.

use rand::Rng;
use rand::seq::index;
use tracing::{debug, info};

use crate::config::GroupingConfig;
use crate::contamination::ContaminationGraph;
use crate::errors::GroupingError;
use crate::metrics::{SelectionSummary, mean};
use crate::types::GroupId;

/// Disjoint split of group ids. Every list is sorted ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Groups written to the training output.
    pub training: Vec<GroupId>,
    /// Held-out groups; none of their identities occur in `training`.
    pub heldout: Vec<GroupId>,
    /// Groups matched in size to `heldout`, drawn from the otherwise-trainable pool.
    pub matched: Vec<GroupId>,
    /// Groups dropped solely because a held-out group contaminates them.
    pub excluded_only: Vec<GroupId>,
    /// Size of the candidate pool the held-out groups were drawn from.
    pub candidate_pool: usize,
}

impl Selection {
    /// Total number of groups accounted for.
    pub fn total(&self) -> usize {
        self.training.len() + self.heldout.len() + self.matched.len() + self.excluded_only.len()
    }

    /// Summary for logging and the optional JSON report.
    pub fn summary(&self, graph: &ContaminationGraph, seed: u64) -> SelectionSummary {
        let total_groups = self.total();
        SelectionSummary {
            seed,
            total_groups,
            candidate_pool: self.candidate_pool,
            training: self.training.len(),
            heldout: self.heldout.len(),
            matched: self.matched.len(),
            excluded_only: self.excluded_only.len(),
            retained_share: if total_groups == 0 {
                0.0
            } else {
                self.training.len() as f64 / total_groups as f64
            },
            heldout_mean_contamination: mean(
                self.heldout
                    .iter()
                    .map(|&group| graph.contamination_count(group)),
            ),
            heldout_identities: graph.distinct_identities(&self.heldout),
            contamination: graph.stats(),
        }
    }
}

/// Group ids ordered by ascending contaminator count, ties by ascending id.
pub fn rank_by_contamination(graph: &ContaminationGraph) -> Vec<GroupId> {
    let mut ranked: Vec<GroupId> = (0..graph.num_groups()).collect();
    ranked.sort_by_key(|&group| (graph.contamination_count(group), group));
    ranked
}

/// `ceil(proportion * total)`, raised to `num_heldout_groups` and capped at `total`.
pub fn candidate_pool_size(total: usize, proportion: f64, num_heldout_groups: usize) -> usize {
    let scaled = (proportion * total as f64).ceil() as usize;
    scaled.max(num_heldout_groups).min(total)
}

/// Lowest-contamination prefix of the ranking that held-out groups are drawn from.
pub fn candidate_pool(graph: &ContaminationGraph, config: &GroupingConfig) -> Vec<GroupId> {
    let mut ranked = rank_by_contamination(graph);
    let size = candidate_pool_size(
        ranked.len(),
        config.heldout_data_selection_proportion,
        config.num_heldout_groups,
    );
    ranked.truncate(size);
    ranked
}

fn sample_sorted<R>(rng: &mut R, pool: &[GroupId], amount: usize) -> Vec<GroupId>
where
    R: Rng + ?Sized,
{
    let mut picked: Vec<GroupId> = index::sample(rng, pool.len(), amount)
        .iter()
        .map(|idx| pool[idx])
        .collect();
    picked.sort_unstable();
    picked
}

/// Choose held-out, matched, and training groups.
///
/// Fails with `InsufficientData` when there are fewer groups than
/// `num_heldout_groups`, or when fewer than `num_heldout_groups` groups remain
/// for the matched subset once the held-out groups and their contaminators are
/// set aside.
pub fn select_heldout<R>(
    graph: &ContaminationGraph,
    config: &GroupingConfig,
    rng: &mut R,
) -> Result<Selection, GroupingError>
where
    R: Rng + ?Sized,
{
    config.validate()?;
    let total = graph.num_groups();
    let wanted = config.num_heldout_groups;
    if wanted > total {
        return Err(GroupingError::InsufficientData {
            needed: wanted,
            available: total,
            context: "the held-out subset",
        });
    }

    let pool = candidate_pool(graph, config);
    let heldout = sample_sorted(rng, &pool, wanted);
    debug!(
        pool = pool.len(),
        heldout = heldout.len(),
        "sampled held-out groups"
    );

    let mut blocked = vec![false; total];
    for &group in &heldout {
        blocked[group] = true;
        for &other in graph.contaminators(group) {
            blocked[other] = true;
        }
    }
    let trainable: Vec<GroupId> = (0..total).filter(|&group| !blocked[group]).collect();
    if trainable.len() < wanted {
        return Err(GroupingError::InsufficientData {
            needed: 2 * wanted,
            available: heldout.len() + trainable.len(),
            context: "the held-out and matched subsets after removing contaminated groups",
        });
    }

    let matched = sample_sorted(rng, &trainable, wanted);
    let mut in_matched = vec![false; total];
    for &group in &matched {
        in_matched[group] = true;
    }
    let training: Vec<GroupId> = trainable
        .into_iter()
        .filter(|&group| !in_matched[group])
        .collect();

    let mut in_heldout = vec![false; total];
    for &group in &heldout {
        in_heldout[group] = true;
    }
    let excluded_only: Vec<GroupId> = (0..total)
        .filter(|&group| blocked[group] && !in_heldout[group])
        .collect();

    let selection = Selection {
        training,
        heldout,
        matched,
        excluded_only,
        candidate_pool: pool.len(),
    };
    info!(
        total,
        pool = selection.candidate_pool,
        training = selection.training.len(),
        heldout = selection.heldout.len(),
        matched = selection.matched.len(),
        excluded_only = selection.excluded_only.len(),
        "selected held-out and matched subsets"
    );
    Ok(selection)
}
