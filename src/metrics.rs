use serde::{Deserialize, Serialize};

/// Aggregate statistics over per-group contaminator-set sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContaminationStats {
    pub groups: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    /// Groups whose identities appear in no other group.
    pub uncontaminated: usize,
    /// Sum of all contaminator-set sizes (each contaminated pair counted twice).
    pub total_links: usize,
}

/// Compute contamination statistics from per-group contaminator counts.
pub fn contamination_stats(counts: &[usize]) -> Option<ContaminationStats> {
    if counts.is_empty() {
        return None;
    }
    let groups = counts.len();
    let total_links: usize = counts.iter().sum();
    let min = *counts.iter().min().expect("counts non-empty");
    let max = *counts.iter().max().expect("counts non-empty");
    let uncontaminated = counts.iter().filter(|&&count| count == 0).count();
    Some(ContaminationStats {
        groups,
        min,
        max,
        mean: total_links as f64 / groups as f64,
        uncontaminated,
        total_links,
    })
}

/// Sizes of the output partitions plus the statistics they were selected from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub seed: u64,
    pub total_groups: usize,
    pub candidate_pool: usize,
    pub training: usize,
    pub heldout: usize,
    pub matched: usize,
    /// Groups dropped only because the held-out subset contaminates them.
    pub excluded_only: usize,
    /// Fraction of groups that still reach the training output.
    pub retained_share: f64,
    /// Mean contaminator count over the held-out groups.
    pub heldout_mean_contamination: f64,
    /// Distinct identities covered by the held-out groups.
    pub heldout_identities: usize,
    pub contamination: Option<ContaminationStats>,
}

/// Mean of `values`, `0.0` when empty.
pub fn mean(values: impl IntoIterator<Item = usize>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0usize, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
