use crate::constants::defaults;
use crate::errors::GroupingError;

/// Top-level grouping and held-out selection configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupingConfig {
    /// Number of chunks in every group. Chunks are only preferentially taken
    /// from the same speaker; the input order decides who ends up together.
    pub chunks_per_spk: usize,
    /// Number of offset passes over each signature stream. Must divide
    /// `chunks_per_spk`; pass `r` skips the first `r * chunks_per_spk / num_repeats`
    /// chunks so the same data is grouped differently.
    pub num_repeats: usize,
    /// Fraction of groups, ranked by ascending contamination, that the held-out
    /// subset is drawn from. `1.0` draws from all groups.
    pub heldout_data_selection_proportion: f64,
    /// Number of groups in the held-out subset and in the matched training subset.
    pub num_heldout_groups: usize,
    /// RNG seed that controls held-out and matched subset selection.
    pub seed: u64,
    /// Fail with `UnsortedInput` when an utterance's chunks are not contiguous,
    /// instead of logging a warning.
    pub strict_order: bool,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            chunks_per_spk: defaults::CHUNKS_PER_SPK,
            num_repeats: defaults::NUM_REPEATS,
            heldout_data_selection_proportion: defaults::HELDOUT_DATA_SELECTION_PROPORTION,
            num_heldout_groups: defaults::NUM_HELDOUT_GROUPS,
            seed: defaults::SEED,
            strict_order: false,
        }
    }
}

impl GroupingConfig {
    /// Validate parameter ranges and the `num_repeats | chunks_per_spk` constraint.
    pub fn validate(&self) -> Result<(), GroupingError> {
        if self.chunks_per_spk == 0 {
            return Err(GroupingError::InvalidConfiguration(
                "chunks_per_spk must be greater than zero".to_string(),
            ));
        }
        if self.num_repeats == 0 {
            return Err(GroupingError::InvalidConfiguration(
                "num_repeats must be greater than zero".to_string(),
            ));
        }
        if self.chunks_per_spk % self.num_repeats != 0 {
            return Err(GroupingError::InvalidConfiguration(format!(
                "num_repeats ({}) must divide chunks_per_spk ({})",
                self.num_repeats, self.chunks_per_spk
            )));
        }
        let proportion = self.heldout_data_selection_proportion;
        if proportion.is_nan() || proportion <= 0.0 || proportion > 1.0 {
            return Err(GroupingError::InvalidConfiguration(format!(
                "heldout_data_selection_proportion must be in (0, 1], got {proportion}"
            )));
        }
        if self.num_heldout_groups == 0 {
            return Err(GroupingError::InvalidConfiguration(
                "num_heldout_groups must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of chunks skipped per repeat pass.
    pub fn repeat_offset(&self) -> usize {
        self.chunks_per_spk / self.num_repeats.max(1)
    }
}
