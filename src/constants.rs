/// Constants describing the example key format.
pub mod keys {
    /// Literal version suffix every example key must end with.
    pub const KEY_VERSION_SUFFIX: &str = "v1";
    /// Separator between key fields.
    pub const KEY_FIELD_SEPARATOR: char = '-';
    /// Number of `-`-separated fields in front of the version suffix.
    pub const KEY_FIELD_COUNT: usize = 5;
}

/// Default grouping and selection parameters.
pub mod defaults {
    /// Chunks per group.
    pub const CHUNKS_PER_SPK: usize = 4;
    /// Number of offset passes used to form additional group sets.
    pub const NUM_REPEATS: usize = 1;
    /// Fraction of lowest-contamination groups eligible for the held-out subset.
    pub const HELDOUT_DATA_SELECTION_PROPORTION: f64 = 0.2;
    /// Size of the held-out subset (and of the matched training subset).
    pub const NUM_HELDOUT_GROUPS: usize = 200;
    /// RNG seed controlling held-out and matched subset selection.
    pub const SEED: u64 = 42;
}

/// Constants used by the command-line shell.
pub mod cli {
    /// Program name reported in usage and help output.
    pub const PROGRAM_NAME: &str = "choose_egs_to_merge";
}
