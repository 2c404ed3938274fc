#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line shell shared by the `choose_egs_to_merge` binary.
pub mod cli;
/// Grouping and selection configuration.
pub mod config;
/// Centralized constants (key format, defaults).
pub mod constants;
/// Contamination relation between groups.
pub mod contamination;
/// Utterance to pre-augmentation identity resolution.
pub mod identity;
/// Example key decoding.
pub mod keys;
/// Contamination and selection statistics.
pub mod metrics;
/// Grouping of the example stream.
pub mod partition;
/// Stage wiring for a full run.
pub mod pipeline;
/// Deterministic random number generation.
pub mod rng;
/// Held-out and matched subset selection.
pub mod selection;
/// Shared type aliases.
pub mod types;
/// Group-list output.
pub mod writer;

mod errors;

pub use config::GroupingConfig;
pub use contamination::ContaminationGraph;
pub use errors::GroupingError;
pub use identity::{IdentityResolver, PassthroughResolver, TableResolver, resolver_from_path};
pub use keys::{ContextSignature, Example, decode_line, parse_key, read_examples};
pub use metrics::{ContaminationStats, SelectionSummary};
pub use partition::{Group, Partition, partition_examples};
pub use pipeline::{GroupingPlan, InputPaths, plan_groups, run};
pub use rng::DeterministicRng;
pub use selection::{Selection, candidate_pool, rank_by_contamination, select_heldout};
pub use types::{ExampleIdx, GroupId, Identity, IdentityIdx, Location, UtteranceId};
pub use writer::{OutputPaths, write_groups, write_outputs};
