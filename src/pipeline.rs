//! End-to-end wiring: decode → partition → resolve → contaminate → select → write.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::info;

use crate::config::GroupingConfig;
use crate::contamination::ContaminationGraph;
use crate::errors::GroupingError;
use crate::identity::{IdentityResolver, resolver_from_path};
use crate::keys::{Example, read_examples};
use crate::metrics::SelectionSummary;
use crate::partition::{Partition, partition_examples};
use crate::rng::DeterministicRng;
use crate::selection::{Selection, select_heldout};
use crate::writer::{OutputPaths, write_outputs};

/// Input files consumed by `run`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputPaths {
    /// scp-style `<key> <location>` table.
    pub scp_in: PathBuf,
    /// Optional `utt2uniq` table; identity map when absent.
    pub utt2uniq: Option<PathBuf>,
}

/// Result of every in-memory stage, before anything is written.
#[derive(Clone, Debug)]
pub struct GroupingPlan {
    /// Examples and the groups built over them.
    pub partition: Partition,
    /// Contamination relation between groups.
    pub graph: ContaminationGraph,
    /// Training / held-out / matched split.
    pub selection: Selection,
}

impl GroupingPlan {
    /// Summary of the selection, tagged with `seed`.
    pub fn summary(&self, seed: u64) -> SelectionSummary {
        self.selection.summary(&self.graph, seed)
    }
}

/// Run every in-memory stage over already-decoded `examples`.
pub fn plan_groups<R, G>(
    examples: Vec<Example>,
    resolver: &R,
    config: &GroupingConfig,
    rng: &mut G,
) -> Result<GroupingPlan, GroupingError>
where
    R: IdentityResolver + ?Sized,
    G: Rng + ?Sized,
{
    config.validate()?;
    let partition = partition_examples(examples, config)?;
    let graph = ContaminationGraph::build(&partition, resolver);
    let selection = select_heldout(&graph, config, rng)?;
    Ok(GroupingPlan {
        partition,
        graph,
        selection,
    })
}

/// Open and decode an scp table.
pub fn read_examples_from_path(
    path: &Path,
    strict_order: bool,
) -> Result<Vec<Example>, GroupingError> {
    let file = File::open(path).map_err(|source| GroupingError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    let examples = read_examples(BufReader::new(file), strict_order)?;
    info!(path = %path.display(), examples = examples.len(), "decoded examples");
    Ok(examples)
}

/// Full batch run. Nothing is written unless every stage succeeds.
pub fn run(
    config: &GroupingConfig,
    inputs: &InputPaths,
    outputs: &OutputPaths,
) -> Result<SelectionSummary, GroupingError> {
    config.validate()?;
    let resolver = resolver_from_path(inputs.utt2uniq.as_deref())?;
    let examples = read_examples_from_path(&inputs.scp_in, config.strict_order)?;

    let mut rng = DeterministicRng::new(config.seed);
    let plan = plan_groups(examples, &*resolver, config, &mut rng)?;
    let summary = plan.summary(config.seed);

    write_outputs(outputs, &plan.partition, &plan.selection, &summary)?;
    info!(
        training = summary.training,
        heldout = summary.heldout,
        matched = summary.matched,
        excluded_only = summary.excluded_only,
        heldout_identities = summary.heldout_identities,
        retained_share = summary.retained_share,
        "finished choosing groups"
    );
    Ok(summary)
}
