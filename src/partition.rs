//! Splits the ordered example stream into fixed-size groups.
//!
//! Examples are first bucketed by context signature (first-seen order, stable
//! within a bucket). Each bucket is then cut into consecutive windows of
//! `chunks_per_spk` examples; with `num_repeats > 1` the bucket is cut again
//! after skipping `r * chunks_per_spk / num_repeats` leading examples. Trailing
//! partial windows are dropped.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::GroupingConfig;
use crate::errors::GroupingError;
use crate::keys::{ContextSignature, Example};
use crate::types::{ExampleIdx, GroupId};

/// A fixed-size bundle of examples that is kept or dropped as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Dense id, equal to the group's position in `Partition::groups`.
    pub id: GroupId,
    /// Signature shared by every member.
    pub signature: ContextSignature,
    /// Repeat pass that produced this group.
    pub repeat: usize,
    /// Member examples, as indices into `Partition::examples`, in stream order.
    pub members: Vec<ExampleIdx>,
}

/// Decoded examples plus the groups built over them.
///
/// With `num_repeats > 1` an example can belong to several groups, so groups
/// reference examples by index instead of owning them.
#[derive(Clone, Debug, Default)]
pub struct Partition {
    /// Examples in input order.
    pub examples: Vec<Example>,
    /// Groups ordered by id.
    pub groups: Vec<Group>,
}

impl Partition {
    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no group could be formed.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group by id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Member examples of `group`, in the group's internal order.
    pub fn members<'a>(&'a self, group: &'a Group) -> impl Iterator<Item = &'a Example> + 'a {
        group.members.iter().map(|&idx| &self.examples[idx])
    }
}

/// Stable partition of example indices by signature, in first-seen signature order.
pub fn split_by_signature(examples: &[Example]) -> IndexMap<ContextSignature, Vec<ExampleIdx>> {
    let mut streams: IndexMap<ContextSignature, Vec<ExampleIdx>> = IndexMap::new();
    for (idx, example) in examples.iter().enumerate() {
        streams.entry(example.signature()).or_default().push(idx);
    }
    streams
}

/// Build groups over `examples` according to `config`.
///
/// Configuration is validated before any group is built.
pub fn partition_examples(
    examples: Vec<Example>,
    config: &GroupingConfig,
) -> Result<Partition, GroupingError> {
    config.validate()?;
    let chunks_per_spk = config.chunks_per_spk;
    let offset = config.repeat_offset();

    let streams = split_by_signature(&examples);
    if streams.len() > 1 {
        warn!(
            signatures = streams.len(),
            "examples carry more than one context signature; chunks of one speaker may be split across groups"
        );
    }

    let mut groups = Vec::new();
    for (signature, stream) in &streams {
        if stream.len() < chunks_per_spk {
            warn!(
                ?signature,
                examples = stream.len(),
                chunks_per_spk,
                "signature has too few examples to form a group"
            );
            continue;
        }
        for repeat in 0..config.num_repeats {
            let skip = repeat * offset;
            let before = groups.len();
            if skip < stream.len() {
                for window in stream[skip..].chunks_exact(chunks_per_spk) {
                    groups.push(Group {
                        id: groups.len(),
                        signature: *signature,
                        repeat,
                        members: window.to_vec(),
                    });
                }
            }
            debug!(
                ?signature,
                repeat,
                skip,
                groups = groups.len() - before,
                "built groups for signature"
            );
        }
    }

    info!(
        examples = examples.len(),
        signatures = streams.len(),
        groups = groups.len(),
        "partitioned examples into groups"
    );
    Ok(Partition { examples, groups })
}
