use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{GroupId, UtteranceId};

/// Error type for key decoding, configuration, lookup, and selection failures.
#[derive(Debug, Error)]
pub enum GroupingError {
    #[error("malformed example on line {line}: {reason}")]
    MalformedKey { line: usize, reason: String },
    #[error(
        "input is not sorted: chunks of utterance '{utterance_id}' reappear on line {line} after other utterances"
    )]
    UnsortedInput {
        line: usize,
        utterance_id: UtteranceId,
    },
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),
    #[error("utt2uniq lookup table error on line {line}: {details}")]
    Lookup { line: usize, details: String },
    #[error("insufficient data for {context}: need {needed} groups but only {available} available")]
    InsufficientData {
        needed: usize,
        available: usize,
        context: &'static str,
    },
    #[error("group {0} is not part of the partition")]
    UnknownGroup(GroupId),
    #[error("failed to access '{}': {source}", path.display())]
    Input { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
}
