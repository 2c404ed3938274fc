//! Example key decoding.
//!
//! Each input line is `<key> <location>`, where the key has the form
//! `<utterance_id>-<first_frame>-<left_context>-<num_frames>-<right_context>-v1`.
//! The utterance id may itself contain `-`, so the numeric fields are taken
//! from the right.
//!
//! Input is expected to be sorted so that the chunks of one utterance are
//! adjacent (and, ideally, utterances of one speaker too). Ordering only
//! affects how well groups keep utterances together, so an utterance that
//! reappears after a different one is logged rather than rejected unless
//! strict ordering is requested. A byte-sorted table does this whenever one
//! utterance id is another id followed by `-<digit>`.

use std::collections::HashSet;
use std::io::BufRead;

use tracing::warn;

use crate::constants::keys::{KEY_FIELD_COUNT, KEY_FIELD_SEPARATOR, KEY_VERSION_SUFFIX};
use crate::errors::GroupingError;
use crate::types::{Location, UtteranceId};

/// `(left_context, num_frames, right_context)`; only chunks sharing a signature
/// may be placed in the same group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextSignature {
    /// Frames of left context.
    pub left_context: u32,
    /// Frames in the chunk.
    pub num_frames: u32,
    /// Frames of right context.
    pub right_context: u32,
}

/// Decoded example key plus its storage location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    /// Utterance the chunk was cut from.
    pub utterance_id: UtteranceId,
    /// First frame of the chunk within the utterance.
    pub first_frame: u32,
    /// Frames of left context.
    pub left_context: u32,
    /// Frames in the chunk.
    pub num_frames: u32,
    /// Frames of right context.
    pub right_context: u32,
    /// Opaque storage reference, copied verbatim to the output files.
    pub location: Location,
}

impl Example {
    /// Context signature used to keep incompatible chunks apart.
    pub fn signature(&self) -> ContextSignature {
        ContextSignature {
            left_context: self.left_context,
            num_frames: self.num_frames,
            right_context: self.right_context,
        }
    }
}

/// Decoded key fields (everything except the location).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleKey {
    /// Utterance the chunk was cut from.
    pub utterance_id: UtteranceId,
    /// First frame of the chunk within the utterance.
    pub first_frame: u32,
    /// Frames of left context.
    pub left_context: u32,
    /// Frames in the chunk.
    pub num_frames: u32,
    /// Frames of right context.
    pub right_context: u32,
}

/// Parse a key of the form `<utt>-<first_frame>-<left>-<frames>-<right>-v1`.
///
/// The returned error string is the reason only; callers attach the line number.
pub fn parse_key(key: &str) -> Result<ExampleKey, String> {
    let Some((body, suffix)) = key.rsplit_once(KEY_FIELD_SEPARATOR) else {
        return Err(format!("key '{key}' has no '-{KEY_VERSION_SUFFIX}' suffix"));
    };
    if suffix != KEY_VERSION_SUFFIX {
        return Err(format!(
            "key '{key}' ends with '-{suffix}', expected '-{KEY_VERSION_SUFFIX}'"
        ));
    }

    // rsplitn yields fields right-to-left; the last piece is the utterance id.
    let fields: Vec<&str> = body.rsplitn(KEY_FIELD_COUNT, KEY_FIELD_SEPARATOR).collect();
    if fields.len() != KEY_FIELD_COUNT {
        return Err(format!(
            "key '{key}' has {} fields before the suffix, expected {KEY_FIELD_COUNT}",
            fields.len()
        ));
    }
    let utterance_id = fields[4];
    if utterance_id.is_empty() {
        return Err(format!("key '{key}' has an empty utterance id"));
    }

    Ok(ExampleKey {
        utterance_id: utterance_id.to_string(),
        first_frame: parse_field(key, "first_frame", fields[3])?,
        left_context: parse_field(key, "left_context", fields[2])?,
        num_frames: parse_field(key, "num_frames", fields[1])?,
        right_context: parse_field(key, "right_context", fields[0])?,
    })
}

fn parse_field(key: &str, name: &str, raw: &str) -> Result<u32, String> {
    // u32::from_str accepts a leading '+', which is not a valid key field.
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!(
            "{name} '{raw}' in key '{key}' is not a non-negative integer"
        ));
    }
    raw.parse::<u32>()
        .map_err(|err| format!("{name} '{raw}' in key '{key}' is out of range: {err}"))
}

/// Decode one `<key> <location>` line. `line` is 1-based and only used for errors.
pub fn decode_line(line: usize, text: &str) -> Result<Example, GroupingError> {
    let malformed = |reason: String| GroupingError::MalformedKey { line, reason };

    let mut fields = text.split_whitespace();
    let (Some(key), Some(location)) = (fields.next(), fields.next()) else {
        return Err(malformed(format!(
            "expected '<key> <location>', got '{}'",
            text.trim()
        )));
    };
    if fields.next().is_some() {
        return Err(malformed(format!(
            "expected exactly two fields (key and location), got '{}'",
            text.trim()
        )));
    }

    let parsed = parse_key(key).map_err(malformed)?;
    Ok(Example {
        utterance_id: parsed.utterance_id,
        first_frame: parsed.first_frame,
        left_context: parsed.left_context,
        num_frames: parsed.num_frames,
        right_context: parsed.right_context,
        location: location.to_string(),
    })
}

/// Tracks utterance runs and counts utterances whose chunks are not contiguous.
#[derive(Debug, Default)]
pub struct UtteranceOrderCheck {
    current: Option<UtteranceId>,
    finished: HashSet<UtteranceId>,
    reopened: usize,
}

impl UtteranceOrderCheck {
    /// Record `utterance_id`; returns `true` when its run was already closed
    /// by a different utterance.
    pub fn observe(&mut self, utterance_id: &str) -> bool {
        if self.current.as_deref() == Some(utterance_id) {
            return false;
        }
        let reopened = self.finished.contains(utterance_id);
        if reopened {
            self.reopened += 1;
        }
        if let Some(previous) = self.current.replace(utterance_id.to_string()) {
            self.finished.insert(previous);
        }
        reopened
    }

    /// Number of times an utterance reappeared after a different one.
    pub fn reopened(&self) -> usize {
        self.reopened
    }
}

/// Decode every line of an scp-style reader, preserving input order.
///
/// Fails on the first malformed line. Blank lines are malformed; an example
/// table never contains them. Non-contiguous utterances are warned about, or
/// rejected with `UnsortedInput` when `strict_order` is set.
pub fn read_examples<R: BufRead>(
    reader: R,
    strict_order: bool,
) -> Result<Vec<Example>, GroupingError> {
    let mut examples = Vec::new();
    let mut order = UtteranceOrderCheck::default();
    for (idx, text) in reader.lines().enumerate() {
        let line = idx + 1;
        let text = text?;
        let example = decode_line(line, &text)?;
        if order.observe(&example.utterance_id) {
            if strict_order {
                return Err(GroupingError::UnsortedInput {
                    line,
                    utterance_id: example.utterance_id,
                });
            }
            warn!(
                line,
                utterance_id = %example.utterance_id,
                "utterance reappears after other utterances"
            );
        }
        examples.push(example);
    }
    if order.reopened() > 0 {
        warn!(
            reopened = order.reopened(),
            "input chunks are not contiguous per utterance; groups may mix utterances more than needed"
        );
    }
    Ok(examples)
}
