//! Utterance to pre-augmentation identity resolution.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::errors::GroupingError;
use crate::types::{Identity, UtteranceId};

/// Maps an utterance id to the identity used for leakage detection.
pub trait IdentityResolver {
    /// Identity of `utterance_id`.
    fn resolve<'a>(&'a self, utterance_id: &'a str) -> &'a str;
}

/// Identity map: every utterance is its own identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughResolver;

impl IdentityResolver for PassthroughResolver {
    fn resolve<'a>(&'a self, utterance_id: &'a str) -> &'a str {
        utterance_id
    }
}

/// `utt2uniq`-backed resolver. Utterances absent from the table map to themselves.
#[derive(Clone, Debug, Default)]
pub struct TableResolver {
    table: HashMap<UtteranceId, Identity>,
}

impl TableResolver {
    /// Build a resolver from already-parsed pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, GroupingError>
    where
        I: IntoIterator<Item = (UtteranceId, Identity)>,
    {
        let mut resolver = Self::default();
        for (idx, (utterance_id, identity)) in pairs.into_iter().enumerate() {
            resolver.insert(idx + 1, utterance_id, identity)?;
        }
        Ok(resolver)
    }

    /// Parse a two-column `<utterance_id> <identity>` table.
    ///
    /// Lines that do not have exactly two fields, and utterances listed twice
    /// with different identities, are hard errors. Repeated identical entries
    /// are accepted.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, GroupingError> {
        let mut resolver = Self::default();
        for (idx, text) in reader.lines().enumerate() {
            let line = idx + 1;
            let text = text?;
            let mut fields = text.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(utterance_id), Some(identity), None) => {
                    resolver.insert(line, utterance_id.to_string(), identity.to_string())?;
                }
                _ => {
                    return Err(GroupingError::Lookup {
                        line,
                        details: format!(
                            "expected '<utterance_id> <identity>', got '{}'",
                            text.trim()
                        ),
                    });
                }
            }
        }
        Ok(resolver)
    }

    /// Open and parse a table from `path`.
    pub fn from_path(path: &Path) -> Result<Self, GroupingError> {
        let file = File::open(path).map_err(|source| GroupingError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        let resolver = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            entries = resolver.len(),
            "loaded utt2uniq table"
        );
        Ok(resolver)
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn insert(
        &mut self,
        line: usize,
        utterance_id: UtteranceId,
        identity: Identity,
    ) -> Result<(), GroupingError> {
        if let Some(existing) = self.table.get(&utterance_id) {
            if *existing != identity {
                return Err(GroupingError::Lookup {
                    line,
                    details: format!(
                        "utterance '{utterance_id}' maps to both '{existing}' and '{identity}'"
                    ),
                });
            }
            return Ok(());
        }
        self.table.insert(utterance_id, identity);
        Ok(())
    }
}

impl IdentityResolver for TableResolver {
    fn resolve<'a>(&'a self, utterance_id: &'a str) -> &'a str {
        self.table
            .get(utterance_id)
            .map(String::as_str)
            .unwrap_or(utterance_id)
    }
}

/// Pick the resolver once at startup: table-backed when a path is given,
/// passthrough otherwise.
pub fn resolver_from_path(
    path: Option<&Path>,
) -> Result<Box<dyn IdentityResolver>, GroupingError> {
    match path {
        Some(path) => Ok(Box::new(TableResolver::from_path(path)?)),
        None => {
            info!("no utt2uniq table given; using utterance ids as identities");
            Ok(Box::new(PassthroughResolver))
        }
    }
}
