//! Group-list output.
//!
//! Each output line is one group: its member locations, space-separated, in the
//! group's internal order. Files are staged next to their destination and only
//! moved into place once every file has been written, so a failure while
//! writing leaves no outputs behind. Moving into place is one rename per file:
//! if a later rename fails, earlier destinations have already been replaced and
//! the set of outputs must be treated as invalid.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::GroupingError;
use crate::partition::Partition;
use crate::selection::Selection;
use crate::types::GroupId;

/// Destinations for the three group files and the optional JSON summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    /// Training groups.
    pub training_data_out: PathBuf,
    /// Held-out groups.
    pub heldout_subset_out: PathBuf,
    /// Training groups statistically matched to the held-out subset.
    pub training_subset_out: PathBuf,
    /// Optional JSON selection summary.
    pub summary_out: Option<PathBuf>,
}

/// Write one line per group in `ids`.
pub fn write_groups<W: Write>(
    mut writer: W,
    partition: &Partition,
    ids: &[GroupId],
) -> Result<(), GroupingError> {
    for &id in ids {
        let group = partition
            .group(id)
            .ok_or(GroupingError::UnknownGroup(id))?;
        let mut first = true;
        for example in partition.members(group) {
            if !first {
                writer.write_all(b" ")?;
            }
            writer.write_all(example.location.as_bytes())?;
            first = false;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Files written to temporary locations, waiting to be moved into place.
#[derive(Debug, Default)]
pub struct StagedOutputs {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedOutputs {
    /// Stage `path`, filling it through `fill`.
    pub fn stage<F>(&mut self, path: &Path, fill: F) -> Result<(), GroupingError>
    where
        F: FnOnce(&mut BufWriter<&mut fs::File>) -> Result<(), GroupingError>,
    {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(|source| GroupingError::Input {
            path: dir.to_path_buf(),
            source,
        })?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            fill(&mut writer)?;
            writer.flush()?;
        }
        self.staged.push((temp, path.to_path_buf()));
        Ok(())
    }

    /// Number of staged files.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// True when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Move every staged file to its destination, in staging order.
    ///
    /// Stops at the first failed rename; destinations before it are already
    /// replaced.
    pub fn persist(self) -> Result<Vec<PathBuf>, GroupingError> {
        let mut written = Vec::with_capacity(self.staged.len());
        for (temp, path) in self.staged {
            temp.persist(&path).map_err(|err| GroupingError::Input {
                path: path.clone(),
                source: err.error,
            })?;
            written.push(path);
        }
        Ok(written)
    }
}

fn stage_json<T: Serialize>(
    staged: &mut StagedOutputs,
    path: &Path,
    value: &T,
) -> Result<(), GroupingError> {
    staged.stage(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value).map_err(std::io::Error::from)?;
        writer.write_all(b"\n")?;
        Ok(())
    })
}

/// Write training, held-out, and matched group files (plus the summary, if
/// requested) for `selection`.
pub fn write_outputs<T: Serialize>(
    paths: &OutputPaths,
    partition: &Partition,
    selection: &Selection,
    summary: &T,
) -> Result<Vec<PathBuf>, GroupingError> {
    let mut staged = StagedOutputs::default();
    staged.stage(&paths.training_data_out, |w| {
        write_groups(w, partition, &selection.training)
    })?;
    staged.stage(&paths.heldout_subset_out, |w| {
        write_groups(w, partition, &selection.heldout)
    })?;
    staged.stage(&paths.training_subset_out, |w| {
        write_groups(w, partition, &selection.matched)
    })?;
    if let Some(summary_path) = &paths.summary_out {
        stage_json(&mut staged, summary_path, summary)?;
    }

    let written = staged.persist()?;
    for path in &written {
        info!(path = %path.display(), "wrote output");
    }
    Ok(written)
}
