//! Writing database entries as bounded-size JSON shards

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;

use crate::model::Entry;

/// The default number of entries per shard, roughly 90 MB of JSON.
pub const DEFAULT_CAPACITY: usize = 40_000;

#[derive(Debug, thiserror::Error)]
pub enum ShardError {
    #[error("{0:#}")]
    Io(anyhow::Error),
    #[error("Failed serializing shard: {0:#}")]
    Serialize(anyhow::Error),
}

/// Buffers entries and writes them as sequentially numbered JSON shards.
///
/// A shard is flushed automatically once the buffer reaches the configured
/// capacity. The caller must invoke [`ShardWriter::finish`] at end of input
/// so a trailing partial shard is not lost. A flushed shard is final: the
/// index is monotonically increasing and never reused, and no shard holds
/// more than `capacity` entries.
#[derive(Debug)]
pub struct ShardWriter {
    base: PathBuf,
    capacity: usize,
    buffer: Vec<Entry>,
    index: usize,
}

impl ShardWriter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            capacity: DEFAULT_CAPACITY,
            buffer: Vec::new(),
            index: 0,
        }
    }

    /// Set the number of entries per shard. Clamped to at least one.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// The number of shards written so far.
    pub fn shards_written(&self) -> usize {
        self.index
    }

    /// The number of entries currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append an entry, flushing a full shard once the capacity is reached.
    pub fn push(&mut self, entry: Entry) -> Result<(), ShardError> {
        self.buffer.push(entry);
        if self.buffer.len() >= self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Write out any remaining entries. A no-op on an empty buffer, so no
    /// empty shard file is ever produced.
    pub fn finish(&mut self) -> Result<(), ShardError> {
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ShardError> {
        let path = self.base.join(format!("cnvd-{:04}.json", self.index));
        log::debug!("Writing shard: {} ({} entries)", path.display(), self.buffer.len());

        let file = File::create(&path)
            .with_context(|| format!("Unable to open shard for writing: {}", path.display()))
            .map_err(ShardError::Io)?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, &self.buffer)
            .context("Failed serializing shard")
            .map_err(ShardError::Serialize)?;
        out.flush()
            .with_context(|| format!("Unable to write shard: {}", path.display()))
            .map_err(ShardError::Io)?;

        self.index += 1;
        self.buffer.clear();

        Ok(())
    }
}
