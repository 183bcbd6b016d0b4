//! The actual walker

use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

use crate::expand::expand;
use crate::model::Advisory;
use crate::nvd::{EnrichmentError, NvdDirectory};
use crate::parser::AdvisoryReader;
use crate::report::Report;
use crate::shard::{ShardError, ShardWriter};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0:#}")]
    Io(anyhow::Error),
    #[error(transparent)]
    Shard(#[from] ShardError),
}

/// Find the CNVD XML dumps below a directory.
///
/// The result is sorted, so that repeated runs over the same input produce
/// byte-identical shards.
pub fn discover(base: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let base = base.as_ref();
    let mut files = Vec::new();

    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = entry
            .with_context(|| format!("Failed to walk input directory: {}", base.display()))
            .map_err(Error::Io)?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "xml")
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Walks CNVD XML dumps and turns them into database shards.
///
/// One instance processes any number of input files against a single shard
/// sequence. Failures below the advisory boundary never abort the run, they
/// are counted in the [`Report`] instead; only I/O failures on the output
/// side propagate.
pub struct Walker {
    nvd: NvdDirectory,
    output: ShardWriter,
    report: Report,
}

impl Walker {
    pub fn new(nvd: NvdDirectory, output: ShardWriter) -> Self {
        Self {
            nvd,
            output,
            report: Report::default(),
        }
    }

    /// Process a single XML dump.
    ///
    /// A malformed dump is abandoned at the point of the error and shows up
    /// in the report; records completed before that point are kept.
    pub fn walk_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        log::info!("Processing: {}", path.display());

        let mut reader = AdvisoryReader::open(path)
            .map_err(|err| {
                anyhow::Error::new(err).context(format!("Unable to open input: {}", path.display()))
            })
            .map_err(Error::Io)?;

        loop {
            match reader.next_record() {
                Ok(Some(advisory)) => self.advisory(advisory)?,
                Ok(None) => break,
                Err(err) => {
                    log::warn!("Abandoning {}: {err}", path.display());
                    self.report.malformed_inputs += 1;
                    return Ok(());
                }
            }
        }

        if reader.truncated() {
            log::warn!("Input ended inside a record: {}", path.display());
            self.report.malformed_inputs += 1;
        }

        Ok(())
    }

    /// Correlate one completed advisory and push its entries.
    fn advisory(&mut self, advisory: Advisory) -> Result<(), Error> {
        self.report.advisories += 1;

        let cve = advisory.cve_number.trim();
        if cve.is_empty() {
            self.report.no_cross_reference += 1;
            return Ok(());
        }

        let enrichment = match self.nvd.lookup(cve) {
            Ok(Some(enrichment)) => enrichment,
            Ok(None) => {
                log::debug!("No NVD document: {cve}");
                self.report.enrichment_missing += 1;
                return Ok(());
            }
            Err(err @ EnrichmentError::MalformedIdentifier(_)) => {
                log::warn!("Skipping {}: {err}", advisory.number.trim());
                self.report.malformed_cross_reference += 1;
                return Ok(());
            }
            Err(err) => {
                log::warn!("Skipping {}: {err}", advisory.number.trim());
                self.report.enrichment_errors += 1;
                return Ok(());
            }
        };

        for entry in expand(&advisory, &enrichment) {
            self.report.entries += 1;
            self.output.push(entry)?;
        }

        Ok(())
    }

    /// Flush the trailing partial shard and return the run report.
    pub fn finish(mut self) -> Result<Report, Error> {
        self.output.finish()?;
        self.report.shards = self.output.shards_written();
        Ok(self.report)
    }
}
