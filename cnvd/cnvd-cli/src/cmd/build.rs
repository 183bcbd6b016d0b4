use anyhow::Context;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;

use cnvd_walker::nvd::NvdDirectory;
use cnvd_walker::shard::{DEFAULT_CAPACITY, ShardWriter};
use cnvd_walker::walker::{Walker, discover};

/// Build the CNVD database from XML dumps and a local NVD feed
#[derive(clap::Args, Debug)]
pub struct Build {
    /// Directory containing the CNVD XML dumps
    #[arg(short = 'c', long = "cnvd")]
    cnvd: PathBuf,

    /// Root of the local NVD feed (vuln-list layout, holding an `nvd/` directory)
    #[arg(short = 'n', long = "nvd")]
    nvd: PathBuf,

    /// Output directory for the database shards, created if absent
    #[arg(short, long)]
    output: PathBuf,

    /// Number of entries per shard
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    split: usize,
}

impl Build {
    pub fn run(self, progress: Option<MultiProgress>) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.output).with_context(|| {
            format!(
                "Unable to create output directory: {}",
                self.output.display()
            )
        })?;

        let files = discover(&self.cnvd)?;
        if files.is_empty() {
            log::warn!("No XML dumps found in: {}", self.cnvd.display());
        }

        let bar = progress.map(|multi| {
            let bar = ProgressBar::new(files.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} {wide_bar} {pos}/{len} ({eta})")
                    .unwrap(),
            );
            multi.add(bar)
        });

        let mut walker = Walker::new(
            NvdDirectory::new(self.nvd.join("nvd")),
            ShardWriter::new(&self.output).capacity(self.split),
        );

        for file in &files {
            if let Some(bar) = &bar {
                bar.set_message(
                    file.file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                );
            }
            walker.walk_file(file)?;
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }

        let report = walker.finish()?;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        log::info!("{report}");

        Ok(())
    }
}
