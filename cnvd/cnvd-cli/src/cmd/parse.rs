use std::path::PathBuf;

use cnvd_walker::parser::AdvisoryReader;

/// Parse a CNVD XML dump and print its records
#[derive(clap::Args, Debug)]
pub struct Parse {
    file: PathBuf,
}

impl Parse {
    pub fn run(self) -> anyhow::Result<()> {
        let mut reader = AdvisoryReader::open(&self.file)?;

        while let Some(advisory) = reader.next_record()? {
            println!(
                "  {} ({}): {}",
                advisory.number.trim(),
                advisory.open_time.trim(),
                advisory.title.trim()
            );
        }

        if reader.truncated() {
            eprintln!("  Format error: input ended inside a record");
        }

        Ok(())
    }
}
