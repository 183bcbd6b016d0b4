#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]

//! Building a CNVD vulnerability database
//!
//! ## Idea
//!
//! CNVD publishes its advisories as XML dumps. Most advisories carry a CVE
//! cross reference, which allows enriching them with the severity and
//! affected platform information of a local copy of the NVD feed. This crate
//! streams the XML dumps, correlates each advisory with its NVD record,
//! expands it into one entry per affected (package, system) pair, and writes
//! the result as a sequence of bounded-size JSON shards, ready for bulk
//! loading into a vulnerability database.
//!
//! The pipeline is a single synchronous pass: [`walker::Walker`] drives a
//! [`parser::Accumulator`] over each input file and feeds every completed
//! advisory through [`nvd::NvdDirectory`] and [`expand::expand`] into a
//! [`shard::ShardWriter`].
//!
//! Broken input never aborts a run. Advisories which cannot be correlated
//! are skipped and accounted for in the [`report::Report`] returned by
//! [`walker::Walker::finish`].
//!
//! ## Example
//!
//! ```no_run
//! use anyhow::Result;
//! use cnvd_walker::nvd::NvdDirectory;
//! use cnvd_walker::shard::ShardWriter;
//! use cnvd_walker::walker::{discover, Walker};
//!
//! fn build() -> Result<()> {
//!   let mut walker = Walker::new(
//!     NvdDirectory::new("feeds/nvd"),
//!     ShardWriter::new("secdb/cnvd"),
//!   );
//!
//!   for file in discover("feeds/cnvd")? {
//!     walker.walk_file(file)?;
//!   }
//!
//!   let report = walker.finish()?;
//!   log::info!("{report}");
//!
//!   Ok(())
//! }
//! ```

pub mod cpe;
pub mod expand;
pub mod model;
pub mod nvd;
pub mod parser;
pub mod report;
pub mod shard;
pub mod utils;
pub mod walker;
