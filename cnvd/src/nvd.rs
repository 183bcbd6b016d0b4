//! Looking up NVD records for enrichment
//!
//! Expects a local copy of the NVD feed with one JSON document per CVE,
//! grouped by year: `<base>/<year>/<CVE-ID>.json` (the layout produced by
//! the vuln-list mirrors).

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::PathBuf;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    /// The cross reference does not split into a year segment.
    #[error("malformed cross reference: {0}")]
    MalformedIdentifier(String),
    #[error("{0:#}")]
    Io(anyhow::Error),
    /// The document exists but cannot be parsed or lacks expected keys.
    #[error("unexpected NVD document: {path}: {reason}")]
    Document { path: String, reason: String },
}

/// Severity and platform data extracted from one NVD record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enrichment {
    /// the CVSS base severity, the literal `None` if the record carries no metric
    pub severity: String,
    /// every `cpe23Uri` found below the record's configurations
    pub cpe_uris: Vec<String>,
}

/// A directory holding per-CVE NVD JSON documents.
#[derive(Clone, Debug)]
pub struct NvdDirectory {
    base: PathBuf,
}

impl NvdDirectory {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Derive the path of the NVD document for a cross reference like
    /// `CVE-2021-44228`.
    ///
    /// Pure path construction: the year segment is not required to be
    /// numeric, and the file is not required to exist. The identifier is
    /// trimmed first.
    pub fn path_for(&self, cve: &str) -> Result<PathBuf, EnrichmentError> {
        let cve = cve.trim();
        let year = cve
            .split('-')
            .nth(1)
            .ok_or_else(|| EnrichmentError::MalformedIdentifier(cve.to_string()))?;
        Ok(self.base.join(year).join(format!("{cve}.json")))
    }

    /// Load severity and platform data for a cross reference.
    ///
    /// A missing document is the expected case for advisories without an NVD
    /// counterpart and yields `Ok(None)`.
    pub fn lookup(&self, cve: &str) -> Result<Option<Enrichment>, EnrichmentError> {
        let path = self.path_for(cve)?;

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(EnrichmentError::Io(anyhow::Error::new(err).context(
                    format!("Unable to open NVD document: {}", path.display()),
                )));
            }
        };

        let document: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| {
                EnrichmentError::Document {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                }
            })?;

        extract(&document)
            .map(Some)
            .map_err(|reason| EnrichmentError::Document {
                path: path.display().to_string(),
                reason,
            })
    }
}

fn extract(document: &Value) -> Result<Enrichment, String> {
    let impact = document.get("impact").ok_or("missing impact")?;

    // CVSS v3 wins over v2, a record carrying neither gets the literal "None"
    let severity = if let Some(v3) = impact.get("baseMetricV3") {
        string_at(v3, &["cvssV3", "baseSeverity"])?
    } else if let Some(v2) = impact.get("baseMetricV2") {
        string_at(v2, &["severity"])?
    } else {
        "None".to_string()
    };

    let configurations = document
        .get("configurations")
        .ok_or("missing configurations")?;

    let mut cpe_uris = Vec::new();
    collect_cpe_uris(configurations, &mut cpe_uris);

    Ok(Enrichment {
        severity: severity.trim().to_string(),
        cpe_uris,
    })
}

fn string_at(value: &Value, path: &[&str]) -> Result<String, String> {
    let mut current = value;
    for key in path {
        current = current.get(key).ok_or_else(|| format!("missing {key}"))?;
    }
    current
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| format!("{} is not a string", path.join(".")))
}

/// Collect every `cpe23Uri` string below `value`.
///
/// The depth at which the key shows up depends on the feed version, so this
/// walks the whole structure instead of assuming a fixed path.
fn collect_cpe_uris(value: &Value, target: &mut Vec<String>) {
    match value {
        Value::Object(fields) => {
            for (key, value) in fields {
                if key == "cpe23Uri" {
                    if let Some(uri) = value.as_str() {
                        target.push(uri.to_string());
                    }
                } else {
                    collect_cpe_uris(value, target);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_cpe_uris(item, target);
            }
        }
        _ => {}
    }
}
