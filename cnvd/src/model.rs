//! The data model of the CNVD database

use serde::{Deserialize, Serialize};

/// The marker substituted when an advisory has no concrete platform data.
pub const UNKNOWN: &str = "Unknown";

/// One CNVD advisory record, accumulated while parsing an XML dump.
///
/// Fields hold the raw text as found in the dump. Trimming happens when the
/// record is turned into [`Entry`] values, except for `products`, whose
/// items are kept verbatim (entity-decoded) and joined later.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Advisory {
    pub number: String,
    pub title: String,
    pub severity: String,
    pub products: Vec<String>,
    pub is_event: String,
    pub submit_time: String,
    pub open_time: String,
    pub discoverer_name: String,
    pub reference_link: String,
    pub formal_way: String,
    pub description: String,
    pub patch_name: String,
    pub patch_description: String,
    pub cve_number: String,
    pub cve_url: String,
}

/// An affected software package, extracted from a CPE 2.3 URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    /// the full CPE 2.3 URI the package was extracted from
    pub cpe: String,
}

impl Package {
    /// The sentinel standing in when no package information exists.
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
            cpe: UNKNOWN.to_string(),
        }
    }
}

/// An affected operating system, extracted from a CPE 2.3 URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub vendor: String,
    pub product: String,
    pub version: String,
}

impl System {
    /// The sentinel standing in when no system information exists.
    pub fn unknown() -> Self {
        Self {
            vendor: UNKNOWN.to_string(),
            product: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
        }
    }
}

/// One denormalized entry of the output database.
///
/// The serialized field names are the wire format the downstream database
/// loader expects, including the historical `serverity` spelling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub cnvd_number: String,
    pub title: String,
    #[serde(rename = "serverity")]
    pub severity: String,
    /// affected product names, joined with two spaces
    pub products: String,
    pub vuln_type: String,
    pub submit_time: String,
    pub open_time: String,
    pub discoverer_name: String,
    pub reference_link: String,
    pub formal_way: String,
    pub description: String,
    pub patch_name: String,
    pub patch_description: String,
    pub cve_number: String,
    pub cve_url: String,
    pub nvd_severity: String,
    pub package: Package,
    pub system: System,
}
