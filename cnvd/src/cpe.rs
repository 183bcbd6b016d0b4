//! Extracting platform information from CPE 2.3 URIs

use crate::model::{Package, System};

// Component positions in a colon-split CPE 2.3 URI:
// `cpe:2.3:{part}:{vendor}:{product}:{version}:...`
const PART: usize = 2;
const VENDOR: usize = 3;
const PRODUCT: usize = 4;
const VERSION: usize = 5;

/// A platform reference extracted from a CPE 2.3 URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Platform {
    /// an application (part `a`)
    Package(Package),
    /// an operating system (part `o`)
    System(System),
}

/// Extract a platform reference from a CPE 2.3 URI.
///
/// Returns `None` for the hardware part class, anything else that is neither
/// `a` nor `o`, and strings too short to carry the expected components. A
/// single unusable URI must not fail the advisory it belongs to, so there is
/// no error case.
pub fn parse(uri: &str) -> Option<Platform> {
    let parts = uri.split(':').collect::<Vec<_>>();
    if parts.len() <= VERSION {
        return None;
    }

    match parts[PART] {
        "a" => Some(Platform::Package(Package {
            name: parts[PRODUCT].to_string(),
            version: parts[VERSION].to_string(),
            cpe: uri.to_string(),
        })),
        "o" => Some(Platform::System(System {
            vendor: parts[VENDOR].to_string(),
            product: parts[PRODUCT].to_string(),
            version: parts[VERSION].to_string(),
        })),
        _ => None,
    }
}
