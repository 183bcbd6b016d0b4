//! Expanding one advisory into denormalized database entries

use crate::cpe::{self, Platform};
use crate::model::{Advisory, Entry, Package, System};
use crate::nvd::Enrichment;

/// Join an advisory with its NVD enrichment, producing one entry per
/// affected (package, system) pair.
///
/// Platform URIs that are neither a package nor a system are dropped. An
/// empty package or system list is replaced with the `Unknown` sentinel, so
/// the cross product is never empty: an advisory with a resolvable NVD
/// record always yields at least one entry.
pub fn expand(advisory: &Advisory, enrichment: &Enrichment) -> Vec<Entry> {
    let mut packages = Vec::new();
    let mut systems = Vec::new();

    for uri in &enrichment.cpe_uris {
        match cpe::parse(uri) {
            Some(Platform::Package(package)) => packages.push(package),
            Some(Platform::System(system)) => systems.push(system),
            None => {}
        }
    }

    if packages.is_empty() {
        packages.push(Package::unknown());
    }
    if systems.is_empty() {
        systems.push(System::unknown());
    }

    let mut entries = Vec::with_capacity(packages.len() * systems.len());
    for package in &packages {
        for system in &systems {
            entries.push(entry(
                advisory,
                &enrichment.severity,
                package.clone(),
                system.clone(),
            ));
        }
    }

    entries
}

fn entry(advisory: &Advisory, nvd_severity: &str, package: Package, system: System) -> Entry {
    Entry {
        cnvd_number: advisory.number.trim().to_string(),
        title: advisory.title.trim().to_string(),
        severity: advisory.severity.trim().to_string(),
        products: advisory.products.join("  "),
        vuln_type: advisory.is_event.trim().to_string(),
        submit_time: advisory.submit_time.trim().to_string(),
        open_time: advisory.open_time.trim().to_string(),
        discoverer_name: advisory.discoverer_name.trim().to_string(),
        reference_link: advisory.reference_link.trim().to_string(),
        formal_way: advisory.formal_way.trim().to_string(),
        description: advisory.description.trim().to_string(),
        patch_name: advisory.patch_name.trim().to_string(),
        patch_description: advisory.patch_description.trim().to_string(),
        cve_number: advisory.cve_number.trim().to_string(),
        cve_url: advisory.cve_url.trim().to_string(),
        nvd_severity: nvd_severity.to_string(),
        package,
        system,
    }
}
