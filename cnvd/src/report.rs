//! Reporting the outcome of a run

use std::fmt::{Display, Formatter};

use thousands::Separable;

/// Counters describing one run of the walker.
///
/// Advisories that cannot be correlated are skipped rather than failing the
/// run, so these counters are the only user-visible signal of partial loss.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// completed advisory records seen in the input
    pub advisories: usize,
    /// advisories without a CVE cross reference
    pub no_cross_reference: usize,
    /// advisories whose cross reference does not split into a year segment
    pub malformed_cross_reference: usize,
    /// advisories without a matching NVD document
    pub enrichment_missing: usize,
    /// advisories whose NVD document could not be read or understood
    pub enrichment_errors: usize,
    /// input files abandoned because of XML errors
    pub malformed_inputs: usize,
    /// database entries produced
    pub entries: usize,
    /// shard files written
    pub shards: usize,
}

impl Report {
    /// The number of advisories that produced no entries, for any reason.
    pub fn skipped(&self) -> usize {
        self.no_cross_reference
            + self.malformed_cross_reference
            + self.enrichment_missing
            + self.enrichment_errors
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Processed {} advisories: {} entries in {} shards; skipped {} ({} without CVE, {} malformed CVE, {} without NVD document, {} enrichment errors)",
            self.advisories.separate_with_commas(),
            self.entries.separate_with_commas(),
            self.shards.separate_with_commas(),
            self.skipped().separate_with_commas(),
            self.no_cross_reference.separate_with_commas(),
            self.malformed_cross_reference.separate_with_commas(),
            self.enrichment_missing.separate_with_commas(),
            self.enrichment_errors.separate_with_commas(),
        )?;

        if self.malformed_inputs > 0 {
            write!(
                f,
                "; {} input files abandoned",
                self.malformed_inputs.separate_with_commas()
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_sums_all_loss() {
        let report = Report {
            advisories: 10,
            no_cross_reference: 1,
            malformed_cross_reference: 2,
            enrichment_missing: 3,
            enrichment_errors: 4,
            ..Default::default()
        };
        assert_eq!(report.skipped(), 10);
    }

    #[test]
    fn display_mentions_abandoned_inputs_only_when_present() {
        let report = Report::default();
        assert!(!report.to_string().contains("abandoned"));

        let report = Report {
            malformed_inputs: 1,
            ..Default::default()
        };
        assert!(report.to_string().contains("abandoned"));
    }
}
