use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

use cnvd_walker::nvd::NvdDirectory;
use cnvd_walker::report::Report;
use cnvd_walker::shard::ShardWriter;
use cnvd_walker::walker::{Walker, discover};

struct Fixture {
    root: TempDir,
    cnvd: std::path::PathBuf,
    nvd: std::path::PathBuf,
    output: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().expect("temp dir");
        let cnvd = root.path().join("cnvd");
        let nvd = root.path().join("nvd");
        let output = root.path().join("secdb");
        fs::create_dir_all(&cnvd).expect("cnvd dir");
        fs::create_dir_all(&nvd).expect("nvd dir");
        fs::create_dir_all(&output).expect("output dir");
        Self {
            root,
            cnvd,
            nvd,
            output,
        }
    }

    fn write_xml(&self, name: &str, records: &str) {
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<vulnerabilitys>\n{records}\n</vulnerabilitys>\n"
        );
        fs::write(self.cnvd.join(name), document).expect("write xml");
    }

    fn write_nvd(&self, cve: &str, document: &Value) {
        let year = cve.split('-').nth(1).expect("year");
        let dir = self.nvd.join(year);
        fs::create_dir_all(&dir).expect("year dir");
        fs::write(
            dir.join(format!("{cve}.json")),
            serde_json::to_vec(document).expect("serialize"),
        )
        .expect("write nvd");
    }

    fn run(&self, capacity: usize) -> Report {
        let mut walker = Walker::new(
            NvdDirectory::new(&self.nvd),
            ShardWriter::new(&self.output).capacity(capacity),
        );
        for file in discover(&self.cnvd).expect("discover") {
            walker.walk_file(file).expect("walk");
        }
        walker.finish().expect("finish")
    }

    fn shard(&self, index: usize) -> Vec<Value> {
        let path = self.output.join(format!("cnvd-{index:04}.json"));
        serde_json::from_slice(&fs::read(&path).expect("read shard")).expect("parse shard")
    }

    fn shard_exists(&self, index: usize) -> bool {
        self.output.join(format!("cnvd-{index:04}.json")).exists()
    }
}

fn advisory(number: &str, cve_line: &str) -> String {
    format!(
        r#"  <vulnerability>
    <number>{number}</number>
    <title> Widget overflow </title>
    <serverity>高</serverity>
    <products>
      <product>Widget 1.0</product>
      <product>Tom &amp;amp; Jerry 2.0</product>
    </products>
    <isEvent>通用软硬件漏洞</isEvent>
    <submitTime>2099-01-01</submitTime>
    <openTime>2099-01-02</openTime>
    <discovererName>someone</discovererName>
    <referenceLink>https://example.com/advisory</referenceLink>
    <formalWay>upgrade</formalWay>
    <description><![CDATA[A buffer overflow.]]></description>
    <patchName>widget-1.1</patchName>
    <patchDescription>Fixes the overflow.</patchDescription>
    {cve_line}
    <cveUrl>https://example.com/cve</cveUrl>
  </vulnerability>"#
    )
}

fn enrichment(severity: &str, cpe_uris: &[&str]) -> Value {
    let matches = cpe_uris
        .iter()
        .map(|uri| json!({ "cpe23Uri": uri }))
        .collect::<Vec<_>>();
    json!({
        "impact": {
            "baseMetricV3": { "cvssV3": { "baseSeverity": severity } },
        },
        "configurations": {
            "CVE_data_version": "4.0",
            "nodes": [ { "operator": "OR", "cpe_match": matches } ],
        },
    })
}

#[test]
fn end_to_end_single_pairing() {
    let fixture = Fixture::new();
    fixture.write_xml(
        "dump.xml",
        &advisory(
            "CNVD-2099-00001",
            "<cveNumber>CVE-2099-0001</cveNumber>",
        ),
    );
    fixture.write_nvd(
        "CVE-2099-0001",
        &enrichment(
            "HIGH",
            &[
                "cpe:2.3:a:vendor:widget:1.0:*:*:*:*:*:*:*",
                "cpe:2.3:o:os-vendor:os-product:9:*:*:*:*:*:*:*",
            ],
        ),
    );

    let report = fixture.run(40_000);
    assert_eq!(report.advisories, 1);
    assert_eq!(report.entries, 1);
    assert_eq!(report.shards, 1);
    assert_eq!(report.skipped(), 0);

    let entries = fixture.shard(0);
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry["cnvdNumber"], "CNVD-2099-00001");
    assert_eq!(entry["title"], "Widget overflow");
    assert_eq!(entry["serverity"], "高");
    assert_eq!(entry["products"], "Widget 1.0  Tom & Jerry 2.0");
    assert_eq!(entry["vulnType"], "通用软硬件漏洞");
    assert_eq!(entry["description"], "A buffer overflow.");
    assert_eq!(entry["cveNumber"], "CVE-2099-0001");
    assert_eq!(entry["nvdSeverity"], "HIGH");
    assert_eq!(entry["package"]["name"], "widget");
    assert_eq!(entry["package"]["version"], "1.0");
    assert_eq!(entry["system"]["vendor"], "os-vendor");
    assert_eq!(entry["system"]["product"], "os-product");
    assert_eq!(entry["system"]["version"], "9");
}

#[test]
fn advisory_without_cross_reference_yields_nothing() {
    let fixture = Fixture::new();
    fixture.write_xml("dump.xml", &advisory("CNVD-2099-00002", ""));

    let report = fixture.run(40_000);
    assert_eq!(report.advisories, 1);
    assert_eq!(report.no_cross_reference, 1);
    assert_eq!(report.entries, 0);
    assert_eq!(report.shards, 0);
    assert!(!fixture.shard_exists(0));
}

#[test]
fn advisory_without_nvd_document_yields_nothing() {
    let fixture = Fixture::new();
    fixture.write_xml(
        "dump.xml",
        &advisory(
            "CNVD-2099-00003",
            "<cveNumber>CVE-2099-9999</cveNumber>",
        ),
    );

    let report = fixture.run(40_000);
    assert_eq!(report.enrichment_missing, 1);
    assert_eq!(report.entries, 0);
    assert!(!fixture.shard_exists(0));
}

#[test]
fn malformed_cross_reference_is_skipped() {
    // no second hyphen segment at all
    let fixture = Fixture::new();
    fixture.write_xml(
        "dump.xml",
        &advisory("CNVD-2099-00004", "<cveNumber>CVEBAD</cveNumber>"),
    );

    let report = fixture.run(40_000);
    assert_eq!(report.malformed_cross_reference, 1);
    assert_eq!(report.entries, 0);
}

#[test]
fn non_numeric_year_segment_is_a_missing_document() {
    let fixture = Fixture::new();
    fixture.write_xml(
        "dump.xml",
        &advisory("CNVD-2099-00005", "<cveNumber>CVE-BAD</cveNumber>"),
    );

    let report = fixture.run(40_000);
    assert_eq!(report.enrichment_missing, 1);
    assert_eq!(report.entries, 0);
}

#[test]
fn cross_product_covers_every_pairing() {
    let fixture = Fixture::new();
    fixture.write_xml(
        "dump.xml",
        &advisory(
            "CNVD-2099-00006",
            "<cveNumber>CVE-2099-0006</cveNumber>",
        ),
    );
    fixture.write_nvd(
        "CVE-2099-0006",
        &enrichment(
            "CRITICAL",
            &[
                "cpe:2.3:a:vendor:widget:1.0:*:*:*:*:*:*:*",
                "cpe:2.3:a:vendor:widget:1.1:*:*:*:*:*:*:*",
                "cpe:2.3:o:os-vendor:alpha:9:*:*:*:*:*:*:*",
                "cpe:2.3:o:os-vendor:beta:10:*:*:*:*:*:*:*",
                "cpe:2.3:o:os-vendor:gamma:11:*:*:*:*:*:*:*",
            ],
        ),
    );

    let report = fixture.run(40_000);
    assert_eq!(report.entries, 6);

    let entries = fixture.shard(0);
    let mut pairings = entries
        .iter()
        .map(|entry| {
            (
                entry["package"]["version"].as_str().expect("version").to_string(),
                entry["system"]["product"].as_str().expect("product").to_string(),
            )
        })
        .collect::<Vec<_>>();
    pairings.sort();
    pairings.dedup();
    assert_eq!(pairings.len(), 6, "every pairing exactly once");
}

#[test]
fn enrichment_error_does_not_abort_the_run() {
    let fixture = Fixture::new();
    let records = format!(
        "{}\n{}",
        advisory("CNVD-2099-00007", "<cveNumber>CVE-2099-0007</cveNumber>"),
        advisory("CNVD-2099-00008", "<cveNumber>CVE-2099-0008</cveNumber>"),
    );
    fixture.write_xml("dump.xml", &records);

    // first document is unreadable, second lacks the impact object
    let year = fixture.nvd.join("2099");
    fs::create_dir_all(&year).expect("year dir");
    fs::write(year.join("CVE-2099-0007.json"), "not json").expect("write");
    fixture.write_nvd("CVE-2099-0008", &json!({ "configurations": {} }));

    let report = fixture.run(40_000);
    assert_eq!(report.advisories, 2);
    assert_eq!(report.enrichment_errors, 2);
    assert_eq!(report.entries, 0);
}

#[test]
fn malformed_xml_abandons_the_file_but_not_the_run() {
    let fixture = Fixture::new();
    fs::write(
        fixture.cnvd.join("a-broken.xml"),
        "<vulnerabilitys><vulnerability><number>CNVD-2099",
    )
    .expect("write");
    fixture.write_xml(
        "b-good.xml",
        &advisory(
            "CNVD-2099-00009",
            "<cveNumber>CVE-2099-0009</cveNumber>",
        ),
    );
    fixture.write_nvd(
        "CVE-2099-0009",
        &enrichment("LOW", &["cpe:2.3:a:vendor:widget:1.0:*:*:*:*:*:*:*"]),
    );

    let report = fixture.run(40_000);
    assert_eq!(report.malformed_inputs, 1);
    assert_eq!(report.entries, 1);

    let entries = fixture.shard(0);
    assert_eq!(entries[0]["cnvdNumber"], "CNVD-2099-00009");
    assert_eq!(entries[0]["system"]["vendor"], "Unknown");
}

#[test]
fn shard_capacity_is_never_exceeded() {
    let fixture = Fixture::new();
    fixture.write_xml(
        "dump.xml",
        &advisory(
            "CNVD-2099-00010",
            "<cveNumber>CVE-2099-0010</cveNumber>",
        ),
    );
    // one package, three systems: three entries
    fixture.write_nvd(
        "CVE-2099-0010",
        &enrichment(
            "HIGH",
            &[
                "cpe:2.3:a:vendor:widget:1.0:*:*:*:*:*:*:*",
                "cpe:2.3:o:os-vendor:alpha:9:*:*:*:*:*:*:*",
                "cpe:2.3:o:os-vendor:beta:10:*:*:*:*:*:*:*",
                "cpe:2.3:o:os-vendor:gamma:11:*:*:*:*:*:*:*",
            ],
        ),
    );

    let report = fixture.run(2);
    assert_eq!(report.entries, 3);
    assert_eq!(report.shards, 2);
    assert_eq!(fixture.shard(0).len(), 2);
    assert_eq!(fixture.shard(1).len(), 1, "trailing partial shard is kept");
    assert!(!fixture.shard_exists(2));
}

#[test]
fn repeated_runs_produce_identical_shards() {
    let fixture = Fixture::new();
    fixture.write_xml(
        "dump.xml",
        &advisory(
            "CNVD-2099-00011",
            "<cveNumber>CVE-2099-0011</cveNumber>",
        ),
    );
    fixture.write_nvd(
        "CVE-2099-0011",
        &enrichment(
            "HIGH",
            &[
                "cpe:2.3:a:vendor:widget:1.0:*:*:*:*:*:*:*",
                "cpe:2.3:a:vendor:widget:1.1:*:*:*:*:*:*:*",
                "cpe:2.3:o:os-vendor:os-product:9:*:*:*:*:*:*:*",
            ],
        ),
    );

    fn shard_bytes(fixture: &Fixture, output: &Path) -> Vec<u8> {
        let mut walker = Walker::new(
            NvdDirectory::new(&fixture.nvd),
            ShardWriter::new(output).capacity(40_000),
        );
        for file in discover(&fixture.cnvd).expect("discover") {
            walker.walk_file(file).expect("walk");
        }
        walker.finish().expect("finish");
        fs::read(output.join("cnvd-0000.json")).expect("read shard")
    }

    let first_dir = fixture.root.path().join("first");
    let second_dir = fixture.root.path().join("second");
    fs::create_dir_all(&first_dir).expect("dir");
    fs::create_dir_all(&second_dir).expect("dir");

    assert_eq!(
        shard_bytes(&fixture, &first_dir),
        shard_bytes(&fixture, &second_dir)
    );
}
