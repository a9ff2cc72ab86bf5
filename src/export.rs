//! Delimited output artifacts: clean directory, rejected rows, and the raw
//! URL table. One file set per run, region + run date + short run id in
//! every filename.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::quality::RejectReason;
use crate::record::{Gender, ProfileIdentifier, ProfileRecord, COLUMNS};

/// Region, run date, and a short random run identifier all output filenames
/// share.
#[derive(Debug, Clone)]
pub struct RunStamp {
    pub region: String,
    pub date: String,
    pub run_id: String,
}

impl RunStamp {
    pub fn new(region: &str) -> RunStamp {
        let now = Local::now();
        let digest = Sha256::digest(now.format("%Y%m%d%H%M%S%f").to_string().as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        RunStamp {
            region: region.to_string(),
            date: now.format("%Y-%m-%d").to_string(),
            run_id: hex[..10].to_string(),
        }
    }
}

/// Write the clean directory table (header + 21 columns per row).
pub fn write_directory(
    out_dir: &Path,
    stamp: &RunStamp,
    records: &[ProfileRecord],
) -> Result<PathBuf> {
    let path = out_dir.join(format!(
        "{}_therapist_directory_{}_{}.csv",
        stamp.region, stamp.date, stamp.run_id
    ));
    write_rows(&path, records.iter().map(|r| r.to_row()))?;
    info!(path = %path.display(), rows = records.len(), "wrote clean directory");
    Ok(path)
}

/// Write the rejected rows for manual review, one row per violated rule.
pub fn write_rejected(
    out_dir: &Path,
    stamp: &RunStamp,
    rejected: &[(RejectReason, ProfileRecord)],
) -> Result<PathBuf> {
    let path = out_dir.join(format!(
        "{}_therapist_directory_removed_{}_{}.csv",
        stamp.region, stamp.date, stamp.run_id
    ));
    write_rows(&path, rejected.iter().map(|(_, r)| r.to_row()))?;
    for (reason, r) in rejected {
        info!(url = r.url.as_str(), reason = reason.as_str(), "rejected row");
    }
    Ok(path)
}

fn write_rows(path: &Path, rows: impl Iterator<Item = Vec<String>>) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir {}", dir.display()))?;
    }
    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the discovered URL table (Gender, URL).
pub fn write_urls(
    out_dir: &Path,
    stamp: &RunStamp,
    ids: &[ProfileIdentifier],
) -> Result<PathBuf> {
    let path = out_dir.join(format!(
        "{}_therapist_urls_{}_{}.csv",
        stamp.region, stamp.date, stamp.run_id
    ));
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut wtr = Writer::from_path(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    wtr.write_record(["Gender", "URL"])?;
    for id in ids {
        wtr.write_record([id.gender.as_str(), id.url.as_str()])?;
    }
    wtr.flush()?;
    info!(path = %path.display(), urls = ids.len(), "wrote url table");
    Ok(path)
}

#[derive(Debug, Deserialize)]
struct UrlRow {
    #[serde(rename = "Gender")]
    gender: Gender,
    #[serde(rename = "URL")]
    url: String,
}

/// Read a URL table back into identifiers.
pub fn read_urls(path: &Path) -> Result<Vec<ProfileIdentifier>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to read url table {}", path.display()))?;
    let mut ids = Vec::new();
    for row in rdr.deserialize() {
        let row: UrlRow = row.context("malformed url table row")?;
        ids.push(ProfileIdentifier {
            gender: row.gender,
            url: row.url,
        });
    }
    Ok(ids)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "therapist_directory_{tag}_{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn run_stamp_is_short_hex() {
        let stamp = RunStamp::new("north-carolina");
        assert_eq!(stamp.run_id.len(), 10);
        assert!(stamp.run_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(stamp.region, "north-carolina");
    }

    #[test]
    fn url_table_round_trips() {
        let dir = scratch_dir("urls");
        let stamp = RunStamp::new("test-region");
        let ids = vec![
            ProfileIdentifier {
                gender: Gender::Female,
                url: "https://x/a".to_string(),
            },
            ProfileIdentifier {
                gender: Gender::NonBinary,
                url: "https://x/b".to_string(),
            },
        ];
        let path = write_urls(&dir, &stamp, &ids).unwrap();
        let back = read_urls(&path).unwrap();
        assert_eq!(back, ids);
    }

    #[test]
    fn directory_file_has_header_and_sentinel_rows() {
        let dir = scratch_dir("directory");
        let stamp = RunStamp::new("test-region");
        let records = vec![ProfileRecord::program_failure("https://x/a")];
        let path = write_directory(&dir, &stamp, &records).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().starts_with("therapist_url,"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("https://x/a,"));
        assert!(row.contains("program failure"));
    }
}
