//! Quality gate: split the built table into publishable rows and rejects.
//! Defects are detected post-hoc and collected rule by rule; a row violating
//! several rules shows up once per rule in the audit trail.

use std::collections::HashMap;

use tracing::info;

use crate::record::{FieldState, ProfileRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    DuplicateUrl,
    ProgramFailure,
    MissingName,
    MalformedZipcode,
    FailedScrape,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::DuplicateUrl => "duplicate url",
            RejectReason::ProgramFailure => "program failure",
            RejectReason::MissingName => "missing name",
            RejectReason::MalformedZipcode => "malformed zipcode",
            RejectReason::FailedScrape => "failed scrape",
        }
    }
}

pub struct Partitioned {
    pub clean: Vec<ProfileRecord>,
    /// Audit trail, ordered rule by rule; overlap between rules is allowed.
    pub rejected: Vec<(RejectReason, ProfileRecord)>,
}

/// Apply every gate rule to the finished table. Clean rows come out with
/// string fields whitespace-trimmed; rejected rows are untouched for review.
pub fn partition(records: &[ProfileRecord]) -> Partitioned {
    let mut url_counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        *url_counts.entry(r.url.as_str()).or_insert(0) += 1;
    }
    let is_duplicate = |r: &ProfileRecord| url_counts[r.url.as_str()] > 1;

    let rules: [(RejectReason, fn(&ProfileRecord) -> bool); 4] = [
        (RejectReason::ProgramFailure, |r| r.is_program_failure()),
        (RejectReason::MissingName, name_missing),
        (RejectReason::MalformedZipcode, zipcode_malformed),
        (RejectReason::FailedScrape, |r| r.any_failed_scrape()),
    ];

    let mut rejected: Vec<(RejectReason, ProfileRecord)> = Vec::new();
    for r in records.iter().filter(|r| is_duplicate(r)) {
        rejected.push((RejectReason::DuplicateUrl, r.clone()));
    }
    for (reason, applies) in rules {
        for r in records.iter().filter(|r| applies(r)) {
            rejected.push((reason, r.clone()));
        }
    }

    let clean: Vec<ProfileRecord> = records
        .iter()
        .filter(|r| {
            !is_duplicate(r)
                && !r.is_program_failure()
                && !name_missing(r)
                && !zipcode_malformed(r)
                && !r.any_failed_scrape()
        })
        .map(|r| {
            let mut r = r.clone();
            r.trim();
            r
        })
        .collect();

    info!(
        total = records.len(),
        clean = clean.len(),
        rejected = rejected.len(),
        "quality gate applied"
    );
    Partitioned { clean, rejected }
}

fn name_missing(r: &ProfileRecord) -> bool {
    r.name.state() == FieldState::NotApplicable
}

/// A present zipcode must be exactly five digits; absence is fine.
fn zipcode_malformed(r: &ProfileRecord) -> bool {
    match r.zipcode.value() {
        Some(zip) => {
            let zip = zip.trim();
            zip.len() != 5 || !zip.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

// ── Tests ──
