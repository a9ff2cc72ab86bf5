//! Profile scraper: one page of rendered text in, one `ProfileRecord` out.
//! Every field is resolved independently — a broken span fails that field
//! only, never the profile.

pub mod fields;
pub mod patterns;

use std::collections::BTreeSet;

use tracing::warn;

use crate::fuzzy::{self, MATCH_THRESHOLD};
use crate::record::{AgeGroup, Field, ProfileIdentifier, ProfileRecord};
use crate::vocab::{VocabSet, Vocabulary};
use self::patterns::FieldPattern;

/// Sink for per-profile extraction anomalies. Injected so the scrape path
/// stays testable without global logging state.
pub trait Diagnostics {
    fn extraction_failure(&self, url: &str, record: &ProfileRecord);
}

/// Production sink: structured warn-level event with the URL and every
/// non-description cell, enough to maintain the regex table by hand.
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn extraction_failure(&self, url: &str, record: &ProfileRecord) {
        let mut cells: Vec<String> = Vec::new();
        for (col, cell) in crate::record::COLUMNS.iter().zip(record.to_row()) {
            if *col == "description" || *col == "therapist_url" {
                continue;
            }
            cells.push(format!("{col}={cell}"));
        }
        warn!(url, data = cells.join(" | ").as_str(), "failed field scrape");
    }
}

/// Build a full record from one profile page's text.
pub fn extract_record(
    id: &ProfileIdentifier,
    page_text: &str,
    vocabs: &VocabSet,
    diag: &dyn Diagnostics,
) -> ProfileRecord {
    let (available, in_person, online) = availability_fields(page_text);
    let (address, zipcode) = address_fields(page_text);

    let record = ProfileRecord {
        url: id.url.clone(),
        name: simple_field(FieldPattern::Name, page_text, fields::name),
        credentials: simple_field(FieldPattern::Credentials, page_text, fields::credentials),
        gender: Field::Value(id.gender),
        description: simple_field(FieldPattern::Description, page_text, |d| {
            Some(d.to_string())
        }),
        ages_covered: age_field(page_text),
        issues_covered: issues_field(page_text, vocabs),
        therapy_types: fuzz_field(
            FieldPattern::TherapyTypes,
            page_text,
            &vocabs.therapy_types,
            fields::star_candidates,
        ),
        available,
        in_person,
        online,
        phone_number: phone_field(page_text),
        address,
        zipcode,
        insurance: fuzz_field(
            FieldPattern::Insurance,
            page_text,
            &vocabs.insurance,
            fields::bullet_candidates,
        ),
        languages_spoken: fuzz_field(
            FieldPattern::Languages,
            page_text,
            &vocabs.languages,
            fields::comma_candidates,
        ),
        session_cost: cost_field(page_text),
        ethnicities_served: fuzz_field(
            FieldPattern::Ethnicities,
            page_text,
            &vocabs.ethnicities,
            fields::line_candidates,
        ),
        faiths_served: fuzz_field(
            FieldPattern::Faith,
            page_text,
            &vocabs.faith,
            fields::comma_candidates,
        ),
        lgbtq_status: direct_match_field(FieldPattern::Lgbtq, page_text),
        veteran_status: direct_match_field(FieldPattern::Veteran, page_text),
    };

    if record.any_failed_scrape() {
        diag.extraction_failure(&id.url, &record);
    }
    record
}

/// Match-then-transform: absent pattern → not applicable, transform refusal
/// → failed scrape. The one place that mapping lives.
fn simple_field<T>(
    field: FieldPattern,
    page_text: &str,
    transform: impl Fn(&str) -> Option<T>,
) -> Field<T> {
    match patterns::capture(field, page_text) {
        None => Field::NotApplicable,
        Some(data) => match transform(&data) {
            Some(value) => Field::Value(value),
            None => Field::FailedScrape,
        },
    }
}

fn availability_fields(page_text: &str) -> (Field<bool>, Field<bool>, Field<bool>) {
    match patterns::capture(FieldPattern::Availability, page_text) {
        None => (
            Field::NotApplicable,
            Field::NotApplicable,
            Field::NotApplicable,
        ),
        Some(data) => match fields::availability(&data) {
            Some((a, p, o)) => (Field::Value(a), Field::Value(p), Field::Value(o)),
            None => (Field::FailedScrape, Field::FailedScrape, Field::FailedScrape),
        },
    }
}

fn address_fields(page_text: &str) -> (Field<String>, Field<String>) {
    match patterns::capture(FieldPattern::Address, page_text) {
        None => (Field::NotApplicable, Field::NotApplicable),
        Some(data) => match fields::address(&data) {
            Some((street_city, zip)) => (Field::Value(street_city), Field::Value(zip)),
            None => (Field::FailedScrape, Field::FailedScrape),
        },
    }
}

/// Listed phone numbers always start with a parenthesized area code; any
/// other trailing segment means the page simply has no number.
fn phone_field(page_text: &str) -> Field<String> {
    match patterns::capture(FieldPattern::PhoneNumber, page_text) {
        None => Field::NotApplicable,
        Some(data) => match fields::phone_number(&data) {
            Some(phone) => Field::Value(phone),
            None => Field::NotApplicable,
        },
    }
}

/// No `Individual Sessions` fee line is an ordinary absence, not a failure.
fn cost_field(page_text: &str) -> Field<String> {
    match patterns::capture(FieldPattern::SessionCost, page_text) {
        None => Field::NotApplicable,
        Some(data) => match fields::session_cost(&data) {
            Some(cost) => Field::Value(cost),
            None => Field::NotApplicable,
        },
    }
}

fn age_field(page_text: &str) -> Field<BTreeSet<AgeGroup>> {
    let groups: BTreeSet<AgeGroup> = patterns::find_all(FieldPattern::AgeGroups, page_text)
        .into_iter()
        .filter_map(AgeGroup::from_label)
        .collect();
    if groups.is_empty() {
        Field::NotApplicable
    } else {
        Field::Value(groups)
    }
}

fn issues_field(page_text: &str, vocabs: &VocabSet) -> Field<BTreeSet<String>> {
    let issues = vocabs.issues.scan(page_text);
    if issues.is_empty() {
        Field::NotApplicable
    } else {
        Field::Value(issues)
    }
}

fn direct_match_field(field: FieldPattern, page_text: &str) -> Field<bool> {
    if patterns::is_present(field, page_text) {
        Field::Value(true)
    } else {
        Field::NotApplicable
    }
}

fn fuzz_field(
    field: FieldPattern,
    page_text: &str,
    vocab: &Vocabulary,
    split: fn(&str) -> Vec<String>,
) -> Field<BTreeSet<String>> {
    let Some(data) = patterns::capture(field, page_text) else {
        return Field::NotApplicable;
    };
    let mut matched = BTreeSet::new();
    for candidate in split(&data) {
        if let Some(canonical) = fuzzy::best_match(&candidate, vocab.terms(), MATCH_THRESHOLD) {
            matched.insert(canonical.to_string());
        }
    }
    if matched.is_empty() {
        Field::NotApplicable
    } else {
        Field::Value(matched)
    }
}

// ── Tests ──
