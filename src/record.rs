use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Cell sentinel for a field whose pattern found nothing on the page.
pub const NOT_APPLICABLE: &str = "N/A";
/// Cell sentinel for a pattern that matched but whose transform broke.
pub const FAILED_SCRAPE: &str = "failed scrape";
/// Cell sentinel for a page that could not be fetched at all.
pub const PROGRAM_FAILURE: &str = "program failure";

/// Column order of the directory CSV (header row).
pub const COLUMNS: [&str; 21] = [
    "therapist_url",
    "therapist_name",
    "therapist_credentials",
    "therapist_gender",
    "description",
    "ages_covered",
    "issues_covered",
    "therapy_types",
    "available",
    "in_person",
    "online",
    "phone_number",
    "address",
    "zipcode",
    "insurance",
    "languages_spoken",
    "session_cost",
    "ethnicities_served",
    "faiths_served",
    "lgbtq_status",
    "veteran_status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Gender {
    #[serde(rename = "female")]
    Female,
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "non-binary")]
    NonBinary,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::NonBinary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::NonBinary => "non-binary",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "female" => Ok(Gender::Female),
            "male" => Ok(Gender::Male),
            "non-binary" | "nonbinary" => Ok(Gender::NonBinary),
            other => Err(anyhow::anyhow!("unknown gender category: {other}")),
        }
    }
}

/// One profile URL plus the listing category it was discovered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileIdentifier {
    pub gender: Gender,
    pub url: String,
}

/// Age brackets the directory site offers as filter chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AgeGroup {
    Toddler,
    Children,
    Preteen,
    Teen,
    Adults,
    Elders,
}

impl AgeGroup {
    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Toddler => "Toddler",
            AgeGroup::Children => "Children (6 to 10)",
            AgeGroup::Preteen => "Preteen",
            AgeGroup::Teen => "Teen",
            AgeGroup::Adults => "Adults",
            AgeGroup::Elders => "Elders (65+)",
        }
    }

    pub fn from_label(s: &str) -> Option<AgeGroup> {
        match s {
            "Toddler" => Some(AgeGroup::Toddler),
            "Children (6 to 10)" => Some(AgeGroup::Children),
            "Preteen" => Some(AgeGroup::Preteen),
            "Teen" => Some(AgeGroup::Teen),
            "Adults" => Some(AgeGroup::Adults),
            "Elders (65+)" => Some(AgeGroup::Elders),
            _ => None,
        }
    }
}

/// Resolution state of a single field, without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Value,
    NotApplicable,
    FailedScrape,
    ProgramFailure,
}

/// One field of a profile record. Exactly one of: a concrete value, absent
/// from the page, pattern matched but transform broke, or whole-page fetch
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Value(T),
    NotApplicable,
    FailedScrape,
    ProgramFailure,
}

impl<T> Field<T> {
    pub fn state(&self) -> FieldState {
        match self {
            Field::Value(_) => FieldState::Value,
            Field::NotApplicable => FieldState::NotApplicable,
            Field::FailedScrape => FieldState::FailedScrape,
            Field::ProgramFailure => FieldState::ProgramFailure,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: ToCell> Field<T> {
    /// Render as a CSV cell.
    pub fn cell(&self) -> String {
        match self {
            Field::Value(v) => v.to_cell(),
            Field::NotApplicable => NOT_APPLICABLE.to_string(),
            Field::FailedScrape => FAILED_SCRAPE.to_string(),
            Field::ProgramFailure => PROGRAM_FAILURE.to_string(),
        }
    }
}

pub trait ToCell {
    fn to_cell(&self) -> String;
}

impl ToCell for String {
    fn to_cell(&self) -> String {
        self.clone()
    }
}

impl ToCell for bool {
    fn to_cell(&self) -> String {
        if *self { "Y" } else { "N" }.to_string()
    }
}

impl ToCell for Gender {
    fn to_cell(&self) -> String {
        self.as_str().to_string()
    }
}

impl ToCell for BTreeSet<String> {
    fn to_cell(&self) -> String {
        self.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

impl ToCell for BTreeSet<AgeGroup> {
    fn to_cell(&self) -> String {
        self.iter().map(|a| a.label()).collect::<Vec<_>>().join(", ")
    }
}

/// One row of the directory table: every scraped attribute of one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub url: String,
    pub name: Field<String>,
    pub credentials: Field<String>,
    pub gender: Field<Gender>,
    pub description: Field<String>,
    pub ages_covered: Field<BTreeSet<AgeGroup>>,
    pub issues_covered: Field<BTreeSet<String>>,
    pub therapy_types: Field<BTreeSet<String>>,
    pub available: Field<bool>,
    pub in_person: Field<bool>,
    pub online: Field<bool>,
    pub phone_number: Field<String>,
    pub address: Field<String>,
    pub zipcode: Field<String>,
    pub insurance: Field<BTreeSet<String>>,
    pub languages_spoken: Field<BTreeSet<String>>,
    pub session_cost: Field<String>,
    pub ethnicities_served: Field<BTreeSet<String>>,
    pub faiths_served: Field<BTreeSet<String>>,
    pub lgbtq_status: Field<bool>,
    pub veteran_status: Field<bool>,
}

impl ProfileRecord {
    /// Row written when the page itself could not be fetched. Distinct from
    /// per-field failures so the retry pass and the quality gate can tell
    /// them apart.
    pub fn program_failure(url: &str) -> ProfileRecord {
        ProfileRecord {
            url: url.to_string(),
            name: Field::ProgramFailure,
            credentials: Field::ProgramFailure,
            gender: Field::ProgramFailure,
            description: Field::ProgramFailure,
            ages_covered: Field::ProgramFailure,
            issues_covered: Field::ProgramFailure,
            therapy_types: Field::ProgramFailure,
            available: Field::ProgramFailure,
            in_person: Field::ProgramFailure,
            online: Field::ProgramFailure,
            phone_number: Field::ProgramFailure,
            address: Field::ProgramFailure,
            zipcode: Field::ProgramFailure,
            insurance: Field::ProgramFailure,
            languages_spoken: Field::ProgramFailure,
            session_cost: Field::ProgramFailure,
            ethnicities_served: Field::ProgramFailure,
            faiths_served: Field::ProgramFailure,
            lgbtq_status: Field::ProgramFailure,
            veteran_status: Field::ProgramFailure,
        }
    }

    /// Field states in column order, url excluded (always concrete).
    pub fn states(&self) -> [FieldState; 20] {
        [
            self.name.state(),
            self.credentials.state(),
            self.gender.state(),
            self.description.state(),
            self.ages_covered.state(),
            self.issues_covered.state(),
            self.therapy_types.state(),
            self.available.state(),
            self.in_person.state(),
            self.online.state(),
            self.phone_number.state(),
            self.address.state(),
            self.zipcode.state(),
            self.insurance.state(),
            self.languages_spoken.state(),
            self.session_cost.state(),
            self.ethnicities_served.state(),
            self.faiths_served.state(),
            self.lgbtq_status.state(),
            self.veteran_status.state(),
        ]
    }

    pub fn is_program_failure(&self) -> bool {
        self.states().iter().all(|s| *s == FieldState::ProgramFailure)
    }

    pub fn any_failed_scrape(&self) -> bool {
        self.states().iter().any(|s| *s == FieldState::FailedScrape)
    }

    /// CSV cells in column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.url.clone(),
            self.name.cell(),
            self.credentials.cell(),
            self.gender.cell(),
            self.description.cell(),
            self.ages_covered.cell(),
            self.issues_covered.cell(),
            self.therapy_types.cell(),
            self.available.cell(),
            self.in_person.cell(),
            self.online.cell(),
            self.phone_number.cell(),
            self.address.cell(),
            self.zipcode.cell(),
            self.insurance.cell(),
            self.languages_spoken.cell(),
            self.session_cost.cell(),
            self.ethnicities_served.cell(),
            self.faiths_served.cell(),
            self.lgbtq_status.cell(),
            self.veteran_status.cell(),
        ]
    }

    /// Collapse empty values into the not-applicable sentinel so downstream
    /// consumers see a single "nothing here" marker.
    pub fn normalize(&mut self) {
        for f in [
            &mut self.name,
            &mut self.credentials,
            &mut self.description,
            &mut self.phone_number,
            &mut self.address,
            &mut self.zipcode,
            &mut self.session_cost,
        ] {
            if matches!(f, Field::Value(v) if v.trim().is_empty()) {
                *f = Field::NotApplicable;
            }
        }
        for f in [
            &mut self.issues_covered,
            &mut self.therapy_types,
            &mut self.insurance,
            &mut self.languages_spoken,
            &mut self.ethnicities_served,
            &mut self.faiths_served,
        ] {
            if matches!(f, Field::Value(set) if set.is_empty()) {
                *f = Field::NotApplicable;
            }
        }
        if matches!(&self.ages_covered, Field::Value(set) if set.is_empty()) {
            self.ages_covered = Field::NotApplicable;
        }
    }

    /// Strip leading/trailing whitespace from every string-valued field.
    pub fn trim(&mut self) {
        self.url = self.url.trim().to_string();
        for f in [
            &mut self.name,
            &mut self.credentials,
            &mut self.description,
            &mut self.phone_number,
            &mut self.address,
            &mut self.zipcode,
            &mut self.session_cost,
        ] {
            if let Field::Value(v) = f {
                *v = v.trim().to_string();
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_failure_marks_every_field() {
        let r = ProfileRecord::program_failure("https://example.com/p/1");
        assert!(r.is_program_failure());
        assert!(!r.any_failed_scrape());
        let row = r.to_row();
        assert_eq!(row.len(), COLUMNS.len());
        assert!(row[1..].iter().all(|c| c == PROGRAM_FAILURE));
        assert_eq!(row[0], "https://example.com/p/1");
    }

    #[test]
    fn normalize_collapses_empties() {
        let mut r = ProfileRecord::program_failure("u");
        r.name = Field::Value("   ".to_string());
        r.insurance = Field::Value(BTreeSet::new());
        r.normalize();
        assert_eq!(r.name, Field::NotApplicable);
        assert_eq!(r.insurance, Field::NotApplicable);
    }

    #[test]
    fn cells_render_sentinels_and_sets() {
        let mut set = BTreeSet::new();
        set.insert("Aetna".to_string());
        set.insert("Cigna".to_string());
        let f: Field<BTreeSet<String>> = Field::Value(set);
        assert_eq!(f.cell(), "Aetna, Cigna");
        assert_eq!(Field::<String>::NotApplicable.cell(), "N/A");
        assert_eq!(Field::<String>::FailedScrape.cell(), "failed scrape");
        assert_eq!(Field::<bool>::Value(true).cell(), "Y");
    }

    #[test]
    fn gender_round_trip() {
        for g in Gender::ALL {
            assert_eq!(g.as_str().parse::<Gender>().unwrap(), g);
        }
        assert!("other".parse::<Gender>().is_err());
    }
}
