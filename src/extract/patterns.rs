//! Field → regex registry. One pattern per output field, mirrored from the
//! directory site's rendered-text layout. Adding a field means adding a
//! variant and a pattern here plus its transform in `fields` — the scrape
//! control flow never changes.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPattern {
    Address,
    AgeGroups,
    Availability,
    Credentials,
    Description,
    Ethnicities,
    Faith,
    Insurance,
    Languages,
    Lgbtq,
    Name,
    PhoneNumber,
    SessionCost,
    TherapyTypes,
    Veteran,
}

impl FieldPattern {
    /// The raw pattern. `(?s)` lets a span cross newlines, matching the
    /// multi-line section layout of the rendered pages. Name/credentials and
    /// insurance/session-cost intentionally share a page region.
    pub fn pattern(self) -> &'static str {
        match self {
            FieldPattern::Address => r"(?s)### Primary Location\n(.*? \d{5})",
            FieldPattern::AgeGroups => {
                r"Toddler|Children \(6 to 10\)|Preteen|Teen|Adults|Elders \(65\+\)"
            }
            FieldPattern::Availability => r"(?s)Practice at a Glance\n\n(.*?)\n\n#",
            FieldPattern::Credentials | FieldPattern::Name => r"(?s)Next(.*?)#",
            FieldPattern::Description => r"(?s)Verified by Psychology Today(.*?)##",
            FieldPattern::Ethnicities => r"(?s)### Ethnicity(.*?)#",
            FieldPattern::Faith => r"(?s)Religion\n\n(.*?)\n#",
            FieldPattern::Insurance | FieldPattern::SessionCost => {
                r"(?s)## Finances(.*?)## Qualifications"
            }
            FieldPattern::Languages => r"(?s)I also speak\n\n(.*?)\n#",
            FieldPattern::Lgbtq => r"\b[Ll][Gg][Bb][Tt][Qq]\+?\b",
            FieldPattern::PhoneNumber => {
                r"(?s)### Primary Location\n\n(.*?)\n\n(Email|My web|Website|#)"
            }
            FieldPattern::TherapyTypes => r"(?s)Types of Therapy\n\n(.*?)\n\n(Ask|#)",
            FieldPattern::Veteran => r"\b[Vv]eterans?\b",
        }
    }

    fn regex(self) -> &'static Regex {
        &REGISTRY[&self]
    }
}

const ALL: [FieldPattern; 15] = [
    FieldPattern::Address,
    FieldPattern::AgeGroups,
    FieldPattern::Availability,
    FieldPattern::Credentials,
    FieldPattern::Description,
    FieldPattern::Ethnicities,
    FieldPattern::Faith,
    FieldPattern::Insurance,
    FieldPattern::Languages,
    FieldPattern::Lgbtq,
    FieldPattern::Name,
    FieldPattern::PhoneNumber,
    FieldPattern::SessionCost,
    FieldPattern::TherapyTypes,
    FieldPattern::Veteran,
];

static REGISTRY: LazyLock<HashMap<FieldPattern, Regex>> = LazyLock::new(|| {
    ALL.iter()
        .map(|f| (*f, Regex::new(f.pattern()).expect("field pattern must compile")))
        .collect()
});

/// First match of the field's pattern, trimmed capture group 1.
/// `None` means the field is absent from the page.
pub fn capture(field: FieldPattern, page_text: &str) -> Option<String> {
    field
        .regex()
        .captures(page_text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Whole-pattern presence test for the direct-match fields (LGBTQ, veteran).
pub fn is_present(field: FieldPattern, page_text: &str) -> bool {
    field.regex().is_match(page_text)
}

/// All non-overlapping matches; used only for the age-group alternation.
pub fn find_all(field: FieldPattern, page_text: &str) -> Vec<&str> {
    field
        .regex()
        .find_iter(page_text)
        .map(|m| m.as_str())
        .collect()
}

// ── Tests ──
