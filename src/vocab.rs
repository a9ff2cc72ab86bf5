//! Controlled vocabularies: one newline-delimited file per fuzzy-matched
//! field under `reference_data/`. Loaded once per run and read-only after
//! that. File order is preserved (deduplicated) because fuzzy tie-breaking
//! keeps the first entry.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub name: String,
    terms: Vec<String>,
}

impl Vocabulary {
    pub fn load(path: &Path) -> Result<Vocabulary> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("vocabulary")
            .to_string();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read vocabulary file {}", path.display()))?;
        Ok(Vocabulary::from_terms(&name, raw.lines()))
    }

    pub fn from_terms<'a>(name: &str, terms: impl IntoIterator<Item = &'a str>) -> Vocabulary {
        let mut seen = HashSet::new();
        let terms = terms
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.to_string()))
            .map(str::to_string)
            .collect();
        Vocabulary {
            name: name.to_string(),
            terms,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Presence scan for issue terms. Issues can show up in several unrelated
/// page sections, so each vocabulary term is tested as its own word-bounded
/// regex against the full page text instead of extracting one span.
#[derive(Debug)]
pub struct IssueScanner {
    patterns: Vec<(String, Regex)>,
}

impl IssueScanner {
    pub fn new(vocab: &Vocabulary) -> Result<IssueScanner> {
        let mut patterns = Vec::with_capacity(vocab.terms().len());
        for term in vocab.terms() {
            // \b is only a boundary next to a word character, so terms that
            // start or end with punctuation (e.g. "(OCD)") skip that anchor.
            let left = if term.starts_with(|c: char| c.is_alphanumeric()) {
                r"\b"
            } else {
                ""
            };
            let right = if term.ends_with(|c: char| c.is_alphanumeric()) {
                r"\b"
            } else {
                ""
            };
            let re = Regex::new(&format!("{left}{}{right}", regex::escape(term)))
                .with_context(|| format!("bad issue term pattern for {term:?}"))?;
            patterns.push((term.clone(), re));
        }
        Ok(IssueScanner { patterns })
    }

    pub fn scan(&self, page_text: &str) -> BTreeSet<String> {
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(page_text))
            .map(|(term, _)| term.clone())
            .collect()
    }
}

/// All vocabularies one run needs, loaded from a reference directory.
#[derive(Debug)]
pub struct VocabSet {
    pub ethnicities: Vocabulary,
    pub faith: Vocabulary,
    pub insurance: Vocabulary,
    pub languages: Vocabulary,
    pub therapy_types: Vocabulary,
    pub issues: IssueScanner,
}

impl VocabSet {
    pub fn load(dir: &Path) -> Result<VocabSet> {
        let load = |file: &str| Vocabulary::load(&dir.join(file));
        Ok(VocabSet {
            ethnicities: load("ethnicities.txt")?,
            faith: load("faith.txt")?,
            insurance: load("insurance.txt")?,
            languages: load("languages.txt")?,
            therapy_types: load("therapy_types.txt")?,
            issues: IssueScanner::new(&load("issues.txt")?)?,
        })
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_first_seen_order() {
        let v = Vocabulary::from_terms("t", ["Aetna", "Cigna", "Aetna", "", "  Cigna  "]);
        assert_eq!(v.terms(), ["Aetna", "Cigna"]);
    }

    #[test]
    fn issue_scan_is_word_bounded() {
        let v = Vocabulary::from_terms("issues", ["Anxiety", "ADHD", "Grief"]);
        let scanner = IssueScanner::new(&v).unwrap();
        let found = scanner.scan("Treats Anxiety and ADHD. Griefs is not a word here.");
        assert!(found.contains("Anxiety"));
        assert!(found.contains("ADHD"));
        assert!(!found.contains("Grief"));
    }

    #[test]
    fn punctuation_edged_terms_still_match() {
        let v = Vocabulary::from_terms("issues", ["Obsessive-Compulsive (OCD)"]);
        let scanner = IssueScanner::new(&v).unwrap();
        let found = scanner.scan("Specialties: Obsessive-Compulsive (OCD), sleep issues.");
        assert!(found.contains("Obsessive-Compulsive (OCD)"));
    }
}
