//! Substring-style fuzzy similarity for mapping page text onto the
//! controlled vocabularies. Scores on a 0-100 scale; the shorter string is
//! slid over every same-length window of the longer one and the best window
//! similarity wins. Fixed-width windows are an approximation of a
//! matching-block partial ratio: an insertion or deletion shifts the rest of
//! the window and is charged on every shifted position, so such near-misses
//! score lower here than a block-aligned matcher would rate them. Exact
//! substrings and substitutions are scored identically.

/// Similarity cutoff used for all vocabulary matching.
pub const MATCH_THRESHOLD: f64 = 85.0;

/// Best-window similarity between two strings, 0–100.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a_chars.len() <= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };

    if shorter.is_empty() {
        return if longer.is_empty() { 100.0 } else { 0.0 };
    }

    let window = shorter.len();
    let mut best = 0.0f64;
    for start in 0..=(longer.len() - window) {
        let distance = levenshtein(shorter, &longer[start..start + window]);
        let score = (1.0 - distance as f64 / window as f64) * 100.0;
        if score > best {
            best = score;
        }
        if best == 100.0 {
            break;
        }
    }
    best
}

/// Map a candidate string to the highest-scoring vocabulary term at or above
/// `threshold`, or drop it. Ties keep the earlier term, so the result is
/// deterministic for a fixed vocabulary order.
pub fn best_match<'a>(candidate: &str, terms: &'a [String], threshold: f64) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for term in terms {
        let score = partial_ratio(candidate, term);
        if score < threshold {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((term, score)),
        }
    }
    best.map(|(term, _)| term)
}

fn levenshtein(s1: &[char], s2: &[char]) -> usize {
    let (len1, len2) = (s1.len(), s2.len());
    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut prev: Vec<usize> = (0..=len2).collect();
    let mut curr = vec![0usize; len2 + 1];

    for i in 1..=len1 {
        curr[0] = i;
        for j in 1..=len2 {
            let cost = usize::from(s1[i - 1] != s2[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[len2]
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn exact_substring_scores_100() {
        assert_eq!(partial_ratio("LGBT", "LGBTQ+"), 100.0);
        assert_eq!(partial_ratio("Aetna", "Aetna"), 100.0);
    }

    #[test]
    fn unrelated_strings_score_low() {
        assert!(partial_ratio("xyz", "LGBTQ+") < MATCH_THRESHOLD);
    }

    #[test]
    fn empty_candidate() {
        assert_eq!(partial_ratio("", "anything"), 0.0);
        assert_eq!(partial_ratio("", ""), 100.0);
    }

    #[test]
    fn lgbt_maps_to_canonical_entry() {
        let v = vocab(&["LGBTQ+"]);
        assert_eq!(best_match("LGBT", &v, MATCH_THRESHOLD), Some("LGBTQ+"));
        assert_eq!(best_match("xyz", &v, MATCH_THRESHOLD), None);
    }

    #[test]
    fn ties_keep_first_vocabulary_entry() {
        // Both entries contain the candidate verbatim, so both score 100.
        let v = vocab(&["Cognitive Behavioral (CBT)", "Trauma-Focused CBT"]);
        assert_eq!(
            best_match("CBT", &v, MATCH_THRESHOLD),
            Some("Cognitive Behavioral (CBT)")
        );
    }

    #[test]
    fn truncated_candidate_still_matches() {
        let v = vocab(&["Christian"]);
        assert_eq!(best_match("Christia", &v, MATCH_THRESHOLD), Some("Christian"));
    }

    #[test]
    fn doubled_character_scores_below_the_cutoff() {
        // An insertion misaligns every later window position, so this
        // near-miss lands at 80, under the 85 cutoff.
        let score = partial_ratio("Blue Crross", "Blue Cross");
        assert!((75.0..MATCH_THRESHOLD).contains(&score));
        let v = vocab(&["Blue Cross"]);
        assert_eq!(best_match("Blue Crross", &v, MATCH_THRESHOLD), None);
    }

    #[test]
    fn one_substitution_in_five_chars_misses_threshold() {
        // 4/5 window similarity is 80, below the 85 cutoff.
        let v = vocab(&["Hindi"]);
        assert_eq!(best_match("Hindu", &v, MATCH_THRESHOLD), None);
    }
}
