//! Pure transforms from a captured page span to a typed value. Every
//! function takes the trimmed capture and returns `None` when the span is
//! malformed — the caller maps that to the failed-scrape sentinel, never to
//! not-applicable.

/// A captured page region split on blank lines.
pub fn segments(data: &str) -> Vec<&str> {
    data.split("\n\n").collect()
}

/// First blank-line segment: the profile name.
pub fn name(data: &str) -> Option<String> {
    segments(data).first().map(|s| s.trim().to_string())
}

/// Second blank-line segment: the credentials line. Missing second segment
/// means the page header changed shape.
pub fn credentials(data: &str) -> Option<String> {
    segments(data).get(1).map(|s| s.trim().to_string())
}

/// Street + city and zipcode from the primary-location span. The span ends
/// in ` <5 digits>` by construction of the pattern; blank-line segments are
/// joined with `, ` and the trailing zip split off.
pub fn address(data: &str) -> Option<(String, String)> {
    let joined = segments(data).join(", ");
    let joined = joined.trim();
    if joined.len() < 6 || !joined.is_char_boundary(joined.len() - 5) {
        return None;
    }
    let (street_part, zip) = joined.split_at(joined.len() - 5);
    if !zip.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // Drop the separator space between street/city and zip.
    let street_city = street_part
        .strip_suffix(' ')
        .unwrap_or(street_part)
        .trim()
        .to_string();
    Some((street_city, zip.to_string()))
}

/// Availability blurb → (accepting clients, in person, online).
pub fn availability(data: &str) -> Option<(bool, bool, bool)> {
    if data.starts_with("Waitlist") || data.starts_with("Currently unable") {
        Some((false, false, false))
    } else if data.starts_with("Available both") {
        Some((true, true, true))
    } else if data.starts_with("Available online only") {
        Some((true, false, true))
    } else if data.starts_with("Available in-person") {
        Some((true, true, false))
    } else {
        None
    }
}

/// Last blank-line segment of the primary-location span. Pages without a
/// listed number put something else there, recognizable by the missing
/// leading `(` of an area code.
pub fn phone_number(data: &str) -> Option<String> {
    let last = segments(data).last()?.trim();
    if last.starts_with('(') {
        Some(last.to_string())
    } else {
        None
    }
}

/// The `Individual Sessions` fee line from the finances span, starting at
/// its dollar sign. `None` when no such line is listed.
pub fn session_cost(data: &str) -> Option<String> {
    data.lines()
        .filter(|line| line.contains('$'))
        .map(|line| line.trim().trim_start_matches('*').trim())
        .find(|line| line.starts_with("Individual Sessions"))
        .and_then(|line| line.find('$').map(|i| line[i..].trim().to_string()))
}

/// One candidate per line, trailing commas stripped (ethnicity list).
pub fn line_candidates(data: &str) -> Vec<String> {
    data.lines()
        .map(|l| l.trim().trim_end_matches(',').trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma-separated candidates with newlines flattened (faith, languages).
pub fn comma_candidates(data: &str) -> Vec<String> {
    data.replace('\n', "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Bulleted candidates: only lines starting with `*` (insurance list).
pub fn bullet_candidates(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|l| l.starts_with('*'))
        .map(|l| l.trim_start_matches('*').trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// `*`-delimited candidates (therapy-types list).
pub fn star_candidates(data: &str) -> Vec<String> {
    data.split('*')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_splits_street_and_zip() {
        let (street, zip) = address("123 Main St, Springfield 12345").unwrap();
        assert_eq!(street, "123 Main St, Springfield");
        assert_eq!(zip, "12345");
    }

    #[test]
    fn address_joins_blank_line_segments() {
        let (street, zip) = address("123 Main St\n\nSpringfield 12345").unwrap();
        assert_eq!(street, "123 Main St, Springfield");
        assert_eq!(zip, "12345");
    }

    #[test]
    fn address_rejects_short_or_digitless_spans() {
        assert_eq!(address("12345"), None);
        assert_eq!(address("no zip here"), None);
    }

    #[test]
    fn availability_prefixes() {
        assert_eq!(availability("Waitlist only"), Some((false, false, false)));
        assert_eq!(
            availability("Available both in-person and online"),
            Some((true, true, true))
        );
        assert_eq!(
            availability("Available online only"),
            Some((true, false, true))
        );
        assert_eq!(
            availability("Available in-person only"),
            Some((true, true, false))
        );
        assert_eq!(availability("Something unexpected"), None);
    }

    #[test]
    fn credentials_needs_second_segment() {
        assert_eq!(
            credentials("Jane Doe\n\nLCSW, MSW\n\nShe/Her"),
            Some("LCSW, MSW".to_string())
        );
        assert_eq!(credentials("Jane Doe"), None);
    }

    #[test]
    fn phone_requires_area_code_paren() {
        assert_eq!(
            phone_number("123 Main St\n\n(919) 555-0101"),
            Some("(919) 555-0101".to_string())
        );
        assert_eq!(phone_number("123 Main St\n\nSuite 4"), None);
    }

    #[test]
    fn session_cost_takes_individual_line() {
        let data = "* Individual Sessions $150\n* Couple Sessions $200";
        assert_eq!(session_cost(data), Some("$150".to_string()));
        assert_eq!(session_cost("* Couple Sessions $200"), None);
    }

    #[test]
    fn candidate_splitters() {
        assert_eq!(
            line_candidates("Black / African American,\nHispanic and Latino\n"),
            vec!["Black / African American", "Hispanic and Latino"]
        );
        assert_eq!(
            comma_candidates("Christian,\nJewish"),
            vec!["Christian", "Jewish"]
        );
        assert_eq!(
            bullet_candidates("Insurance accepted:\n* Aetna\n* Blue Cross"),
            vec!["Aetna", "Blue Cross"]
        );
        assert_eq!(
            star_candidates("* Cognitive Behavioral (CBT)\n* EMDR"),
            vec!["Cognitive Behavioral (CBT)", "EMDR"]
        );
    }
}
