//! Cleanup helpers for the facility-directory export, which arrives with
//! BOMs, stray whitespace, and inconsistent VISN spellings.

/// Strip BOM and zero-width characters, then collapse whitespace runs.
pub(crate) fn collapse_whitespace(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased, whitespace-collapsed form used for lookups.
pub(crate) fn normalize_label(value: &str) -> String {
    collapse_whitespace(value).to_ascii_lowercase()
}

/// Canonical VISN id from the directory's assorted spellings. "VISN 7",
/// "visn-7", "V07", and bare "7" all map to "visn-07". VISNs are numbered
/// 1 through 23; anything else is treated as missing.
pub(crate) fn normalize_visn(value: &str) -> Option<String> {
    let lowered = normalize_label(value);
    let digits: String = lowered.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let number: u32 = digits.parse().ok()?;
    if number == 0 || number > 23 {
        return None;
    }
    Some(format!("visn-{number:02}"))
}

/// Canonical station id, lowercased and prefixed: "528A5" becomes
/// "sta-528a5". Blank input yields `None`.
pub(crate) fn normalize_station_id(value: &str) -> Option<String> {
    let cleaned = normalize_label(value).replace(' ', "");
    if cleaned.is_empty() {
        None
    } else {
        Some(format!("sta-{cleaned}"))
    }
}

/// Split the semicolon-delimited issue list, dropping blanks and duplicates.
pub(crate) fn split_issue_tags(value: &str) -> Vec<String> {
    let mut tags: Vec<String> = value
        .split(';')
        .map(collapse_whitespace)
        .filter(|tag| !tag.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
