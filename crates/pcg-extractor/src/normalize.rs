//! Company name normalization
//!
//! Conservative cleanup of a matched span before it is handed to entity
//! resolution. Only trailing punctuation and a short list of legal-entity
//! suffixes are removed; abbreviation expansion and fuzzy matching belong to
//! the resolver.

/// Legal-entity suffixes stripped from the end of a name (case-insensitive)
pub const LEGAL_SUFFIXES: [&str; 5] = ["inc", "corp", "llc", "ltd", "co"];

const TRAILING_PUNCTUATION: [char; 3] = [',', ';', '.'];

/// Clean a raw company span.
///
/// Strips trailing `,` `;` `.` and a whitespace-separated trailing suffix
/// from [`LEGAL_SUFFIXES`] (optionally followed by periods), repeating until
/// the name is stable so "Acme, Inc." becomes "Acme". Longer forms such as
/// "Corporation" are kept verbatim.
pub fn clean_company_name(raw: &str) -> String {
    let mut name = raw.trim();
    loop {
        let before = name;
        name = name.trim_end_matches(TRAILING_PUNCTUATION).trim_end();
        name = strip_legal_suffix(name).trim_end();
        if name == before {
            break;
        }
    }
    name.to_string()
}

/// Remove one trailing legal suffix, if present
fn strip_legal_suffix(name: &str) -> &str {
    let without_dots = name.trim_end_matches('.');
    match without_dots.rsplit_once(char::is_whitespace) {
        Some((head, last)) if is_legal_suffix(last) => head,
        _ => name,
    }
}

/// Whether a single token is one of the stripped legal suffixes
pub fn is_legal_suffix(token: &str) -> bool {
    LEGAL_SUFFIXES
        .iter()
        .any(|suffix| token.eq_ignore_ascii_case(suffix))
}

/// Case-insensitive comparison key for deduplicating cleaned names
pub fn name_key(name: &str) -> String {
    clean_company_name(name).to_lowercase()
}
