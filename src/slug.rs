//! Profile name derivation.

/// Normalizes free text into a lowercase, hyphen-separated name safe for use in config section
/// headers and file names.
///
/// Non-ASCII text is transliterated first (`é` becomes `e`, `Прод` becomes `prod`), then ASCII
/// letters and digits are kept and every run of anything else becomes a single `-`. Leading and
/// trailing hyphens are dropped. Applying it twice gives the same result as applying it once.
///
/// Characters with no transliteration are separators, so the result can be empty.
pub fn slug(s: &str) -> String {
    let ascii = deunicode::deunicode(s);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;

    for c in ascii.chars() {
        if !c.is_ascii_alphanumeric() {
            pending_hyphen = true;
            continue;
        }
        if pending_hyphen && !out.is_empty() {
            out.push('-');
        }
        pending_hyphen = false;
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Slug of the profile for `role_name` within `account_name`.
pub fn profile_name(account_name: &str, role_name: &str) -> String {
    slug(&format!("{account_name}-{role_name}"))
}
