//! Name key helpers shared by the normalizer, resolver and duplicate analyzer.

use unicode_normalization::UnicodeNormalization;

/// Drop everything that is neither a word character nor whitespace.
fn strip_punctuation(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Collapse runs of whitespace to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used for alias table lookups: NFKC, whitespace-collapsed, case-folded,
/// punctuation-stripped.
///
/// "Lyon O.U." and "lyon ou" share a key; full-width and half-width forms of
/// Japanese names share a key.
pub fn alias_key(value: &str) -> String {
    let folded: String = value.nfkc().collect::<String>().to_lowercase();
    let folded = collapse_whitespace(&folded);
    collapse_whitespace(&strip_punctuation(&folded))
}

/// Grouping key for duplicate detection: upper-cased, whitespace-collapsed,
/// punctuation-stripped.
pub fn duplicate_key(name: &str) -> String {
    let upper = collapse_whitespace(&name.to_uppercase());
    collapse_whitespace(&strip_punctuation(&upper))
}

/// NFKC width normalization (full-width digits/latin -> ASCII, half-width kana -> full-width).
pub fn nfkc_trim(value: &str) -> String {
    value.nfkc().collect::<String>().trim().to_string()
}

/// Case-insensitive equality that also works outside ASCII.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// True when `affix` could be sponsor text: non-empty ASCII letters, digits and spaces only.
pub fn is_sponsor_affix(affix: &str) -> bool {
    let affix = affix.trim();
    !affix.is_empty()
        && affix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
}

/// If `name` is `"<base> <suffix>"` (case-insensitive on base), return the suffix.
pub fn strip_base_prefix<'a>(name: &'a str, base: &str) -> Option<&'a str> {
    let head = name.get(..base.len())?;
    let rest = name.get(base.len()..)?;
    if eq_ignore_case(head, base) && rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// If `name` is `"<prefix> <base>"` (case-insensitive on base), return the prefix.
pub fn strip_base_suffix<'a>(name: &'a str, base: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(base.len())?;
    let head = name.get(..split)?;
    let tail = name.get(split..)?;
    if eq_ignore_case(tail, base) && head.ends_with(char::is_whitespace) {
        Some(head.trim())
    } else {
        None
    }
}

/// Sort key ordering ids like `premier_2` before `premier_10`.
pub fn natural_id_key(id: &str) -> (String, u64) {
    id.rsplit_once('_')
        .and_then(|(prefix, n)| n.parse::<u64>().ok().map(|n| (prefix.to_string(), n)))
        .unwrap_or_else(|| (id.to_string(), 0))
}
