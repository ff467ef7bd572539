//! Kickoff time normalization.
//!
//! This module provides:
//! - Free-text date/time parsing with a day-before-month bias
//! - Timezone hint resolution (IANA name, then UTC offset token, then UTC)
//! - Canonical (local ISO, UTC ISO with `Z`, timezone label) output
//!
//! Failures never escape `normalize_kickoff`: an unparseable value yields an
//! empty triple.

use crate::error::KickoffError;
use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Normalized kickoff: `local` keeps the wall-clock time with its offset,
/// `utc` always ends in `Z`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kickoff {
    pub local: String,
    pub utc: String,
    pub timezone: String,
}

impl Kickoff {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.utc.is_empty()
    }

    fn from_datetime(dt: DateTime<FixedOffset>, timezone: String) -> Self {
        Self {
            local: dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            utc: dt.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            timezone,
        }
    }
}

/// Kickoff as received from a collector.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKickoff {
    Text(String),
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl From<&str> for RawKickoff {
    fn from(value: &str) -> Self {
        RawKickoff::Text(value.to_string())
    }
}

impl From<String> for RawKickoff {
    fn from(value: String) -> Self {
        RawKickoff::Text(value)
    }
}

impl From<NaiveDateTime> for RawKickoff {
    fn from(value: NaiveDateTime) -> Self {
        RawKickoff::Naive(value)
    }
}

impl From<DateTime<FixedOffset>> for RawKickoff {
    fn from(value: DateTime<FixedOffset>) -> Self {
        RawKickoff::Zoned(value)
    }
}

impl From<DateTime<Utc>> for RawKickoff {
    fn from(value: DateTime<Utc>) -> Self {
        RawKickoff::Zoned(value.with_timezone(&Utc.fix()))
    }
}

/// A resolved timezone hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneSpec {
    Named(Tz),
    Fixed(FixedOffset),
}

/// Resolve a hint: IANA zone name first, then an offset token.
pub fn resolve_zone(hint: &str) -> Option<ZoneSpec> {
    let hint = hint.trim();
    if hint.is_empty() {
        return None;
    }
    if let Ok(tz) = hint.parse::<Tz>() {
        return Some(ZoneSpec::Named(tz));
    }
    parse_offset_token(hint).map(ZoneSpec::Fixed)
}

/// Parse `"UTC"`, `"GMT"`, `"Z"`, `"UTC+01:00"`, `"+09:00"`, `"+0930"`, `"-03"`.
pub fn parse_offset_token(token: &str) -> Option<FixedOffset> {
    let upper = token.trim().to_uppercase();
    if matches!(upper.as_str(), "UTC" | "GMT" | "Z") {
        return FixedOffset::east_opt(0);
    }
    let rest = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper)
        .trim();

    let sign = match rest.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits = rest[1..].replace(':', "");
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        3 => (digits[..1].parse::<i32>().ok()?, digits[1..].parse::<i32>().ok()?),
        _ => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
    };
    if hours > 14 || minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Label for a value that carried its own offset and came without a hint.
fn offset_label(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    if secs == 0 {
        return "UTC".to_string();
    }
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    format!("UTC{}{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60)
}

/// Attach a zone to a wall-clock time.
///
/// Repeated local times (DST end) take the earlier instant. Skipped local
/// times (DST start) keep the wall clock with the offset in force before the
/// transition.
fn localize(naive: NaiveDateTime, zone: ZoneSpec) -> Option<DateTime<FixedOffset>> {
    match zone {
        ZoneSpec::Fixed(offset) => offset.from_local_datetime(&naive).single(),
        ZoneSpec::Named(tz) => match tz.from_local_datetime(&naive).earliest() {
            Some(dt) => Some(dt.with_timezone(&dt.offset().fix())),
            None => {
                let before = tz
                    .offset_from_utc_datetime(&(naive - Duration::days(1)))
                    .fix();
                before.from_local_datetime(&naive).single()
            }
        },
    }
}

/// Normalize a kickoff, returning an empty triple when it cannot be parsed.
pub fn normalize_kickoff(raw: impl Into<RawKickoff>, timezone_hint: &str) -> Kickoff {
    try_normalize_kickoff(raw, timezone_hint).unwrap_or_default()
}

/// Normalize a kickoff, reporting why it could not be parsed.
pub fn try_normalize_kickoff(
    raw: impl Into<RawKickoff>,
    timezone_hint: &str,
) -> Result<Kickoff, KickoffError> {
    let hint = timezone_hint.trim();
    let parsed = match raw.into() {
        RawKickoff::Text(text) => parse_kickoff_text(&text)?,
        RawKickoff::Naive(naive) => ParsedKickoff {
            naive,
            offset: None,
        },
        RawKickoff::Zoned(dt) => ParsedKickoff {
            naive: dt.naive_local(),
            offset: Some(*dt.offset()),
        },
    };

    if let Some(offset) = parsed.offset {
        let dt = offset
            .from_local_datetime(&parsed.naive)
            .single()
            .ok_or_else(|| KickoffError::Unparseable(parsed.naive.to_string()))?;
        let label = if hint.is_empty() {
            offset_label(offset)
        } else {
            hint.to_string()
        };
        return Ok(Kickoff::from_datetime(dt, label));
    }

    let (zone, label) = match resolve_zone(hint) {
        Some(ZoneSpec::Named(tz)) => (ZoneSpec::Named(tz), tz.name().to_string()),
        Some(fixed) => (fixed, hint.to_string()),
        None => (ZoneSpec::Fixed(Utc.fix()), "UTC".to_string()),
    };
    let dt = localize(parsed.naive, zone)
        .ok_or_else(|| KickoffError::Unparseable(parsed.naive.to_string()))?;
    Ok(Kickoff::from_datetime(dt, label))
}

// ============================================================================
// Text parsing
// ============================================================================

/// Wall-clock time plus the offset written in the text, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedKickoff {
    pub naive: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

/// Offset-carrying layouts tried on the raw text.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Date layouts, day-first before month-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%m/%d/%Y",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M:%S",
    "%H:%M",
    "%I:%M %p",
    "%I:%M%p",
    "%I %p",
    "%I%p",
];

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn replace_with(
    text: String,
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
    rep: &str,
) -> String {
    match cached(cell, pattern) {
        Some(re) => re.replace_all(&text, rep).into_owned(),
        None => text,
    }
}

/// Reduce site-specific decoration to something the layout tables understand.
fn clean_text(raw: &str) -> String {
    static PARENS: OnceLock<Option<Regex>> = OnceLock::new();
    static JA_DATE: OnceLock<Option<Regex>> = OnceLock::new();
    static WEEKDAY: OnceLock<Option<Regex>> = OnceLock::new();
    static ORDINAL: OnceLock<Option<Regex>> = OnceLock::new();
    static AT: OnceLock<Option<Regex>> = OnceLock::new();
    static ABBREV_DOT: OnceLock<Option<Regex>> = OnceLock::new();
    static FR_HOUR: OnceLock<Option<Regex>> = OnceLock::new();
    static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();

    let mut text = raw.trim().replace(',', " ");
    text = replace_with(text, &PARENS, r"[(（][^)）]*[)）]", " ");

    if let Some(re) = cached(&JA_DATE, r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日") {
        text = re
            .replace_all(&text, |caps: &Captures| {
                format!("{}-{:0>2}-{:0>2}", &caps[1], &caps[2], &caps[3])
            })
            .into_owned();
    }

    text = replace_with(
        text,
        &WEEKDAY,
        r"(?i)\b(?:mon|tues?|wed|thu|thur|thurs|fri|sat|sun)(?:day|sday|nesday|rsday|urday)?\b\.?",
        " ",
    );
    text = replace_with(text, &ORDINAL, r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b", "$1");
    text = replace_with(text, &AT, r"(?i)\bat\b", " ");
    text = replace_with(text, &ABBREV_DOT, r"([A-Za-z])\.", "$1");
    text = replace_with(text, &FR_HOUR, r"\b(\d{1,2})h(\d{2})\b", "$1:$2");
    text = replace_with(text, &SEPARATOR, r"\s+[-–|@]\s+", " ");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a trailing zone token ("GMT", "UTC+1", "+09:00") off a date-time string.
///
/// Unknown abbreviations after a time ("BST", "JST") are dropped so the hint applies.
fn split_zone_suffix(text: &str) -> (String, Option<FixedOffset>) {
    static ZONE_SUFFIX: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = cached(
        &ZONE_SUFFIX,
        r"(?i)^(.*\d:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s*[ap]m)?)\s*((?:utc|gmt)?\s*[+-]\d{1,2}(?::?\d{2})?|z|[a-z]{2,5})$",
    ) else {
        return (text.to_string(), None);
    };
    let Some(caps) = re.captures(text) else {
        return (text.to_string(), None);
    };
    let head = caps[1].trim().to_string();
    let token = caps[2].trim();
    if token.eq_ignore_ascii_case("am") || token.eq_ignore_ascii_case("pm") {
        return (text.to_string(), None);
    }
    (head, parse_offset_token(token))
}

fn plausible(naive: &NaiveDateTime) -> bool {
    use chrono::Datelike;
    (1900..=2100).contains(&naive.year())
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    for date in DATE_FORMATS {
        for time in TIME_FORMATS {
            for layout in [
                format!("{} {}", date, time),
                format!("{}T{}", date, time),
                format!("{} {}", time, date),
            ] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(text, &layout) {
                    if plausible(&naive) {
                        return Some(naive);
                    }
                }
            }
        }
    }
    for date in DATE_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(text, date) {
            if let Some(naive) = day.and_hms_opt(0, 0, 0).filter(plausible) {
                return Some(naive);
            }
        }
    }
    None
}

/// Parse free text into a wall-clock time and an optional explicit offset.
pub fn parse_kickoff_text(raw: &str) -> Result<ParsedKickoff, KickoffError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(KickoffError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ParsedKickoff {
            naive: dt.naive_local(),
            offset: Some(*dt.offset()),
        });
    }
    for layout in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, layout) {
            return Ok(ParsedKickoff {
                naive: dt.naive_local(),
                offset: Some(*dt.offset()),
            });
        }
    }

    let cleaned = clean_text(trimmed);
    let (body, offset) = split_zone_suffix(&cleaned);
    parse_naive(&body)
        .map(|naive| ParsedKickoff { naive, offset })
        .ok_or_else(|| KickoffError::Unparseable(trimmed.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn wall(text: &str) -> NaiveDateTime {
        parse_kickoff_text(text).unwrap().naive
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
    }

    #[test]
    fn test_paris_winter_and_summer() {
        let winter = normalize_kickoff("2026-02-07 15:10", "Europe/Paris");
        assert_eq!(winter.local, "2026-02-07T15:10:00+01:00");
        assert_eq!(winter.utc, "2026-02-07T14:10:00Z");
        assert_eq!(winter.timezone, "Europe/Paris");

        let summer = normalize_kickoff("2026-07-04 15:10", "Europe/Paris");
        assert_eq!(summer.local, "2026-07-04T15:10:00+02:00");
        assert_eq!(summer.utc, "2026-07-04T13:10:00Z");
    }

    #[test]
    fn test_dublin_iso_without_zone() {
        let k = normalize_kickoff("2026-03-14T17:45:00", "Europe/Dublin");
        assert_eq!(k.local, "2026-03-14T17:45:00+00:00");
        assert_eq!(k.utc, "2026-03-14T17:45:00Z");
        assert_eq!(k.timezone, "Europe/Dublin");
    }

    #[test]
    fn test_offset_token_hints() {
        let k = normalize_kickoff("2026-02-07 14:30", "UTC+09:00");
        assert_eq!(k.local, "2026-02-07T14:30:00+09:00");
        assert_eq!(k.utc, "2026-02-07T05:30:00Z");
        assert_eq!(k.timezone, "UTC+09:00");

        let k = normalize_kickoff("2026-02-07 14:30", "+09:00");
        assert_eq!(k.utc, "2026-02-07T05:30:00Z");

        let k = normalize_kickoff("2026-02-07 14:30", "UTC");
        assert_eq!(k.utc, "2026-02-07T14:30:00Z");
        assert_eq!(k.timezone, "UTC");
    }

    #[test]
    fn test_unknown_hint_defaults_to_utc() {
        let k = normalize_kickoff("2026-02-07 14:30", "Mars/Olympus");
        assert_eq!(k.local, "2026-02-07T14:30:00+00:00");
        assert_eq!(k.utc, "2026-02-07T14:30:00Z");
        assert_eq!(k.timezone, "UTC");

        let k = normalize_kickoff("2026-02-07 14:30", "");
        assert_eq!(k.timezone, "UTC");
    }

    #[test]
    fn test_value_with_own_offset_ignores_hint_zone() {
        let k = normalize_kickoff("2026-02-07T15:10:00+01:00", "Asia/Tokyo");
        assert_eq!(k.local, "2026-02-07T15:10:00+01:00");
        assert_eq!(k.utc, "2026-02-07T14:10:00Z");
        assert_eq!(k.timezone, "Asia/Tokyo");

        let k = normalize_kickoff("2026-02-07T15:10:00+01:00", "");
        assert_eq!(k.timezone, "UTC+01:00");

        let k = normalize_kickoff("2026-02-07T14:10:00Z", "");
        assert_eq!(k.utc, "2026-02-07T14:10:00Z");
        assert_eq!(k.timezone, "UTC");
    }

    #[test]
    fn test_day_first_bias() {
        assert_eq!(wall("07/02/2026 15:10"), at(2026, 2, 7, 15, 10));
        assert_eq!(wall("07.02.2026 15:10"), at(2026, 2, 7, 15, 10));
        // Only month-first reading is valid
        assert_eq!(wall("02/13/2026 15:10"), at(2026, 2, 13, 15, 10));
    }

    #[test]
    fn test_free_text_layouts() {
        assert_eq!(
            wall("Saturday 7th February 2026, 15:10"),
            at(2026, 2, 7, 15, 10)
        );
        assert_eq!(wall("Sat 7 Feb 2026 3:10 PM"), at(2026, 2, 7, 15, 10));
        assert_eq!(wall("Sat. 7 Feb. 2026 at 3:10 p.m."), at(2026, 2, 7, 15, 10));
        assert_eq!(wall("7/02/2026 - 21h05"), at(2026, 2, 7, 21, 5));
        assert_eq!(wall("2026年2月7日(土) 14:30"), at(2026, 2, 7, 14, 30));
        assert_eq!(wall("15:10 7 February 2026"), at(2026, 2, 7, 15, 10));
        assert_eq!(wall("7 February 2026"), at(2026, 2, 7, 0, 0));
    }

    #[test]
    fn test_trailing_zone_tokens() {
        let parsed = parse_kickoff_text("7 Feb 2026 15:10 GMT").unwrap();
        assert_eq!(parsed.offset, FixedOffset::east_opt(0));

        let parsed = parse_kickoff_text("7 Feb 2026 15:10 UTC+1").unwrap();
        assert_eq!(parsed.offset, FixedOffset::east_opt(3600));

        // Unknown abbreviation is dropped, leaving the hint to decide
        let parsed = parse_kickoff_text("7 Feb 2026 15:10 BST").unwrap();
        assert_eq!(parsed.offset, None);
        assert_eq!(parsed.naive, at(2026, 2, 7, 15, 10));

        // A bare date must not lose its day to the offset pattern
        assert_eq!(wall("2026-03-14"), at(2026, 3, 14, 0, 0));
    }

    #[test]
    fn test_japanese_date_in_tokyo() {
        let k = normalize_kickoff("2026年2月7日(土) 14:30", "Asia/Tokyo");
        assert_eq!(k.local, "2026-02-07T14:30:00+09:00");
        assert_eq!(k.utc, "2026-02-07T05:30:00Z");
    }

    #[test]
    fn test_dst_edges() {
        // Spring forward: 02:30 does not exist in Paris
        let gap = normalize_kickoff("2026-03-29 02:30", "Europe/Paris");
        assert_eq!(gap.local, "2026-03-29T02:30:00+01:00");
        assert_eq!(gap.utc, "2026-03-29T01:30:00Z");

        // Fall back: 02:30 happens twice, take the first
        let repeated = normalize_kickoff("2026-10-25 02:30", "Europe/Paris");
        assert_eq!(repeated.local, "2026-10-25T02:30:00+02:00");
        assert_eq!(repeated.utc, "2026-10-25T00:30:00Z");
    }

    #[test]
    fn test_unparseable_yields_empty_triple() {
        let k = normalize_kickoff("TBC", "Europe/London");
        assert!(k.is_empty());
        assert_eq!(k, Kickoff::empty());
        assert!(matches!(
            try_normalize_kickoff("TBC", "Europe/London"),
            Err(KickoffError::Unparseable(_))
        ));
        assert!(matches!(
            try_normalize_kickoff("   ", "Europe/London"),
            Err(KickoffError::Empty)
        ));
    }

    #[test]
    fn test_structured_inputs() {
        let naive = at(2026, 2, 7, 15, 10);
        let k = normalize_kickoff(naive, "Europe/London");
        assert_eq!(k.utc, "2026-02-07T15:10:00Z");

        let zoned = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .from_local_datetime(&naive)
            .unwrap();
        let k = normalize_kickoff(zoned, "");
        assert_eq!(k.utc, "2026-02-07T06:10:00Z");
        assert_eq!(k.timezone, "UTC+09:00");
    }

    #[test]
    fn test_parse_offset_token() {
        assert_eq!(parse_offset_token("UTC"), FixedOffset::east_opt(0));
        assert_eq!(parse_offset_token("utc+01:00"), FixedOffset::east_opt(3600));
        assert_eq!(parse_offset_token("+09"), FixedOffset::east_opt(9 * 3600));
        assert_eq!(parse_offset_token("+0930"), FixedOffset::east_opt(9 * 3600 + 1800));
        assert_eq!(parse_offset_token("GMT-3"), FixedOffset::east_opt(-3 * 3600));
        assert_eq!(parse_offset_token("+25:00"), None);
        assert_eq!(parse_offset_token("Europe/Paris"), None);
        assert_eq!(parse_offset_token(""), None);
    }
}
