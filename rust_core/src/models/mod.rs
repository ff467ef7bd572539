// Shared record types for the team catalog, competition catalog and match files
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Team catalog
// ============================================================================

/// One entry of the team master file, keyed by `id`.
///
/// Fields this crate does not model are kept in `extra` so a rewrite never
/// drops data added by other tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub competition_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name_ja: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub short_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub country: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub division: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub logo_url: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub badge_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TeamRecord {
    /// Freshly minted record: everything but id/competition/name left empty.
    pub fn new(id: &str, competition_id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            competition_id: competition_id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_logo(mut self, logo: &LogoInfo) -> Self {
        self.logo_url = logo.logo_url.clone();
        self.badge_url = logo.badge_url.clone();
        self
    }
}

/// Logo pair for a team. An empty `badge_url` falls back to `logo_url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoInfo {
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub badge_url: String,
}

impl LogoInfo {
    pub fn new(logo_url: &str, badge_url: &str) -> Self {
        let badge_url = if badge_url.is_empty() { logo_url } else { badge_url };
        Self {
            logo_url: logo_url.to_string(),
            badge_url: badge_url.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.logo_url.is_empty() && self.badge_url.is_empty()
    }
}

// ============================================================================
// Competition catalog
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// Aggregates derived from the competition's match files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSummary {
    #[serde(default)]
    pub match_count: usize,
    #[serde(default)]
    pub seasons: Vec<String>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitionRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    /// "international" or "club"
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub timezone_default: String,
    #[serde(default)]
    pub official_sites: Vec<String>,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub data_summary: DataSummary,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Matches
// ============================================================================

/// Raw fixture as handed over by a source collector. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    #[serde(default, deserialize_with = "string_or_number")]
    pub home_team: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub away_team: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub kickoff: String,
    #[serde(default, alias = "timezone", deserialize_with = "string_or_number")]
    pub timezone_hint: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub venue: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub competition_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub season: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub round: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub match_url: String,
    #[serde(default, deserialize_with = "broadcaster_list")]
    pub broadcasters: Vec<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: String,
}

/// Fully reconciled fixture as written to a match file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub match_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub competition_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub season: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub round: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: String,
    #[serde(default, alias = "kickoff", deserialize_with = "string_or_number")]
    pub kickoff_local: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub kickoff_utc: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub timezone: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub venue: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub home_team: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub home_team_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub away_team: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub away_team_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub match_url: String,
    #[serde(default, deserialize_with = "broadcaster_list")]
    pub broadcasters: Vec<String>,
}

/// Collectors emit numbers for season/round and `null` for unknown fields;
/// older match files carry `null` kickoffs.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Broadcasters arrive as a list or as one "A, B / C" string.
fn broadcaster_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let split = |s: &str| -> Vec<String> {
        s.split([',', '/'])
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect()
    };
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => split(&s),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                _ => None,
            })
            .filter(|b| !b.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_record_keeps_unknown_fields() {
        let json = r#"{
            "id": "premier_1",
            "competition_id": "premier",
            "name": "Bath",
            "founded": 1865,
            "stadium": {"name": "The Rec"}
        }"#;
        let record: TeamRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Bath");
        assert_eq!(record.short_name, "");
        assert_eq!(record.extra["founded"], 1865);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["stadium"]["name"], "The Rec");
        assert_eq!(back["logo_url"], "");
    }

    #[test]
    fn test_raw_match_tolerates_loose_input() {
        let json = r#"{
            "home_team": "Bath",
            "away_team": null,
            "season": 2026,
            "round": 5,
            "timezone": "Europe/London",
            "broadcasters": "TNT Sports, ITV / Premiership Rugby TV"
        }"#;
        let raw: RawMatch = serde_json::from_str(json).unwrap();
        assert_eq!(raw.away_team, "");
        assert_eq!(raw.season, "2026");
        assert_eq!(raw.round, "5");
        assert_eq!(raw.timezone_hint, "Europe/London");
        assert_eq!(
            raw.broadcasters,
            vec!["TNT Sports", "ITV", "Premiership Rugby TV"]
        );
    }

    #[test]
    fn test_match_record_reads_legacy_kickoff_field() {
        let json = r#"{"match_id": "m6n-2026-rd1-1", "kickoff": "2026-02-07T15:10:00+01:00", "broadcasters": ["BBC", ""]}"#;
        let record: MatchRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kickoff_local, "2026-02-07T15:10:00+01:00");
        assert_eq!(record.broadcasters, vec!["BBC"]);
    }

    #[test]
    fn test_match_record_accepts_null_fields() {
        let json = r#"{
            "match_id": "premier-2026-1",
            "competition_id": "premier",
            "season": 2026,
            "kickoff_local": null,
            "kickoff_utc": null,
            "timezone": null,
            "home_team": "Bath",
            "home_team_id": null,
            "away_team": "Saracens",
            "broadcasters": null
        }"#;
        let record: MatchRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kickoff_utc, "");
        assert_eq!(record.kickoff_local, "");
        assert_eq!(record.home_team_id, "");
        assert_eq!(record.season, "2026");
        assert!(record.broadcasters.is_empty());

        let team: TeamRecord =
            serde_json::from_str(r#"{"id": "premier_1", "name": "Bath", "logo_url": null}"#)
                .unwrap();
        assert_eq!(team.logo_url, "");
    }

    #[test]
    fn test_logo_info_badge_fallback() {
        let logo = LogoInfo::new("https://example.com/bath.png", "");
        assert_eq!(logo.badge_url, "https://example.com/bath.png");
        assert!(LogoInfo::default().is_empty());
    }
}
