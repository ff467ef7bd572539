//! Match identifier assignment.
//!
//! This module provides:
//! - Content-hash ids, computable per record
//! - Sequence ids, numbered per (competition, season, round) bucket by kickoff
//! - Round number extraction from free-text round labels
//!
//! Both schemes are pure functions over records. A competition picks one via
//! `MatchIdStrategy`; a record without competition or season gets an empty id
//! and is still kept.

use crate::models::MatchRecord;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Which match id scheme a source uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchIdStrategy {
    /// `{competition}-{season}[-rd{round}]-{n}`, renumbered on every run
    #[default]
    Sequence,
    /// sha1 of competition/kickoff/home/away, stable per record
    ContentHash,
}

impl MatchIdStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchIdStrategy::Sequence => "sequence",
            MatchIdStrategy::ContentHash => "content_hash",
        }
    }
}

impl fmt::Display for MatchIdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchIdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sequence" | "seq" => Ok(MatchIdStrategy::Sequence),
            "content_hash" | "hash" => Ok(MatchIdStrategy::ContentHash),
            other => Err(format!("unknown match id strategy: {}", other)),
        }
    }
}

/// First run of digits in a round label ("Round 5" -> "5"); empty when there is none.
pub fn extract_round_number(round: &str) -> String {
    round
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect()
}

/// First 10 hex chars of sha1("{competition}|{kickoff_utc}|{home}|{away}").
pub fn content_digest(
    competition_id: &str,
    kickoff_utc: &str,
    home: &str,
    away: &str,
) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{}|{}|{}|{}", competition_id, kickoff_utc, home, away).as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..10].to_string()
}

/// Human-readable content-hash id, e.g. `m6n-2026-02-07t14:10:00z-france-ireland-3f1c0a9b2d`.
///
/// Kickoff and team names are lowercased but otherwise kept verbatim, so ids
/// already stored in match files stay reproducible.
pub fn content_hash_match_id(record: &MatchRecord) -> String {
    if record.competition_id.is_empty() || record.season.is_empty() {
        return String::new();
    }
    let digest = content_digest(
        &record.competition_id,
        &record.kickoff_utc,
        &record.home_team,
        &record.away_team,
    );
    format!(
        "{}-{}-{}-{}-{}",
        record.competition_id,
        record.kickoff_utc.to_lowercase(),
        record.home_team.to_lowercase(),
        record.away_team.to_lowercase(),
        digest
    )
}

/// `{competition}-{season}[-rd{round}]-{sequence}`; empty without competition or season.
pub fn sequence_match_id(
    competition_id: &str,
    season: &str,
    round: &str,
    sequence: usize,
) -> String {
    if competition_id.is_empty() || season.is_empty() {
        return String::new();
    }
    let mut parts = vec![competition_id.to_string(), season.to_string()];
    if !round.is_empty() {
        parts.push(format!("rd{}", round));
    }
    parts.push(sequence.to_string());
    parts.join("-")
}

/// Number every match within its (competition, season, round) bucket by kickoff.
///
/// Needs the whole batch. Ties on `kickoff_utc` keep input order. The result
/// is sorted by `kickoff_utc`.
pub fn assign_sequence_ids(mut matches: Vec<MatchRecord>) -> Vec<MatchRecord> {
    matches.sort_by(|a, b| a.kickoff_utc.cmp(&b.kickoff_utc));

    let mut counters: HashMap<(String, String, String), usize> = HashMap::new();
    for record in matches.iter_mut() {
        let key = (
            record.competition_id.clone(),
            record.season.clone(),
            record.round.clone(),
        );
        let seq = counters.entry(key).or_insert(0);
        *seq += 1;
        record.match_id =
            sequence_match_id(&record.competition_id, &record.season, &record.round, *seq);
    }
    matches
}

pub fn assign_content_hash_ids(mut matches: Vec<MatchRecord>) -> Vec<MatchRecord> {
    for record in matches.iter_mut() {
        record.match_id = content_hash_match_id(record);
    }
    matches
}

pub fn assign_match_ids(matches: Vec<MatchRecord>, strategy: MatchIdStrategy) -> Vec<MatchRecord> {
    match strategy {
        MatchIdStrategy::Sequence => assign_sequence_ids(matches),
        MatchIdStrategy::ContentHash => assign_content_hash_ids(matches),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(
        comp: &str,
        season: &str,
        round: &str,
        kickoff_utc: &str,
        home: &str,
    ) -> MatchRecord {
        MatchRecord {
            competition_id: comp.to_string(),
            season: season.to_string(),
            round: round.to_string(),
            kickoff_utc: kickoff_utc.to_string(),
            home_team: home.to_string(),
            away_team: "Opponent".to_string(),
            ..Default::default()
        }
    }

    fn ids_by_home(matches: &[MatchRecord]) -> Vec<(String, String)> {
        let mut ids: Vec<(String, String)> = matches
            .iter()
            .map(|m| (m.home_team.clone(), m.match_id.clone()))
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_extract_round_number() {
        assert_eq!(extract_round_number("Round 5"), "5");
        assert_eq!(extract_round_number("Rd 12 (rescheduled 13)"), "12");
        assert_eq!(extract_round_number("7"), "7");
        assert_eq!(extract_round_number("Final"), "");
        assert_eq!(extract_round_number(""), "");
    }

    #[test]
    fn test_sequence_match_id_format() {
        assert_eq!(sequence_match_id("m6n", "2026", "1", 3), "m6n-2026-rd1-3");
        assert_eq!(sequence_match_id("jrlo-div1", "2026", "", 15), "jrlo-div1-2026-15");
        assert_eq!(sequence_match_id("m6n", "", "1", 1), "");
        assert_eq!(sequence_match_id("", "2026", "1", 1), "");
    }

    #[test]
    fn test_assign_sequence_ids_groups_and_orders() {
        let batch = vec![
            fixture("premier", "2026", "1", "2026-01-03T15:00:00Z", "Bath"),
            fixture("premier", "2026", "1", "2026-01-02T19:45:00Z", "Saracens"),
            fixture("premier", "2026", "2", "2026-01-10T15:00:00Z", "Leicester Tigers"),
            fixture("premier", "2026", "1", "2026-01-03T17:30:00Z", "Harlequins"),
        ];
        let out = assign_sequence_ids(batch);

        let kickoffs: Vec<&str> = out.iter().map(|m| m.kickoff_utc.as_str()).collect();
        let mut sorted = kickoffs.clone();
        sorted.sort();
        assert_eq!(kickoffs, sorted);

        let ids = ids_by_home(&out);
        assert_eq!(
            ids,
            vec![
                ("Bath".to_string(), "premier-2026-rd1-2".to_string()),
                ("Harlequins".to_string(), "premier-2026-rd1-3".to_string()),
                ("Leicester Tigers".to_string(), "premier-2026-rd2-1".to_string()),
                ("Saracens".to_string(), "premier-2026-rd1-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_sequence_ids_stable_under_reordering() {
        let batch = vec![
            fixture("urc", "2026", "3", "2026-02-01T13:00:00Z", "Leinster"),
            fixture("urc", "2026", "3", "2026-01-31T17:00:00Z", "Munster"),
            fixture("urc", "2026", "4", "2026-02-07T15:00:00Z", "Ulster"),
            fixture("urc", "2026", "3", "2026-01-31T19:35:00Z", "Connacht"),
            fixture("urc", "2025", "3", "2025-02-01T13:00:00Z", "Glasgow Warriors"),
        ];
        let mut reversed = batch.clone();
        reversed.reverse();
        let mut rotated = batch.clone();
        rotated.rotate_left(2);

        let expected = ids_by_home(&assign_sequence_ids(batch));
        assert_eq!(ids_by_home(&assign_sequence_ids(reversed)), expected);
        assert_eq!(ids_by_home(&assign_sequence_ids(rotated)), expected);
    }

    #[test]
    fn test_sequence_ties_keep_input_order() {
        let batch = vec![
            fixture("wr", "2026", "", "2026-07-04T09:00:00Z", "Japan"),
            fixture("wr", "2026", "", "2026-07-04T09:00:00Z", "Fiji"),
        ];
        let out = assign_sequence_ids(batch);
        assert_eq!(out[0].home_team, "Japan");
        assert_eq!(out[0].match_id, "wr-2026-1");
        assert_eq!(out[1].match_id, "wr-2026-2");
    }

    #[test]
    fn test_missing_season_keeps_record_with_empty_id() {
        let out = assign_sequence_ids(vec![fixture("wr", "", "", "2026-07-04T09:00:00Z", "Japan")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].match_id, "");

        let out = assign_content_hash_ids(vec![fixture("", "2026", "", "", "Japan")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].match_id, "");
    }

    #[test]
    fn test_content_hash_is_deterministic() {
        let a = fixture("m6n", "2026", "1", "2026-02-07T14:10:00Z", "France");
        let id = content_hash_match_id(&a);
        assert!(id.starts_with("m6n-2026-02-07t14:10:00z-france-opponent-"));
        assert_eq!(id, content_hash_match_id(&a.clone()));

        let digest = id.rsplit('-').next().unwrap();
        assert_eq!(digest.len(), 10);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

        let mut b = a.clone();
        b.kickoff_utc = "2026-02-07T16:40:00Z".to_string();
        assert_ne!(content_hash_match_id(&b), id);
    }

    #[test]
    fn test_content_hash_without_kickoff_still_non_empty() {
        let record = fixture("ans", "2025", "", "", "Wales");
        let id = content_hash_match_id(&record);
        assert!(id.starts_with("ans--wales-opponent-"));
    }

    #[test]
    fn test_content_hash_keeps_name_spacing() {
        let mut record =
            fixture("t14", "2026", "", "2026-03-01T14:00:00Z", "Stade Toulousain");
        record.away_team = "Racing 92".to_string();
        let id = content_hash_match_id(&record);
        let digest =
            content_digest("t14", "2026-03-01T14:00:00Z", "Stade Toulousain", "Racing 92");
        assert_eq!(
            id,
            format!("t14-2026-03-01t14:00:00z-stade toulousain-racing 92-{}", digest)
        );
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("content-hash".parse::<MatchIdStrategy>(), Ok(MatchIdStrategy::ContentHash));
        assert_eq!("SEQUENCE".parse::<MatchIdStrategy>(), Ok(MatchIdStrategy::Sequence));
        assert!("random".parse::<MatchIdStrategy>().is_err());
    }
}
