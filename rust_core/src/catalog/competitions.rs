//! Competition catalog (`competitions.json`).
//!
//! A JSON list of competition records. Base entries from the static
//! competition table are merged in append-only; the `teams` list and
//! `data_summary` block are recomputed from the match files on disk.

use super::{read_json, write_json_atomic};
use crate::competition_config::CompetitionConfig;
use crate::error::{CatalogError, IssueKind, RecordIssue};
use crate::models::{CompetitionRecord, DataSummary, DateRange, MatchRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CompetitionCatalog {
    path: PathBuf,
    competitions: Vec<CompetitionRecord>,
}

impl CompetitionCatalog {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let competitions: Vec<CompetitionRecord> = read_json(&path)?.unwrap_or_default();
        info!(
            "Loaded {} competitions from {}",
            competitions.len(),
            path.display()
        );
        Ok(Self { path, competitions })
    }

    pub fn save(&self) -> Result<(), CatalogError> {
        write_json_atomic(&self.path, &self.competitions)
    }

    pub fn get(&self, id: &str) -> Option<&CompetitionRecord> {
        self.competitions.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompetitionRecord> {
        self.competitions.iter()
    }

    pub fn len(&self) -> usize {
        self.competitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitions.is_empty()
    }

    /// Append entries for configured competitions that are not listed yet.
    ///
    /// Existing entries are left as they are, including hand edits. Returns the
    /// ids that were added.
    pub fn merge_base(&mut self, configs: &[CompetitionConfig]) -> Vec<String> {
        let mut added = Vec::new();
        for config in configs {
            if self.get(config.competition_id).is_some() {
                continue;
            }
            self.competitions.push(base_record(config));
            added.push(config.competition_id.to_string());
        }
        if !added.is_empty() {
            info!("Added {} competitions: {}", added.len(), added.join(", "));
        }
        added
    }

    /// Recompute `teams` and `data_summary` from `{matches_dir}/{competition_id}/*.json`.
    ///
    /// Unreadable match files are reported and skipped; the remaining files
    /// still count.
    pub fn refresh_summaries(&mut self, matches_dir: &Path) -> Vec<RecordIssue> {
        let mut issues = Vec::new();
        for competition in self.competitions.iter_mut() {
            let dir = matches_dir.join(&competition.id);
            let (teams, summary) = summarize_dir(&dir, &mut issues);
            competition.teams = teams;
            competition.data_summary = summary;
        }
        issues
    }
}

fn base_record(config: &CompetitionConfig) -> CompetitionRecord {
    CompetitionRecord {
        id: config.competition_id.to_string(),
        name: config.name.to_string(),
        short_name: config.short_name.to_string(),
        category: config.scope.category().to_string(),
        gender: config.gender.to_string(),
        timezone_default: config.default_timezone.to_string(),
        official_sites: config.official_sites.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// Sorted match-file paths of one competition directory.
fn match_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

fn kickoff_instant(record: &MatchRecord) -> Option<DateTime<Utc>> {
    [&record.kickoff_utc, &record.kickoff_local]
        .into_iter()
        .filter(|value| !value.is_empty())
        .find_map(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn summarize_dir(dir: &Path, issues: &mut Vec<RecordIssue>) -> (Vec<String>, DataSummary) {
    let mut teams = BTreeSet::new();
    let mut seasons = BTreeSet::new();
    let mut first: Option<DateTime<Utc>> = None;
    let mut last: Option<DateTime<Utc>> = None;
    let mut newest_file: Option<DateTime<Utc>> = None;
    let mut match_count = 0;

    for path in match_files(dir) {
        let matches: Vec<MatchRecord> = match read_json(&path) {
            Ok(matches) => matches.unwrap_or_default(),
            Err(e) => {
                warn!("Skipping match file {}: {}", path.display(), e);
                issues.push(
                    RecordIssue::new(IssueKind::ParseFailure, e.to_string()).with_path(&path),
                );
                continue;
            }
        };

        match_count += matches.len();
        for record in &matches {
            for team in [&record.home_team, &record.away_team] {
                if !team.is_empty() {
                    teams.insert(team.clone());
                }
            }
            if !record.season.is_empty() {
                seasons.insert(record.season.clone());
            }
            if let Some(kickoff) = kickoff_instant(record) {
                first = Some(first.map_or(kickoff, |f| f.min(kickoff)));
                last = Some(last.map_or(kickoff, |l| l.max(kickoff)));
            }
        }

        if let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) {
            let modified = DateTime::<Utc>::from(modified);
            newest_file = Some(newest_file.map_or(modified, |n| n.max(modified)));
        }
    }

    let iso = |dt: Option<DateTime<Utc>>| {
        dt.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default()
    };
    let summary = DataSummary {
        match_count,
        seasons: seasons.into_iter().collect(),
        date_range: DateRange {
            start: iso(first),
            end: iso(last),
        },
        last_updated: iso(newest_file),
    };
    (teams.into_iter().collect(), summary)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competition_config::get_all_competition_configs;

    fn write(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_merge_base_is_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("competitions.json");
        write(
            &path,
            r#"[{"id": "m6n", "name": "Guinness Six Nations", "coverage": {"broadcast_regions": ["GB"]}}]"#,
        );

        let mut catalog = CompetitionCatalog::load(&path).unwrap();
        let added = catalog.merge_base(get_all_competition_configs());
        assert!(!added.contains(&"m6n".to_string()));
        assert_eq!(added.len(), get_all_competition_configs().len() - 1);

        let m6n = catalog.get("m6n").unwrap();
        assert_eq!(m6n.name, "Guinness Six Nations");
        assert_eq!(m6n.extra["coverage"]["broadcast_regions"][0], "GB");

        let premier = catalog.get("premier").unwrap();
        assert_eq!(premier.category, "club");
        assert_eq!(premier.timezone_default, "Europe/London");

        assert!(catalog.merge_base(get_all_competition_configs()).is_empty());
    }

    #[test]
    fn test_refresh_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let matches_dir = dir.path().join("matches");
        write(
            &matches_dir.join("w6n").join("2026.json"),
            r#"[
                {"match_id": "a", "season": "2026", "home_team": "Ireland", "away_team": "Italy",
                 "kickoff_utc": "2026-03-14T17:45:00Z"},
                {"match_id": "b", "season": "2026", "home_team": "France", "away_team": "Ireland",
                 "kickoff_local": "2026-03-21T21:10:00+01:00"}
            ]"#,
        );
        write(
            &matches_dir.join("w6n").join("2025.json"),
            r#"[{"match_id": "c", "season": 2025, "home_team": "Wales", "away_team": "", "kickoff_utc": ""}]"#,
        );
        write(&matches_dir.join("w6n").join("broken.json"), "[{");
        write(&matches_dir.join("w6n").join("notes.txt"), "ignored");

        let mut catalog = CompetitionCatalog::load(dir.path().join("competitions.json")).unwrap();
        catalog.merge_base(get_all_competition_configs());
        let issues = catalog.refresh_summaries(&matches_dir);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ParseFailure);

        let w6n = catalog.get("w6n").unwrap();
        assert_eq!(w6n.teams, vec!["France", "Ireland", "Italy", "Wales"]);
        assert_eq!(w6n.data_summary.match_count, 3);
        assert_eq!(w6n.data_summary.seasons, vec!["2025", "2026"]);
        assert_eq!(w6n.data_summary.date_range.start, "2026-03-14T17:45:00Z");
        assert_eq!(w6n.data_summary.date_range.end, "2026-03-21T20:10:00Z");
        assert!(!w6n.data_summary.last_updated.is_empty());

        let premier = catalog.get("premier").unwrap();
        assert_eq!(premier.data_summary, DataSummary::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("competitions.json");
        let mut catalog = CompetitionCatalog::load(&path).unwrap();
        catalog.merge_base(get_all_competition_configs());
        catalog.save().unwrap();

        let reloaded = CompetitionCatalog::load(&path).unwrap();
        assert_eq!(reloaded.len(), catalog.len());
        assert_eq!(reloaded.iter().next().unwrap().id, "m6n");
    }
}
