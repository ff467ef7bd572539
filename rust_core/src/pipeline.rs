//! Batch enrichment and match-file I/O.
//!
//! This module provides:
//! - `enrich_batch`: raw collector records -> resolved, time-normalized, id'd match records
//! - `write_match_files`: one atomic file per (competition, season)
//! - `backfill_team_ids`: fill missing team ids in existing match files, read-only
//!
//! Every failure is isolated to its record or file and returned as a
//! `RecordIssue`; a batch always runs to completion.

use crate::catalog::{read_json, write_json_atomic, TeamCatalog};
use crate::competition_config::{default_timezone, get_competition_config};
use crate::error::{IdentityError, IssueKind, RecordIssue};
use crate::identity::IdentityResolver;
use crate::kickoff::{try_normalize_kickoff, Kickoff};
use crate::match_id::{assign_match_ids, extract_round_number, MatchIdStrategy};
use crate::models::{MatchRecord, RawMatch};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory used for records without a competition id.
pub const UNKNOWN_COMPETITION_DIR: &str = "unknown-competition";
/// File stem used for records without a season.
pub const UNKNOWN_SEASON_STEM: &str = "unknown-season";

#[derive(Debug, Clone, Default)]
pub struct EnrichedBatch {
    /// Sorted by `kickoff_utc`
    pub matches: Vec<MatchRecord>,
    pub issues: Vec<RecordIssue>,
}

/// Strategy a competition uses when the caller does not force one.
pub fn match_id_strategy(competition_id: &str) -> MatchIdStrategy {
    get_competition_config(competition_id)
        .map(|c| c.match_ids)
        .unwrap_or_default()
}

/// Resolve one side of a fixture. Returns (stored name, team id).
fn resolve_side(
    resolver: &mut IdentityResolver,
    catalog: &mut TeamCatalog,
    raw_name: &str,
    competition_id: &str,
    field: &str,
    index: usize,
    issues: &mut Vec<RecordIssue>,
) -> (String, String) {
    match resolver.resolve(catalog, raw_name, competition_id) {
        Ok(resolution) => (resolution.base_name, resolution.team_id),
        Err(IdentityError::Placeholder(name)) => {
            debug!("Record #{} {}: placeholder '{}'", index, field, name);
            (name, String::new())
        }
        Err(e) => {
            warn!("Record #{} {}: {}", index, field, e);
            issues.push(
                RecordIssue::new(IssueKind::from(&e), e.to_string())
                    .with_record(index)
                    .with_field(&format!("{}_id", field)),
            );
            (resolver.normalize(raw_name, competition_id), String::new())
        }
    }
}

fn enrich_record(
    resolver: &mut IdentityResolver,
    catalog: &mut TeamCatalog,
    raw: &RawMatch,
    index: usize,
    issues: &mut Vec<RecordIssue>,
) -> MatchRecord {
    let competition_id = raw.competition_id.trim().to_string();

    let (home_team, home_team_id) = resolve_side(
        resolver,
        catalog,
        &raw.home_team,
        &competition_id,
        "home_team",
        index,
        issues,
    );
    let (away_team, away_team_id) = resolve_side(
        resolver,
        catalog,
        &raw.away_team,
        &competition_id,
        "away_team",
        index,
        issues,
    );

    let hint = if raw.timezone_hint.trim().is_empty() {
        default_timezone(&competition_id).unwrap_or_default()
    } else {
        raw.timezone_hint.trim()
    };
    let kickoff = if raw.kickoff.trim().is_empty() {
        Kickoff::empty()
    } else {
        match try_normalize_kickoff(raw.kickoff.as_str(), hint) {
            Ok(kickoff) => kickoff,
            Err(e) => {
                warn!("Record #{} kickoff: {}", index, e);
                issues.push(
                    RecordIssue::new(IssueKind::ParseFailure, e.to_string())
                        .with_record(index)
                        .with_field("kickoff"),
                );
                Kickoff::empty()
            }
        }
    };

    MatchRecord {
        match_id: String::new(),
        competition_id,
        season: raw.season.trim().to_string(),
        round: extract_round_number(&raw.round),
        status: raw.status.trim().to_string(),
        kickoff_local: kickoff.local,
        kickoff_utc: kickoff.utc,
        timezone: kickoff.timezone,
        venue: raw.venue.trim().to_string(),
        home_team,
        home_team_id,
        away_team,
        away_team_id,
        match_url: raw.match_url.trim().to_string(),
        broadcasters: raw.broadcasters.clone(),
    }
}

/// Enrich a batch of raw records and assign match ids.
///
/// `strategy` forces one id scheme for the whole batch; otherwise each
/// competition uses its configured scheme. Records are never dropped.
pub fn enrich_batch(
    resolver: &mut IdentityResolver,
    catalog: &mut TeamCatalog,
    raws: &[RawMatch],
    strategy: Option<MatchIdStrategy>,
) -> EnrichedBatch {
    let mut issues = Vec::new();
    let mut by_strategy: BTreeMap<&'static str, (MatchIdStrategy, Vec<MatchRecord>)> =
        BTreeMap::new();

    for (index, raw) in raws.iter().enumerate() {
        let record = enrich_record(resolver, catalog, raw, index, &mut issues);
        let chosen = strategy.unwrap_or_else(|| match_id_strategy(&record.competition_id));
        by_strategy
            .entry(chosen.as_str())
            .or_insert_with(|| (chosen, Vec::new()))
            .1
            .push(record);
    }

    let mut matches: Vec<MatchRecord> = by_strategy
        .into_values()
        .flat_map(|(chosen, records)| assign_match_ids(records, chosen))
        .collect();
    matches.sort_by(|a, b| a.kickoff_utc.cmp(&b.kickoff_utc));

    info!(
        "Enriched {} records ({} issues)",
        matches.len(),
        issues.len()
    );
    EnrichedBatch { matches, issues }
}

/// Keep path components to letters, digits, `-` and `_`.
fn path_component(value: &str, fallback: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.trim_matches('-').is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// `{matches_dir}/{competition_id}/{season}.json`
pub fn match_file_path(matches_dir: &Path, competition_id: &str, season: &str) -> PathBuf {
    matches_dir
        .join(path_component(competition_id, UNKNOWN_COMPETITION_DIR))
        .join(format!("{}.json", path_component(season, UNKNOWN_SEASON_STEM)))
}

/// Write one file per (competition, season), replacing previous contents.
///
/// A failed write is reported and the remaining files are still written.
pub fn write_match_files(matches_dir: &Path, matches: &[MatchRecord]) -> Vec<RecordIssue> {
    let mut files: BTreeMap<PathBuf, Vec<&MatchRecord>> = BTreeMap::new();
    for record in matches {
        files
            .entry(match_file_path(matches_dir, &record.competition_id, &record.season))
            .or_default()
            .push(record);
    }

    let mut issues = Vec::new();
    for (path, records) in files {
        match write_json_atomic(&path, &records) {
            Ok(()) => info!("Wrote {} matches to {}", records.len(), path.display()),
            Err(e) => {
                warn!("Failed to write {}: {}", path.display(), e);
                issues.push(
                    RecordIssue::new(IssueKind::PersistenceFailure, e.to_string()).with_path(&path),
                );
            }
        }
    }
    issues
}

/// Read a match file written by `write_match_files`.
pub fn load_match_file(path: &Path) -> Result<Vec<MatchRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read match file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse match file {}", path.display()))
}

/// Every `*.json` under `{matches_dir}/{competition}/`, sorted.
pub fn list_match_files(matches_dir: &Path, competition_id: Option<&str>) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(matches_dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for dir in entries.filter_map(|e| e.ok().map(|e| e.path())) {
        if !dir.is_dir() {
            continue;
        }
        if let Some(filter) = competition_id {
            if dir.file_name().map_or(true, |name| name != filter) {
                continue;
            }
        }
        if let Ok(inner) = fs::read_dir(&dir) {
            files.extend(
                inner
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.extension().is_some_and(|ext| ext == "json")),
            );
        }
    }
    files.sort();
    files
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackfillSummary {
    pub files_scanned: usize,
    pub files_updated: usize,
    pub ids_filled: usize,
    pub issues: Vec<RecordIssue>,
}

/// Fill `home_team_id`/`away_team_id` in existing match files from the catalog.
///
/// Resolution is read-only. Without `force`, only empty ids are filled; with
/// it every id is re-resolved. Fields this crate does not model are kept.
pub fn backfill_team_ids(
    resolver: &IdentityResolver,
    catalog: &TeamCatalog,
    matches_dir: &Path,
    competition_id: Option<&str>,
    force: bool,
) -> BackfillSummary {
    let mut summary = BackfillSummary::default();

    for path in list_match_files(matches_dir, competition_id) {
        summary.files_scanned += 1;
        let mut records: Vec<Value> = match read_json(&path) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.issues.push(
                    RecordIssue::new(IssueKind::ParseFailure, e.to_string()).with_path(&path),
                );
                continue;
            }
        };

        let dir_competition = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut filled = 0;
        for (index, record) in records.iter_mut().enumerate() {
            let Some(object) = record.as_object_mut() else {
                continue;
            };
            let comp = object
                .get("competition_id")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .unwrap_or(&dir_competition)
                .to_string();

            for side in ["home_team", "away_team"] {
                let id_field = format!("{}_id", side);
                let current = object
                    .get(&id_field)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if !current.is_empty() && !force {
                    continue;
                }
                let name = object
                    .get(side)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if name.is_empty() {
                    continue;
                }
                match resolver.lookup(catalog, &name, &comp) {
                    Ok(resolution) if resolution.team_id != current => {
                        object.insert(id_field, Value::String(resolution.team_id));
                        filled += 1;
                    }
                    Ok(_) | Err(IdentityError::Placeholder(_)) => {}
                    Err(e) => {
                        debug!("{} record #{} {}: {}", path.display(), index, side, e);
                        summary.issues.push(
                            RecordIssue::new(IssueKind::from(&e), e.to_string())
                                .with_path(&path)
                                .with_record(index)
                                .with_field(&id_field),
                        );
                    }
                }
            }
        }

        if filled == 0 {
            continue;
        }
        match write_json_atomic(&path, &records) {
            Ok(()) => {
                summary.files_updated += 1;
                summary.ids_filled += filled;
                info!("Backfilled {} ids in {}", filled, path.display());
            }
            Err(e) => {
                warn!("Failed to rewrite {}: {}", path.display(), e);
                summary.issues.push(
                    RecordIssue::new(IssueKind::PersistenceFailure, e.to_string()).with_path(&path),
                );
            }
        }
    }
    summary
}

// ============================================================================
// Tests
// ============================================================================
