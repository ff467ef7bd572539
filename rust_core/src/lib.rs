//! Fixture Core - team identity and fixture reconciliation for rugby data.
//!
//! This module provides:
//! - Team name normalization (aliases, variants, sponsor stripping)
//! - Kickoff normalization to local ISO, UTC ISO and a timezone label
//! - Stable team ids under national and club schemes
//! - Content-hash and sequence match ids
//! - Append-only team and competition catalogs with atomic writes
//! - Duplicate team analysis with ranked merge suggestions

pub mod catalog;
pub mod competition_config;
pub mod duplicates;
pub mod error;
pub mod identity;
pub mod kickoff;
pub mod match_id;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod team_cache;
pub mod utils;

pub use catalog::{CompetitionCatalog, PersistMode, TeamCatalog};
pub use error::{CatalogError, IdentityError, IssueKind, KickoffError, RecordIssue};
pub use identity::{IdentityResolver, LogoCache, LogoProvider, Resolution, StaticLogos};
pub use kickoff::{normalize_kickoff, Kickoff};
pub use match_id::MatchIdStrategy;
pub use models::{CompetitionRecord, LogoInfo, MatchRecord, RawMatch, TeamRecord};
pub use normalizer::NameNormalizer;

use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of one load-resolve-persist run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub matches: Vec<MatchRecord>,
    pub issues: Vec<RecordIssue>,
    /// Team records created during the run
    pub minted: usize,
}

impl RunReport {
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// Enrich a batch, persist the catalog once, then write its match files.
///
/// The catalog is only written when the run changed it. When that write
/// fails, the teams minted by the run are dropped again and their ids are
/// cleared from the matches before any match file is written, so match
/// files never reference a team the catalog does not store.
pub fn reconcile_batch(
    resolver: &mut IdentityResolver,
    catalog: &mut TeamCatalog,
    raws: &[RawMatch],
    strategy: Option<MatchIdStrategy>,
    matches_dir: Option<&Path>,
) -> RunReport {
    let known: HashSet<String> = catalog.iter().map(|t| t.id.clone()).collect();
    let mut batch = pipeline::enrich_batch(resolver, catalog, raws, strategy);
    let mut issues = batch.issues;

    let mut minted: Vec<String> = catalog
        .iter()
        .filter(|t| !known.contains(&t.id))
        .map(|t| t.id.clone())
        .collect();

    if catalog.is_dirty() {
        if let Err(e) = catalog.save() {
            warn!("Team catalog not saved, dropping {} new teams: {}", minted.len(), e);
            issues.push(
                RecordIssue::new(IssueKind::PersistenceFailure, e.to_string())
                    .with_path(catalog.path()),
            );
            for id in &minted {
                catalog.rollback_insert(id);
            }
            issues.extend(clear_unstored_ids(&mut batch.matches, &minted));
            minted.clear();
        }
    }

    if let Some(dir) = matches_dir {
        issues.extend(pipeline::write_match_files(dir, &batch.matches));
    }

    info!(
        "Run complete: {} matches, {} new teams, {} issues",
        batch.matches.len(),
        minted.len(),
        issues.len()
    );
    RunReport {
        matches: batch.matches,
        issues,
        minted: minted.len(),
    }
}

/// Empty every team id in `unstored`, one issue per cleared field.
fn clear_unstored_ids(matches: &mut [MatchRecord], unstored: &[String]) -> Vec<RecordIssue> {
    let mut issues = Vec::new();
    for (index, record) in matches.iter_mut().enumerate() {
        for (field, id) in [
            ("home_team_id", &mut record.home_team_id),
            ("away_team_id", &mut record.away_team_id),
        ] {
            if !id.is_empty() && unstored.contains(&*id) {
                issues.push(
                    RecordIssue::new(
                        IssueKind::PersistenceFailure,
                        format!("team {} was not stored", id),
                    )
                    .with_record(index)
                    .with_field(field),
                );
                id.clear();
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(home: &str, away: &str) -> RawMatch {
        RawMatch {
            competition_id: "urc".to_string(),
            season: "2026".to_string(),
            round: "Round 9".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            kickoff: "2026-01-24 19:35".to_string(),
            timezone_hint: "Europe/Dublin".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_reconcile_batch_persists_once() {
        let dir = tempfile::tempdir().unwrap();
        let teams_path = dir.path().join("teams.json");
        let matches_dir = dir.path().join("matches");

        let mut catalog = TeamCatalog::load(&teams_path).unwrap();
        let mut resolver =
            IdentityResolver::new(NameNormalizer::new(), &catalog).with_mutation(true);
        let report = reconcile_batch(
            &mut resolver,
            &mut catalog,
            &[raw("Munster", "Leinster"), raw("Vodacom Bulls", "DHL Stormers")],
            None,
            Some(&matches_dir),
        );

        assert!(report.issues.is_empty());
        assert_eq!(report.minted, 4);
        assert!(!catalog.is_dirty());
        assert_eq!(TeamCatalog::load(&teams_path).unwrap().len(), 4);

        let written =
            pipeline::load_match_file(&matches_dir.join("urc").join("2026.json")).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].match_id, "urc-2026-rd9-1");
        assert_eq!(written[0].kickoff_utc, "2026-01-24T19:35:00Z");
    }

    #[test]
    fn test_reconcile_batch_reports_catalog_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "file").unwrap();

        let mut catalog = TeamCatalog::new(blocker.join("teams.json"));
        let mut resolver =
            IdentityResolver::new(NameNormalizer::new(), &catalog).with_mutation(true);
        let report = reconcile_batch(
            &mut resolver,
            &mut catalog,
            &[raw("Munster", "Leinster")],
            None,
            None,
        );

        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.minted, 0);
        // One for the catalog file, one per cleared id
        assert_eq!(report.count(IssueKind::PersistenceFailure), 3);
        assert_eq!(report.matches[0].home_team_id, "");
        assert_eq!(report.matches[0].away_team_id, "");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_failed_catalog_save_keeps_unstored_ids_out_of_match_files() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "file").unwrap();
        let matches_dir = dir.path().join("matches");

        let mut catalog = TeamCatalog::new(blocker.join("teams.json"));
        catalog
            .insert_new(TeamRecord::new("urc_1", "urc", "Munster"))
            .unwrap();
        let mut resolver =
            IdentityResolver::new(NameNormalizer::new(), &catalog).with_mutation(true);
        let report = reconcile_batch(
            &mut resolver,
            &mut catalog,
            &[raw("Munster", "Leinster")],
            None,
            Some(&matches_dir),
        );

        // The existing team keeps its id; the unsaved mint is dropped
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("urc_1"));
        assert!(!catalog.contains("urc_2"));

        let written =
            pipeline::load_match_file(&matches_dir.join("urc").join("2026.json")).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].home_team_id, "urc_1");
        assert_eq!(written[0].away_team_id, "");
        assert_eq!(written[0].away_team, "Leinster");

        let cleared: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.field.as_deref() == Some("away_team_id"))
            .collect();
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].kind, IssueKind::PersistenceFailure);
    }
}
