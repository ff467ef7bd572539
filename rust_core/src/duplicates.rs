//! Duplicate team analysis.
//!
//! This module provides:
//! - Catalog scan for same-team-different-name clusters per competition
//! - Usage counts of exact team name strings in match files
//! - Ranked merge suggestions with name mappings, for human review
//! - The same grouping over raw scraped names that never reached the catalog
//!
//! Nothing here mutates the catalog. Merging changes match foreign keys, so
//! a report is all this produces.

use crate::catalog::{read_json, TeamCatalog};
use crate::error::{IssueKind, RecordIssue};
use crate::models::{MatchRecord, TeamRecord};
use crate::normalizer::NameNormalizer;
use crate::utils::names::{duplicate_key, natural_id_key};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// How often each exact team name appears as home or away, per competition.
#[derive(Debug, Clone, Default)]
pub struct UsageStats {
    counts: HashMap<(String, String), usize>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, competition_id: &str, name: &str) {
        if competition_id.is_empty() || name.is_empty() {
            return;
        }
        *self
            .counts
            .entry((competition_id.to_string(), name.to_string()))
            .or_insert(0) += 1;
    }

    pub fn count(&self, competition_id: &str, name: &str) -> usize {
        self.counts
            .get(&(competition_id.to_string(), name.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a MatchRecord>) -> Self {
        let mut stats = Self::new();
        for record in matches {
            stats.record(&record.competition_id, &record.home_team);
            stats.record(&record.competition_id, &record.away_team);
        }
        stats
    }

    /// Count usage over `{matches_dir}/{competition}/*.json`.
    ///
    /// Records without a competition id count under their directory name.
    /// Unreadable files are reported and skipped.
    pub fn load_dir(matches_dir: &Path) -> (Self, Vec<RecordIssue>) {
        let mut stats = Self::new();
        let mut issues = Vec::new();
        let Ok(entries) = fs::read_dir(matches_dir) else {
            return (stats, issues);
        };

        let mut dirs: Vec<_> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            let dir_name = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let Ok(files) = fs::read_dir(&dir) else {
                continue;
            };
            let mut files: Vec<_> = files
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            files.sort();

            for file in files {
                match read_json::<Vec<MatchRecord>>(&file) {
                    Ok(matches) => {
                        for record in matches.unwrap_or_default() {
                            let comp = if record.competition_id.is_empty() {
                                dir_name.as_str()
                            } else {
                                record.competition_id.as_str()
                            };
                            stats.record(comp, &record.home_team);
                            stats.record(comp, &record.away_team);
                        }
                    }
                    Err(e) => {
                        warn!("Skipping match file {}: {}", file.display(), e);
                        issues.push(
                            RecordIssue::new(IssueKind::ParseFailure, e.to_string())
                                .with_path(&file),
                        );
                    }
                }
            }
        }
        (stats, issues)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamVariation {
    pub team_id: String,
    pub name: String,
    pub usage_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSuggestion {
    pub primary_team: TeamVariation,
    pub merge_targets: Vec<TeamVariation>,
    /// every variation's name -> primary name
    pub name_mappings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCluster {
    pub competition_id: String,
    pub base_name: String,
    /// Ranked by usage, most used first
    pub variations: Vec<TeamVariation>,
    pub suggestion: MergeSuggestion,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_teams: usize,
    pub duplicate_groups: usize,
    pub redundant_teams: usize,
    pub teams_after_merge: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub summary: ReportSummary,
    pub clusters: Vec<DuplicateCluster>,
}

impl DuplicateReport {
    /// One `ambiguity_found` issue per cluster.
    pub fn issues(&self) -> Vec<RecordIssue> {
        self.clusters
            .iter()
            .map(|cluster| {
                let ids: Vec<&str> = cluster
                    .variations
                    .iter()
                    .map(|v| v.team_id.as_str())
                    .collect();
                RecordIssue::new(
                    IssueKind::AmbiguityFound,
                    format!(
                        "{} '{}' has {} ids: {}",
                        cluster.competition_id,
                        cluster.base_name,
                        ids.len(),
                        ids.join(", ")
                    ),
                )
            })
            .collect()
    }
}

/// Group key for a team name: static sponsor text removed, then case/punctuation folded.
pub fn grouping_key(normalizer: &NameNormalizer, name: &str) -> String {
    duplicate_key(&normalizer.strip_sponsor_text(name))
}

/// Scan the catalog for clusters of distinct ids sharing a grouping key.
pub fn analyze_catalog(
    catalog: &TeamCatalog,
    usage: &UsageStats,
    normalizer: &NameNormalizer,
) -> DuplicateReport {
    let mut groups: BTreeMap<(String, String), Vec<&TeamRecord>> = BTreeMap::new();
    for team in catalog.iter() {
        if team.competition_id.is_empty() || team.name.trim().is_empty() {
            continue;
        }
        let key = grouping_key(normalizer, &team.name);
        if key.is_empty() {
            continue;
        }
        groups
            .entry((team.competition_id.clone(), key))
            .or_default()
            .push(team);
    }

    let clusters: Vec<DuplicateCluster> = groups
        .into_iter()
        .filter(|(_, teams)| teams.len() > 1)
        .map(|((competition_id, base_name), teams)| {
            build_cluster(competition_id, base_name, &teams, usage)
        })
        .collect();

    let redundant_teams: usize = clusters.iter().map(|c| c.variations.len() - 1).sum();
    let summary = ReportSummary {
        total_teams: catalog.len(),
        duplicate_groups: clusters.len(),
        redundant_teams,
        teams_after_merge: catalog.len() - redundant_teams,
    };
    info!(
        "Duplicate scan: {} groups, {} redundant of {} teams",
        summary.duplicate_groups, summary.redundant_teams, summary.total_teams
    );
    DuplicateReport { summary, clusters }
}

fn build_cluster(
    competition_id: String,
    base_name: String,
    teams: &[&TeamRecord],
    usage: &UsageStats,
) -> DuplicateCluster {
    let mut variations: Vec<TeamVariation> = teams
        .iter()
        .map(|team| TeamVariation {
            team_id: team.id.clone(),
            name: team.name.clone(),
            usage_count: usage.count(&competition_id, &team.name),
        })
        .collect();
    variations.sort_by(|a, b| {
        b.usage_count
            .cmp(&a.usage_count)
            .then_with(|| natural_id_key(&a.team_id).cmp(&natural_id_key(&b.team_id)))
    });

    let primary = variations[0].clone();
    let name_mappings = variations
        .iter()
        .map(|v| (v.name.clone(), primary.name.clone()))
        .collect();
    let suggestion = MergeSuggestion {
        primary_team: primary,
        merge_targets: variations[1..].to_vec(),
        name_mappings,
    };

    DuplicateCluster {
        competition_id,
        base_name,
        variations,
        suggestion,
    }
}

/// Duplicate candidates among raw scraped names, before any catalog write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameDuplicate {
    pub competition_id: String,
    pub base_name: String,
    pub variations: Vec<String>,
    /// Proposed representative name
    pub suggestion: String,
}

/// Group each competition's raw names by grouping key; report keys shared by several spellings.
pub fn detect_name_duplicates(
    names_by_competition: &BTreeMap<String, Vec<String>>,
    normalizer: &NameNormalizer,
) -> Vec<NameDuplicate> {
    let mut duplicates = Vec::new();
    for (competition_id, names) in names_by_competition {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in names {
            let key = grouping_key(normalizer, name);
            if key.is_empty() {
                continue;
            }
            let group = groups.entry(key).or_default();
            if !group.contains(name) {
                group.push(name.clone());
            }
        }
        for (base_name, variations) in groups {
            if variations.len() > 1 {
                duplicates.push(NameDuplicate {
                    competition_id: competition_id.clone(),
                    base_name,
                    suggestion: variations[0].clone(),
                    variations,
                });
            }
        }
    }
    duplicates
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(records: &[(&str, &str, &str)]) -> TeamCatalog {
        let mut catalog = TeamCatalog::new("unused.json");
        for (id, comp, name) in records {
            catalog.insert_new(TeamRecord::new(id, comp, name)).unwrap();
        }
        catalog
    }

    fn fixture(comp: &str, home: &str, away: &str) -> MatchRecord {
        MatchRecord {
            competition_id: comp.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cluster_ranked_by_usage() {
        let catalog = catalog_with(&[
            ("premier_1", "premier", "Bath"),
            ("premier_2", "premier", "Bath GALLAGHER"),
            ("premier_3", "premier", "Saracens"),
        ]);
        let matches = vec![
            fixture("premier", "Bath GALLAGHER", "Saracens"),
            fixture("premier", "Saracens", "Bath GALLAGHER"),
            fixture("premier", "Bath", "Saracens"),
        ];
        let usage = UsageStats::from_matches(&matches);
        let report = analyze_catalog(&catalog, &usage, &NameNormalizer::new());

        assert_eq!(report.clusters.len(), 1);
        let cluster = &report.clusters[0];
        assert_eq!(cluster.competition_id, "premier");
        assert_eq!(cluster.base_name, "BATH");
        assert_eq!(cluster.variations.len(), 2);

        let primary = &cluster.suggestion.primary_team;
        assert_eq!(primary.team_id, "premier_2");
        assert_eq!(primary.usage_count, 2);
        assert_eq!(cluster.suggestion.merge_targets[0].team_id, "premier_1");
        assert_eq!(cluster.suggestion.name_mappings["Bath"], "Bath GALLAGHER");

        assert_eq!(
            report.summary,
            ReportSummary {
                total_teams: 3,
                duplicate_groups: 1,
                redundant_teams: 1,
                teams_after_merge: 2,
            }
        );
    }

    #[test]
    fn test_usage_ties_break_on_natural_id() {
        let catalog = catalog_with(&[
            ("urc_10", "urc", "Stormers DHL"),
            ("urc_9", "urc", "DHL Stormers"),
            ("urc_2", "urc", "Stormers"),
        ]);
        let report = analyze_catalog(&catalog, &UsageStats::new(), &NameNormalizer::new());
        let ids: Vec<&str> = report.clusters[0]
            .variations
            .iter()
            .map(|v| v.team_id.as_str())
            .collect();
        assert_eq!(ids, vec!["urc_2", "urc_9", "urc_10"]);
    }

    #[test]
    fn test_clusters_scoped_per_competition() {
        let catalog = catalog_with(&[
            ("premier_1", "premier", "Bath"),
            ("epcr-champions_1", "epcr-champions", "Bath GALLAGHER"),
        ]);
        let report = analyze_catalog(&catalog, &UsageStats::new(), &NameNormalizer::new());
        assert!(report.clusters.is_empty());
        assert_eq!(report.summary.teams_after_merge, 2);
        assert!(report.issues().is_empty());
    }

    #[test]
    fn test_report_issues() {
        let catalog = catalog_with(&[
            ("premier_1", "premier", "Bath"),
            ("premier_2", "premier", "BATH."),
        ]);
        let report = analyze_catalog(&catalog, &UsageStats::new(), &NameNormalizer::new());
        let issues = report.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::AmbiguityFound);
        assert!(issues[0].message.contains("premier_1, premier_2"));
    }

    #[test]
    fn test_usage_from_match_dir() {
        let dir = tempfile::tempdir().unwrap();
        let comp_dir = dir.path().join("premier");
        fs::create_dir_all(&comp_dir).unwrap();
        fs::write(
            comp_dir.join("2026.json"),
            r#"[{"home_team": "Bath", "away_team": "Saracens"},
                {"competition_id": "premier", "home_team": "Saracens", "away_team": "Bath"}]"#,
        )
        .unwrap();
        fs::write(comp_dir.join("2025.json"), "{broken").unwrap();

        let (usage, issues) = UsageStats::load_dir(dir.path());
        assert_eq!(usage.count("premier", "Bath"), 2);
        assert_eq!(usage.count("premier", "Saracens"), 2);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_usage_counts_files_with_null_kickoffs() {
        let dir = tempfile::tempdir().unwrap();
        let comp_dir = dir.path().join("premier");
        fs::create_dir_all(&comp_dir).unwrap();
        fs::write(
            comp_dir.join("2026.json"),
            r#"[{"competition_id": "premier", "kickoff_local": null, "kickoff_utc": null,
                 "home_team": "Bath", "home_team_id": null, "away_team": "Saracens"}]"#,
        )
        .unwrap();

        let (usage, issues) = UsageStats::load_dir(dir.path());
        assert!(issues.is_empty());
        assert_eq!(usage.count("premier", "Bath"), 1);
    }

    #[test]
    fn test_detect_name_duplicates() {
        let mut names = BTreeMap::new();
        names.insert(
            "srp".to_string(),
            vec![
                "Waratahs".to_string(),
                "Waratahs HFC Bank".to_string(),
                "Waratahs".to_string(),
                "Brumbies".to_string(),
            ],
        );
        let dups = detect_name_duplicates(&names, &NameNormalizer::new());
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].base_name, "WARATAHS");
        assert_eq!(dups[0].variations, vec!["Waratahs", "Waratahs HFC Bank"]);
        assert_eq!(dups[0].suggestion, "Waratahs");
    }
}
