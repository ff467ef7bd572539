//! Base-name cache for sponsor detection.
//!
//! This module provides:
//! - Competition-scoped sets of known base names, built from the team catalog
//! - International scope: one shared pool across every international competition
//! - Case-insensitive membership checks
//!
//! The cache is derived state. It is rebuilt from the catalog at the start of
//! every run and never written to disk.

use crate::competition_config::{international_competition_ids, is_international};
use crate::models::TeamRecord;
use crate::utils::names::eq_ignore_case;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct BaseNameCache {
    /// competition_id -> known base names
    names: BTreeMap<String, BTreeSet<String>>,
}

impl BaseNameCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from catalog records: every non-empty `name`, plus `short_name` when it differs.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TeamRecord>) -> Self {
        let mut cache = Self::new();
        for record in records {
            cache.insert(&record.competition_id, &record.name);
            if record.short_name.trim() != record.name.trim() {
                cache.insert(&record.competition_id, &record.short_name);
            }
        }
        cache
    }

    /// Add a base name. Empty competition ids or names are ignored.
    pub fn insert(&mut self, competition_id: &str, name: &str) {
        let name = name.trim();
        if competition_id.is_empty() || name.is_empty() {
            return;
        }
        self.names
            .entry(competition_id.to_string())
            .or_default()
            .insert(name.to_string());
    }

    /// Base names registered for one competition.
    pub fn names(&self, competition_id: &str) -> impl Iterator<Item = &str> {
        self.names
            .get(competition_id)
            .into_iter()
            .flat_map(|set| set.iter().map(|s| s.as_str()))
    }

    /// Names sponsor detection may match against for `competition_id`.
    ///
    /// International competitions search the pool of every international
    /// competition; clubs only see their own competition.
    pub fn scope(&self, competition_id: &str) -> BTreeSet<&str> {
        if is_international(competition_id) {
            international_competition_ids()
                .into_iter()
                .flat_map(|comp| self.names(comp))
                .collect()
        } else {
            self.names(competition_id).collect()
        }
    }

    /// The stored spelling of `candidate` for this competition, ignoring case.
    pub fn find(&self, competition_id: &str, candidate: &str) -> Option<&str> {
        let candidate = candidate.trim();
        self.names(competition_id)
            .find(|name| eq_ignore_case(name, candidate))
    }

    pub fn contains(&self, competition_id: &str, candidate: &str) -> bool {
        self.find(competition_id, candidate).is_some()
    }

    /// Total number of names across competitions.
    pub fn len(&self) -> usize {
        self.names.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all competitions in the cache.
    pub fn competitions(&self) -> Vec<String> {
        self.names.keys().cloned().collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, comp: &str, name: &str, short_name: &str) -> TeamRecord {
        let mut record = TeamRecord::new(id, comp, name);
        record.short_name = short_name.to_string();
        record
    }

    #[test]
    fn test_from_records() {
        let records = vec![
            team("premier_1", "premier", "Bath", ""),
            team("premier_2", "premier", "Leicester Tigers", "Leicester"),
            team("urc_1", "urc", "Munster", "Munster"),
        ];
        let cache = BaseNameCache::from_records(&records);

        let premier: Vec<&str> = cache.names("premier").collect();
        assert_eq!(premier, vec!["Bath", "Leicester", "Leicester Tigers"]);
        assert_eq!(cache.names("urc").count(), 1);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.competitions(), vec!["premier", "urc"]);
    }

    #[test]
    fn test_case_insensitive_find() {
        let mut cache = BaseNameCache::new();
        cache.insert("premier", "Bath");

        assert_eq!(cache.find("premier", "BATH"), Some("Bath"));
        assert!(cache.contains("premier", " bath "));
        assert!(!cache.contains("urc", "Bath"));
    }

    #[test]
    fn test_international_scope_is_shared() {
        let mut cache = BaseNameCache::new();
        cache.insert("m6n", "England");
        cache.insert("trc", "Argentina");
        cache.insert("premier", "Bath");

        let scope = cache.scope("ans");
        assert!(scope.contains("England"));
        assert!(scope.contains("Argentina"));
        assert!(!scope.contains("Bath"));

        let club = cache.scope("premier");
        assert_eq!(club.into_iter().collect::<Vec<_>>(), vec!["Bath"]);
    }

    #[test]
    fn test_ignores_empty_entries() {
        let mut cache = BaseNameCache::new();
        cache.insert("", "Bath");
        cache.insert("premier", "   ");
        assert!(cache.is_empty());
    }
}
