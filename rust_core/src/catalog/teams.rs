//! Team master file.
//!
//! The file is one JSON object `team_id -> TeamRecord`. Ids are never renamed
//! or removed by this store; only `clear()` (an explicit operator reset) drops
//! records.

use super::{read_json, write_json_atomic};
use crate::error::CatalogError;
use crate::models::{LogoInfo, TeamRecord};
use crate::utils::names::{eq_ignore_case, natural_id_key, nfkc_trim};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Header values scraped from roster tables instead of real short names.
const SHORT_NAME_PLACEHOLDERS: &[&str] = &["略称", "公式チーム名称", "呼称", "エンブレム"];

/// Logo hosts that official logos are allowed to overwrite.
const THIRD_PARTY_LOGO_HOSTS: &[&str] = &["thesportsdb.com"];

/// When new team records reach disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    /// Keep mints in memory; the run driver saves once at the end.
    #[default]
    Deferred,
    /// Save after every mint, rolling the mint back if the write fails.
    Immediate,
}

impl FromStr for PersistMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deferred" | "end" | "batch" => Ok(PersistMode::Deferred),
            "immediate" | "each" => Ok(PersistMode::Immediate),
            other => Err(format!("unknown persist mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamCatalog {
    path: PathBuf,
    teams: BTreeMap<String, TeamRecord>,
    dirty: bool,
}

impl TeamCatalog {
    /// Empty catalog bound to `path`. Nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            teams: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Load the team master. A missing or blank file is an empty catalog.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let mut teams: BTreeMap<String, TeamRecord> = read_json(&path)?.unwrap_or_default();
        for (id, record) in teams.iter_mut() {
            if record.id.is_empty() {
                record.id = id.clone();
            }
        }
        info!("Loaded {} teams from {}", teams.len(), path.display());
        Ok(Self {
            path,
            teams,
            dirty: false,
        })
    }

    /// Write the whole catalog atomically.
    pub fn save(&mut self) -> Result<(), CatalogError> {
        write_json_atomic(&self.path, &self.teams)?;
        self.dirty = false;
        debug!("Saved {} teams to {}", self.teams.len(), self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, id: &str) -> Option<&TeamRecord> {
        self.teams.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.teams.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Unsaved changes since the last load/save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamRecord> {
        self.teams.values()
    }

    /// Records of one competition, in natural id order (`premier_2` before `premier_10`).
    pub fn teams_in(&self, competition_id: &str) -> Vec<&TeamRecord> {
        let mut teams: Vec<&TeamRecord> = self
            .teams
            .values()
            .filter(|t| t.competition_id == competition_id)
            .collect();
        teams.sort_by_key(|t| natural_id_key(&t.id));
        teams
    }

    /// Append a new record. Existing ids are never overwritten.
    pub fn insert_new(&mut self, record: TeamRecord) -> Result<(), CatalogError> {
        if self.teams.contains_key(&record.id) {
            return Err(CatalogError::DuplicateId(record.id));
        }
        self.teams.insert(record.id.clone(), record);
        self.dirty = true;
        Ok(())
    }

    /// Undo an `insert_new` whose persistence failed.
    pub(crate) fn rollback_insert(&mut self, id: &str) {
        if self.teams.remove(id).is_some() {
            debug!("Rolled back team {}", id);
        }
    }

    /// `max(n) + 1` over ids shaped `{competition_id}_{n}`.
    pub fn next_club_number(&self, competition_id: &str) -> u64 {
        let prefix = format!("{}_", competition_id);
        self.teams
            .keys()
            .filter_map(|id| id.strip_prefix(&prefix))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1
    }

    /// First club record in the competition whose name or short name equals `base_name`.
    pub fn find_club_team(&self, competition_id: &str, base_name: &str) -> Option<&TeamRecord> {
        let base_name = base_name.trim();
        if base_name.is_empty() {
            return None;
        }
        self.teams_in(competition_id).into_iter().find(|t| {
            eq_ignore_case(&t.name, base_name)
                || (!t.short_name.is_empty() && eq_ignore_case(&t.short_name, base_name))
        })
    }

    /// Ids of records with exactly this display name, in any competition.
    pub fn ids_named(&self, name: &str) -> Vec<String> {
        self.teams
            .values()
            .filter(|t| t.name == name)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Fill empty logo fields, or replace third-party ones. Returns whether anything changed.
    pub fn refresh_logos(&mut self, id: &str, logo: &LogoInfo) -> bool {
        let Some(team) = self.teams.get_mut(id) else {
            return false;
        };
        let mut changed = false;
        if !logo.logo_url.is_empty()
            && team.logo_url != logo.logo_url
            && should_replace_logo(&team.logo_url)
        {
            team.logo_url = logo.logo_url.clone();
            changed = true;
        }
        let badge = if logo.badge_url.is_empty() {
            &logo.logo_url
        } else {
            &logo.badge_url
        };
        if !badge.is_empty() && &team.badge_url != badge && should_replace_logo(&team.badge_url) {
            team.badge_url = badge.clone();
            changed = true;
        }
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Set short names for teams whose id starts with `id_prefix`.
    ///
    /// `short_names` maps official name to short name; both sides are width
    /// normalised. A short name is only written when the current one is empty,
    /// a table header placeholder, or just the full name. Returns the number of
    /// records changed.
    pub fn apply_short_names(
        &mut self,
        id_prefix: &str,
        short_names: &HashMap<String, String>,
    ) -> usize {
        let lookup: HashMap<String, String> = short_names
            .iter()
            .map(|(official, short)| (nfkc_trim(official), nfkc_trim(short)))
            .filter(|(official, short)| !official.is_empty() && !short.is_empty())
            .collect();

        let mut updated = 0;
        for team in self.teams.values_mut() {
            if !team.id.starts_with(id_prefix) {
                continue;
            }
            let Some(short) = lookup.get(&nfkc_trim(&team.name)) else {
                continue;
            };
            let current = team.short_name.trim();
            let replaceable = current.is_empty()
                || SHORT_NAME_PLACEHOLDERS.contains(&current)
                || current == team.name.trim();
            if replaceable && current != short {
                debug!("Short name for {}: '{}' -> '{}'", team.id, current, short);
                team.short_name = short.clone();
                updated += 1;
            }
        }
        if updated > 0 {
            self.dirty = true;
        }
        updated
    }

    /// Drop every record. Only the explicit reset command calls this.
    pub fn clear(&mut self) -> usize {
        let removed = self.teams.len();
        self.teams.clear();
        self.dirty = true;
        removed
    }
}

/// Official logos overwrite empty fields and known third-party URLs only.
pub fn should_replace_logo(current: &str) -> bool {
    current.is_empty() || THIRD_PARTY_LOGO_HOSTS.iter().any(|host| current.contains(host))
}

// ============================================================================
// Tests
// ============================================================================
