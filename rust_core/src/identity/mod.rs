//! Team identity resolution.
//!
//! This module provides:
//! - `IdentityResolver`: raw name + competition -> stable team id
//! - National scheme `NT_{category}_{code}[_{variant}]`, shared across the international group
//! - Club scheme `{competition_id}_{n}`, numbered per competition
//! - Official logo refresh and roster registration on top of resolution
//!
//! The resolver never owns the catalog. Callers pass the catalog they loaded
//! for the run, and minting only happens when mutation was explicitly allowed.

pub mod logos;

pub use logos::{LogoCache, LogoProvider, StaticLogos};

use crate::catalog::{PersistMode, TeamCatalog};
use crate::competition_config::{
    country_code, is_placeholder_team, national_category, NationalCategory,
};
use crate::error::IdentityError;
use crate::models::{LogoInfo, TeamRecord};
use crate::normalizer::{split_team_variant, NameNormalizer};
use crate::team_cache::BaseNameCache;
use crate::utils::names::eq_ignore_case;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Outcome of resolving one team name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub team_id: String,
    pub base_name: String,
    /// A new catalog record was created by this call
    pub minted: bool,
}

/// Counts from registering an official roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub added: usize,
    pub preserved: usize,
    pub failed: usize,
}

/// Where a base name lives, or would live, in the catalog.
enum Located {
    Existing(String),
    Vacant(String),
}

/// `NT_{category}_{code}` plus `_{variant}` for A sides, XVs and similar.
pub fn national_team_id(category: NationalCategory, code: &str, variant: Option<&str>) -> String {
    match variant {
        Some(variant) => format!("NT_{}_{}_{}", category.as_str(), code, variant),
        None => format!("NT_{}_{}", category.as_str(), code),
    }
}

pub fn club_team_id(competition_id: &str, number: u64) -> String {
    format!("{}_{}", competition_id, number)
}

pub struct IdentityResolver {
    normalizer: NameNormalizer,
    base_names: BaseNameCache,
    logos: Option<Box<dyn LogoProvider>>,
    allow_mutation: bool,
    persist: PersistMode,
}

impl IdentityResolver {
    /// Read-only resolver with a base-name cache built from `catalog`.
    pub fn new(normalizer: NameNormalizer, catalog: &TeamCatalog) -> Self {
        let base_names = BaseNameCache::from_records(catalog.iter());
        debug!("Base-name cache: {} names", base_names.len());
        Self {
            normalizer,
            base_names,
            logos: None,
            allow_mutation: false,
            persist: PersistMode::Deferred,
        }
    }

    /// Allow `resolve` to mint new team records.
    pub fn with_mutation(mut self, allow: bool) -> Self {
        self.allow_mutation = allow;
        self
    }

    pub fn with_persist_mode(mut self, mode: PersistMode) -> Self {
        self.persist = mode;
        self
    }

    /// Logos for newly minted club teams.
    pub fn with_logo_provider(mut self, provider: Box<dyn LogoProvider>) -> Self {
        self.logos = Some(provider);
        self
    }

    pub fn allows_mutation(&self) -> bool {
        self.allow_mutation
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn base_names(&self) -> &BaseNameCache {
        &self.base_names
    }

    pub fn normalize(&self, raw_name: &str, competition_id: &str) -> String {
        self.normalizer
            .normalize(raw_name, competition_id, &self.base_names)
    }

    /// Resolve without ever touching the catalog.
    pub fn lookup(
        &self,
        catalog: &TeamCatalog,
        raw_name: &str,
        competition_id: &str,
    ) -> Result<Resolution, IdentityError> {
        let base_name = self.base_name_for(raw_name, competition_id)?;
        match locate(catalog, &base_name, competition_id)? {
            Located::Existing(team_id) => Ok(Resolution {
                team_id,
                base_name,
                minted: false,
            }),
            Located::Vacant(_) => Err(IdentityError::NotInCatalog {
                name: base_name,
                competition_id: competition_id.to_string(),
            }),
        }
    }

    /// Resolve a raw name, minting a record when allowed and nothing matches.
    pub fn resolve(
        &mut self,
        catalog: &mut TeamCatalog,
        raw_name: &str,
        competition_id: &str,
    ) -> Result<Resolution, IdentityError> {
        let base_name = self.base_name_for(raw_name, competition_id)?;
        let team_id = match locate(catalog, &base_name, competition_id)? {
            Located::Existing(team_id) => {
                return Ok(Resolution {
                    team_id,
                    base_name,
                    minted: false,
                })
            }
            Located::Vacant(team_id) => team_id,
        };

        if !self.allow_mutation || competition_id.is_empty() {
            return Err(IdentityError::NotInCatalog {
                name: base_name,
                competition_id: competition_id.to_string(),
            });
        }

        let mut record = TeamRecord::new(&team_id, competition_id, &base_name);
        if national_category(competition_id).is_none() {
            if let Some(logo) = self.logo_for(raw_name, &base_name) {
                record = record.with_logo(&logo);
            }
        }
        self.mint(catalog, record)?;

        Ok(Resolution {
            team_id,
            base_name,
            minted: true,
        })
    }

    /// Team id or empty string. Failures are logged, never raised.
    pub fn resolve_id(
        &mut self,
        catalog: &mut TeamCatalog,
        raw_name: &str,
        competition_id: &str,
    ) -> String {
        match self.resolve(catalog, raw_name, competition_id) {
            Ok(resolution) => resolution.team_id,
            Err(e) => {
                warn!("Unresolved team '{}' ({}): {}", raw_name, competition_id, e);
                String::new()
            }
        }
    }

    /// Apply official logos to the competition's teams and to same-named teams elsewhere.
    ///
    /// Names are resolved read-only and applied in sorted order, so when two
    /// names reach the same team the first one wins. Only empty or third-party
    /// logo fields are overwritten. Returns the number of records changed.
    pub fn apply_official_logos(
        &self,
        catalog: &mut TeamCatalog,
        competition_id: &str,
        logos: &HashMap<String, LogoInfo>,
    ) -> usize {
        let mut names: Vec<&String> = logos.keys().collect();
        names.sort();

        let mut changed = 0;
        for name in names {
            let logo = &logos[name];
            let logo = LogoInfo::new(&logo.logo_url, &logo.badge_url);
            if name.trim().is_empty() || logo.is_empty() {
                continue;
            }

            let resolved = self.lookup(catalog, name, competition_id).ok();
            if let Some(resolution) = &resolved {
                if catalog.refresh_logos(&resolution.team_id, &logo) {
                    changed += 1;
                }
            }

            let same_named: Vec<String> = catalog
                .iter()
                .filter(|t| resolved.as_ref().map_or(true, |r| r.team_id != t.id))
                .filter(|t| eq_ignore_case(&t.name, name) || eq_ignore_case(&t.short_name, name))
                .map(|t| t.id.clone())
                .collect();
            for id in same_named {
                if catalog.refresh_logos(&id, &logo) {
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            info!("Official logos applied to {} teams ({})", changed, competition_id);
        }
        changed
    }

    /// Register every name from an official roster, minting as needed.
    ///
    /// Mutation is enabled for the duration of the call. Roster logos apply to
    /// new and existing records alike.
    pub fn register_roster(
        &mut self,
        catalog: &mut TeamCatalog,
        competition_id: &str,
        names: &[String],
        logos: &HashMap<String, LogoInfo>,
    ) -> RosterSummary {
        let previous = self.allow_mutation;
        self.allow_mutation = true;

        let mut summary = RosterSummary::default();
        for name in names {
            match self.resolve(catalog, name, competition_id) {
                Ok(resolution) => {
                    if resolution.minted {
                        summary.added += 1;
                    } else {
                        summary.preserved += 1;
                    }
                    if let Some(logo) = logos.get(name) {
                        let logo = LogoInfo::new(&logo.logo_url, &logo.badge_url);
                        catalog.refresh_logos(&resolution.team_id, &logo);
                    }
                }
                Err(e) => {
                    warn!("Roster entry '{}' ({}) not registered: {}", name, competition_id, e);
                    summary.failed += 1;
                }
            }
        }

        self.allow_mutation = previous;
        info!(
            "Roster {}: {} added, {} preserved, {} failed",
            competition_id, summary.added, summary.preserved, summary.failed
        );
        summary
    }

    fn base_name_for(&self, raw_name: &str, competition_id: &str) -> Result<String, IdentityError> {
        if raw_name.trim().is_empty() {
            return Err(IdentityError::EmptyName);
        }
        if is_placeholder_team(raw_name) {
            return Err(IdentityError::Placeholder(raw_name.trim().to_string()));
        }
        Ok(self.normalize(raw_name, competition_id))
    }

    fn logo_for(&self, raw_name: &str, base_name: &str) -> Option<LogoInfo> {
        let provider = self.logos.as_ref()?;
        provider
            .lookup(base_name)
            .or_else(|| provider.lookup(raw_name.trim()))
    }

    fn mint(&mut self, catalog: &mut TeamCatalog, record: TeamRecord) -> Result<(), IdentityError> {
        let team_id = record.id.clone();
        let competition_id = record.competition_id.clone();
        let name = record.name.clone();

        catalog
            .insert_new(record)
            .map_err(|source| IdentityError::Persistence {
                team_id: team_id.clone(),
                source,
            })?;

        if self.persist == PersistMode::Immediate {
            if let Err(source) = catalog.save() {
                catalog.rollback_insert(&team_id);
                warn!("Rolled back {} after failed save: {}", team_id, source);
                return Err(IdentityError::Persistence { team_id, source });
            }
        }

        // Later records in the same run see the new name during sponsor detection.
        self.base_names.insert(&competition_id, &name);
        info!("Registered team {} ({}) in {}", team_id, name, competition_id);
        Ok(())
    }
}

/// Compute the scheme's id for a base name and check whether it exists.
fn locate(
    catalog: &TeamCatalog,
    base_name: &str,
    competition_id: &str,
) -> Result<Located, IdentityError> {
    if let Some(category) = national_category(competition_id) {
        let (country, variant) = match split_team_variant(base_name) {
            Some(v) => (v.country, Some(v.id_suffix)),
            None => (base_name, None),
        };
        let code = country_code(country).ok_or_else(|| IdentityError::UnknownCountry {
            name: base_name.to_string(),
            competition_id: competition_id.to_string(),
        })?;
        let team_id = national_team_id(category, code, variant);
        return Ok(if catalog.contains(&team_id) {
            Located::Existing(team_id)
        } else {
            Located::Vacant(team_id)
        });
    }

    Ok(match catalog.find_club_team(competition_id, base_name) {
        Some(team) => Located::Existing(team.id.clone()),
        None => Located::Vacant(club_team_id(
            competition_id,
            catalog.next_club_number(competition_id),
        )),
    })
}

// ============================================================================
// Tests
// ============================================================================
