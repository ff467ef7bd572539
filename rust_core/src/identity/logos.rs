//! Logo lookup capability injected into the resolver.
//!
//! This module provides:
//! - `LogoProvider`: `lookup(name) -> Option<LogoInfo>`
//! - `StaticLogos`: in-memory table, e.g. logos scraped from an official site
//! - `LogoCache`: JSON file of previously fetched logos keyed by team name
//!
//! Nothing here touches the network. Fetching and resizing images belongs
//! to the collectors that fill these providers.

use crate::catalog::{read_json, write_json_atomic};
use crate::error::CatalogError;
use crate::models::LogoInfo;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::debug;

pub trait LogoProvider {
    /// Logo pair for a team display name, if this provider knows it.
    fn lookup(&self, name: &str) -> Option<LogoInfo>;
}

/// Fixed name -> logo table.
#[derive(Debug, Clone, Default)]
pub struct StaticLogos {
    logos: HashMap<String, LogoInfo>,
}

impl StaticLogos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, logo: LogoInfo) {
        if !logo.is_empty() {
            self.logos.insert(name.trim().to_string(), logo);
        }
    }

    pub fn len(&self) -> usize {
        self.logos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logos.is_empty()
    }
}

impl FromIterator<(String, LogoInfo)> for StaticLogos {
    fn from_iter<I: IntoIterator<Item = (String, LogoInfo)>>(iter: I) -> Self {
        let mut logos = StaticLogos::new();
        for (name, logo) in iter {
            logos.insert(&name, logo);
        }
        logos
    }
}

impl LogoProvider for StaticLogos {
    fn lookup(&self, name: &str) -> Option<LogoInfo> {
        self.logos.get(name.trim()).cloned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLogo {
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub badge_url: String,
    #[serde(default)]
    pub fetched_at: String,
}

/// File-backed logo cache: `{ "team name": {logo_url, badge_url, fetched_at} }`.
#[derive(Debug, Clone)]
pub struct LogoCache {
    path: PathBuf,
    entries: BTreeMap<String, CachedLogo>,
}

impl LogoCache {
    /// Load the cache. A missing file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let entries = read_json(&path)?.unwrap_or_default();
        Ok(Self { path, entries })
    }

    /// Record a fetched logo, stamped with the current UTC time. Empty pairs are not cached.
    pub fn insert(&mut self, name: &str, logo: &LogoInfo) {
        if logo.is_empty() {
            return;
        }
        debug!("Caching logo for {}", name);
        self.entries.insert(
            name.trim().to_string(),
            CachedLogo {
                logo_url: logo.logo_url.clone(),
                badge_url: logo.badge_url.clone(),
                fetched_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&CachedLogo> {
        self.entries.get(name.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self) -> Result<(), CatalogError> {
        write_json_atomic(&self.path, &self.entries)
    }
}

impl LogoProvider for LogoCache {
    fn lookup(&self, name: &str) -> Option<LogoInfo> {
        self.get(name)
            .map(|cached| LogoInfo::new(&cached.logo_url, &cached.badge_url))
            .filter(|logo| !logo.is_empty())
    }
}
