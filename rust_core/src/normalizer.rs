//! Team name normalization.
//!
//! This module provides:
//! - Per-competition alias resolution on NFKC/case/punctuation-insensitive keys
//! - National-side variant detection ("England A", "Italy XV")
//! - Dynamic sponsor detection against known base names
//! - Static sponsor-pattern fallback, accepted only when it lands on a known base name
//!
//! `normalize` never fails: a name nothing applies to comes back trimmed.

use crate::competition_config::{
    get_all_competition_configs, is_international, SPONSOR_PATTERNS, TEAM_VARIANT_SUFFIXES,
};
use crate::error::CatalogError;
use crate::team_cache::BaseNameCache;
use crate::utils::names::{
    alias_key, collapse_whitespace, eq_ignore_case, is_sponsor_affix, strip_base_prefix,
    strip_base_suffix,
};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Which rule produced a base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    Alias,
    Variant,
    KnownName,
    SponsorAffix,
    StaticPattern,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub base_name: String,
    pub rule: NameRule,
}

impl NormalizedName {
    fn new(base_name: impl Into<String>, rule: NameRule) -> Self {
        Self {
            base_name: base_name.into(),
            rule,
        }
    }
}

/// competition_id -> alias key -> official name
type AliasTables = HashMap<String, HashMap<String, String>>;

/// A variant suffix found on a national side's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamVariant<'a> {
    /// Name without the suffix ("England" for "England A")
    pub country: &'a str,
    /// Id suffix ("A", "XV", "Dev")
    pub id_suffix: &'static str,
}

/// Split `"England A"` into country and variant id suffix.
pub fn split_team_variant(name: &str) -> Option<TeamVariant<'_>> {
    let name = name.trim();
    let (head, last) = name.rsplit_once(char::is_whitespace)?;
    let head = head.trim_end();
    if head.is_empty() {
        return None;
    }
    TEAM_VARIANT_SUFFIXES
        .iter()
        .find(|(suffix, _)| suffix.eq_ignore_ascii_case(last))
        .map(|(_, id_suffix)| TeamVariant {
            country: head,
            id_suffix,
        })
}

/// Resolves raw team names to base names.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    aliases: AliasTables,
    sponsor_patterns: Vec<Regex>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NameNormalizer {
    /// Normalizer with the built-in alias tables and sponsor patterns.
    pub fn new() -> Self {
        let mut aliases: AliasTables = HashMap::new();
        for config in get_all_competition_configs() {
            for (raw, official) in config.team_aliases {
                aliases
                    .entry(config.competition_id.to_string())
                    .or_default()
                    .insert(alias_key(raw), official.to_string());
            }
        }

        let sponsor_patterns = SPONSOR_PATTERNS
            .iter()
            .filter_map(|pattern| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!("Skipping invalid sponsor pattern {}: {}", pattern, e);
                        None
                    }
                }
            })
            .collect();

        Self {
            aliases,
            sponsor_patterns,
        }
    }

    /// Merge extra aliases over the built-in tables.
    pub fn with_aliases(mut self, extra: HashMap<String, HashMap<String, String>>) -> Self {
        for (competition_id, table) in extra {
            let entry = self.aliases.entry(competition_id).or_default();
            for (raw, official) in table {
                let official = official.trim();
                if !official.is_empty() {
                    entry.insert(alias_key(&raw), official.to_string());
                }
            }
        }
        self
    }

    /// Load an alias override file: `{ "competition_id": { "raw name": "official name" } }`.
    /// A missing file yields no overrides.
    pub fn load_alias_file(
        path: &Path,
    ) -> Result<HashMap<String, HashMap<String, String>>, CatalogError> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| CatalogError::json(path, e))
    }

    /// Official name for `raw_name` in this competition's alias table.
    pub fn resolve_alias(&self, raw_name: &str, competition_id: &str) -> Option<&str> {
        self.aliases
            .get(competition_id)?
            .get(&alias_key(raw_name))
            .map(|s| s.as_str())
    }

    /// Base name for `raw_name` within `competition_id`.
    pub fn normalize(&self, raw_name: &str, competition_id: &str, known: &BaseNameCache) -> String {
        self.normalize_detailed(raw_name, competition_id, known).base_name
    }

    pub fn normalize_detailed(
        &self,
        raw_name: &str,
        competition_id: &str,
        known: &BaseNameCache,
    ) -> NormalizedName {
        let name = collapse_whitespace(raw_name);
        if name.is_empty() {
            return NormalizedName::new("", NameRule::Unchanged);
        }

        if let Some(official) = self.resolve_alias(&name, competition_id) {
            return NormalizedName::new(official, NameRule::Alias);
        }

        let international = is_international(competition_id);
        if international && split_team_variant(&name).is_some() {
            return NormalizedName::new(name, NameRule::Variant);
        }

        if let Some(found) = match_known_name(&name, &known.scope(competition_id)) {
            return found;
        }

        self.strip_static_sponsor(&name, competition_id, known)
            .unwrap_or_else(|| NormalizedName::new(name, NameRule::Unchanged))
    }

    /// Remove every static sponsor pattern, known base or not. Used for grouping only.
    pub fn strip_sponsor_text(&self, name: &str) -> String {
        let mut current = collapse_whitespace(name);
        for pattern in &self.sponsor_patterns {
            let candidate = pattern.replace(&current, "").trim().to_string();
            if !candidate.is_empty() {
                current = candidate;
            }
        }
        current
    }

    /// Apply sponsor patterns in order, keeping a strip only when it lands on a known name.
    fn strip_static_sponsor(
        &self,
        name: &str,
        competition_id: &str,
        known: &BaseNameCache,
    ) -> Option<NormalizedName> {
        let mut current = name.to_string();
        let mut stripped = false;
        for pattern in &self.sponsor_patterns {
            let candidate = pattern.replace(&current, "").trim().to_string();
            if candidate.is_empty() || candidate == current {
                continue;
            }
            if let Some(base) = known.find(competition_id, &candidate) {
                debug!("Static sponsor strip: '{}' -> '{}'", name, base);
                current = base.to_string();
                stripped = true;
            }
        }
        stripped.then(|| NormalizedName::new(current, NameRule::StaticPattern))
    }
}

/// Exact match first, then the longest base name the raw name wraps with sponsor text.
fn match_known_name(name: &str, scope: &BTreeSet<&str>) -> Option<NormalizedName> {
    let exact = scope.iter().find(|base| eq_ignore_case(base, name));
    if let Some(base) = exact {
        return Some(NormalizedName::new(*base, NameRule::KnownName));
    }

    let mut best: Option<&str> = None;
    for base in scope {
        let wraps = strip_base_prefix(name, base).is_some_and(is_sponsor_affix)
            || strip_base_suffix(name, base).is_some_and(is_sponsor_affix);
        if wraps && best.map_or(true, |b| base.len() > b.len()) {
            best = Some(*base);
        }
    }
    best.map(|base| NormalizedName::new(base, NameRule::SponsorAffix))
}

// ============================================================================
// Tests
// ============================================================================
