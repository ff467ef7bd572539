//! Competition configuration for supported fixture sources.
//!
//! This module provides:
//! - Static configuration for all supported competitions
//! - International grouping and national-team category per competition
//! - Country-code, sponsor-pattern and alias rule tables

use crate::match_id::MatchIdStrategy;
use serde::{Deserialize, Serialize};

/// National-team category shared by every competition in the same age/gender group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NationalCategory {
    M,
    W,
    U20,
}

impl NationalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NationalCategory::M => "M",
            NationalCategory::W => "W",
            NationalCategory::U20 => "U20",
        }
    }
}

/// Which id scheme a competition's teams fall under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompetitionScope {
    /// National sides, shared across every international competition
    International(NationalCategory),
    /// Club sides, numbered per competition
    Club,
}

impl CompetitionScope {
    pub fn category(&self) -> &'static str {
        match self {
            CompetitionScope::International(_) => "international",
            CompetitionScope::Club => "club",
        }
    }
}

/// Configuration for a single competition.
#[derive(Debug, Clone)]
pub struct CompetitionConfig {
    /// Competition id (e.g., "m6n", "premier")
    pub competition_id: &'static str,
    pub name: &'static str,
    pub short_name: &'static str,
    pub scope: CompetitionScope,
    /// "men", "women" or "mixed"
    pub gender: &'static str,
    /// Zone applied when a source gives no timezone hint
    pub default_timezone: &'static str,
    /// Match id scheme used when the collector does not pick one
    pub match_ids: MatchIdStrategy,
    pub official_sites: &'static [&'static str],
    /// Raw/alternate name -> official name
    pub team_aliases: &'static [(&'static str, &'static str)],
}

/// Static configuration for all supported competitions.
pub static COMPETITION_CONFIGS: &[CompetitionConfig] = &[
    // International
    CompetitionConfig {
        competition_id: "m6n",
        name: "Six Nations",
        short_name: "6N",
        scope: CompetitionScope::International(NationalCategory::M),
        gender: "men",
        default_timezone: "Europe/London",
        match_ids: MatchIdStrategy::ContentHash,
        official_sites: &["https://www.sixnationsrugby.com"],
        team_aliases: &[],
    },
    CompetitionConfig {
        competition_id: "w6n",
        name: "Women's Six Nations",
        short_name: "W6N",
        scope: CompetitionScope::International(NationalCategory::W),
        gender: "women",
        default_timezone: "Europe/London",
        match_ids: MatchIdStrategy::ContentHash,
        official_sites: &["https://www.sixnationsrugby.com"],
        team_aliases: &[],
    },
    CompetitionConfig {
        competition_id: "u6n",
        name: "Six Nations U20",
        short_name: "U20 6N",
        scope: CompetitionScope::International(NationalCategory::U20),
        gender: "men",
        default_timezone: "Europe/London",
        match_ids: MatchIdStrategy::ContentHash,
        official_sites: &["https://www.sixnationsrugby.com"],
        team_aliases: &[],
    },
    CompetitionConfig {
        competition_id: "trc",
        name: "The Rugby Championship",
        short_name: "TRC",
        scope: CompetitionScope::International(NationalCategory::M),
        gender: "men",
        default_timezone: "UTC",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://www.sanzaar.com"],
        team_aliases: &[],
    },
    CompetitionConfig {
        competition_id: "ans",
        name: "Autumn Nations Series",
        short_name: "ANS",
        scope: CompetitionScope::International(NationalCategory::M),
        gender: "men",
        default_timezone: "Europe/London",
        match_ids: MatchIdStrategy::ContentHash,
        official_sites: &["https://autumnnationsseries.com"],
        team_aliases: &[],
    },
    CompetitionConfig {
        competition_id: "wr",
        name: "World Rugby Internationals",
        short_name: "WR Internationals",
        scope: CompetitionScope::International(NationalCategory::M),
        gender: "mixed",
        default_timezone: "UTC",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://www.world.rugby"],
        team_aliases: &[],
    },
    // Europe
    CompetitionConfig {
        competition_id: "epcr-champions",
        name: "EPCR Champions Cup",
        short_name: "Champions Cup",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Europe/Paris",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://www.epcrugby.com/champions-cup"],
        team_aliases: &[
            ("Bayonne", "Aviron Bayonnais"),
            ("Bordeaux-Begles", "Union Bordeaux Bègles"),
            ("Clermont Auvergne", "ASM Clermont Auvergne"),
            ("La Rochelle", "Stade Rochelais"),
            ("Pau", "Section Paloise"),
            ("Toulon", "RC Toulon"),
            ("Toulouse", "Stade Toulousain"),
            ("Stade Francais Paris", "Stade Français Paris"),
        ],
    },
    CompetitionConfig {
        competition_id: "epcr-challenge",
        name: "EPCR Challenge Cup",
        short_name: "Challenge Cup",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Europe/Paris",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://www.epcrugby.com/challenge-cup"],
        team_aliases: &[
            ("Lyon O.U.", "Lyon Olympique Universitaire"),
            ("Montauban", "US Montauban"),
            ("Montpellier", "Montpellier Hérault Rugby"),
            ("Perpignan", "USAP"),
            ("Stade Francais Paris", "Stade Français Paris"),
        ],
    },
    CompetitionConfig {
        competition_id: "t14",
        name: "Top 14",
        short_name: "Top 14",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Europe/Paris",
        match_ids: MatchIdStrategy::ContentHash,
        official_sites: &["https://top14.lnr.fr"],
        team_aliases: &[],
    },
    CompetitionConfig {
        competition_id: "premier",
        name: "Gallagher Premiership",
        short_name: "Premiership",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Europe/London",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://www.premiershiprugby.com"],
        team_aliases: &[],
    },
    CompetitionConfig {
        competition_id: "urc",
        name: "United Rugby Championship",
        short_name: "URC",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Europe/London",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://www.unitedrugby.com"],
        team_aliases: &[],
    },
    // Japan
    CompetitionConfig {
        competition_id: "jrlo-div1",
        name: "Japan Rugby League One Division 1",
        short_name: "JRLO D1",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Asia/Tokyo",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://league-one.jp"],
        team_aliases: &[
            ("埼玉ワイルドナイツ", "埼玉パナソニックワイルドナイツ"),
            ("東京サンゴリアス", "東京サントリーサンゴリアス"),
        ],
    },
    CompetitionConfig {
        competition_id: "jrlo-div2",
        name: "Japan Rugby League One Division 2",
        short_name: "JRLO D2",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Asia/Tokyo",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://league-one.jp"],
        team_aliases: &[],
    },
    CompetitionConfig {
        competition_id: "jrlo-div3",
        name: "Japan Rugby League One Division 3",
        short_name: "JRLO D3",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Asia/Tokyo",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://league-one.jp"],
        team_aliases: &[("スカイアクティブズ広島", "マツダスカイアクティブズ広島")],
    },
    // Oceania
    CompetitionConfig {
        competition_id: "srp",
        name: "Super Rugby Pacific",
        short_name: "SRP",
        scope: CompetitionScope::Club,
        gender: "men",
        default_timezone: "Pacific/Auckland",
        match_ids: MatchIdStrategy::Sequence,
        official_sites: &["https://super.rugby"],
        // Official site prints names in capitals
        team_aliases: &[
            ("BLUES", "Blues"),
            ("BRUMBIES", "Brumbies"),
            ("CHIEFS", "Chiefs"),
            ("CRUSADERS", "Crusaders"),
            ("FIJIAN DRUA", "Fijian Drua"),
            ("FORCE", "Western Force"),
            ("HIGHLANDERS", "Highlanders"),
            ("HURRICANES", "Hurricanes"),
            ("MOANA PASIFIKA", "Moana Pasifika"),
            ("REDS", "Queensland Reds"),
            ("WARATAHS", "NSW Waratahs"),
        ],
    },
];

/// Country name -> 3-letter code used in national team ids.
pub static COUNTRY_CODES: &[(&str, &str)] = &[
    // Six Nations
    ("England", "ENG"),
    ("France", "FRA"),
    ("Ireland", "IRE"),
    ("Italy", "ITA"),
    ("Scotland", "SCO"),
    ("Wales", "WAL"),
    // Rugby Championship
    ("Argentina", "ARG"),
    ("Australia", "AUS"),
    ("New Zealand", "NZL"),
    ("South Africa", "RSA"),
    // Other tier-1/tier-2 nations
    ("Japan", "JPN"),
    ("Fiji", "FIJ"),
    ("USA", "USA"),
    ("United States", "USA"),
    ("Chile", "CHI"),
    ("Georgia", "GEO"),
    ("Portugal", "POR"),
    ("Spain", "ESP"),
    ("Romania", "ROU"),
    ("Samoa", "SAM"),
    ("Tonga", "TGA"),
    ("Uruguay", "URU"),
    ("Canada", "CAN"),
    ("Namibia", "NAM"),
];

/// Sponsor prefixes/suffixes stripped only when the result is an already known base name.
/// Applied in order, case-insensitively.
pub static SPONSOR_PATTERNS: &[&str] = &[
    // Leading sponsor
    r"^DHL\s+",
    r"^ISUZU\s+",
    r"^GALLAGHER\s+",
    r"^Hollywoodbets\s+",
    r"^Vodacom\s+",
    // Trailing sponsor
    r"\s+GIO$",
    r"\s+HBF$",
    r"\s+FMG$",
    r"\s+SKY$",
    r"\s+DHL$",
    r"\s+ISUZU$",
    r"\s+GALLAGHER$",
    r"\s+4R$",
    r"\s+FOUR\s+R$",
    r"\s+CHURCHILL$",
    r"\s+MCLEAN$",
    r"\s+HIF$",
    r"\s+HFC\s+BANK$",
];

/// National side variants kept as distinct entities: (name suffix, id suffix).
pub static TEAM_VARIANT_SUFFIXES: &[(&str, &str)] = &[
    ("A", "A"),
    ("XV", "XV"),
    ("Barbarians", "Barbarians"),
    ("Development", "Dev"),
];

/// Fixture slots published before the participants are known.
pub static PLACEHOLDER_TEAM_NAMES: &[&str] = &["リーグ戦", "準々決勝", "準決勝", "決勝"];

/// Get competition configuration by id.
pub fn get_competition_config(competition_id: &str) -> Option<&'static CompetitionConfig> {
    COMPETITION_CONFIGS
        .iter()
        .find(|c| c.competition_id.eq_ignore_ascii_case(competition_id))
}

/// Get all competition configurations.
pub fn get_all_competition_configs() -> &'static [CompetitionConfig] {
    COMPETITION_CONFIGS
}

/// Get list of all competition ids.
pub fn get_all_competition_ids() -> Vec<&'static str> {
    COMPETITION_CONFIGS.iter().map(|c| c.competition_id).collect()
}

/// Scope of a competition. Unknown competitions are treated as club competitions.
pub fn competition_scope(competition_id: &str) -> CompetitionScope {
    get_competition_config(competition_id)
        .map(|c| c.scope)
        .unwrap_or(CompetitionScope::Club)
}

pub fn national_category(competition_id: &str) -> Option<NationalCategory> {
    match competition_scope(competition_id) {
        CompetitionScope::International(category) => Some(category),
        CompetitionScope::Club => None,
    }
}

pub fn is_international(competition_id: &str) -> bool {
    national_category(competition_id).is_some()
}

/// Ids of every competition in the international group.
pub fn international_competition_ids() -> Vec<&'static str> {
    COMPETITION_CONFIGS
        .iter()
        .filter(|c| matches!(c.scope, CompetitionScope::International(_)))
        .map(|c| c.competition_id)
        .collect()
}

pub fn default_timezone(competition_id: &str) -> Option<&'static str> {
    get_competition_config(competition_id).map(|c| c.default_timezone)
}

/// Look up a country code by country name or by the code itself, ignoring case.
pub fn country_code(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let upper = name.to_uppercase();
    COUNTRY_CODES
        .iter()
        .find(|(country, code)| country.to_uppercase() == upper || *code == upper)
        .map(|(_, code)| *code)
}

pub fn is_placeholder_team(name: &str) -> bool {
    let name = name.trim();
    PLACEHOLDER_TEAM_NAMES.iter().any(|p| *p == name)
}

// ============================================================================
// Tests
// ============================================================================
