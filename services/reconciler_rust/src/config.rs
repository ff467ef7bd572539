use anyhow::{anyhow, Result};
use fixture_rust_core::PersistMode;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub teams_path: PathBuf,
    pub competitions_path: PathBuf,
    pub matches_dir: PathBuf,
    /// Optional alias override file
    pub aliases_path: PathBuf,
    pub logo_cache_path: PathBuf,
    pub duplicates_report_path: PathBuf,

    pub persist_mode: PersistMode,
    /// Allow enrichment runs to register new teams
    pub update_team_master: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

        let teams_path = path_env("TEAMS_PATH", data_dir.join("teams.json"));
        let competitions_path = path_env("COMPETITIONS_PATH", data_dir.join("competitions.json"));
        let matches_dir = path_env("MATCHES_DIR", data_dir.join("matches"));
        let aliases_path = path_env(
            "ALIASES_PATH",
            data_dir.join("config").join("team_aliases.json"),
        );
        let logo_cache_path = path_env(
            "LOGO_CACHE_PATH",
            data_dir.join("cache").join("team_logos.json"),
        );
        let duplicates_report_path = path_env(
            "DUPLICATES_REPORT_PATH",
            data_dir.join("team_duplicates_report.json"),
        );

        let persist_mode = parse_persist_mode_env("PERSIST_MODE", PersistMode::Deferred)?;
        let update_team_master = parse_bool_env("UPDATE_TEAM_MASTER", false);

        Ok(Self {
            data_dir,
            teams_path,
            competitions_path,
            matches_dir,
            aliases_path,
            logo_cache_path,
            duplicates_report_path,
            persist_mode,
            update_team_master,
        })
    }
}

fn path_env(key: &str, default: PathBuf) -> PathBuf {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"))
        .unwrap_or(default)
}

fn parse_persist_mode_env(key: &str, default: PersistMode) -> Result<PersistMode> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .parse::<PersistMode>()
            .map_err(|e| anyhow!("Invalid {key}: {e} (expected deferred|immediate)")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_env_default() {
        let default = PathBuf::from("data/teams.json");
        assert_eq!(
            path_env("RECONCILER_TEST_UNSET_PATH", default.clone()),
            default
        );
    }

    #[test]
    fn test_parse_bool_env_default() {
        assert!(parse_bool_env("RECONCILER_TEST_UNSET_BOOL", true));
        assert!(!parse_bool_env("RECONCILER_TEST_UNSET_BOOL", false));
    }

    #[test]
    fn test_persist_mode_default() {
        assert_eq!(
            parse_persist_mode_env("RECONCILER_TEST_UNSET_MODE", PersistMode::Deferred).unwrap(),
            PersistMode::Deferred
        );
    }
}
