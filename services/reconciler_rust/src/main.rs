mod config;

use crate::config::Config;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use fixture_rust_core::catalog::write_json_atomic;
use fixture_rust_core::competition_config::get_all_competition_configs;
use fixture_rust_core::duplicates::{analyze_catalog, detect_name_duplicates, UsageStats};
use fixture_rust_core::pipeline::backfill_team_ids;
use fixture_rust_core::{
    reconcile_batch, CompetitionCatalog, IdentityResolver, IssueKind, LogoCache, LogoInfo,
    MatchIdStrategy, NameNormalizer, RawMatch, RecordIssue, TeamCatalog,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Team identity and fixture reconciliation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enrich raw collector output and write match files
    Enrich {
        /// JSON array of raw match records
        #[arg(long)]
        input: PathBuf,
        /// Force one match id scheme (sequence | content_hash)
        #[arg(long)]
        strategy: Option<MatchIdStrategy>,
        /// Register unseen teams in the team master
        #[arg(long)]
        update_teams: bool,
        /// Resolve only; do not write match files
        #[arg(long)]
        dry_run: bool,
        /// Write the issue list here as JSON
        #[arg(long)]
        issues: Option<PathBuf>,
    },
    /// Fill missing team ids in existing match files
    Backfill {
        #[arg(long)]
        competition: Option<String>,
        /// Re-resolve ids that are already set
        #[arg(long)]
        force: bool,
    },
    /// Report duplicate team clusters with merge suggestions
    Duplicates {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Merge base competitions and refresh summaries from match files
    Competitions,
    /// Apply official logos: JSON object {name: {logo_url, badge_url}}
    Logos {
        #[arg(long)]
        competition: String,
        #[arg(long)]
        input: PathBuf,
    },
    /// Set short names: JSON object {official name: short name}
    ShortNames {
        /// Team id prefix, e.g. "jrlo-div1_"
        #[arg(long)]
        prefix: String,
        #[arg(long)]
        input: PathBuf,
    },
    /// Register an official roster: {"teams": [...], "logos": {...}}
    Roster {
        #[arg(long)]
        competition: String,
        #[arg(long)]
        input: PathBuf,
    },
    /// Delete every team record
    ResetTeams {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    teams: Vec<String>,
    #[serde(default)]
    logos: HashMap<String, LogoInfo>,
}

fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    info!("Data directory: {}", config.data_dir.display());

    match cli.command {
        Command::Enrich {
            input,
            strategy,
            update_teams,
            dry_run,
            issues,
        } => enrich(&config, &input, strategy, update_teams, dry_run, issues.as_deref()),
        Command::Backfill { competition, force } => {
            backfill(&config, competition.as_deref(), force)
        }
        Command::Duplicates { output } => duplicates(&config, output),
        Command::Competitions => competitions(&config),
        Command::Logos { competition, input } => logos(&config, &competition, &input),
        Command::ShortNames { prefix, input } => short_names(&config, &prefix, &input),
        Command::Roster { competition, input } => roster(&config, &competition, &input),
        Command::ResetTeams { yes } => reset_teams(&config, yes),
    }
}

fn read_input<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load_catalog(config: &Config) -> Result<TeamCatalog> {
    TeamCatalog::load(&config.teams_path)
        .with_context(|| format!("Failed to load team master {}", config.teams_path.display()))
}

fn load_logo_cache(config: &Config) -> Result<LogoCache> {
    let path = &config.logo_cache_path;
    LogoCache::load(path).with_context(|| format!("Failed to load logo cache {}", path.display()))
}

fn load_normalizer(config: &Config) -> Result<NameNormalizer> {
    let aliases = NameNormalizer::load_alias_file(&config.aliases_path)
        .with_context(|| format!("Failed to load aliases {}", config.aliases_path.display()))?;
    Ok(NameNormalizer::new().with_aliases(aliases))
}

fn log_issues(issues: &[RecordIssue]) {
    for issue in issues {
        warn!("{}", issue);
    }
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for issue in issues {
        *counts.entry(issue.kind.as_str()).or_insert(0) += 1;
    }
    for (kind, count) in counts {
        info!("{}: {}", kind, count);
    }
}

fn enrich(
    config: &Config,
    input: &Path,
    strategy: Option<MatchIdStrategy>,
    update_teams: bool,
    dry_run: bool,
    issues_path: Option<&Path>,
) -> Result<()> {
    let raws: Vec<RawMatch> = read_input(input)?;
    let mut catalog = load_catalog(config)?;
    let normalizer = load_normalizer(config)?;

    let mut names_by_competition: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for raw in &raws {
        let names = names_by_competition
            .entry(raw.competition_id.trim().to_string())
            .or_default();
        names.push(raw.home_team.trim().to_string());
        names.push(raw.away_team.trim().to_string());
    }
    for dup in detect_name_duplicates(&names_by_competition, &normalizer) {
        warn!(
            "Spelling variants in {} input: {:?} (suggest '{}')",
            dup.competition_id, dup.variations, dup.suggestion
        );
    }
    let logo_cache = load_logo_cache(config)?;

    let allow_mutation = (update_teams || config.update_team_master) && !dry_run;
    let mut resolver = IdentityResolver::new(normalizer, &catalog)
        .with_mutation(allow_mutation)
        .with_persist_mode(config.persist_mode)
        .with_logo_provider(Box::new(logo_cache));

    let matches_dir = (!dry_run).then_some(config.matches_dir.as_path());
    let report = reconcile_batch(&mut resolver, &mut catalog, &raws, strategy, matches_dir);

    log_issues(&report.issues);
    if let Some(path) = issues_path {
        write_json_atomic(path, &report.issues)
            .with_context(|| format!("Failed to write issues {}", path.display()))?;
    }
    info!(
        "Enriched {} matches, {} new teams, {} persistence failures",
        report.matches.len(),
        report.minted,
        report.count(IssueKind::PersistenceFailure)
    );
    Ok(())
}

fn backfill(config: &Config, competition: Option<&str>, force: bool) -> Result<()> {
    let catalog = load_catalog(config)?;
    let resolver = IdentityResolver::new(load_normalizer(config)?, &catalog);
    let summary = backfill_team_ids(&resolver, &catalog, &config.matches_dir, competition, force);

    log_issues(&summary.issues);
    info!(
        "Backfill: {} files scanned, {} updated, {} ids filled",
        summary.files_scanned, summary.files_updated, summary.ids_filled
    );
    Ok(())
}

fn duplicates(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let catalog = load_catalog(config)?;
    let (usage, usage_issues) = UsageStats::load_dir(&config.matches_dir);
    log_issues(&usage_issues);

    let report = analyze_catalog(&catalog, &usage, &load_normalizer(config)?);
    log_issues(&report.issues());

    let output = output.unwrap_or_else(|| config.duplicates_report_path.clone());
    write_json_atomic(&output, &report)
        .with_context(|| format!("Failed to write report {}", output.display()))?;
    info!(
        "{} duplicate groups ({} teams -> {} after merge), report: {}",
        report.summary.duplicate_groups,
        report.summary.total_teams,
        report.summary.teams_after_merge,
        output.display()
    );
    Ok(())
}

fn competitions(config: &Config) -> Result<()> {
    let mut catalog = CompetitionCatalog::load(&config.competitions_path).with_context(|| {
        format!(
            "Failed to load competitions {}",
            config.competitions_path.display()
        )
    })?;
    catalog.merge_base(get_all_competition_configs());
    let issues = catalog.refresh_summaries(&config.matches_dir);
    log_issues(&issues);

    catalog.save().context("Failed to save competitions")?;
    info!("Saved {} competitions", catalog.len());
    Ok(())
}

fn logos(config: &Config, competition: &str, input: &Path) -> Result<()> {
    let logos: HashMap<String, LogoInfo> = read_input(input)?;
    let mut catalog = load_catalog(config)?;
    let resolver = IdentityResolver::new(load_normalizer(config)?, &catalog);

    let changed = resolver.apply_official_logos(&mut catalog, competition, &logos);

    let mut cache = load_logo_cache(config)?;
    for (name, logo) in &logos {
        cache.insert(name, &LogoInfo::new(&logo.logo_url, &logo.badge_url));
    }
    cache.save().context("Failed to save logo cache")?;

    if changed > 0 {
        catalog.save().context("Failed to save team master")?;
    }
    info!("Updated logos on {} teams", changed);
    Ok(())
}

fn short_names(config: &Config, prefix: &str, input: &Path) -> Result<()> {
    let short_names: HashMap<String, String> = read_input(input)?;
    let mut catalog = load_catalog(config)?;
    let updated = catalog.apply_short_names(prefix, &short_names);
    if updated > 0 {
        catalog.save().context("Failed to save team master")?;
    }
    info!("Updated {} short names", updated);
    Ok(())
}

fn roster(config: &Config, competition: &str, input: &Path) -> Result<()> {
    let roster: RosterFile = read_input(input)?;
    let mut catalog = load_catalog(config)?;
    let mut resolver = IdentityResolver::new(load_normalizer(config)?, &catalog)
        .with_persist_mode(config.persist_mode);

    let summary = resolver.register_roster(&mut catalog, competition, &roster.teams, &roster.logos);
    if catalog.is_dirty() {
        catalog.save().context("Failed to save team master")?;
    }
    info!(
        "Roster {}: {} added, {} preserved, {} failed",
        competition, summary.added, summary.preserved, summary.failed
    );
    Ok(())
}

fn reset_teams(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to delete every team without --yes");
    }
    let mut catalog = load_catalog(config)?;
    let removed = catalog.clear();
    catalog.save().context("Failed to save team master")?;
    warn!("Removed {} teams from {}", removed, config.teams_path.display());
    Ok(())
}
