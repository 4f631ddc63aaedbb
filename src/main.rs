//! approachspeed CLI
//!
//! Computes approach speeds for the active aircraft profile and pulls gust
//! information out of METAR/TAF pages.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use approachspeed::performance::ConfigKey;
use approachspeed::weather::client::normalize_station;
use approachspeed::{
    Action, AircraftProfile, AppConfig, AppError, AppState, PerformanceReport, ProfileStore,
    WeatherClient, WeatherReport, logging, parse_report, select_active,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

#[derive(Parser)]
#[command(name = "approachspeed", version)]
#[command(about = "Aircraft approach speed calculator with METAR/TAF gust extraction", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stall, approach and maneuvering speeds for a weight
    Speeds(SpeedsArgs),
    /// METAR and TAF for a station
    Weather(WeatherArgs),
    /// Weather plus speeds with the METAR gust factor applied
    Brief(BriefArgs),
    /// Manage aircraft profiles
    #[command(subcommand)]
    Profiles(ProfilesCommand),
}

#[derive(Args)]
struct SpeedsArgs {
    /// Profile id (defaults to the active profile)
    #[arg(long)]
    profile: Option<String>,

    /// Gross weight in pounds (defaults to the profile's maximum)
    #[arg(long, conflicts_with = "preset")]
    weight: Option<f64>,

    /// Weight preset label, e.g. "Solo"
    #[arg(long)]
    preset: Option<String>,

    /// Gust factor in knots
    #[arg(long)]
    gust_factor: Option<f64>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct WeatherArgs {
    /// ICAO station code
    #[arg(long)]
    station: Option<String>,

    /// Parse a saved weather page instead of fetching it
    #[arg(long)]
    html: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BriefArgs {
    /// ICAO station code
    #[arg(long)]
    station: Option<String>,

    /// Profile id (defaults to the active profile)
    #[arg(long)]
    profile: Option<String>,

    /// Gross weight in pounds (defaults to the profile's maximum)
    #[arg(long)]
    weight: Option<f64>,

    /// Parse a saved weather page instead of fetching it
    #[arg(long)]
    html: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// List stored profiles
    List,
    /// Print a profile as JSON
    Show { id: Option<String> },
    /// Add or replace a profile from a JSON file
    Import { file: PathBuf },
    /// Print a profile as JSON for editing and re-import
    Export { id: String },
    /// Make a profile the active one
    Select { id: String },
    /// Delete a profile
    Remove { id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        debug!("{err:?}");
        match err.downcast_ref::<AppError>() {
            Some(app_err) => eprintln!("Error: {}", app_err.user_message()),
            None => eprintln!("Error: {err:#}"),
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load_from_path(cli.config.clone())?;
    logging::init_logging(&config.logging, cli.verbose);
    debug!("Using store at {}", config.store.location);

    match cli.command {
        Command::Speeds(args) => handle_speeds(&config, args).await,
        Command::Weather(args) => handle_weather(&config, args).await,
        Command::Brief(args) => handle_brief(&config, args).await,
        Command::Profiles(command) => handle_profiles(&config, command).await,
    }
}

/// Calculator state seeded from the store, with `profile` taking precedence
/// over the stored active profile.
async fn load_state(config: &AppConfig, profile: Option<&str>) -> Result<AppState> {
    let store = ProfileStore::open(config.store_path())?;
    let profiles = store.load_profiles().await?;
    let stored_active = store.active_profile_id().await?;

    let state = AppState::new(profiles, profile.or(stored_active.as_deref()));
    if let Some(id) = profile {
        if state.active_profile_id() != id {
            return Err(AppError::validation(format!("Unknown profile '{id}'")).into());
        }
    }
    Ok(state.reduce(Action::SetGustFactor(config.defaults.gust_factor)))
}

fn resolve_station(station: Option<String>, config: &AppConfig) -> Result<String> {
    let station = station
        .or_else(|| config.weather.default_station.clone())
        .ok_or_else(|| AppError::validation("No station given and no default station configured"))?;
    Ok(normalize_station(&station)?)
}

async fn load_report(config: &AppConfig, station: &str, html: Option<PathBuf>) -> Result<WeatherReport> {
    match html {
        Some(path) => {
            let page = fs::read_to_string(&path).map_err(|e| AppError::io(&path, e))?;
            Ok(parse_report(&page, station))
        }
        None => {
            let client = WeatherClient::new(&config.weather)?;
            Ok(client.fetch_report(station).await?)
        }
    }
}

async fn handle_speeds(config: &AppConfig, args: SpeedsArgs) -> Result<()> {
    let mut state = load_state(config, args.profile.as_deref()).await?;

    if let Some(label) = args.preset {
        if state.active_profile().preset(&label).is_none() {
            return Err(AppError::validation(format!(
                "Profile '{}' has no preset '{label}'",
                state.active_profile_id()
            ))
            .into());
        }
        state = state.reduce(Action::ApplyPreset(label));
    }
    if let Some(weight) = args.weight {
        state = state.reduce(Action::SetWeight(weight));
    }
    if let Some(gust_factor) = args.gust_factor {
        state = state.reduce(Action::SetGustFactor(gust_factor));
    }

    let report = state.performance();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_performance(state.active_profile(), &report));
    }
    Ok(())
}

async fn handle_weather(config: &AppConfig, args: WeatherArgs) -> Result<()> {
    let station = resolve_station(args.station, config)?;
    let report = load_report(config, &station, args.html).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_weather(&report, select_active(&report.taf, Utc::now())));
    }
    Ok(())
}

async fn handle_brief(config: &AppConfig, args: BriefArgs) -> Result<()> {
    let station = resolve_station(args.station, config)?;
    let report = load_report(config, &station, args.html).await?;
    let mut state = load_state(config, args.profile.as_deref()).await?;

    let gust_factor = report.metar_gust_factor().unwrap_or(0);
    state = state.reduce(Action::SetGustFactor(f64::from(gust_factor)));
    if let Some(weight) = args.weight {
        state = state.reduce(Action::SetWeight(weight));
    }

    print!("{}", render_weather(&report, select_active(&report.taf, Utc::now())));
    println!();
    print!("{}", render_performance(state.active_profile(), &state.performance()));
    Ok(())
}

async fn handle_profiles(config: &AppConfig, command: ProfilesCommand) -> Result<()> {
    let store = ProfileStore::open(config.store_path())?;

    match command {
        ProfilesCommand::List => {
            let profiles = store.load_profiles().await?;
            let state = AppState::new(profiles, store.active_profile_id().await?.as_deref());
            for profile in state.profiles() {
                let marker = if profile.id == state.active_profile_id() { "*" } else { " " };
                let range = profile
                    .weight_range()
                    .map(|(lo, hi)| format!("{lo:.0}-{hi:.0} lb"))
                    .unwrap_or_default();
                println!("{marker} {:<16} {:<24} {range}", profile.id, profile.name);
            }
        }
        ProfilesCommand::Show { id } => {
            let profiles = store.load_profiles().await?;
            let state = AppState::new(profiles, store.active_profile_id().await?.as_deref());
            let profile = match id {
                Some(id) => find_profile(state.profiles(), &id)?,
                None => state.active_profile(),
            };
            println!("{}", serde_json::to_string_pretty(profile)?);
        }
        ProfilesCommand::Export { id } => {
            let profiles = store.load_profiles().await?;
            println!("{}", serde_json::to_string_pretty(find_profile(&profiles, &id)?)?);
        }
        ProfilesCommand::Import { file } => {
            let json = fs::read_to_string(&file).map_err(|e| AppError::io(&file, e))?;
            let mut profile: AircraftProfile = serde_json::from_str(&json)
                .map_err(|e| AppError::validation(format!("Invalid profile JSON: {e}")))?;
            profile.sort_samples();
            let id = profile.id.clone();
            store.upsert_profile(profile).await?;
            println!("Imported profile '{id}'");
        }
        ProfilesCommand::Select { id } => {
            store.set_active_profile_id(&id).await?;
            println!("Active profile: {id}");
        }
        ProfilesCommand::Remove { id } => {
            store.remove_profile(&id).await?;
            println!("Removed profile '{id}'");
        }
    }
    Ok(())
}

fn find_profile<'a>(profiles: &'a [AircraftProfile], id: &str) -> Result<&'a AircraftProfile> {
    profiles
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::validation(format!("Unknown profile '{id}'")).into())
}

fn render_performance(profile: &AircraftProfile, report: &PerformanceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} at {:.0} lb, gust factor {:.0} kt",
        profile.name, report.weight, report.gust_factor
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  {:<22} {:>6} {:>9}", "Configuration", "Stall", "Approach");

    for descriptor in &profile.configurations {
        let marker = if descriptor.highlight { "*" } else { " " };
        let label = format!("{} ({})", descriptor.label, descriptor.sub_label);
        let stall = report.stall_speed(descriptor.key).unwrap_or(0.0);
        let approach = report.approach_speed(descriptor.key).unwrap_or(0.0);
        let _ = writeln!(out, "{marker} {label:<22} {stall:>6.0} {approach:>9.0}");
    }

    let _ = writeln!(out);
    let clean = report.stall_speed(ConfigKey::Clean).unwrap_or(0.0);
    let _ = writeln!(
        out,
        "Maneuvering speed: {:.0} kt ({:+.0} kt over clean stall {clean:.0} kt)",
        report.maneuvering_speed, report.maneuvering_buffer
    );
    out
}

fn render_weather(report: &WeatherReport, active: Option<usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Station {}", report.station);

    match &report.metar {
        Some(metar) => {
            let _ = writeln!(out, "METAR  {metar}");
            match report.metar_gust {
                Some(gust) => {
                    let _ = writeln!(out, "       gust {gust} kt");
                }
                None => {
                    let _ = writeln!(out, "       no gust reported");
                }
            }
        }
        None => {
            let _ = writeln!(out, "METAR  not available");
        }
    }

    if report.taf.is_empty() {
        let _ = writeln!(out, "TAF    not available");
    } else {
        let _ = writeln!(out, "TAF");
        for (index, entry) in report.taf.iter().enumerate() {
            let marker = if Some(index) == active { ">" } else { " " };
            let _ = writeln!(out, "  {marker} {entry}");
        }
    }
    out
}
