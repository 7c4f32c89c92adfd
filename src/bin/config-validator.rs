//! # Tracker Configuration Validator
//!
//! Command-line tool for validating tracker configuration files across
//! environments before a node starts.

use clap::{Parser, Subcommand, ValueEnum};
use optracker_core::config::{ConfigManager, TrackerConfig};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate operation tracker configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long, env = "TRACKER_ENV", default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long, env = "TRACKER_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format for `show`
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate all configuration sections
    All,

    /// Validate one configuration section
    Component {
        /// Section name (deployment, polling, provisioning, scheduler, database)
        name: String,
    },

    /// List environments with an override file
    Environments,

    /// Print the effective configuration
    Show,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::All) | None => validate_all_config(&cli),
        Some(Commands::Component { name }) => validate_component(&cli, name),
        Some(Commands::Environments) => list_environments(&cli),
        Some(Commands::Show) => show_config(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn config_directory(cli: &Cli) -> PathBuf {
    cli.config_dir
        .clone()
        .unwrap_or_else(ConfigManager::default_config_directory)
}

fn load(cli: &Cli) -> Result<std::sync::Arc<ConfigManager>, Box<dyn std::error::Error>> {
    let manager =
        ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)?;
    Ok(manager)
}

fn validate_all_config(cli: &Cli) -> CliResult {
    println!("🔧 Validating Tracker Configuration");
    println!("Environment: {}", cli.environment);
    println!("Config Directory: {}", config_directory(cli).display());
    println!();

    let manager = match load(cli) {
        Ok(manager) => {
            println!("✅ Configuration loaded and validated");
            manager
        }
        Err(e) => {
            println!("❌ Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let config = manager.config();
    validate_deployment_config(config)?;
    validate_polling_config(config)?;
    validate_provisioning_config(config)?;
    validate_scheduler_config(config)?;
    validate_database_config(config)?;

    println!("\n🎉 All configuration validation checks passed!");
    Ok(())
}

fn validate_component(cli: &Cli, component_name: &str) -> CliResult {
    println!("🔧 Validating Component: {}", component_name);

    let manager = load(cli)?;
    let config = manager.config();

    match component_name.to_lowercase().as_str() {
        "deployment" | "deployment_mode" | "deployment-mode" => validate_deployment_config(config)?,
        "polling" => validate_polling_config(config)?,
        "provisioning" => validate_provisioning_config(config)?,
        "scheduler" => validate_scheduler_config(config)?,
        "database" => validate_database_config(config)?,
        _ => {
            return Err(format!("Unknown component: {}", component_name).into());
        }
    }

    println!("✅ Component '{}' validation passed!", component_name);
    Ok(())
}

fn list_environments(cli: &Cli) -> CliResult {
    println!("📋 Available Environments:");

    let dir = config_directory(cli);
    if !dir.is_dir() {
        println!("❌ Configuration directory not found: {}", dir.display());
        return Ok(());
    }

    let mut environments = environment_names(&dir)?;
    environments.sort();

    if environments.is_empty() {
        println!("  (no tracker.<env>.toml overrides)");
    }
    for env in environments {
        println!("  • {}", env);
    }

    Ok(())
}

/// `tracker.<env>.toml` file names in `dir`, reduced to `<env>`
fn environment_names(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if let Some(env) = name
            .strip_prefix("tracker.")
            .and_then(|rest| rest.strip_suffix(".toml"))
        {
            names.push(env.to_string());
        }
    }
    Ok(names)
}

fn show_config(cli: &Cli) -> CliResult {
    let manager = load(cli)?;
    let config = manager.config();

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Table => {
            println!("📁 Effective Configuration ({})", manager.environment());
            println!("  node_id                               {}", config.node_id);
            println!("  deployment_mode                       {}", config.deployment_mode);
            println!("  polling.enabled                       {}", config.polling.enabled);
            println!("  polling.interval_seconds              {}", config.polling.interval_seconds);
            println!(
                "  polling.first_poll_delay_seconds      {}",
                config.polling.first_poll_delay_seconds
            );
            println!("  provisioning.enabled                  {}", config.provisioning.enabled);
            println!(
                "  provisioning.initial_recheck_seconds  {}",
                config.provisioning.initial_recheck_seconds
            );
            println!(
                "  provisioning.retry_interval_seconds   {}",
                config.provisioning.retry_interval_seconds
            );
            println!(
                "  provisioning.default_region           {}",
                config.provisioning.default_region.as_deref().unwrap_or("-")
            );
            println!(
                "  scheduler.action_channel_capacity     {}",
                config.scheduler.action_channel_capacity
            );
            println!(
                "  database.max_connections              {}",
                config.database.max_connections
            );
        }
    }

    Ok(())
}

// Component validation functions

fn validate_deployment_config(config: &TrackerConfig) -> CliResult {
    println!("🚦 Validating Deployment Mode...");
    println!("   ✅ Mode: {}", config.deployment_mode);

    if config.deployment_mode.is_disabled() {
        warn!("   ⚠️  Tracker is disabled - launches will be rejected");
    }
    if !config.polling_active() && !config.push_active() && !config.deployment_mode.is_disabled() {
        return Err("Neither polling nor push delivery is active; operations would never resolve".into());
    }

    println!("   ✅ Polling active: {}", config.polling_active());
    println!("   ✅ Push delivery active: {}", config.push_active());
    Ok(())
}

fn validate_polling_config(config: &TrackerConfig) -> CliResult {
    println!("⏱️  Validating Polling Configuration...");

    if !config.polling.enabled {
        println!("   ℹ️  Polling disabled");
        return Ok(());
    }

    println!(
        "   ✅ First poll after {}s, then every {}s",
        config.polling.first_poll_delay_seconds, config.polling.interval_seconds
    );
    Ok(())
}

fn validate_provisioning_config(config: &TrackerConfig) -> CliResult {
    println!("📡 Validating Provisioning Configuration...");

    if !config.provisioning.enabled {
        println!("   ℹ️  Provisioning disabled");
        return Ok(());
    }

    match &config.provisioning.default_region {
        Some(region) => println!("   ✅ Default region: {}", region),
        None => println!("   ℹ️  No default region; callers must name one per launch"),
    }
    println!(
        "   ✅ Re-check after {}s, then every {}s",
        config.provisioning.initial_recheck_seconds, config.provisioning.retry_interval_seconds
    );
    Ok(())
}

fn validate_scheduler_config(config: &TrackerConfig) -> CliResult {
    println!("🗓️  Validating Scheduler Configuration...");
    println!(
        "   ✅ Action channel capacity: {}",
        config.scheduler.action_channel_capacity
    );
    Ok(())
}

fn validate_database_config(config: &TrackerConfig) -> CliResult {
    println!("🗄️  Validating Database Configuration...");

    match config.database.resolved_url() {
        Some(url) if url.is_empty() => {
            return Err("Database URL is configured but empty".into());
        }
        Some(_) => println!("   ✅ Database URL configured"),
        None => println!("   ℹ️  Database URL not configured (in-memory registries only)"),
    }

    println!(
        "   ✅ Pool: max {} connections, acquire timeout {}s",
        config.database.max_connections, config.database.acquire_timeout_seconds
    );
    Ok(())
}
