use albumart_cli::config::{self, CliOverrides, ConfigManager};
use albumart_cli::error::{CliError, CliResult};
use albumart_cli::orchestrators::EnrichOrchestrator;
use albumart_cli::terminal;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "albumart")]
#[command(author, version, about = "Album Art Enricher - adds cover image URLs to music datasets", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a cover image URL column to a music dataset CSV
    Enrich(EnrichArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct EnrichArgs {
    /// Dataset to read
    #[arg(default_value = "musics_dataset.csv")]
    input: PathBuf,

    /// Where to write the enriched dataset
    #[arg(default_value = "musics_dataset_updated.csv")]
    output: PathBuf,

    /// Catalog client id (overrides configuration)
    #[arg(long, env = "ALBUMART_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// Catalog client secret (overrides configuration)
    #[arg(long, env = "ALBUMART_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Maximum number of rows looked up at the same time
    #[arg(short = 'j', long, value_name = "N")]
    concurrency: Option<usize>,

    /// Zero-based column holding the artist name
    #[arg(long, value_name = "INDEX")]
    artist_column: Option<usize>,

    /// Zero-based column holding the track name
    #[arg(long, value_name = "INDEX")]
    track_column: Option<usize>,

    /// Header label of the appended column
    #[arg(long, value_name = "LABEL")]
    column_label: Option<String>,

    /// Disable progress bar display
    #[arg(long)]
    no_progress: bool,
}

impl EnrichArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            concurrency: self.concurrency,
            artist_column: self.artist_column,
            track_column: self.track_column,
            column_label: self.column_label.clone(),
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Interactive setup for the catalog client credentials
    Init {
        /// Reconfigure even if already set up
        #[arg(short, long)]
        force: bool,
    },

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., client.max_concurrent_rows)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., client.max_concurrent_rows)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let debug = cli.debug;

    if debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Warn)
            .filter_module("albumart_core", log::LevelFilter::Debug)
            .filter_module("albumart_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if let Err(error) = run(cli).await {
        eprint!("{}", error.format_for_user(debug));
        std::process::exit(error.exit_code() as i32);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Enrich(args) => enrich_command(args).await,
        Commands::Config { command } => config_command(command).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

async fn enrich_command(args: EnrichArgs) -> CliResult<()> {
    let mut app_config = config::get_config()
        .map_err(|e| CliError::misuse(&format!("{e:#}")))?;
    app_config.apply_cli_overrides(&args.overrides());

    colored::control::set_override(terminal::should_use_color(app_config.output.color_enabled));

    let show_bar = !args.no_progress
        && app_config.output.progress_enabled
        && terminal::should_show_progress_by_default();

    log::debug!("Input: {}", args.input.display());
    log::debug!("Output: {}", args.output.display());
    log::debug!("Progress bar: {show_bar}");

    let orchestrator = EnrichOrchestrator::from_config(&app_config)?;
    let summary = orchestrator.run(&args.input, &args.output, show_bar).await?;

    log::debug!(
        "Wrote {} rows to {}",
        summary.rows,
        args.output.display()
    );
    Ok(())
}

async fn config_command(command: ConfigCommand) -> CliResult<()> {
    let mut manager = ConfigManager::new();

    match command {
        ConfigCommand::Init { force } => {
            config::interactive_init(force).await?;
        }
        ConfigCommand::Get { key } => {
            let value = manager.get(&key).map_err(|e| CliError::misuse(&format!("{e:#}")))?;
            println!("{value}");
        }
        ConfigCommand::Set { key, value } => {
            manager
                .set(&key, &value)
                .map_err(|e| CliError::misuse(&format!("{e:#}")))?;
            let shown = if key == "client.client_secret" { "********" } else { value.as_str() };
            eprintln!("{}", format!("Set {key} = {shown}").green());
            eprintln!(
                "Configuration saved to: {}",
                manager.get_config_path().display()
            );
        }
        ConfigCommand::List => {
            let items = manager.list()?;
            eprintln!("{}", "Configuration:".bold().blue());
            eprintln!("Config file: {}", manager.get_config_path().display());
            eprintln!();

            // Group items by section
            let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
            for (key, value) in items {
                let (section, name) = key.split_once('.').unwrap_or(("general", key.as_str()));
                sections
                    .entry(section.to_string())
                    .or_default()
                    .push((name.to_string(), value));
            }

            for (section, items) in sections {
                println!("[{}]", section.yellow());
                for (name, value) in items {
                    println!("  {} = {}", name.cyan(), value);
                }
                println!();
            }
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
