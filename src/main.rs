use anyhow::Result;
use clap::{Parser, Subcommand};
use hearth::config::HostConfig;
use hearth::security::CookieJar;
use hearth::update::{UpdateManager, manifest};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Maintenance CLI for a hearth data root.
///
/// The embedding application links the library directly; this binary exists
/// for poking at an installed data root from a shell: inspecting versions,
/// forcing an update cycle, resetting session state.
#[derive(Parser)]
#[command(name = "hearth", version, about)]
struct Cli {
    /// Application-data root to operate on
    #[arg(long)]
    data_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show installed/bundled versions, channel, and update marker
    Status,
    /// Run one update check/apply cycle
    Update,
    /// Clear the persisted cookie jar
    ClearSession,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = HostConfig::load_or_init(&cli.data_root)?;

    match cli.command {
        Commands::Status => status(&config),
        Commands::Update => {
            let outcome = UpdateManager::new(&config).run().await?;
            println!("update outcome: {outcome:?}");
            Ok(())
        }
        Commands::ClearSession => {
            CookieJar::load(config.cookies_file()).clear();
            println!("session cookies cleared");
            Ok(())
        }
    }
}

fn status(config: &HostConfig) -> Result<()> {
    let installed = config
        .env_file()
        .exists()
        .then(|| manifest::read_env_file(&config.env_file()))
        .transpose()?
        .unwrap_or_default();

    match manifest::read_bundled(&config.bundle_path()) {
        Ok(bundled) => {
            println!("bundled version: {}", display(&bundled.version));
            println!("update channel:  {}", display(&bundled.channel));
        }
        Err(error) => println!("bundled archive: unreadable ({error})"),
    }

    println!("installed version: {}", display(&installed.version));
    match manifest::read_marker(&config.marker_file()) {
        Some(version) => println!("applied update: {version}"),
        None => println!("applied update: none (shipped bundle)"),
    }
    Ok(())
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("unknown")
}
