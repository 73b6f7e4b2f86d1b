use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use interface_mods_lib::commands::{self, PrepareReport};
use interface_mods_lib::core::error::LauncherResult;
use interface_mods_lib::core::state::{AppState, LauncherPaths};
use interface_mods_lib::core::version::{LoaderType, VersionIdentity};

#[derive(Parser)]
#[command(
    name = "interface-mods",
    version,
    about = "InterfaceOficial mod manager: search, select and install mods"
)]
struct Cli {
    /// Game directory (defaults to the platform .minecraft location)
    #[arg(long, global = true, value_name = "DIR")]
    game_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the mod registry
    Search { query: String },
    /// Enable a mod from the search results for a query
    Enable {
        query: String,
        /// Which search hit to enable (0 = first)
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Disable an enabled mod by project id
    Disable { project_id: String },
    /// List enabled mods
    List,
    /// List cached artifacts for a game version and loader
    Cache {
        game_version: String,
        loader: LoaderType,
    },
    /// Resolve, download and install enabled mods
    Prepare {
        game_version: String,
        loader: LoaderType,
    },
    /// Prepare mods for an installed version id (e.g. fabric-loader-0.15.0-1.20.1)
    PrepareId { version_id: String },
    /// Show how a version id is classified
    Parse { version_id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    interface_mods_lib::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> LauncherResult<()> {
    let Cli { game_dir, command } = cli;

    match command {
        Command::Parse { version_id } => {
            let identity = VersionIdentity::parse(&version_id);
            println!("{}", identity);
            println!("  game version:   {}", identity.game_version);
            println!("  loader:         {}", identity.loader);
            println!(
                "  loader version: {}",
                identity.loader_version.as_deref().unwrap_or("-")
            );
        }
        Command::Search { query } => {
            let state = open_state(game_dir)?;
            for (i, hit) in commands::search_mods(&state, &query).await?.iter().enumerate() {
                println!(
                    "{:>2}. {} [{}] ({})",
                    i,
                    hit.title,
                    hit.project_id,
                    hit.downloads_label()
                );
                if !hit.description.is_empty() {
                    println!("    {}", hit.description);
                }
            }
        }
        Command::Enable { query, index } => {
            let state = open_state(game_dir)?;
            let hits = commands::search_mods(&state, &query).await?;
            match hits.into_iter().nth(index) {
                Some(hit) => {
                    let title = hit.title.clone();
                    if commands::enable_mod(&state, hit).await? {
                        println!("Enabled {}", title);
                    } else {
                        println!("{} is already enabled", title);
                    }
                }
                None => println!("No search result #{} for '{}'", index, query),
            }
        }
        Command::Disable { project_id } => {
            let state = open_state(game_dir)?;
            if commands::disable_mod(&state, &project_id).await? {
                println!("Disabled {}", project_id);
            } else {
                println!("{} is not enabled", project_id);
            }
        }
        Command::List => {
            let state = open_state(game_dir)?;
            for m in commands::list_enabled_mods(&state).await? {
                println!("{} [{}]", m.title, m.project_id);
            }
        }
        Command::Cache {
            game_version,
            loader,
        } => {
            let state = open_state(game_dir)?;
            for name in commands::cached_mods(&state, &game_version, loader).await? {
                println!("{}", name);
            }
        }
        Command::Prepare {
            game_version,
            loader,
        } => {
            let state = open_state(game_dir)?;
            let cancel = cancel_on_ctrl_c();
            let report = commands::prepare_mods(&state, &game_version, loader, &cancel).await?;
            print_report(&report);
        }
        Command::PrepareId { version_id } => {
            let state = open_state(game_dir)?;
            let cancel = cancel_on_ctrl_c();
            match commands::prepare_mods_for_version(&state, &version_id, &cancel).await? {
                Some(report) => print_report(&report),
                None => println!("{} does not load mods", version_id),
            }
        }
    }

    Ok(())
}

/// Launcher state for `--game-dir`, or the platform default location.
fn open_state(game_dir: Option<PathBuf>) -> LauncherResult<AppState> {
    let paths = game_dir
        .map(LauncherPaths::new)
        .unwrap_or_else(LauncherPaths::detect);
    AppState::new(paths)
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling mod preparation");
            token.cancel();
        }
    });
    cancel
}

fn print_report(report: &PrepareReport) {
    println!(
        "{} mod file(s) installed for {} {}",
        report.installed.len(),
        report.loader.display_name(),
        report.game_version
    );
    for path in &report.installed {
        if let Some(name) = path.file_name() {
            println!("  + {}", name.to_string_lossy());
        }
    }
    for failure in &report.failures {
        println!("  ! {}", failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parse_runs_without_launcher_state() {
        let tmp = tempfile::tempdir().unwrap();
        let game_dir = tmp.path().join("never-created");
        let cli = Cli::try_parse_from([
            "interface-mods",
            "--game-dir",
            game_dir.to_str().unwrap(),
            "parse",
            "fabric-loader-0.15.0-1.20.1",
        ])
        .unwrap();

        run(cli).await.unwrap();

        assert!(!game_dir.exists());
    }

    #[test]
    fn loader_argument_is_typed() {
        let cli = Cli::try_parse_from(["interface-mods", "prepare", "1.20.1", "quilt"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Prepare { loader: LoaderType::Quilt, .. }
        ));
        assert!(Cli::try_parse_from(["interface-mods", "prepare", "1.20.1", "rift"]).is_err());
    }
}
