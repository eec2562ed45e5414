//! Tunecat CLI - music catalog of artists and their tracks

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tunecat_core::config::Config;
use tunecat_core::domain::catalog::{CatalogService, Criterion, TrackGroups};
use tunecat_core::storage::Database;

#[derive(Parser)]
#[command(name = "tunecat")]
#[command(author, version, about = "Music catalog of artists and tracks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog database file (overrides config and TUNECAT_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a track, creating the artist if needed
    Add {
        /// Artist name (exact)
        artist: String,
        /// Track title
        title: String,
    },

    /// Delete a track; the artist goes away with its last track
    Delete {
        /// Artist name (exact)
        artist: String,
        /// Track title
        title: String,
    },

    /// Search by title substring or exact artist name
    Search {
        /// What the value is matched against (track or artist)
        #[arg(long, default_value = "track")]
        by: Criterion,
        /// Title fragment or artist name
        value: String,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Results per page (defaults to search.default_page_size)
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Browse the catalog ordered by artist
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Results per page (defaults to search.default_page_size)
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show artist and track counts
    Stats,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Show config file path
    Path,
}

/// Everything a catalog command needs
struct Context {
    service: CatalogService,
    config: Config,
    format: OutputFormat,
    quiet: bool,
}

impl Context {
    fn page_size(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.config.search.default_page_size)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so JSON output stays parseable
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tunecat=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(core_err) = err.downcast_ref::<tunecat_core::Error>() {
                if let Some(hint) = core_err.suggestion() {
                    eprintln!("  [{}] Try: {}", core_err.code(), hint);
                }
            }
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Commands::Config { action } = cli.command {
        cmd_config(action, cli.quiet)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load()?;
    let mut db_config = config.database.to_database_config();
    if let Some(path) = cli.database {
        db_config.path = path;
    }

    let db = Database::new(db_config).await?;
    debug!(path = %db.path().display(), "Catalog ready");

    let ctx = Context {
        service: CatalogService::with_database(&db),
        config,
        format: cli.format,
        quiet: cli.quiet,
    };

    let code = match cli.command {
        Commands::Add { artist, title } => cmd_add(&ctx, &artist, &title).await?,
        Commands::Delete { artist, title } => cmd_delete(&ctx, &artist, &title).await?,
        Commands::Search {
            by,
            value,
            page,
            page_size,
        } => cmd_search(&ctx, by, &value, page, ctx.page_size(page_size)).await?,
        Commands::List { page, page_size } => {
            cmd_list(&ctx, page, ctx.page_size(page_size)).await?
        }
        Commands::Stats => cmd_stats(&ctx).await?,
        Commands::Config { .. } => ExitCode::SUCCESS,
    };

    db.close().await;
    Ok(code)
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_add(ctx: &Context, artist: &str, title: &str) -> anyhow::Result<ExitCode> {
    let added = ctx.service.add_track(artist, title).await?;

    if ctx.format == OutputFormat::Json {
        println!("{}", json!({ "added": added, "artist": artist, "title": title }));
    } else if added {
        if !ctx.quiet {
            println!("Track added: {} - {}", artist, title);
        }
    } else {
        eprintln!("Track already exists: {} - {}", artist, title);
    }

    Ok(if added { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn cmd_delete(ctx: &Context, artist: &str, title: &str) -> anyhow::Result<ExitCode> {
    let deleted = ctx.service.delete_track(artist, title).await?;

    if ctx.format == OutputFormat::Json {
        println!("{}", json!({ "deleted": deleted, "artist": artist, "title": title }));
    } else if deleted {
        if !ctx.quiet {
            println!("Track deleted: {} - {}", artist, title);
        }
    } else {
        eprintln!("Track not found: {} - {}", artist, title);
    }

    Ok(if deleted { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn cmd_search(
    ctx: &Context,
    criterion: Criterion,
    value: &str,
    page: u32,
    page_size: u32,
) -> anyhow::Result<ExitCode> {
    let groups = ctx.service.search_by(criterion, value, page, page_size).await?;
    let next = match next_page(page) {
        Some(next) => ctx
            .service
            .has_more_results(criterion, value, next, page_size)
            .await?
            .then_some(next),
        None => None,
    };

    if groups.is_empty() {
        if ctx.format == OutputFormat::Json {
            println!("{{}}");
        } else {
            eprintln!("No matches found for {} '{}'", criterion, value);
        }
        return Ok(ExitCode::FAILURE);
    }

    print_groups(ctx, &groups)?;
    if let Some(next) = next {
        if ctx.format == OutputFormat::Text && !ctx.quiet {
            println!("\nMore results: --page {}", next);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_list(ctx: &Context, page: u32, page_size: u32) -> anyhow::Result<ExitCode> {
    let groups = ctx.service.show_tracks(page, page_size).await?;

    if groups.is_empty() && ctx.format == OutputFormat::Text {
        if !ctx.quiet {
            println!("No tracks found.");
            println!("\nAdd one with: tunecat add <artist> <title>");
        }
        return Ok(ExitCode::SUCCESS);
    }

    print_groups(ctx, &groups)?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_stats(ctx: &Context) -> anyhow::Result<ExitCode> {
    let (artists, tracks) = ctx.service.stats().await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json!({ "artists": artists, "tracks": tracks })),
        OutputFormat::Text => {
            println!("Artists: {}", artists);
            println!("Tracks:  {}", tracks);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Page after `page`, if there is one
fn next_page(page: u32) -> Option<u32> {
    page.checked_add(1)
}

fn print_groups(ctx: &Context, groups: &TrackGroups) -> anyhow::Result<()> {
    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(groups)?),
        OutputFormat::Text => {
            for (artist, titles) in groups.iter() {
                println!("{}", artist);
                for title in titles {
                    println!("  - {}", title);
                }
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}
