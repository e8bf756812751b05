//! Bento - link-in-bio page builder
//!
//! Serves the page API and offers command-line access to provider search,
//! link previews and shared pages.

use anyhow::{bail, Context, Result};
use bento::{
    api,
    config::BentoConfig,
    enrichment::{Enrichment, SearchKind, SearchState, VerseSource},
    storage::{load_shared, open_gateway, share::parse_share_key},
    view::{render_page, ViewMode},
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bento")]
#[command(version)]
#[command(about = "Link-in-bio page builder with rich media cards")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BENTO_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Search a provider
    Search {
        /// movie, song, verse or book
        kind: SearchKind,

        /// Query text; omit with --interactive
        query: Option<String>,

        /// Scripture source for verse search
        #[arg(long, default_value = "bible")]
        source: VerseSource,

        /// Read one query per line from stdin, debounced like keystrokes
        #[arg(short, long)]
        interactive: bool,
    },

    /// Fetch a link preview
    Preview {
        /// Page URL
        url: String,
    },

    /// Print a shared page as rendered JSON
    Show {
        /// Share key or full share URL
        target: String,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bento={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BentoConfig::load(cli.config.as_deref())
        .with_context(|| "Failed to load configuration")?;

    match cli.command {
        Commands::Serve { host, port } => {
            run_server(config, host, port).await?;
        }
        Commands::Search {
            kind,
            query,
            source,
            interactive,
        } => {
            let enrichment = Arc::new(Enrichment::from_config(&config.enrichment)?);
            if interactive {
                run_interactive_search(enrichment, kind, source).await?;
            } else {
                let Some(query) = query else {
                    bail!("a query is required unless --interactive is set");
                };
                run_search(&enrichment, kind, &query, source).await?;
            }
        }
        Commands::Preview { url } => {
            let enrichment = Enrichment::from_config(&config.enrichment)?;
            let preview = enrichment.preview(&url).await?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Commands::Show { target } => {
            show_shared(&config, &target).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_server(
    mut config: BentoConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Bento on {}:{}", config.server.host, config.server.port);
    api::serve(&config).await?;
    Ok(())
}

async fn run_search(
    enrichment: &Enrichment,
    kind: SearchKind,
    query: &str,
    source: VerseSource,
) -> Result<()> {
    let results = enrichment.search(kind, query, source).await?;
    if results.is_empty() {
        println!("No results for {:?}", query);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn run_interactive_search(
    enrichment: Arc<Enrichment>,
    kind: SearchKind,
    source: VerseSource,
) -> Result<()> {
    let session = enrichment.session(kind, source);
    let mut states = session.subscribe();

    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            match state {
                SearchState::Idle => {}
                SearchState::Loading { query } => println!("… searching {:?}", query),
                SearchState::Empty { query } => println!("No results for {:?}", query),
                SearchState::Failed { query, message } => {
                    println!("Search for {:?} failed: {}", query, message)
                }
                SearchState::Results { query, items } => {
                    println!("{} results for {:?}", items.len(), query);
                    for item in items {
                        println!("  {}", item.derived_title().unwrap_or("(untitled)"));
                    }
                }
            }
        }
    });

    println!("Searching {}; one query per line, Ctrl+D to quit", kind);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        session.input(&line);
    }

    // The printer stops once the session and its pending requests are gone
    drop(session);
    printer.await?;
    Ok(())
}

async fn show_shared(config: &BentoConfig, target: &str) -> Result<()> {
    let Some(share_key) = parse_share_key(target) else {
        bail!("'{}' is not a share key or share URL", target);
    };
    let gateway = open_gateway(&config.storage, config.enrichment.timeout()).await?;
    let Some(snapshot) = load_shared(gateway.as_ref(), &share_key).await? else {
        bail!("No shared page published under {}", share_key);
    };
    let view = render_page(&snapshot, ViewMode::Shared);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn show_config(config: Option<&BentoConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
