mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};

use nodeset_core::{Config, FileStore, HttpFetcher, IngestOptions, NodeSetService};

#[derive(Parser)]
#[command(name = "nodeset")]
#[command(about = "Search and browse OPC UA information models", long_about = None)]
struct Cli {
    /// Config file to use instead of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search nodes of the default information models
    Search {
        /// Words to search for
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the rendered details of a search result
    Show {
        /// Document id from a search result
        id: usize,

        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// List or manage catalog entries
    #[command(args_conflicts_with_subcommands = true)]
    Catalog {
        #[command(subcommand)]
        action: Option<CatalogAction>,

        /// Filter entries by text
        query: Vec<String>,
    },
    /// Fetch a NodeSet document by URL and register it in the catalog
    Ingest {
        /// URL of the NodeSet XML document
        url: String,

        /// Slug to register under (generated if omitted)
        #[arg(long)]
        slug: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Namespace URI the document defines (repeatable)
        #[arg(long = "namespace")]
        namespaces: Vec<String>,

        /// Slug of a model this one builds on (repeatable)
        #[arg(long = "dependency")]
        dependencies: Vec<String>,

        /// Load this document by default
        #[arg(long = "default")]
        default_selection: bool,
    },
    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3333")]
        port: u16,
    },
    /// Print the default configuration
    Config,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Remove a previously added entry
    Remove {
        /// Slug of the entry
        slug: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config;

    match cli.command {
        Commands::Search { query, limit } => {
            let mut config = load_config(config_path.as_deref())?;
            if let Some(limit) = limit {
                config.search.max_results = limit;
            }
            let service = build_service(&config)?;
            initialize(&service).await?;

            let query = query.join(" ");
            let hits = service.search(&query);
            if hits.is_empty() {
                println!("No results for '{}'.", query);
            }
            for hit in hits {
                println!("[{}] {}  ({:.2})", hit.document.id, hit.document.title, hit.score);
                println!("    {}", hit.document.node_id);
                if !hit.document.description.is_empty() {
                    println!("    {}", hit.document.description);
                }
            }
        }
        Commands::Show { id, page } => {
            let config = load_config(config_path.as_deref())?;
            let service = build_service(&config)?;
            initialize(&service).await?;

            let rendered = service.render_page(id, page).await;
            if rendered.content.is_empty() {
                println!("Page {} is out of range (1-{}).", page, rendered.total_pages);
            } else {
                println!("{}", rendered.content);
                if rendered.total_pages > 1 {
                    println!("\n-- page {}/{} --", rendered.page, rendered.total_pages);
                }
            }
        }
        Commands::Catalog { action, query } => {
            let config = load_config(config_path.as_deref())?;
            let service = build_service(&config)?;
            match action {
                Some(CatalogAction::Remove { slug }) => {
                    let removed = service
                        .catalog_handle()
                        .remove(&slug)
                        .await
                        .wrap_err_with(|| format!("Failed to remove '{}'", slug))?;
                    if removed {
                        println!("Removed catalog entry '{}'.", slug);
                    } else {
                        println!("No added entry named '{}'; built-in entries cannot be removed.", slug);
                    }
                }
                None => {
                    let entries = service.catalog(&query.join(" ")).await;
                    for entry in entries {
                        let marker = if entry.default_selection { "*" } else { " " };
                        println!("{} {:<14} {}", marker, entry.slug, entry.name);
                        if let Some(description) = &entry.description {
                            println!("  {:<14} {}", "", description);
                        }
                    }
                }
            }
        }
        Commands::Ingest {
            url,
            slug,
            name,
            description,
            category,
            tags,
            namespaces,
            dependencies,
            default_selection,
        } => {
            let config = load_config(config_path.as_deref())?;
            let service = build_service(&config)?;
            let options = IngestOptions {
                slug,
                name,
                description,
                category,
                documentation_url: None,
                tags,
                namespace_uris: namespaces,
                dependencies,
                default_selection,
            };

            let spinner = spinner(&format!("Ingesting {}", url));
            let result = service.loader().ingest(&url, options).await;
            spinner.finish_and_clear();

            let outcome = result.map_err(|e| eyre!("{}", e))?;
            println!("Registered '{}' ({})", outcome.entry.slug, outcome.entry.name);
            println!("  Nodes: {}", outcome.document.nodes.len());
            for uri in &outcome.entry.namespace_uris {
                println!("  Namespace: {}", uri);
            }
        }
        Commands::Serve { port } => {
            let config = load_config(config_path.as_deref())?;
            let service = Arc::new(build_service(&config)?);
            initialize(&service).await?;

            serve::start_server(service, serve::ServeConfig { port })
                .await
                .map_err(|e| eyre!("Server error: {}", e))?;
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().wrap_err("Failed to load config"),
    }
}

fn build_service(config: &Config) -> Result<NodeSetService> {
    let fetcher = HttpFetcher::with_config(&config.fetch).wrap_err("Failed to create HTTP client")?;
    let store = FileStore::with_config(&config.storage);
    Ok(NodeSetService::from_config(
        config,
        Arc::new(fetcher),
        Arc::new(store),
    ))
}

async fn initialize(service: &NodeSetService) -> Result<()> {
    let spinner = spinner("Loading default information models...");
    let result = service.initialize().await;
    spinner.finish_and_clear();

    let stats = result.wrap_err("Failed to load default information models")?;
    tracing::info!("Ready: {} nodes indexed", stats.indexed);
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
