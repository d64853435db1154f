use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atlas_workflow::api;
use atlas_workflow::config::AppConfig;
use atlas_workflow::models::{Feature, FeatureCatalog};
use atlas_workflow::storage::{Persistence, SqliteStore};
use atlas_workflow::workflow::{prompt_node_data, render_tree, Workflow};

#[derive(Parser)]
#[command(name = "atlas")]
#[command(about = "Feature workflow builder for paper extraction pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the workflow API
    Serve {
        /// Port for HTTP API (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON feature catalog to offer for selection
        #[arg(short, long)]
        features: Option<PathBuf>,
    },
    /// Print the saved workflow as a tree
    Show,
    /// Select (or with --off, deselect) a feature and lay the graph out again
    Toggle {
        /// Feature id
        id: String,

        /// JSON feature catalog the id refers to
        #[arg(short, long)]
        features: PathBuf,

        /// Deselect instead of select
        #[arg(long)]
        off: bool,
    },
    /// Recompute node positions of the saved workflow
    Layout,
    /// Clear the saved workflow
    Reset,
    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "atlas_workflow=debug,tower_http=debug".into()),
    );

    // stdout is reserved for command output
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_catalog(path: &Path) -> anyhow::Result<Vec<Feature>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feature catalog {}", path.display()))?;
    let catalog: FeatureCatalog =
        serde_json::from_str(&content).context("Failed to parse feature catalog")?;
    Ok(catalog.into_features())
}

fn open_workflow(config: &AppConfig, features: Vec<Feature>) -> anyhow::Result<Workflow> {
    let path = config.database_path()?;
    let store = SqliteStore::open(&path)?;
    store.migrate()?;
    tracing::debug!("Using workflow cache at {}", path.display());

    Ok(Workflow::builder(Persistence::new(Arc::new(store)))
        .layout_options(config.layout.clone())
        .node_data(prompt_node_data(config.node_defaults.clone()))
        .features(features)
        .build())
}

async fn serve(config: &AppConfig, port: u16, features: Vec<Feature>) -> anyhow::Result<()> {
    tracing::info!("Starting Atlas workflow server on port {}", port);

    let workflow = open_workflow(config, Vec::new())?;
    workflow.seed_from_catalog(features);
    let app = api::create_router(workflow);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Atlas workflow server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load();

    match cli.command {
        Some(Commands::Serve { port, features }) => {
            let features = match features {
                Some(path) => read_catalog(&path)?,
                None => Vec::new(),
            };
            serve(&config, port.unwrap_or(config.port), features).await?;
        }
        Some(Commands::Show) => {
            let workflow = open_workflow(&config, Vec::new())?;
            print!("{}", render_tree(&workflow.snapshot()));
        }
        Some(Commands::Toggle { id, features, off }) => {
            let workflow = open_workflow(&config, read_catalog(&features)?)?;
            if !workflow.toggle_feature(&id, !off) {
                eprintln!("Nothing changed for feature {}", id);
            }
            workflow.settle().await;
            print!("{}", render_tree(&workflow.snapshot()));
        }
        Some(Commands::Layout) => {
            let workflow = open_workflow(&config, Vec::new())?;
            let positioned = workflow.relayout().await?;
            println!("Positioned {} nodes", positioned);
        }
        Some(Commands::Reset) => {
            let workflow = open_workflow(&config, Vec::new())?;
            workflow.reset_all();
            println!("Workflow cleared");
        }
        Some(Commands::Config { write }) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if write {
                config.save()?;
            }
        }
        None => {
            serve(&config, config.port, Vec::new()).await?;
        }
    }

    Ok(())
}
