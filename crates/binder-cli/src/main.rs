mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "binder", about = "Build and serve notebook apps on Kubernetes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an app image and push it to the private registry
    Build {
        /// App description (JSON)
        spec: PathBuf,
        /// Also rebuild the shared base image
        #[arg(long)]
        build_base: bool,
        /// Pull the finished image onto every cluster node
        #[arg(long)]
        preload: bool,
    },
    /// Deploy a built app and print its URL
    Deploy {
        /// App description (JSON)
        spec: PathBuf,
        /// Deploy mode passed to every service (default: single-node)
        #[arg(long)]
        mode: Option<String>,
    },
    /// Show the last recorded build state of an app
    State {
        /// App description (JSON)
        spec: PathBuf,
    },
    /// Manage the cluster
    Cluster {
        #[command(subcommand)]
        action: ClusterAction,
    },
    /// Pull an image from the private registry onto every node
    Preload {
        /// Image name without registry prefix
        image: String,
    },
    /// Preload the base image and every given app's image
    PreloadAll {
        /// App descriptions (JSON)
        specs: Vec<PathBuf>,
    },
    /// List deployed apps
    Apps,
    /// Tear down a deployed app
    Destroy {
        /// Deployment id printed by `deploy`
        app_id: String,
    },
}

#[derive(Subcommand)]
enum ClusterAction {
    /// Start the cluster with its proxy and private registry
    Start {
        /// Number of worker nodes (default from binder.toml)
        #[arg(long)]
        minions: Option<u32>,
        /// Cluster provider (default from binder.toml)
        #[arg(long)]
        provider: Option<String>,
    },
    /// Tear the cluster down
    Stop {
        #[arg(long)]
        provider: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    tracing::debug!(dotenv = dotenv_loaded, "environment loaded");

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            spec,
            build_base,
            preload,
        } => commands::build(&spec, build_base, preload).await?,
        Commands::Deploy { spec, mode } => commands::deploy(&spec, mode.as_deref()).await?,
        Commands::State { spec } => commands::state(&spec)?,
        Commands::Cluster { action } => match action {
            ClusterAction::Start { minions, provider } => {
                commands::cluster_start(minions, provider).await?
            }
            ClusterAction::Stop { provider } => commands::cluster_stop(provider).await?,
        },
        Commands::Preload { image } => commands::preload(&image).await?,
        Commands::PreloadAll { specs } => commands::preload_all(&specs).await?,
        Commands::Apps => commands::apps().await?,
        Commands::Destroy { app_id } => commands::destroy(&app_id).await?,
    }

    Ok(())
}
