//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use intuition_core::{FileStateStore, MemoryStateStore, PollDriver, StateStore};
use intuition_graphql::GraphqlSearch;

use crate::settings::{default_state_file, Settings};

pub mod poll;
pub mod state;
pub mod watch;

/// Intuition trigger - detect new records in the Intuition knowledge graph
#[derive(Parser)]
#[command(name = "intuition")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Node name for stored state (overrides the config file)
    #[arg(short, long, global = true)]
    pub node: Option<String>,

    /// Where poll state is kept
    #[arg(long, value_enum, global = true, default_value = "file")]
    pub store: StoreKind,

    /// State file for the file store
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Redis URL for the redis store
    #[arg(long, global = true, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    File,
    Redis,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll once and print new records as JSON lines
    Poll,

    /// Poll repeatedly until interrupted
    Watch(watch::WatchArgs),

    /// Inspect or reset stored poll state
    #[command(subcommand)]
    State(state::StateCommands),
}

/// Everything a command needs once flags and config are resolved.
pub struct Session {
    pub settings: Settings,
    pub node: String,
    pub store: Arc<dyn StateStore>,
}

impl Session {
    /// Driver over the configured GraphQL endpoint and this session's store.
    pub fn driver(&self) -> Result<PollDriver<GraphqlSearch, Arc<dyn StateStore>>> {
        let search = GraphqlSearch::new(&self.settings.host.endpoint, self.settings.host.timeout())
            .context("Failed to build GraphQL client")?;
        debug!(endpoint = search.endpoint(), node = %self.node, "GraphQL client ready");
        Ok(PollDriver::new(search, self.store.clone()))
    }
}

impl Cli {
    async fn open_store(&self) -> Result<Arc<dyn StateStore>> {
        let store: Arc<dyn StateStore> = match self.store {
            StoreKind::Memory => Arc::new(MemoryStateStore::new()),
            StoreKind::File => {
                let path = self.state_file.clone().unwrap_or_else(default_state_file);
                debug!(path = %path.display(), "Using file state store");
                Arc::new(FileStateStore::new(path))
            }
            StoreKind::Redis => {
                let pool = intuition_redis::connect(&self.redis_url)
                    .await
                    .with_context(|| format!("Failed to connect to Redis at {}", self.redis_url))?;
                Arc::new(intuition_redis::RedisStateStore::new(pool))
            }
        };
        Ok(store)
    }

    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;
        let node = self
            .node
            .clone()
            .unwrap_or_else(|| settings.host.node.clone());
        let store = self.open_store().await?;
        let session = Session {
            settings,
            node,
            store,
        };

        match self.command {
            Commands::Poll => poll::execute(&session).await,
            Commands::Watch(args) => watch::execute(args, &session).await,
            Commands::State(cmd) => state::execute(cmd, &session).await,
        }
    }
}
