//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crm_core::PipelineConfig;
use crm_store::{create_broadcast_channel, SessionStore};

pub mod board;
pub mod clients;
pub mod deals;
pub mod metrics;
pub mod shell;
pub mod stages;

/// Field-service CRM - sales pipeline board
#[derive(Parser)]
#[command(name = "crm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pipeline config file (TOML). Falls back to $CRM_CONFIG.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the pipeline as a kanban board
    Board,

    /// List deals
    Deals(deals::DealsArgs),

    /// List clients
    Clients(clients::ClientsArgs),

    /// Show pipeline metrics
    Metrics,

    /// List pipeline stages
    Stages,

    /// Interactive session reading commands from stdin
    Shell,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let mut session = Session::open(self.config.as_deref())?;

        match self.command {
            Commands::Board => board::execute(&mut session),
            Commands::Deals(args) => deals::execute(&mut session, args),
            Commands::Clients(args) => clients::execute(&session, args),
            Commands::Metrics => metrics::execute(&mut session),
            Commands::Stages => stages::list(&session),
            Commands::Shell => shell::execute(session).await,
        }
    }
}

/// A seeded store plus the config it is read with.
pub struct Session {
    pub store: SessionStore,
    pub config: PipelineConfig,
}

impl Session {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = PipelineConfig::resolve(config_path).context("Failed to load pipeline config")?;
        let mut store = SessionStore::seeded()
            .context("Failed to seed session store")?
            .with_broadcast(create_broadcast_channel());
        store.edit_stages(|stages| stages.apply_time_limits(&config.stage_time_limits));
        Ok(Self { store, config })
    }

    /// Discard session data and reseed, keeping the config.
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()?;
        let limits = &self.config.stage_time_limits;
        self.store.edit_stages(|stages| stages.apply_time_limits(limits));
        Ok(())
    }
}
