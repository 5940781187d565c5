//! Stored poll state commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use intuition_core::StateStore;

use crate::commands::Session;
use crate::output;

#[derive(Subcommand)]
pub enum StateCommands {
    /// Show the stored state of the node
    Show {
        /// Print the raw JSON document
        #[arg(long)]
        raw: bool,
    },

    /// Forget the node's state; the next poll seeds again
    Reset,

    /// List nodes with stored state
    List,
}

pub async fn execute(cmd: StateCommands, session: &Session) -> Result<()> {
    match cmd {
        StateCommands::Show { raw } => {
            let data = session
                .store
                .load(&session.node)
                .await
                .context("Failed to load state")?;
            output::print_state(&session.node, &data, raw)
        }
        StateCommands::Reset => {
            let removed = session
                .store
                .reset(&session.node)
                .await
                .context("Failed to reset state")?;
            if removed {
                println!("{} Reset state for {}", "✓".green().bold(), session.node.cyan());
            } else {
                println!("{}", format!("No stored state for {}", session.node).dimmed());
            }
            Ok(())
        }
        StateCommands::List => {
            let nodes = session.store.nodes().await.context("Failed to list nodes")?;
            output::print_nodes(&nodes);
            Ok(())
        }
    }
}
