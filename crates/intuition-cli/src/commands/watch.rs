//! Repeated polling on a fixed interval.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::commands::Session;
use crate::output;

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between polls (defaults to the config file's interval)
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Stop after this many polls
    #[arg(long)]
    pub max_polls: Option<u64>,
}

pub async fn execute(args: WatchArgs, session: &Session) -> Result<()> {
    let driver = session.driver()?;
    let config = &session.settings.trigger;
    let period = Duration::from_secs(
        args.interval
            .unwrap_or(session.settings.host.interval_secs)
            .max(1),
    );

    // A slow poll pushes the schedule back instead of bursting to catch up,
    // so polls of one node never overlap.
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        node = %session.node,
        resource = %config.resource,
        interval_secs = period.as_secs(),
        "Watching"
    );

    let mut polls = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!(node = %session.node, polls, "Interrupted");
                break;
            }
        }

        match driver.poll(&session.node, config).await {
            Ok(records) => {
                output::print_poll_status(
                    &session.node,
                    config.resource,
                    records.as_ref().map(Vec::len),
                );
                if let Some(records) = records {
                    output::print_records(&records)?;
                }
            }
            Err(e) => error!(node = %session.node, error = %e, "Poll failed; retrying next tick"),
        }

        polls += 1;
        if args.max_polls.is_some_and(|max| polls >= max) {
            break;
        }
    }
    Ok(())
}
