//! Single poll.

use anyhow::{Context, Result};

use crate::commands::Session;
use crate::output;

pub async fn execute(session: &Session) -> Result<()> {
    let driver = session.driver()?;
    let config = &session.settings.trigger;

    let records = driver
        .poll(&session.node, config)
        .await
        .with_context(|| format!("Poll failed for node '{}'", session.node))?;

    output::print_poll_status(&session.node, config.resource, records.as_ref().map(Vec::len));
    if let Some(records) = records {
        output::print_records(&records)?;
    }
    Ok(())
}
