//! Terminal output formatting.
//!
//! Records go to stdout as JSON lines; everything meant for a human goes to
//! stderr so the record stream stays pipeable.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;

use intuition_core::state::static_data::{seen_keys, LAST_ATOM_CREATED_AT};
use intuition_core::{EntityKind, Record, StaticData};

/// Write each record as one JSON line.
pub fn write_records(out: &mut impl Write, records: &[Record]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

pub fn print_records(records: &[Record]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    write_records(&mut lock, records)
}

/// One status line after a poll.
pub fn print_poll_status(node: &str, kind: EntityKind, emitted: Option<usize>) {
    let status = match emitted {
        Some(n) => format!("{} new", n).green(),
        None => "nothing new".dimmed(),
    };
    eprintln!("{} {} {}", node.cyan().bold(), format!("[{}]", kind).dimmed(), status);
}

/// Per-entity summary of a node's stored state.
pub fn state_summary(data: &StaticData) -> Vec<(EntityKind, String)> {
    let mut lines = Vec::new();
    for kind in EntityKind::ALL {
        let line = match seen_keys(kind) {
            None => match data.get(LAST_ATOM_CREATED_AT) {
                Some(_) => match data.poll_state(kind).cursor {
                    Some(cursor) => format!("cursor {}", cursor.to_rfc3339()),
                    None => "cursor unreadable".to_string(),
                },
                None => continue,
            },
            Some(keys) => {
                if data.get(keys.ids).is_none() && data.get(keys.initialized).is_none() {
                    continue;
                }
                let state = data.poll_state(kind);
                format!(
                    "{} seen, {}",
                    state.seen.len(),
                    if state.initialized { "initialized" } else { "not initialized" }
                )
            }
        };
        lines.push((kind, line));
    }
    lines
}

pub fn print_state(node: &str, data: &StaticData, raw: bool) -> Result<()> {
    if raw {
        println!("{}", serde_json::to_string_pretty(data)?);
        return Ok(());
    }

    println!("{}", node.cyan().bold());
    let summary = state_summary(data);
    if summary.is_empty() {
        println!("  {}", "No stored state.".dimmed());
        return Ok(());
    }
    for (kind, line) in summary {
        println!("  {:<10} {}", kind.to_string().bold(), line);
    }
    Ok(())
}

pub fn print_nodes(nodes: &[String]) {
    if nodes.is_empty() {
        println!("{}", "No nodes with stored state.".dimmed());
        return;
    }
    for node in nodes {
        println!("{}", node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_written_as_json_lines() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[json!({"id": 1}), json!({"id": "two"})]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"id\":1}\n{\"id\":\"two\"}\n");
    }

    #[test]
    fn test_state_summary_lists_present_entities() {
        let data: StaticData = serde_json::from_value(json!({
            "lastAtomCreatedAt": "2024-01-01T00:00:00Z",
            "seenVaultTx": {"0x1": 1, "0x2": 2},
            "seenVaultsInitialized": true
        }))
        .unwrap();

        let summary = state_summary(&data);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0], (EntityKind::Atoms, "cursor 2024-01-01T00:00:00+00:00".to_string()));
        assert_eq!(summary[1], (EntityKind::Vaults, "2 seen, initialized".to_string()));
    }

    #[test]
    fn test_state_summary_empty() {
        assert!(state_summary(&StaticData::new()).is_empty());
    }
}
