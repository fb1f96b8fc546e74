//! Terminal rendering for the CLI.
//!
//! Rendering functions return strings and never print, so they can be tested
//! against canned outcomes. Colors come from [`console::Style`], which drops
//! ANSI codes on its own when stdout is not a terminal.

use console::Style;
use modeldata::{OperationKind, Outcome, Record, StatusSnapshot};

fn success_style() -> Style {
    Style::new().green()
}

fn failure_style() -> Style {
    Style::new().red()
}

fn index_style() -> Style {
    Style::new().yellow()
}

fn muted_style() -> Style {
    Style::new().dim()
}

/// One line describing how `op` settled.
///
/// Successes show the outcome message. Failures lead with the operation's
/// headline, followed by the extracted failure message.
pub fn render_outcome(op: OperationKind, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success { message } => {
            format!("{} {}", success_style().apply_to("✓"), message)
        }
        Outcome::Failure { message } => format!(
            "{} {}: {}",
            failure_style().apply_to("✗"),
            failure_style().bold().apply_to(op.failure_headline()),
            message
        ),
    }
}

/// Indexed listing of a collection's records, one compact JSON object per line.
pub fn render_records(collection: &str, records: &[Record]) -> String {
    if records.is_empty() {
        return format!(
            "{}\n",
            muted_style().apply_to(format!("No records in {}", collection))
        );
    }

    let width = records.len().saturating_sub(1).to_string().len();
    let mut output = String::new();
    for (i, record) in records.iter().enumerate() {
        let body = serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string());
        output.push_str(&format!(
            "{} {}\n",
            index_style().apply_to(format!("[{:>width$}]", i, width = width)),
            body
        ));
    }
    output
}

/// The status snapshot as a single JSON line, for `--json`.
pub fn render_status_json(snapshot: &StatusSnapshot) -> anyhow::Result<String> {
    Ok(serde_json::to_string(snapshot)?)
}

/// `list --json`: the records alongside the status snapshot.
pub fn render_listing_json(
    collection: &str,
    records: &[Record],
    snapshot: &StatusSnapshot,
) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&serde_json::json!({
        "collection": collection,
        "records": records,
        "status": snapshot,
    }))?)
}
