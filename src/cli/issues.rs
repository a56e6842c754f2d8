use anyhow::{Context as _, Result};
use serde::Serialize;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::notify::Notifier;
use crate::trackers::{Issue, IssueTracker};

const TABLE_HEADERS: [&str; 4] = ["Issue", "Type", "Title", "Assignee"];
const DEFAULT_PAGER: &str = "less -R";

/// Where the rendered table ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Write straight to the output stream
    Plain,
    /// Pipe through `$PAGER` (used when stdout is a terminal)
    Pager,
}

/// `gibr issues`: list open issues assigned to the current user
pub async fn run(
    tracker: &dyn IssueTracker,
    notifier: &dyn Notifier,
    json: bool,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<()> {
    let issues = tracker
        .list_issues()
        .await
        .with_context(|| format!("Failed to list {} issues", tracker.display_name()))?;

    if issues.is_empty() {
        notifier.warning("No open issues found.");
        return Ok(());
    }

    if json {
        writeln!(out, "{}", to_json(&issues)?)?;
        return Ok(());
    }

    let table = render_table(&issues);
    match mode {
        OutputMode::Pager => page(&table, out),
        OutputMode::Plain => {
            writeln!(out, "{}", table)?;
            Ok(())
        }
    }
}

/// Pretty JSON array with four-space indentation
pub fn to_json(issues: &[Issue]) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    issues
        .serialize(&mut serializer)
        .context("Failed to serialize issues")?;
    Ok(String::from_utf8(buf)?)
}

/// GitHub-flavored markdown table of issues
pub fn render_table(issues: &[Issue]) -> String {
    let rows: Vec<[String; 4]> = issues
        .iter()
        .map(|issue| {
            [
                issue.id.to_string(),
                issue.issue_type.clone(),
                issue.title.clone(),
                issue.assignee.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!(" {:<width$} ", cell, width = width))
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(&TABLE_HEADERS[..]));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    lines.push(format!("|{}|", rule.join("|")));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(line(cells.as_slice()));
    }
    lines.join("\n")
}

/// Show `text` through the user's pager, falling back to `out`
fn page(text: &str, out: &mut dyn Write) -> Result<()> {
    let pager = std::env::var("PAGER")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PAGER.to_string());
    let mut parts = pager.split_whitespace();
    let Some(program) = parts.next() else {
        writeln!(out, "{}", text)?;
        return Ok(());
    };

    let child = Command::new(program)
        .args(parts)
        .stdin(Stdio::piped())
        .spawn();

    let mut child = match child {
        Ok(child) => child,
        Err(err) => {
            debug!(%pager, error = %err, "Pager unavailable, printing directly");
            writeln!(out, "{}", text)?;
            return Ok(());
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        // The pager may exit before reading everything (user pressed q)
        let _ = writeln!(stdin, "{}", text);
    }
    child.wait().context("Pager failed")?;
    Ok(())
}
