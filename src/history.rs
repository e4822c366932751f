//! Function history rendering
//!
//! Turns a function's timeline into rows (timestamp, event, description)
//! and renders them as plain text or as a self-contained HTML page.
//!
//! Every timeline event kind is handled explicitly; an IC event whose
//! handle does not resolve in the log, or an entry that belongs to a
//! different log, aborts rendering with a [`HistoryError`] rather than
//! producing a partial page.

use crate::function_entry::{CodeEvent, FunctionEntry, FunctionTimelineEvent};
use crate::ic_entry::IcUpdateRef;
use crate::log::Log;
use crate::position::{format_location, Location, Timestamp};
use serde::Serialize;
use std::fmt::Write as _;
use thiserror::Error;

/// Errors that abort rendering a function history
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Function '{0}' does not belong to the opened log")]
    ForeignEntry(String),

    #[error("Timeline of '{function}' refers to missing IC update #{index} of IC #{ic}")]
    DanglingIcUpdate {
        function: String,
        ic: usize,
        index: usize,
    },
}

/// One rendered timeline row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub timestamp: Timestamp,
    /// Short event label ("Created", "Eager Deopt", "LoadIC", ...)
    pub event: String,
    /// Description lines
    pub details: Vec<String>,
    /// Source location the event links to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Location>,
}

/// History view over one function of a log
#[derive(Debug, Clone, Copy)]
pub struct FunctionHistory<'a> {
    log: &'a Log,
    entry: &'a FunctionEntry,
}

impl<'a> FunctionHistory<'a> {
    pub fn new(log: &'a Log, entry: &'a FunctionEntry) -> Result<Self, HistoryError> {
        if !log.owns_function(entry) {
            return Err(HistoryError::ForeignEntry(entry.function_name().to_string()));
        }
        Ok(Self { log, entry })
    }

    pub fn entry(&self) -> &'a FunctionEntry {
        self.entry
    }

    /// `basename:line:column` of the function, or `<unknown>`
    pub fn location_label(&self) -> String {
        format_location(self.entry.reference_location())
    }

    pub fn rows(&self) -> Result<Vec<HistoryRow>, HistoryError> {
        self.entry
            .timeline()
            .iter()
            .map(|event| self.row(event))
            .collect()
    }

    fn row(&self, event: &FunctionTimelineEvent) -> Result<HistoryRow, HistoryError> {
        let timestamp = event.timestamp();
        let row = match event {
            FunctionTimelineEvent::Created(code) => code_row("Created", code),
            FunctionTimelineEvent::Updated(code) => code_row("Updated", code),
            FunctionTimelineEvent::Moved {
                from_address,
                to_address,
                ..
            } => HistoryRow {
                timestamp,
                event: "Moved".into(),
                details: vec![format!("From: {}", from_address), format!("To: {}", to_address)],
                link: None,
            },
            FunctionTimelineEvent::Deleted { start_address, .. } => HistoryRow {
                timestamp,
                event: "Deleted".into(),
                details: vec![format!("Address: {}", start_address)],
                link: None,
            },
            FunctionTimelineEvent::SfiMoved {
                from_address,
                to_address,
                ..
            } => HistoryRow {
                timestamp,
                event: "SFI Moved".into(),
                details: vec![format!("From: {}", from_address), format!("To: {}", to_address)],
                link: None,
            },
            FunctionTimelineEvent::Deopt(deopt) => HistoryRow {
                timestamp,
                event: format!("{} Deopt", deopt.bailout_type),
                details: vec![format!("Reason: {}", deopt.reason)],
                link: deopt.location.clone(),
            },
            FunctionTimelineEvent::Ic { update, .. } => self.ic_row(timestamp, *update)?,
        };
        Ok(row)
    }

    fn ic_row(&self, timestamp: Timestamp, reference: IcUpdateRef) -> Result<HistoryRow, HistoryError> {
        let (ic, update) = self
            .log
            .ic_update(reference)
            .ok_or_else(|| HistoryError::DanglingIcUpdate {
                function: self.entry.function_name().to_string(),
                ic: reference.ic.index(),
                index: reference.index,
            })?;
        Ok(HistoryRow {
            timestamp,
            event: update.ic_type.to_string(),
            details: vec![
                format!("Key: {}", update.key),
                format!("Old: {}", update.old_state),
                format!("New: {}", update.new_state),
            ],
            link: ic
                .reference_location()
                .cloned()
                .or_else(|| Some(Location::at(ic.file_position()))),
        })
    }

    /// Plain-text rendering, one block per event
    pub fn to_text(&self) -> Result<String, HistoryError> {
        let rows = self.rows()?;
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.entry.function_name());
        let _ = writeln!(out, "Location: {}", self.location_label());
        let _ = writeln!(out, "State: {}", self.entry.current_state());
        let _ = writeln!(out);
        let _ = writeln!(out, "{:>14}  {:<16} Description", "Timestamp", "Event");
        let _ = writeln!(out, "{}", "─".repeat(60));
        for row in &rows {
            let timestamp = row.timestamp.to_string();
            let event = match &row.link {
                Some(link) => format!("{} @ {}", row.event, link.short_label()),
                None => row.event.clone(),
            };
            let mut details = row.details.iter();
            let first = details.next().map(String::as_str).unwrap_or("");
            let _ = writeln!(out, "{:>14}  {:<16} {}", timestamp, event, first);
            for line in details {
                let _ = writeln!(out, "{:>14}  {:<16} {}", "", "", line);
            }
        }
        Ok(out)
    }

    /// Self-contained HTML page with a timestamp/event/description table
    pub fn to_html(&self) -> Result<String, HistoryError> {
        let rows = self.rows()?;
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"UTF-8\">\n");
        let _ = writeln!(
            html,
            "<title>Function History: {}</title>",
            escape_html(self.entry.function_name())
        );
        html.push_str("</head>\n<body>\n");
        let _ = writeln!(html, "<h1>{}</h1>", escape_html(self.entry.function_name()));
        html.push_str("<ul>\n");
        let _ = writeln!(html, "<li>Location: {}</li>", self.render_location());
        let _ = writeln!(
            html,
            "<li>State: {}</li>",
            escape_html(&self.entry.current_state().to_string())
        );
        html.push_str("</ul>\n");
        html.push_str("<table cellpadding=0 cellspacing=5>\n<thead>\n<tr>\n");
        html.push_str("<th align=\"right\">Timestamp</th>\n");
        html.push_str("<th align=\"left\">Event</th>\n");
        html.push_str("<th align=\"left\">Description</th>\n");
        html.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &rows {
            html.push_str("<tr valign=\"top\">\n");
            let _ = writeln!(html, "<td align=\"right\">{}</td>", row.timestamp);
            let event = escape_html(&row.event);
            match &row.link {
                Some(link) => {
                    let _ = writeln!(
                        html,
                        "<td><a href=\"{}\" title=\"{}\">{}</a></td>",
                        escape_html(&link_href(link)),
                        escape_html(&link.file),
                        event
                    );
                }
                None => {
                    let _ = writeln!(html, "<td>{}</td>", event);
                }
            }
            let details: Vec<String> = row.details.iter().map(|d| escape_html(d)).collect();
            let _ = writeln!(html, "<td>{}</td>", details.join("<br>"));
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
        Ok(html)
    }

    fn render_location(&self) -> String {
        match self.entry.reference_location() {
            Some(location) => format!(
                "<a href=\"{}\" title=\"{}\">{}</a>",
                escape_html(&link_href(location)),
                escape_html(&location.file),
                escape_html(&location.short_label())
            ),
            None => escape_html("<unknown>"),
        }
    }
}

fn code_row(event: &str, code: &CodeEvent) -> HistoryRow {
    let update = &code.update;
    HistoryRow {
        timestamp: update.timestamp,
        event: event.to_string(),
        details: vec![
            format!("Type: {}", code.code_type),
            format!("Kind: {}", update.code_kind),
            format!("Size: {}", update.size),
            format!("State: {}", update.state),
            format!("Address: {}", update.start_address),
            format!("Shared Function: {}", update.func_start_address),
        ],
        link: None,
    }
}

fn link_href(location: &Location) -> String {
    format!(
        "{}#L{}C{}",
        location.file,
        u64::from(location.range.start.line) + 1,
        u64::from(location.range.start.column) + 1
    )
}

/// Escape HTML special characters to prevent markup injection
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
