//! Ranked summaries of a log
//!
//! Functions and IC sites are reduced to their derived state and ordered so
//! the most suspicious entries come first. The result serializes to JSON
//! for machine consumers or renders as a text table.

use crate::config::{FunctionOrder, IcOrder, ReportConfig};
use crate::function_entry::FunctionEntry;
use crate::history_uri::uri_for_function_entry;
use crate::ic_entry::IcEntry;
use crate::log::Log;
use crate::position::format_location;
use crate::v8::{is_optimized_function_state, severity_of, IcState};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt::Write as _;

/// Derived summary of one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSummary {
    pub name: String,
    /// `name (update count)`
    pub label: String,
    /// Current state name, `mixed` for conflicting optimizations
    pub state: String,
    pub updates: usize,
    pub optimized_updates: usize,
    pub deopts: usize,
    /// Reference location (`basename:line:column` or `<unknown>`)
    pub location: String,
    pub position: String,
    pub history_uri: String,
}

/// Derived summary of one IC site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcSummary {
    /// `IcType: state (hits)`
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ic_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_state: Option<IcState>,
    pub hit_count: usize,
    pub location: String,
    pub position: String,
    /// Function executing during the worst transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

/// Ranked report over a whole log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogReport {
    pub total_functions: usize,
    pub total_ics: usize,
    pub functions: Vec<FunctionSummary>,
    pub ics: Vec<IcSummary>,
    #[serde(skip)]
    label_width: usize,
}

/// Functions ordered per `order` (stable: ties keep ingestion order)
pub fn rank_functions<'a>(log: &'a Log, order: FunctionOrder) -> Vec<&'a FunctionEntry> {
    let mut functions: Vec<_> = log.functions().collect();
    match order {
        FunctionOrder::Severity => functions.sort_by_key(|entry| {
            let state = entry.current_state();
            let optimized = state.state().is_some_and(is_optimized_function_state);
            (
                Reverse(state.is_conflict()),
                Reverse(optimized),
                Reverse(entry.deopts().count()),
                Reverse(entry.updates().len()),
            )
        }),
        FunctionOrder::Updates => functions.sort_by_key(|entry| Reverse(entry.updates().len())),
        FunctionOrder::Name => functions.sort_by(|a, b| a.function_name().cmp(b.function_name())),
    }
    functions
}

/// IC sites ordered per `order` (stable: ties keep ingestion order)
pub fn rank_ics(log: &Log, order: IcOrder) -> Vec<&IcEntry> {
    let mut ics: Vec<_> = log.ics().collect();
    match order {
        IcOrder::Severity => ics.sort_by_key(|ic| {
            (
                Reverse(ic.worst_state().map(severity_of)),
                Reverse(ic.hit_count()),
            )
        }),
        IcOrder::Hits => ics.sort_by_key(|ic| Reverse(ic.hit_count())),
    }
    ics
}

impl FunctionSummary {
    pub fn from_entry(entry: &FunctionEntry) -> Self {
        Self {
            name: entry.function_name().to_string(),
            label: entry.label(),
            state: entry.current_state().to_string(),
            updates: entry.updates().len(),
            optimized_updates: entry.optimized_update_count(),
            deopts: entry.deopts().count(),
            location: format_location(entry.reference_location()),
            position: entry.file_position().to_string(),
            history_uri: uri_for_function_entry(entry),
        }
    }
}

impl IcSummary {
    pub fn from_entry(log: &Log, ic: &IcEntry) -> Self {
        let worst = ic.worst_update();
        let function = log
            .function_reference_for_ic(ic)
            .and_then(|reference| log.function(reference.function))
            .map(|entry| entry.function_name().to_string());
        Self {
            label: ic.label(),
            ic_type: worst.map(|update| update.ic_type.to_string()),
            worst_state: worst.map(|update| update.new_state),
            hit_count: ic.hit_count(),
            location: format_location(ic.reference_location()),
            position: ic.file_position().to_string(),
            function,
        }
    }
}

impl LogReport {
    pub fn build(log: &Log, config: &ReportConfig) -> Self {
        let functions = rank_functions(log, config.function_order)
            .into_iter()
            .filter(|entry| config.include_unknown_locations || entry.reference_location().is_some())
            .map(FunctionSummary::from_entry)
            .collect();
        let ics = rank_ics(log, config.ic_order)
            .into_iter()
            .filter(|ic| config.include_unknown_locations || ic.reference_location().is_some())
            .filter(|ic| match ic.worst_state() {
                Some(state) => state >= config.min_ic_state,
                None => config.min_ic_state == IcState::NoFeedback,
            })
            .map(|ic| IcSummary::from_entry(log, ic))
            .collect();

        Self {
            total_functions: log.functions().len(),
            total_ics: log.ics().len(),
            functions: config.limit(functions),
            ics: config.limit(ics),
            label_width: config.label_width,
        }
    }

    /// Text table with one section per entry kind
    pub fn to_text(&self) -> String {
        let width = self.label_width;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Functions ({} of {})",
            self.functions.len(),
            self.total_functions
        );
        let _ = writeln!(
            out,
            "{:<width$} {:>12} {:>7}  Location",
            "Function", "State", "Deopts"
        );
        let _ = writeln!(out, "{}", "─".repeat(width + 40));
        for function in &self.functions {
            let _ = writeln!(
                out,
                "{:<width$} {:>12} {:>7}  {}",
                truncate(&function.label, width),
                function.state,
                function.deopts,
                function.location
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Inline Caches ({} of {})", self.ics.len(), self.total_ics);
        let _ = writeln!(out, "{:<width$} {:<20} Function", "IC", "Location");
        let _ = writeln!(out, "{}", "─".repeat(width + 40));
        for ic in &self.ics {
            let _ = writeln!(
                out,
                "{:<width$} {:<20} {}",
                truncate(&ic.label, width),
                ic.location,
                ic.function.as_deref().unwrap_or("<unknown>")
            );
        }
        out
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
