//! Cross-references between IC sites and functions
//!
//! References are handles resolved through the owning [`Log`]; no entry
//! holds another entry, so function and IC timelines never form cycles.

use crate::function_entry::{FunctionEntry, FunctionId};
use crate::ic_entry::IcEntry;
use crate::log::Log;
use crate::position::Location;

/// Navigation target for a function ("go to function")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionReference {
    /// Reference location of the function, or its file position when unknown
    pub location: Location,
    pub function: FunctionId,
}

impl FunctionReference {
    pub fn from_function_entry(entry: &FunctionEntry) -> Self {
        let location = entry
            .reference_location()
            .cloned()
            .unwrap_or_else(|| Location::at(entry.file_position()));
        Self {
            location,
            function: entry.id(),
        }
    }
}

/// Function that was executing during the worst transition of `ic`
///
/// `None` when the IC has no updates or its worst update carries no
/// function.
pub fn function_reference_for_ic<'a>(log: &'a Log, ic: &IcEntry) -> Option<&'a FunctionReference> {
    let function = ic.worst_update()?.function?;
    log.function(function).map(FunctionEntry::function_reference)
}
