// Entry index for one loaded trace
//
// A `Log` owns every function and inline-cache entry of a trace in two
// arenas, keyed by source position. It is produced once by `LogBuilder`
// (append-only ingestion) or from a JSON `LogSnapshot`, and is immutable
// afterwards: the only way to change what a consumer sees is to replace
// the whole log (see `crate::session::LogSession`).

mod builder;
mod snapshot;

pub use builder::LogBuilder;
pub use snapshot::{
    load_snapshot, FunctionEventRecord, FunctionRecord, IcRecord, IcUpdateRecord, LogSnapshot,
};

use crate::function_entry::{FunctionEntry, FunctionId};
use crate::history_uri::file_position_from_uri;
use crate::ic_entry::{IcEntry, IcId, IcUpdate, IcUpdateRef};
use crate::position::{FilePosition, Timestamp};
use crate::reference::{function_reference_for_ic, FunctionReference};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while building a log
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Out-of-order record for {position}: {timestamp} precedes {previous}")]
    OutOfOrder {
        position: FilePosition,
        previous: Timestamp,
        timestamp: Timestamp,
    },

    #[error("Unknown function handle #{}", .0.index())]
    UnknownFunction(FunctionId),

    #[error("IC at {site} refers to unknown function at {function}")]
    UnresolvedFunction {
        site: FilePosition,
        function: FilePosition,
    },

    #[error("Duplicate {kind} entry at {position}")]
    DuplicateEntry {
        kind: &'static str,
        position: FilePosition,
    },

    #[error("Invalid log snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result type for log construction
pub type Result<T> = std::result::Result<T, LogError>;

/// Frozen collection of all entries of one trace
#[derive(Debug, Default)]
pub struct Log {
    functions: Vec<FunctionEntry>,
    ics: Vec<IcEntry>,
    functions_by_position: HashMap<FilePosition, FunctionId>,
    ics_by_position: HashMap<FilePosition, IcId>,
}

impl Log {
    /// Decode and ingest a JSON log snapshot
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: LogSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    /// Ingest a decoded log snapshot
    pub fn from_snapshot(snapshot: LogSnapshot) -> Result<Self> {
        snapshot.ingest()
    }

    /// Function entries in ingestion order
    pub fn functions(&self) -> impl ExactSizeIterator<Item = &FunctionEntry> {
        self.functions.iter()
    }

    /// IC entries in ingestion order
    pub fn ics(&self) -> impl ExactSizeIterator<Item = &IcEntry> {
        self.ics.iter()
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionEntry> {
        self.functions.get(id.0)
    }

    pub fn ic(&self, id: IcId) -> Option<&IcEntry> {
        self.ics.get(id.0)
    }

    /// Resolve an IC update handle stored in a function timeline
    pub fn ic_update(&self, reference: IcUpdateRef) -> Option<(&IcEntry, &IcUpdate)> {
        let ic = self.ic(reference.ic)?;
        ic.updates().get(reference.index).map(|update| (ic, update))
    }

    pub fn find_function_entry_by_file_position(&self, position: &FilePosition) -> Option<&FunctionEntry> {
        self.functions_by_position
            .get(position)
            .and_then(|id| self.function(*id))
    }

    pub fn find_ic_entry_by_file_position(&self, position: &FilePosition) -> Option<&IcEntry> {
        self.ics_by_position.get(position).and_then(|id| self.ic(*id))
    }

    /// Resolve a function-history URI (see [`crate::history_uri`])
    pub fn find_function_entry_by_uri(&self, uri: &str) -> Option<&FunctionEntry> {
        let position = file_position_from_uri(uri)?;
        self.find_function_entry_by_file_position(&position)
    }

    /// Functions whose position lies in `file`, in ingestion order
    pub fn functions_in_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a FunctionEntry> + 'a {
        self.functions
            .iter()
            .filter(move |entry| entry.file_position().file == file)
    }

    /// Function executing during the worst transition of `ic`
    pub fn function_reference_for_ic(&self, ic: &IcEntry) -> Option<&FunctionReference> {
        function_reference_for_ic(self, ic)
    }

    /// Whether `entry` is owned by this log (not merely equal to an entry of it)
    pub fn owns_function(&self, entry: &FunctionEntry) -> bool {
        self.function(entry.id())
            .is_some_and(|owned| std::ptr::eq(owned, entry))
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.ics.is_empty()
    }
}

#[cfg(test)]
mod tests;
