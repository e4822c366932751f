// JSON interchange between a trace producer and the entry index
//
// A snapshot lists entries with their raw records. IC updates name the
// executing function by file position (a lookup key), never by embedding
// it. Ingestion replays every record through `LogBuilder` in global
// timestamp order so IC events interleave correctly with each function's
// own events.

use super::{Log, LogBuilder, LogError, Result};
use crate::function_entry::{DeoptUpdate, FunctionId, FunctionUpdate};
use crate::ic_entry::IcUpdate;
use crate::position::{Address, FilePosition, Location, Timestamp};
use crate::v8::{CodeKind, DeoptimizeKind, FunctionState, IcState, IcType, SymbolKind};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Serialized form of a complete log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSnapshot {
    #[serde(default)]
    pub functions: Vec<FunctionRecord>,
    #[serde(default)]
    pub ics: Vec<IcRecord>,
}

/// One function and its events, in timestamp order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    #[serde(default)]
    pub symbol_kind: SymbolKind,
    pub file_position: FilePosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_location: Option<Location>,
    #[serde(default)]
    pub events: Vec<FunctionEventRecord>,
}

/// Function event record, tagged by `"event"`
///
/// IC events are not listed here; they are derived from [`IcRecord`]s.
/// An unrecognized tag fails decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum FunctionEventRecord {
    Created {
        timestamp: Timestamp,
        #[serde(default = "default_code_type")]
        code_type: String,
        state: FunctionState,
        code_kind: CodeKind,
        #[serde(default)]
        size: u32,
        #[serde(default)]
        start_address: Address,
        #[serde(default)]
        func_start_address: Address,
    },
    Updated {
        timestamp: Timestamp,
        #[serde(default = "default_code_type")]
        code_type: String,
        state: FunctionState,
        code_kind: CodeKind,
        #[serde(default)]
        size: u32,
        #[serde(default)]
        start_address: Address,
        #[serde(default)]
        func_start_address: Address,
    },
    Moved {
        timestamp: Timestamp,
        from_address: Address,
        to_address: Address,
    },
    Deleted {
        timestamp: Timestamp,
        start_address: Address,
    },
    SfiMoved {
        timestamp: Timestamp,
        from_address: Address,
        to_address: Address,
    },
    Deopt {
        timestamp: Timestamp,
        bailout_type: DeoptimizeKind,
        #[serde(default)]
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<Location>,
    },
}

fn default_code_type() -> String {
    "Function".to_string()
}

impl FunctionEventRecord {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            FunctionEventRecord::Created { timestamp, .. }
            | FunctionEventRecord::Updated { timestamp, .. }
            | FunctionEventRecord::Moved { timestamp, .. }
            | FunctionEventRecord::Deleted { timestamp, .. }
            | FunctionEventRecord::SfiMoved { timestamp, .. }
            | FunctionEventRecord::Deopt { timestamp, .. } => *timestamp,
        }
    }
}

/// One IC site and its transitions, in timestamp order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcRecord {
    pub file_position: FilePosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_location: Option<Location>,
    #[serde(default)]
    pub updates: Vec<IcUpdateRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcUpdateRecord {
    pub timestamp: Timestamp,
    pub ic_type: IcType,
    #[serde(default)]
    pub key: String,
    pub old_state: IcState,
    pub new_state: IcState,
    /// Position of the function executing during the transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FilePosition>,
}

enum Replay<'a> {
    Function(FunctionId, &'a FunctionEventRecord),
    Ic(&'a IcRecord, &'a IcUpdateRecord, Option<FunctionId>),
}

impl LogSnapshot {
    pub(super) fn ingest(&self) -> Result<Log> {
        let mut builder = LogBuilder::new();
        let mut replay: Vec<(Timestamp, Replay<'_>)> = Vec::new();

        for record in &self.functions {
            if builder.contains_function(&record.file_position) {
                return Err(LogError::DuplicateEntry {
                    kind: "function",
                    position: record.file_position.clone(),
                });
            }
            check_sorted(&record.file_position, record.events.iter().map(FunctionEventRecord::timestamp))?;
            let id = builder.function(
                record.name.clone(),
                record.symbol_kind,
                record.file_position.clone(),
                record.reference_location.clone(),
            );
            replay.extend(
                record
                    .events
                    .iter()
                    .map(|event| (event.timestamp(), Replay::Function(id, event))),
            );
        }

        let mut seen_ics = HashSet::new();
        for record in &self.ics {
            if !seen_ics.insert(&record.file_position) {
                return Err(LogError::DuplicateEntry {
                    kind: "IC",
                    position: record.file_position.clone(),
                });
            }
            check_sorted(&record.file_position, record.updates.iter().map(|u| u.timestamp))?;
            builder.ic(record.file_position.clone(), record.reference_location.clone());
            for update in &record.updates {
                let function = match &update.function {
                    Some(position) => Some(builder.function_id(position).ok_or_else(|| {
                        LogError::UnresolvedFunction {
                            site: record.file_position.clone(),
                            function: position.clone(),
                        }
                    })?),
                    None => None,
                };
                replay.push((update.timestamp, Replay::Ic(record, update, function)));
            }
        }

        // Stable: records with equal timestamps keep their listed order
        replay.sort_by_key(|(timestamp, _)| *timestamp);

        for (_, step) in replay {
            match step {
                Replay::Function(id, event) => apply_function_event(&mut builder, id, event)?,
                Replay::Ic(record, update, function) => {
                    builder.record_ic(
                        record.file_position.clone(),
                        record.reference_location.clone(),
                        IcUpdate {
                            timestamp: update.timestamp,
                            ic_type: update.ic_type,
                            key: update.key.clone(),
                            old_state: update.old_state,
                            new_state: update.new_state,
                            function,
                        },
                    )?;
                }
            }
        }

        Ok(builder.finish())
    }
}

fn apply_function_event(builder: &mut LogBuilder, id: FunctionId, event: &FunctionEventRecord) -> Result<()> {
    match event {
        FunctionEventRecord::Created {
            timestamp,
            code_type,
            state,
            code_kind,
            size,
            start_address,
            func_start_address,
        } => builder.record_created(
            id,
            code_type.clone(),
            FunctionUpdate {
                timestamp: *timestamp,
                state: *state,
                code_kind: *code_kind,
                size: *size,
                start_address: *start_address,
                func_start_address: *func_start_address,
            },
        ),
        FunctionEventRecord::Updated {
            timestamp,
            code_type,
            state,
            code_kind,
            size,
            start_address,
            func_start_address,
        } => builder.record_updated(
            id,
            code_type.clone(),
            FunctionUpdate {
                timestamp: *timestamp,
                state: *state,
                code_kind: *code_kind,
                size: *size,
                start_address: *start_address,
                func_start_address: *func_start_address,
            },
        ),
        FunctionEventRecord::Moved {
            timestamp,
            from_address,
            to_address,
        } => builder.record_moved(id, *timestamp, *from_address, *to_address),
        FunctionEventRecord::Deleted {
            timestamp,
            start_address,
        } => builder.record_deleted(id, *timestamp, *start_address),
        FunctionEventRecord::SfiMoved {
            timestamp,
            from_address,
            to_address,
        } => builder.record_sfi_moved(id, *timestamp, *from_address, *to_address),
        FunctionEventRecord::Deopt {
            timestamp,
            bailout_type,
            reason,
            location,
        } => builder.record_deopt(
            id,
            DeoptUpdate {
                timestamp: *timestamp,
                bailout_type: *bailout_type,
                reason: reason.clone(),
                location: location.clone(),
            },
        ),
    }
}

fn check_sorted(position: &FilePosition, timestamps: impl Iterator<Item = Timestamp>) -> Result<()> {
    let mut previous: Option<Timestamp> = None;
    for timestamp in timestamps {
        if let Some(previous) = previous.filter(|previous| timestamp < *previous) {
            return Err(LogError::OutOfOrder {
                position: position.clone(),
                previous,
                timestamp,
            });
        }
        previous = Some(timestamp);
    }
    Ok(())
}

/// Load a JSON log snapshot from disk
///
/// # Errors
/// Returns error if the file cannot be read, is not a valid snapshot, or
/// violates ordering/reference rules.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> anyhow::Result<Log> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log snapshot: {}", path.display()))?;
    let log = Log::from_json_str(&content)
        .with_context(|| format!("Failed to load log snapshot: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        functions = log.functions().len(),
        ics = log.ics().len(),
        "loaded log snapshot"
    );
    Ok(log)
}
