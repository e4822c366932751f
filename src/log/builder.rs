use super::{Log, LogError, Result};
use crate::function_entry::{DeoptUpdate, FunctionEntry, FunctionId, FunctionTimelineEvent, FunctionUpdate};
use crate::ic_entry::{IcEntry, IcId, IcUpdate, IcUpdateRef};
use crate::position::{Address, FilePosition, Location, Timestamp};
use crate::v8::SymbolKind;
use std::collections::HashMap;

/// Append-only ingestion of trace records into a [`Log`]
///
/// Records must arrive in timestamp order per entry; a record older than
/// the entry's last event is rejected with [`LogError::OutOfOrder`] and
/// leaves the builder unchanged. Entries cannot be read back from the
/// builder, so no consumer can derive state from a half-built timeline.
///
/// # Example
/// ```
/// use deoptscope::log::LogBuilder;
/// use deoptscope::function_entry::FunctionUpdate;
/// use deoptscope::position::{Address, FilePosition, Timestamp};
/// use deoptscope::v8::{CodeKind, FunctionState, SymbolKind};
///
/// let mut builder = LogBuilder::new();
/// let bar = builder.function("bar", SymbolKind::Function, FilePosition::new("/app.js", 0, 0), None);
/// builder.record_created(bar, "Function", FunctionUpdate {
///     timestamp: Timestamp(1),
///     state: FunctionState::Compiled,
///     code_kind: CodeKind::InterpretedFunction,
///     size: 120,
///     start_address: Address(0x1000),
///     func_start_address: Address(0x2000),
/// }).unwrap();
///
/// let log = builder.finish();
/// let entry = log.function(bar).unwrap();
/// assert_eq!(entry.label(), "bar (1)");
/// ```
#[derive(Debug, Default)]
pub struct LogBuilder {
    functions: Vec<FunctionEntry>,
    ics: Vec<IcEntry>,
    functions_by_position: HashMap<FilePosition, FunctionId>,
    ics_by_position: HashMap<FilePosition, IcId>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the function entry at `file_position`
    ///
    /// The first observation fixes the name, kind and reference location.
    pub fn function(
        &mut self,
        name: impl Into<String>,
        symbol_kind: SymbolKind,
        file_position: FilePosition,
        reference_location: Option<Location>,
    ) -> FunctionId {
        if let Some(id) = self.functions_by_position.get(&file_position) {
            return *id;
        }
        let id = FunctionId(self.functions.len());
        let name = name.into();
        tracing::debug!(function = %name, position = %file_position, "new function entry");
        self.functions_by_position.insert(file_position.clone(), id);
        self.functions.push(FunctionEntry::new(
            id,
            name,
            symbol_kind,
            file_position,
            reference_location,
        ));
        id
    }

    /// Whether a function entry already exists at `file_position`
    pub fn contains_function(&self, file_position: &FilePosition) -> bool {
        self.functions_by_position.contains_key(file_position)
    }

    pub fn contains_ic(&self, file_position: &FilePosition) -> bool {
        self.ics_by_position.contains_key(file_position)
    }

    /// Look up the handle of an existing function entry
    pub fn function_id(&self, file_position: &FilePosition) -> Option<FunctionId> {
        self.functions_by_position.get(file_position).copied()
    }

    pub fn record_created(
        &mut self,
        id: FunctionId,
        code_type: impl Into<String>,
        update: FunctionUpdate,
    ) -> Result<()> {
        self.record_code(id, code_type.into(), update, true)
    }

    pub fn record_updated(
        &mut self,
        id: FunctionId,
        code_type: impl Into<String>,
        update: FunctionUpdate,
    ) -> Result<()> {
        self.record_code(id, code_type.into(), update, false)
    }

    fn record_code(
        &mut self,
        id: FunctionId,
        code_type: String,
        update: FunctionUpdate,
        created: bool,
    ) -> Result<()> {
        let entry = self.function_in_order(id, update.timestamp)?;
        entry.push_update(code_type, update, created);
        Ok(())
    }

    pub fn record_moved(
        &mut self,
        id: FunctionId,
        timestamp: Timestamp,
        from_address: Address,
        to_address: Address,
    ) -> Result<()> {
        self.push_function_event(
            id,
            FunctionTimelineEvent::Moved {
                timestamp,
                from_address,
                to_address,
            },
        )
    }

    pub fn record_deleted(&mut self, id: FunctionId, timestamp: Timestamp, start_address: Address) -> Result<()> {
        self.push_function_event(
            id,
            FunctionTimelineEvent::Deleted {
                timestamp,
                start_address,
            },
        )
    }

    pub fn record_sfi_moved(
        &mut self,
        id: FunctionId,
        timestamp: Timestamp,
        from_address: Address,
        to_address: Address,
    ) -> Result<()> {
        self.push_function_event(
            id,
            FunctionTimelineEvent::SfiMoved {
                timestamp,
                from_address,
                to_address,
            },
        )
    }

    pub fn record_deopt(&mut self, id: FunctionId, deopt: DeoptUpdate) -> Result<()> {
        self.push_function_event(id, FunctionTimelineEvent::Deopt(deopt))
    }

    fn push_function_event(&mut self, id: FunctionId, event: FunctionTimelineEvent) -> Result<()> {
        let entry = self.function_in_order(id, event.timestamp())?;
        entry.push_event(event);
        Ok(())
    }

    /// Get or create the IC entry at `file_position`
    pub fn ic(&mut self, file_position: FilePosition, reference_location: Option<Location>) -> IcId {
        if let Some(id) = self.ics_by_position.get(&file_position) {
            return *id;
        }
        let id = IcId(self.ics.len());
        tracing::debug!(position = %file_position, "new IC entry");
        self.ics_by_position.insert(file_position.clone(), id);
        self.ics.push(IcEntry::new(id, file_position, reference_location));
        id
    }

    /// Record an IC transition at `file_position`
    ///
    /// Creates the IC entry on first sight. When the update names the
    /// executing function, the transition is also appended to that
    /// function's timeline.
    pub fn record_ic(
        &mut self,
        file_position: FilePosition,
        reference_location: Option<Location>,
        update: IcUpdate,
    ) -> Result<IcId> {
        let timestamp = update.timestamp;
        let function = update.function;

        // Validate everything before mutating anything
        if let Some(function) = function {
            self.function_in_order(function, timestamp)?;
        }
        if let Some(ic) = self.ics_by_position.get(&file_position) {
            let entry = &self.ics[ic.0];
            check_order(entry.file_position(), entry.last_timestamp(), timestamp)?;
        }

        let id = self.ic(file_position, reference_location);
        let index = self.ics[id.0].push_update(update);

        if let Some(function) = function {
            self.functions[function.0].push_event(FunctionTimelineEvent::Ic {
                timestamp,
                update: IcUpdateRef { ic: id, index },
            });
        }
        Ok(id)
    }

    fn function_in_order(&mut self, id: FunctionId, timestamp: Timestamp) -> Result<&mut FunctionEntry> {
        let entry = self
            .functions
            .get_mut(id.0)
            .ok_or(LogError::UnknownFunction(id))?;
        check_order(entry.file_position(), entry.last_timestamp(), timestamp)?;
        Ok(entry)
    }

    /// Signal ingestion complete and freeze the entries
    pub fn finish(self) -> Log {
        tracing::info!(
            functions = self.functions.len(),
            ics = self.ics.len(),
            "log ingestion complete"
        );
        Log {
            functions: self.functions,
            ics: self.ics,
            functions_by_position: self.functions_by_position,
            ics_by_position: self.ics_by_position,
        }
    }
}

fn check_order(position: &FilePosition, previous: Option<Timestamp>, timestamp: Timestamp) -> Result<()> {
    match previous {
        Some(previous) if timestamp < previous => {
            tracing::warn!(%position, %previous, %timestamp, "rejecting out-of-order record");
            Err(LogError::OutOfOrder {
                position: position.clone(),
                previous,
                timestamp,
            })
        }
        _ => Ok(()),
    }
}
