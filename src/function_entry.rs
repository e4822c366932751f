//! Function timeline model
//!
//! A [`FunctionEntry`] is one logical function over the lifetime of a trace:
//! every code-creation/update record for it (`updates`) plus the unified
//! chronological history shown to users (`timeline`), which also carries
//! moves, deletions, deoptimizations and inline-cache transitions.
//!
//! Derived values (`current_state`, `function_reference`) are computed on
//! first access and cached for the life of the entry. Entries are frozen
//! once [`crate::log::LogBuilder::finish`] hands them to a
//! [`crate::log::Log`], so the cells are never reset.

use crate::ic_entry::IcUpdateRef;
use crate::position::{Address, FilePosition, Location, Timestamp};
use crate::reference::FunctionReference;
use crate::v8::{is_optimized_function_state, CodeKind, DeoptimizeKind, FunctionState, SymbolKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Non-owning handle to a [`FunctionEntry`] inside one [`crate::log::Log`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub(crate) usize);

impl FunctionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One compilation or recompilation of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionUpdate {
    pub timestamp: Timestamp,
    pub state: FunctionState,
    pub code_kind: CodeKind,
    pub size: u32,
    pub start_address: Address,
    pub func_start_address: Address,
}

/// One deoptimization of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeoptUpdate {
    pub timestamp: Timestamp,
    pub bailout_type: DeoptimizeKind,
    pub reason: String,
    /// Source location that triggered the bailout, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Code event payload shared by `Created` and `Updated`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEvent {
    /// Log tag of the code event (e.g. "Function", "LazyCompile")
    pub code_type: String,
    pub update: FunctionUpdate,
}

/// One entry of a function's chronological history
///
/// Closed set of event kinds; every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionTimelineEvent {
    Created(CodeEvent),
    Updated(CodeEvent),
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
    Deopt(DeoptUpdate),
    /// Inline-cache transition observed while this function was executing
    Ic {
        timestamp: Timestamp,
        update: IcUpdateRef,
    },
}

impl FunctionTimelineEvent {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            FunctionTimelineEvent::Created(event) | FunctionTimelineEvent::Updated(event) => {
                event.update.timestamp
            }
            FunctionTimelineEvent::Moved { timestamp, .. }
            | FunctionTimelineEvent::Deleted { timestamp, .. }
            | FunctionTimelineEvent::SfiMoved { timestamp, .. }
            | FunctionTimelineEvent::Ic { timestamp, .. } => *timestamp,
            FunctionTimelineEvent::Deopt(deopt) => deopt.timestamp,
        }
    }

    /// Tag of the event as written in log snapshots
    pub fn kind(&self) -> &'static str {
        match self {
            FunctionTimelineEvent::Created(_) => "created",
            FunctionTimelineEvent::Updated(_) => "updated",
            FunctionTimelineEvent::Moved { .. } => "moved",
            FunctionTimelineEvent::Deleted { .. } => "deleted",
            FunctionTimelineEvent::SfiMoved { .. } => "sfi-moved",
            FunctionTimelineEvent::Deopt(_) => "deopt",
            FunctionTimelineEvent::Ic { .. } => "ic",
        }
    }
}

/// Summary state of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentState {
    State(FunctionState),
    /// More than one optimized compilation was observed; no single tier
    /// summarizes the function
    Conflict,
}

impl CurrentState {
    pub fn state(self) -> Option<FunctionState> {
        match self {
            CurrentState::State(state) => Some(state),
            CurrentState::Conflict => None,
        }
    }

    pub fn is_conflict(self) -> bool {
        matches!(self, CurrentState::Conflict)
    }
}

impl fmt::Display for CurrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrentState::State(state) => fmt::Display::fmt(state, f),
            CurrentState::Conflict => f.write_str("mixed"),
        }
    }
}

/// One function and its full history within a log
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    id: FunctionId,
    function_name: String,
    symbol_kind: SymbolKind,
    file_position: FilePosition,
    reference_location: Option<Location>,
    updates: Vec<FunctionUpdate>,
    timeline: Vec<FunctionTimelineEvent>,
    state: OnceLock<CurrentState>,
    reference: OnceLock<FunctionReference>,
}

impl FunctionEntry {
    pub(crate) fn new(
        id: FunctionId,
        function_name: String,
        symbol_kind: SymbolKind,
        file_position: FilePosition,
        reference_location: Option<Location>,
    ) -> Self {
        Self {
            id,
            function_name,
            symbol_kind,
            file_position,
            reference_location,
            updates: Vec::new(),
            timeline: Vec::new(),
            state: OnceLock::new(),
            reference: OnceLock::new(),
        }
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn symbol_kind(&self) -> SymbolKind {
        self.symbol_kind
    }

    pub fn file_position(&self) -> &FilePosition {
        &self.file_position
    }

    /// Navigable location of the function, `None` when unknown
    pub fn reference_location(&self) -> Option<&Location> {
        self.reference_location.as_ref()
    }

    /// Compilation records, in timestamp order
    pub fn updates(&self) -> &[FunctionUpdate] {
        &self.updates
    }

    /// Full history, in timestamp order
    pub fn timeline(&self) -> &[FunctionTimelineEvent] {
        &self.timeline
    }

    /// Timestamp of the last timeline event, used for ordering checks
    pub(crate) fn last_timestamp(&self) -> Option<Timestamp> {
        self.timeline.last().map(FunctionTimelineEvent::timestamp)
    }

    pub(crate) fn push_update(&mut self, code_type: String, update: FunctionUpdate, created: bool) {
        let event = CodeEvent {
            code_type,
            update: update.clone(),
        };
        self.updates.push(update);
        self.timeline.push(if created {
            FunctionTimelineEvent::Created(event)
        } else {
            FunctionTimelineEvent::Updated(event)
        });
    }

    pub(crate) fn push_event(&mut self, event: FunctionTimelineEvent) {
        self.timeline.push(event);
    }

    /// Current state of the function
    ///
    /// `Conflict` when more than one update is an optimized tier, otherwise
    /// the state of the last update, or `Compiled` if there are none.
    pub fn current_state(&self) -> CurrentState {
        *self.state.get_or_init(|| {
            let optimized = self
                .updates
                .iter()
                .filter(|update| is_optimized_function_state(update.state))
                .count();
            if optimized > 1 {
                CurrentState::Conflict
            } else {
                CurrentState::State(
                    self.updates
                        .last()
                        .map(|update| update.state)
                        .unwrap_or(FunctionState::Compiled),
                )
            }
        })
    }

    /// `name (update count)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.function_name, self.updates.len())
    }

    /// Number of optimized compilations
    pub fn optimized_update_count(&self) -> usize {
        self.updates
            .iter()
            .filter(|update| is_optimized_function_state(update.state))
            .count()
    }

    /// Deoptimizations in timeline order
    pub fn deopts(&self) -> impl Iterator<Item = &DeoptUpdate> {
        self.timeline.iter().filter_map(|event| match event {
            FunctionTimelineEvent::Deopt(deopt) => Some(deopt),
            _ => None,
        })
    }

    /// Navigation handle for this function, built once per entry
    pub fn function_reference(&self) -> &FunctionReference {
        self.reference
            .get_or_init(|| FunctionReference::from_function_entry(self))
    }
}
