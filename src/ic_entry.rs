//! Inline-cache timeline model
//!
//! An [`IcEntry`] collects every state transition observed at one call
//! site. The entry is summarized by its worst update: the transition to the
//! most degraded state, with ties resolved in favor of the most recent one
//! so the user sees the latest time the site fell to that tier.

use crate::function_entry::FunctionId;
use crate::position::{FilePosition, Location, Timestamp};
use crate::v8::{severity_of, IcState, IcType};
use std::sync::OnceLock;

/// Non-owning handle to an [`IcEntry`] inside one [`crate::log::Log`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IcId(pub(crate) usize);

impl IcId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to one update of one IC entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IcUpdateRef {
    pub ic: IcId,
    pub index: usize,
}

/// One inline-cache transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcUpdate {
    pub timestamp: Timestamp,
    pub ic_type: IcType,
    /// Property name or element key the IC was looking up
    pub key: String,
    pub old_state: IcState,
    pub new_state: IcState,
    /// Function executing when the transition happened (lookup only)
    pub function: Option<FunctionId>,
}

/// All transitions observed at one call site
#[derive(Debug, Clone)]
pub struct IcEntry {
    id: IcId,
    file_position: FilePosition,
    reference_location: Option<Location>,
    updates: Vec<IcUpdate>,
    worst: OnceLock<Option<usize>>,
}

impl IcEntry {
    pub(crate) fn new(
        id: IcId,
        file_position: FilePosition,
        reference_location: Option<Location>,
    ) -> Self {
        Self {
            id,
            file_position,
            reference_location,
            updates: Vec::new(),
            worst: OnceLock::new(),
        }
    }

    pub fn id(&self) -> IcId {
        self.id
    }

    pub fn file_position(&self) -> &FilePosition {
        &self.file_position
    }

    pub fn reference_location(&self) -> Option<&Location> {
        self.reference_location.as_ref()
    }

    pub fn updates(&self) -> &[IcUpdate] {
        &self.updates
    }

    pub(crate) fn last_timestamp(&self) -> Option<Timestamp> {
        self.updates.last().map(|update| update.timestamp)
    }

    /// Appends an update and returns its index
    pub(crate) fn push_update(&mut self, update: IcUpdate) -> usize {
        self.updates.push(update);
        self.updates.len() - 1
    }

    fn worst_index(&self) -> Option<usize> {
        *self.worst.get_or_init(|| {
            let mut worst: Option<(usize, u8)> = None;
            for (index, update) in self.updates.iter().enumerate() {
                let severity = severity_of(update.new_state);
                // `>=` so the latest of equally severe updates wins
                if worst.map_or(true, |(_, best)| severity >= best) {
                    worst = Some((index, severity));
                }
            }
            worst.map(|(index, _)| index)
        })
    }

    /// Update whose new state is the most severe, preferring the later one
    pub fn worst_update(&self) -> Option<&IcUpdate> {
        self.worst_index().map(|index| &self.updates[index])
    }

    /// Reference to the worst update, for timeline cross-linking
    pub fn worst_update_ref(&self) -> Option<IcUpdateRef> {
        self.worst_index().map(|index| IcUpdateRef { ic: self.id, index })
    }

    pub fn worst_state(&self) -> Option<IcState> {
        self.worst_update().map(|update| update.new_state)
    }

    /// Number of observed transitions
    pub fn hit_count(&self) -> usize {
        self.updates.len()
    }

    /// `"<IcType>: <worst state> (<hits>)"`, or `"Unknown (0)"` when empty
    pub fn label(&self) -> String {
        format!("{} ({})", self.summary(), self.hit_count())
    }

    /// Label without the hit count
    pub fn summary(&self) -> String {
        match self.worst_update() {
            Some(update) => format!("{}: {}", update.ic_type, update.new_state),
            None => "Unknown".to_string(),
        }
    }
}
