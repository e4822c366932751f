use super::StateParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inline-cache state, in the engine's declaration order
///
/// The derived `Ord` is the severity order: later variants describe a cache
/// that has seen more shapes and performs worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcState {
    /// `X`
    NoFeedback,
    /// `0`
    Uninitialized,
    /// `.`
    Premonomorphic,
    /// `1`
    Monomorphic,
    /// `^`
    RecomputeHandler,
    /// `P`
    Polymorphic,
    /// `N`
    Megamorphic,
    /// `D`
    MegaDom,
    /// `G`
    Generic,
}

impl IcState {
    /// All states from healthiest to most degraded
    pub const ALL: [IcState; 9] = [
        IcState::NoFeedback,
        IcState::Uninitialized,
        IcState::Premonomorphic,
        IcState::Monomorphic,
        IcState::RecomputeHandler,
        IcState::Polymorphic,
        IcState::Megamorphic,
        IcState::MegaDom,
        IcState::Generic,
    ];

    /// Parse the single-character state marker used in `--log-ic` lines
    pub fn from_marker(marker: &str) -> Option<Self> {
        let state = match marker {
            "X" => IcState::NoFeedback,
            "0" => IcState::Uninitialized,
            "." => IcState::Premonomorphic,
            "1" => IcState::Monomorphic,
            "^" => IcState::RecomputeHandler,
            "P" => IcState::Polymorphic,
            "N" => IcState::Megamorphic,
            "D" => IcState::MegaDom,
            "G" => IcState::Generic,
            _ => return None,
        };
        Some(state)
    }

    /// Lower-case display name (e.g. "megamorphic")
    pub fn name(self) -> &'static str {
        match self {
            IcState::NoFeedback => "no feedback",
            IcState::Uninitialized => "uninitialized",
            IcState::Premonomorphic => "premonomorphic",
            IcState::Monomorphic => "monomorphic",
            IcState::RecomputeHandler => "recompute handler",
            IcState::Polymorphic => "polymorphic",
            IcState::Megamorphic => "megamorphic",
            IcState::MegaDom => "megadom",
            IcState::Generic => "generic",
        }
    }
}

/// Severity ordinal of an IC state; higher means more degraded
///
/// Monotone with the derived `Ord` of [`IcState`].
pub fn severity_of(state: IcState) -> u8 {
    state as u8
}

impl fmt::Display for IcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IcState {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(state) = Self::from_marker(s) {
            return Ok(state);
        }
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();
        Self::ALL
            .into_iter()
            .find(|state| state.name().replace(' ', "").eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| StateParseError::new("IC state", s))
    }
}
