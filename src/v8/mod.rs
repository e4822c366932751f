// V8 engine enumerations and severity classification
//
// Function tiers and inline-cache states as the engine reports them in its
// `--log-function-events` / `--log-ic` output. The ordering of `IcState`
// follows the engine's own declaration order and doubles as the severity
// ranking used for every "worst state" comparison in this crate.

mod function_state;
mod ic_state;
mod kinds;

pub use function_state::{is_optimized_function_state, FunctionState};
pub use ic_state::{severity_of, IcState};
pub use kinds::{CodeKind, DeoptimizeKind, IcType, SymbolKind};

use thiserror::Error;

/// Error returned when a V8 enumeration cannot be parsed from its log marker or name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: '{value}'")]
pub struct StateParseError {
    /// Enumeration being parsed (e.g. "IC state")
    pub kind: &'static str,
    /// Offending input
    pub value: String,
}

impl StateParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
