use super::StateParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compilation tier of a function as recorded by a code-creation event
///
/// V8 encodes the tier as a one-character marker appended to the function
/// name in `code-creation` log lines (`~foo`, `*foo`, `^foo`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionState {
    /// Compiled without tier information (no marker)
    Compiled,
    /// Interpreted bytecode eligible for optimization (`~`)
    Optimizable,
    /// TurboFan optimized code (`*`)
    Optimized,
    /// Interpreted, not yet eligible for optimization
    Interpreted,
    /// Sparkplug baseline code (`^`)
    Baseline,
    /// Maglev mid-tier optimized code (`+`)
    Maglev,
    /// Turboprop optimized code (`-`)
    Turboprop,
    /// Native-context-independent optimized code
    NativeContextIndependent,
}

impl FunctionState {
    /// All states in declaration order
    pub const ALL: [FunctionState; 8] = [
        FunctionState::Compiled,
        FunctionState::Optimizable,
        FunctionState::Optimized,
        FunctionState::Interpreted,
        FunctionState::Baseline,
        FunctionState::Maglev,
        FunctionState::Turboprop,
        FunctionState::NativeContextIndependent,
    ];

    /// Parse the tier marker V8 prefixes to function names in code events
    ///
    /// Returns `None` for characters that are not tier markers.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "" => Some(FunctionState::Compiled),
            "~" => Some(FunctionState::Optimizable),
            "*" => Some(FunctionState::Optimized),
            "^" => Some(FunctionState::Baseline),
            "+" => Some(FunctionState::Maglev),
            "-" => Some(FunctionState::Turboprop),
            _ => None,
        }
    }

    /// Human-readable name of the state
    pub fn name(self) -> &'static str {
        match self {
            FunctionState::Compiled => "Compiled",
            FunctionState::Optimizable => "Optimizable",
            FunctionState::Optimized => "Optimized",
            FunctionState::Interpreted => "Interpreted",
            FunctionState::Baseline => "Baseline",
            FunctionState::Maglev => "Maglev",
            FunctionState::Turboprop => "Turboprop",
            FunctionState::NativeContextIndependent => "NativeContextIndependent",
        }
    }
}

/// Whether `state` is any tier of JIT-optimized code
///
/// Baseline, interpreted and plain compiled code are not optimized.
pub fn is_optimized_function_state(state: FunctionState) -> bool {
    matches!(
        state,
        FunctionState::Optimized
            | FunctionState::Maglev
            | FunctionState::Turboprop
            | FunctionState::NativeContextIndependent
    )
}

impl fmt::Display for FunctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FunctionState {
    type Err = StateParseError;

    /// Accepts either a tier marker or a state name (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(state) = Self::from_marker(s) {
            return Ok(state);
        }
        Self::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| StateParseError::new("function state", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimized_tiers() {
        assert!(is_optimized_function_state(FunctionState::Optimized));
        assert!(is_optimized_function_state(FunctionState::Maglev));
        assert!(is_optimized_function_state(FunctionState::Turboprop));
        assert!(is_optimized_function_state(
            FunctionState::NativeContextIndependent
        ));
    }

    #[test]
    fn test_unoptimized_tiers() {
        assert!(!is_optimized_function_state(FunctionState::Compiled));
        assert!(!is_optimized_function_state(FunctionState::Optimizable));
        assert!(!is_optimized_function_state(FunctionState::Interpreted));
        assert!(!is_optimized_function_state(FunctionState::Baseline));
    }

    #[test]
    fn test_parse_markers() {
        assert_eq!("".parse::<FunctionState>(), Ok(FunctionState::Compiled));
        assert_eq!("~".parse::<FunctionState>(), Ok(FunctionState::Optimizable));
        assert_eq!("*".parse::<FunctionState>(), Ok(FunctionState::Optimized));
        assert_eq!("^".parse::<FunctionState>(), Ok(FunctionState::Baseline));
        assert_eq!("+".parse::<FunctionState>(), Ok(FunctionState::Maglev));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "optimized".parse::<FunctionState>(),
            Ok(FunctionState::Optimized)
        );
        assert_eq!(
            "Interpreted".parse::<FunctionState>(),
            Ok(FunctionState::Interpreted)
        );
        let err = "bogus".parse::<FunctionState>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown function state: 'bogus'");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&FunctionState::NativeContextIndependent).unwrap();
        assert_eq!(json, "\"native_context_independent\"");
        let state: FunctionState = serde_json::from_str("\"maglev\"").unwrap();
        assert_eq!(state, FunctionState::Maglev);
    }
}
