//! URIs naming a function history view
//!
//! Format: `deoptscope-function-history:<file position>/<function name>.md`,
//! both components percent-encoded. Only the position is significant when
//! resolving; the name keeps the URI readable in editor tabs.

use crate::function_entry::FunctionEntry;
use crate::position::FilePosition;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

/// URI scheme of function history views
pub const FUNCTION_HISTORY_SCHEME: &str = "deoptscope-function-history";

/// Build the history URI for a function entry
pub fn uri_for_function_entry(entry: &FunctionEntry) -> String {
    format!(
        "{}:{}/{}.md",
        FUNCTION_HISTORY_SCHEME,
        utf8_percent_encode(&entry.file_position().to_string(), NON_ALPHANUMERIC),
        utf8_percent_encode(entry.function_name(), NON_ALPHANUMERIC),
    )
}

/// Recover the file position from a history URI
///
/// `None` for other schemes or when the position component is malformed.
pub fn file_position_from_uri(uri: &str) -> Option<FilePosition> {
    let rest = uri
        .strip_prefix(FUNCTION_HISTORY_SCHEME)?
        .strip_prefix(':')?;
    let encoded = rest.split('/').next()?;
    let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
    decoded.parse().ok()
}
