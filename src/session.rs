//! The currently opened log
//!
//! Consumers hold `Arc<Log>` clones, so replacing or closing the session
//! never invalidates a log someone is still reading.

use crate::function_entry::FunctionEntry;
use crate::log::Log;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct LogSession {
    opened: Option<Arc<Log>>,
}

impl LogSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `log`, replacing (and returning) any previously opened log
    pub fn open(&mut self, log: Log) -> Option<Arc<Log>> {
        tracing::info!(
            functions = log.functions().len(),
            ics = log.ics().len(),
            "opened log"
        );
        self.opened.replace(Arc::new(log))
    }

    /// Close the opened log, if any
    pub fn close(&mut self) -> Option<Arc<Log>> {
        let closed = self.opened.take();
        if closed.is_some() {
            tracing::info!("closed log");
        }
        closed
    }

    pub fn opened(&self) -> Option<&Arc<Log>> {
        self.opened.as_ref()
    }

    /// Resolve a function-history URI against the opened log
    pub fn find_function_entry_by_uri(&self, uri: &str) -> Option<&FunctionEntry> {
        self.opened.as_deref()?.find_function_entry_by_uri(uri)
    }
}
