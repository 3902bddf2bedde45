//! Collects the non-fatal conditions defined in §7 of the spec (`Warning`,
//! `UnsupportedChunk`, `UnsupportedChunkVersion`): conditions that are reported
//! inline in the dump but do not abort processing of the rest of the file.
//!
//! Every pushed diagnostic is also routed to the `log` crate at `warn` level (when
//! the `log` feature is enabled), giving batch/CI callers a machine-greppable side
//! channel independent of stdout formatting.

use crate::error::Diagnostic;

/// Accumulates diagnostics raised while walking a single object file.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic, logging it immediately.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        #[cfg(feature = "log")]
        log::warn!("{diagnostic}");
        #[cfg(not(feature = "log"))]
        let _ = &diagnostic;
        self.records.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
