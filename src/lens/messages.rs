//! RIPEstat diagnostic message handling
//!
//! Every RIPEstat response carries a `messages` list of `[severity, text]`
//! pairs. An `error` entry means the data call failed and aborts the
//! operation; anything else is informational and logged once per run.

use crate::datasets::ripestat::{DiagnosticMessage, Severity};
use crate::error::CensusError;
use std::collections::HashSet;
use tracing::{info, warn};

/// Run-scoped record of the notices already logged
#[derive(Debug, Default)]
pub struct MessageLog {
    seen: HashSet<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a response's messages
    ///
    /// Returns [`CensusError::RemoteService`] on the first error-severity
    /// message. `suppress` silences info notices for calls that repeat per
    /// ASN; other severities are always logged, once per distinct text.
    pub fn classify(
        &mut self,
        caller: &str,
        messages: &[DiagnosticMessage],
        suppress: bool,
    ) -> Result<(), CensusError> {
        for message in messages {
            match &message.severity {
                Severity::Error => {
                    return Err(CensusError::RemoteService(message.text.clone()));
                }
                Severity::Info => {
                    if !suppress && self.first_time(&message.text) {
                        info!(caller, "{}", message.text);
                    }
                }
                Severity::Other(severity) => {
                    if self.first_time(&message.text) {
                        warn!(caller, severity = %severity, "{}", message.text);
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether a notice text has been logged during this run
    #[cfg(test)]
    pub(crate) fn has_logged(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    /// Number of distinct notices logged so far
    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }

    fn first_time(&mut self, text: &str) -> bool {
        self.seen.insert(text.to_string())
    }
}
