//! Error classification for census runs
//!
//! Operations return `anyhow::Result`; the errors that callers need to tell
//! apart are raised as [`CensusError`] and recovered at the boundary with
//! `downcast_ref`.

/// Classified failure of a census operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CensusError {
    /// RIPEstat reported an error-severity message in its response
    RemoteService(String),
    /// HTTP-layer failure: connection, timeout, status, or undecodable body
    Transport(String),
    /// DNS lookup failure or a malformed name record
    Resolution(String),
    /// Input rejected before any network activity
    Validation(String),
}

impl CensusError {
    /// Whether this error came from the remote service itself
    pub fn is_remote_service(&self) -> bool {
        matches!(self, CensusError::RemoteService(_))
    }
}

impl std::fmt::Display for CensusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CensusError::RemoteService(e) => write!(f, "RIPEstat error: {}", e),
            CensusError::Transport(e) => write!(f, "Transport error: {}", e),
            CensusError::Resolution(e) => write!(f, "Resolution error: {}", e),
            CensusError::Validation(e) => write!(f, "Invalid input: {}", e),
        }
    }
}

impl std::error::Error for CensusError {}

/// Find a classified error anywhere in an `anyhow` chain
pub fn classify(err: &anyhow::Error) -> Option<&CensusError> {
    err.chain().find_map(|e| e.downcast_ref::<CensusError>())
}
