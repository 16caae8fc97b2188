use thiserror::Error;

/// Errors surfaced by the core. Sequencing faults (motion timeouts, watchdog
/// expiry) are not errors in this sense — they are states of the machine,
/// reported through `iStationStatus`/`iErrorCode`.
#[derive(Debug, Error)]
pub enum CellError {
    #[error("unknown variable path: {0}")]
    UnknownPath(String),

    #[error("type mismatch writing {path}: cell holds {expected}, got {got}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("motion primitive already in progress on lift {lift}")]
    MotionInProgress { lift: u8 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
