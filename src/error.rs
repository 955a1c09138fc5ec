/*
 * Error type shared by template construction, arena management and the modal
 * engine. Setup failures carry the platform error code captured at the point of
 * failure so callers can report it after `do_modal` has returned its `-1`
 * sentinel.
 */

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error("could not allocate {size} bytes of movable memory (platform error {code:#010x})")]
    AllocationFailure { size: usize, code: u32 },

    #[error("could not lock template memory (platform error {code:#010x})")]
    LockFailure { code: u32 },

    #[error("template needs {required} bytes but only {capacity} are available")]
    SerializationOverflow { required: usize, capacity: usize },

    #[error("dialog holds {count} controls, more than a template can describe")]
    TooManyControls { count: usize },

    #[error("host could not create the dialog (platform error {code:#010x})")]
    HostRefused { code: u32 },

    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl DialogError {
    /// Platform error code captured with the failure, if any.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::AllocationFailure { code, .. }
            | Self::LockFailure { code }
            | Self::HostRefused { code } => Some(*code),
            _ => None,
        }
    }
}

// Lets `?` be used on `windows::core::Result<T>` inside the Win32 host.
#[cfg(target_os = "windows")]
impl From<windows::core::Error> for DialogError {
    fn from(e: windows::core::Error) -> Self {
        Self::OperationFailed(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DialogError>;
