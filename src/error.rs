//! Driver error taxonomy.

use crate::framebuffer::FrameError;
use crate::geometry::GeometryError;
use crate::transport::{LinkError, TransferError};
use thiserror::Error;

/// Driver errors
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Buffer allocation failed ({0} bytes)")]
    AllocationFailure(usize),

    #[error("Bus transfer failed: {0}")]
    LinkFailure(#[source] LinkError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Device is being torn down")]
    TeardownInProgress,

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

impl From<TransferError> for DriverError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::AllocationFailed { len } => DriverError::AllocationFailure(len),
            TransferError::Link(e) => DriverError::LinkFailure(e),
        }
    }
}

impl From<GeometryError> for DriverError {
    fn from(err: GeometryError) -> Self {
        DriverError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_errors_map_to_taxonomy() {
        let alloc: DriverError = TransferError::AllocationFailed { len: 40960 }.into();
        assert!(matches!(alloc, DriverError::AllocationFailure(40960)));

        let link: DriverError = TransferError::Link(LinkError::WriteError("nak".into())).into();
        assert!(matches!(link, DriverError::LinkFailure(_)));
    }

    #[test]
    fn test_rotation_error_is_configuration() {
        let err: DriverError = GeometryError::IllegalRotation(45).into();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Illegal rotation 45: must be a multiple of 90 degrees"
        );
    }
}
