//! Error types for the XGT FEnet protocol.

use std::io;
use thiserror::Error;

use crate::codes::Command;

/// Result type alias for XGT operations.
pub type Result<T> = std::result::Result<T, XgtError>;

/// Errors that can occur while building, parsing or exchanging XGT frames.
#[derive(Debug, Error)]
pub enum XgtError {
    /// A request was built with fewer than 1 or more than 16 variables.
    #[error("Invalid variable count {count}: must be between 1 and 16")]
    InvalidVariableCount {
        /// Number of variables the caller supplied.
        count: usize,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// The frame header or overall frame length is structurally invalid.
    #[error("Malformed frame: {reason}")]
    MalformedFrame {
        /// Description of the structural violation.
        reason: String,
    },

    /// The frame carries a command code other than the one expected.
    #[error("Unexpected command: expected {expected}, received 0x{received:04X}")]
    UnexpectedCommand {
        /// Command the parser was expecting.
        expected: Command,
        /// Raw command code found in the frame.
        received: u16,
    },

    /// A length field inside the frame points past the end of the buffer.
    #[error("Truncated frame: {needed} bytes needed at offset {offset}, {available} available")]
    TruncatedFrame {
        /// Offset of the read that failed.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes left in the buffer at that offset.
        available: usize,
    },

    /// The controller answered with a non-zero error status.
    #[error("Controller error: code 0x{code:04X}")]
    ControllerError {
        /// Error number reported by the controller.
        code: u16,
    },

    /// Invoke id mismatch between request and response.
    #[error("Invoke id mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    InvokeIdMismatch {
        /// Invoke id sent with the request.
        expected: u16,
        /// Invoke id echoed in the response.
        received: u16,
    },

    /// Communication timeout.
    #[error("Communication timeout")]
    Timeout,

    /// The stream lost frame alignment and can no longer be used.
    #[error("Connection broken: {reason}")]
    ConnectionBroken {
        /// Why the stream can no longer be trusted.
        reason: String,
    },

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl XgtError {
    /// Creates a new `InvalidVariableCount` error.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::XgtError;
    ///
    /// let err = XgtError::invalid_variable_count(17);
    /// assert_eq!(err.to_string(), "Invalid variable count 17: must be between 1 and 16");
    /// ```
    pub fn invalid_variable_count(count: usize) -> Self {
        Self::InvalidVariableCount { count }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::XgtError;
    ///
    /// let err = XgtError::invalid_parameter("name", "must not be empty");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `MalformedFrame` error.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::XgtError;
    ///
    /// let err = XgtError::malformed_frame("frame too short");
    /// ```
    pub fn malformed_frame(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    /// Creates a new `UnexpectedCommand` error.
    pub fn unexpected_command(expected: Command, received: u16) -> Self {
        Self::UnexpectedCommand { expected, received }
    }

    /// Creates a new `TruncatedFrame` error.
    pub fn truncated_frame(offset: usize, needed: usize, available: usize) -> Self {
        Self::TruncatedFrame {
            offset,
            needed,
            available,
        }
    }

    /// Creates a new `ControllerError` from the controller's error number.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::XgtError;
    ///
    /// let err = XgtError::controller_error(0x0002);
    /// assert_eq!(err.to_string(), "Controller error: code 0x0002");
    /// ```
    pub fn controller_error(code: u16) -> Self {
        Self::ControllerError { code }
    }

    /// Creates a new `InvokeIdMismatch` error.
    pub fn invoke_id_mismatch(expected: u16, received: u16) -> Self {
        Self::InvokeIdMismatch { expected, received }
    }

    /// Creates a new `ConnectionBroken` error.
    pub fn connection_broken(reason: impl Into<String>) -> Self {
        Self::ConnectionBroken {
            reason: reason.into(),
        }
    }

    /// Returns whether the error was reported by the controller itself,
    /// as opposed to a local, transport or framing failure.
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Self::ControllerError { .. })
    }
}
