//! XGT response parsing and validation.
//!
//! This module parses the frames a controller sends back for read and write
//! requests.
//!
//! # Response Structure
//!
//! | Component | Size | Description |
//! |-----------|------|-------------|
//! | Header | 20 bytes | [`XgtHeader`], Source of Frame `0x11` |
//! | Command | 2 bytes | `0x0055` read, `0x0059` write |
//! | Data type | 2 bytes | See [`DataType`] |
//! | Reserved | 2 bytes | Ignored |
//! | Error status | 2 bytes | `0x0000` = success |
//! | Error number / count | 2 bytes | Error code on failure, variable count on success |
//! | Data | Variable | Read only: `[size (2 bytes)][value]` per variable |
//!
//! All 2-byte fields are little-endian. Every length read from the frame is
//! checked against the bytes actually present; a length that points past the
//! end of the buffer fails with [`XgtError::TruncatedFrame`].
//!
//! # Example
//!
//! ```
//! use xgt_fenet::ReadResponse;
//!
//! let mut frame = b"LSIS-XGT".to_vec();
//! frame.extend_from_slice(&[
//!     0x00, 0x00, 0x00, 0x00, 0xA0, 0x11, // reserved, PLC info, CPU info, source
//!     0x01, 0x00, // invoke id
//!     0x0E, 0x00, // instruction length (14)
//!     0x00, 0x00, // FEnet position, BCC
//!     0x55, 0x00, 0x02, 0x00, 0x00, 0x00, // response-read, word, reserved
//!     0x00, 0x00, // error status (success)
//!     0x01, 0x00, // one variable
//!     0x02, 0x00, 0x34, 0x12, // two bytes: 0x1234
//! ]);
//!
//! let response = ReadResponse::from_bytes(&frame).unwrap();
//! assert!(response.is_success());
//! assert_eq!(response.items[0].size, 2);
//! assert_eq!(response.items[0].value, 0x1234);
//! ```

use tracing::trace;

use crate::codes::{Command, DataType};
use crate::command::MAX_VARIABLES_PER_REQUEST;
use crate::error::{Result, XgtError};
use crate::header::{XgtHeader, XGT_HEADER_SIZE};
use crate::utils::join_as_big_endian_value;

/// Size of the fixed response instruction fields that precede any data.
pub const RESPONSE_PREFIX_SIZE: usize = 10;

/// Number of value bytes that fit in [`ResponseItem::value`].
const VALUE_WIDTH: usize = 8;

/// Bounds-checked cursor over a received frame.
struct FrameReader<'a> {
    frame: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    fn new(frame: &'a [u8], offset: usize) -> Self {
        Self { frame, offset }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let available = self.frame.len().saturating_sub(self.offset);
        if needed > available {
            return Err(XgtError::truncated_frame(self.offset, needed, available));
        }
        let bytes = &self.frame[self.offset..self.offset + needed];
        self.offset += needed;
        Ok(bytes)
    }

    fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(join_as_big_endian_value(bytes[1], bytes[0]))
    }

    fn remaining(&self) -> usize {
        self.frame.len().saturating_sub(self.offset)
    }
}

/// Fields shared by every response instruction.
struct ResponsePrefix {
    header: XgtHeader,
    command: Command,
    data_type: DataType,
    error_status: u16,
    /// Error number when `error_status != 0`, otherwise the variable count.
    status_field: u16,
}

fn parse_prefix<'a>(frame: &'a [u8], expected: Command) -> Result<(ResponsePrefix, FrameReader<'a>)> {
    let header = XgtHeader::validate_frame(frame)?;
    let instruction_length = header.instruction_length as usize;
    if instruction_length < RESPONSE_PREFIX_SIZE {
        return Err(XgtError::truncated_frame(
            XGT_HEADER_SIZE,
            RESPONSE_PREFIX_SIZE,
            instruction_length,
        ));
    }
    let mut reader = FrameReader::new(frame, XGT_HEADER_SIZE);

    let code = reader.u16()?;
    let command = match Command::from_code(code) {
        Some(command) if command == expected => command,
        _ => return Err(XgtError::unexpected_command(expected, code)),
    };

    let code = reader.u16()?;
    let data_type = DataType::from_code(code)
        .ok_or_else(|| XgtError::malformed_frame(format!("unknown data type 0x{:04X}", code)))?;

    reader.take(2)?; // reserved
    let error_status = reader.u16()?;
    let status_field = reader.u16()?;

    trace!(
        invoke_id = header.invoke_id,
        %command,
        %data_type,
        error_status,
        status_field,
        "parsed response prefix"
    );

    Ok((
        ResponsePrefix {
            header,
            command,
            data_type,
            error_status,
            status_field,
        },
        reader,
    ))
}

/// One variable decoded from a read response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseItem {
    /// Number of value bytes the controller sent for this variable.
    pub size: u16,
    /// Value assembled little-endian from the first eight value bytes.
    pub value: u64,
    /// Raw value bytes as received.
    pub bytes: Vec<u8>,
}

impl ResponseItem {
    /// Decodes an item from the size field and the value bytes it covers.
    ///
    /// Bytes beyond the eighth are kept in [`ResponseItem::bytes`] but do not
    /// contribute to [`ResponseItem::value`].
    pub(crate) fn from_wire(size: u16, bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), size as usize);
        let value = bytes
            .iter()
            .take(VALUE_WIDTH)
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (b as u64) << (8 * i));

        Self {
            size,
            value,
            bytes: bytes.to_vec(),
        }
    }

    /// Interprets the value as a bit.
    pub fn as_bool(&self) -> bool {
        self.value != 0
    }

    /// Interprets the value as a byte, truncating wider values.
    pub fn as_u8(&self) -> u8 {
        self.value as u8
    }

    /// Interprets the value as a word, truncating wider values.
    pub fn as_u16(&self) -> u16 {
        self.value as u16
    }

    /// Interprets the value as a double word, truncating wider values.
    pub fn as_u32(&self) -> u32 {
        self.value as u32
    }
}

/// Parsed read response.
#[derive(Debug, Clone)]
pub struct ReadResponse {
    /// Response header.
    pub header: XgtHeader,
    /// Response command (always [`Command::ResponseRead`]).
    pub command: Command,
    /// Data type echoed by the controller.
    pub data_type: DataType,
    /// Error status (0x0000 = success).
    pub error_status: u16,
    /// Controller error number; only meaningful when `error_status` is non-zero.
    pub error_number: u16,
    /// Decoded variables in request order; empty on controller error.
    pub items: Vec<ResponseItem>,
}

impl ReadResponse {
    /// Parses a read response from a complete frame.
    ///
    /// A frame reporting a non-zero error status parses successfully with an
    /// empty item list; use [`ReadResponse::check_error`] to surface it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The header or overall length is invalid (`MalformedFrame`)
    /// - The command is not a read response (`UnexpectedCommand`)
    /// - The data type code is unknown (`MalformedFrame`)
    /// - Any field or value would extend past the frame (`TruncatedFrame`)
    pub fn from_bytes(frame: &[u8]) -> Result<Self> {
        let (prefix, mut reader) = parse_prefix(frame, Command::ResponseRead)?;

        if prefix.error_status != 0 {
            return Ok(Self {
                header: prefix.header,
                command: prefix.command,
                data_type: prefix.data_type,
                error_status: prefix.error_status,
                error_number: prefix.status_field,
                items: Vec::new(),
            });
        }

        let count = prefix.status_field as usize;
        let mut items = Vec::with_capacity(count.min(MAX_VARIABLES_PER_REQUEST));
        for _ in 0..count {
            let size = reader.u16()?;
            let value = reader.take(size as usize)?;
            items.push(ResponseItem::from_wire(size, value));
        }

        if reader.remaining() > 0 {
            trace!(
                trailing = reader.remaining(),
                "ignoring bytes after last variable"
            );
        }

        Ok(Self {
            header: prefix.header,
            command: prefix.command,
            data_type: prefix.data_type,
            error_status: 0,
            error_number: 0,
            items,
        })
    }

    /// Returns the invoke id echoed by the controller.
    pub fn invoke_id(&self) -> u16 {
        self.header.invoke_id
    }

    /// Returns whether the controller reported success.
    pub fn is_success(&self) -> bool {
        self.error_status == 0
    }

    /// Returns the controller's error number, if it reported one.
    pub fn controller_error(&self) -> Option<u16> {
        (!self.is_success()).then_some(self.error_number)
    }

    /// Validates the response and returns an error if the controller reported one.
    ///
    /// # Errors
    ///
    /// Returns `XgtError::ControllerError` if the error status is non-zero.
    pub fn check_error(&self) -> Result<()> {
        match self.controller_error() {
            None => Ok(()),
            Some(code) => Err(XgtError::controller_error(code)),
        }
    }

    /// Validates the invoke id matches the expected value.
    ///
    /// # Errors
    ///
    /// Returns `XgtError::InvokeIdMismatch` if the ids differ.
    pub fn check_invoke_id(&self, expected: u16) -> Result<()> {
        if self.header.invoke_id == expected {
            Ok(())
        } else {
            Err(XgtError::invoke_id_mismatch(expected, self.header.invoke_id))
        }
    }
}

/// Parses a read response in one call.
///
/// Equivalent to [`ReadResponse::from_bytes`].
pub fn parse_read_response(frame: &[u8]) -> Result<ReadResponse> {
    ReadResponse::from_bytes(frame)
}

/// Parsed write response.
#[derive(Debug, Clone)]
pub struct WriteResponse {
    /// Response header.
    pub header: XgtHeader,
    /// Response command (always [`Command::ResponseWrite`]).
    pub command: Command,
    /// Data type echoed by the controller.
    pub data_type: DataType,
    /// Error status (0x0000 = success).
    pub error_status: u16,
    /// Controller error number; only meaningful when `error_status` is non-zero.
    pub error_number: u16,
    /// Number of variables written; zero on controller error.
    pub variable_count: u16,
}

impl WriteResponse {
    /// Parses a write response from a complete frame.
    ///
    /// # Errors
    ///
    /// Same as [`ReadResponse::from_bytes`], with `UnexpectedCommand` for
    /// anything other than a write response.
    pub fn from_bytes(frame: &[u8]) -> Result<Self> {
        let (prefix, _) = parse_prefix(frame, Command::ResponseWrite)?;
        let failed = prefix.error_status != 0;

        Ok(Self {
            header: prefix.header,
            command: prefix.command,
            data_type: prefix.data_type,
            error_status: prefix.error_status,
            error_number: if failed { prefix.status_field } else { 0 },
            variable_count: if failed { 0 } else { prefix.status_field },
        })
    }

    /// Returns the invoke id echoed by the controller.
    pub fn invoke_id(&self) -> u16 {
        self.header.invoke_id
    }

    /// Returns whether the controller reported success.
    pub fn is_success(&self) -> bool {
        self.error_status == 0
    }

    /// Validates the response and returns an error if the controller reported one.
    ///
    /// # Errors
    ///
    /// Returns `XgtError::ControllerError` if the error status is non-zero.
    pub fn check_error(&self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(XgtError::controller_error(self.error_number))
        }
    }

    /// Validates the invoke id matches the expected value.
    ///
    /// # Errors
    ///
    /// Returns `XgtError::InvokeIdMismatch` if the ids differ.
    pub fn check_invoke_id(&self, expected: u16) -> Result<()> {
        if self.header.invoke_id == expected {
            Ok(())
        } else {
            Err(XgtError::invoke_id_mismatch(expected, self.header.invoke_id))
        }
    }
}

/// Parses a write response in one call.
pub fn parse_write_response(frame: &[u8]) -> Result<WriteResponse> {
    WriteResponse::from_bytes(frame)
}
