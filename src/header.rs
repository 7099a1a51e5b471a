//! XGT frame header.
//!
//! Every request and response starts with the same 20-byte header:
//!
//! | Byte | Field | Description |
//! |------|-------|-------------|
//! | 0-7 | Company ID | ASCII `LSIS-XGT` |
//! | 8-9 | Reserved | Always `0x0000` on send |
//! | 10-11 | PLC Info | Controller status word (responses only) |
//! | 12 | CPU Info | Controller CPU type (responses only) |
//! | 13 | Source of Frame | `0x33` client to server, `0x11` server to client |
//! | 14-15 | Invoke ID | Request/response correlation, little-endian |
//! | 16-17 | Length | Application instruction length, little-endian |
//! | 18 | FEnet Position | Module slot/base |
//! | 19 | BCC | Reserved check byte |
//!
//! # Example
//!
//! ```
//! use xgt_fenet::{XgtHeader, XGT_HEADER_SIZE};
//!
//! let header = XgtHeader::new_request(0x0001, 16);
//! let bytes = header.to_bytes();
//! assert_eq!(bytes.len(), XGT_HEADER_SIZE);
//! assert_eq!(&bytes[..8], b"LSIS-XGT");
//! assert_eq!(bytes[13], 0x33);
//! ```

use crate::error::{Result, XgtError};
use crate::utils::{join_as_big_endian_value, split_big_endian};

/// XGT header size in bytes.
pub const XGT_HEADER_SIZE: usize = 20;

/// Company ID that opens every frame.
pub const COMPANY_ID: &[u8; 8] = b"LSIS-XGT";

/// Source of Frame value for client to controller frames.
pub const SOURCE_CLIENT: u8 = 0x33;

/// Source of Frame value for controller to client frames.
pub const SOURCE_SERVER: u8 = 0x11;

/// Decoded XGT frame header (20 bytes).
///
/// The status fields are kept exactly as the controller sent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XgtHeader {
    /// Controller status word.
    pub plc_info: u16,
    /// Controller CPU type.
    pub cpu_info: u8,
    /// Source of Frame marker.
    pub source: u8,
    /// Invoke ID (used to match responses with requests).
    pub invoke_id: u16,
    /// Length of the application instruction following the header.
    pub instruction_length: u16,
    /// FEnet module position.
    pub module_position: u8,
    /// Trailing BCC/reserved byte.
    pub bcc: u8,
}

impl XgtHeader {
    /// Creates a client request header.
    ///
    /// The caller guarantees that the instruction length fits the field.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::XgtHeader;
    ///
    /// let header = XgtHeader::new_request(0x1234, 0x0010);
    /// let bytes = header.to_bytes();
    /// assert_eq!(&bytes[14..18], &[0x34, 0x12, 0x10, 0x00]);
    /// ```
    pub fn new_request(invoke_id: u16, instruction_length: u16) -> Self {
        Self {
            plc_info: 0x0000,
            cpu_info: 0x00,
            source: SOURCE_CLIENT,
            invoke_id,
            instruction_length,
            module_position: 0x00,
            bcc: 0x00,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(self) -> [u8; XGT_HEADER_SIZE] {
        let mut bytes = [0u8; XGT_HEADER_SIZE];
        bytes[..8].copy_from_slice(COMPANY_ID);
        // bytes 8..10 reserved
        let (plc_high, plc_low) = split_big_endian(self.plc_info);
        bytes[10] = plc_high;
        bytes[11] = plc_low;
        bytes[12] = self.cpu_info;
        bytes[13] = self.source;
        let (id_high, id_low) = split_big_endian(self.invoke_id);
        bytes[14] = id_low;
        bytes[15] = id_high;
        let (len_high, len_low) = split_big_endian(self.instruction_length);
        bytes[16] = len_low;
        bytes[17] = len_high;
        bytes[18] = self.module_position;
        bytes[19] = self.bcc;
        bytes
    }

    /// Parses a controller header from the first 20 bytes of `data`.
    ///
    /// Only the company ID and the Source of Frame marker are checked; the
    /// declared instruction length is not compared against `data`. Use
    /// [`XgtHeader::validate_frame`] once the whole frame is available.
    ///
    /// # Errors
    ///
    /// Returns `XgtError::MalformedFrame` if the slice is too short, the
    /// company ID does not match, or the frame was not sent by a controller.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < XGT_HEADER_SIZE {
            return Err(XgtError::malformed_frame(format!(
                "header too short: expected {} bytes, got {}",
                XGT_HEADER_SIZE,
                data.len()
            )));
        }

        if &data[..8] != COMPANY_ID {
            return Err(XgtError::malformed_frame("company id mismatch"));
        }

        if data[13] != SOURCE_SERVER {
            return Err(XgtError::malformed_frame(format!(
                "unexpected source of frame 0x{:02X}",
                data[13]
            )));
        }

        Ok(Self {
            plc_info: join_as_big_endian_value(data[10], data[11]),
            cpu_info: data[12],
            source: data[13],
            invoke_id: join_as_big_endian_value(data[15], data[14]),
            instruction_length: join_as_big_endian_value(data[17], data[16]),
            module_position: data[18],
            bcc: data[19],
        })
    }

    /// Validates a complete controller frame and returns its header.
    ///
    /// # Errors
    ///
    /// Returns `XgtError::MalformedFrame` for any failure of
    /// [`XgtHeader::from_bytes`], or when the header length plus the declared
    /// instruction length differs from the frame length.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::XgtHeader;
    ///
    /// let mut frame = b"LSIS-XGT".to_vec();
    /// frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0xA0, 0x11, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00]);
    /// frame.extend_from_slice(&[0xAA, 0xBB]);
    ///
    /// let header = XgtHeader::validate_frame(&frame).unwrap();
    /// assert_eq!(header.invoke_id, 1);
    /// assert_eq!(header.instruction_length, 2);
    ///
    /// frame.push(0xCC);
    /// assert!(XgtHeader::validate_frame(&frame).is_err());
    /// ```
    pub fn validate_frame(frame: &[u8]) -> Result<Self> {
        let header = Self::from_bytes(frame)?;

        let expected = XGT_HEADER_SIZE + header.instruction_length as usize;
        if expected != frame.len() {
            return Err(XgtError::malformed_frame(format!(
                "length mismatch: header declares {} bytes, frame has {}",
                expected,
                frame.len()
            )));
        }

        Ok(header)
    }

    /// Returns whether this header was sent by a controller.
    pub fn is_response(self) -> bool {
        self.source == SOURCE_SERVER
    }
}
