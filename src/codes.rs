//! Command and data type codes for the XGT dedicated protocol.
//!
//! Both codes travel as 16-bit little-endian fields at the start of every
//! application instruction. They form small, closed sets, so decoding an
//! unknown value fails instead of being carried through as a raw number.
//!
//! | Data type | Code | Value width |
//! |-----------|------|-------------|
//! | [`DataType::Bit`] | `0x0000` | 1 byte |
//! | [`DataType::Byte`] | `0x0001` | 1 byte |
//! | [`DataType::Word`] | `0x0002` | 2 bytes |
//! | [`DataType::DWord`] | `0x0003` | 4 bytes |
//! | [`DataType::LWord`] | `0x0004` | 8 bytes |
//! | [`DataType::Continuous`] | `0x0014` | caller-defined |
//!
//! # Example
//!
//! ```
//! use xgt_fenet::{Command, DataType};
//!
//! assert_eq!(Command::RequestRead.code(), 0x0054);
//! assert_eq!(Command::from_code(0x0055), Some(Command::ResponseRead));
//!
//! assert_eq!(DataType::Word.byte_width(), Some(2));
//! assert_eq!(DataType::from_code(0x0014), Some(DataType::Continuous));
//! assert_eq!(DataType::from_code(0x0009), None);
//! ```

/// Application instruction command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Read request sent by the client.
    RequestRead,
    /// Read response sent by the controller.
    ResponseRead,
    /// Write request sent by the client.
    RequestWrite,
    /// Write response sent by the controller.
    ResponseWrite,
}

impl Command {
    /// Returns the wire code for this command.
    pub fn code(self) -> u16 {
        match self {
            Command::RequestRead => 0x0054,
            Command::ResponseRead => 0x0055,
            Command::RequestWrite => 0x0058,
            Command::ResponseWrite => 0x0059,
        }
    }

    /// Decodes a wire code, returning `None` for codes outside the known set.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0054 => Some(Command::RequestRead),
            0x0055 => Some(Command::ResponseRead),
            0x0058 => Some(Command::RequestWrite),
            0x0059 => Some(Command::ResponseWrite),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Command::RequestRead => "request-read",
            Command::ResponseRead => "response-read",
            Command::RequestWrite => "request-write",
            Command::ResponseWrite => "response-write",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), self.code())
    }
}

/// Register width addressed by a request.
///
/// Variable names carry the width as well (`%MX` bit, `%MB` byte, `%MW` word,
/// `%MD` double word, `%ML` long word); the data type must agree with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Single bit, transferred as one byte holding 0 or 1.
    Bit,
    /// 8-bit byte.
    Byte,
    /// 16-bit word.
    Word,
    /// 32-bit double word.
    DWord,
    /// 64-bit long word.
    LWord,
    /// Continuous block of bytes.
    Continuous,
}

impl DataType {
    /// Returns the wire code for this data type.
    pub fn code(self) -> u16 {
        match self {
            DataType::Bit => 0x0000,
            DataType::Byte => 0x0001,
            DataType::Word => 0x0002,
            DataType::DWord => 0x0003,
            DataType::LWord => 0x0004,
            DataType::Continuous => 0x0014,
        }
    }

    /// Decodes a wire code, returning `None` for codes outside the known set.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0000 => Some(DataType::Bit),
            0x0001 => Some(DataType::Byte),
            0x0002 => Some(DataType::Word),
            0x0003 => Some(DataType::DWord),
            0x0004 => Some(DataType::LWord),
            0x0014 => Some(DataType::Continuous),
            _ => None,
        }
    }

    /// Returns how many bytes one value of this type occupies on the wire,
    /// or `None` for continuous blocks whose size is chosen per request.
    pub fn byte_width(self) -> Option<usize> {
        match self {
            DataType::Bit | DataType::Byte => Some(1),
            DataType::Word => Some(2),
            DataType::DWord => Some(4),
            DataType::LWord => Some(8),
            DataType::Continuous => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Bit => write!(f, "BIT"),
            DataType::Byte => write!(f, "BYTE"),
            DataType::Word => write!(f, "WORD"),
            DataType::DWord => write!(f, "DWORD"),
            DataType::LWord => write!(f, "LWORD"),
            DataType::Continuous => write!(f, "CONTINUOUS"),
        }
    }
}
