//! XGT request structures and serialization.
//!
//! Each request owns its header fields and serializes itself into a complete
//! frame (20-byte header followed by the application instruction).
//!
//! - [`ReadRequest`] - Read up to 16 named variables in one frame
//! - [`WriteRequest`] - Write up to 16 named variables in one frame
//!
//! # Instruction Layout
//!
//! | Field | Size | Description |
//! |-------|------|-------------|
//! | Command | 2 bytes | `0x0054` read, `0x0058` write |
//! | Data type | 2 bytes | See [`DataType`] |
//! | Reserved | 2 bytes | Always `0x0000` |
//! | Variable count | 2 bytes | 1-16 |
//! | Names | Variable | `[length (2 bytes)][ASCII name]` per variable |
//! | Values | Variable | Write only: `[length (2 bytes)][value]` per variable |
//!
//! All 2-byte fields are little-endian.
//!
//! # Example
//!
//! ```
//! use xgt_fenet::{DataType, ReadRequest};
//!
//! let request = ReadRequest::new(0x0001, DataType::Word, &["%MW100", "%DW102"]).unwrap();
//! let bytes = request.to_bytes();
//! // bytes can now be sent over TCP
//! assert_eq!(bytes.len(), 20 + 8 + 2 + 6 + 2 + 6);
//! ```

use crate::codes::{Command, DataType};
use crate::error::{Result, XgtError};
use crate::header::{XgtHeader, XGT_HEADER_SIZE};
use crate::utils::put_u16_le;

/// Maximum number of variables per read or write request.
pub const MAX_VARIABLES_PER_REQUEST: usize = 16;

/// Maximum length of a variable name in bytes.
pub const MAX_VARIABLE_NAME_LENGTH: usize = 16;

/// Fixed instruction prefix: command, data type, reserved, variable count.
const INSTRUCTION_PREFIX_SIZE: usize = 8;

fn check_variable_count(count: usize) -> Result<()> {
    if count == 0 || count > MAX_VARIABLES_PER_REQUEST {
        return Err(XgtError::invalid_variable_count(count));
    }
    Ok(())
}

fn check_variable_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(XgtError::invalid_parameter("name", "must not be empty"));
    }
    if !name.is_ascii() {
        return Err(XgtError::invalid_parameter(
            "name",
            format!("'{}' must be ASCII", name),
        ));
    }
    if name.len() > MAX_VARIABLE_NAME_LENGTH {
        return Err(XgtError::invalid_parameter(
            "name",
            format!(
                "'{}' exceeds {} characters",
                name, MAX_VARIABLE_NAME_LENGTH
            ),
        ));
    }
    Ok(())
}

fn put_instruction_prefix(bytes: &mut Vec<u8>, command: Command, data_type: DataType, count: usize) {
    put_u16_le(bytes, command.code());
    put_u16_le(bytes, data_type.code());
    put_u16_le(bytes, 0x0000);
    put_u16_le(bytes, count as u16);
}

fn put_block(bytes: &mut Vec<u8>, block: &[u8]) {
    put_u16_le(bytes, block.len() as u16);
    bytes.extend_from_slice(block);
}

/// Prepends the request header to a finished instruction.
fn frame(invoke_id: u16, instruction: Vec<u8>) -> Vec<u8> {
    let header = XgtHeader::new_request(invoke_id, instruction.len() as u16);
    let mut bytes = Vec::with_capacity(XGT_HEADER_SIZE + instruction.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend(instruction);
    bytes
}

/// Request for reading named variables from the controller.
#[derive(Debug, Clone)]
pub struct ReadRequest {
    invoke_id: u16,
    data_type: DataType,
    variables: Vec<String>,
}

impl ReadRequest {
    /// Creates a new read request.
    ///
    /// # Arguments
    ///
    /// * `invoke_id` - Correlation id echoed back by the controller
    /// * `data_type` - Register width of every variable
    /// * `variables` - Variable names such as `%MW100` (1-16 names)
    ///
    /// # Errors
    ///
    /// Returns `XgtError::InvalidVariableCount` if `variables` is empty or holds
    /// more than 16 names, and `XgtError::InvalidParameter` if a name is empty,
    /// not ASCII, or longer than 16 characters.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::{DataType, ReadRequest, XgtError};
    ///
    /// let request = ReadRequest::new(7, DataType::Bit, &["%MX0"]).unwrap();
    /// assert_eq!(request.invoke_id(), 7);
    ///
    /// let none: [&str; 0] = [];
    /// assert!(matches!(
    ///     ReadRequest::new(7, DataType::Bit, &none),
    ///     Err(XgtError::InvalidVariableCount { count: 0 })
    /// ));
    /// ```
    pub fn new<S: AsRef<str>>(invoke_id: u16, data_type: DataType, variables: &[S]) -> Result<Self> {
        check_variable_count(variables.len())?;
        for name in variables {
            check_variable_name(name.as_ref())?;
        }

        Ok(Self {
            invoke_id,
            data_type,
            variables: variables.iter().map(|name| name.as_ref().to_owned()).collect(),
        })
    }

    /// Returns the invoke id.
    pub fn invoke_id(&self) -> u16 {
        self.invoke_id
    }

    /// Returns the data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the variable names in request order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Serializes the request to a complete frame for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        let names_size: usize = self.variables.iter().map(|name| 2 + name.len()).sum();
        let mut instruction = Vec::with_capacity(INSTRUCTION_PREFIX_SIZE + names_size);
        put_instruction_prefix(
            &mut instruction,
            Command::RequestRead,
            self.data_type,
            self.variables.len(),
        );
        for name in &self.variables {
            put_block(&mut instruction, name.as_bytes());
        }
        frame(self.invoke_id, instruction)
    }
}

/// Builds a complete read frame in one call.
///
/// Equivalent to [`ReadRequest::new`] followed by [`ReadRequest::to_bytes`].
///
/// # Example
///
/// ```
/// use xgt_fenet::{build_read_request, DataType};
///
/// let frame = build_read_request(0x0001, DataType::Word, &["%DW102"]).unwrap();
/// assert_eq!(&frame[20..], &[
///     0x54, 0x00, // command
///     0x02, 0x00, // data type
///     0x00, 0x00, // reserved
///     0x01, 0x00, // variable count
///     0x06, 0x00, b'%', b'D', b'W', b'1', b'0', b'2',
/// ]);
/// ```
pub fn build_read_request<S: AsRef<str>>(
    invoke_id: u16,
    data_type: DataType,
    variables: &[S],
) -> Result<Vec<u8>> {
    Ok(ReadRequest::new(invoke_id, data_type, variables)?.to_bytes())
}

/// A named variable and the raw bytes to write to it.
///
/// Values are given in wire order (least significant byte first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteVariable {
    /// Variable name, for example `%MW100`.
    pub name: String,
    /// Value bytes, least significant byte first.
    pub value: Vec<u8>,
}

impl WriteVariable {
    /// Creates a variable with raw value bytes.
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a bit variable (`0x00` or `0x01`).
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::WriteVariable;
    ///
    /// let var = WriteVariable::bit("%MX10", true);
    /// assert_eq!(var.value, vec![0x01]);
    /// ```
    pub fn bit(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, vec![value as u8])
    }

    /// Creates a word variable.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::WriteVariable;
    ///
    /// let var = WriteVariable::word("%MW100", 0x1234);
    /// assert_eq!(var.value, vec![0x34, 0x12]);
    /// ```
    pub fn word(name: impl Into<String>, value: u16) -> Self {
        Self::new(name, value.to_le_bytes().to_vec())
    }

    /// Creates a double word variable.
    pub fn dword(name: impl Into<String>, value: u32) -> Self {
        Self::new(name, value.to_le_bytes().to_vec())
    }

    /// Creates a long word variable.
    pub fn lword(name: impl Into<String>, value: u64) -> Self {
        Self::new(name, value.to_le_bytes().to_vec())
    }
}

/// Request for writing named variables on the controller.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    invoke_id: u16,
    data_type: DataType,
    variables: Vec<WriteVariable>,
}

impl WriteRequest {
    /// Creates a new write request.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `variables` is empty or holds more than 16 entries
    /// - a name is empty, not ASCII, or longer than 16 characters
    /// - a value's length does not match the data type's width
    /// - the encoded instruction would not fit the header's length field
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::{DataType, WriteRequest, WriteVariable};
    ///
    /// let request = WriteRequest::new(
    ///     0x0002,
    ///     DataType::Word,
    ///     vec![WriteVariable::word("%MW100", 0x1234)],
    /// ).unwrap();
    ///
    /// // A word variable must carry exactly two bytes
    /// assert!(WriteRequest::new(
    ///     0x0002,
    ///     DataType::Word,
    ///     vec![WriteVariable::new("%MW100", vec![0x01])],
    /// ).is_err());
    /// ```
    pub fn new(invoke_id: u16, data_type: DataType, variables: Vec<WriteVariable>) -> Result<Self> {
        check_variable_count(variables.len())?;

        let mut instruction_size = INSTRUCTION_PREFIX_SIZE;
        for var in &variables {
            check_variable_name(&var.name)?;
            match data_type.byte_width() {
                Some(width) if var.value.len() != width => {
                    return Err(XgtError::invalid_parameter(
                        "value",
                        format!(
                            "'{}' needs {} byte(s) for {}, got {}",
                            var.name,
                            width,
                            data_type,
                            var.value.len()
                        ),
                    ));
                }
                None if var.value.is_empty() => {
                    return Err(XgtError::invalid_parameter(
                        "value",
                        format!("'{}' must not be empty", var.name),
                    ));
                }
                _ => {}
            }
            instruction_size += 2 + var.name.len() + 2 + var.value.len();
        }

        if instruction_size > u16::MAX as usize {
            return Err(XgtError::invalid_parameter(
                "variables",
                format!(
                    "instruction of {} bytes exceeds {}",
                    instruction_size,
                    u16::MAX
                ),
            ));
        }

        Ok(Self {
            invoke_id,
            data_type,
            variables,
        })
    }

    /// Returns the invoke id.
    pub fn invoke_id(&self) -> u16 {
        self.invoke_id
    }

    /// Returns the data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the variables in request order.
    pub fn variables(&self) -> &[WriteVariable] {
        &self.variables
    }

    /// Serializes the request to a complete frame for transmission.
    ///
    /// All name blocks come first, followed by all value blocks in the same order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut instruction = Vec::with_capacity(INSTRUCTION_PREFIX_SIZE);
        put_instruction_prefix(
            &mut instruction,
            Command::RequestWrite,
            self.data_type,
            self.variables.len(),
        );
        for var in &self.variables {
            put_block(&mut instruction, var.name.as_bytes());
        }
        for var in &self.variables {
            put_block(&mut instruction, &var.value);
        }
        frame(self.invoke_id, instruction)
    }
}

/// Builds a complete write frame in one call.
pub fn build_write_request(
    invoke_id: u16,
    data_type: DataType,
    variables: Vec<WriteVariable>,
) -> Result<Vec<u8>> {
    Ok(WriteRequest::new(invoke_id, data_type, variables)?.to_bytes())
}
