//! # XGT FEnet Protocol Library
//!
//! A Rust library for communicating with LS ELECTRIC (formerly LSIS) XGT PLCs
//! using the XGT dedicated protocol of the FEnet Ethernet modules.
//!
//! This is a **protocol-only** library. The codec builds request frames and
//! parses response frames as pure functions over byte buffers; the optional
//! [`Client`] issues exactly 1 request and awaits exactly 1 response per call.
//! No automatic retries, caching, or reconnection.
//!
//! ## Features
//!
//! - **Exact framing** - fixed 20-byte header, little-endian instruction fields
//! - **Hardened parsing** - every length field is checked against the buffer
//! - **Type-safe** - commands and data types as closed enums
//! - **No panics** - all errors returned as `Result<T, XgtError>`
//!
//! ## Codec
//!
//! ```
//! use xgt_fenet::{build_read_request, parse_read_response, DataType, XgtError};
//!
//! let request = build_read_request(0x0001, DataType::Word, &["%MW100"])?;
//! assert_eq!(&request[..8], b"LSIS-XGT");
//!
//! // A controller reply carrying 0x1234 for the requested word
//! let mut reply = b"LSIS-XGT".to_vec();
//! reply.extend_from_slice(&[
//!     0x00, 0x00, 0x00, 0x00, 0xA0, 0x11, 0x01, 0x00, 0x0E, 0x00, 0x00, 0x00,
//!     0x55, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
//!     0x02, 0x00, 0x34, 0x12,
//! ]);
//!
//! let response = parse_read_response(&reply)?;
//! response.check_error()?;
//! assert_eq!(response.items[0].value, 0x1234);
//! # Ok::<(), XgtError>(())
//! ```
//!
//! ## Client
//!
//! ```no_run
//! use xgt_fenet::{Client, ClientConfig, DataType};
//! use std::net::Ipv4Addr;
//!
//! fn main() -> xgt_fenet::Result<()> {
//!     let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20));
//!     let client = Client::new(config)?;
//!
//!     let items = client.read(DataType::Word, &["%MW100", "%DW102"])?;
//!     println!("{:?}", items);
//!
//!     client.write_word("%MW200", 0x1234)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! A frame that parses but carries a non-zero error status is not a parse
//! failure: the response is returned and [`ReadResponse::check_error`] turns
//! it into [`XgtError::ControllerError`].
//!
//! ```no_run
//! use xgt_fenet::{Client, ClientConfig, XgtError};
//! use std::net::Ipv4Addr;
//!
//! let client = Client::new(ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20)))?;
//!
//! match client.read_word("%MW100") {
//!     Ok(value) => println!("MW100 = {}", value),
//!     Err(XgtError::Timeout) => println!("Communication timeout"),
//!     Err(XgtError::ControllerError { code }) => println!("PLC error 0x{:04X}", code),
//!     Err(XgtError::TruncatedFrame { .. }) => println!("Corrupted reply"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok::<(), XgtError>(())
//! ```
//!
//! ## Logging
//!
//! The client and transport emit [`tracing`](https://docs.rs/tracing) events:
//! `debug` per exchanged frame, `trace` with hex dumps, `warn` on invoke id
//! mismatches. Install any subscriber to see them.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod codes;
mod command;
mod error;
mod header;
mod response;
mod transport;
pub mod utils;

// Public re-exports
pub use client::{Client, ClientConfig};
pub use codes::{Command, DataType};
pub use command::{
    build_read_request, build_write_request, ReadRequest, WriteRequest, WriteVariable,
    MAX_VARIABLES_PER_REQUEST, MAX_VARIABLE_NAME_LENGTH,
};
pub use error::{Result, XgtError};
pub use header::{XgtHeader, COMPANY_ID, SOURCE_CLIENT, SOURCE_SERVER, XGT_HEADER_SIZE};
pub use response::{
    parse_read_response, parse_write_response, ReadResponse, ResponseItem, WriteResponse,
    RESPONSE_PREFIX_SIZE,
};
pub use transport::{
    TcpTransport, DEFAULT_TIMEOUT, DEFAULT_XGT_PORT, MAX_DATA_SIZE, MAX_INSTRUCTION_SIZE,
};
