//! High-level XGT client for communicating with LS ELECTRIC PLCs.
//!
//! This module provides the [`Client`] struct, the primary interface for
//! reading and writing controller variables over the XGT dedicated protocol.
//!
//! # Overview
//!
//! The client handles:
//! - Request construction and serialization
//! - Request/response correlation via Invoke ID, skipping late replies to
//!   requests that already timed out
//! - Response parsing and controller error checking
//! - Typed helpers for bit, byte, word, double word and long word variables
//!
//! # Example
//!
//! ```no_run
//! use xgt_fenet::{Client, ClientConfig, DataType};
//! use std::net::Ipv4Addr;
//!
//! let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20));
//! let client = Client::new(config)?;
//!
//! // Read several words in one request
//! let items = client.read(DataType::Word, &["%MW100", "%DW102"])?;
//!
//! // Typed helpers
//! let running = client.read_bit("%MX0")?;
//! client.write_word("%MW200", 0x1234)?;
//! # Ok::<(), xgt_fenet::XgtError>(())
//! ```
//!
//! # Thread Safety
//!
//! Invoke IDs come from an atomic counter and the stream is guarded by a
//! mutex, so a `Client` can be shared between threads. Requests on one client
//! are exchanged one at a time.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::codes::DataType;
use crate::command::{ReadRequest, WriteRequest, WriteVariable};
use crate::error::{Result, XgtError};
use crate::header::XgtHeader;
use crate::response::{ReadResponse, ResponseItem, WriteResponse};
use crate::transport::{TcpTransport, DEFAULT_TIMEOUT, DEFAULT_XGT_PORT};

/// Configuration for creating an XGT client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// FEnet module address.
    pub plc_addr: SocketAddr,
    /// Communication timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a new client configuration for the given module IP.
    ///
    /// The port defaults to 2004 and the timeout to 2 seconds.
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::ClientConfig;
    /// use std::net::Ipv4Addr;
    ///
    /// let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20));
    /// assert_eq!(config.plc_addr.port(), 2004);
    /// ```
    pub fn new(plc_ip: Ipv4Addr) -> Self {
        Self {
            plc_addr: SocketAddr::from((plc_ip, DEFAULT_XGT_PORT)),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port (default is 2004).
    pub fn with_port(mut self, port: u16) -> Self {
        self.plc_addr.set_port(port);
        self
    }

    /// Sets a custom timeout (default is 2 seconds).
    ///
    /// # Example
    ///
    /// ```
    /// use xgt_fenet::ClientConfig;
    /// use std::net::Ipv4Addr;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20))
    ///     .with_timeout(Duration::from_millis(500));
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// XGT client for communicating with LS ELECTRIC PLCs.
///
/// Each operation sends exactly 1 request and returns its response.
/// No automatic retries, caching, or reconnection.
///
/// A reply that arrives after its request timed out is discarded by the next
/// exchange, which recognises it by its older invoke id.
pub struct Client {
    transport: Mutex<TcpTransport>,
    invoke_counter: AtomicU16,
    timeout: Duration,
}

impl Client {
    /// Connects a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connection cannot be established.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = TcpTransport::new(config.plc_addr, config.timeout)?;

        Ok(Self {
            transport: Mutex::new(transport),
            invoke_counter: AtomicU16::new(0),
            timeout: config.timeout,
        })
    }

    /// Generates the next Invoke ID.
    fn next_invoke_id(&self) -> u16 {
        self.invoke_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends `frame` and returns the first reply that is not stale.
    ///
    /// A reply is stale when its invoke id lies up to half the id space
    /// behind `invoke_id`. Stale replies are dropped until the timeout
    /// elapses; anything else is returned for correlation checking.
    fn exchange(&self, frame: &[u8], invoke_id: u16) -> Result<Vec<u8>> {
        let transport = self
            .transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let deadline = Instant::now() + self.timeout;
        transport.send(frame)?;

        loop {
            let reply = transport.receive()?;
            let received = XgtHeader::from_bytes(&reply)?.invoke_id;
            let age = invoke_id.wrapping_sub(received);
            if age == 0 || age >= 0x8000 {
                return Ok(reply);
            }

            debug!(expected = invoke_id, received, "discarding stale reply");
            if Instant::now() >= deadline {
                return Err(XgtError::Timeout);
            }
        }
    }

    fn check_correlation(expected: u16, received: u16) -> Result<()> {
        if expected != received {
            warn!(expected, received, "invoke id mismatch");
            return Err(XgtError::invoke_id_mismatch(expected, received));
        }
        Ok(())
    }

    /// Reads named variables.
    ///
    /// # Arguments
    ///
    /// * `data_type` - Register width of every variable
    /// * `variables` - Variable names (1-16)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The variable list is empty or longer than 16
    /// - Communication fails
    /// - The response is malformed or belongs to another request
    /// - The controller reports an error
    ///
    /// # Example
    ///
    /// ```no_run
    /// use xgt_fenet::{Client, ClientConfig, DataType};
    /// use std::net::Ipv4Addr;
    ///
    /// let client = Client::new(ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20))).unwrap();
    ///
    /// let items = client.read(DataType::Word, &["%MW100", "%MW101"]).unwrap();
    /// for item in items {
    ///     println!("{} byte(s): 0x{:04X}", item.size, item.value);
    /// }
    /// ```
    pub fn read<S: AsRef<str>>(&self, data_type: DataType, variables: &[S]) -> Result<Vec<ResponseItem>> {
        let invoke_id = self.next_invoke_id();
        let request = ReadRequest::new(invoke_id, data_type, variables)?;
        debug!(invoke_id, %data_type, count = variables.len(), "read request");

        let reply = self.exchange(&request.to_bytes(), invoke_id)?;
        let response = ReadResponse::from_bytes(&reply)?;
        Self::check_correlation(invoke_id, response.invoke_id())?;
        response.check_error()?;

        if response.items.len() != variables.len() {
            return Err(XgtError::malformed_frame(format!(
                "requested {} variables, controller returned {}",
                variables.len(),
                response.items.len()
            )));
        }

        Ok(response.items)
    }

    fn read_one(&self, data_type: DataType, name: &str) -> Result<ResponseItem> {
        let mut items = self.read(data_type, &[name])?;
        items
            .pop()
            .ok_or_else(|| XgtError::malformed_frame("no variable in response"))
    }

    /// Reads a single bit variable such as `%MX0`.
    pub fn read_bit(&self, name: &str) -> Result<bool> {
        Ok(self.read_one(DataType::Bit, name)?.as_bool())
    }

    /// Reads a single byte variable such as `%MB0`.
    pub fn read_byte(&self, name: &str) -> Result<u8> {
        Ok(self.read_one(DataType::Byte, name)?.as_u8())
    }

    /// Reads a single word variable such as `%MW100`.
    pub fn read_word(&self, name: &str) -> Result<u16> {
        Ok(self.read_one(DataType::Word, name)?.as_u16())
    }

    /// Reads a single double word variable such as `%MD10`.
    pub fn read_dword(&self, name: &str) -> Result<u32> {
        Ok(self.read_one(DataType::DWord, name)?.as_u32())
    }

    /// Reads a single long word variable such as `%ML10`.
    pub fn read_lword(&self, name: &str) -> Result<u64> {
        Ok(self.read_one(DataType::LWord, name)?.value)
    }

    /// Writes named variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The variable list is empty or longer than 16
    /// - A value does not match the data type's width
    /// - Communication fails
    /// - The response is malformed or belongs to another request
    /// - The controller reports an error
    ///
    /// # Example
    ///
    /// ```no_run
    /// use xgt_fenet::{Client, ClientConfig, DataType, WriteVariable};
    /// use std::net::Ipv4Addr;
    ///
    /// let client = Client::new(ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20))).unwrap();
    ///
    /// client.write(DataType::Word, vec![
    ///     WriteVariable::word("%MW100", 10),
    ///     WriteVariable::word("%MW101", 20),
    /// ]).unwrap();
    /// ```
    pub fn write(&self, data_type: DataType, variables: Vec<WriteVariable>) -> Result<()> {
        let invoke_id = self.next_invoke_id();
        let request = WriteRequest::new(invoke_id, data_type, variables)?;
        debug!(
            invoke_id,
            %data_type,
            count = request.variables().len(),
            "write request"
        );

        let reply = self.exchange(&request.to_bytes(), invoke_id)?;
        let response = WriteResponse::from_bytes(&reply)?;
        Self::check_correlation(invoke_id, response.invoke_id())?;
        response.check_error()
    }

    /// Writes a single bit variable.
    pub fn write_bit(&self, name: &str, value: bool) -> Result<()> {
        self.write(DataType::Bit, vec![WriteVariable::bit(name, value)])
    }

    /// Writes a single word variable.
    pub fn write_word(&self, name: &str, value: u16) -> Result<()> {
        self.write(DataType::Word, vec![WriteVariable::word(name, value)])
    }

    /// Writes a single double word variable.
    pub fn write_dword(&self, name: &str, value: u32) -> Result<()> {
        self.write(DataType::DWord, vec![WriteVariable::dword(name, value)])
    }

    /// Returns the remote PLC address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remote_addr()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("remote_addr", &self.remote_addr())
            .field("invoke_counter", &self.invoke_counter.load(Ordering::Relaxed))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{XgtHeader, SOURCE_SERVER, XGT_HEADER_SIZE};
    use crate::utils::{get_u16_le, put_u16_le};
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Reads one request frame from the stream.
    fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut frame = vec![0u8; XGT_HEADER_SIZE];
        stream.read_exact(&mut frame).unwrap();
        let len = get_u16_le(&frame, 16).unwrap() as usize;
        frame.resize(XGT_HEADER_SIZE + len, 0);
        stream.read_exact(&mut frame[XGT_HEADER_SIZE..]).unwrap();
        frame
    }

    fn reply(invoke_id: u16, command: u16, data_type: u16, status: u16, field: u16, data: &[u8]) -> Vec<u8> {
        let mut instruction = Vec::new();
        put_u16_le(&mut instruction, command);
        put_u16_le(&mut instruction, data_type);
        put_u16_le(&mut instruction, 0);
        put_u16_le(&mut instruction, status);
        put_u16_le(&mut instruction, field);
        instruction.extend_from_slice(data);

        let mut header = XgtHeader::new_request(invoke_id, instruction.len() as u16);
        header.source = SOURCE_SERVER;
        let mut frame = header.to_bytes().to_vec();
        frame.extend(instruction);
        frame
    }

    /// Mock controller: answers each request with `respond(request)`.
    fn mock_plc<F>(requests: usize, respond: F) -> (ClientConfig, thread::JoinHandle<Vec<Vec<u8>>>)
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut seen = Vec::new();
            for _ in 0..requests {
                let request = read_request(&mut stream);
                stream.write_all(&respond(&request)).unwrap();
                seen.push(request);
            }
            seen
        });

        let config = ClientConfig::new(Ipv4Addr::LOCALHOST)
            .with_port(addr.port())
            .with_timeout(Duration::from_secs(2));
        (config, handle)
    }

    fn invoke_id_of(request: &[u8]) -> u16 {
        get_u16_le(request, 14).unwrap()
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(config.plc_addr.ip().to_string(), "192.168.1.20");
        assert_eq!(config.plc_addr.port(), DEFAULT_XGT_PORT);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_client_config_builders() {
        let config = ClientConfig::new(Ipv4Addr::new(10, 0, 0, 1))
            .with_port(2005)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.plc_addr.port(), 2005);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_client_read_words() {
        let (config, server) = mock_plc(1, |request| {
            reply(
                invoke_id_of(request),
                0x0055,
                0x0002,
                0,
                2,
                &[0x02, 0x00, 0x34, 0x12, 0x02, 0x00, 0xCD, 0xAB],
            )
        });

        let client = Client::new(config).unwrap();
        let items = client.read(DataType::Word, &["%MW100", "%MW101"]).unwrap();
        assert_eq!(items[0].as_u16(), 0x1234);
        assert_eq!(items[1].as_u16(), 0xABCD);

        let requests = server.join().unwrap();
        assert_eq!(&requests[0][XGT_HEADER_SIZE..XGT_HEADER_SIZE + 2], &[0x54, 0x00]);
    }

    #[test]
    fn test_client_invoke_id_increment() {
        let (config, server) = mock_plc(3, |request| {
            reply(invoke_id_of(request), 0x0055, 0x0000, 0, 1, &[0x01, 0x00, 0x01])
        });

        let client = Client::new(config).unwrap();
        for _ in 0..3 {
            assert!(client.read_bit("%MX0").unwrap());
        }

        let ids: Vec<u16> = server.join().unwrap().iter().map(|r| invoke_id_of(r)).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_client_typed_reads() {
        let (config, server) = mock_plc(3, |request| {
            let id = invoke_id_of(request);
            match get_u16_le(request, XGT_HEADER_SIZE + 2).unwrap() {
                0x0001 => reply(id, 0x0055, 0x0001, 0, 1, &[0x01, 0x00, 0x7F]),
                0x0003 => reply(id, 0x0055, 0x0003, 0, 1, &[0x04, 0x00, 0x78, 0x56, 0x34, 0x12]),
                _ => reply(
                    id,
                    0x0055,
                    0x0004,
                    0,
                    1,
                    &[0x08, 0x00, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01],
                ),
            }
        });

        let client = Client::new(config).unwrap();
        assert_eq!(client.read_byte("%MB0").unwrap(), 0x7F);
        assert_eq!(client.read_dword("%MD0").unwrap(), 0x1234_5678);
        assert_eq!(client.read_lword("%ML0").unwrap(), 0x0102_0304_0506_0708);
        server.join().unwrap();
    }

    #[test]
    fn test_client_controller_error() {
        let (config, server) = mock_plc(1, |request| {
            reply(invoke_id_of(request), 0x0055, 0x0002, 0xFFFF, 0x0021, &[])
        });

        let client = Client::new(config).unwrap();
        match client.read_word("%MW100") {
            Err(XgtError::ControllerError { code }) => assert_eq!(code, 0x0021),
            other => panic!("Expected ControllerError, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_client_invoke_id_mismatch() {
        let (config, server) = mock_plc(1, |request| {
            reply(invoke_id_of(request).wrapping_add(5), 0x0055, 0x0002, 0, 1, &[0x02, 0x00, 0x00, 0x00])
        });

        let client = Client::new(config).unwrap();
        assert!(matches!(
            client.read_word("%MW100"),
            Err(XgtError::InvokeIdMismatch { expected: 0, received: 5 })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_client_recovers_after_late_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let first = read_request(&mut stream);
            thread::sleep(Duration::from_millis(200));
            stream
                .write_all(&reply(invoke_id_of(&first), 0x0055, 0x0002, 0, 1, &[0x02, 0x00, 0x11, 0x11]))
                .unwrap();

            let second = read_request(&mut stream);
            stream
                .write_all(&reply(invoke_id_of(&second), 0x0055, 0x0002, 0, 1, &[0x02, 0x00, 0x22, 0x22]))
                .unwrap();
            vec![invoke_id_of(&first), invoke_id_of(&second)]
        });

        let config = ClientConfig::new(Ipv4Addr::LOCALHOST)
            .with_port(addr.port())
            .with_timeout(Duration::from_millis(80));
        let client = Client::new(config).unwrap();

        assert!(matches!(client.read_word("%MW100"), Err(XgtError::Timeout)));
        thread::sleep(Duration::from_millis(250));
        assert_eq!(client.read_word("%MW100").unwrap(), 0x2222);

        assert_eq!(server.join().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_client_item_count_mismatch() {
        let (config, server) = mock_plc(1, |request| {
            reply(invoke_id_of(request), 0x0055, 0x0002, 0, 1, &[0x02, 0x00, 0x00, 0x00])
        });

        let client = Client::new(config).unwrap();
        assert!(matches!(
            client.read(DataType::Word, &["%MW0", "%MW1"]),
            Err(XgtError::MalformedFrame { .. })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_client_write() {
        let (config, server) = mock_plc(2, |request| {
            let data_type = get_u16_le(request, XGT_HEADER_SIZE + 2).unwrap();
            reply(invoke_id_of(request), 0x0059, data_type, 0, 1, &[])
        });

        let client = Client::new(config).unwrap();
        client.write_word("%MW200", 0x1234).unwrap();
        client.write_bit("%MX1", true).unwrap();

        let requests = server.join().unwrap();
        let word = &requests[0][XGT_HEADER_SIZE..];
        assert_eq!(get_u16_le(word, 0), Some(0x0058));
        assert_eq!(&word[word.len() - 4..], &[0x02, 0x00, 0x34, 0x12]);
        let bit = &requests[1][XGT_HEADER_SIZE..];
        assert_eq!(get_u16_le(bit, 2), Some(0x0000));
        assert_eq!(&bit[bit.len() - 3..], &[0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_client_write_controller_error() {
        let (config, server) = mock_plc(1, |request| {
            reply(invoke_id_of(request), 0x0059, 0x0003, 0x0001, 0x0010, &[])
        });

        let client = Client::new(config).unwrap();
        assert!(matches!(
            client.write_dword("%MD0", 1),
            Err(XgtError::ControllerError { code: 0x0010 })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_client_rejects_invalid_request_without_sending() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ClientConfig::new(Ipv4Addr::LOCALHOST).with_port(listener.local_addr().unwrap().port());

        let client = Client::new(config).unwrap();
        let none: [&str; 0] = [];
        assert!(matches!(
            client.read(DataType::Word, &none),
            Err(XgtError::InvalidVariableCount { count: 0 })
        ));
    }

    #[test]
    fn test_client_debug() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ClientConfig::new(Ipv4Addr::LOCALHOST).with_port(listener.local_addr().unwrap().port());
        let client = Client::new(config).unwrap();
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("Client"));
        assert!(debug_str.contains("127.0.0.1"));
    }
}
