//! TCP transport layer for XGT communication.
//!
//! This module provides the [`TcpTransport`] struct which moves complete
//! frames between the client and an XGT FEnet module. It knows just enough
//! about the protocol to find frame boundaries on the stream: it reads the
//! 20-byte header, then exactly as many bytes as the header's instruction
//! length declares.
//!
//! # Design
//!
//! - **Synchronous** - Blocking send/receive with configurable timeout
//! - **Simple** - One stream, one remote address, one frame in flight
//! - **Frame aligned** - A failure that leaves part of a frame unread marks
//!   the transport broken; every later call fails with
//!   [`XgtError::ConnectionBroken`] until the caller reconnects
//!
//! # Constants
//!
//! - [`DEFAULT_XGT_PORT`] - XGT dedicated protocol TCP port (2004)
//! - [`DEFAULT_TIMEOUT`] - Default timeout (2 seconds)
//! - [`MAX_DATA_SIZE`] - Largest data block the controller transfers at once
//! - [`MAX_INSTRUCTION_SIZE`] - Largest reply instruction accepted
//!
//! # Example
//!
//! ```no_run
//! use xgt_fenet::{build_read_request, DataType, TcpTransport};
//! use std::time::Duration;
//!
//! let transport = TcpTransport::new(
//!     "192.168.1.20:2004".parse().unwrap(),
//!     Duration::from_secs(2),
//! ).unwrap();
//!
//! let request = build_read_request(1, DataType::Word, &["%MW100"]).unwrap();
//! let response = transport.send_receive(&request).unwrap();
//! ```

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::{Result, XgtError};
use crate::header::{XgtHeader, XGT_HEADER_SIZE};
use crate::response::RESPONSE_PREFIX_SIZE;
use crate::utils::format_frame;

/// Default XGT dedicated protocol TCP port.
pub const DEFAULT_XGT_PORT: u16 = 2004;

/// Default timeout for TCP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest data block the controller returns in one reply.
pub const MAX_DATA_SIZE: usize = 1400;

/// Largest reply instruction accepted: the fixed response fields, one size
/// field and a full data block.
pub const MAX_INSTRUCTION_SIZE: usize = RESPONSE_PREFIX_SIZE + 2 + MAX_DATA_SIZE;

fn map_io(e: std::io::Error) -> XgtError {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => XgtError::Timeout,
        _ => XgtError::Io(e),
    }
}

/// TCP transport for XGT communication.
pub struct TcpTransport {
    stream: TcpStream,
    remote_addr: SocketAddr,
    broken: AtomicBool,
}

impl TcpTransport {
    /// Connects to the specified PLC address.
    ///
    /// # Arguments
    ///
    /// * `plc_addr` - Socket address of the FEnet module (IP:port)
    /// * `timeout` - Connect, read and write timeout
    ///
    /// # Errors
    ///
    /// Returns `XgtError::Timeout` if the connection attempt times out, or an
    /// I/O error if the stream cannot be created or configured.
    pub fn new(plc_addr: SocketAddr, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect_timeout(&plc_addr, timeout).map_err(map_io)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;

        debug!(%plc_addr, ?timeout, "connected to XGT controller");

        Ok(Self {
            stream,
            remote_addr: plc_addr,
            broken: AtomicBool::new(false),
        })
    }

    /// Connects with the default timeout.
    ///
    /// # Errors
    ///
    /// Same as [`TcpTransport::new`].
    pub fn with_default_timeout(plc_addr: SocketAddr) -> Result<Self> {
        Self::new(plc_addr, DEFAULT_TIMEOUT)
    }

    fn mark_broken(&self, reason: &str) {
        warn!(remote_addr = %self.remote_addr, reason, "transport out of frame alignment");
        self.broken.store(true, Ordering::Relaxed);
    }

    fn check_usable(&self) -> Result<()> {
        if self.is_broken() {
            return Err(XgtError::connection_broken(
                "stream lost frame alignment, reconnect",
            ));
        }
        Ok(())
    }

    /// Fills `buf` from the stream.
    ///
    /// A failure after the first byte of a frame has been consumed breaks the
    /// transport. `frame_started` tells whether earlier parts of the same
    /// frame were already read.
    fn read_full(&self, buf: &mut [u8], frame_started: bool) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match (&self.stream).read(&mut buf[filled..]) {
                Ok(0) => {
                    self.mark_broken("connection closed by peer");
                    return Err(XgtError::Io(ErrorKind::UnexpectedEof.into()));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    if frame_started || filled > 0 {
                        self.mark_broken("read failed inside a frame");
                    }
                    return Err(map_io(e));
                }
            }
        }
        Ok(())
    }

    /// Sends one complete frame.
    ///
    /// # Errors
    ///
    /// Returns `XgtError::ConnectionBroken` if the transport is broken, or a
    /// timeout/I/O error; a failed send breaks the transport.
    pub fn send(&self, data: &[u8]) -> Result<()> {
        self.check_usable()?;
        trace!(frame = %format_frame(data), "sending frame");
        (&self.stream).write_all(data).map_err(|e| {
            self.mark_broken("write failed");
            map_io(e)
        })
    }

    /// Receives one complete controller frame (header and instruction).
    ///
    /// A timeout before any byte of the reply arrived leaves the transport
    /// usable: a late reply can still be read and discarded by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transport is broken (`XgtError::ConnectionBroken`)
    /// - The receive fails or times out (`XgtError::Timeout`)
    /// - The reply header is not a controller header (`XgtError::MalformedFrame`,
    ///   breaks the transport)
    /// - The reply declares an instruction larger than [`MAX_INSTRUCTION_SIZE`]
    ///   (`XgtError::MalformedFrame`, the declared bytes are drained first)
    pub fn receive(&self) -> Result<Vec<u8>> {
        self.check_usable()?;

        let mut frame = vec![0u8; XGT_HEADER_SIZE];
        self.read_full(&mut frame, false)?;
        let header = XgtHeader::from_bytes(&frame).map_err(|e| {
            self.mark_broken("invalid reply header");
            e
        })?;

        let instruction_length = header.instruction_length as usize;
        frame.resize(XGT_HEADER_SIZE + instruction_length, 0);
        self.read_full(&mut frame[XGT_HEADER_SIZE..], true)?;

        if instruction_length > MAX_INSTRUCTION_SIZE {
            return Err(XgtError::malformed_frame(format!(
                "declared instruction of {} bytes exceeds {}",
                instruction_length, MAX_INSTRUCTION_SIZE
            )));
        }

        debug!(
            invoke_id = header.invoke_id,
            received = frame.len(),
            "frame received"
        );
        trace!(frame = %format_frame(&frame), "received frame");

        Ok(frame)
    }

    /// Sends a frame and receives the controller's reply frame.
    ///
    /// The reply is returned whole (header and instruction) so it can be
    /// handed to the response parsers unchanged. No invoke id matching is
    /// done here; see [`TcpTransport::receive`] for the error cases.
    pub fn send_receive(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.send(data)?;
        self.receive()
    }

    /// Returns whether the stream lost frame alignment and must be reconnected.
    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Relaxed)
    }

    /// Returns the remote PLC address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("remote_addr", &self.remote_addr)
            .field("local_addr", &self.stream.local_addr().ok())
            .field("broken", &self.is_broken())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::SOURCE_SERVER;
    use std::net::TcpListener;
    use std::thread;

    fn reply_frame(invoke_id: u16, instruction: &[u8]) -> Vec<u8> {
        let mut header = XgtHeader::new_request(invoke_id, instruction.len() as u16);
        header.source = SOURCE_SERVER;
        let mut frame = header.to_bytes().to_vec();
        frame.extend_from_slice(instruction);
        frame
    }

    /// Accepts one connection, reads `expect` bytes, then writes `reply`.
    fn serve_once(expect: usize, reply: Vec<u8>) -> (SocketAddr, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = vec![0u8; expect];
            stream.read_exact(&mut request).unwrap();
            stream.write_all(&reply).unwrap();
            request
        });
        (addr, handle)
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_XGT_PORT, 2004);
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(2));
        assert_eq!(MAX_DATA_SIZE, 1400);
        assert_eq!(MAX_INSTRUCTION_SIZE, 1412);
    }

    #[test]
    fn test_send_receive_whole_frame() {
        let reply = reply_frame(0x0010, &[0x01, 0x02, 0x03, 0x04]);
        let (addr, server) = serve_once(3, reply.clone());

        let transport = TcpTransport::new(addr, Duration::from_secs(2)).unwrap();
        assert_eq!(transport.remote_addr(), addr);

        let received = transport.send_receive(&[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(received, reply);
        assert!(!transport.is_broken());
        assert_eq!(server.join().unwrap(), vec![0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_receive_full_continuous_block() {
        let mut instruction = vec![0u8; RESPONSE_PREFIX_SIZE + 2];
        instruction.extend(vec![0x5A; MAX_DATA_SIZE]);
        let reply = reply_frame(1, &instruction);
        let (addr, server) = serve_once(1, reply.clone());

        let transport = TcpTransport::with_default_timeout(addr).unwrap();
        assert_eq!(transport.send_receive(&[0x00]).unwrap(), reply);
        server.join().unwrap();
    }

    #[test]
    fn test_send_receive_rejects_client_header() {
        let mut reply = reply_frame(1, &[]);
        reply[13] = 0x33;
        let (addr, server) = serve_once(1, reply);

        let transport = TcpTransport::with_default_timeout(addr).unwrap();
        assert!(matches!(
            transport.send_receive(&[0x00]),
            Err(XgtError::MalformedFrame { .. })
        ));
        assert!(transport.is_broken());
        assert!(matches!(
            transport.send_receive(&[0x00]),
            Err(XgtError::ConnectionBroken { .. })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_oversized_reply_is_drained() {
        let oversized = reply_frame(1, &vec![0xEE; MAX_INSTRUCTION_SIZE + 1]);
        let valid = reply_frame(2, &[0x01, 0x02]);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let expected = valid.clone();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1];
            stream.read_exact(&mut request).unwrap();
            stream.write_all(&oversized).unwrap();
            stream.read_exact(&mut request).unwrap();
            stream.write_all(&valid).unwrap();
        });

        let transport = TcpTransport::with_default_timeout(addr).unwrap();
        assert!(matches!(
            transport.send_receive(&[0x00]),
            Err(XgtError::MalformedFrame { .. })
        ));
        assert!(!transport.is_broken());
        assert_eq!(transport.send_receive(&[0x00]).unwrap(), expected);
        server.join().unwrap();
    }

    #[test]
    fn test_send_receive_timeout_keeps_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let transport = TcpTransport::new(addr, Duration::from_millis(50)).unwrap();
        assert!(matches!(
            transport.send_receive(&[0x00]),
            Err(XgtError::Timeout)
        ));
        assert!(!transport.is_broken());
        server.join().unwrap();
    }

    #[test]
    fn test_timeout_inside_frame_breaks_transport() {
        let reply = reply_frame(1, &[0x01, 0x02]);
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1];
            stream.read_exact(&mut request).unwrap();
            stream.write_all(&reply[..10]).unwrap();
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let transport = TcpTransport::new(addr, Duration::from_millis(50)).unwrap();
        assert!(matches!(
            transport.send_receive(&[0x00]),
            Err(XgtError::Timeout)
        ));
        assert!(transport.is_broken());
        assert!(matches!(
            transport.receive(),
            Err(XgtError::ConnectionBroken { .. })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_transport_debug() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let transport = TcpTransport::new(addr, Duration::from_millis(500)).unwrap();
        let debug_str = format!("{:?}", transport);
        assert!(debug_str.contains("TcpTransport"));
        assert!(debug_str.contains(&addr.to_string()));
        assert!(debug_str.contains("broken: false"));
    }
}
