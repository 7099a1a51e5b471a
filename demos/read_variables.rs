//! Example: Reading and writing XGT variables
//!
//! Run with: cargo run --example read_variables -- 192.168.1.20
//!
//! This example demonstrates:
//! - Building a read request and inspecting the frame
//! - Reading several variables in one request
//! - Typed single-variable reads and writes
//! - Handling controller-reported errors

use std::net::Ipv4Addr;

use xgt_fenet::utils::format_frame;
use xgt_fenet::{build_read_request, Client, ClientConfig, DataType, XgtError};

fn main() -> xgt_fenet::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let ip: Ipv4Addr = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(Ipv4Addr::new(192, 168, 1, 20));

    // =========================================================================
    // Frame layout
    // =========================================================================

    let frame = build_read_request(0x0001, DataType::Word, &["%DW102"])?;
    println!("Read frame: {}", format_frame(&frame));

    // =========================================================================
    // Connect to PLC
    // =========================================================================

    let client = Client::new(ClientConfig::new(ip))?;

    println!("\n=== Reading Words ===\n");

    let names = ["%MW100", "%MW101", "%DW102"];
    let items = client.read(DataType::Word, &names)?;
    for (name, item) in names.iter().zip(&items) {
        println!("{} = {} (0x{:04X})", name, item.as_u16(), item.as_u16());
    }

    println!("\n=== Typed Access ===\n");

    println!("%MX0  = {}", client.read_bit("%MX0")?);
    println!("%MD10 = {}", client.read_dword("%MD10")?);

    client.write_word("%MW200", 0x1234)?;
    println!("%MW200 <- 0x1234, read back 0x{:04X}", client.read_word("%MW200")?);

    println!("\n=== Controller Errors ===\n");

    match client.read_word("%ZW0") {
        Ok(value) => println!("%ZW0 = {}", value),
        Err(XgtError::ControllerError { code }) => {
            println!("Controller rejected %ZW0 with error 0x{:04X}", code)
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
