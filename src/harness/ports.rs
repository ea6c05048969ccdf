//! Free host port selection

use std::net::{Ipv4Addr, TcpListener};

use crate::errors::{FilterError, FilterResult};

/// First port of the IANA dynamic/private range
pub const DYNAMIC_PORT_START: u16 = 49152;

fn is_free(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

/// Returns `preferred` if it can be bound, otherwise the first free port in
/// the dynamic range.
pub fn free_port(preferred: Option<u16>) -> FilterResult<u16> {
    if let Some(port) = preferred.filter(|p| *p != 0) {
        if is_free(port) {
            return Ok(port);
        }
    }

    (DYNAMIC_PORT_START..=u16::MAX)
        .find(|port| Some(*port) != preferred && is_free(*port))
        .ok_or_else(|| FilterError::harness("no free port in the dynamic range"))
}
