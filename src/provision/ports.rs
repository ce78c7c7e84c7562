//! Host port allocation for published worker endpoints

use crate::error::ProvisionError;
use std::net::TcpListener;

/// Source of host ports for worker endpoints
///
/// The provisioner pulls one port per worker. Implementations decide how
/// collisions with already-bound ports are handled.
pub trait PortAllocator: Send {
    /// Hand out the next usable port
    fn allocate(&mut self) -> Result<u16, ProvisionError>;
}

/// Allocates sequential ports starting at a base, skipping bound ones
///
/// Each candidate is bind-probed before being handed out. A port that is
/// free at probe time can still be taken before the container binds it;
/// that race surfaces as a container start error and teardown cleans up
/// after it like any other provisioning failure.
#[derive(Debug)]
pub struct SequentialPorts {
    next: u16,
    /// One past the last candidate port
    limit: u16,
    start: u16,
}

impl SequentialPorts {
    /// Probe candidates in `[base, base + span)`
    pub fn new(base: u16, span: u16) -> Self {
        Self {
            next: base,
            limit: base.saturating_add(span),
            start: base,
        }
    }
}

impl PortAllocator for SequentialPorts {
    fn allocate(&mut self) -> Result<u16, ProvisionError> {
        while self.next < self.limit {
            let candidate = self.next;
            self.next += 1;
            if port_is_free(candidate) {
                return Ok(candidate);
            }
        }
        Err(ProvisionError::PortsExhausted {
            start: self.start,
            end: self.limit,
        })
    }
}

/// Whether `port` can currently be bound on loopback
fn port_is_free(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}
