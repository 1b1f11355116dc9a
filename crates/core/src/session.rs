//! Accessory session: one open connection plus its HID registrations.
//!
//! HID ids are assigned sequentially from 1 and never reused within a
//! session, even when a registration fails. Teardown unregisters in
//! reverse registration order.

use std::sync::Arc;
use std::time::Duration;

use crate::aoa::AoaRequest;
use crate::clock::Clock;
use crate::descriptor::DescriptorType;
use crate::error::{Error, Result};
use crate::transport::{send_request, AccessoryConnector, UsbTransport};
use tracing::{debug, info, warn};

/// Time for the accessory to instantiate a new input device.
pub const REGISTER_SETTLE: Duration = Duration::from_millis(300);
/// Time for the accessory to tear an input device down.
pub const UNREGISTER_SETTLE: Duration = Duration::from_millis(200);
/// Hold time between the down and up report of a tap.
pub const TAP_HOLD: Duration = Duration::from_millis(80);

/// One active virtual input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub id: u16,
    pub descriptor: DescriptorType,
}

/// An open accessory with zero or more registered HID devices.
pub struct AccessorySession {
    transport: Box<dyn UsbTransport>,
    clock: Arc<dyn Clock>,
    next_id: u16,
    registered: Vec<Registration>,
    last_id: Option<u16>,
}

impl AccessorySession {
    /// Locate and open the accessory. No HID devices are registered yet.
    pub fn open(
        connector: &dyn AccessoryConnector,
        serial_filter: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let transport = connector.open(serial_filter)?;
        debug!(serial = transport.serial().unwrap_or("-"), "Accessory opened");
        Ok(Self::new(transport, clock))
    }

    /// Wrap an already-open transport.
    pub fn new(transport: Box<dyn UsbTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            clock,
            next_id: 1,
            registered: Vec::new(),
            last_id: None,
        }
    }

    /// Register a HID descriptor and return its id.
    ///
    /// Sends REGISTER_HID then SET_HID_REPORT_DESC, then waits
    /// [`REGISTER_SETTLE`]. On failure the id is best-effort unregistered
    /// and stays consumed.
    pub fn register_descriptor(&mut self, descriptor: DescriptorType) -> Result<u16> {
        let bytes = descriptor.bytes();
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or_else(|| Error::Registration {
            descriptor: descriptor.label(),
            reason: "HID id space exhausted".into(),
        })?;

        let registration_error = |step: &str, e: Error| Error::Registration {
            descriptor: descriptor.label(),
            reason: format!("{step}: {e}"),
        };

        if let Err(e) = self.transfer(&AoaRequest::register_hid(id, bytes.len() as u16)) {
            self.discard_id(id);
            return Err(registration_error("REGISTER_HID", e));
        }

        if let Err(e) = self.transfer(&AoaRequest::set_report_descriptor(id, bytes)) {
            self.discard_id(id);
            return Err(registration_error("SET_HID_REPORT_DESC", e));
        }

        self.clock.sleep(REGISTER_SETTLE);

        self.registered.push(Registration { id, descriptor });
        self.last_id = Some(id);
        info!(hid_id = id, descriptor = descriptor.label(), "HID registered");
        Ok(id)
    }

    /// Unregister the most recently registered HID device. No-op when none.
    pub fn unregister_descriptor(&mut self) -> Result<()> {
        let Some(reg) = self.registered.pop() else {
            return Ok(());
        };
        self.last_id = self.registered.last().map(|r| r.id);
        let result = self.transfer(&AoaRequest::unregister_hid(reg.id));
        self.clock.sleep(UNREGISTER_SETTLE);
        debug!(hid_id = reg.id, "HID unregistered");
        result
    }

    /// Send an input report to a specific HID id.
    pub fn send_report_to(&self, id: u16, report: &[u8]) -> Result<()> {
        self.transfer(&AoaRequest::send_event(id, report))
    }

    /// Send an input report to the most recently registered HID id.
    pub fn send_report(&self, report: &[u8]) -> Result<()> {
        let id = self
            .last_id
            .ok_or_else(|| Error::Transfer("no HID device registered".into()))?;
        self.send_report_to(id, report)
    }

    /// Momentary press on a specific HID id: down, [`TAP_HOLD`], up.
    pub fn tap_to(&self, id: u16, down: &[u8], up: &[u8]) -> Result<()> {
        self.send_report_to(id, down)
            .map_err(|e| Error::Transfer(format!("key down: {e}")))?;
        self.clock.sleep(TAP_HOLD);
        self.send_report_to(id, up)
            .map_err(|e| Error::Transfer(format!("key up: {e}")))
    }

    /// Momentary press on the most recently registered HID id.
    pub fn tap(&self, down: &[u8], up: &[u8]) -> Result<()> {
        let id = self
            .last_id
            .ok_or_else(|| Error::Transfer("no HID device registered".into()))?;
        self.tap_to(id, down, up)
    }

    /// Send a key-down report and leave it held.
    pub fn hold_down(&self, down: &[u8]) -> Result<()> {
        self.send_report(down)
    }

    /// Send a key-up report.
    pub fn release(&self, up: &[u8]) -> Result<()> {
        self.send_report(up)
    }

    /// Check that the accessory is still reachable.
    pub fn ping(&self) -> Result<()> {
        self.transport
            .ping()
            .map_err(|e| Error::HealthCheck(e.to_string()))
    }

    /// Active registrations in registration order.
    pub fn registrations(&self) -> &[Registration] {
        &self.registered
    }

    /// Most recently registered id still active.
    pub fn last_id(&self) -> Option<u16> {
        self.last_id
    }

    pub fn serial(&self) -> Option<&str> {
        self.transport.serial()
    }

    /// Unregister everything (best-effort) and release the handle.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        while let Some(reg) = self.registered.pop() {
            if let Err(e) = self.transfer(&AoaRequest::unregister_hid(reg.id)) {
                warn!(hid_id = reg.id, error = %e, "Ignoring unregister failure during close");
            }
        }
        self.last_id = None;
    }

    fn discard_id(&self, id: u16) {
        if let Err(e) = self.transfer(&AoaRequest::unregister_hid(id)) {
            debug!(hid_id = id, error = %e, "Cleanup of partial registration failed");
        }
    }

    fn transfer(&self, request: &AoaRequest) -> Result<()> {
        send_request(self.transport.as_ref(), request)
    }
}

impl Drop for AccessorySession {
    fn drop(&mut self) {
        self.teardown();
    }
}
