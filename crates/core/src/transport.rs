//! USB transport abstraction for accessory communication.
//!
//! Provides a trait-based transport layer so that real USB devices and
//! the in-memory test bus share the same interface.

use crate::aoa::AoaRequest;
use crate::error::Result;
use tracing::{trace, warn};

/// Abstraction over an open USB handle to the accessory.
pub trait UsbTransport: Send {
    /// Issue one vendor control OUT request. Implementations apply
    /// [`crate::aoa::USB_TIMEOUT`] and never retry.
    fn control_out(&self, request: &AoaRequest) -> Result<()>;

    /// Cheap read used only to check that the device is still reachable.
    fn ping(&self) -> Result<()>;

    /// Serial number reported at open time, if any.
    fn serial(&self) -> Option<&str>;
}

/// Locates and opens the accessory.
pub trait AccessoryConnector: Send + Sync {
    /// Open the first accessory matching the fixed vendor/product identity.
    /// An empty `serial_filter` accepts any serial; otherwise it must match
    /// exactly. Fails with [`crate::error::Error::NotFound`] when nothing matches.
    fn open(&self, serial_filter: &str) -> Result<Box<dyn UsbTransport>>;
}

/// Send an AOA request with TX tracing.
pub fn send_request(transport: &dyn UsbTransport, request: &AoaRequest) -> Result<()> {
    trace!(
        request = request.name(),
        hid_id = request.value,
        index = request.index,
        data_hex = format_args!("{:02X?}", request.data),
        "AOA TX"
    );

    transport.control_out(request).inspect_err(|e| {
        warn!(
            request = request.name(),
            hid_id = request.value,
            error = %e,
            "AOA control transfer failed"
        );
    })
}
