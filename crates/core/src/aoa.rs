//! Android Open Accessory 2.0 HID control requests.
//!
//! AOA2 lets a USB host register virtual HID devices on an Android device
//! using four vendor control requests on endpoint 0:
//! - `ACCESSORY_REGISTER_HID` (54): wValue = HID id, wIndex = descriptor length
//! - `ACCESSORY_UNREGISTER_HID` (55): wValue = HID id
//! - `ACCESSORY_SET_HID_REPORT_DESC` (56): wValue = HID id, wIndex = offset, data = descriptor
//! - `ACCESSORY_SEND_HID_EVENT` (57): wValue = HID id, data = input report
//!
//! Protocol reference: <https://source.android.com/docs/core/interaction/accessories/aoa2>

use std::time::Duration;

/// bmRequestType for every AOA2 HID request:
/// host-to-device (0x00) | vendor (0x40) | device recipient (0x00).
pub const REQUEST_TYPE_OUT: u8 = 0x40;

/// Timeout applied to every control transfer.
pub const USB_TIMEOUT: Duration = Duration::from_millis(1000);

/// AOA2 bRequest codes.
pub mod requests {
    /// Create a virtual HID device.
    pub const REGISTER_HID: u8 = 54;
    /// Destroy a virtual HID device.
    pub const UNREGISTER_HID: u8 = 55;
    /// Upload the report descriptor for a registered id.
    pub const SET_HID_REPORT_DESC: u8 = 56;
    /// Deliver one input report.
    pub const SEND_HID_EVENT: u8 = 57;
}

/// A single AOA2 vendor control OUT request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AoaRequest {
    /// bRequest code (see [`requests`]).
    pub request: u8,
    /// wValue: the HID registration id.
    pub value: u16,
    /// wIndex: descriptor length for REGISTER_HID, otherwise zero.
    pub index: u16,
    /// Payload: descriptor bytes, report bytes, or empty.
    pub data: Vec<u8>,
}

impl AoaRequest {
    /// REGISTER_HID announcing a descriptor of `descriptor_len` bytes.
    pub fn register_hid(id: u16, descriptor_len: u16) -> Self {
        Self {
            request: requests::REGISTER_HID,
            value: id,
            index: descriptor_len,
            data: Vec::new(),
        }
    }

    /// UNREGISTER_HID for `id`.
    pub fn unregister_hid(id: u16) -> Self {
        Self {
            request: requests::UNREGISTER_HID,
            value: id,
            index: 0,
            data: Vec::new(),
        }
    }

    /// SET_HID_REPORT_DESC carrying the full descriptor at offset 0.
    pub fn set_report_descriptor(id: u16, descriptor: &[u8]) -> Self {
        Self {
            request: requests::SET_HID_REPORT_DESC,
            value: id,
            index: 0,
            data: descriptor.to_vec(),
        }
    }

    /// SEND_HID_EVENT carrying one input report.
    pub fn send_event(id: u16, report: &[u8]) -> Self {
        Self {
            request: requests::SEND_HID_EVENT,
            value: id,
            index: 0,
            data: report.to_vec(),
        }
    }

    /// bmRequestType byte; identical for all four requests.
    pub fn request_type(&self) -> u8 {
        REQUEST_TYPE_OUT
    }

    /// Short name of the request, for logs.
    pub fn name(&self) -> &'static str {
        match self.request {
            requests::REGISTER_HID => "REGISTER_HID",
            requests::UNREGISTER_HID => "UNREGISTER_HID",
            requests::SET_HID_REPORT_DESC => "SET_HID_REPORT_DESC",
            requests::SEND_HID_EVENT => "SEND_HID_EVENT",
            _ => "UNKNOWN",
        }
    }
}
