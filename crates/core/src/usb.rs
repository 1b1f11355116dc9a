//! nusb-backed transport for a physical accessory.

use std::time::Duration;

use nusb::transfer::{Control, ControlType, Recipient, TransferError};
use serde::Serialize;
use tracing::{debug, info};

use crate::aoa::{AoaRequest, USB_TIMEOUT};
use crate::error::{Error, Result};
use crate::transport::{AccessoryConnector, UsbTransport};

/// Standard GET_STATUS request code.
const GET_STATUS: u8 = 0x00;

/// An attached accessory as seen during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessoryInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: Option<String>,
    pub product: Option<String>,
    pub bus: u8,
    pub address: u8,
}

impl std::fmt::Display for AccessoryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} usb:{:03}/{:03} serial={} product={}",
            self.vendor_id,
            self.product_id,
            self.bus,
            self.address,
            self.serial.as_deref().unwrap_or("-"),
            self.product.as_deref().unwrap_or("-"),
        )
    }
}

fn matches_identity(dev: &nusb::DeviceInfo, vendor_id: u16, product_id: u16) -> bool {
    dev.vendor_id() == vendor_id && dev.product_id() == product_id
}

/// Enumerate attached accessories with the given identity.
pub fn list_accessories(vendor_id: u16, product_id: u16) -> Result<Vec<AccessoryInfo>> {
    let devices = nusb::list_devices().map_err(|e| Error::Usb(format!("enumeration: {e}")))?;
    Ok(devices
        .filter(|dev| matches_identity(dev, vendor_id, product_id))
        .map(|dev| AccessoryInfo {
            vendor_id: dev.vendor_id(),
            product_id: dev.product_id(),
            serial: dev.serial_number().map(str::to_string),
            product: dev.product_string().map(str::to_string),
            bus: dev.bus_number(),
            address: dev.device_address(),
        })
        .collect())
}

/// Opens accessories by vendor/product id over nusb.
#[derive(Debug, Clone, Copy)]
pub struct NusbConnector {
    vendor_id: u16,
    product_id: u16,
}

impl NusbConnector {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl Default for NusbConnector {
    fn default() -> Self {
        Self::new(crate::R1_VID, crate::R1_PID)
    }
}

impl AccessoryConnector for NusbConnector {
    fn open(&self, serial_filter: &str) -> Result<Box<dyn UsbTransport>> {
        let info = nusb::list_devices()
            .map_err(|e| Error::Usb(format!("enumeration: {e}")))?
            .filter(|dev| matches_identity(dev, self.vendor_id, self.product_id))
            .find(|dev| serial_filter.is_empty() || dev.serial_number() == Some(serial_filter))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no accessory {:04x}:{:04x}{}",
                    self.vendor_id,
                    self.product_id,
                    if serial_filter.is_empty() {
                        String::new()
                    } else {
                        format!(" with serial {serial_filter}")
                    }
                ))
            })?;

        let serial = info.serial_number().map(str::to_string);
        debug!(
            bus = info.bus_number(),
            address = info.device_address(),
            serial = serial.as_deref().unwrap_or("-"),
            "Opening accessory"
        );

        let device = info
            .open()
            .map_err(|e| Error::Usb(format!("open: {e}")))?;
        // Control transfers go through a claimed interface; the kernel
        // driver (MTP/ADB) is detached from it first.
        let interface = device
            .detach_and_claim_interface(0)
            .map_err(|e| Error::Usb(format!("claim interface 0: {e}")))?;

        info!(serial = serial.as_deref().unwrap_or("-"), "Accessory opened");
        Ok(Box::new(NusbTransport { interface, serial }))
    }
}

/// An open accessory handle.
pub struct NusbTransport {
    interface: nusb::Interface,
    serial: Option<String>,
}

fn map_transfer_error(what: &str, err: TransferError) -> Error {
    match err {
        TransferError::Cancelled => Error::Timeout(format!("{what}: no response in {USB_TIMEOUT:?}")),
        TransferError::Disconnected => Error::Transfer(format!("{what}: device disconnected")),
        other => Error::Transfer(format!("{what}: {other}")),
    }
}

impl UsbTransport for NusbTransport {
    fn control_out(&self, request: &AoaRequest) -> Result<()> {
        let control = Control {
            control_type: ControlType::Vendor,
            recipient: Recipient::Device,
            request: request.request,
            value: request.value,
            index: request.index,
        };
        self.interface
            .control_out_blocking(control, &request.data, USB_TIMEOUT)
            .map_err(|e| map_transfer_error(request.name(), e))?;
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        let control = Control {
            control_type: ControlType::Standard,
            recipient: Recipient::Device,
            request: GET_STATUS,
            value: 0,
            index: 0,
        };
        let mut status = [0u8; 2];
        self.interface
            .control_in_blocking(control, &mut status, Duration::from_millis(500))
            .map_err(|e| map_transfer_error("GET_STATUS", e))?;
        Ok(())
    }

    fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }
}
