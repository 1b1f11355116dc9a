//! r1-control-core: AOA2 HID protocol, accessory session, and device manager.
//!
//! This crate drives a Rabbit R1 as a USB HID accessory: it registers
//! virtual HID devices over Android Open Accessory 2.0 control transfers
//! and uses them for push-to-talk, swipes and keep-awake nudges.

pub mod aoa;
pub mod clock;
pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod manager;
pub mod report;
pub mod session;
pub mod transport;
pub mod usb;

/// Rabbit R1 USB vendor id.
pub const R1_VID: u16 = 0x0E8D;

/// Rabbit R1 USB product id.
pub const R1_PID: u16 = 0x2304;
