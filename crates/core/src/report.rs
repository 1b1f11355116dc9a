//! Input report encoding for each descriptor type.
//!
//! Encoders are pure and total. Coordinates and usages are not validated:
//! callers pass values inside the ranges the descriptors declare.

/// Maximum touch coordinate on either axis.
pub const TOUCH_MAX: u16 = 32767;

/// Touch flags: bit 0 = tip switch, bit 1 = in range.
const TOUCH_CONTACT: u8 = 0x03;

/// System control usages (1-byte report).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemControl {
    Release = 0,
    PowerDown = 1,
    Sleep = 2,
    WakeUp = 3,
}

impl SystemControl {
    pub fn report(self) -> [u8; 1] {
        [self as u8]
    }
}

/// Build a 5-byte touch report.
///
/// `touching` sets both tip-switch and in-range; releasing clears both.
/// X/Y are little-endian.
pub fn touch_report(touching: bool, x: u16, y: u16) -> [u8; 5] {
    let flags = if touching { TOUCH_CONTACT } else { 0x00 };
    let [x_lo, x_hi] = x.to_le_bytes();
    let [y_lo, y_hi] = y.to_le_bytes();
    [flags, x_lo, x_hi, y_lo, y_hi]
}

/// Build an 8-byte keyboard report. Keys beyond the sixth are dropped.
pub fn keyboard_report(modifier: u8, keys: &[u8]) -> [u8; 8] {
    let mut report = [0u8; 8];
    report[0] = modifier;
    for (slot, &key) in report[2..].iter_mut().zip(keys) {
        *slot = key;
    }
    report
}

/// Build a 2-byte consumer control report.
pub fn consumer_report(usage: u16) -> [u8; 2] {
    usage.to_le_bytes()
}

/// Camera control bits.
pub mod camera {
    pub const AUTO_FOCUS: u8 = 0x01;
    pub const SHUTTER: u8 = 0x02;
}

/// Build a 1-byte camera control report from [`camera`] bits.
pub fn camera_report(bits: u8) -> [u8; 1] {
    [bits & (camera::AUTO_FOCUS | camera::SHUTTER)]
}
