//! Error types for r1-control-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// USB enumeration or open failure.
    #[error("USB error: {0}")]
    Usb(String),

    /// No accessory matched the vendor/product identity or serial filter.
    #[error("accessory not found: {0}")]
    NotFound(String),

    /// An interactive operation was requested while disconnected.
    #[error("no accessory connected")]
    NotConnected,

    /// A REGISTER_HID or SET_HID_REPORT_DESC transfer failed.
    #[error("HID registration failed for {descriptor}: {reason}")]
    Registration {
        descriptor: &'static str,
        reason: String,
    },

    /// A control transfer (usually SEND_HID_EVENT) failed.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// Periodic liveness probe failed.
    #[error("health check failed: {0}")]
    HealthCheck(String),

    /// A transfer did not complete within its timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Configuration value outside the accepted set.
    #[error("value out of range: {field} = {value} (allowed {allowed})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        allowed: &'static str,
    },

    /// Settings could not be read or written.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
