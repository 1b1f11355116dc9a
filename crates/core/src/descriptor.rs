//! HID report descriptors advertised to the accessory.
//!
//! Each [`DescriptorType`] maps to one fixed byte blob. The accessory's
//! input subsystem instantiates a virtual device from it; report layouts
//! are documented next to each blob and encoded in [`crate::report`].

/// Virtual input device classes that can be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DescriptorType {
    /// Standard keyboard (usage page 0x07).
    Keyboard,
    /// Consumer control (usage page 0x0C).
    ConsumerControl,
    /// Generic desktop system control (usage page 0x01). Used as the PTT/wake channel.
    SystemControl,
    /// Camera control (usage page 0x90).
    CameraControl,
    /// Single-touch digitizer (usage page 0x0D). Used for swipes.
    TouchScreen,
}

impl DescriptorType {
    /// All descriptor types.
    pub const ALL: &'static [DescriptorType] = &[
        DescriptorType::Keyboard,
        DescriptorType::ConsumerControl,
        DescriptorType::SystemControl,
        DescriptorType::CameraControl,
        DescriptorType::TouchScreen,
    ];

    /// Raw report descriptor bytes.
    pub fn bytes(&self) -> &'static [u8] {
        match self {
            Self::Keyboard => KEYBOARD,
            Self::ConsumerControl => CONSUMER_CONTROL,
            Self::SystemControl => SYSTEM_CONTROL,
            Self::CameraControl => CAMERA_CONTROL,
            Self::TouchScreen => TOUCH_SCREEN,
        }
    }

    /// Size in bytes of one input report for this descriptor.
    pub fn report_len(&self) -> usize {
        match self {
            Self::Keyboard => 8,
            Self::ConsumerControl => 2,
            Self::SystemControl => 1,
            Self::CameraControl => 1,
            Self::TouchScreen => 5,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Keyboard => "Keyboard (0x07)",
            Self::ConsumerControl => "Consumer Control (0x0C)",
            Self::SystemControl => "System Control (0x01)",
            Self::CameraControl => "Camera Control (0x90)",
            Self::TouchScreen => "Touch Screen (0x0D)",
        }
    }

    /// Parse a descriptor type from a CLI-friendly string (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "keyboard" | "kbd" => Some(Self::Keyboard),
            "consumer" | "consumer-control" => Some(Self::ConsumerControl),
            "system" | "system-control" => Some(Self::SystemControl),
            "camera" | "camera-control" => Some(Self::CameraControl),
            "touch" | "touch-screen" | "touchscreen" => Some(Self::TouchScreen),
            _ => None,
        }
    }
}

impl std::fmt::Display for DescriptorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 8-byte reports: `[modifier, reserved, key1..key6]`.
const KEYBOARD: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute) - modifiers
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) - reserved
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array) - key slots
    0xC0, // End Collection
];

/// 2-byte reports: one little-endian 16-bit usage.
const CONSUMER_CONTROL: &[u8] = &[
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x0F, // Logical Maximum (4095)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0xFF, 0x0F, // Usage Maximum (4095)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

/// 1-byte reports: 0 = release, 1 = power down, 2 = sleep, 3 = wake up.
const SYSTEM_CONTROL: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x80, // Usage (System Control)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x01, //   Logical Minimum (1)
    0x25, 0x03, //   Logical Maximum (3)
    0x09, 0x81, //   Usage (System Power Down)
    0x09, 0x82, //   Usage (System Sleep)
    0x09, 0x83, //   Usage (System Wake Up)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

/// 1-byte reports: bit 0 = auto focus, bit 1 = shutter.
const CAMERA_CONTROL: &[u8] = &[
    0x05, 0x90, // Usage Page (Camera Control)
    0x09, 0x20, // Usage (Camera Auto Focus)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x01, //   Report Count (1)
    0x09, 0x20, //   Usage (Camera Auto Focus)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x09, 0x21, //   Usage (Camera Shutter)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x06, //   Report Count (6) - padding
    0x81, 0x03, //   Input (Constant)
    0xC0, // End Collection
];

/// 5-byte reports: `[flags, x_lo, x_hi, y_lo, y_hi]`, flags bit 0 = tip
/// switch, bit 1 = in range, coordinates 0..=32767.
const TOUCH_SCREEN: &[u8] = &[
    0x05, 0x0D, // Usage Page (Digitizers)
    0x09, 0x04, // Usage (Touch Screen)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x22, //   Usage (Finger)
    0xA1, 0x02, //   Collection (Logical)
    0x09, 0x42, //     Usage (Tip Switch)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x09, 0x32, //     Usage (In Range)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x75, 0x06, //     Report Size (6)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x03, //     Input (Constant) - padding
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x15, 0x00, //     Logical Minimum (0)
    0x26, 0xFF, 0x7F, // Logical Maximum (32767)
    0x75, 0x10, //     Report Size (16)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x09, 0x31, //     Usage (Y)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0xC0, //   End Collection (Logical)
    0xC0, // End Collection (Application)
];
