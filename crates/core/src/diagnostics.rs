//! Key-test catalog for probing which inputs the accessory reacts to.
//!
//! Each entry is one momentary press (down report, then up report) on a
//! given descriptor. The expected Android keycode and Linux key name are
//! what the accessory's input stack should produce for that usage.

use crate::descriptor::DescriptorType;
use crate::report::{camera, consumer_report, keyboard_report, SystemControl};

/// One key to tap while probing a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTest {
    pub name: &'static str,
    pub android_key: &'static str,
    pub linux_key: &'static str,
    pub down: Vec<u8>,
    pub up: Vec<u8>,
    pub description: &'static str,
}

impl KeyTest {
    fn new(
        name: &'static str,
        android_key: &'static str,
        linux_key: &'static str,
        down: &[u8],
        up: &[u8],
        description: &'static str,
    ) -> Self {
        Self {
            name,
            android_key,
            linux_key,
            down: down.to_vec(),
            up: up.to_vec(),
            description,
        }
    }
}

/// Catalog for a descriptor. Touch has none; gestures replace key taps there.
pub fn key_tests(descriptor: DescriptorType) -> Vec<KeyTest> {
    match descriptor {
        DescriptorType::Keyboard => keyboard_tests(),
        DescriptorType::ConsumerControl => consumer_tests(),
        DescriptorType::SystemControl => system_control_tests(),
        DescriptorType::CameraControl => camera_control_tests(),
        DescriptorType::TouchScreen => Vec::new(),
    }
}

fn keyboard_tests() -> Vec<KeyTest> {
    let up = keyboard_report(0, &[]);
    let key = |name, android, linux, scancode: u8, description| {
        KeyTest::new(
            name,
            android,
            linux,
            &keyboard_report(0, &[scancode]),
            &up,
            description,
        )
    };
    vec![
        key("Power (0x66)", "KEYCODE_POWER", "KEY_POWER", 0x66, "Keyboard power usage"),
        key("F13 (0x68)", "KEYCODE_F13", "KEY_F13", 0x68, "Unbound function key"),
        key("F14 (0x69)", "KEYCODE_F14", "KEY_F14", 0x69, "Unbound function key"),
        key("F15 (0x6A)", "KEYCODE_F15", "KEY_F15", 0x6A, "Unbound function key"),
        key("F16 (0x6B)", "KEYCODE_F16", "KEY_F16", 0x6B, "Unbound function key"),
        key("F17 (0x6C)", "KEYCODE_F17", "KEY_F17", 0x6C, "Unbound function key"),
        key("F18 (0x6D)", "KEYCODE_F18", "KEY_F18", 0x6D, "Unbound function key"),
        key("F19 (0x6E)", "KEYCODE_F19", "KEY_F19", 0x6E, "Unbound function key"),
        key("F20 (0x6F)", "KEYCODE_F20", "KEY_F20", 0x6F, "Unbound function key"),
        key("F24 (0x73)", "KEYCODE_F24", "KEY_F24", 0x73, "Unbound function key"),
        key("Up Arrow (0x52)", "KEYCODE_DPAD_UP", "KEY_UP", 0x52, "Scrolls lists; control test"),
        key("Enter (0x28)", "KEYCODE_ENTER", "KEY_ENTER", 0x28, "Selects the focused item"),
        key("Space (0x2C)", "KEYCODE_SPACE", "KEY_SPACE", 0x2C, "Play/pause in some apps"),
        key("A (0x04)", "KEYCODE_A", "KEY_A", 0x04, "Plain letter; control test"),
    ]
}

fn consumer_tests() -> Vec<KeyTest> {
    let up = consumer_report(0);
    let usage = |name, android, linux, code: u16, description| {
        KeyTest::new(name, android, linux, &consumer_report(code), &up, description)
    };
    vec![
        usage("Volume Up (0xE9)", "KEYCODE_VOLUME_UP", "KEY_VOLUMEUP", 0x00E9, "Volume up"),
        usage("Volume Down (0xEA)", "KEYCODE_VOLUME_DOWN", "KEY_VOLUMEDOWN", 0x00EA, "Volume down"),
        usage("Mute (0xE2)", "KEYCODE_VOLUME_MUTE", "KEY_MUTE", 0x00E2, "Mute toggle"),
        usage("Play/Pause (0xCD)", "KEYCODE_MEDIA_PLAY_PAUSE", "KEY_PLAYPAUSE", 0x00CD, "Media play/pause"),
        usage("Stop (0xB7)", "KEYCODE_MEDIA_STOP", "KEY_STOPCD", 0x00B7, "Media stop"),
        usage("Record (0xB2)", "KEYCODE_MEDIA_RECORD", "KEY_RECORD", 0x00B2, "Media record"),
        usage("AL Camera (0x192)", "KEYCODE_CAMERA", "KEY_CAMERA", 0x0192, "Camera application launch"),
        usage("Power (0x30)", "KEYCODE_POWER", "KEY_POWER", 0x0030, "Consumer power"),
        usage("Sleep (0x34)", "KEYCODE_SLEEP", "KEY_SLEEP", 0x0034, "Consumer sleep"),
        usage("Channel Up (0x9C)", "KEYCODE_CHANNEL_UP", "KEY_CHANNELUP", 0x009C, "Rarely bound"),
        usage("Channel Down (0x9D)", "KEYCODE_CHANNEL_DOWN", "KEY_CHANNELDOWN", 0x009D, "Rarely bound"),
        usage("AC Search (0x221)", "KEYCODE_SEARCH", "KEY_SEARCH", 0x0221, "Voice search"),
        usage("AC Home (0x223)", "KEYCODE_HOME", "KEY_HOMEPAGE", 0x0223, "Navigate home"),
        usage("AC Back (0x224)", "KEYCODE_BACK", "KEY_BACK", 0x0224, "Navigate back"),
        usage("Menu (0x40)", "KEYCODE_MENU", "KEY_MENU", 0x0040, "App menu"),
        usage("Voice Command (0xCF)", "KEYCODE_VOICE_ASSIST", "KEY_VOICECOMMAND", 0x00CF, "Voice assistant"),
        usage("AL Task Manager (0x19F)", "KEYCODE_APP_SWITCH", "KEY_APPSELECT", 0x019F, "Recent apps"),
        usage("Assist (0x1CB)", "KEYCODE_ASSIST", "KEY_ASSISTANT", 0x01CB, "Assistant"),
    ]
}

fn system_control_tests() -> Vec<KeyTest> {
    let up = SystemControl::Release.report();
    vec![
        KeyTest::new(
            "System Power Down (0x81)",
            "KEYCODE_POWER",
            "KEY_POWER",
            &SystemControl::PowerDown.report(),
            &up,
            "May turn the screen off",
        ),
        KeyTest::new(
            "System Sleep (0x82)",
            "KEYCODE_SLEEP",
            "KEY_SLEEP",
            &SystemControl::Sleep.report(),
            &up,
            "May put the device to sleep",
        ),
        KeyTest::new(
            "System Wake Up (0x83)",
            "KEYCODE_WAKEUP",
            "KEY_WAKEUP",
            &SystemControl::WakeUp.report(),
            &up,
            "Should wake the screen",
        ),
    ]
}

fn camera_control_tests() -> Vec<KeyTest> {
    let up = [0x00];
    vec![
        KeyTest::new(
            "Camera Auto Focus (0x20)",
            "KEYCODE_FOCUS",
            "KEY_CAMERA_FOCUS",
            &[camera::AUTO_FOCUS],
            &up,
            "Needs kernel support for the camera usage page",
        ),
        KeyTest::new(
            "Camera Shutter (0x21)",
            "KEYCODE_CAMERA",
            "KEY_CAMERA",
            &[camera::SHUTTER],
            &up,
            "Needs kernel support for the camera usage page",
        ),
        KeyTest::new(
            "Focus + Shutter",
            "KEYCODE_FOCUS+KEYCODE_CAMERA",
            "KEY_CAMERA_FOCUS+KEY_CAMERA",
            &[camera::AUTO_FOCUS | camera::SHUTTER],
            &up,
            "Both bits at once",
        ),
    ]
}
