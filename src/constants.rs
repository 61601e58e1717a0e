/// Event types supported by the device.
///
/// Values correspond to [/usr/include/linux/input-event-codes.h](https://github.com/torvalds/linux/blob/master/include/uapi/linux/input-event-codes.h)
///
/// Only the types a touchscreen can emit are named; any other type still round-trips through
/// the raw value.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventType(pub u16);

evdev_enum!(
    EventType,
    Array,
    /// A bookkeeping event. Delimits frames of touch data.
    SYNCHRONIZATION = 0x00,
    /// A key changed state. Touchscreens report `BTN_TOUCH` and the `BTN_TOOL_*` family here.
    KEY = 0x01,
    /// Movement on a relative axis.
    RELATIVE = 0x02,
    /// Movement on an absolute axis. Every touch coordinate arrives as one of these.
    ABSOLUTE = 0x03,
    /// Miscellaneous events, e.g. `MSC_TIMESTAMP` from HID multitouch panels.
    MISC = 0x04,
    /// Change in a switch value.
    SWITCH = 0x05,
    LED = 0x11,
    SOUND = 0x12,
    REPEAT = 0x14,
    FORCEFEEDBACK = 0x15,
    POWER = 0x16,
    FORCEFEEDBACKSTATUS = 0x17,
);

impl EventType {
    pub(crate) const COUNT: usize = libc::EV_CNT;
}

/// A "synchronization" message type published by the kernel into the events stream.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SynchronizationCode(pub u16);

evdev_enum!(
    SynchronizationCode,
    /// Terminates a packet of events from the device.
    SYN_REPORT = 0,
    /// Appears to be unused.
    SYN_CONFIG = 1,
    /// Separates the contacts of a type A multitouch packet.
    SYN_MT_REPORT = 2,
    /// Ring buffer filled, events were dropped.
    SYN_DROPPED = 3,
);

/// Device properties.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropType(pub u16);

evdev_enum!(
    PropType,
    Array,
    /// This input device needs a pointer ("cursor") for the user to know its state.
    POINTER = 0x00,
    /// Direct input device: coordinates map onto a display. Touchscreens set this.
    DIRECT = 0x01,
    /// "has button(s) under pad", according to the header.
    BUTTONPAD = 0x02,
    /// Touch rectangle only; the device reports a bounding box rather than each contact.
    SEMI_MT = 0x03,
    /// "softbuttons at top of pad", according to the header.
    TOPBUTTONPAD = 0x04,
    POINTING_STICK = 0x05,
    ACCELEROMETER = 0x06,
);

impl PropType {
    pub(crate) const COUNT: usize = libc::INPUT_PROP_CNT;
}

/// An absolute axis, e.g. a touch coordinate.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbsoluteAxisCode(pub u16);

evdev_enum!(
    AbsoluteAxisCode,
    Array,
    ABS_X = 0x00,
    ABS_Y = 0x01,
    ABS_Z = 0x02,
    ABS_PRESSURE = 0x18,
    ABS_DISTANCE = 0x19,
    ABS_TILT_X = 0x1a,
    ABS_TILT_Y = 0x1b,
    ABS_TOOL_WIDTH = 0x1c,
    ABS_MISC = 0x28,
    /// "MT slot being modified"
    ABS_MT_SLOT = 0x2f,
    /// "Major axis of touching ellipse"
    ABS_MT_TOUCH_MAJOR = 0x30,
    /// "Minor axis (omit if circular)"
    ABS_MT_TOUCH_MINOR = 0x31,
    /// "Major axis of approaching ellipse"
    ABS_MT_WIDTH_MAJOR = 0x32,
    /// "Minor axis (omit if circular)"
    ABS_MT_WIDTH_MINOR = 0x33,
    /// "Ellipse orientation"
    ABS_MT_ORIENTATION = 0x34,
    /// "Center X touch position"
    ABS_MT_POSITION_X = 0x35,
    /// "Center Y touch position"
    ABS_MT_POSITION_Y = 0x36,
    /// "Type of touching device"
    ABS_MT_TOOL_TYPE = 0x37,
    /// "Group a set of packets as a blob"
    ABS_MT_BLOB_ID = 0x38,
    /// "Unique ID of the initiated contact"
    ABS_MT_TRACKING_ID = 0x39,
    /// "Pressure on contact area"
    ABS_MT_PRESSURE = 0x3a,
    /// "Contact over distance"
    ABS_MT_DISTANCE = 0x3b,
    /// "Center X tool position"
    ABS_MT_TOOL_X = 0x3c,
    /// "Center Y tool position"
    ABS_MT_TOOL_Y = 0x3d,
);

impl AbsoluteAxisCode {
    pub(crate) const COUNT: usize = libc::ABS_CNT;
}

/// Keys and buttons. Only the touch-related buttons are named.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    #[inline]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn code(self) -> u16 {
        self.0
    }

    pub(crate) const COUNT: usize = libc::KEY_CNT;
}

evdev_enum!(
    KeyCode,
    box Array,
    KEY_ESC = 1,
    KEY_Q = 16,
    BTN_LEFT = 0x110,
    BTN_TOOL_PEN = 0x140,
    BTN_TOOL_RUBBER = 0x141,
    BTN_TOOL_FINGER = 0x145,
    /// Contact with the surface. Single-touch devices key their pen-down state off this.
    BTN_TOUCH = 0x14a,
    BTN_STYLUS = 0x14b,
    BTN_TOOL_DOUBLETAP = 0x14d,
    BTN_TOOL_TRIPLETAP = 0x14e,
    BTN_TOOL_QUADTAP = 0x14f,
    BTN_TOOL_QUINTTAP = 0x148,
);
