#![allow(dead_code)]

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use touchtest::uinput::{VirtualDevice, VirtualDeviceBuilder};
use touchtest::{AbsInfo, AbsoluteAxisCode, AttributeSet, InputEvent, KeyCode, PropType};

pub const MAX_X: i32 = 4095;
pub const MAX_Y: i32 = 2047;

fn position_axes(
    builder: VirtualDeviceBuilder<'_>,
    x: AbsoluteAxisCode,
    y: AbsoluteAxisCode,
) -> std::io::Result<VirtualDeviceBuilder<'_>> {
    builder
        .with_absolute_axis(x, AbsInfo::new(0, 0, MAX_X, 0, 0, 10))?
        .with_absolute_axis(y, AbsInfo::new(0, 0, MAX_Y, 0, 0, 10))
}

fn direct() -> AttributeSet<PropType> {
    let mut props = AttributeSet::new();
    props.insert(PropType::DIRECT);
    props
}

fn touch_key() -> AttributeSet<KeyCode> {
    let mut keys = AttributeSet::new();
    keys.insert(KeyCode::BTN_TOUCH);
    keys
}

fn finish(device: VirtualDevice) -> std::io::Result<(PathBuf, VirtualDevice)> {
    let node = device.dev_node()?;
    thread::sleep(Duration::from_millis(100)); // To avoid permission denied.
    Ok((node, device))
}

/// A type B screen tracking `slots` contacts.
pub fn slotted_screen(slots: i32) -> std::io::Result<(PathBuf, VirtualDevice)> {
    let builder = VirtualDeviceBuilder::new()?
        .name("touchtest slotted screen")
        .with_keys(&touch_key())?
        .with_properties(&direct())?
        .with_absolute_axis(
            AbsoluteAxisCode::ABS_MT_SLOT,
            AbsInfo::new(0, 0, slots - 1, 0, 0, 0),
        )?
        .with_absolute_axis(
            AbsoluteAxisCode::ABS_MT_TRACKING_ID,
            AbsInfo::new(0, 0, 0xffff, 0, 0, 0),
        )?;
    let builder = position_axes(
        builder,
        AbsoluteAxisCode::ABS_MT_POSITION_X,
        AbsoluteAxisCode::ABS_MT_POSITION_Y,
    )?;
    let builder = position_axes(builder, AbsoluteAxisCode::ABS_X, AbsoluteAxisCode::ABS_Y)?;
    finish(builder.build()?)
}

/// A resistive-style screen: `ABS_X`, `ABS_Y` and `BTN_TOUCH` only.
pub fn single_touch_screen() -> std::io::Result<(PathBuf, VirtualDevice)> {
    let builder = VirtualDeviceBuilder::new()?
        .name("touchtest single touch screen")
        .with_keys(&touch_key())?
        .with_properties(&direct())?;
    let builder = position_axes(builder, AbsoluteAxisCode::ABS_X, AbsoluteAxisCode::ABS_Y)?;
    finish(builder.build()?)
}

pub fn abs(axis: AbsoluteAxisCode, value: i32) -> InputEvent {
    InputEvent::abs(axis, value)
}

/// Type B events putting contact `id` in `slot` at `(x, y)`.
pub fn contact(slot: i32, id: i32, x: i32, y: i32) -> Vec<InputEvent> {
    vec![
        abs(AbsoluteAxisCode::ABS_MT_SLOT, slot),
        abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, id),
        abs(AbsoluteAxisCode::ABS_MT_POSITION_X, x),
        abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, y),
    ]
}

pub fn lift(slot: i32) -> Vec<InputEvent> {
    vec![
        abs(AbsoluteAxisCode::ABS_MT_SLOT, slot),
        abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, -1),
    ]
}
