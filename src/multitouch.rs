//! Decoding of kernel touch events into per-slot sample frames.
//!
//! The kernel describes touches in one of three ways (see
//! `Documentation/input/multi-touch-protocol.rst`):
//!
//! - **Type B** ([`Protocol::Slotted`]): `ABS_MT_SLOT` selects a slot, the following `ABS_MT_*`
//!   events update it, and `ABS_MT_TRACKING_ID = -1` ends the contact held by the slot. Only
//!   changes are sent.
//! - **Type A** ([`Protocol::Unslotted`]): every frame lists all contacts anew, each terminated
//!   by `SYN_MT_REPORT`.
//! - **Single touch** ([`Protocol::SingleTouch`]): `ABS_X`, `ABS_Y` and `BTN_TOUCH`.
//!
//! In all three a `SYN_REPORT` closes the frame. [`MtDecoder`] folds the stream into a fixed
//! array of [`TouchSample`]s, one per slot, that is consistent after every `SYN_REPORT`.

use std::time::SystemTime;

use log::{debug, trace};

use crate::constants::*;
use crate::{InputEvent, InputEventKind, RawDevice};

/// Tracking id of a slot that holds no contact.
pub const TRACKING_ID_NONE: i32 = -1;

/// State of one contact slot at the end of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchSample {
    pub slot: u32,
    pub x: i32,
    pub y: i32,
    pub pressure: i32,
    pub touch_major: i32,
    pub tool_type: i32,
    pub tracking_id: i32,
    pub pen_down: bool,
    /// The slot holds a live contact in this frame.
    pub valid: bool,
    /// The slot received data in this frame, including its release.
    pub changed: bool,
    pub time: SystemTime,
}

impl TouchSample {
    fn empty(slot: u32) -> Self {
        TouchSample {
            slot,
            x: 0,
            y: 0,
            pressure: 0,
            touch_major: 0,
            tool_type: 0,
            tracking_id: TRACKING_ID_NONE,
            pen_down: false,
            valid: false,
            changed: false,
            time: SystemTime::UNIX_EPOCH,
        }
    }

    fn release(&mut self) {
        self.tracking_id = TRACKING_ID_NONE;
        self.pen_down = false;
        self.valid = false;
        self.changed = true;
    }

    /// Apply one `ABS_MT_*` value. Returns `false` for axes the sample does not carry.
    fn apply_mt(&mut self, axis: AbsoluteAxisCode, value: i32) -> bool {
        match axis {
            AbsoluteAxisCode::ABS_MT_POSITION_X => self.x = value,
            AbsoluteAxisCode::ABS_MT_POSITION_Y => self.y = value,
            AbsoluteAxisCode::ABS_MT_PRESSURE => self.pressure = value,
            AbsoluteAxisCode::ABS_MT_TOUCH_MAJOR => self.touch_major = value,
            AbsoluteAxisCode::ABS_MT_TOOL_TYPE => self.tool_type = value,
            AbsoluteAxisCode::ABS_MT_TRACKING_ID => self.tracking_id = value,
            _ => return false,
        }
        true
    }
}

/// How a device reports its contacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Slotted,
    Unslotted,
    SingleTouch,
}

impl Protocol {
    pub fn detect(device: &RawDevice) -> Protocol {
        if device.has_abs(AbsoluteAxisCode::ABS_MT_SLOT) {
            Protocol::Slotted
        } else if device.has_abs(AbsoluteAxisCode::ABS_MT_POSITION_X) {
            Protocol::Unslotted
        } else {
            Protocol::SingleTouch
        }
    }
}

/// Outcome of feeding one event to [`MtDecoder::process`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Mid-frame; nothing to show yet.
    Pending,
    /// A `SYN_REPORT` completed a frame; [`MtDecoder::frame`] is consistent.
    Frame,
    /// Events were dropped by the kernel and the gap has ended. The caller must fetch the
    /// device state, feed it through the `resync_*` methods and call
    /// [`MtDecoder::finish_resync`].
    Resync,
}

#[derive(Debug)]
pub struct MtDecoder {
    protocol: Protocol,
    slots: Vec<TouchSample>,
    /// Slot addressed by type B events; `None` while the device addresses a slot we don't track.
    current: Option<usize>,
    /// Type A contact being assembled, and the contacts completed in this frame.
    pending: Option<TouchSample>,
    reported: Vec<TouchSample>,
    /// Single touch: last `BTN_TOUCH` value, if the device has one.
    touch_key: Option<bool>,
    dropped: bool,
    frame_done: bool,
}

impl MtDecoder {
    /// A decoder tracking `slots` contacts (at least one).
    pub fn new(protocol: Protocol, slots: usize) -> Self {
        let slots = slots.max(1);
        MtDecoder {
            protocol,
            slots: (0..slots as u32).map(TouchSample::empty).collect(),
            current: Some(0),
            pending: None,
            reported: Vec::with_capacity(slots),
            touch_key: None,
            dropped: false,
            frame_done: false,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Samples for every slot as of the last completed frame.
    pub fn frame(&self) -> &[TouchSample] {
        &self.slots
    }

    /// Single-touch devices without `BTN_TOUCH` report contact through pressure alone.
    pub fn set_has_touch_key(&mut self, has_key: bool) {
        self.touch_key = if has_key { Some(false) } else { None };
    }

    /// Select the type B slot that subsequent events address, e.g. from `ABS_MT_SLOT`'s
    /// current value at open time.
    pub fn set_current_slot(&mut self, slot: i32) {
        self.current = usize::try_from(slot)
            .ok()
            .filter(|&slot| slot < self.slots.len());
    }

    pub fn process(&mut self, ev: &InputEvent) -> Step {
        if self.frame_done {
            self.frame_done = false;
            self.slots.iter_mut().for_each(|s| s.changed = false);
        }

        if self.dropped {
            if ev.kind() == InputEventKind::Synchronization(SynchronizationCode::SYN_REPORT) {
                debug!("end of dropped events, resynchronizing");
                self.dropped = false;
                return Step::Resync;
            }
            return Step::Pending;
        }

        match ev.kind() {
            InputEventKind::Synchronization(SynchronizationCode::SYN_REPORT) => {
                self.commit(ev.timestamp());
                return Step::Frame;
            }
            InputEventKind::Synchronization(SynchronizationCode::SYN_DROPPED) => {
                debug!("kernel dropped events, discarding until SYN_REPORT");
                self.dropped = true;
                self.pending = None;
                self.reported.clear();
            }
            InputEventKind::Synchronization(SynchronizationCode::SYN_MT_REPORT) => {
                if self.protocol == Protocol::Unslotted {
                    self.end_contact();
                }
            }
            InputEventKind::AbsAxis(axis) => self.process_abs(axis, ev.value()),
            InputEventKind::Key(KeyCode::BTN_TOUCH) => {
                if self.protocol == Protocol::SingleTouch {
                    self.touch_key = Some(ev.value() != 0);
                    self.slots[0].changed = true;
                }
            }
            _ => trace!("ignoring {:?}", ev),
        }
        Step::Pending
    }

    fn process_abs(&mut self, axis: AbsoluteAxisCode, value: i32) {
        match self.protocol {
            Protocol::Slotted => {
                if axis == AbsoluteAxisCode::ABS_MT_SLOT {
                    self.set_current_slot(value);
                    if self.current.is_none() {
                        debug!("slot {} out of range, ignoring its events", value);
                    }
                } else if let Some(slot) = self.current {
                    let sample = &mut self.slots[slot];
                    if sample.apply_mt(axis, value) {
                        sample.changed = true;
                    }
                }
            }
            Protocol::Unslotted => {
                let pending = self
                    .pending
                    .get_or_insert_with(|| TouchSample::empty(0));
                pending.apply_mt(axis, value);
            }
            Protocol::SingleTouch => {
                let sample = &mut self.slots[0];
                match axis {
                    AbsoluteAxisCode::ABS_X => sample.x = value,
                    AbsoluteAxisCode::ABS_Y => sample.y = value,
                    AbsoluteAxisCode::ABS_PRESSURE => sample.pressure = value,
                    _ => return,
                }
                sample.changed = true;
            }
        }
    }

    /// Type A: `SYN_MT_REPORT` closes the contact being assembled.
    fn end_contact(&mut self) {
        let Some(contact) = self.pending.take() else {
            return;
        };
        if self.reported.len() < self.slots.len() {
            self.reported.push(contact);
        } else {
            trace!("more contacts than slots, dropping one");
        }
    }

    fn commit(&mut self, time: SystemTime) {
        match self.protocol {
            Protocol::Slotted => {
                for sample in self.slots.iter_mut() {
                    sample.valid = sample.tracking_id != TRACKING_ID_NONE;
                    sample.pen_down = sample.valid;
                    if sample.changed {
                        sample.time = time;
                    }
                }
            }
            Protocol::Unslotted => {
                // a contact without a trailing SYN_MT_REPORT still counts
                self.end_contact();
                for (idx, sample) in self.slots.iter_mut().enumerate() {
                    match self.reported.get(idx).copied() {
                        Some(contact) => {
                            let tracking_id = if contact.tracking_id == TRACKING_ID_NONE {
                                idx as i32
                            } else {
                                contact.tracking_id
                            };
                            *sample = TouchSample {
                                slot: idx as u32,
                                tracking_id,
                                pen_down: true,
                                valid: true,
                                changed: true,
                                time,
                                ..contact
                            };
                        }
                        None if sample.valid => {
                            sample.release();
                            sample.time = time;
                        }
                        None => {}
                    }
                }
                self.reported.clear();
            }
            Protocol::SingleTouch => {
                let sample = &mut self.slots[0];
                let down = match self.touch_key {
                    Some(down) => down,
                    None => sample.pressure > 0,
                };
                if down != sample.valid {
                    sample.changed = true;
                }
                sample.pen_down = down;
                sample.valid = down;
                sample.tracking_id = if down { 0 } else { TRACKING_ID_NONE };
                if sample.changed {
                    sample.time = time;
                }
            }
        }
        self.frame_done = true;
    }

    /// Type B resync: per-slot values of one `ABS_MT_*` axis, as read by `EVIOCGMTSLOTS`.
    pub fn resync_slots(&mut self, axis: AbsoluteAxisCode, values: &[i32]) {
        for (sample, &value) in self.slots.iter_mut().zip(values) {
            let before = *sample;
            sample.apply_mt(axis, value);
            if *sample != before {
                sample.changed = true;
            }
        }
    }

    /// Single touch resync from the current axis and key state.
    pub fn resync_single(&mut self, x: i32, y: i32, pressure: i32, touching: Option<bool>) {
        let sample = &mut self.slots[0];
        if (sample.x, sample.y, sample.pressure) != (x, y, pressure) {
            sample.changed = true;
        }
        sample.x = x;
        sample.y = y;
        sample.pressure = pressure;
        if self.touch_key.is_some() {
            self.touch_key = touching;
        }
    }

    /// Close the resync started by [`Step::Resync`], producing a consistent frame.
    ///
    /// Type A devices re-report all contacts every frame, so they only need this call.
    pub fn finish_resync(&mut self, time: SystemTime) {
        self.commit(time);
    }
}
