use std::fmt;
use std::time::{Duration, SystemTime};

use libc::input_event;

use crate::constants::*;

/// The type+code of an event, with the code wrapped in the newtype matching its type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputEventKind {
    Synchronization(SynchronizationCode),
    Key(KeyCode),
    AbsAxis(AbsoluteAxisCode),
    Other,
}

/// A wrapped `libc::input_event` returned by the input device via the kernel.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct InputEvent(pub(crate) input_event);

impl InputEvent {
    /// Create a new InputEvent, stamped with the current time.
    pub fn new(type_: EventType, code: u16, value: i32) -> Self {
        Self::new_at(SystemTime::now(), type_, code, value)
    }

    pub fn new_at(time: SystemTime, type_: EventType, code: u16, value: i32) -> Self {
        InputEvent(input_event {
            time: systime_to_timeval(&time),
            type_: type_.0,
            code,
            value,
        })
    }

    /// Shorthand for an `EV_ABS` event.
    pub fn abs(axis: AbsoluteAxisCode, value: i32) -> Self {
        Self::new(EventType::ABSOLUTE, axis.0, value)
    }

    /// Shorthand for an `EV_KEY` event.
    pub fn key(key: KeyCode, value: i32) -> Self {
        Self::new(EventType::KEY, key.0, value)
    }

    /// Shorthand for an `EV_SYN` event.
    pub fn syn(code: SynchronizationCode) -> Self {
        Self::new(EventType::SYNCHRONIZATION, code.0, 0)
    }

    #[inline]
    pub fn timestamp(&self) -> SystemTime {
        timeval_to_systime(&self.0.time)
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        EventType(self.0.type_)
    }

    #[inline]
    pub fn code(&self) -> u16 {
        self.0.code
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.0.value
    }

    #[inline]
    pub fn kind(&self) -> InputEventKind {
        let code = self.code();
        match self.event_type() {
            EventType::SYNCHRONIZATION => {
                InputEventKind::Synchronization(SynchronizationCode(code))
            }
            EventType::KEY => InputEventKind::Key(KeyCode(code)),
            EventType::ABSOLUTE => InputEventKind::AbsAxis(AbsoluteAxisCode(code)),
            _ => InputEventKind::Other,
        }
    }

    pub fn as_raw(&self) -> &input_event {
        &self.0
    }
}

impl From<input_event> for InputEvent {
    fn from(raw: input_event) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut debug = f.debug_struct("InputEvent");
        debug.field("time", &self.timestamp());
        let kind = self.kind();
        if let InputEventKind::Other = kind {
            debug
                .field("type", &self.event_type())
                .field("code", &self.code());
        } else {
            debug.field("kind", &kind);
        }
        debug.field("value", &self.value()).finish()
    }
}

pub(crate) fn systime_to_timeval(time: &SystemTime) -> libc::timeval {
    let (sign, dur) = match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(dur) => (1, dur),
        Err(e) => (-1, e.duration()),
    };

    libc::timeval {
        tv_sec: dur.as_secs() as libc::time_t * sign,
        tv_usec: dur.subsec_micros() as libc::suseconds_t,
    }
}

pub(crate) fn timeval_to_systime(tv: &libc::timeval) -> SystemTime {
    let dur = Duration::new(tv.tv_sec.unsigned_abs() as u64, tv.tv_usec as u32 * 1000);
    if tv.tv_sec >= 0 {
        SystemTime::UNIX_EPOCH + dur
    } else {
        SystemTime::UNIX_EPOCH - dur
    }
}

/// View a slice of events as the bytes the kernel reads and writes.
///
/// # Safety
///
/// `InputEvent` is `repr(transparent)` over `input_event`, which has no padding on the
/// supported targets.
pub(crate) unsafe fn cast_to_bytes(events: &[InputEvent]) -> &[u8] {
    std::slice::from_raw_parts(events.as_ptr() as *const u8, std::mem::size_of_val(events))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_wraps_code_by_type() {
        let ev = InputEvent::abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 120);
        assert_eq!(
            ev.kind(),
            InputEventKind::AbsAxis(AbsoluteAxisCode::ABS_MT_POSITION_X)
        );
        assert_eq!(ev.value(), 120);

        let ev = InputEvent::syn(SynchronizationCode::SYN_DROPPED);
        assert_eq!(
            ev.kind(),
            InputEventKind::Synchronization(SynchronizationCode::SYN_DROPPED)
        );

        let ev = InputEvent::new(EventType::MISC, 5, 1);
        assert_eq!(ev.kind(), InputEventKind::Other);
    }

    #[test]
    fn timeval_roundtrip_keeps_microseconds() {
        let time = SystemTime::UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_000);
        assert_eq!(timeval_to_systime(&systime_to_timeval(&time)), time);
    }

    #[test]
    fn event_bytes_match_kernel_layout() {
        let events = [
            InputEvent::abs(AbsoluteAxisCode::ABS_X, 1),
            InputEvent::syn(SynchronizationCode::SYN_REPORT),
        ];
        let bytes = unsafe { cast_to_bytes(&events) };
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<input_event>());
    }
}
