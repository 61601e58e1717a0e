use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use log::{debug, info};

use crate::calibrate::{AxisRange, Transform};
use crate::constants::*;
use crate::error::{Error, Result};
use crate::multitouch::{MtDecoder, Protocol, Step, TouchSample};
use crate::{discovery, InputEvent, InputEventKind, RawDevice};

/// Axes refreshed through `EVIOCGMTSLOTS` after the kernel dropped events.
const RESYNC_AXES: [AbsoluteAxisCode; 6] = [
    AbsoluteAxisCode::ABS_MT_TRACKING_ID,
    AbsoluteAxisCode::ABS_MT_POSITION_X,
    AbsoluteAxisCode::ABS_MT_POSITION_Y,
    AbsoluteAxisCode::ABS_MT_PRESSURE,
    AbsoluteAxisCode::ABS_MT_TOUCH_MAJOR,
    AbsoluteAxisCode::ABS_MT_TOOL_TYPE,
];

/// An open touch device that yields frames of screen-space samples.
#[derive(Debug)]
pub struct TouchScreen {
    device: RawDevice,
    decoder: MtDecoder,
    transform: Transform,
    /// Events read from the device but not yet part of a complete frame.
    pending: VecDeque<InputEvent>,
    frame: Vec<TouchSample>,
}

impl TouchScreen {
    /// Open `device`, or discover a touchscreen when `None`.
    ///
    /// `slots` overrides the number of contacts tracked; otherwise it comes from the range of
    /// `ABS_MT_SLOT`, or 1 for devices without slots.
    pub fn setup(device: Option<&Path>, slots: Option<u32>) -> Result<TouchScreen> {
        let device = match device {
            Some(path) => RawDevice::open(path)?,
            None => discovery::find_touchscreen()?,
        };
        TouchScreen::from_device(device, slots)
    }

    pub fn from_device(device: RawDevice, slots: Option<u32>) -> Result<TouchScreen> {
        let has_abs = device
            .supported_absolute_axes()
            .map_or(false, |axes| axes.iter().next().is_some());
        if !has_abs {
            return Err(Error::NotTouchscreen(device.path().to_owned()));
        }

        debug!("{}", device);

        let protocol = Protocol::detect(&device);
        let slots = match slots {
            Some(slots) => slots,
            None => device.slot_count()?,
        };
        info!(
            "{} ({}): {:?} protocol, {} slots",
            device.path().display(),
            device.name().unwrap_or("unnamed"),
            protocol,
            slots
        );

        let mut decoder = MtDecoder::new(protocol, slots as usize);
        decoder.set_has_touch_key(device.has_key(KeyCode::BTN_TOUCH));

        let mut ts = TouchScreen {
            device,
            decoder,
            transform: Transform::identity(),
            pending: VecDeque::new(),
            frame: Vec::new(),
        };
        // contacts already down when we open the device
        ts.resync()?;
        Ok(ts)
    }

    pub fn device(&self) -> &RawDevice {
        &self.device
    }

    pub fn protocol(&self) -> Protocol {
        self.decoder.protocol()
    }

    pub fn slot_count(&self) -> usize {
        self.decoder.slot_count()
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Range of the position axes the decoder reads, for scaling when there is no calibration.
    pub fn abs_range(&self) -> io::Result<(AxisRange, AxisRange)> {
        let (x, y) = match self.decoder.protocol() {
            Protocol::SingleTouch => (AbsoluteAxisCode::ABS_X, AbsoluteAxisCode::ABS_Y),
            _ => (
                AbsoluteAxisCode::ABS_MT_POSITION_X,
                AbsoluteAxisCode::ABS_MT_POSITION_Y,
            ),
        };
        let range = |axis| {
            self.device.abs_info(axis).map(|info| AxisRange {
                min: info.minimum(),
                max: info.maximum(),
            })
        };
        Ok((range(x)?, range(y)?))
    }

    pub fn wait_ready(&self, timeout: Option<Duration>) -> io::Result<bool> {
        self.device.wait_ready(timeout)
    }

    pub fn grab(&mut self) -> io::Result<()> {
        self.device.grab()
    }

    /// Consume queued events and return the latest complete frame, in screen coordinates.
    ///
    /// Does not block. Returns `None` if no `SYN_REPORT` has arrived yet; the partial frame
    /// stays queued for the next call.
    pub fn read_frame(&mut self) -> io::Result<Option<&[TouchSample]>> {
        self.pending.extend(self.device.fetch_events()?);

        let report = InputEventKind::Synchronization(SynchronizationCode::SYN_REPORT);
        let Some(last) = self.pending.iter().rposition(|ev| ev.kind() == report) else {
            return Ok(None);
        };

        let mut frames = 0;
        for _ in 0..=last {
            let Some(ev) = self.pending.pop_front() else {
                break;
            };
            match self.decoder.process(&ev) {
                Step::Pending => {}
                Step::Frame => frames += 1,
                Step::Resync => {
                    self.resync()?;
                    frames += 1;
                }
            }
        }
        if frames > 1 {
            debug!("skipped {} stale frames", frames - 1);
        }

        let transform = self.transform;
        self.frame.clear();
        self.frame
            .extend(self.decoder.frame().iter().map(|sample| {
                let (x, y) = transform.apply(sample.x, sample.y);
                TouchSample { x, y, ..*sample }
            }));
        Ok(Some(&self.frame))
    }

    /// Rebuild the decoder state from the device after a gap.
    fn resync(&mut self) -> io::Result<()> {
        match self.decoder.protocol() {
            Protocol::Slotted => {
                // the kernel fills at most its own slot count
                let count = self
                    .decoder
                    .slot_count()
                    .min(self.device.slot_count()? as usize);
                let mut values = vec![0; count];
                for axis in RESYNC_AXES {
                    if self.device.has_abs(axis) {
                        self.device.mt_slot_values(axis, &mut values)?;
                        self.decoder.resync_slots(axis, &values);
                    }
                }
                let slot = self.device.abs_info(AbsoluteAxisCode::ABS_MT_SLOT)?;
                self.decoder.set_current_slot(slot.value());
            }
            Protocol::Unslotted => {}
            Protocol::SingleTouch => {
                let x = self.device.abs_info(AbsoluteAxisCode::ABS_X)?.value();
                let y = self.device.abs_info(AbsoluteAxisCode::ABS_Y)?.value();
                let pressure = if self.device.has_abs(AbsoluteAxisCode::ABS_PRESSURE) {
                    self.device.abs_info(AbsoluteAxisCode::ABS_PRESSURE)?.value()
                } else {
                    0
                };
                let touching = if self.device.has_key(KeyCode::BTN_TOUCH) {
                    Some(self.device.key_state()?.contains(KeyCode::BTN_TOUCH))
                } else {
                    None
                };
                self.decoder.resync_single(x, y, pressure, touching);
            }
        }
        self.decoder.finish_resync(SystemTime::now());
        Ok(())
    }
}
