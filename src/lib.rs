//! Touchscreen test utility for Linux.
//!
//! Reads multi-touch frames from an evdev device and draws a square under every contact, so
//! the driver and calibration can be checked by eye. The kernel documentation covering the
//! input side:
//!
//! - https://www.kernel.org/doc/Documentation/input/event-codes.txt
//! - https://www.kernel.org/doc/Documentation/input/multi-touch-protocol.txt
//!
//! The pieces, bottom up:
//!
//! - [`RawDevice`] opens `/dev/input/eventN`, answers capability queries through the evdev
//!   ioctls and reads [`InputEvent`]s without blocking.
//! - [`multitouch::MtDecoder`] folds those events into one [`multitouch::TouchSample`] per
//!   slot, for type A, type B and single-touch devices, and recovers from `SYN_DROPPED`.
//! - [`calibrate::Transform`] maps device coordinates onto the screen, through a
//!   `ts_calibrate` pointercal file or by scaling the axis ranges, then rotates.
//! - [`touchscreen::TouchScreen`] ties the three together.
//! - [`display`] draws on the Linux framebuffer, or in an SDL2 window with the `sdl` feature.
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use touchtest::touchscreen::TouchScreen;
//! use std::time::Duration;
//!
//! let mut ts = TouchScreen::setup(None, None)?;
//! loop {
//!     ts.wait_ready(Some(Duration::from_millis(50)))?;
//!     if let Some(frame) = ts.read_frame()? {
//!         for sample in frame.iter().filter(|s| s.valid) {
//!             println!("slot {}: {},{}", sample.slot, sample.x, sample.y);
//!         }
//!     }
//! }
//! # }
//! ```

#![cfg(target_os = "linux")]
#![allow(non_camel_case_types)]

// has to be first for its macro
#[macro_use]
mod attribute_set;

mod constants;
mod device;
mod error;
mod event;
mod sys;

pub mod app;
pub mod calibrate;
pub mod discovery;
pub mod display;
pub mod multitouch;
pub mod options;
pub mod touchscreen;
pub mod uinput;

pub use crate::attribute_set::{AttributeSet, AttributeSetRef};
pub use crate::constants::*;
pub use crate::device::{enumerate, AbsInfo, RawDevice};
pub use crate::error::{Error, Result};
pub use crate::event::{InputEvent, InputEventKind};
