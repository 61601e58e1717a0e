//! Mapping from device coordinates to screen pixels.
//!
//! A [`Transform`] first maps a raw position onto the unrotated panel, either through a linear
//! calibration file or by scaling the device's axis range, and then applies the display
//! [`Rotation`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;

use crate::error::{Error, Result};

/// Display rotation, matching the values of `/sys/class/graphics/fbcon/rotate`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    None,
    /// 90 degrees clockwise.
    Clockwise,
    /// 180 degrees.
    UpsideDown,
    /// 270 degrees clockwise.
    CounterClockwise,
}

impl Rotation {
    pub fn from_index(index: u8) -> Option<Rotation> {
        match index {
            0 => Some(Rotation::None),
            1 => Some(Rotation::Clockwise),
            2 => Some(Rotation::UpsideDown),
            3 => Some(Rotation::CounterClockwise),
            _ => None,
        }
    }

    /// Whether the screen's width is the panel's height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Clockwise | Rotation::CounterClockwise)
    }

    /// Rotate a point on a `width`×`height` panel.
    pub fn apply(self, x: i32, y: i32, width: u32, height: u32) -> (i32, i32) {
        let w = width as i32 - 1;
        let h = height as i32 - 1;
        match self {
            Rotation::None => (x, y),
            Rotation::Clockwise => (y, w.saturating_sub(x)),
            Rotation::UpsideDown => (w.saturating_sub(x), h.saturating_sub(y)),
            Rotation::CounterClockwise => (h.saturating_sub(y), x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRotationError(String);

impl fmt::Display for ParseRotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rotation {:?}, expected 0, 1, 2 or 3", self.0)
    }
}

impl std::error::Error for ParseRotationError {}

impl FromStr for Rotation {
    type Err = ParseRotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Rotation::from_index)
            .ok_or_else(|| ParseRotationError(s.to_owned()))
    }
}

/// Range of one device axis, from its `input_absinfo`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    /// Scale `value` from this range onto `0..size`.
    ///
    /// Values outside the range land outside `0..size`; they are not clamped.
    pub fn scale(&self, value: i32, size: u32) -> i32 {
        let span = self.max as i64 - self.min as i64;
        if span <= 0 || size == 0 {
            return 0;
        }
        saturate((value as i64 - self.min as i64) * (size as i64 - 1) / span)
    }
}

/// The coefficients written by `ts_calibrate` to `/etc/pointercal`.
///
/// ```text
/// a0 a1 a2 a3 a4 a5 a6 [xres yres]
/// x' = (a2 + a0*x + a1*y) / a6
/// y' = (a5 + a3*x + a4*y) / a6
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearCalibration {
    a: [i64; 7],
    resolution: Option<(u32, u32)>,
}

impl LinearCalibration {
    pub fn new(a: [i64; 7], resolution: Option<(u32, u32)>) -> Option<Self> {
        (a[6] != 0).then_some(LinearCalibration { a, resolution })
    }

    /// Parse the file contents. Errors carry the 1-based line of the problem.
    pub fn parse(text: &str) -> Result<Self, (usize, &'static str)> {
        let mut values = Vec::with_capacity(9);
        let mut last_line = 1;
        for (idx, line) in text.lines().enumerate() {
            for token in line.split_whitespace() {
                let value = token
                    .parse::<i64>()
                    .map_err(|_| (idx + 1, "invalid integer"))?;
                values.push(value);
            }
            if !line.trim().is_empty() {
                last_line = idx + 1;
            }
        }

        if values.len() < 7 {
            return Err((last_line, "expected 7 calibration coefficients"));
        }
        let mut a = [0i64; 7];
        a.copy_from_slice(&values[..7]);

        let resolution = match values[7..] {
            [] => None,
            [xres, yres, ..] => match (u32::try_from(xres), u32::try_from(yres)) {
                (Ok(xres), Ok(yres)) if xres > 0 && yres > 0 => Some((xres, yres)),
                _ => return Err((last_line, "invalid calibration resolution")),
            },
            _ => return Err((last_line, "invalid calibration resolution")),
        };

        LinearCalibration::new(a, resolution).ok_or((last_line, "divisor a6 is zero"))
    }

    /// Load a calibration file. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        LinearCalibration::parse(&text)
            .map(Some)
            .map_err(|(line, reason)| Error::Calibration {
                path: PathBuf::from(path),
                line,
                reason,
            })
    }

    /// Resolution the coefficients were computed for, if the file recorded one.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    pub fn apply(&self, x: i32, y: i32) -> (i32, i32) {
        let (x, y) = (x as i64, y as i64);
        let a = &self.a;
        let nx = (a[2] + a[0] * x + a[1] * y) / a[6];
        let ny = (a[5] + a[3] * x + a[4] * y) / a[6];
        (saturate(nx), saturate(ny))
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// How raw positions reach the unrotated panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mapping {
    /// Device units, untouched.
    Raw,
    /// Linear scaling of the device's axis ranges onto the panel.
    Scaled { x: AxisRange, y: AxisRange },
    Linear(LinearCalibration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transform {
    mapping: Mapping,
    rotation: Rotation,
    panel: (u32, u32),
}

impl Transform {
    /// A transform onto a screen of `width`×`height` pixels as currently displayed.
    pub fn new(mapping: Mapping, rotation: Rotation, (width, height): (u32, u32)) -> Self {
        let screen_panel = if rotation.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        };
        let panel = match mapping {
            Mapping::Linear(cal) => cal.resolution().unwrap_or(screen_panel),
            _ => screen_panel,
        };
        info!(
            "coordinate mapping {:?}, rotation {:?}, panel {}x{}",
            mapping, rotation, panel.0, panel.1
        );
        Transform {
            mapping,
            rotation,
            panel,
        }
    }

    pub fn identity() -> Self {
        Transform {
            mapping: Mapping::Raw,
            rotation: Rotation::None,
            panel: (0, 0),
        }
    }

    pub fn apply(&self, x: i32, y: i32) -> (i32, i32) {
        let (width, height) = self.panel;
        let (x, y) = match self.mapping {
            Mapping::Raw => (x, y),
            Mapping::Scaled { x: rx, y: ry } => (rx.scale(x, width), ry.scale(y, height)),
            Mapping::Linear(cal) => cal.apply(x, y),
        };
        self.rotation.apply(x, y, width, height)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rotation_parses_fbcon_values() {
        assert_eq!("0".parse(), Ok(Rotation::None));
        assert_eq!("3\n".parse(), Ok(Rotation::CounterClockwise));
        assert!("4".parse::<Rotation>().is_err());
        assert!("cw".parse::<Rotation>().is_err());
    }

    #[test]
    fn rotation_maps_corners() {
        // 800x480 panel
        assert_eq!(Rotation::Clockwise.apply(0, 0, 800, 480), (0, 799));
        assert_eq!(Rotation::Clockwise.apply(799, 479, 800, 480), (479, 0));
        assert_eq!(Rotation::UpsideDown.apply(0, 0, 800, 480), (799, 479));
        assert_eq!(Rotation::CounterClockwise.apply(0, 0, 800, 480), (479, 0));
        assert_eq!(Rotation::CounterClockwise.apply(799, 479, 800, 480), (0, 799));
    }

    #[test]
    fn axis_range_scales_to_last_pixel() {
        let range = AxisRange { min: 0, max: 4095 };
        assert_eq!(range.scale(0, 800), 0);
        assert_eq!(range.scale(4095, 800), 799);
        assert_eq!(range.scale(2048, 800), 399);

        let offset = AxisRange { min: 100, max: 200 };
        assert_eq!(offset.scale(150, 101), 50);

        let flat = AxisRange { min: 5, max: 5 };
        assert_eq!(flat.scale(5, 800), 0);
    }

    #[test]
    fn pointercal_parses_and_applies() {
        let cal = LinearCalibration::parse("-67 34428 -3798408 -21997 -44 84163296 65536 800 480\n")
            .unwrap();
        assert_eq!(cal.resolution(), Some((800, 480)));

        let identity = LinearCalibration::parse("1 0 0 0 1 0 1").unwrap();
        assert_eq!(identity.apply(12, 34), (12, 34));
        assert_eq!(identity.resolution(), None);

        let halved = LinearCalibration::parse("1 0 10\n0 1 20\n2\n").unwrap();
        assert_eq!(halved.apply(100, 200), (55, 110));
    }

    #[test]
    fn pointercal_rejects_bad_input() {
        assert_eq!(
            LinearCalibration::parse("1 0 0\n0 x 0 1"),
            Err((2, "invalid integer"))
        );
        assert_eq!(
            LinearCalibration::parse("1 0 0 0 1 0"),
            Err((1, "expected 7 calibration coefficients"))
        );
        assert_eq!(
            LinearCalibration::parse("1 0 0 0 1 0 0"),
            Err((1, "divisor a6 is zero"))
        );
        assert_eq!(
            LinearCalibration::parse("1 0 0 0 1 0 1 800"),
            Err((1, "invalid calibration resolution"))
        );
        assert_eq!(
            LinearCalibration::parse("1 0 0 0 1 0 1 4294967296 480"),
            Err((1, "invalid calibration resolution"))
        );
    }

    #[test]
    fn missing_calibration_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(LinearCalibration::load(&dir.path().join("pointercal")).unwrap(), None);

        let path = dir.path().join("bad");
        std::fs::write(&path, "1 2 3\n").unwrap();
        match LinearCalibration::load(&path) {
            Err(Error::Calibration { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn transform_scales_then_rotates() {
        let mapping = Mapping::Scaled {
            x: AxisRange { min: 0, max: 1000 },
            y: AxisRange { min: 0, max: 1000 },
        };
        // screen shows 480x800 because the 800x480 panel is rotated
        let t = Transform::new(mapping, Rotation::Clockwise, (480, 800));
        assert_eq!(t.apply(0, 0), (0, 799));
        assert_eq!(t.apply(1000, 1000), (479, 0));

        let raw = Transform::new(Mapping::Raw, Rotation::None, (800, 480));
        assert_eq!(raw.apply(4000, -3), (4000, -3));
        assert_eq!(Transform::identity().apply(7, 8), (7, 8));
    }

    #[test]
    fn calibration_without_resolution_follows_rotation() {
        let identity = LinearCalibration::parse("1 0 0 0 1 0 1").unwrap();
        let t = Transform::new(Mapping::Linear(identity), Rotation::Clockwise, (480, 800));
        assert_eq!(t.apply(0, 0), (0, 799));
        assert_eq!(t.apply(799, 479), (479, 0));

        let scaled = Transform::new(
            Mapping::Scaled {
                x: AxisRange { min: 0, max: 799 },
                y: AxisRange { min: 0, max: 479 },
            },
            Rotation::Clockwise,
            (480, 800),
        );
        assert_eq!(t.apply(0, 0), scaled.apply(0, 0));
    }

    #[test]
    fn calibration_saturates_out_of_range_results() {
        let huge = LinearCalibration::parse("4294967296 0 0 0 -4294967296 0 1").unwrap();
        assert_eq!(huge.apply(1, 1), (i32::MAX, i32::MIN));
        assert_eq!(huge.apply(0, 0), (0, 0));

        let t = Transform::new(Mapping::Linear(huge), Rotation::UpsideDown, (800, 480));
        assert_eq!(t.apply(1, 1), (799 - i32::MAX, i32::MAX));
    }
}
