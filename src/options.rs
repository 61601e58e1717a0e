use std::path::PathBuf;

use clap::Parser;

use crate::calibrate::Rotation;

const DEFAULT_FRAMEBUFFER: &str = "/dev/fb0";

/// Draw a square under every finger on the touchscreen.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "touchtest",
    version,
    help_template = "{name} {version}\n{about}\n\n{usage-heading} {usage}\n\n{all-args}{after-help}",
    after_help = "Example (rotate the touch points the same way as the console):\n  \
                  touchtest -r $(cat /sys/class/graphics/fbcon/rotate)\n\n\
                  Press any key or Ctrl-C to quit."
)]
pub struct Options {
    /// Log every valid touch sample
    #[arg(short, long)]
    pub verbose: bool,

    /// Input device; found automatically when not given
    #[arg(short = 'i', long = "idev", env = "TSLIB_TSDEVICE", value_name = "DEVICE")]
    pub device: Option<PathBuf>,

    /// Number of touch contacts to track, instead of what the device reports
    #[arg(short = 'j', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub slots: Option<u32>,

    /// Rotation: 0 none, 1 clockwise 90°, 2 upside down 180°, 3 counter-clockwise 270°
    #[arg(short, long, default_value = "0", value_name = "0..3")]
    pub rotate: Rotation,

    /// Linear calibration file written by ts_calibrate
    #[arg(
        short = 'c',
        long = "calib-file",
        env = "TSLIB_CALIBFILE",
        default_value = "/etc/pointercal",
        value_name = "FILE"
    )]
    pub calib_file: PathBuf,

    /// Draw raw device coordinates, without calibration or scaling
    #[arg(long)]
    pub raw: bool,

    /// Framebuffer device [env: TSLIB_FBDEVICE, FRAMEBUFFER] [default: /dev/fb0]
    #[arg(short = 'f', long = "fbdevice", value_name = "DEVICE")]
    pub fbdevice: Option<PathBuf>,

    /// Grab the input device so no other program sees the touches
    #[arg(short, long)]
    pub grab: bool,

    /// Side of the square drawn per touch, in pixels
    #[arg(short, long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..))]
    pub size: u32,

    /// Draw in an SDL2 window instead of on the framebuffer
    #[arg(long)]
    pub sdl: bool,
}

impl Options {
    /// The framebuffer to draw on: `-f`, then `$TSLIB_FBDEVICE`, then `$FRAMEBUFFER`.
    pub fn framebuffer(&self) -> PathBuf {
        self.framebuffer_from(|name| std::env::var_os(name))
    }

    fn framebuffer_from(&self, env: impl Fn(&str) -> Option<std::ffi::OsString>) -> PathBuf {
        self.fbdevice
            .clone()
            .or_else(|| env("TSLIB_FBDEVICE").map(PathBuf::from))
            .or_else(|| env("FRAMEBUFFER").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FRAMEBUFFER))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Options::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let opts = Options::try_parse_from(["touchtest"]).unwrap();
        assert!(!opts.verbose && !opts.raw && !opts.grab && !opts.sdl);
        assert_eq!(opts.slots, None);
        assert_eq!(opts.rotate, Rotation::None);
        assert_eq!(opts.size, 7);
    }

    #[test]
    fn short_flags() {
        let opts = Options::try_parse_from([
            "touchtest", "-v", "-i", "/dev/input/event3", "-j", "5", "-r", "1", "-c", "/tmp/cal",
            "-f", "/dev/fb1", "-g", "-s", "12",
        ])
        .unwrap();
        assert!(opts.verbose && opts.grab);
        assert_eq!(opts.device, Some(PathBuf::from("/dev/input/event3")));
        assert_eq!(opts.slots, Some(5));
        assert_eq!(opts.rotate, Rotation::Clockwise);
        assert_eq!(opts.calib_file, PathBuf::from("/tmp/cal"));
        assert_eq!(opts.fbdevice, Some(PathBuf::from("/dev/fb1")));
        assert_eq!(opts.size, 12);
    }

    #[test]
    fn long_flags() {
        let opts = Options::try_parse_from([
            "touchtest", "--idev", "/dev/input/event0", "--slots", "10", "--rotate", "3",
            "--raw", "--sdl",
        ])
        .unwrap();
        assert_eq!(opts.slots, Some(10));
        assert_eq!(opts.rotate, Rotation::CounterClockwise);
        assert!(opts.raw && opts.sdl);
    }

    #[test]
    fn rejects_out_of_range_values() {
        for args in [
            &["touchtest", "-j", "0"][..],
            &["touchtest", "-j", "-2"],
            &["touchtest", "-r", "4"],
            &["touchtest", "-s", "0"],
        ] {
            let err = Options::try_parse_from(args).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{:?}", args);
        }
        let err = Options::try_parse_from(["touchtest", "-x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn help_mentions_rotation_example() {
        let help = Options::command().render_help().to_string();
        assert!(help.contains("touchtest -r $(cat /sys/class/graphics/fbcon/rotate)"));
        assert!(help.contains("--calib-file"));
    }

    #[test]
    fn framebuffer_fallbacks() {
        let opts = Options::try_parse_from(["touchtest"]).unwrap();
        assert_eq!(opts.framebuffer_from(|_| None), PathBuf::from("/dev/fb0"));
        assert_eq!(
            opts.framebuffer_from(|name| (name == "FRAMEBUFFER").then(|| "/dev/fb2".into())),
            PathBuf::from("/dev/fb2")
        );
        assert_eq!(
            opts.framebuffer_from(|_| Some("/dev/fb3".into())),
            PathBuf::from("/dev/fb3")
        );

        let opts = Options::try_parse_from(["touchtest", "-f", "/dev/fb9"]).unwrap();
        assert_eq!(
            opts.framebuffer_from(|_| Some("/dev/fb3".into())),
            PathBuf::from("/dev/fb9")
        );
    }
}
