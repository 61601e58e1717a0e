//! The interactive test loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::calibrate::{LinearCalibration, Mapping, Transform};
use crate::display::{Color, FbSurface, Rect, Surface};
use crate::error::Result;
use crate::multitouch::TouchSample;
use crate::options::Options;
use crate::touchscreen::TouchScreen;

/// How long to wait for touch input before checking for a quit request.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

static QUIT: AtomicBool = AtomicBool::new(false);

extern "C" fn request_quit(_: libc::c_int) {
    QUIT.store(true, Ordering::Relaxed);
}

/// Route SIGINT, SIGTERM and SIGHUP to a quit request, so the console is restored on the way
/// out. No `SA_RESTART`: a signal interrupts the wait for input.
fn install_signal_handlers() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(request_quit),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
        unsafe { sigaction(signal, &action)? };
    }
    Ok(())
}

fn quit_requested() -> bool {
    QUIT.load(Ordering::Relaxed)
}

/// Run a touch test session until the user quits or the device goes away.
pub fn run(options: &Options) -> Result<()> {
    let mut ts = TouchScreen::setup(options.device.as_deref(), options.slots)?;
    if options.grab {
        ts.grab()?;
    }

    let mut surface = open_surface(options)?;
    surface.clear(Color::BLACK);
    surface.present()?;

    let mapping = mapping(options, &ts)?;
    ts.set_transform(Transform::new(mapping, options.rotate, surface.size()));

    event_loop(&mut ts, surface.as_mut(), options.size)
}

/// Open the drawing surface with the quit signals already routed, so a signal that arrives once
/// the console is in graphics mode still lets it be restored.
fn open_surface(options: &Options) -> Result<Box<dyn Surface>> {
    install_signal_handlers()?;
    if options.sdl {
        #[cfg(feature = "sdl")]
        return Ok(Box::new(crate::display::SdlSurface::open()?));
        #[cfg(not(feature = "sdl"))]
        return Err(crate::Error::Display("built without SDL support".to_owned()));
    }
    Ok(Box::new(FbSurface::open(&options.framebuffer())?))
}

fn mapping(options: &Options, ts: &TouchScreen) -> Result<Mapping> {
    if options.raw {
        return Ok(Mapping::Raw);
    }
    if let Some(cal) = LinearCalibration::load(&options.calib_file)? {
        info!("using calibration from {}", options.calib_file.display());
        return Ok(Mapping::Linear(cal));
    }
    info!(
        "{} not found, scaling the device range to the screen",
        options.calib_file.display()
    );
    let (x, y) = ts.abs_range()?;
    Ok(Mapping::Scaled { x, y })
}

fn event_loop(ts: &mut TouchScreen, surface: &mut dyn Surface, size: u32) -> Result<()> {
    loop {
        let ready = match ts.wait_ready(Some(POLL_INTERVAL)) {
            Ok(ready) => ready,
            Err(e) => {
                warn!("waiting for touch input: {}", e);
                return Ok(());
            }
        };

        if ready {
            match ts.read_frame() {
                Ok(Some(frame)) => {
                    render(surface, frame, size);
                    surface.present()?;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("reading touch input: {}", e);
                    return Ok(());
                }
            }
        }

        if quit_requested() || surface.poll_quit() {
            info!("quit requested");
            return Ok(());
        }
    }
}

/// Draw one frame: a white `size`×`size` square at the top left of each live contact.
pub fn render<S: Surface + ?Sized>(surface: &mut S, frame: &[TouchSample], size: u32) {
    surface.clear(Color::BLACK);
    for sample in frame.iter().filter(|s| s.valid) {
        debug!(
            "slot {} id {}: x {} y {} pressure {}",
            sample.slot, sample.tracking_id, sample.x, sample.y, sample.pressure
        );
        surface.fill_rect(Rect::new(sample.x, sample.y, size, size), Color::WHITE);
    }
}
