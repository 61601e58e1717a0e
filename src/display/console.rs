use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Read};
use std::os::unix::io::{AsFd, AsRawFd};

use log::{debug, warn};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};

use crate::sys;

/// Takes the text console out of the way while drawing on the framebuffer.
///
/// The virtual terminal is switched to `KD_GRAPHICS`, which stops the kernel from drawing the
/// text cursor and console output over the framebuffer, and a terminal stdin is put in
/// non-canonical mode so a single key press can be seen. Both are restored on drop.
///
/// Every step is best effort: running over ssh or without a VT still works, only with the
/// console left alone.
#[derive(Debug)]
pub struct Console {
    tty: Option<(File, libc::c_int)>,
    saved_termios: Option<Termios>,
}

impl Console {
    pub fn acquire() -> Console {
        Console {
            tty: Self::enter_graphics(),
            saved_termios: Self::raw_stdin(),
        }
    }

    fn enter_graphics() -> Option<(File, libc::c_int)> {
        let tty = match OpenOptions::new().read(true).write(true).open("/dev/tty") {
            Ok(tty) => tty,
            Err(e) => {
                debug!("no controlling tty: {}", e);
                return None;
            }
        };
        let mut mode: libc::c_int = sys::KD_TEXT;
        if let Err(e) = unsafe { sys::kdgetmode(tty.as_raw_fd(), &mut mode) } {
            debug!("tty is not a virtual terminal: {}", e);
            return None;
        }
        if let Err(e) = unsafe { sys::kdsetmode(tty.as_raw_fd(), sys::KD_GRAPHICS) } {
            warn!("could not switch console to graphics mode: {}", e);
            return None;
        }
        Some((tty, mode))
    }

    fn raw_stdin() -> Option<Termios> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return None;
        }
        let saved = match termios::tcgetattr(stdin.as_fd()) {
            Ok(saved) => saved,
            Err(e) => {
                warn!("could not read terminal settings: {}", e);
                return None;
            }
        };
        let mut raw = saved.clone();
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        if let Err(e) = termios::tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &raw) {
            warn!("could not change terminal settings: {}", e);
            return None;
        }
        Some(saved)
    }

    /// Whether a key was pressed on the terminal since the last call. Drains pending input.
    pub fn key_pressed(&mut self) -> bool {
        if self.saved_termios.is_none() {
            return false;
        }
        let stdin = io::stdin();
        let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::ZERO) {
            Ok(n) if n > 0 => {}
            _ => return false,
        }
        let mut buf = [0u8; 64];
        match stdin.lock().read(&mut buf) {
            Ok(n) => n > 0,
            Err(_) => false,
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        if let Some(saved) = &self.saved_termios {
            if let Err(e) = termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSANOW, saved) {
                warn!("could not restore terminal settings: {}", e);
            }
        }
        if let Some((tty, mode)) = &self.tty {
            if let Err(e) = unsafe { sys::kdsetmode(tty.as_raw_fd(), *mode) } {
                warn!("could not restore console mode: {}", e);
            }
        }
    }
}
