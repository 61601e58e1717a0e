use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no touchscreen found under /dev/input")]
    NoTouchscreen,
    #[error("{}: device has no absolute axes, not a touchscreen", .0.display())]
    NotTouchscreen(PathBuf),
    #[error("{}:{line}: {reason}", path.display())]
    Calibration {
        path: PathBuf,
        line: usize,
        reason: &'static str,
    },
    #[error("display: {0}")]
    Display(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Nix(#[from] nix::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
