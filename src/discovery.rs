//! Picking a touchscreen when none is named on the command line.

use log::{debug, info};

use crate::constants::PropType;
use crate::error::{Error, Result};
use crate::RawDevice;

/// Find the first touchscreen under `/dev/input`.
///
/// Devices with `INPUT_PROP_DIRECT` (their coordinates map onto a display) win over touchpads
/// and tablets that merely report absolute positions.
pub fn find_touchscreen() -> Result<RawDevice> {
    pick_touchscreen(crate::enumerate()).ok_or(Error::NoTouchscreen)
}

pub(crate) fn pick_touchscreen(devices: impl Iterator<Item = RawDevice>) -> Option<RawDevice> {
    let mut fallback = None;
    for device in devices {
        if !device.is_touch_capable() {
            debug!("skipping {}: no touch axes", device.path().display());
            continue;
        }
        if device.properties().contains(PropType::DIRECT) {
            info!(
                "found touchscreen {} ({})",
                device.path().display(),
                device.name().unwrap_or("unnamed")
            );
            return Some(device);
        }
        if fallback.is_none() {
            debug!(
                "{} is touch capable but not direct, keeping as fallback",
                device.path().display()
            );
            fallback = Some(device);
        }
    }
    if let Some(device) = &fallback {
        info!(
            "using indirect touch device {} ({})",
            device.path().display(),
            device.name().unwrap_or("unnamed")
        );
    }
    fallback
}

#[cfg(test)]
mod test {
    #[test]
    fn nothing_to_pick_from() {
        assert!(super::pick_touchscreen(std::iter::empty()).is_none());
    }
}
