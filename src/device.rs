use std::fs::{File, OpenOptions};
use std::mem::MaybeUninit;
use std::os::unix::{
    fs::OpenOptionsExt,
    io::{AsFd, AsRawFd, BorrowedFd, RawFd},
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fmt, io, mem};

use libc::{input_absinfo, input_event, input_id};

use crate::constants::*;
use crate::{sys, AttributeSet, AttributeSetRef, InputEvent};

/// Events read per `read(2)`. A full frame from a ten-finger panel is well under this.
const EVENT_BATCH_SIZE: usize = 64;

fn ioctl_get_cstring(
    f: unsafe fn(RawFd, &mut [u8]) -> nix::Result<libc::c_int>,
    fd: RawFd,
) -> Option<String> {
    let mut buf = vec![0; 256];
    match unsafe { f(fd, buf.as_mut_slice()) } {
        Ok(len) if len > 1 => {
            // The string ioctls return the number of bytes written, including the trailing \0.
            buf.truncate(len as usize - 1);
            Some(String::from_utf8_lossy(&buf).into_owned())
        }
        _ => None,
    }
}

/// Limits and current value of one absolute axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AbsInfo(input_absinfo);

impl AbsInfo {
    pub fn new(value: i32, minimum: i32, maximum: i32, fuzz: i32, flat: i32, resolution: i32) -> Self {
        AbsInfo(input_absinfo {
            value,
            minimum,
            maximum,
            fuzz,
            flat,
            resolution,
        })
    }

    pub fn value(&self) -> i32 {
        self.0.value
    }

    pub fn minimum(&self) -> i32 {
        self.0.minimum
    }

    pub fn maximum(&self) -> i32 {
        self.0.maximum
    }

    pub fn resolution(&self) -> i32 {
        self.0.resolution
    }

    pub(crate) fn as_raw(&self) -> &input_absinfo {
        &self.0
    }
}

/// An evdev node, typically `/dev/input/eventN`.
///
/// Opened non-blocking: [`fetch_events`](Self::fetch_events) returns whatever the kernel has
/// queued, and [`wait_ready`](Self::wait_ready) blocks until there is something to read.
#[derive(Debug)]
pub struct RawDevice {
    file: File,
    path: PathBuf,
    name: Option<String>,
    phys: Option<String>,
    id: input_id,
    props: AttributeSet<PropType>,
    driver_version: (u8, u8, u8),
    supported_keys: Option<AttributeSet<KeyCode>>,
    supported_absolute: Option<AttributeSet<AbsoluteAxisCode>>,
    event_buf: Vec<input_event>,
    grabbed: bool,
}

impl RawDevice {
    /// Opens a device, given its system path.
    #[inline(always)]
    pub fn open(path: impl AsRef<Path>) -> io::Result<RawDevice> {
        Self::_open(path.as_ref())
    }

    fn _open(path: &Path) -> io::Result<RawDevice> {
        let mut options = OpenOptions::new();

        // Try to load read/write, then fall back to read-only.
        let file = options
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .or_else(|_| options.write(false).open(path))?;
        let fd = file.as_raw_fd();

        let ty = {
            let mut ty = AttributeSet::<EventType>::new();
            unsafe { sys::eviocgbit_type(fd, ty.as_mut_raw_slice())? };
            ty
        };

        let name = ioctl_get_cstring(sys::eviocgname, fd);
        let phys = ioctl_get_cstring(sys::eviocgphys, fd);

        let id = unsafe {
            let mut id = MaybeUninit::uninit();
            sys::eviocgid(fd, id.as_mut_ptr())?;
            id.assume_init()
        };
        let mut driver_version: i32 = 0;
        unsafe {
            sys::eviocgversion(fd, &mut driver_version)?;
        }
        let driver_version = (
            ((driver_version >> 16) & 0xff) as u8,
            ((driver_version >> 8) & 0xff) as u8,
            (driver_version & 0xff) as u8,
        );

        let props = {
            let mut props = AttributeSet::<PropType>::new();
            unsafe { sys::eviocgprop(fd, props.as_mut_raw_slice())? };
            props
        };

        let supported_keys = if ty.contains(EventType::KEY) {
            let mut keys = AttributeSet::<KeyCode>::new();
            unsafe { sys::eviocgbit_key(fd, keys.as_mut_raw_slice())? };
            Some(keys)
        } else {
            None
        };

        let supported_absolute = if ty.contains(EventType::ABSOLUTE) {
            let mut abs = AttributeSet::<AbsoluteAxisCode>::new();
            unsafe { sys::eviocgbit_absolute(fd, abs.as_mut_raw_slice())? };
            Some(abs)
        } else {
            None
        };

        Ok(RawDevice {
            file,
            path: path.to_owned(),
            name,
            phys,
            id,
            props,
            driver_version,
            supported_keys,
            supported_absolute,
            event_buf: Vec::with_capacity(EVENT_BATCH_SIZE),
            grabbed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the device's name as read from the kernel.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the set of supported "properties" for the device (see `INPUT_PROP_*` in kernel headers)
    pub fn properties(&self) -> &AttributeSetRef<PropType> {
        &self.props
    }

    pub fn supported_keys(&self) -> Option<&AttributeSetRef<KeyCode>> {
        self.supported_keys.as_deref()
    }

    /// Returns the set of supported "absolute axes" reported by the device.
    ///
    /// Touchscreens report `ABS_X`/`ABS_Y` and, when they track more than one contact, the
    /// `ABS_MT_*` family.
    pub fn supported_absolute_axes(&self) -> Option<&AttributeSetRef<AbsoluteAxisCode>> {
        self.supported_absolute.as_deref()
    }

    pub fn has_abs(&self, axis: AbsoluteAxisCode) -> bool {
        self.supported_absolute_axes()
            .map_or(false, |axes| axes.contains(axis))
    }

    pub fn has_key(&self, key: KeyCode) -> bool {
        self.supported_keys().map_or(false, |keys| keys.contains(key))
    }

    /// Whether the device reports positions a touchscreen could: multitouch positions, or a
    /// single absolute point with a touch button.
    pub fn is_touch_capable(&self) -> bool {
        self.has_abs(AbsoluteAxisCode::ABS_MT_POSITION_X)
            || (self.has_abs(AbsoluteAxisCode::ABS_X) && self.has_key(KeyCode::BTN_TOUCH))
    }

    /// Fetch the limits and current value of `axis` directly via kernel syscall.
    pub fn abs_info(&self, axis: AbsoluteAxisCode) -> io::Result<AbsInfo> {
        let mut info = AbsInfo::new(0, 0, 0, 0, 0, 0);
        unsafe { sys::eviocgabs(self.as_raw_fd(), axis.0 as u32, &mut info.0)? };
        Ok(info)
    }

    /// Number of contacts the driver tracks concurrently, from the range of `ABS_MT_SLOT`.
    ///
    /// Devices without slots track a single contact.
    pub fn slot_count(&self) -> io::Result<u32> {
        if !self.has_abs(AbsoluteAxisCode::ABS_MT_SLOT) {
            return Ok(1);
        }
        let info = self.abs_info(AbsoluteAxisCode::ABS_MT_SLOT)?;
        let count = info.maximum() as i64 + 1 - info.minimum() as i64;
        Ok(count.clamp(1, u32::MAX as i64) as u32)
    }

    /// Fetch the per-slot values of one `ABS_MT_*` axis via `EVIOCGMTSLOTS`.
    ///
    /// `values` is filled for slots `0..values.len()`.
    pub fn mt_slot_values(&self, code: AbsoluteAxisCode, values: &mut [i32]) -> io::Result<()> {
        let mut buf = vec![0i32; values.len() + 1];
        buf[0] = code.0 as i32;
        {
            let (prefix, bytes, suffix) = unsafe { buf.align_to_mut::<u8>() };
            debug_assert!(prefix.is_empty() && suffix.is_empty());
            unsafe { sys::eviocgmtslots(self.as_raw_fd(), bytes)? };
        }
        values.copy_from_slice(&buf[1..]);
        Ok(())
    }

    /// Retrieve the current keypress state directly via kernel syscall.
    pub fn key_state(&self) -> io::Result<AttributeSet<KeyCode>> {
        let mut key_vals = AttributeSet::new();
        unsafe { sys::eviocgkey(self.as_raw_fd(), key_vals.as_mut_raw_slice())? };
        Ok(key_vals)
    }

    /// Read whatever the kernel has queued into the internal buffer.
    ///
    /// Returns the number of events that were read; `0` when nothing is pending.
    fn fill_events(&mut self) -> io::Result<usize> {
        let fd = self.as_raw_fd();
        self.event_buf.reserve(EVENT_BATCH_SIZE);

        let spare_capacity = self.event_buf.spare_capacity_mut();
        let spare_capacity_size = mem::size_of_val(spare_capacity);

        // use libc::read instead of nix::unistd::read b/c we need to pass an uninitialized buf
        let res = unsafe { libc::read(fd, spare_capacity.as_mut_ptr() as _, spare_capacity_size) };
        let bytes_read = match nix::errno::Errno::result(res) {
            Ok(n) => n,
            Err(nix::errno::Errno::EAGAIN) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let num_read = bytes_read as usize / mem::size_of::<input_event>();
        unsafe {
            let len = self.event_buf.len();
            self.event_buf.set_len(len + num_read);
        }
        Ok(num_read)
    }

    /// Fetches and returns the events queued in the kernel ring buffer, without blocking.
    pub fn fetch_events(&mut self) -> io::Result<impl Iterator<Item = InputEvent> + '_> {
        self.fill_events()?;
        Ok(self.event_buf.drain(..).map(InputEvent))
    }

    /// Block until the device is readable or `timeout` elapses.
    ///
    /// Returns `false` on timeout or when interrupted by a signal.
    pub fn wait_ready(&self, timeout: Option<Duration>) -> io::Result<bool> {
        use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

        let timeout = match timeout {
            Some(t) => PollTimeout::from(t.as_millis().min(u16::MAX as u128) as u16),
            None => PollTimeout::NONE,
        };
        let mut pfd = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];
        match poll(&mut pfd, timeout) {
            Ok(n) => Ok(n > 0),
            Err(nix::errno::Errno::EINTR) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Grab the device so no other client (console, compositor) sees its events.
    pub fn grab(&mut self) -> io::Result<()> {
        if !self.grabbed {
            unsafe {
                sys::eviocgrab(self.as_raw_fd(), 1)?;
            }
            self.grabbed = true;
        }
        Ok(())
    }

    pub fn ungrab(&mut self) -> io::Result<()> {
        if self.grabbed {
            unsafe {
                sys::eviocgrab(self.as_raw_fd(), 0)?;
            }
            self.grabbed = false;
        }
        Ok(())
    }
}

impl Drop for RawDevice {
    fn drop(&mut self) {
        let _ = self.ungrab();
    }
}

impl AsRawFd for RawDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl AsFd for RawDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

const fn bus_name(x: u16) -> &'static str {
    match x {
        0x1 => "PCI",
        0x3 => "USB",
        0x5 => "Bluetooth",
        0x6 => "Virtual",
        0x11 => "i8042",
        0x18 => "I2C",
        0x19 => "Host",
        0x1C => "SPI",
        _ => "Unknown",
    }
}

impl fmt::Display for RawDevice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} ({}):",
            self.name().unwrap_or("Unnamed device"),
            self.path.display()
        )?;
        writeln!(
            f,
            "  Driver version: {}.{}.{}",
            self.driver_version.0, self.driver_version.1, self.driver_version.2
        )?;
        if let Some(ref phys) = self.phys {
            writeln!(f, "  Physical address: {:?}", phys)?;
        }
        writeln!(f, "  Bus: {}", bus_name(self.id.bustype))?;
        writeln!(f, "  Vendor: {:#x}", self.id.vendor)?;
        writeln!(f, "  Product: {:#x}", self.id.product)?;
        writeln!(f, "  Properties: {:?}", self.properties())?;

        if let Some(axes) = self.supported_absolute_axes() {
            writeln!(f, "  Absolute Axes:")?;
            for axis in axes.iter() {
                match self.abs_info(axis) {
                    Ok(info) => writeln!(
                        f,
                        "    {:?} (min {}, max {}, res {})",
                        axis,
                        info.minimum(),
                        info.maximum(),
                        info.resolution()
                    )?,
                    Err(_) => writeln!(f, "    {:?}", axis)?,
                }
            }
        }
        Ok(())
    }
}

/// Crawls `/dev/input` for evdev devices, in path order.
///
/// Will not bubble up any errors in opening devices or traversing the directory. Instead returns
/// an empty iterator or omits the devices that could not be opened.
pub fn enumerate() -> impl Iterator<Item = RawDevice> {
    enumerate_dir(Path::new("/dev/input"))
}

pub(crate) fn enumerate_dir(dir: &Path) -> impl Iterator<Item = RawDevice> {
    use std::os::unix::ffi::OsStrExt;

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .map_or(false, |name| name.as_bytes().starts_with(b"event"))
        })
        .collect();
    // event10 sorts after event9
    paths.sort_by_key(|path| {
        let digits = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("event"))
            .and_then(|n| n.parse::<u32>().ok());
        (digits, path.clone())
    });
    paths.into_iter().filter_map(|path| RawDevice::open(path).ok())
}

#[cfg(test)]
mod test {
    use std::mem::MaybeUninit;

    #[test]
    fn align_to_mut_is_sane() {
        // We assume align_to_mut -> u8 puts everything in inner. Let's double check.
        let mut slots = vec![0i32; 11];
        let (prefix, inner, suffix) = unsafe { slots.align_to_mut::<u8>() };
        assert_eq!(prefix.len(), 0);
        assert_eq!(inner.len(), 11 * std::mem::size_of::<i32>());
        assert_eq!(suffix.len(), 0);

        let mut ev: MaybeUninit<libc::input_event> = MaybeUninit::uninit();
        let (prefix, inner, suffix) = unsafe { std::slice::from_mut(&mut ev).align_to_mut::<u8>() };
        assert_eq!(prefix.len(), 0);
        assert_eq!(inner.len(), std::mem::size_of::<libc::input_event>());
        assert_eq!(suffix.len(), 0);
    }

    #[test]
    fn enumerate_skips_non_devices() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("event0"), b"not a device").unwrap();
        std::fs::write(dir.path().join("mouse0"), b"").unwrap();
        assert_eq!(super::enumerate_dir(dir.path()).count(), 0);
        assert_eq!(
            super::enumerate_dir(&dir.path().join("missing")).count(),
            0
        );
    }
}
