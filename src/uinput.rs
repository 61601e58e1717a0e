//! Virtual touchscreens via uinput.
//!
//! Lets the decoder and the device plumbing be tested end to end without touch hardware.
//! Needs write access to `/dev/uinput`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::{fs::OpenOptionsExt, io::AsRawFd};
use std::path::PathBuf;

use libc::{uinput_abs_setup, uinput_setup, O_NONBLOCK};
use nix::sys::ioctl::ioctl_param_type;

use crate::constants::*;
use crate::event::cast_to_bytes;
use crate::{sys, AbsInfo, AttributeSetRef, InputEvent};

const UINPUT_MAX_NAME_SIZE: usize = 80;
const UINPUT_PATH: &str = "/dev/uinput";
const BUS_VIRTUAL: u16 = 0x06;

#[derive(Debug)]
pub struct VirtualDeviceBuilder<'a> {
    file: File,
    name: &'a [u8],
    id: Option<libc::input_id>,
}

impl<'a> VirtualDeviceBuilder<'a> {
    pub fn new() -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(O_NONBLOCK)
            .open(UINPUT_PATH)?;

        Ok(VirtualDeviceBuilder {
            file,
            name: Default::default(),
            id: None,
        })
    }

    #[inline]
    pub fn name<S: AsRef<[u8]> + ?Sized>(mut self, name: &'a S) -> Self {
        self.name = name.as_ref();
        self
    }

    pub fn input_id(mut self, id: libc::input_id) -> Self {
        self.id = Some(id);
        self
    }

    fn set_evbit(&self, ty: EventType) -> io::Result<()> {
        unsafe { sys::ui_set_evbit(self.file.as_raw_fd(), ty.0 as ioctl_param_type)? };
        Ok(())
    }

    pub fn with_keys(self, keys: &AttributeSetRef<KeyCode>) -> io::Result<Self> {
        self.set_evbit(EventType::KEY)?;
        for bit in keys.iter() {
            unsafe { sys::ui_set_keybit(self.file.as_raw_fd(), bit.0 as ioctl_param_type)? };
        }
        Ok(self)
    }

    /// Declare one absolute axis along with its range.
    pub fn with_absolute_axis(self, axis: AbsoluteAxisCode, info: AbsInfo) -> io::Result<Self> {
        self.set_evbit(EventType::ABSOLUTE)?;
        unsafe { sys::ui_set_absbit(self.file.as_raw_fd(), axis.0 as ioctl_param_type)? };
        let setup = uinput_abs_setup {
            code: axis.0,
            absinfo: *info.as_raw(),
        };
        unsafe { sys::ui_abs_setup(self.file.as_raw_fd(), &setup)? };
        Ok(self)
    }

    pub fn with_properties(self, props: &AttributeSetRef<PropType>) -> io::Result<Self> {
        for bit in props.iter() {
            unsafe { sys::ui_set_propbit(self.file.as_raw_fd(), bit.0 as ioctl_param_type)? };
        }
        Ok(self)
    }

    pub fn build(self) -> io::Result<VirtualDevice> {
        if self.name.len() >= UINPUT_MAX_NAME_SIZE || self.name.contains(&0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "device name too long or contains NUL",
            ));
        }
        let mut name = [0 as libc::c_char; UINPUT_MAX_NAME_SIZE];
        for (dst, &src) in name.iter_mut().zip(self.name) {
            *dst = src as libc::c_char;
        }

        let setup = uinput_setup {
            id: self.id.unwrap_or(libc::input_id {
                bustype: BUS_VIRTUAL,
                vendor: 0x1234,
                product: 0x5678,
                version: 0x111,
            }),
            name,
            ff_effects_max: 0,
        };

        VirtualDevice::new(self.file, &setup)
    }
}

/// A uinput device; destroyed when dropped.
#[derive(Debug)]
pub struct VirtualDevice {
    file: File,
}

impl VirtualDevice {
    fn new(file: File, setup: &uinput_setup) -> io::Result<Self> {
        unsafe { sys::ui_dev_setup(file.as_raw_fd(), setup)? };
        unsafe { sys::ui_dev_create(file.as_raw_fd())? };
        Ok(VirtualDevice { file })
    }

    /// Write events exactly as given.
    pub fn emit_raw(&mut self, events: &[InputEvent]) -> io::Result<()> {
        let bytes = unsafe { cast_to_bytes(events) };
        self.file.write_all(bytes)
    }

    /// Write events followed by the `SYN_REPORT` that makes the kernel deliver them.
    pub fn emit(&mut self, events: &[InputEvent]) -> io::Result<()> {
        self.emit_raw(events)?;
        self.emit_raw(&[InputEvent::syn(SynchronizationCode::SYN_REPORT)])
    }

    /// `/sys/devices/virtual/input/inputN`.
    pub fn sys_path(&self) -> io::Result<PathBuf> {
        let mut bytes = vec![0u8; 1024];
        let len = unsafe { sys::ui_get_sysname(self.file.as_raw_fd(), &mut bytes)? };
        // the length returned includes the trailing \0
        bytes.truncate((len as usize).saturating_sub(1));
        let sysname = String::from_utf8_lossy(&bytes).into_owned();
        Ok(PathBuf::from("/sys/devices/virtual/input").join(sysname))
    }

    /// The `/dev/input/eventN` node of this device.
    pub fn dev_node(&self) -> io::Result<PathBuf> {
        let sys_path = self.sys_path()?;
        for entry in std::fs::read_dir(&sys_path)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with("event") {
                return Ok(PathBuf::from("/dev/input").join(name));
            }
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no event node under {}", sys_path.display()),
        ))
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        let _ = unsafe { sys::ui_dev_destroy(self.file.as_raw_fd()) };
    }
}
