use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::NonNull;

use log::info;

use super::{Canvas, Channel, Color, Console, PixelFormat, Rect, Surface};
use crate::error::{Error, Result};
use crate::sys::{self, fb_fix_screeninfo, fb_var_screeninfo};

/// The Linux framebuffer, in its current video mode.
#[derive(Debug)]
pub struct FbSurface {
    back: Canvas,
    map: NonNull<u8>,
    map_len: usize,
    /// Byte offset of the visible page within the mapping.
    offset: usize,
    line_length: usize,
    // restored after the mapping goes away
    console: Console,
    _file: File,
}

impl FbSurface {
    pub fn open(path: &Path) -> Result<FbSurface> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let fd = file.as_raw_fd();

        let mut var = fb_var_screeninfo::default();
        let mut fix = fb_fix_screeninfo::default();
        unsafe {
            sys::fbioget_vscreeninfo(fd, &mut var)?;
            sys::fbioget_fscreeninfo(fd, &mut fix)?;
        }

        let bytes_per_pixel = match var.bits_per_pixel {
            16 | 24 | 32 => var.bits_per_pixel as usize / 8,
            bpp => {
                return Err(Error::Display(format!(
                    "{}: unsupported depth {} bpp",
                    path.display(),
                    bpp
                )))
            }
        };
        let format = PixelFormat {
            bytes_per_pixel,
            red: Channel::from(var.red),
            green: Channel::from(var.green),
            blue: Channel::from(var.blue),
        };

        let map_len = fix.smem_len as usize;
        let line_length = fix.line_length as usize;
        let offset = var.yoffset as usize * line_length + var.xoffset as usize * bytes_per_pixel;
        let visible_end = offset
            + (var.yres as usize).saturating_sub(1) * line_length
            + var.xres as usize * bytes_per_pixel;
        if var.xres == 0 || var.yres == 0 || visible_end > map_len {
            return Err(Error::Display(format!(
                "{}: visible area {}x{} does not fit in {} bytes",
                path.display(),
                var.xres,
                var.yres,
                map_len
            )));
        }

        let map = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        if map == libc::MAP_FAILED {
            return Err(io::Error::last_os_error().into());
        }
        let map = NonNull::new(map as *mut u8)
            .ok_or_else(|| Error::Display("mmap returned null".to_owned()))?;

        info!(
            "{}: {}x{}, {} bpp, {:?}",
            path.display(),
            var.xres,
            var.yres,
            var.bits_per_pixel,
            format
        );

        Ok(FbSurface {
            back: Canvas::new(var.xres, var.yres, format),
            map,
            map_len,
            offset,
            line_length,
            console: Console::acquire(),
            _file: file,
        })
    }
}

impl Surface for FbSurface {
    fn size(&self) -> (u32, u32) {
        self.back.size()
    }

    fn clear(&mut self, color: Color) {
        self.back.fill(color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.back.fill_rect(rect, color);
    }

    fn present(&mut self) -> Result<()> {
        // Safety: the mapping is map_len bytes long and open() checked that the visible page
        // lies inside it.
        let video = unsafe { std::slice::from_raw_parts_mut(self.map.as_ptr(), self.map_len) };
        let stride = self.back.stride();
        for (row, src) in self.back.as_bytes().chunks_exact(stride).enumerate() {
            let start = self.offset + row * self.line_length;
            video[start..start + stride].copy_from_slice(src);
        }
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        self.console.key_pressed()
    }
}

impl Drop for FbSurface {
    fn drop(&mut self) {
        // leave a blank screen for the console to redraw on
        self.back.fill(Color::BLACK);
        let _ = self.present();
        unsafe {
            libc::munmap(self.map.as_ptr() as *mut libc::c_void, self.map_len);
        }
    }
}
