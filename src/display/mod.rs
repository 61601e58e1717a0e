//! Drawing surfaces.
//!
//! Everything is drawn into a [`Surface`]. The framebuffer backend renders into an in-memory
//! [`Canvas`] and copies it to video memory on [`Surface::present`], so a frame is never seen
//! half drawn.

mod console;
mod fbdev;
#[cfg(feature = "sdl")]
mod sdl;

pub use self::console::Console;
pub use self::fbdev::FbSurface;
#[cfg(feature = "sdl")]
pub use self::sdl::SdlSurface;

use crate::error::Result;
use crate::sys::fb_bitfield;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }
}

/// A rectangle that may lie partly or wholly off screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Rect {
        Rect { x, y, w, h }
    }

    /// The part of the rectangle inside a `width`×`height` surface, as
    /// `(x0, y0, x1, y1)` with exclusive ends. `None` when nothing is visible.
    pub fn clip(&self, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.w as i64).min(width as i64);
        let y1 = (self.y as i64 + self.h as i64).min(height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }
}

/// Layout of one colour channel within a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Channel {
    pub offset: u32,
    pub length: u32,
}

impl Channel {
    fn place(&self, value: u8) -> u32 {
        let length = self.length.min(8);
        if length == 0 {
            return 0;
        }
        ((value as u32) >> (8 - length)) << self.offset
    }
}

impl From<fb_bitfield> for Channel {
    fn from(field: fb_bitfield) -> Self {
        Channel {
            offset: field.offset,
            length: field.length,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelFormat {
    pub bytes_per_pixel: usize,
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
}

impl PixelFormat {
    /// 32 bpp `XRGB8888`, the usual framebuffer layout.
    pub const XRGB8888: PixelFormat = PixelFormat {
        bytes_per_pixel: 4,
        red: Channel {
            offset: 16,
            length: 8,
        },
        green: Channel {
            offset: 8,
            length: 8,
        },
        blue: Channel {
            offset: 0,
            length: 8,
        },
    };

    /// 16 bpp `RGB565`.
    pub const RGB565: PixelFormat = PixelFormat {
        bytes_per_pixel: 2,
        red: Channel {
            offset: 11,
            length: 5,
        },
        green: Channel {
            offset: 5,
            length: 6,
        },
        blue: Channel {
            offset: 0,
            length: 5,
        },
    };

    /// Pixel value for `color`.
    pub fn map_rgb(&self, color: Color) -> u32 {
        self.red.place(color.r) | self.green.place(color.g) | self.blue.place(color.b)
    }

    /// The pixel's bytes in memory order, in the first `bytes_per_pixel` entries.
    fn encode(&self, value: u32) -> [u8; 4] {
        let bytes = value.to_ne_bytes();
        if cfg!(target_endian = "big") {
            let mut out = [0; 4];
            out[..self.bytes_per_pixel].copy_from_slice(&bytes[4 - self.bytes_per_pixel..]);
            out
        } else {
            bytes
        }
    }
}

/// A packed pixel buffer in memory.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Canvas {
        let len = width as usize * height as usize * format.bytes_per_pixel;
        Canvas {
            width,
            height,
            format,
            data: vec![0; len],
        }
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn fill(&mut self, color: Color) {
        let pixel = self.format.encode(self.format.map_rgb(color));
        let bpp = self.format.bytes_per_pixel;
        for chunk in self.data.chunks_exact_mut(bpp) {
            chunk.copy_from_slice(&pixel[..bpp]);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = rect.clip(self.width, self.height) else {
            return;
        };
        let pixel = self.format.encode(self.format.map_rgb(color));
        let bpp = self.format.bytes_per_pixel;
        let stride = self.stride();
        for row in self.data.chunks_exact_mut(stride).skip(y0).take(y1 - y0) {
            for chunk in row[x0 * bpp..x1 * bpp].chunks_exact_mut(bpp) {
                chunk.copy_from_slice(&pixel[..bpp]);
            }
        }
    }

    /// The pixel value at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel;
        let start = y as usize * self.stride() + x as usize * bpp;
        let mut bytes = [0u8; 4];
        if cfg!(target_endian = "big") {
            bytes[4 - bpp..].copy_from_slice(&self.data[start..start + bpp]);
        } else {
            bytes[..bpp].copy_from_slice(&self.data[start..start + bpp]);
        }
        Some(u32::from_ne_bytes(bytes))
    }
}

/// Something the touch points can be drawn on.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Make everything drawn since the last call visible.
    fn present(&mut self) -> Result<()>;

    /// Whether the user asked to quit since the last call.
    fn poll_quit(&mut self) -> bool;
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) {
        self.fill(color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        Canvas::fill_rect(self, rect, color);
    }

    fn present(&mut self) -> Result<()> {
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn map_rgb_packs_channels() {
        let fmt = PixelFormat::XRGB8888;
        assert_eq!(fmt.map_rgb(Color::WHITE), 0x00ff_ffff);
        assert_eq!(fmt.map_rgb(Color::rgb(0x12, 0x34, 0x56)), 0x0012_3456);

        let fmt = PixelFormat::RGB565;
        assert_eq!(fmt.map_rgb(Color::WHITE), 0xffff);
        assert_eq!(fmt.map_rgb(Color::rgb(0xff, 0, 0)), 0xf800);
        assert_eq!(fmt.map_rgb(Color::rgb(0, 0xff, 0)), 0x07e0);
    }

    #[test]
    fn rect_clips_to_surface() {
        assert_eq!(Rect::new(2, 3, 4, 5).clip(100, 100), Some((2, 3, 6, 8)));
        assert_eq!(Rect::new(-3, -3, 7, 7).clip(100, 100), Some((0, 0, 4, 4)));
        assert_eq!(Rect::new(97, 98, 7, 7).clip(100, 100), Some((97, 98, 100, 100)));
        assert_eq!(Rect::new(100, 0, 7, 7).clip(100, 100), None);
        assert_eq!(Rect::new(-7, 0, 7, 7).clip(100, 100), None);
        assert_eq!(Rect::new(0, 0, 0, 7).clip(100, 100), None);
    }

    #[test]
    fn fill_rect_touches_only_its_pixels() {
        let mut canvas = Canvas::new(10, 8, PixelFormat::RGB565);
        canvas.fill(Color::BLACK);
        canvas.fill_rect(Rect::new(8, 6, 7, 7), Color::WHITE);

        assert_eq!(canvas.pixel(8, 6), Some(0xffff));
        assert_eq!(canvas.pixel(9, 7), Some(0xffff));
        assert_eq!(canvas.pixel(7, 6), Some(0));
        assert_eq!(canvas.pixel(8, 5), Some(0));
        assert_eq!(canvas.pixel(10, 7), None);
        let lit = (0..8)
            .flat_map(|y| (0..10).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y) == Some(0xffff))
            .count();
        assert_eq!(lit, 4);
    }

    #[test]
    fn three_byte_pixels() {
        let format = PixelFormat {
            bytes_per_pixel: 3,
            ..PixelFormat::XRGB8888
        };
        let mut canvas = Canvas::new(4, 4, format);
        canvas.fill(Color::rgb(1, 2, 3));
        assert_eq!(canvas.as_bytes().len(), 4 * 4 * 3);
        assert_eq!(canvas.pixel(3, 3), Some(0x0001_0203));
    }
}
