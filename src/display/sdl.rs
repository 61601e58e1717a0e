use log::{debug, info};
use sdl2::event::Event;
use sdl2::pixels;
use sdl2::render::WindowCanvas;
use sdl2::{EventPump, Sdl};

use super::{Color, Rect, Surface};
use crate::error::{Error, Result};

/// A full-screen SDL2 window.
pub struct SdlSurface {
    canvas: WindowCanvas,
    events: EventPump,
    size: (u32, u32),
    _sdl: Sdl,
}

impl SdlSurface {
    pub fn open() -> Result<SdlSurface> {
        let sdl = sdl2::init().map_err(Error::Display)?;
        let video = sdl.video().map_err(Error::Display)?;
        let mode = video.desktop_display_mode(0).map_err(Error::Display)?;

        let window = video
            .window("touchtest", mode.w as u32, mode.h as u32)
            .fullscreen_desktop()
            .build()
            .map_err(|e| Error::Display(e.to_string()))?;
        sdl.mouse().show_cursor(false);

        let canvas = window
            .into_canvas()
            .build()
            .map_err(|e| Error::Display(e.to_string()))?;
        let size = canvas.output_size().map_err(Error::Display)?;
        let events = sdl.event_pump().map_err(Error::Display)?;
        info!("SDL window {}x{}", size.0, size.1);

        Ok(SdlSurface {
            canvas,
            events,
            size,
            _sdl: sdl,
        })
    }
}

fn sdl_color(color: Color) -> pixels::Color {
    pixels::Color::RGB(color.r, color.g, color.b)
}

impl Surface for SdlSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.canvas.set_draw_color(sdl_color(color));
        self.canvas.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if rect.w == 0 || rect.h == 0 {
            return;
        }
        self.canvas.set_draw_color(sdl_color(color));
        let rect = sdl2::rect::Rect::new(rect.x, rect.y, rect.w, rect.h);
        if let Err(e) = self.canvas.fill_rect(rect) {
            debug!("fill_rect: {}", e);
        }
    }

    fn present(&mut self) -> Result<()> {
        self.canvas.present();
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        let mut quit = false;
        for event in self.events.poll_iter() {
            if let Event::Quit { .. } | Event::KeyDown { .. } = event {
                quit = true;
            }
        }
        quit
    }
}
