// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Frame output published by the script context and the geometry/timing
//! reported to the host.

use crate::{GAME_FRAME, SAMPLE_RATE};

/// Pixel layout negotiated with the host. Only XRGB8888 is ever requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb1555,
    Xrgb8888,
    Rgb565,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Xrgb8888 => 4,
            PixelFormat::Rgb1555 | PixelFormat::Rgb565 => 2,
        }
    }
}

/// Borrowed view of an engine's current screen surface.
#[derive(Debug, Clone, Copy)]
pub struct Surface<'a> {
    pub width: u32,
    pub height: u32,
    /// bytes per row, may exceed `width * 4`
    pub pitch: usize,
    pub pixels: &'a [u8],
}

/// Latest rendered frame, as of the most recent yield of the script context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOutput {
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub pixels: Vec<u8>,
    /// number of frames published so far
    pub serial: u64,
}

impl FrameOutput {
    /// Copy `surface` in, reusing the pixel allocation.
    ///
    /// A surface whose rows are narrower than `width` XRGB8888 pixels, or
    /// whose buffer holds less than `pitch * height` bytes, is rejected and the
    /// previous frame stays current.
    pub fn publish(&mut self, surface: &Surface<'_>) -> bool {
        let row = (surface.width as usize).checked_mul(PixelFormat::Xrgb8888.bytes_per_pixel());
        if row.map_or(true, |row| surface.pitch < row) {
            return false;
        }
        let Some(len) = surface.pitch.checked_mul(surface.height as usize) else {
            return false;
        };
        if surface.pixels.len() < len {
            return false;
        }
        self.width = surface.width;
        self.height = surface.height;
        self.pitch = surface.pitch;
        self.pixels.clear();
        self.pixels.extend_from_slice(&surface.pixels[..len]);
        self.serial += 1;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.serial == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// 0.0 lets the host derive it from width/height
    pub aspect_ratio: f32,
}

impl Geometry {
    pub fn fixed(width: u32, height: u32) -> Self {
        Self {
            base_width: width,
            base_height: height,
            max_width: width,
            max_height: height,
            aspect_ratio: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub fps: f64,
    pub sample_rate: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            fps: GAME_FRAME as f64,
            sample_rate: SAMPLE_RATE as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvInfo {
    pub geometry: Geometry,
    pub timing: Timing,
}
