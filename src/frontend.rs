// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Host frontend boundary.
//!
//! The core talks to the host only through this trait. The libretro binding
//! implements it on top of the C callbacks the host installs, tests implement it
//! with a recorder. Every method takes `&self`: the frontend is shared between
//! the host context and the script context (the engine queries input while it
//! runs), and both live on one thread.

use crate::video::{FrameOutput, PixelFormat};
use bitflags::bitflags;

/// Joypad device id used in `input_state` queries.
pub const DEVICE_JOYPAD: u32 = 1;

bitflags! {
    /// Joypad buttons, bit index == libretro joypad id.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Joypad: u16 {
        const B      = 1 << 0;
        const Y      = 1 << 1;
        const SELECT = 1 << 2;
        const START  = 1 << 3;
        const UP     = 1 << 4;
        const DOWN   = 1 << 5;
        const LEFT   = 1 << 6;
        const RIGHT  = 1 << 7;
        const A      = 1 << 8;
        const X      = 1 << 9;
        const L      = 1 << 10;
        const R      = 1 << 11;
        const L2     = 1 << 12;
        const R2     = 1 << 13;
        const L3     = 1 << 14;
        const R3     = 1 << 15;
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Joypad::empty()
    }
}

pub trait Frontend {
    /// Ask the host to accept `format` for video frames.
    fn set_pixel_format(&self, format: PixelFormat) -> bool;

    /// Register the pull-model audio callback. `false` means the host refused
    /// and the core runs without sound.
    fn set_audio_callback(&self) -> bool;

    /// Deliver one frame.
    fn video_refresh(&self, frame: &FrameOutput);

    /// Latch host input for the current tick.
    fn input_poll(&self);

    fn input_state(&self, port: u32, device: u32, index: u32, id: u32) -> i16;

    /// Push interleaved stereo samples, returns frames consumed.
    fn audio_sample_batch(&self, samples: &[i16], frames: usize) -> usize;

    /// All joypad buttons of `port` at once.
    fn joypad(&self, port: u32) -> Joypad {
        (0..16u32)
            .filter(|id| self.input_state(port, DEVICE_JOYPAD, 0, *id) != 0)
            .fold(Joypad::empty(), |pad, id| pad | Joypad::from_bits_retain(1 << id))
    }
}
