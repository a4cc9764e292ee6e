// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Audio module: the device the engine opens and the pull bridge the host drives.
//!
//! The engine registers a mixer through `ScriptSystem::open_audio`, the same way
//! an SDL program hands its callback to `SDL_OpenAudio`. The host then pulls fixed
//! blocks of 256 stereo frames from its own audio pump, independent of video:
//!
//! ```text
//!  host audio pump ──► AudioBridge::pull ──► mixer(&mut [u8; 1024]) ──► batch sink
//!                         │                                   (always 256 frames)
//!                         └─ muted / not playing: nothing is pushed
//! ```
//!
//! Mixer output is taken as native-endian signed 16-bit stereo at 44100 Hz, no
//! conversion is done.

use crate::{frontend::Frontend, AUDIO_FRAMES};
use log::trace;
use std::cell::{Cell, RefCell};

/// Size in bytes of one pulled block (stereo, 16-bit).
pub const AUDIO_BLOCK_BYTES: usize = AUDIO_FRAMES * 4;

/// Fills up to `buf.len()` bytes, returns the number of bytes written.
pub type Mixer = Box<dyn FnMut(&mut [u8]) -> usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    Stopped,
    Playing,
    Paused,
}

/// Audio device shared by the engine (which opens, pauses and closes it) and the
/// audio bridge (which pulls from it).
pub struct AudioDevice {
    mixer: RefCell<Option<Mixer>>,
    status: Cell<AudioStatus>,
}

impl Default for AudioDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice {
    pub fn new() -> Self {
        Self {
            mixer: RefCell::new(None),
            status: Cell::new(AudioStatus::Stopped),
        }
    }

    /// Install `mixer`. The device starts paused.
    pub fn open(&self, mixer: Mixer) {
        *self.mixer.borrow_mut() = Some(mixer);
        self.status.set(AudioStatus::Paused);
    }

    pub fn pause(&self, paused: bool) {
        if self.is_open() {
            self.status.set(if paused {
                AudioStatus::Paused
            } else {
                AudioStatus::Playing
            });
        }
    }

    pub fn close(&self) {
        *self.mixer.borrow_mut() = None;
        self.status.set(AudioStatus::Stopped);
    }

    pub fn is_open(&self) -> bool {
        self.mixer.borrow().is_some()
    }

    pub fn status(&self) -> AudioStatus {
        self.status.get()
    }

    /// Run the mixer into `buf`. `None` if no mixer is installed or it is busy.
    fn mix(&self, buf: &mut [u8]) -> Option<usize> {
        let mut mixer = self.mixer.try_borrow_mut().ok()?;
        mixer.as_mut().map(|m| m(buf))
    }
}

/// Pull side of the audio path, owned by the host bridge.
pub struct AudioBridge {
    block: [i16; AUDIO_FRAMES * 2],
    enabled: bool,
}

impl Default for AudioBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBridge {
    pub fn new() -> Self {
        Self {
            block: [0; AUDIO_FRAMES * 2],
            enabled: true,
        }
    }

    /// Host audio set-state callback.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Fill one block and push it to the host.
    ///
    /// Returns the frames pushed: `AUDIO_FRAMES`, or 0 when nothing was pushed
    /// (muted, device not playing, no mixer).
    pub fn pull(&mut self, device: &AudioDevice, frontend: &dyn Frontend) -> usize {
        if !self.enabled || device.status() != AudioStatus::Playing {
            return 0;
        }
        self.block.fill(0);
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.block[..]);
        let Some(written) = device.mix(bytes) else {
            return 0;
        };
        if written < AUDIO_BLOCK_BYTES {
            trace!("mixer underrun: {} of {} bytes", written, AUDIO_BLOCK_BYTES);
        }
        frontend.audio_sample_batch(&self.block, AUDIO_FRAMES);
        AUDIO_FRAMES
    }
}
