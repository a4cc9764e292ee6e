// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Null implementations of both collaborators, for exercising a core without a
//! real host or interpreter.
//!
//! `ScriptedEngine` behaves like a blocking interpreter that renders a solid
//! frame per tick. Everything it observes is mirrored into a shared
//! `ScriptProbe`, because once the engine runs it belongs to the script context
//! and can't be inspected directly. `RecordingFrontend` records every call the
//! core makes to the host.

use crate::{
    audio::AUDIO_BLOCK_BYTES,
    context::Side,
    engine::{ScriptEngine, ScriptSystem},
    error::EngineError,
    frontend::{Frontend, Joypad, DEVICE_JOYPAD},
    video::{FrameOutput, PixelFormat, Surface},
};
use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
    rc::Rc,
};

/// Counters shared between a `ScriptedEngine` and the test that built it.
#[derive(Debug, Default)]
pub struct ScriptProbe {
    init_calls: Cell<u32>,
    open_calls: Cell<u32>,
    reset_calls: Cell<u32>,
    frames: Cell<u64>,
    /// frames rendered while the pair did not report the script side running
    violations: Cell<u64>,
    archive: RefCell<Option<PathBuf>>,
    last_pad: Cell<Joypad>,
}

impl ScriptProbe {
    pub fn init_calls(&self) -> u32 {
        self.init_calls.get()
    }
    pub fn open_calls(&self) -> u32 {
        self.open_calls.get()
    }
    pub fn reset_calls(&self) -> u32 {
        self.reset_calls.get()
    }
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }
    pub fn violations(&self) -> u64 {
        self.violations.get()
    }
    pub fn archive(&self) -> Option<PathBuf> {
        self.archive.borrow().clone()
    }
    pub fn last_pad(&self) -> Joypad {
        self.last_pad.get()
    }
}

pub struct ScriptedEngine {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// frames to render before the script completes, `None` runs forever
    frames: Option<u64>,
    frame_no: u64,
    fail_init: bool,
    accept: Option<PathBuf>,
    mixer_bytes: Option<usize>,
    short_surface: bool,
    archive: Option<PathBuf>,
    probe: Rc<ScriptProbe>,
}

impl ScriptedEngine {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
            frames: None,
            frame_no: 0,
            fail_init: false,
            accept: None,
            mixer_bytes: None,
            short_surface: false,
            archive: None,
            probe: Rc::new(ScriptProbe::default()),
        }
    }

    /// Complete the script after `n` frames.
    pub fn frames(mut self, n: u64) -> Self {
        self.frames = Some(n);
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Only accept content whose base directory is `dir`.
    pub fn accepting(mut self, dir: impl Into<PathBuf>) -> Self {
        self.accept = Some(dir.into());
        self
    }

    /// Open a playing audio device whose mixer writes `bytes` bytes of 0x40.
    pub fn with_mixer(mut self, bytes: usize) -> Self {
        self.mixer_bytes = Some(bytes.min(AUDIO_BLOCK_BYTES));
        self
    }

    /// Hand out a surface buffer holding only half of `pitch * height` bytes.
    pub fn short_surface(mut self) -> Self {
        self.short_surface = true;
        self
    }

    pub fn probe(&self) -> Rc<ScriptProbe> {
        self.probe.clone()
    }
}

impl ScriptEngine for ScriptedEngine {
    fn set_archive_path(&mut self, path: &Path) {
        self.archive = Some(path.to_path_buf());
        *self.probe.archive.borrow_mut() = Some(path.to_path_buf());
    }

    fn open_script(&mut self) -> i32 {
        self.probe.open_calls.set(self.probe.open_calls.get() + 1);
        match (&self.archive, &self.accept) {
            (None, _) => -1,
            (Some(dir), Some(accept)) if dir != accept => 1,
            _ => 0,
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn surface(&self) -> Surface<'_> {
        Surface {
            width: self.width,
            height: self.height,
            pitch: self.width as usize * 4,
            pixels: if self.short_surface {
                &self.pixels[..self.pixels.len() / 2]
            } else {
                &self.pixels
            },
        }
    }

    fn init(&mut self, sys: &mut ScriptSystem<'_>) -> Result<(), EngineError> {
        self.probe.init_calls.set(self.probe.init_calls.get() + 1);
        if self.fail_init {
            return Err(EngineError::Init("scripted failure".into()));
        }
        if let Some(bytes) = self.mixer_bytes {
            sys.open_audio(Box::new(move |buf: &mut [u8]| {
                let n = bytes.min(buf.len());
                buf[..n].fill(0x40);
                n
            }));
            sys.pause_audio(false);
        }
        Ok(())
    }

    fn execute_label(&mut self, sys: &mut ScriptSystem<'_>) {
        loop {
            if self.frames.is_some_and(|n| self.frame_no >= n) {
                break;
            }
            self.frame_no += 1;
            self.probe.frames.set(self.probe.frames.get() + 1);
            if sys.running() != Side::Script {
                self.probe.violations.set(self.probe.violations.get() + 1);
            }
            self.probe.last_pad.set(sys.joypad(0));
            self.pixels.fill(self.frame_no as u8);
            sys.flip(self);
        }
    }

    fn reset(&mut self) {
        self.probe.reset_calls.set(self.probe.reset_calls.get() + 1);
        self.frame_no = 0;
        self.pixels.fill(0);
    }
}

/// What the host saw of one presented frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentedFrame {
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub serial: u64,
    pub first_byte: u8,
}

pub struct RecordingFrontend {
    accept_audio: bool,
    pixel_format: Cell<Option<PixelFormat>>,
    audio_registered: Cell<bool>,
    polls: Cell<u32>,
    pressed: Cell<Joypad>,
    frames: RefCell<Vec<PresentedFrame>>,
    batches: RefCell<Vec<(Vec<i16>, usize)>>,
}

impl Default for RecordingFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingFrontend {
    pub fn new() -> Self {
        Self {
            accept_audio: true,
            pixel_format: Cell::new(None),
            audio_registered: Cell::new(false),
            polls: Cell::new(0),
            pressed: Cell::new(Joypad::empty()),
            frames: RefCell::new(vec![]),
            batches: RefCell::new(vec![]),
        }
    }

    /// A host that refuses the audio callback.
    pub fn refusing_audio() -> Self {
        Self {
            accept_audio: false,
            ..Self::new()
        }
    }

    pub fn press(&self, pad: Joypad) {
        self.pressed.set(pad);
    }

    pub fn pixel_format(&self) -> Option<PixelFormat> {
        self.pixel_format.get()
    }

    pub fn audio_registered(&self) -> bool {
        self.audio_registered.get()
    }

    pub fn polls(&self) -> u32 {
        self.polls.get()
    }

    pub fn frames(&self) -> Vec<PresentedFrame> {
        self.frames.borrow().clone()
    }

    pub fn audio_batches(&self) -> Vec<(Vec<i16>, usize)> {
        self.batches.borrow().clone()
    }
}

impl Frontend for RecordingFrontend {
    fn set_pixel_format(&self, format: PixelFormat) -> bool {
        self.pixel_format.set(Some(format));
        true
    }

    fn set_audio_callback(&self) -> bool {
        self.audio_registered.set(self.accept_audio);
        self.accept_audio
    }

    fn video_refresh(&self, frame: &FrameOutput) {
        self.frames.borrow_mut().push(PresentedFrame {
            width: frame.width,
            height: frame.height,
            pitch: frame.pitch,
            serial: frame.serial,
            first_byte: frame.pixels.first().copied().unwrap_or(0),
        });
    }

    fn input_poll(&self) {
        self.polls.set(self.polls.get() + 1);
    }

    fn input_state(&self, port: u32, device: u32, _index: u32, id: u32) -> i16 {
        if port != 0 || device != DEVICE_JOYPAD || id >= 16 {
            return 0;
        }
        self.pressed.get().contains(Joypad::from_bits_retain(1 << id)) as i16
    }

    fn audio_sample_batch(&self, samples: &[i16], frames: usize) -> usize {
        self.batches.borrow_mut().push((samples.to_vec(), frames));
        frames
    }
}
