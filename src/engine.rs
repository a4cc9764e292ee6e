// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Script engine boundary.
//!
//! A script engine is a blocking interpreter: once `execute_label` is entered it
//! keeps control until the script ends. It runs on the script context's own
//! stack, so every time it finishes a frame it calls `ScriptSystem::flip`, which
//! publishes the frame and suspends the script context until the host's next
//! `run`. From the engine's point of view `flip` is just a slow present call.
//!
//! ```text
//! fn execute_label(&mut self, sys: &mut ScriptSystem<'_>) {
//!     while !self.done {
//!         self.step_script();
//!         self.render();
//!         sys.flip(self);      // host gets this frame, engine resumes next tick
//!     }
//! }
//! ```

use crate::{
    audio::{AudioStatus, Mixer},
    bridge::Exchange,
    context::{ScriptContext, Side},
    error::EngineError,
    frontend::Joypad,
    video::Surface,
};
use log::{info, warn};
use std::path::Path;

/// The interpreter collaborator.
///
/// Host-side calls (`set_archive_path`, `open_script`, `width`, `height`,
/// `reset`) only happen while the engine is not running on the script stack.
/// Once `init` has been entered the engine belongs to the script context and the
/// core reaches it only through `ScriptSystem`.
pub trait ScriptEngine {
    /// Directory the engine searches for its script and archives.
    fn set_archive_path(&mut self, path: &Path);

    /// Open and validate the script under the archive path.
    ///
    /// # Returns
    /// 0 on success, any other value rejects the content.
    fn open_script(&mut self) -> i32;

    /// Screen width in pixels, valid after a successful `open_script`.
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Current screen surface, XRGB8888.
    fn surface(&self) -> Surface<'_>;

    /// One-time initialization, runs on the script stack before `execute_label`.
    /// The engine opens its audio device here.
    fn init(&mut self, sys: &mut ScriptSystem<'_>) -> Result<(), EngineError>;

    /// Main script loop. Calls `sys.flip(self)` after every rendered frame and
    /// returns when the script completes.
    fn execute_label(&mut self, sys: &mut ScriptSystem<'_>);

    /// Restart the script from its beginning.
    fn reset(&mut self);
}

impl<E: ScriptEngine + ?Sized> ScriptEngine for Box<E> {
    fn set_archive_path(&mut self, path: &Path) {
        (**self).set_archive_path(path)
    }
    fn open_script(&mut self) -> i32 {
        (**self).open_script()
    }
    fn width(&self) -> u32 {
        (**self).width()
    }
    fn height(&self) -> u32 {
        (**self).height()
    }
    fn surface(&self) -> Surface<'_> {
        (**self).surface()
    }
    fn init(&mut self, sys: &mut ScriptSystem<'_>) -> Result<(), EngineError> {
        (**self).init(sys)
    }
    fn execute_label(&mut self, sys: &mut ScriptSystem<'_>) {
        (**self).execute_label(sys)
    }
    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Services available to the engine while it runs on the script stack.
pub struct ScriptSystem<'a> {
    ctx: &'a ScriptContext<'a>,
    exchange: &'a Exchange,
}

impl<'a> ScriptSystem<'a> {
    pub(crate) fn new(ctx: &'a ScriptContext<'a>, exchange: &'a Exchange) -> Self {
        Self { ctx, exchange }
    }

    /// Publish the engine's surface as the current frame and yield to the host.
    /// A malformed surface is dropped and the host sees the previous frame again.
    ///
    /// Returns on the host's next `run`. A reset requested by the host in the
    /// meantime has already been applied to `engine` when this returns.
    pub fn flip<E: ScriptEngine + ?Sized>(&mut self, engine: &mut E) {
        let surface = engine.surface();
        if !self.exchange.frame.borrow_mut().publish(&surface) {
            warn!(
                "surface {}x{} pitch {} with {} bytes rejected",
                surface.width,
                surface.height,
                surface.pitch,
                surface.pixels.len()
            );
        }
        let resume = self.ctx.switch_to_host();
        if resume.reset {
            info!("applying deferred reset");
            engine.reset();
        }
    }

    pub fn input_state(&self, port: u32, device: u32, index: u32, id: u32) -> i16 {
        self.exchange.frontend.input_state(port, device, index, id)
    }

    pub fn joypad(&self, port: u32) -> Joypad {
        self.exchange.frontend.joypad(port)
    }

    /// Register the engine's mixer. The device starts paused.
    pub fn open_audio(&mut self, mixer: Mixer) {
        self.exchange.audio.open(mixer);
    }

    pub fn pause_audio(&mut self, paused: bool) {
        self.exchange.audio.pause(paused);
    }

    pub fn close_audio(&mut self) {
        self.exchange.audio.close();
    }

    pub fn audio_status(&self) -> AudioStatus {
        self.exchange.audio.status()
    }

    /// Frames published so far.
    pub fn frame_serial(&self) -> u64 {
        self.exchange.frame.borrow().serial
    }

    pub fn running(&self) -> Side {
        self.ctx.running()
    }
}
