// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Core lifecycle state machine.
//!
//! `Core` is the one process-scoped value behind a libretro core: the engine,
//! the host frontend, the host bridge and the lifecycle state. The libretro
//! binding keeps exactly one, tests build as many as they like.
//!
//! | State         | Valid operations                         | Transition                      |
//! |---------------|------------------------------------------|---------------------------------|
//! | Uninitialized | `init`                                   | → Initialized                   |
//! | Initialized   | `load_game`                              | ok → GameLoaded, else stays     |
//! | GameLoaded    | `run` (repeatable), `reset`, `unload_game` | `unload_game` → Unloaded      |
//! | Unloaded      | none                                     |                                 |
//!
//! Calls outside their state are no-ops (or report failure), never faults.
//!
//! # Example
//!
//! ```no_run
//! use pixel_retro::{core::Core, testing::{RecordingFrontend, ScriptedEngine}};
//! use std::{path::Path, rc::Rc};
//!
//! let mut core = Core::new(ScriptedEngine::new(640, 480), Rc::new(RecordingFrontend::new()));
//! core.init().unwrap();
//! if core.load_game(Some(Path::new("/content/0.txt"))) {
//!     loop {
//!         core.run();
//!     }
//! }
//! ```

use crate::{
    bridge::{HostBridge, RunOutcome, ScriptPhase},
    config::CoreConfig,
    context::{Resume, Side},
    engine::ScriptEngine,
    error::{CoreError, Result},
    frontend::Frontend,
    log::init_log,
    video::{AvInfo, FrameOutput, Geometry, PixelFormat, Timing},
};
use log::{debug, error, info, warn};
use std::{
    cell::{Ref, RefCell},
    ffi::CStr,
    path::{Path, PathBuf},
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Uninitialized,
    Initialized,
    GameLoaded,
    Unloaded,
}

/// Static description of the core reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    pub library_name: &'static CStr,
    pub library_version: &'static CStr,
    /// '|' separated, without dots
    pub valid_extensions: &'static CStr,
    /// content is loaded by path, never from a host buffer
    pub need_fullpath: bool,
    pub block_extract: bool,
}

pub const SYSTEM_INFO: SystemInfo = SystemInfo {
    library_name: c"onscripter",
    library_version: c"0.2",
    valid_extensions: c"txt|dat|___|ons",
    need_fullpath: true,
    block_extract: false,
};

pub struct Core<E: ScriptEngine + 'static> {
    state: CoreState,
    engine: Rc<RefCell<E>>,
    frontend: Rc<dyn Frontend>,
    config: CoreConfig,
    bridge: Option<HostBridge>,
    reset_pending: bool,
}

impl<E: ScriptEngine + 'static> Core<E> {
    pub fn new(engine: E, frontend: Rc<dyn Frontend>) -> Self {
        Self::with_config(engine, frontend, CoreConfig::default())
    }

    pub fn with_config(engine: E, frontend: Rc<dyn Frontend>, config: CoreConfig) -> Self {
        Self {
            state: CoreState::Uninitialized,
            engine: Rc::new(RefCell::new(engine)),
            frontend,
            config,
            bridge: None,
            reset_pending: false,
        }
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Negotiate with the host and start the script context up to its handshake.
    ///
    /// A refused audio callback only costs sound. A stack that can't be mapped
    /// leaves the core uninitialized.
    pub fn init(&mut self) -> Result<()> {
        if self.state != CoreState::Uninitialized {
            warn!("init called twice, ignored");
            return Err(CoreError::InvalidState("init"));
        }
        init_log(self.config.level(), self.config.log_file.as_deref());
        info!("pixel_retro core init...");

        if !self.frontend.set_pixel_format(PixelFormat::Xrgb8888) {
            warn!("host refused XRGB8888 pixel format");
        }
        if !self.frontend.set_audio_callback() {
            error!("SET_AUDIO_CALLBACK failed, no audio...");
        }

        let mut bridge = HostBridge::new(self.engine.clone(), self.frontend.clone(), self.config.stack_bytes)
            .inspect_err(|e| error!("{}", e))?;
        bridge.handshake();
        debug!("script context parked at handshake");
        self.bridge = Some(bridge);
        self.state = CoreState::Initialized;
        Ok(())
    }

    /// Host-facing load, `false` on any failure.
    pub fn load_game(&mut self, path: Option<&Path>) -> bool {
        match self.try_load_game(path) {
            Ok(()) => true,
            Err(e) => {
                error!("load_game: {}", e);
                false
            }
        }
    }

    pub fn try_load_game(&mut self, path: Option<&Path>) -> Result<()> {
        if self.state != CoreState::Initialized {
            return Err(CoreError::InvalidState("load_game"));
        }
        let path = path.ok_or(CoreError::MissingContent)?;
        let base = base_dir(path);
        let mut engine = self
            .engine
            .try_borrow_mut()
            .map_err(|_| CoreError::InvalidState("load_game"))?;
        engine.set_archive_path(&base);
        let status = engine.open_script();
        if status != 0 {
            return Err(CoreError::ContentRejected(status));
        }
        info!(
            "content loaded from {:?}, screen {}x{}",
            base,
            engine.width(),
            engine.height()
        );
        self.state = CoreState::GameLoaded;
        Ok(())
    }

    /// One host tick. `None` when called outside GameLoaded.
    pub fn run(&mut self) -> Option<RunOutcome> {
        if self.state != CoreState::GameLoaded {
            return None;
        }
        let bridge = self.bridge.as_mut()?;
        let resume = Resume {
            reset: std::mem::take(&mut self.reset_pending),
        };
        let outcome = bridge.on_run(resume);
        if outcome == RunOutcome::Terminated {
            info!("script context terminated, further runs are no-ops");
        }
        Some(outcome)
    }

    /// Reset the engine. While the script context holds the engine the reset
    /// is handed over with the next `run`.
    pub fn reset(&mut self) {
        if self.state != CoreState::GameLoaded {
            return;
        }
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => engine.reset(),
            Err(_) => {
                debug!("engine busy on script stack, reset deferred");
                self.reset_pending = true;
            }
        };
    }

    /// Terminal. The parked script context is never resumed again, its stack
    /// goes away with the core.
    pub fn unload_game(&mut self) {
        if self.state != CoreState::GameLoaded {
            return;
        }
        info!("unload game");
        self.state = CoreState::Unloaded;
    }

    /// Host audio pump callback, returns frames pushed.
    pub fn audio_pull(&mut self) -> usize {
        if !matches!(self.state, CoreState::Initialized | CoreState::GameLoaded) {
            return 0;
        }
        self.bridge.as_mut().map_or(0, |b| b.on_audio_pull())
    }

    /// Host audio set-state callback.
    pub fn set_audio_enabled(&mut self, enabled: bool) {
        if let Some(b) = self.bridge.as_mut() {
            b.set_audio_enabled(enabled);
        }
    }

    /// Geometry from the engine while the host can still reach it, from the
    /// latest frame once the engine runs on the script stack.
    pub fn av_info(&self) -> AvInfo {
        let (w, h) = match self.engine.try_borrow() {
            Ok(engine) => (engine.width(), engine.height()),
            Err(_) => self
                .bridge
                .as_ref()
                .map_or((0, 0), |b| (b.frame().width, b.frame().height)),
        };
        AvInfo {
            geometry: Geometry::fixed(w, h),
            timing: Timing::default(),
        }
    }

    pub fn system_info(&self) -> SystemInfo {
        SYSTEM_INFO
    }

    /// Save states are not supported.
    pub fn serialize_size(&self) -> usize {
        0
    }

    pub fn serialize(&self, _data: &mut [u8]) -> bool {
        false
    }

    pub fn unserialize(&mut self, _data: &[u8]) -> bool {
        false
    }

    pub fn frame(&self) -> Option<Ref<'_, FrameOutput>> {
        self.bridge.as_ref().map(|b| b.frame())
    }

    pub fn phase(&self) -> Option<ScriptPhase> {
        self.bridge.as_ref().map(|b| b.phase())
    }

    pub fn running(&self) -> Side {
        self.bridge.as_ref().map_or(Side::Host, |b| b.running())
    }

    pub fn is_terminated(&self) -> bool {
        self.bridge.as_ref().is_some_and(|b| b.is_terminated())
    }
}

/// Directory holding the content file, "." for a bare file name.
pub fn base_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingFrontend, ScriptedEngine};
    use crate::AUDIO_FRAMES;

    const STORY: &str = "/content/story.txt";

    fn core(engine: ScriptedEngine) -> (Core<ScriptedEngine>, Rc<RecordingFrontend>) {
        let fe = Rc::new(RecordingFrontend::new());
        (Core::new(engine, fe.clone()), fe)
    }

    fn loaded(engine: ScriptedEngine) -> (Core<ScriptedEngine>, Rc<RecordingFrontend>) {
        let (mut c, fe) = core(engine);
        c.init().unwrap();
        assert!(c.load_game(Some(Path::new(STORY))));
        (c, fe)
    }

    #[test]
    fn test_init_negotiates_and_parks_at_handshake() {
        let engine = ScriptedEngine::new(320, 240);
        let probe = engine.probe();
        let (mut c, fe) = core(engine);
        c.init().unwrap();
        assert_eq!(c.state(), CoreState::Initialized);
        assert_eq!(fe.pixel_format(), Some(PixelFormat::Xrgb8888));
        assert!(fe.audio_registered());
        assert_eq!(c.phase(), Some(ScriptPhase::Handshake));
        assert_eq!(probe.init_calls(), 0);
        assert_eq!(c.running(), Side::Host);
        assert!(c.init().is_err());
    }

    #[test]
    fn test_unmappable_stack_leaves_core_uninitialized() {
        let engine = ScriptedEngine::new(8, 8);
        let probe = engine.probe();
        let fe = Rc::new(RecordingFrontend::new());
        let config = CoreConfig {
            stack_bytes: isize::MAX as usize,
            ..CoreConfig::default()
        };
        let mut c = Core::with_config(engine, fe.clone(), config);
        assert!(matches!(c.init(), Err(CoreError::StackAlloc(_))));
        assert_eq!(c.state(), CoreState::Uninitialized);
        assert_eq!(c.phase(), None);

        assert!(!c.load_game(Some(Path::new(STORY))));
        assert_eq!(c.run(), None);
        c.reset();
        c.unload_game();
        assert_eq!(c.audio_pull(), 0);
        assert_eq!(c.state(), CoreState::Uninitialized);
        assert_eq!(probe.open_calls(), 0);
        assert!(fe.frames().is_empty());
    }

    #[test]
    fn test_refused_audio_is_degraded_not_fatal() {
        let fe = Rc::new(RecordingFrontend::refusing_audio());
        let mut c = Core::new(ScriptedEngine::new(8, 8), fe.clone());
        assert!(c.init().is_ok());
        assert!(!fe.audio_registered());
        assert!(c.load_game(Some(Path::new(STORY))));
        assert_eq!(c.run(), Some(RunOutcome::Presented));
    }

    #[test]
    fn test_lifecycle_gating() {
        let (mut c, fe) = core(ScriptedEngine::new(8, 8).accepting("/content"));
        assert!(!c.load_game(Some(Path::new(STORY))));
        assert_eq!(c.run(), None);
        assert_eq!(c.state(), CoreState::Uninitialized);

        c.init().unwrap();
        assert_eq!(c.run(), None);
        assert!(fe.frames().is_empty());
        assert!(!c.load_game(None));
        assert!(!c.load_game(Some(Path::new("/broken/story.txt"))));
        assert_eq!(c.state(), CoreState::Initialized);

        assert!(c.load_game(Some(Path::new(STORY))));
        assert_eq!(c.state(), CoreState::GameLoaded);
        assert!(!c.load_game(Some(Path::new("/broken/story.txt"))));
        assert_eq!(c.state(), CoreState::GameLoaded);
    }

    #[test]
    fn test_archive_path_is_base_dir() {
        let engine = ScriptedEngine::new(8, 8);
        let probe = engine.probe();
        let _ = loaded(engine);
        assert_eq!(probe.archive(), Some(PathBuf::from("/content")));
        assert_eq!(base_dir(Path::new("story.txt")), PathBuf::from("."));
    }

    #[test]
    fn test_five_runs_keep_dimensions() {
        let engine = ScriptedEngine::new(640, 480);
        let probe = engine.probe();
        let (mut c, fe) = loaded(engine);
        for _ in 0..5 {
            assert_eq!(c.run(), Some(RunOutcome::Presented));
        }
        assert_eq!(probe.init_calls(), 1);
        assert_eq!(probe.frames(), 5);
        let frames = fe.frames();
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|f| f.width == 640 && f.height == 480));
        assert_eq!(frames.iter().map(|f| f.serial).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        let info = c.av_info();
        assert_eq!((info.geometry.base_width, info.geometry.base_height), (640, 480));
        assert_eq!(info.timing.fps, 60.0);
    }

    #[test]
    fn test_av_info_before_first_run_reads_engine() {
        let (c, _) = loaded(ScriptedEngine::new(800, 600));
        let info = c.av_info();
        assert_eq!(info.geometry, Geometry::fixed(800, 600));
        assert_eq!(info.timing.sample_rate, 44100.0);
    }

    #[test]
    fn test_runs_after_termination_are_noops() {
        let (mut c, fe) = loaded(ScriptedEngine::new(16, 16).frames(3));
        let mut outcomes = vec![];
        for _ in 0..4 {
            outcomes.extend(c.run());
        }
        assert_eq!(outcomes.last(), Some(&RunOutcome::Terminated));
        assert!(c.is_terminated());
        let before = c.frame().map(|f| f.clone());
        let presented = fe.frames().len();
        let polls = fe.polls();

        for _ in 0..100 {
            assert_eq!(c.run(), Some(RunOutcome::Skipped));
        }
        assert_eq!(c.frame().map(|f| f.clone()), before);
        assert_eq!(fe.frames().len(), presented);
        assert_eq!(fe.polls(), polls);
    }

    #[test]
    fn test_engine_init_failure() {
        let engine = ScriptedEngine::new(16, 16).failing_init();
        let probe = engine.probe();
        let (mut c, _) = loaded(engine);
        assert_eq!(c.run(), Some(RunOutcome::Terminated));
        assert_eq!(probe.init_calls(), 1);
        assert_eq!(probe.frames(), 0);
        assert_eq!(c.phase(), Some(ScriptPhase::Finished));
        for _ in 0..10 {
            assert_eq!(c.run(), Some(RunOutcome::Skipped));
        }
    }

    #[test]
    fn test_reset_before_first_run_is_direct() {
        let engine = ScriptedEngine::new(8, 8);
        let probe = engine.probe();
        let (mut c, _) = loaded(engine);
        c.reset();
        assert_eq!(probe.reset_calls(), 1);
        assert_eq!(c.state(), CoreState::GameLoaded);
    }

    #[test]
    fn test_reset_while_running_is_delivered_on_next_run() {
        let engine = ScriptedEngine::new(8, 8);
        let probe = engine.probe();
        let (mut c, fe) = loaded(engine);
        c.run();
        c.run();
        assert_eq!(fe.frames().last().map(|f| f.first_byte), Some(2));

        c.reset();
        assert_eq!(probe.reset_calls(), 0);
        c.run();
        assert_eq!(probe.reset_calls(), 1);
        // engine restarted its frame counter before drawing the next frame
        assert_eq!(fe.frames().last().map(|f| f.first_byte), Some(1));
        c.run();
        assert_eq!(probe.reset_calls(), 1);
    }

    #[test]
    fn test_serialization_unsupported() {
        let (mut c, _) = core(ScriptedEngine::new(8, 8));
        assert_eq!(c.serialize_size(), 0);
        assert!(!c.serialize(&mut []));
        assert!(!c.unserialize(&[]));
        c.init().unwrap();
        c.load_game(Some(Path::new(STORY)));
        let mut buf = vec![0u8; 4096];
        assert_eq!(c.serialize_size(), 0);
        assert!(!c.serialize(&mut buf));
        assert!(!c.unserialize(&buf));
    }

    #[test]
    fn test_audio_pull_through_core() {
        let (mut c, fe) = loaded(ScriptedEngine::new(8, 8).with_mixer(100));
        // mixer is registered by engine init, on the first run
        assert_eq!(c.audio_pull(), 0);
        c.run();
        assert_eq!(c.audio_pull(), AUDIO_FRAMES);
        let batches = fe.audio_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].1, 256);

        c.set_audio_enabled(false);
        assert_eq!(c.audio_pull(), 0);
        assert_eq!(fe.audio_batches().len(), 1);
    }

    #[test]
    fn test_unload_is_terminal() {
        let (mut c, fe) = loaded(ScriptedEngine::new(8, 8).with_mixer(64));
        c.run();
        c.unload_game();
        assert_eq!(c.state(), CoreState::Unloaded);
        assert_eq!(c.run(), None);
        assert_eq!(c.audio_pull(), 0);
        c.reset();
        c.unload_game();
        assert_eq!(c.state(), CoreState::Unloaded);
        assert_eq!(fe.frames().len(), 1);
    }

    #[test]
    fn test_input_reaches_running_engine() {
        use crate::frontend::Joypad;
        let engine = ScriptedEngine::new(8, 8);
        let probe = engine.probe();
        let (mut c, fe) = loaded(engine);
        c.run();
        fe.press(Joypad::A | Joypad::LEFT);
        c.run();
        assert_eq!(probe.last_pad(), Joypad::A | Joypad::LEFT);
    }

    #[test]
    fn test_single_active_context_over_many_switches() {
        let engine = ScriptedEngine::new(4, 4);
        let probe = engine.probe();
        let (mut c, _) = loaded(engine);
        for _ in 0..10_000 {
            assert_eq!(c.run(), Some(RunOutcome::Presented));
            assert_eq!(c.running(), Side::Host);
        }
        assert_eq!(probe.frames(), 10_000);
        assert_eq!(probe.violations(), 0);
    }
}
