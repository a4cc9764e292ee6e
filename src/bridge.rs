// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Host bridge, converts host polling calls into context switches.
//!
//! ```text
//!   host                 HostBridge                    script context
//! ┌────────────┐      ┌────────────────┐            ┌──────────────────┐
//! │ run()      │─────►│ on_run         │──switch───►│ engine runs one  │
//! │            │      │                │◄──yield────│ frame, flip()    │
//! │            │      │ input_poll     │            └──────────────────┘
//! │            │      │ present frame  │
//! │ audio pump │─────►│ on_audio_pull  │── mixer (no switch)
//! └────────────┘      └────────────────┘
//! ```
//!
//! Host and script share an `Exchange`: the frame published at the last yield,
//! the script phase and the audio device. The engine itself is lent to the script
//! context for as long as it runs.

use crate::{
    audio::{AudioBridge, AudioDevice},
    context::{Resume, ScriptContext, Side, Switch},
    coroutine::ScriptCoroutine,
    engine::{ScriptEngine, ScriptSystem},
    error::Result,
    frontend::Frontend,
    video::FrameOutput,
};
use log::{error, info};
use std::{
    cell::{Cell, Ref, RefCell},
    rc::Rc,
};

/// Progress of the script context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPhase {
    /// stack bound, entry not yet run
    Created,
    /// parked at the start-up handshake
    Handshake,
    /// engine one-time init in progress
    Initializing,
    /// inside the engine's main loop
    Running,
    Finished,
}

/// State shared by the host bridge and the script context.
pub(crate) struct Exchange {
    pub(crate) frame: RefCell<FrameOutput>,
    pub(crate) phase: Cell<ScriptPhase>,
    pub(crate) audio: AudioDevice,
    pub(crate) frontend: Rc<dyn Frontend>,
}

impl Exchange {
    fn new(frontend: Rc<dyn Frontend>) -> Self {
        Self {
            frame: RefCell::new(FrameOutput::default()),
            phase: Cell::new(ScriptPhase::Created),
            audio: AudioDevice::new(),
            frontend,
        }
    }
}

/// What a single `on_run` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// script yielded a frame, which was presented
    Presented,
    /// script finished during this call, its last frame was presented
    Terminated,
    /// script had already finished, nothing happened
    Skipped,
}

pub struct HostBridge {
    coroutine: ScriptCoroutine,
    exchange: Rc<Exchange>,
    audio: AudioBridge,
}

impl HostBridge {
    /// Bind the engine to a fresh script context of `stack_bytes`. Nothing runs yet.
    pub fn new<E>(engine: Rc<RefCell<E>>, frontend: Rc<dyn Frontend>, stack_bytes: usize) -> Result<Self>
    where
        E: ScriptEngine + 'static,
    {
        let exchange = Rc::new(Exchange::new(frontend));
        let script_exchange = exchange.clone();
        let coroutine = ScriptCoroutine::start(
            move |ctx, _| script_main(ctx, &engine, &script_exchange),
            stack_bytes,
        )?;
        Ok(Self {
            coroutine,
            exchange,
            audio: AudioBridge::new(),
        })
    }

    /// First switch into the script, which parks itself right away.
    pub fn handshake(&mut self) -> Switch {
        self.coroutine.resume(Resume::default())
    }

    /// One host tick: run the script to its next yield, then poll input and
    /// present the frame.
    pub fn on_run(&mut self, resume: Resume) -> RunOutcome {
        if self.coroutine.is_terminated() {
            return RunOutcome::Skipped;
        }
        let switch = self.coroutine.resume(resume);
        self.exchange.frontend.input_poll();
        self.on_video_present();
        match switch {
            Switch::Suspended => RunOutcome::Presented,
            Switch::Finished => RunOutcome::Terminated,
        }
    }

    /// Forward the latest frame to the host. Nothing is sent before the first
    /// frame has been published.
    pub fn on_video_present(&self) {
        let Ok(frame) = self.exchange.frame.try_borrow() else {
            return;
        };
        if !frame.is_empty() {
            self.exchange.frontend.video_refresh(&frame);
        }
    }

    /// Host audio pump callback, returns frames pushed.
    pub fn on_audio_pull(&mut self) -> usize {
        self.audio.pull(&self.exchange.audio, &*self.exchange.frontend)
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio.set_enabled(enabled);
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio.enabled()
    }

    pub fn frame(&self) -> Ref<'_, FrameOutput> {
        self.exchange.frame.borrow()
    }

    pub fn phase(&self) -> ScriptPhase {
        self.exchange.phase.get()
    }

    pub fn running(&self) -> Side {
        self.coroutine.running()
    }

    pub fn is_terminated(&self) -> bool {
        self.coroutine.is_terminated()
    }
}

/// Entry of the script context.
fn script_main<E: ScriptEngine>(ctx: &ScriptContext<'_>, engine: &RefCell<E>, exchange: &Exchange) {
    exchange.phase.set(ScriptPhase::Handshake);
    ctx.switch_to_host();

    exchange.phase.set(ScriptPhase::Initializing);
    let Ok(mut engine) = engine.try_borrow_mut() else {
        error!("script engine is borrowed by the host, cannot start");
        exchange.phase.set(ScriptPhase::Finished);
        return;
    };
    let mut sys = ScriptSystem::new(ctx, exchange);
    if let Err(e) = engine.init(&mut sys) {
        error!("Failed to initialize script engine: {}", e);
        exchange.phase.set(ScriptPhase::Finished);
        return;
    }

    exchange.phase.set(ScriptPhase::Running);
    info!("script engine initialized, entering main loop");
    engine.execute_label(&mut sys);
    exchange.phase.set(ScriptPhase::Finished);
    info!("script completed");
}
