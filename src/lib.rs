// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! pixel_retro runs a blocking script interpreter as a libretro core.
//!
//! The interpreter wants to own its thread and loop forever: run script
//! commands, draw, flip, repeat. A libretro host wants the opposite: it calls
//! `retro_run` once per frame and expects every call to return quickly.
//!
//! pixel_retro sits in between. The interpreter runs on its own stack inside a
//! stackful coroutine. Every frame flip becomes a yield back to the host, every
//! `retro_run` a resume. Audio is pulled by the host independently of video and
//! never switches stacks.
//!
//! Modules:
//! - context, coroutine: the execution context pair and its lifecycle
//! - bridge: host polling calls to context switches
//! - core: lifecycle state machine (init, load, run, reset, unload)
//! - audio, video: audio frame bridge, frame and geometry types
//! - engine, frontend: the two boundaries, interpreter and host
//! - retro: libretro C ABI binding and the `retro_core!` macro
//!
//! A core crate only provides an engine:
//!
//! ```ignore
//! // crate-type = ["cdylib"]
//! pixel_retro::retro_core!(MyInterpreter::new());
//! ```

/// framerate reported to the host
pub const GAME_FRAME: u32 = 60;

/// audio sample rate reported to the host
pub const SAMPLE_RATE: u32 = 44100;

/// stereo frames pushed per audio pull
pub const AUDIO_FRAMES: usize = 256;

/// retro_core! macro
mod macros;

/// audio device opened by the engine and the pull-model audio bridge
pub mod audio;

/// host bridge, turns host ticks into context switches
pub mod bridge;

/// core.toml style configuration
pub mod config;

/// execution context pair on top of a stackful coroutine
pub mod context;

/// lifecycle state machine
pub mod core;

/// script coroutine lifecycle, stack reclaimed exactly once
pub mod coroutine;

/// interpreter boundary
pub mod engine;

pub mod error;

/// host boundary
pub mod frontend;

/// log
pub mod log;

/// libretro ABI types, callbacks and exports
pub mod retro;

/// null engine and recording host
pub mod testing;

/// frame output, geometry and timing
pub mod video;

pub use crate::core::{Core, CoreState};
pub use crate::engine::{ScriptEngine, ScriptSystem};
pub use crate::error::{CoreError, EngineError};
pub use crate::frontend::{Frontend, Joypad};
