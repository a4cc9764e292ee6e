// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Bodies of the `retro_*` exports.
//!
//! The host drives exactly one core per process through free functions, so the
//! core lives in a thread-local slot. Every export borrows the slot for the
//! length of the call; a call that finds it already borrowed (a host calling
//! back into the core from one of its own callbacks) is dropped.

use super::{abi::*, callbacks};
use crate::{
    config::CoreConfig,
    core::{Core, CoreState},
    engine::ScriptEngine,
    log::init_log,
    video::{AvInfo, Geometry, Timing},
};
use log::{error, info, warn, LevelFilter};
use std::{
    cell::RefCell,
    ffi::{c_uint, c_void, CStr},
    path::Path,
    rc::Rc,
};

pub type RetroCore = Core<Box<dyn ScriptEngine>>;

thread_local! {
    static CORE: RefCell<Option<RetroCore>> = const { RefCell::new(None) };
}

/// Run `f` on the process core. `None` without a core or when re-entered.
pub fn with_core<R>(f: impl FnOnce(&mut RetroCore) -> R) -> Option<R> {
    CORE.try_with(|slot| {
        let mut guard = slot.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
    .ok()
    .flatten()
}

pub fn api_version() -> c_uint {
    RETRO_API_VERSION
}

pub fn set_environment(cb: Option<retro_environment_t>) {
    callbacks::set_environment(cb);
    callbacks::install_log_interface();
}

/// # Safety
/// `info` must be null or point to writable `retro_system_info`.
pub unsafe fn get_system_info(info: *mut retro_system_info) {
    let Some(info) = info.as_mut() else {
        return;
    };
    let si = crate::core::SYSTEM_INFO;
    info.library_name = si.library_name.as_ptr();
    info.library_version = si.library_version.as_ptr();
    info.valid_extensions = si.valid_extensions.as_ptr();
    info.need_fullpath = si.need_fullpath;
    info.block_extract = si.block_extract;
}

pub fn av_info() -> AvInfo {
    with_core(|core| core.av_info()).unwrap_or(AvInfo {
        geometry: Geometry::fixed(0, 0),
        timing: Timing::default(),
    })
}

/// # Safety
/// `info` must be null or point to writable `retro_system_av_info`.
pub unsafe fn get_system_av_info(info: *mut retro_system_av_info) {
    let Some(info) = info.as_mut() else {
        return;
    };
    let av = av_info();
    *info = retro_system_av_info {
        geometry: retro_game_geometry {
            base_width: av.geometry.base_width,
            base_height: av.geometry.base_height,
            max_width: av.geometry.max_width,
            max_height: av.geometry.max_height,
            aspect_ratio: av.geometry.aspect_ratio,
        },
        timing: retro_system_timing {
            fps: av.timing.fps,
            sample_rate: av.timing.sample_rate,
        },
    };
}

/// Build the process core around `engine` and start it up to its handshake.
/// A failed start leaves an uninitialized core, on which every later call is
/// a no-op and which the next `retro_init` replaces. A started core is never
/// replaced: a second `retro_init` is ignored.
pub fn init(engine: Box<dyn ScriptEngine>) {
    let started = CORE
        .try_with(|slot| match slot.try_borrow() {
            Ok(guard) => guard.as_ref().map(|c| c.state() != CoreState::Uninitialized),
            Err(_) => Some(true),
        })
        .unwrap_or(Some(true));
    if started == Some(true) {
        warn!("retro_init called on a running core, ignored");
        return;
    }

    // config problems are reported before the configured logger exists
    init_log(LevelFilter::Info, None);
    let config = CoreConfig::load(callbacks::system_directory().as_deref());
    let mut core = Core::with_config(engine, Rc::new(callbacks::CallbackFrontend), config);
    if let Err(e) = core.init() {
        error!("retro_init failed: {}", e);
    }
    let stored = CORE.try_with(|slot| match slot.try_borrow_mut() {
        Ok(mut guard) => {
            *guard = Some(core);
            true
        }
        Err(_) => false,
    });
    if !matches!(stored, Ok(true)) {
        warn!("retro_init re-entered, ignored");
    }
}

/// Drop the core, which releases the script stack.
pub fn deinit() {
    let core = CORE
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut g| g.take()))
        .ok()
        .flatten();
    if core.is_some() {
        info!("retro_deinit");
    }
    drop(core);
}

/// # Safety
/// `game` must be null or point to a valid `retro_game_info` whose `path` is
/// null or a NUL terminated string.
pub unsafe fn load_game(game: *const retro_game_info) -> bool {
    let path = game
        .as_ref()
        .filter(|g| !g.path.is_null())
        .and_then(|g| CStr::from_ptr(g.path).to_str().ok());
    with_core(|core| core.load_game(path.map(Path::new))).unwrap_or(false)
}

pub fn unload_game() {
    with_core(|core| core.unload_game());
}

pub fn run() {
    with_core(|core| core.run());
}

pub fn reset() {
    with_core(|core| core.reset());
}

pub fn serialize_size() -> usize {
    with_core(|core| core.serialize_size()).unwrap_or(0)
}

/// # Safety
/// `data` must be null or valid for `size` bytes.
pub unsafe fn serialize(data: *mut c_void, size: usize) -> bool {
    let buf: &mut [u8] = if data.is_null() {
        &mut []
    } else {
        std::slice::from_raw_parts_mut(data as *mut u8, size)
    };
    with_core(|core| core.serialize(buf)).unwrap_or(false)
}

/// # Safety
/// `data` must be null or valid for `size` bytes.
pub unsafe fn unserialize(data: *const c_void, size: usize) -> bool {
    let buf: &[u8] = if data.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(data as *const u8, size)
    };
    with_core(|core| core.unserialize(buf)).unwrap_or(false)
}

pub fn region() -> c_uint {
    RETRO_REGION_NTSC
}

/// Host audio pump.
pub extern "C" fn audio_callback() {
    with_core(|core| core.audio_pull());
}

pub extern "C" fn audio_set_state(enabled: bool) {
    with_core(|core| core.set_audio_enabled(enabled));
}
