// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Host callbacks installed through `retro_set_*`, and the `Frontend` built on
//! top of them.

use super::abi::*;
use crate::{
    frontend::Frontend,
    log::set_host_sink,
    video::{FrameOutput, PixelFormat},
};
use log::Level;
use std::{
    cell::Cell,
    ffi::{c_char, c_int, c_void, CStr, CString},
    path::PathBuf,
    ptr,
};

thread_local! {
    static ENVIRONMENT: Cell<Option<retro_environment_t>> = const { Cell::new(None) };
    static VIDEO_REFRESH: Cell<Option<retro_video_refresh_t>> = const { Cell::new(None) };
    static AUDIO_SAMPLE: Cell<Option<retro_audio_sample_t>> = const { Cell::new(None) };
    static AUDIO_SAMPLE_BATCH: Cell<Option<retro_audio_sample_batch_t>> = const { Cell::new(None) };
    static INPUT_POLL: Cell<Option<retro_input_poll_t>> = const { Cell::new(None) };
    static INPUT_STATE: Cell<Option<retro_input_state_t>> = const { Cell::new(None) };
}

pub fn set_environment(cb: Option<retro_environment_t>) {
    ENVIRONMENT.with(|c| c.set(cb));
}

pub fn set_video_refresh(cb: Option<retro_video_refresh_t>) {
    VIDEO_REFRESH.with(|c| c.set(cb));
}

/// Single-sample audio is never used, kept only so the host has somewhere to put it.
pub fn set_audio_sample(cb: Option<retro_audio_sample_t>) {
    AUDIO_SAMPLE.with(|c| c.set(cb));
}

pub fn set_audio_sample_batch(cb: Option<retro_audio_sample_batch_t>) {
    AUDIO_SAMPLE_BATCH.with(|c| c.set(cb));
}

pub fn set_input_poll(cb: Option<retro_input_poll_t>) {
    INPUT_POLL.with(|c| c.set(cb));
}

pub fn set_input_state(cb: Option<retro_input_state_t>) {
    INPUT_STATE.with(|c| c.set(cb));
}

/// Issue an environment command. `false` without an environment callback.
///
/// # Safety
/// `data` must point to whatever `cmd` expects.
pub unsafe fn environment(cmd: u32, data: *mut c_void) -> bool {
    match ENVIRONMENT.with(Cell::get) {
        Some(env) => env(cmd, data),
        None => false,
    }
}

/// Route log records to the host's log interface, or back to stderr if it has none.
pub fn install_log_interface() {
    let mut cb = retro_log_callback { log: None };
    let ok = unsafe {
        environment(
            RETRO_ENVIRONMENT_GET_LOG_INTERFACE,
            &mut cb as *mut retro_log_callback as *mut c_void,
        )
    };
    match cb.log {
        Some(printf) if ok => set_host_sink(Some(Box::new(move |level, msg| {
            host_printf(printf, level, msg)
        }))),
        _ => set_host_sink(None),
    }
}

fn host_printf(printf: retro_log_printf_t, level: Level, msg: &str) {
    let level = match level {
        Level::Error => RETRO_LOG_ERROR,
        Level::Warn => RETRO_LOG_WARN,
        Level::Info => RETRO_LOG_INFO,
        Level::Debug | Level::Trace => RETRO_LOG_DEBUG,
    };
    let Ok(text) = CString::new(msg.replace('\0', " ")) else {
        return;
    };
    unsafe { printf(level, c"%s\n".as_ptr(), text.as_ptr()) };
}

/// Host system directory, where `pixel_retro.toml` is looked up.
pub fn system_directory() -> Option<PathBuf> {
    let mut dir: *const c_char = ptr::null();
    let ok = unsafe {
        environment(
            RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY,
            &mut dir as *mut *const c_char as *mut c_void,
        )
    };
    if !ok || dir.is_null() {
        return None;
    }
    let dir = unsafe { CStr::from_ptr(dir) };
    dir.to_str().ok().map(PathBuf::from)
}

/// `Frontend` over the installed C callbacks. Missing callbacks make the
/// corresponding call a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallbackFrontend;

impl Frontend for CallbackFrontend {
    fn set_pixel_format(&self, format: PixelFormat) -> bool {
        let mut fmt: c_int = match format {
            PixelFormat::Rgb1555 => RETRO_PIXEL_FORMAT_0RGB1555,
            PixelFormat::Xrgb8888 => RETRO_PIXEL_FORMAT_XRGB8888,
            PixelFormat::Rgb565 => RETRO_PIXEL_FORMAT_RGB565,
        };
        unsafe {
            environment(
                RETRO_ENVIRONMENT_SET_PIXEL_FORMAT,
                &mut fmt as *mut c_int as *mut c_void,
            )
        }
    }

    fn set_audio_callback(&self) -> bool {
        let mut cb = retro_audio_callback {
            callback: Some(super::exports::audio_callback),
            set_state: Some(super::exports::audio_set_state),
        };
        unsafe {
            environment(
                RETRO_ENVIRONMENT_SET_AUDIO_CALLBACK,
                &mut cb as *mut retro_audio_callback as *mut c_void,
            )
        }
    }

    fn video_refresh(&self, frame: &FrameOutput) {
        if frame.pixels.len() < frame.pitch.saturating_mul(frame.height as usize) {
            return;
        }
        if let Some(refresh) = VIDEO_REFRESH.with(Cell::get) {
            unsafe {
                refresh(
                    frame.pixels.as_ptr() as *const c_void,
                    frame.width,
                    frame.height,
                    frame.pitch,
                )
            };
        }
    }

    fn input_poll(&self) {
        if let Some(poll) = INPUT_POLL.with(Cell::get) {
            unsafe { poll() };
        }
    }

    fn input_state(&self, port: u32, device: u32, index: u32, id: u32) -> i16 {
        match INPUT_STATE.with(Cell::get) {
            Some(state) => unsafe { state(port, device, index, id) },
            None => 0,
        }
    }

    fn audio_sample_batch(&self, samples: &[i16], frames: usize) -> usize {
        let frames = frames.min(samples.len() / 2);
        match AUDIO_SAMPLE_BATCH.with(Cell::get) {
            Some(batch) => unsafe { batch(samples.as_ptr(), frames) },
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static SEEN: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
    }

    unsafe extern "C" fn env(cmd: u32, data: *mut c_void) -> bool {
        SEEN.with(|s| s.borrow_mut().push(cmd));
        match cmd {
            RETRO_ENVIRONMENT_SET_PIXEL_FORMAT => *(data as *const c_int) == RETRO_PIXEL_FORMAT_XRGB8888,
            RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY => {
                *(data as *mut *const c_char) = c"/retro/system".as_ptr();
                true
            }
            _ => false,
        }
    }

    #[test]
    fn test_environment_negotiation() {
        set_environment(None);
        assert!(!CallbackFrontend.set_pixel_format(PixelFormat::Xrgb8888));
        assert_eq!(system_directory(), None);

        set_environment(Some(env));
        assert!(CallbackFrontend.set_pixel_format(PixelFormat::Xrgb8888));
        assert!(!CallbackFrontend.set_pixel_format(PixelFormat::Rgb565));
        assert!(!CallbackFrontend.set_audio_callback());
        assert_eq!(system_directory(), Some(PathBuf::from("/retro/system")));
        SEEN.with(|s| {
            assert!(s.borrow().contains(&RETRO_ENVIRONMENT_SET_AUDIO_CALLBACK));
        });
        set_environment(None);
    }

    #[test]
    fn test_missing_callbacks_are_noops() {
        let f = CallbackFrontend;
        f.input_poll();
        f.video_refresh(&FrameOutput::default());
        assert_eq!(f.input_state(0, 1, 0, 0), 0);
        assert_eq!(f.audio_sample_batch(&[0; 512], 256), 0);
    }
}
