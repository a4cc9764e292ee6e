use log::Level;
use pixel_retro::log::set_host_sink;
use pixel_retro::retro::abi::*;
use pixel_retro::testing::ScriptedEngine;
use std::{
    cell::RefCell,
    ffi::{c_char, c_uint, c_void, CString},
    fs,
    ptr,
    sync::Mutex,
};

pixel_retro::retro_core!(ScriptedEngine::new(64, 64));

static SEEN: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

thread_local! {
    static SYSTEM_DIR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

unsafe extern "C" fn env(cmd: c_uint, data: *mut c_void) -> bool {
    if cmd != RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY {
        return false;
    }
    SYSTEM_DIR.with(|d| match d.borrow().as_ref() {
        Some(dir) => {
            *(data as *mut *const c_char) = dir.as_ptr();
            true
        }
        None => false,
    })
}

#[test]
fn test_malformed_config_is_reported_on_first_init() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pixel_retro.toml"), "stack_bytes = [").unwrap();
    let dir_c = CString::new(dir.path().to_str().unwrap()).unwrap();
    SYSTEM_DIR.with(|d| *d.borrow_mut() = Some(dir_c));

    retro_set_environment(Some(env));
    set_host_sink(Some(Box::new(|level, msg| {
        SEEN.lock().unwrap().push((level, msg.to_string()));
    })));

    retro_init();
    {
        let seen = SEEN.lock().unwrap();
        assert!(seen
            .iter()
            .any(|(l, m)| *l == Level::Warn && m.contains("using defaults")));
    }

    // defaults still give a working core
    let game = retro_game_info {
        path: c"/content/0.txt".as_ptr(),
        data: ptr::null(),
        size: 0,
        meta: ptr::null(),
    };
    assert!(unsafe { retro_load_game(&game) });
    retro_deinit();
    set_host_sink(None);
}
