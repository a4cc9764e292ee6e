// RustPixel - libretro Core Macro Module
// copyright zipxing@hotmail.com 2022～2025

//! Macro for scaffolding a libretro core.

/// Macro `retro_core!` expands the complete `retro_*` symbol set for a core
/// whose interpreter is built by `$engine`.
///
/// ## Usage
///
/// ```rust,ignore
/// // Cargo.toml: crate-type = ["cdylib"]
/// use my_interpreter::Interpreter;
/// pixel_retro::retro_core!(Interpreter::new());
/// ```
///
/// `$engine` is evaluated once, in `retro_init`, and must produce a value
/// implementing `pixel_retro::engine::ScriptEngine`.
#[macro_export]
macro_rules! retro_core {
    ($engine:expr) => {
        #[no_mangle]
        pub extern "C" fn retro_api_version() -> ::std::ffi::c_uint {
            $crate::retro::exports::api_version()
        }

        #[no_mangle]
        pub extern "C" fn retro_set_environment(
            cb: ::std::option::Option<$crate::retro::abi::retro_environment_t>,
        ) {
            $crate::retro::exports::set_environment(cb);
        }

        #[no_mangle]
        pub extern "C" fn retro_set_video_refresh(
            cb: ::std::option::Option<$crate::retro::abi::retro_video_refresh_t>,
        ) {
            $crate::retro::callbacks::set_video_refresh(cb);
        }

        #[no_mangle]
        pub extern "C" fn retro_set_audio_sample(
            cb: ::std::option::Option<$crate::retro::abi::retro_audio_sample_t>,
        ) {
            $crate::retro::callbacks::set_audio_sample(cb);
        }

        #[no_mangle]
        pub extern "C" fn retro_set_audio_sample_batch(
            cb: ::std::option::Option<$crate::retro::abi::retro_audio_sample_batch_t>,
        ) {
            $crate::retro::callbacks::set_audio_sample_batch(cb);
        }

        #[no_mangle]
        pub extern "C" fn retro_set_input_poll(
            cb: ::std::option::Option<$crate::retro::abi::retro_input_poll_t>,
        ) {
            $crate::retro::callbacks::set_input_poll(cb);
        }

        #[no_mangle]
        pub extern "C" fn retro_set_input_state(
            cb: ::std::option::Option<$crate::retro::abi::retro_input_state_t>,
        ) {
            $crate::retro::callbacks::set_input_state(cb);
        }

        /// # Safety
        /// `info` must be null or writable.
        #[no_mangle]
        pub unsafe extern "C" fn retro_get_system_info(info: *mut $crate::retro::abi::retro_system_info) {
            $crate::retro::exports::get_system_info(info);
        }

        /// # Safety
        /// `info` must be null or writable.
        #[no_mangle]
        pub unsafe extern "C" fn retro_get_system_av_info(
            info: *mut $crate::retro::abi::retro_system_av_info,
        ) {
            $crate::retro::exports::get_system_av_info(info);
        }

        #[no_mangle]
        pub extern "C" fn retro_init() {
            $crate::retro::exports::init(::std::boxed::Box::new($engine));
        }

        #[no_mangle]
        pub extern "C" fn retro_deinit() {
            $crate::retro::exports::deinit();
        }

        /// # Safety
        /// `game` must be null or a valid game info.
        #[no_mangle]
        pub unsafe extern "C" fn retro_load_game(game: *const $crate::retro::abi::retro_game_info) -> bool {
            $crate::retro::exports::load_game(game)
        }

        #[no_mangle]
        pub extern "C" fn retro_load_game_special(
            _game_type: ::std::ffi::c_uint,
            _info: *const $crate::retro::abi::retro_game_info,
            _num_info: usize,
        ) -> bool {
            false
        }

        #[no_mangle]
        pub extern "C" fn retro_unload_game() {
            $crate::retro::exports::unload_game();
        }

        #[no_mangle]
        pub extern "C" fn retro_run() {
            $crate::retro::exports::run();
        }

        #[no_mangle]
        pub extern "C" fn retro_reset() {
            $crate::retro::exports::reset();
        }

        #[no_mangle]
        pub extern "C" fn retro_serialize_size() -> usize {
            $crate::retro::exports::serialize_size()
        }

        /// # Safety
        /// `data` must be null or valid for `size` bytes.
        #[no_mangle]
        pub unsafe extern "C" fn retro_serialize(data: *mut ::std::ffi::c_void, size: usize) -> bool {
            $crate::retro::exports::serialize(data, size)
        }

        /// # Safety
        /// `data` must be null or valid for `size` bytes.
        #[no_mangle]
        pub unsafe extern "C" fn retro_unserialize(data: *const ::std::ffi::c_void, size: usize) -> bool {
            $crate::retro::exports::unserialize(data, size)
        }

        #[no_mangle]
        pub extern "C" fn retro_cheat_reset() {}

        #[no_mangle]
        pub extern "C" fn retro_cheat_set(
            _index: ::std::ffi::c_uint,
            _enabled: bool,
            _code: *const ::std::ffi::c_char,
        ) {
        }

        #[no_mangle]
        pub extern "C" fn retro_set_controller_port_device(
            _port: ::std::ffi::c_uint,
            _device: ::std::ffi::c_uint,
        ) {
        }

        #[no_mangle]
        pub extern "C" fn retro_get_region() -> ::std::ffi::c_uint {
            $crate::retro::exports::region()
        }

        #[no_mangle]
        pub extern "C" fn retro_get_memory_data(_id: ::std::ffi::c_uint) -> *mut ::std::ffi::c_void {
            ::std::ptr::null_mut()
        }

        #[no_mangle]
        pub extern "C" fn retro_get_memory_size(_id: ::std::ffi::c_uint) -> usize {
            0
        }
    };
}
