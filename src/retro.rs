// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! libretro binding.
//!
//! abi: `#[repr(C)]` types and constants of the libretro API.
//! callbacks: host callbacks and the `Frontend` built on them.
//! exports: the process core and the bodies of the `retro_*` symbols.
//!
//! The symbols themselves are expanded by `retro_core!` in the crate that
//! provides the engine, since only that crate is built as a `cdylib`.

pub mod abi;
pub mod callbacks;
pub mod exports;
