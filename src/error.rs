// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Error types of the retro core.
//!
//! Most failures of a libretro core never reach the host as values: the C ABI only
//! has `bool` and `void` returns. Library code still propagates them as `Result`
//! and the ABI layer logs and flattens them at the boundary.

use std::fmt;
use std::io;

/// Failure reported by a script engine during its one-time initialization.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Engine specific failure with a human readable reason
    Init(String),
    /// A resource the engine needs (font, archive, audio device) is missing
    MissingResource(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Init(msg) => write!(f, "engine init failed: {}", msg),
            EngineError::MissingResource(name) => write!(f, "missing resource: {}", name),
        }
    }
}

impl std::error::Error for EngineError {}

/// Errors surfaced by the core itself.
#[derive(Debug)]
pub enum CoreError {
    /// The script stack could not be mapped
    StackAlloc(io::Error),
    /// Operation is not valid in the current lifecycle state
    InvalidState(&'static str),
    /// The engine refused the content, carries the engine status code
    ContentRejected(i32),
    /// No content path was supplied by the host
    MissingContent,
    /// Configuration file could not be read or parsed
    Config(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::StackAlloc(e) => write!(f, "failed to allocate script stack: {}", e),
            CoreError::InvalidState(op) => write!(f, "{} is not valid in the current state", op),
            CoreError::ContentRejected(code) => {
                write!(f, "script engine rejected content (status {})", code)
            }
            CoreError::MissingContent => write!(f, "no content path supplied"),
            CoreError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::StackAlloc(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
