// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Coroutine lifecycle manager.
//!
//! Owns the script context and its stack. The stack is mapped once in `start`
//! and released exactly once, when the entry function returns. An ordinary
//! yield never releases anything. After termination the `terminated` latch turns
//! every further resume into a no-op, so the freed stack can't be re-entered.

use crate::context::{ContextPair, Resume, ScriptContext, ScriptStack, Side, Switch};
use crate::error::{CoreError, Result};
use log::{debug, info};

pub struct ScriptCoroutine {
    pair: Option<ContextPair>,
    stack_bytes: usize,
    switches: u64,
}

impl ScriptCoroutine {
    /// Map `stack_bytes` of stack and bind `entry` to it. The entry does not run
    /// until the first `resume`.
    pub fn start<F>(entry: F, stack_bytes: usize) -> Result<Self>
    where
        F: FnOnce(&ScriptContext<'_>, Resume) + 'static,
    {
        let stack = ScriptStack::new(stack_bytes).map_err(CoreError::StackAlloc)?;
        debug!("script stack mapped, {} bytes", stack_bytes);
        Ok(Self {
            pair: Some(ContextPair::new(stack, entry)),
            stack_bytes,
            switches: 0,
        })
    }

    /// Switch into the script context.
    ///
    /// Returns `Switch::Finished` without switching once the script has terminated.
    pub fn resume(&mut self, resume: Resume) -> Switch {
        let Some(pair) = self.pair.as_mut() else {
            return Switch::Finished;
        };
        self.switches += 1;
        match pair.switch_to_script(resume) {
            Switch::Suspended => Switch::Suspended,
            Switch::Finished => {
                self.reclaim();
                Switch::Finished
            }
        }
    }

    fn reclaim(&mut self) {
        if let Some(pair) = self.pair.take() {
            drop(pair.into_stack());
            info!(
                "script context finished after {} switches, {} byte stack released",
                self.switches, self.stack_bytes
            );
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.pair.is_none()
    }

    /// Context currently owning the thread, `Host` once terminated.
    pub fn running(&self) -> Side {
        self.pair.as_ref().map_or(Side::Host, |p| p.running())
    }

    pub fn switches(&self) -> u64 {
        self.switches
    }
}
