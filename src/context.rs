// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Execution context pair.
//!
//! Exactly two units of control exist: the host context (the caller's native
//! stack) and the script context (a dedicated stack running the engine). Control
//! moves between them symmetrically and never preemptively:
//!
//! ```text
//!   host stack                         script stack
//!   ──────────                         ────────────
//!   switch_to_script(resume) ───────►  entry / returns from switch_to_host()
//!                                        ... engine renders one frame ...
//!   returns Switch::Suspended ◄──────  switch_to_host()
//!   ...
//!   returns Switch::Finished  ◄──────  entry returns (finishing switch)
//! ```
//!
//! The stack swap itself is done by `corosensei`; nothing outside this module
//! touches the raw stack.

use corosensei::{stack::DefaultStack, Coroutine, CoroutineResult, Yielder};
use std::{cell::Cell, rc::Rc};

/// Backing memory of the script context, mmap'd with a guard page.
pub type ScriptStack = DefaultStack;

/// Which context currently owns the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Host,
    Script,
}

/// Value handed to the script context each time the host switches into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resume {
    /// host asked for an engine reset while the script held the engine
    pub reset: bool,
}

/// Outcome of a host -> script switch, observed on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    /// script yielded and can be resumed again
    Suspended,
    /// script performed its finishing switch and must never be resumed
    Finished,
}

/// Script side of the pair, only reachable from code running on the script stack.
pub struct ScriptContext<'a> {
    yielder: &'a Yielder<Resume, ()>,
    running: Rc<Cell<Side>>,
}

impl ScriptContext<'_> {
    /// Suspend the script context and resume the host where it last switched in.
    /// Returns the value passed by the host on the next switch back.
    pub fn switch_to_host(&self) -> Resume {
        self.running.set(Side::Host);
        let resume = self.yielder.suspend(());
        self.running.set(Side::Script);
        resume
    }

    pub fn running(&self) -> Side {
        self.running.get()
    }
}

/// Host side of the pair, owns the script stack through the coroutine.
pub struct ContextPair {
    coroutine: Coroutine<Resume, (), (), ScriptStack>,
    running: Rc<Cell<Side>>,
}

impl ContextPair {
    /// Bind `entry` to `stack`. Nothing runs until the first `switch_to_script`.
    pub fn new<F>(stack: ScriptStack, entry: F) -> Self
    where
        F: FnOnce(&ScriptContext<'_>, Resume) + 'static,
    {
        let running = Rc::new(Cell::new(Side::Host));
        let script_running = running.clone();
        let coroutine = Coroutine::with_stack(stack, move |yielder: &Yielder<Resume, ()>, first| {
            let ctx = ScriptContext {
                yielder,
                running: script_running,
            };
            entry(&ctx, first);
            ctx.running.set(Side::Host);
        });
        Self { coroutine, running }
    }

    /// Suspend the host and run the script until it yields or finishes.
    ///
    /// Must not be called again after `Switch::Finished`, the caller latches it.
    pub fn switch_to_script(&mut self, resume: Resume) -> Switch {
        debug_assert_eq!(self.running.get(), Side::Host);
        self.running.set(Side::Script);
        let result = self.coroutine.resume(resume);
        self.running.set(Side::Host);
        match result {
            CoroutineResult::Yield(()) => Switch::Suspended,
            CoroutineResult::Return(()) => Switch::Finished,
        }
    }

    pub fn running(&self) -> Side {
        self.running.get()
    }

    pub fn started(&self) -> bool {
        self.coroutine.started()
    }

    pub fn finished(&self) -> bool {
        self.coroutine.done()
    }

    /// Take the stack back from a finished pair.
    pub fn into_stack(self) -> ScriptStack {
        self.coroutine.into_stack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn stack() -> ScriptStack {
        ScriptStack::new(64 * 1024).unwrap()
    }

    #[test]
    fn test_entry_not_run_until_first_switch() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let mut pair = ContextPair::new(stack(), move |_, _| h.set(h.get() + 1));
        assert!(!pair.started());
        assert_eq!(hits.get(), 0);
        assert_eq!(pair.switch_to_script(Resume::default()), Switch::Finished);
        assert_eq!(hits.get(), 1);
        assert!(pair.finished());
    }

    #[test]
    fn test_interleaving_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let mut pair = ContextPair::new(stack(), move |ctx, _| {
            for i in 0..3 {
                l.borrow_mut().push(format!("script {}", i));
                ctx.switch_to_host();
            }
        });
        for i in 0..3 {
            assert_eq!(pair.switch_to_script(Resume::default()), Switch::Suspended);
            log.borrow_mut().push(format!("host {}", i));
        }
        assert_eq!(pair.switch_to_script(Resume::default()), Switch::Finished);
        assert_eq!(
            *log.borrow(),
            vec!["script 0", "host 0", "script 1", "host 1", "script 2", "host 2"]
        );
    }

    #[test]
    fn test_resume_value_reaches_script() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let mut pair = ContextPair::new(stack(), move |ctx, first| {
            s.borrow_mut().push(first.reset);
            let next = ctx.switch_to_host();
            s.borrow_mut().push(next.reset);
        });
        pair.switch_to_script(Resume { reset: false });
        pair.switch_to_script(Resume { reset: true });
        assert_eq!(*seen.borrow(), vec![false, true]);
    }

    #[test]
    fn test_running_side_tracks_switches() {
        let observed = Rc::new(Cell::new(None));
        let o = observed.clone();
        let mut pair = ContextPair::new(stack(), move |ctx, _| {
            o.set(Some(ctx.running()));
            ctx.switch_to_host();
        });
        assert_eq!(pair.running(), Side::Host);
        pair.switch_to_script(Resume::default());
        assert_eq!(observed.get(), Some(Side::Script));
        assert_eq!(pair.running(), Side::Host);
    }
}
