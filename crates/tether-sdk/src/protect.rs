//! Scoped protection
//!
//! [`Protect`] pushes handles on the runtime's protection stack and pops
//! exactly as many when it goes out of scope, whichever way the scope is
//! left. Guards nest: an inner guard only ever pops what it pushed.
//!
//! A guard's stack entries must stay a contiguous run on top of the stack.
//! When a guard grows while an inner guard is alive, the new handle is
//! preserved instead and released by identity on drop, so the inner guard
//! can still pop its own run.
//!
//! Dropping an outer guard while an inner one is still alive would pop the
//! inner guard's entries. That is a misuse; the guard detects it from the
//! stack depth and panics instead of unprotecting someone else's handles.

use std::rc::Rc;

use crate::error::Result;
use crate::handle::Handle;
use crate::runtime::Runtime;
use crate::session;

/// RAII guard over a run of the protection stack, plus any handles added
/// while it was not innermost
pub struct Protect {
    runtime: Rc<dyn Runtime>,
    base: usize,
    stacked: usize,
    preserved: Vec<Handle>,
}

impl Protect {
    /// Create a guard with nothing protected yet
    pub fn new() -> Result<Self> {
        let runtime = session::runtime()?;
        let base = runtime.protect_depth();
        Ok(Self {
            runtime,
            base,
            stacked: 0,
            preserved: Vec::new(),
        })
    }

    /// Create a guard protecting each of `handles`
    pub fn with(handles: &[Handle]) -> Result<Self> {
        let mut guard = Self::new()?;
        for &h in handles {
            guard.protect(h);
        }
        Ok(guard)
    }

    /// Protect `h` until the guard is dropped; returns `h` for chaining
    pub fn protect(&mut self, h: Handle) -> Handle {
        if self.is_innermost() {
            self.runtime.protect(h);
            self.stacked += 1;
        } else {
            tracing::trace!(handle = ?h, "guard is not innermost; preserving instead");
            self.runtime.preserve(h);
            self.preserved.push(h);
        }
        h
    }

    /// Number of handles this guard holds
    pub fn count(&self) -> usize {
        self.stacked + self.preserved.len()
    }

    fn is_innermost(&self) -> bool {
        self.runtime.protect_depth() == self.base + self.stacked
    }
}

impl Drop for Protect {
    fn drop(&mut self) {
        for h in self.preserved.drain(..) {
            self.runtime.release(h);
        }
        if self.stacked == 0 {
            return;
        }

        let depth = self.runtime.protect_depth();
        if depth != self.base + self.stacked {
            if std::thread::panicking() {
                tracing::error!(
                    depth,
                    expected = self.base + self.stacked,
                    "protection guard dropped out of scope order during unwinding"
                );
                return;
            }
            panic!(
                "protection guard dropped out of scope order: stack depth {} but guard owns {}..{}",
                depth,
                self.base,
                self.base + self.stacked
            );
        }
        self.runtime.unprotect(self.stacked);
    }
}

/// Run `f` with `h` protected for its duration.
pub fn with_protected<R>(h: Handle, f: impl FnOnce(Handle) -> R) -> Result<R> {
    let mut guard = Protect::new()?;
    let h = guard.protect(h);
    Ok(f(h))
}
