//! Safe-call boundary
//!
//! A runtime error unwinds straight through whatever native frames sit
//! between the primitive and the runtime's own error handler. Every
//! primitive call in the SDK goes through [`safe`], which catches that
//! unwind at one place and hands it back as [`Error::Runtime`] so the
//! native call chain returns normally and runs its destructors.
//!
//! Runtimes signal errors with [`raise`]. Panics that do not carry a
//! [`RuntimeUnwind`] payload are native bugs and keep unwinding.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::session;

/// Unwind payload for a runtime-level error
#[derive(Debug, Clone)]
pub struct RuntimeUnwind {
    message: String,
}

impl RuntimeUnwind {
    /// Error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Signal a runtime error from inside a primitive.
pub fn raise(message: impl Into<String>) -> ! {
    panic::panic_any(RuntimeUnwind {
        message: message.into(),
    })
}

/// Run `f`, converting a runtime unwind into [`Error::Runtime`].
///
/// Reentrant: nested calls each catch their own unwinds.
pub fn catch<R>(f: impl FnOnce() -> R) -> Result<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<RuntimeUnwind>() {
            Ok(unwind) => {
                tracing::trace!(message = %unwind.message, "caught runtime unwind");
                Err(Error::Runtime(unwind.message))
            }
            Err(other) => panic::resume_unwind(other),
        },
    }
}

/// Invoke runtime primitives through the safe-call boundary.
///
/// Resolves the current session's runtime and runs `f` under [`catch`].
pub fn safe<R>(f: impl FnOnce(&dyn Runtime) -> R) -> Result<R> {
    let runtime = session::runtime()?;
    catch(|| f(runtime.as_ref()))
}

/// Keep the default panic hook from printing runtime unwinds.
///
/// They are control flow, not crashes. Other panics still reach the
/// previously installed hook.
pub fn quiet_runtime_unwinds() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<RuntimeUnwind>().is_none() {
                previous(info);
            }
        }));
    });
}
