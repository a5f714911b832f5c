//! Owning handle wrapper
//!
//! A [`Sexp`] is a handle plus its own preservation registration, giving
//! runtime objects ordinary value semantics:
//!
//! - `Sexp::new` registers the handle
//! - `clone` registers it again, so each copy lives independently
//! - moving transfers the registration; `take` does the same explicitly and
//!   leaves the source empty
//! - `drop` releases the registration once, and does nothing for an empty
//!   wrapper

use std::marker::PhantomData;

use crate::error::Result;
use crate::handle::Handle;
use crate::registry::{self, RegistryKey};
use crate::unwind::safe;

/// A handle the runtime will not collect while this value is alive.
///
/// Bound to the thread of the session that registered it.
pub struct Sexp {
    handle: Handle,
    key: Option<RegistryKey>,
    _not_send: PhantomData<*const ()>,
}

impl Sexp {
    /// Preserve `h` for the lifetime of the returned wrapper
    pub fn new(h: Handle) -> Result<Self> {
        let key = registry::insert(h)?;
        Ok(Self::wrap(h, Some(key)))
    }

    /// The runtime's nil object.
    ///
    /// Nil is always reachable, so no registration is made.
    pub fn nil() -> Result<Self> {
        let handle = safe(|rt| rt.nil())?;
        Ok(Self::from_nil_handle(handle))
    }

    pub(crate) fn from_nil_handle(nil: Handle) -> Self {
        Self::wrap(nil, None)
    }

    fn wrap(handle: Handle, key: Option<RegistryKey>) -> Self {
        Self {
            handle,
            key,
            _not_send: PhantomData,
        }
    }

    /// The wrapped handle (does not affect protection)
    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// True if this wrapper currently holds a registration
    pub fn is_preserved(&self) -> bool {
        self.key.is_some()
    }

    /// True if the wrapped object is the runtime's nil
    pub fn is_nil(&self) -> Result<bool> {
        let h = self.handle;
        safe(|rt| rt.nil() == h)
    }

    /// Move the registration out, leaving `self` empty
    pub fn take(&mut self) -> Sexp {
        let key = self.key.take();
        Sexp::wrap(self.handle, key)
    }

    /// Release the registration and return the bare handle.
    ///
    /// The handle is unprotected afterwards; use it only to hand the object
    /// straight back to the runtime.
    pub fn into_handle(mut self) -> Handle {
        if let Some(key) = self.key.take() {
            registry::release(key);
        }
        self.handle
    }

    /// Get a named attribute
    pub fn attr(&self, name: &str) -> Result<Sexp> {
        let h = self.handle;
        let attr = safe(|rt| rt.get_attr(h, name))?;
        Sexp::new(attr)
    }

    /// Set a named attribute
    pub fn set_attr(&self, name: &str, value: &Sexp) -> Result<()> {
        let (h, v) = (self.handle, value.handle);
        safe(|rt| rt.set_attr(h, name, v))
    }
}

impl Clone for Sexp {
    fn clone(&self) -> Self {
        if self.key.is_none() {
            return Sexp::wrap(self.handle, None);
        }
        match registry::insert(self.handle) {
            Ok(key) => Sexp::wrap(self.handle, Some(key)),
            Err(err) => {
                // The source outlived its session, so nothing is left to protect.
                tracing::warn!(error = %err, "cloned a handle with no active session");
                Sexp::wrap(self.handle, None)
            }
        }
    }
}

impl Drop for Sexp {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            registry::release(key);
        }
    }
}

impl PartialEq for Sexp {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Sexp {}

impl std::fmt::Debug for Sexp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sexp")
            .field("handle", &self.handle)
            .field("preserved", &self.key.is_some())
            .finish()
    }
}
