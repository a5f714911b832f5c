//! Runtime session: the runtime installed on the current thread
//!
//! The foreign runtime is a singleton for the thread that embeds it. A
//! session binds an `Rc<dyn Runtime>` to that thread so that guards and
//! owning wrappers can reach it from `Drop` without threading a context
//! argument through every call. Nested native calls reuse the same session.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::registry;
use crate::runtime::Runtime;

/// Process-unique identifier of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SessionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// An installed runtime
pub struct Session {
    id: SessionId,
    runtime: Rc<dyn Runtime>,
}

impl Session {
    /// Session id
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The runtime bound to this session
    pub fn runtime(&self) -> &Rc<dyn Runtime> {
        &self.runtime
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<Session>>> = const { RefCell::new(None) };
}

/// Install `runtime` on the current thread.
///
/// Fails with [`Error::SessionActive`] if a session is already installed.
pub fn enter(runtime: Rc<dyn Runtime>) -> Result<SessionGuard> {
    crate::unwind::quiet_runtime_unwinds();

    CURRENT.with(|current| {
        let mut current = current.borrow_mut();
        if current.is_some() {
            return Err(Error::SessionActive);
        }
        let session = Rc::new(Session {
            id: SessionId::next(),
            runtime,
        });
        tracing::debug!(session = session.id.0, "runtime session entered");
        *current = Some(session.clone());
        Ok(SessionGuard {
            session,
            _not_send: PhantomData,
        })
    })
}

/// The current session
pub fn current() -> Result<Rc<Session>> {
    CURRENT.with(|current| current.borrow().clone().ok_or(Error::NoSession))
}

/// The current session's runtime
pub fn runtime() -> Result<Rc<dyn Runtime>> {
    current().map(|s| s.runtime.clone())
}

/// Check whether a session is installed on this thread
pub fn is_active() -> bool {
    CURRENT.with(|current| current.borrow().is_some())
}

/// Keeps a session installed; dropping it shuts the session down.
///
/// Shutdown drains every preservation registry entry the session still
/// owns, then uninstalls the runtime.
pub struct SessionGuard {
    session: Rc<Session>,
    _not_send: PhantomData<*const ()>,
}

impl SessionGuard {
    /// Id of the guarded session
    pub fn id(&self) -> SessionId {
        self.session.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let released = registry::teardown(self.session.id, self.session.runtime.as_ref());
        CURRENT.with(|current| {
            current.borrow_mut().take();
        });
        tracing::debug!(
            session = self.session.id.0,
            released,
            "runtime session shut down"
        );
    }
}
