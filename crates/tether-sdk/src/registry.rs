//! Preservation registry
//!
//! Long-lived protection for handles that must outlive a lexical scope.
//! Every [`insert`] adds one runtime-level preservation and returns its own
//! key; [`release`] undoes exactly that registration. Registrations of the
//! same handle are independent, so the runtime sees a multiset.
//!
//! The registry is process-wide and initialized on first use. Entries are
//! tagged with the session that created them; a session's entries are
//! drained all at once when the session shuts down.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::handle::Handle;
use crate::runtime::Runtime;
use crate::session::{self, SessionId};

/// Opaque key for one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    session: SessionId,
    slot: u64,
}

impl RegistryKey {
    /// Session that owns this registration
    pub fn session(&self) -> SessionId {
        self.session
    }
}

struct PreserveRegistry {
    entries: FxHashMap<RegistryKey, Handle>,
    next_slot: u64,
}

static REGISTRY: Lazy<Mutex<PreserveRegistry>> = Lazy::new(|| {
    tracing::debug!("preservation registry initialized");
    Mutex::new(PreserveRegistry {
        entries: FxHashMap::default(),
        next_slot: 0,
    })
});

/// Register `h` for indefinite protection in the current session.
pub fn insert(h: Handle) -> Result<RegistryKey> {
    let session = session::current()?;
    session.runtime().preserve(h);

    let mut registry = REGISTRY.lock();
    let key = RegistryKey {
        session: session.id(),
        slot: registry.next_slot,
    };
    registry.next_slot += 1;
    registry.entries.insert(key, h);
    Ok(key)
}

/// Remove exactly the registration behind `key`.
///
/// Returns `false` if the key was already released (or drained at session
/// shutdown); the runtime is not touched in that case. A key presented
/// outside its own session is also refused and stays registered, so the
/// owning session still releases it at shutdown.
pub fn release(key: RegistryKey) -> bool {
    let session = match session::current() {
        Ok(session) if session.id() == key.session => session,
        _ => {
            if REGISTRY.lock().entries.contains_key(&key) {
                tracing::warn!(
                    session = key.session.as_u64(),
                    "registry key released outside its session; left for shutdown"
                );
            }
            return false;
        }
    };

    let removed = REGISTRY.lock().entries.remove(&key);
    match removed {
        Some(h) => {
            session.runtime().release(h);
            true
        }
        None => false,
    }
}

/// Number of live registrations owned by `session`
pub fn active(session: SessionId) -> usize {
    REGISTRY
        .lock()
        .entries
        .keys()
        .filter(|k| k.session == session)
        .count()
}

/// Number of live registrations of `h` owned by `session`
pub fn registrations(session: SessionId, h: Handle) -> usize {
    REGISTRY
        .lock()
        .entries
        .iter()
        .filter(|(k, v)| k.session == session && **v == h)
        .count()
}

/// Drain every registration owned by `session`, releasing each once.
pub(crate) fn teardown(session: SessionId, runtime: &dyn Runtime) -> usize {
    let drained: Vec<Handle> = {
        let mut registry = REGISTRY.lock();
        let keys: Vec<RegistryKey> = registry
            .entries
            .keys()
            .filter(|k| k.session == session)
            .copied()
            .collect();
        keys.iter()
            .filter_map(|k| registry.entries.remove(k))
            .collect()
    };

    for h in &drained {
        runtime.release(*h);
    }
    drained.len()
}
