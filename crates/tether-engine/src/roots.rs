//! GC root tracking
//!
//! Two kinds of roots keep objects alive across collections:
//! - the protection stack (scoped, LIFO)
//! - the precious set (long-lived, counted per handle)

use rustc_hash::FxHashMap;
use tether_sdk::Handle;

/// Root set for garbage collection
#[derive(Debug, Default)]
pub struct RootSet {
    /// Protection stack
    stack: Vec<Handle>,

    /// Preserved handles and how many times each is preserved
    precious: FxHashMap<Handle, usize>,
}

impl RootSet {
    /// Create an empty root set
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a handle on the protection stack
    pub fn push(&mut self, h: Handle) {
        self.stack.push(h);
    }

    /// Pop `n` handles; returns how many were actually on the stack
    pub fn pop(&mut self, n: usize) -> usize {
        let n = n.min(self.stack.len());
        self.stack.truncate(self.stack.len() - n);
        n
    }

    /// Protection stack depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Add one preservation of `h`
    pub fn preserve(&mut self, h: Handle) {
        *self.precious.entry(h).or_insert(0) += 1;
    }

    /// Remove one preservation of `h`; false if `h` was not preserved
    pub fn release(&mut self, h: Handle) -> bool {
        match self.precious.get_mut(&h) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.precious.remove(&h);
                true
            }
            None => false,
        }
    }

    /// Preservation count of `h`
    pub fn preserved(&self, h: Handle) -> usize {
        self.precious.get(&h).copied().unwrap_or(0)
    }

    /// Distinct preserved handles
    pub fn precious_len(&self) -> usize {
        self.precious.len()
    }

    /// Iterate over all roots
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.stack.iter().chain(self.precious.keys()).copied()
    }
}
