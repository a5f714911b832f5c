//! Tether Engine - an in-process garbage-collected object space
//!
//! [`Heap`] implements [`tether_sdk::Runtime`] with the object model native
//! code expects from a host runtime: typed vectors, lazy compact sequences,
//! named attributes, a protection stack, a precious set, and a mark-sweep
//! collector that can run before every allocation (torture mode).
//!
//! ```ignore
//! use std::rc::Rc;
//! use tether_engine::{Heap, HeapConfig};
//!
//! let heap = Rc::new(Heap::new(HeapConfig::torture()));
//! let _session = tether_sdk::session::enter(heap.clone())?;
//! ```

#![warn(missing_docs)]

pub mod collector;
pub mod config;
pub mod defaults;
pub mod heap;
pub mod roots;

mod object;
mod rng;

pub use collector::GcStats;
pub use config::HeapConfig;
pub use heap::{Heap, HeapStats};
pub use roots::RootSet;
