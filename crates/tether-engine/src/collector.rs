//! Mark-sweep garbage collector
//!
//! Marks everything reachable from the root set through list elements and
//! attributes, then frees every unmarked slot and bumps its generation so
//! old handles to it are detected as stale.

use std::time::{Duration, Instant};

use tether_sdk::Handle;

use crate::heap::{decode, Slot};

/// Garbage collector statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GcStats {
    /// Total number of collections
    pub collections: usize,

    /// Total objects freed
    pub objects_freed: usize,

    /// Total pause time across all collections
    pub total_pause_time: Duration,

    /// Last collection duration
    pub last_pause_time: Duration,

    /// Objects marked in last collection
    pub last_marked_count: usize,

    /// Objects freed in last collection
    pub last_freed_count: usize,

    /// Live objects after last collection
    pub live_objects: usize,
}

impl GcStats {
    fn update(&mut self, duration: Duration, marked: usize, freed: usize) {
        self.collections += 1;
        self.objects_freed += freed;
        self.total_pause_time += duration;
        self.last_pause_time = duration;
        self.last_marked_count = marked;
        self.last_freed_count = freed;
        self.live_objects = marked;
    }
}

/// Run one full collection over `slots`.
///
/// Freed slot indices are appended to `free`. Returns the number of objects
/// freed.
pub(crate) fn collect(
    slots: &mut [Slot],
    free: &mut Vec<u32>,
    roots: impl Iterator<Item = Handle>,
    stats: &mut GcStats,
) -> usize {
    let start = Instant::now();

    let marked = mark(slots, roots);
    let freed = sweep(slots, free);

    stats.update(start.elapsed(), marked, freed);
    tracing::trace!(marked, freed, "collection finished");
    freed
}

/// Mark phase: returns the number of objects marked
fn mark(slots: &mut [Slot], roots: impl Iterator<Item = Handle>) -> usize {
    for slot in slots.iter_mut() {
        if let Some(object) = slot.object.as_mut() {
            object.marked = false;
        }
    }

    let mut worklist: Vec<Handle> = roots.collect();
    let mut marked = 0;
    while let Some(h) = worklist.pop() {
        let (index, generation) = decode(h);
        let Some(slot) = slots.get_mut(index) else {
            continue;
        };
        if slot.generation != generation {
            continue;
        }
        let Some(object) = slot.object.as_mut() else {
            continue;
        };
        if object.marked {
            continue;
        }
        object.marked = true;
        marked += 1;
        worklist.extend(object.children());
    }
    marked
}

/// Sweep phase: returns the number of objects freed
fn sweep(slots: &mut [Slot], free: &mut Vec<u32>) -> usize {
    let mut freed = 0;
    for (index, slot) in slots.iter_mut().enumerate() {
        let dead = matches!(&slot.object, Some(object) if !object.marked);
        if dead {
            slot.object = None;
            slot.generation = slot.generation.wrapping_add(1).max(1);
            free.push(index as u32);
            freed += 1;
        }
    }
    freed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::encode;
    use crate::object::{Object, Payload};

    fn slot(payload: Payload) -> Slot {
        Slot {
            generation: 1,
            object: Some(Object::new(payload)),
        }
    }

    #[test]
    fn test_unreachable_objects_are_freed() {
        let mut slots = vec![slot(Payload::Nil), slot(Payload::Integer(vec![1]))];
        let mut free = Vec::new();
        let mut stats = GcStats::default();

        let freed = collect(&mut slots, &mut free, [encode(0, 1)].into_iter(), &mut stats);
        assert_eq!(freed, 1);
        assert_eq!(free, vec![1]);
        assert!(slots[1].object.is_none());
        assert_eq!(slots[1].generation, 2);
        assert_eq!(stats.collections, 1);
        assert_eq!(stats.live_objects, 1);
    }

    #[test]
    fn test_list_children_and_attributes_survive() {
        let mut slots = vec![
            slot(Payload::Nil),
            slot(Payload::Real(vec![1.0])),
            slot(Payload::Str(vec![Some("a".to_string())])),
            slot(Payload::List(vec![encode(1, 1)])),
        ];
        if let Some(list) = slots[3].object.as_mut() {
            list.set_attr("names", Some(encode(2, 1)));
        }
        let mut free = Vec::new();
        let mut stats = GcStats::default();

        let roots = [encode(0, 1), encode(3, 1)];
        let freed = collect(&mut slots, &mut free, roots.into_iter(), &mut stats);
        assert_eq!(freed, 0);
        assert_eq!(stats.last_marked_count, 4);
    }

    #[test]
    fn test_stale_roots_are_ignored() {
        let mut slots = vec![slot(Payload::Nil), slot(Payload::Integer(vec![]))];
        let mut free = Vec::new();
        let mut stats = GcStats::default();

        // Generation 7 does not match the live object in slot 1
        let roots = [encode(0, 1), encode(1, 7)];
        let freed = collect(&mut slots, &mut free, roots.into_iter(), &mut stats);
        assert_eq!(freed, 1);
    }
}
