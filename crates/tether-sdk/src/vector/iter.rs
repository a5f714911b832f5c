//! Buffered element iteration

use super::{Element, Vector};
use crate::error::Result;
use crate::unwind::safe;

/// Elements fetched per region read
pub(crate) const REGION_CHUNK: usize = 64;

/// Iterator over the elements of a [`Vector`].
///
/// Views of region-capable kinds are read in chunks of [`REGION_CHUNK`]
/// elements, so a compact runtime representation is never expanded. Other
/// views read one element per call. Yields `Err` once and then stops if the
/// runtime fails.
pub struct Iter<'a, T> {
    vector: &'a Vector<T>,
    pos: usize,
    chunk: Vec<T>,
    chunk_start: usize,
    chunk_len: usize,
    failed: bool,
}

impl<'a, T: Element> Iter<'a, T> {
    pub(super) fn new(vector: &'a Vector<T>) -> Self {
        Self {
            vector,
            pos: 0,
            chunk: Vec::new(),
            chunk_start: 0,
            chunk_len: 0,
            failed: false,
        }
    }

    fn fill(&mut self) -> Result<()> {
        let Some(h) = self.vector.view_handle() else {
            return Ok(());
        };
        let start = self.pos;
        let want = REGION_CHUNK.min(self.vector.len() - start);
        let chunk = &mut self.chunk;
        let n = safe(|rt| {
            if chunk.len() < REGION_CHUNK {
                chunk.resize(REGION_CHUNK, T::missing(rt));
            }
            T::read_region(rt, h, start, &mut chunk[..want])
        })?;
        self.chunk_start = start;
        self.chunk_len = n;
        Ok(())
    }
}

impl<T: Element> Iterator for Iter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.vector.len() {
            return None;
        }

        if let Some(buf) = self.vector.as_slice() {
            let value = buf[self.pos].clone();
            self.pos += 1;
            return Some(Ok(value));
        }

        if !T::KIND.supports_region() {
            let item = self.vector.get(self.pos);
            self.failed = item.is_err();
            self.pos += 1;
            return Some(item);
        }

        if self.pos >= self.chunk_start + self.chunk_len {
            if let Err(err) = self.fill() {
                self.failed = true;
                return Some(Err(err));
            }
            if self.chunk_len == 0 {
                return None;
            }
        }
        let value = self.chunk[self.pos - self.chunk_start].clone();
        self.pos += 1;
        Some(Ok(value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len().saturating_sub(self.pos);
        (0, Some(remaining))
    }
}

impl<'a, T: Element> IntoIterator for &'a Vector<T> {
    type Item = Result<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
