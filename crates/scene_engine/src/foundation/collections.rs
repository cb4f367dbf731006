//! Specialized collection types

/// Pool of reusable scratch vectors
///
/// Buffers handed out by [`ListPool::obtain`] are owned by the caller until they
/// are handed back with [`ListPool::free`]; the storage is then reused by the
/// next caller. Buffers are always returned empty.
#[derive(Debug)]
pub struct ListPool<T> {
    free: Vec<Vec<T>>,
    max_cached: usize,
}

impl<T> ListPool<T> {
    /// Create a pool keeping at most `max_cached` idle buffers
    pub fn new(max_cached: usize) -> Self {
        Self {
            free: Vec::new(),
            max_cached,
        }
    }

    /// Take an empty buffer from the pool (allocating if none is idle)
    pub fn obtain(&mut self) -> Vec<T> {
        self.free.pop().unwrap_or_default()
    }

    /// Return a buffer to the pool
    pub fn free(&mut self, mut list: Vec<T>) {
        if self.free.len() < self.max_cached {
            list.clear();
            self.free.push(list);
        }
    }

    /// Number of idle buffers
    pub fn idle(&self) -> usize {
        self.free.len()
    }
}

impl<T> Default for ListPool<T> {
    fn default() -> Self {
        Self::new(16)
    }
}
