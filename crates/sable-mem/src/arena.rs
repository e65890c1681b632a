//! Bump-pointer arena for scratch allocations.
//!
//! An [`Arena`] hands out memory from a list of chunks. Nothing is freed
//! individually: every allocation is invalidated at once by [`Arena::reset`]
//! or by dropping the arena. Chunk memory is zero-initialised and never moves,
//! so allocation only needs `&self` and many live buffers can coexist.
//!
//! Running out of memory is fatal: chunk allocation failure goes through
//! [`std::alloc::handle_alloc_error`] and aborts.
//!
//! # Example
//!
//! ```
//! use sable_mem::Arena;
//!
//! let arena = Arena::new(8192);
//!
//! let path = arena.alloc_str("/usr/lib");
//! let buf = arena.alloc_bytes(16);
//! buf[0] = b'x';
//!
//! assert_eq!(path, "/usr/lib");
//! assert_eq!(buf.len(), 16);
//! ```

use std::alloc::{self, Layout};
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

/// Alignment of every chunk and the minimum alignment of every allocation.
const CHUNK_ALIGNMENT: usize = 16;

/// Smallest chunk an arena will create (8 KiB).
pub const MIN_CHUNK_SIZE: usize = 8192;

/// Largest chunk created by growth (1 MiB). Oversized requests get a chunk of
/// their own.
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Allocation statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Bytes handed out since creation or the last reset.
    pub total_allocated: usize,
    /// Number of chunks currently owned.
    pub chunk_count: usize,
    /// Sum of chunk capacities.
    pub total_capacity: usize,
}

struct Chunk {
    start: NonNull<u8>,
    capacity: usize,
}

impl Chunk {
    fn new(capacity: usize) -> Self {
        let layout = Self::layout(capacity);
        // SAFETY: layout has non-zero size (capacity >= MIN_CHUNK_SIZE).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(start) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };
        Chunk { start, capacity }
    }

    fn layout(capacity: usize) -> Layout {
        match Layout::from_size_align(capacity, CHUNK_ALIGNMENT) {
            Ok(layout) => layout,
            Err(_) => panic!("arena chunk of {capacity} bytes exceeds isize::MAX"),
        }
    }

    fn end(&self) -> *mut u8 {
        self.start.as_ptr().wrapping_add(self.capacity)
    }

    /// Zeroes the first `used` bytes so recycled memory reads as fresh.
    fn clear(&mut self, used: usize) {
        // SAFETY: used <= capacity; the region belongs to this chunk.
        unsafe { std::ptr::write_bytes(self.start.as_ptr(), 0, used.min(self.capacity)) };
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: start was allocated with exactly this layout.
        unsafe { alloc::dealloc(self.start.as_ptr(), Self::layout(self.capacity)) };
    }
}

/// Single-threaded bump allocator.
///
/// `Arena` is `!Sync`; one arena belongs to one VM scope.
pub struct Arena {
    chunks: RefCell<Vec<Chunk>>,
    /// Next free byte in the current chunk.
    ptr: Cell<*mut u8>,
    /// One past the last byte of the current chunk.
    end: Cell<*mut u8>,
    chunk_size: usize,
    allocated: Cell<usize>,
}

impl Arena {
    /// Creates an arena whose chunks start at `chunk_size` bytes.
    ///
    /// The size is clamped to [`MIN_CHUNK_SIZE`] and rounded up to a power of
    /// two.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        let size = chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE).next_power_of_two();
        let first = Chunk::new(size);
        let (ptr, end) = (first.start.as_ptr(), first.end());

        Arena {
            chunks: RefCell::new(vec![first]),
            ptr: Cell::new(ptr),
            end: Cell::new(end),
            chunk_size: size,
            allocated: Cell::new(0),
        }
    }

    /// Size of the first chunk after clamping.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn alloc_raw(&self, size: usize, align: usize) -> NonNull<u8> {
        let align = align.max(1);
        if let Some(ptr) = self.bump(size, align) {
            return ptr;
        }
        self.grow(size + align);
        match self.bump(size, align) {
            Some(ptr) => ptr,
            None => unreachable!("fresh chunk is large enough for the request"),
        }
    }

    #[inline]
    fn bump(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let current = self.ptr.get();
        let start = current.addr().checked_add(align - 1)? & !(align - 1);
        let new_end = start.checked_add(size)?;
        if new_end > self.end.get().addr() {
            return None;
        }
        self.ptr.set(current.with_addr(new_end));
        self.allocated.set(self.allocated.get() + size);
        NonNull::new(current.with_addr(start))
    }

    #[cold]
    fn grow(&self, min_size: usize) {
        let mut chunks = self.chunks.borrow_mut();
        let last = chunks.last().map_or(self.chunk_size, |c| c.capacity);
        let size = (last * 2)
            .min(MAX_CHUNK_SIZE)
            .max(min_size.next_power_of_two());
        let chunk = Chunk::new(size);
        self.ptr.set(chunk.start.as_ptr());
        self.end.set(chunk.end());
        chunks.push(chunk);
    }

    /// Copies `value` into the arena. Destructors never run, hence `Copy`.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc<T: Copy>(&self, value: T) -> &mut T {
        let ptr = self
            .alloc_raw(std::mem::size_of::<T>(), std::mem::align_of::<T>())
            .cast::<T>();
        // SAFETY: ptr is aligned for T, sized for T, and not handed out twice.
        unsafe {
            ptr.as_ptr().write(value);
            &mut *ptr.as_ptr()
        }
    }

    /// Returns `len` zeroed bytes valid until the next reset.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_bytes(&self, len: usize) -> &mut [u8] {
        if len == 0 {
            return &mut [];
        }
        let ptr = self.alloc_raw(len, 1);
        // SAFETY: the region is in bounds, zeroed, and exclusively ours.
        unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) }
    }

    /// Copies `s` into the arena.
    pub fn alloc_str(&self, s: &str) -> &str {
        let buf = self.alloc_bytes(s.len());
        buf.copy_from_slice(s.as_bytes());
        // SAFETY: bytes were copied verbatim from a valid str.
        unsafe { std::str::from_utf8_unchecked(buf) }
    }

    /// Invalidates every allocation and keeps only the first chunk.
    pub fn reset(&mut self) {
        let chunks = self.chunks.get_mut();
        chunks.truncate(1);
        let first = &mut chunks[0];
        first.clear(first.capacity);
        self.ptr.set(first.start.as_ptr());
        self.end.set(first.end());
        self.allocated.set(0);
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let chunks = self.chunks.borrow();
        ArenaStats {
            total_allocated: self.allocated.get(),
            chunk_count: chunks.len(),
            total_capacity: chunks.iter().map(|c| c.capacity).sum(),
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(MIN_CHUNK_SIZE)
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("chunk_size", &self.chunk_size)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_is_clamped() {
        assert_eq!(Arena::new(64).chunk_size(), MIN_CHUNK_SIZE);
        assert_eq!(Arena::new(10_000).chunk_size(), 16384);
        assert_eq!(Arena::new(usize::MAX / 4).chunk_size(), MAX_CHUNK_SIZE);
    }

    #[test]
    fn test_alloc_values() {
        let arena = Arena::new(8192);
        let a = arena.alloc(1u32);
        let b = arena.alloc(2u64);
        *a += 10;

        assert_eq!(*a, 11);
        assert_eq!(*b, 2);
        assert_eq!((b as *const u64).addr() % std::mem::align_of::<u64>(), 0);
    }

    #[test]
    fn test_buffers_are_zeroed_and_disjoint() {
        let arena = Arena::new(8192);
        let first = arena.alloc_bytes(32);
        let second = arena.alloc_bytes(32);

        assert!(first.iter().all(|&b| b == 0));
        first.fill(0xAA);
        assert!(second.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_buffer() {
        let arena = Arena::new(8192);
        assert!(arena.alloc_bytes(0).is_empty());
        assert_eq!(arena.alloc_str(""), "");
        assert_eq!(arena.stats().total_allocated, 0);
    }

    #[test]
    fn test_growth_adds_chunks() {
        let arena = Arena::new(8192);
        let strings: Vec<&str> = (0..2000)
            .map(|i| arena.alloc_str(&format!("segment-{i:04}")))
            .collect();

        assert!(arena.stats().chunk_count > 1);
        for (i, s) in strings.iter().enumerate() {
            assert_eq!(*s, format!("segment-{i:04}"));
        }
    }

    #[test]
    fn test_oversized_request_gets_dedicated_chunk() {
        let arena = Arena::new(8192);
        let big = arena.alloc_bytes(3 * MAX_CHUNK_SIZE);

        assert_eq!(big.len(), 3 * MAX_CHUNK_SIZE);
        assert!(arena.stats().total_capacity >= 3 * MAX_CHUNK_SIZE);
    }

    #[test]
    fn test_reset_reclaims_and_rezeroes() {
        let mut arena = Arena::new(8192);
        arena.alloc_bytes(4).fill(7);
        for _ in 0..100 {
            arena.alloc_bytes(1024);
        }
        assert!(arena.stats().chunk_count > 1);

        arena.reset();
        let stats = arena.stats();
        assert_eq!(stats.chunk_count, 1);
        assert_eq!(stats.total_allocated, 0);
        assert_eq!(arena.alloc_bytes(4), &[0, 0, 0, 0]);
    }
}
