//! Lock-free SPSC (Single Producer, Single Consumer) byte ring buffer.
//!
//! Every stream of the CLI (input, echo, response, trace) is one of these.
//!
//! # Architecture
//!
//! ```text
//! Producer ──write()──▶ [..tail) RingBuffer [head..) ──read()──▶ Consumer
//!                       free-running u32 counters, masked by N - 1
//! ```
//!
//! # Rules
//!
//! - Capacity is a power of two (masking instead of comparisons)
//! - `tail` only advances on the producer side, `head` only on the consumer side
//! - No operation blocks, no operation allocates
//! - Overflow is the caller's job: check `slots_available()` before `write()`

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Fixed-capacity circular byte queue.
///
/// # Safety
///
/// Uses `UnsafeCell` internally but is safe to share because:
/// - At most one [`Producer`] and one [`Consumer`] exist per buffer
///   (`split()` takes `&mut self`; the port hands them out exactly once)
/// - The producer only writes slots in `[tail, head + N)`, the consumer only
///   reads slots in `[head, tail)`, so no slot is touched by both at once
///
/// # Memory Ordering
///
/// - Producer stores `tail` with `Release` after writing the slot
/// - Consumer stores `head` with `Release` after reading the slot
/// - Each side loads the other side's counter with `Acquire`
pub struct RingBuffer<const N: usize> {
    /// Backing storage.
    slots: UnsafeCell<[u8; N]>,

    /// Next write index (monotonically increasing, wraps via mask).
    tail: AtomicU32,

    /// Next read index (monotonically increasing, wraps via mask).
    head: AtomicU32,
}

// SAFETY: Single producer, single consumer, atomic coordination.
// Slot ownership is partitioned by the head/tail counters.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}
unsafe impl<const N: usize> Send for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    /// Mask for wrapping an index to the buffer size.
    const MASK: u32 = (N as u32).wrapping_sub(1);

    /// Create a new empty buffer.
    ///
    /// # Panics
    ///
    /// Panics at compile time if N is not a power of 2.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Ring buffer size must be power of 2");
        assert!(N <= 1 << 31, "Ring buffer size must fit the u32 counters");

        Self {
            slots: UnsafeCell::new([0; N]),
            tail: AtomicU32::new(0),
            head: AtomicU32::new(0),
        }
    }

    /// Split into the single producer and the single consumer.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Producer handle from a shared reference.
    ///
    /// # Safety
    ///
    /// The caller guarantees no other `Producer` for this buffer is alive.
    pub(crate) unsafe fn producer(&self) -> Producer<'_, N> {
        Producer { ring: self }
    }

    /// Consumer handle from a shared reference.
    ///
    /// # Safety
    ///
    /// The caller guarantees no other `Consumer` for this buffer is alive.
    pub(crate) unsafe fn consumer(&self) -> Consumer<'_, N> {
        Consumer { ring: self }
    }

    /// Get the buffer capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of occupied slots (`tail - head`).
    #[inline]
    pub fn bytes_available(&self) -> u32 {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    /// Number of free slots (`capacity - occupied`).
    #[inline]
    pub fn slots_available(&self) -> u32 {
        (N as u32).saturating_sub(self.bytes_available())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.bytes_available() >= N as u32
    }

    #[inline]
    fn slot_ptr(&self, idx: u32) -> *mut u8 {
        // Stays inside the array: idx & MASK < N.
        self.slots.get().cast::<u8>().wrapping_add((idx & Self::MASK) as usize)
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write side of a [`RingBuffer`]. Not `Clone`: one per buffer.
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Insert a byte at the tail.
    ///
    /// The buffer never grows. Writing while `slots_available() == 0`
    /// overwrites the oldest unread byte (index aliasing); check first.
    ///
    /// # Timing
    ///
    /// O(1), never blocks.
    #[inline]
    pub fn write(&mut self, byte: u8) {
        let tail = self.ring.tail.load(Ordering::Relaxed);

        // SAFETY: Single producer; the slot at `tail` is outside [head, tail)
        // whenever the caller respected the free-slot precondition.
        unsafe {
            self.ring.slot_ptr(tail).write(byte);
        }

        self.ring.tail.store(tail.wrapping_add(1), Ordering::Release);
    }

    #[inline]
    pub fn slots_available(&self) -> u32 {
        self.ring.slots_available()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

/// Read side of a [`RingBuffer`]. Not `Clone`: one per buffer.
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Remove the byte at the head.
    ///
    /// Caller must have checked `is_not_empty()`; reading an empty buffer
    /// returns a stale byte and leaves `head` ahead of `tail`.
    #[inline]
    pub fn read(&mut self) -> u8 {
        let head = self.ring.head.load(Ordering::Relaxed);

        // SAFETY: Single consumer; the slot at `head` is inside [head, tail)
        // and the producer published it with a Release store of `tail`.
        let byte = unsafe { self.ring.slot_ptr(head).read() };

        self.ring.head.store(head.wrapping_add(1), Ordering::Release);
        byte
    }

    #[inline]
    pub fn bytes_available(&self) -> u32 {
        self.ring.bytes_available()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn is_not_empty(&self) -> bool {
        self.ring.is_not_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_basic_write_read() {
        let mut ring = RingBuffer::<8>::new();
        let (mut tx, mut rx) = ring.split();

        assert!(rx.is_empty());
        tx.write(b'a');
        tx.write(b'b');

        assert_eq!(rx.bytes_available(), 2);
        assert_eq!(tx.slots_available(), 6);
        assert_eq!(rx.read(), b'a');
        assert_eq!(rx.read(), b'b');
        assert!(rx.is_empty());
    }

    #[test]
    fn test_ring_full_detection() {
        let mut ring = RingBuffer::<4>::new();
        let (mut tx, _rx) = ring.split();

        for b in 0..4 {
            assert!(!tx.is_full());
            tx.write(b);
        }

        assert!(tx.is_full());
        assert_eq!(tx.slots_available(), 0);
    }

    #[test]
    fn test_ring_counter_wraparound() {
        let mut ring = RingBuffer::<4>::new();
        ring.tail = AtomicU32::new(u32::MAX - 1);
        ring.head = AtomicU32::new(u32::MAX - 1);

        let (mut tx, mut rx) = ring.split();
        for b in 1..=4 {
            tx.write(b);
        }

        assert!(tx.is_full());
        assert_eq!(rx.bytes_available(), 4);
        for b in 1..=4 {
            assert_eq!(rx.read(), b);
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn test_ring_shared_handles() {
        let ring = RingBuffer::<16>::new();

        // SAFETY: exactly one producer and one consumer in this test.
        let (mut tx, mut rx) = unsafe { (ring.producer(), ring.consumer()) };
        tx.write(42);

        assert_eq!(ring.bytes_available(), 1);
        assert_eq!(rx.read(), 42);
        assert!(ring.is_empty());
    }
}
