//! Lock-free single-producer single-consumer byte ring.
//!
//! One ring carries the samples of a single hardware channel from the
//! capture callback to the render callback. Both sides move whole byte
//! slices, so any wire format passes through untouched and a callback
//! never pays more than two `memcpy`s per exchange.

use core::cell::UnsafeCell;

#[cfg(not(loom))]
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

#[cfg(loom)]
use loom::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Cache-line padded wrapper to prevent false sharing.
///
/// Head and tail live on separate cache lines so the producer and
/// consumer threads do not invalidate each other's line on every
/// advance.
#[repr(align(64))]
struct CachePadded<T>(T);

impl<T> CachePadded<T> {
    const fn new(value: T) -> Self {
        CachePadded(value)
    }
}

impl<T> core::ops::Deref for CachePadded<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Internal shared state for the byte ring.
struct ByteRingInner {
    buffer: Box<[UnsafeCell<u8>]>,
    capacity: usize,
    mask: usize,
    head: CachePadded<AtomicUsize>, // Write position (producer)
    tail: CachePadded<AtomicUsize>, // Read position (consumer)
}

// SAFETY: the producer only writes bytes between tail and head + n before
// publishing head with a release store; the consumer only reads bytes the
// matching acquire load has made visible. No byte is accessed by both
// sides at once.
unsafe impl Send for ByteRingInner {}
unsafe impl Sync for ByteRingInner {}

impl ByteRingInner {
    fn new(capacity: usize) -> Self {
        // Round up to next power of 2
        let capacity = capacity.next_power_of_two().max(1);
        let mask = capacity - 1;

        let buffer: Vec<UnsafeCell<u8>> = (0..capacity).map(|_| UnsafeCell::new(0)).collect();

        Self {
            buffer: buffer.into_boxed_slice(),
            capacity,
            mask,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    #[inline]
    fn slot_ptr(&self, index: usize) -> *mut u8 {
        self.buffer[index & self.mask].get()
    }
}

/// Factory for creating producer/consumer pairs.
pub struct ByteRing;

impl ByteRing {
    /// Creates a new SPSC byte ring with at least the given capacity.
    ///
    /// The actual capacity is rounded up to the next power of 2. The
    /// buffer starts zero-filled. Returns a `(Producer, Consumer)` pair
    /// for inter-thread transfer.
    ///
    /// # Examples
    ///
    /// ```
    /// use dsk_core::ring::ByteRing;
    ///
    /// let (mut producer, mut consumer) = ByteRing::with_capacity(8);
    ///
    /// assert_eq!(producer.write_from(&[1, 2, 3]), 3);
    /// let mut out = [0u8; 3];
    /// assert_eq!(consumer.read_into(&mut out), 3);
    /// assert_eq!(out, [1, 2, 3]);
    /// ```
    pub fn with_capacity(capacity: usize) -> (RingProducer, RingConsumer) {
        let inner = Arc::new(ByteRingInner::new(capacity));
        (
            RingProducer {
                inner: Arc::clone(&inner),
            },
            RingConsumer { inner },
        )
    }
}

/// Producer handle for appending bytes to the ring.
///
/// This type is `Send` but not `Clone` - only one producer may exist.
pub struct RingProducer {
    inner: Arc<ByteRingInner>,
}

impl RingProducer {
    /// Copies as many bytes of `src` into the ring as fit.
    ///
    /// Returns the number of bytes written, which is less than
    /// `src.len()` when the ring is (or becomes) full. This operation is
    /// wait-free and never blocks.
    pub fn write_from(&mut self, src: &[u8]) -> usize {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Acquire);

        let free = self.inner.capacity - head.wrapping_sub(tail);
        let n = free.min(src.len());
        if n == 0 {
            return 0;
        }

        let index = head & self.inner.mask;
        let first = n.min(self.inner.capacity - index);
        // SAFETY: the `n` slots starting at `head` are unoccupied (checked
        // against `tail` above) and only this producer writes them. The
        // two segments are contiguous slot ranges.
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_ptr(), self.inner.slot_ptr(index), first);
            if n > first {
                core::ptr::copy_nonoverlapping(src.as_ptr().add(first), self.inner.slot_ptr(0), n - first);
            }
        }

        self.inner.head.store(head.wrapping_add(n), Ordering::Release);
        n
    }

    /// Returns the number of bytes currently readable.
    ///
    /// Approximate: the consumer may advance concurrently.
    #[inline]
    pub fn fill_count(&self) -> usize {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    /// Returns the number of bytes currently writable.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.inner.capacity - self.fill_count()
    }

    /// Returns the capacity of the ring in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

/// Consumer handle for draining bytes from the ring.
///
/// This type is `Send` but not `Clone` - only one consumer may exist.
pub struct RingConsumer {
    inner: Arc<ByteRingInner>,
}

impl RingConsumer {
    /// Copies up to `dst.len()` readable bytes out of the ring.
    ///
    /// Returns the number of bytes read and advances the read position by
    /// exactly that amount. This operation is wait-free and never blocks.
    pub fn read_into(&mut self, dst: &mut [u8]) -> usize {
        let tail = self.inner.tail.load(Ordering::Relaxed);
        let head = self.inner.head.load(Ordering::Acquire);

        let fill = head.wrapping_sub(tail);
        let n = fill.min(dst.len());
        if n == 0 {
            return 0;
        }

        let index = tail & self.inner.mask;
        let first = n.min(self.inner.capacity - index);
        // SAFETY: the `n` slots starting at `tail` were published by the
        // acquire load of `head` and only this consumer reads them.
        unsafe {
            core::ptr::copy_nonoverlapping(self.inner.slot_ptr(index), dst.as_mut_ptr(), first);
            if n > first {
                core::ptr::copy_nonoverlapping(self.inner.slot_ptr(0), dst.as_mut_ptr().add(first), n - first);
            }
        }

        self.inner.tail.store(tail.wrapping_add(n), Ordering::Release);
        n
    }

    /// Returns the number of bytes currently readable.
    ///
    /// Approximate: the producer may advance concurrently.
    #[inline]
    pub fn fill_count(&self) -> usize {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    /// Returns `true` if no bytes are readable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fill_count() == 0
    }

    /// Returns the capacity of the ring in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}


#[cfg(loom)]
mod loom_tests {
    use loom::thread;

    use super::*;

    #[test]
    fn loom_concurrent_write_read() {
        loom::model(|| {
            let (mut producer, mut consumer) = ByteRing::with_capacity(2);

            let producer_thread = thread::spawn(move || {
                producer.write_from(&[7]);
                producer.write_from(&[8]);
            });

            let consumer_thread = thread::spawn(move || {
                let mut out = [0u8; 2];
                let mut seen = Vec::new();
                for _ in 0..2 {
                    let n = consumer.read_into(&mut out);
                    seen.extend_from_slice(&out[..n]);
                }
                seen
            });

            producer_thread.join().unwrap();
            let seen = consumer_thread.join().unwrap();

            // Whatever arrived must be a prefix of what was written
            assert!([&[][..], &[7][..], &[7, 8][..]].contains(&seen.as_slice()));
        });
    }
}
