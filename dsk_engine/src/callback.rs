//! User callback types and their atomic registration slots.
//!
//! Callbacks are plain `fn` pointers: the engine borrows them for the
//! lifetime of the session and never boxes or drops them, which keeps
//! registration a single scalar store the audio thread can observe
//! without locking.

use core::{marker::PhantomData, mem};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::format::{SampleKind, SampleRate};

/// Per-track audio callback: effect stage, input-ready or output-ready
/// notification. Receives the track id, the valid region of the track
/// buffer, the session format and rate, and the capture channel count.
pub type TrackCallback = fn(track_id: i32, buffer: &mut [u8], kind: SampleKind, rate: SampleRate, channels: usize);

/// Master-bus audio callback: master effect or master-output notification.
pub type MasterCallback = fn(buffer: &mut [u8], kind: SampleKind, rate: SampleRate, channels: usize);

/// A replaceable callback slot shared between the control thread and the
/// audio thread.
///
/// The pointer is stored as a `usize` (zero meaning "unset") so that
/// registration and lookup are single atomic operations. `F` must be a
/// `fn` pointer type; the public aliases above are the only instantiations.
pub struct CallbackCell<F> {
    bits: AtomicUsize,
    _marker: PhantomData<F>,
}

impl<F: Copy> CallbackCell<F> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        const {
            assert!(mem::size_of::<F>() == mem::size_of::<usize>());
        }
        Self {
            bits: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    /// Installs a callback, replacing any previous one.
    #[inline]
    pub fn set(&self, callback: F) {
        // SAFETY: `F` is a word-sized `fn` pointer (checked in `new`), so
        // its bits fit a `usize` and are never zero.
        let bits = unsafe { mem::transmute_copy::<F, usize>(&callback) };
        self.bits.store(bits, Ordering::Release);
    }

    /// Returns the installed callback, if any.
    #[inline]
    pub fn get(&self) -> Option<F> {
        let bits = self.bits.load(Ordering::Acquire);
        if bits == 0 {
            return None;
        }
        // SAFETY: `bits` was produced from a valid `fn` pointer of type
        // `F` in `set`.
        Some(unsafe { mem::transmute_copy::<usize, F>(&bits) })
    }

    /// Removes the installed callback.
    #[inline]
    pub fn clear(&self) {
        self.bits.store(0, Ordering::Release);
    }
}

impl<F: Copy> Default for CallbackCell<F> {
    fn default() -> Self {
        Self::new()
    }
}
