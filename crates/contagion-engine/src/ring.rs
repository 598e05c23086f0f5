//! Fixed-capacity ring buffer of published field snapshots.
//!
//! [`SnapshotRing`] stores `Arc<FieldSnapshot>` slots with single-producer
//! push and multi-consumer read. Readers clone an `Arc` out of a slot and
//! never hold the engine lock. A reader that wants every published
//! snapshot, not just the newest, follows the write position with
//! [`since`](SnapshotRing::since).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::field::FieldSnapshot;

/// A tagged slot: the `u64` is the monotonic write position when this
/// snapshot was stored, enabling consumers to detect overwrites.
type Slot = Option<(u64, Arc<FieldSnapshot>)>;

/// A fixed-capacity ring buffer of `Arc<FieldSnapshot>`.
///
/// Single-producer: only the tick thread calls [`push`](Self::push).
/// Multi-consumer: any thread can call [`latest`](Self::latest) or
/// [`since`](Self::since).
///
/// The write position is monotonically increasing (never wraps). Slot
/// index is `pos % capacity`. Each slot stores its position tag so that a
/// consumer racing the producer can tell it is looking at a newer
/// snapshot than the one it asked for.
pub struct SnapshotRing {
    slots: Vec<Mutex<Slot>>,
    write_pos: AtomicU64,
    capacity: usize,
}

// Compile-time assertion: SnapshotRing must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SnapshotRing>();
};

impl SnapshotRing {
    /// Create a new ring buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2`. [`RealtimeConfig::validate`] rejects such
    /// sizes before a ring is built.
    ///
    /// [`RealtimeConfig::validate`]: crate::config::RealtimeConfig::validate
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "SnapshotRing capacity must be >= 2, got {capacity}");
        let slots = (0..capacity).map(|_| Mutex::new(None)).collect();
        Self {
            slots,
            write_pos: AtomicU64::new(0),
            capacity,
        }
    }

    /// Push a new snapshot, overwriting the oldest once full.
    /// Single-producer only.
    pub fn push(&self, snapshot: FieldSnapshot) {
        let pos = self.write_pos.load(Ordering::Relaxed);
        *self.slot(pos) = Some((pos, Arc::new(snapshot)));

        // Release-store ensures the snapshot is visible before consumers
        // observe the new write_pos.
        self.write_pos.store(pos + 1, Ordering::Release);
    }

    /// The most recently pushed snapshot, or `None` before the first push.
    pub fn latest(&self) -> Option<Arc<FieldSnapshot>> {
        let pos = self.write_pos.load(Ordering::Acquire);
        if pos == 0 {
            return None;
        }
        self.tagged(pos - 1)
    }

    /// Every snapshot pushed at position `pos` or later that is still
    /// held, oldest first, plus the position to resume from.
    ///
    /// Positions the producer has already overwritten are skipped, so a
    /// slow reader loses the oldest snapshots rather than blocking the
    /// tick thread. Start a new reader at `0`.
    pub fn since(&self, pos: u64) -> (Vec<Arc<FieldSnapshot>>, u64) {
        let end = self.write_pos.load(Ordering::Acquire);
        let start = pos.max(end.saturating_sub(self.capacity as u64));
        let snapshots = (start..end).filter_map(|p| self.tagged(p)).collect();
        (snapshots, end)
    }

    fn tagged(&self, pos: u64) -> Option<Arc<FieldSnapshot>> {
        match self.slot(pos).as_ref() {
            Some((tag, arc)) if *tag == pos => Some(Arc::clone(arc)),
            // Overwritten between the position check and the lock.
            _ => None,
        }
    }

    fn slot(&self, pos: u64) -> MutexGuard<'_, Slot> {
        self.slots[(pos as usize) % self.capacity]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
