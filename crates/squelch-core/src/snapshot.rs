//! Latest-wins snapshot hand-off from the control thread to the audio thread.
//!
//! A fixed pool of boxed slots circulates between two pre-sized channels:
//! a one-slot `pending` channel carrying the newest snapshot to the audio
//! thread, and a `free` channel returning slots to the control thread. Every
//! slot is allocated in [`snapshot_channel`]; afterwards nothing on either
//! side allocates or frees, and a slot is only ever owned by one side.
//!
//! ```rust
//! use squelch_core::snapshot_channel;
//!
//! let (mut tx, mut rx) = snapshot_channel(vec![0.0f64; 4], 3);
//! tx.publish(&vec![0.1; 4]);
//! tx.publish(&vec![0.2; 4]);
//!
//! let claimed = rx.try_claim().unwrap();
//! assert_eq!(claimed[0], 0.2);
//! assert_eq!(claimed.generation(), 2);
//! drop(claimed);
//! assert!(rx.try_claim().is_none());
//! ```

use core::ops::Deref;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// Smallest pool that guarantees a publish always finds a slot.
pub const MIN_POOL: usize = 2;

/// Largest accepted pool.
pub const MAX_POOL: usize = 16;

/// Default pool size.
pub const DEFAULT_POOL: usize = 3;

/// A published value and its sequence number.
#[derive(Debug)]
struct Snapshot<T> {
    generation: u64,
    value: T,
}

type Slot<T> = Box<Snapshot<T>>;

/// Build a connected publisher/receiver pair.
///
/// `pool` is clamped to `2..=16`. Every slot starts as a clone of `initial`.
pub fn snapshot_channel<T: Clone>(
    initial: T,
    pool: usize,
) -> (SnapshotPublisher<T>, SnapshotReceiver<T>) {
    let pool = pool.clamp(MIN_POOL, MAX_POOL);
    let (pending_tx, pending_rx) = bounded::<Slot<T>>(1);
    let (free_tx, free_rx) = bounded::<Slot<T>>(pool);
    for _ in 0..pool {
        let slot = Box::new(Snapshot {
            generation: 0,
            value: initial.clone(),
        });
        // Capacity is exactly `pool`.
        let _ = free_tx.try_send(slot);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(pool, "snapshot channel created");

    (
        SnapshotPublisher {
            pending_tx,
            reclaim_rx: pending_rx.clone(),
            free_rx,
            generation: 0,
            dropped: 0,
        },
        SnapshotReceiver {
            pending_rx,
            free_tx,
            retired: Vec::with_capacity(pool),
            last_generation: 0,
        },
    )
}

/// Control-thread half.
#[derive(Debug)]
pub struct SnapshotPublisher<T> {
    pending_tx: Sender<Slot<T>>,
    reclaim_rx: Receiver<Slot<T>>,
    free_rx: Receiver<Slot<T>>,
    generation: u64,
    dropped: u64,
}

impl<T: Clone> SnapshotPublisher<T> {
    /// Publish a copy of `value`, replacing any snapshot not yet claimed.
    ///
    /// Returns `false` when no slot is available. The value is not published
    /// in that case.
    pub fn publish(&mut self, value: &T) -> bool {
        // An unclaimed snapshot is stale now; reuse its slot.
        let slot = self
            .reclaim_rx
            .try_recv()
            .ok()
            .or_else(|| self.free_rx.try_recv().ok());
        let Some(mut slot) = slot else {
            self.note_dropped("no free slot");
            return false;
        };

        slot.value.clone_from(value);
        slot.generation = self.generation + 1;
        match self.pending_tx.try_send(slot) {
            Ok(()) => {
                self.generation += 1;
                true
            }
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                // Unreachable while this side holds `reclaim_rx` and drains it above.
                self.note_dropped("pending slot occupied");
                false
            }
        }
    }
}

impl<T> SnapshotPublisher<T> {
    /// Number of successful publishes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of publishes that found no slot.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn note_dropped(&mut self, _reason: &'static str) {
        self.dropped += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(reason = _reason, generation = self.generation, "snapshot publish dropped");
    }
}

/// Audio-thread half.
#[derive(Debug)]
pub struct SnapshotReceiver<T> {
    pending_rx: Receiver<Slot<T>>,
    free_tx: Sender<Slot<T>>,
    /// Slots released after the publisher hung up. Never reallocates: the
    /// capacity is the pool size. Freed when the receiver drops.
    retired: Vec<Slot<T>>,
    last_generation: u64,
}

impl<T> SnapshotReceiver<T> {
    /// Take the newest snapshot, if one was published since the last claim.
    ///
    /// Never blocks. The slot goes back to the pool when the guard drops.
    pub fn try_claim(&mut self) -> Option<Claimed<'_, T>> {
        let slot = self.pending_rx.try_recv().ok()?;
        self.last_generation = slot.generation;
        Some(Claimed {
            slot: Some(slot),
            free_tx: &self.free_tx,
            retired: &mut self.retired,
        })
    }

    /// Generation of the most recent claim, 0 before the first.
    pub fn last_generation(&self) -> u64 {
        self.last_generation
    }
}

/// A claimed snapshot. Dereferences to the published value.
#[derive(Debug)]
pub struct Claimed<'a, T> {
    slot: Option<Slot<T>>,
    free_tx: &'a Sender<Slot<T>>,
    retired: &'a mut Vec<Slot<T>>,
}

impl<T> Claimed<'_, T> {
    /// Publish sequence number of this value, starting at 1.
    pub fn generation(&self) -> u64 {
        self.slot.as_ref().map_or(0, |s| s.generation)
    }
}

impl<T> Deref for Claimed<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.slot {
            Some(slot) => &slot.value,
            None => unreachable!("slot is only taken in drop"),
        }
    }
}

impl<T> Drop for Claimed<'_, T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take()
            && let Err(err) = self.free_tx.try_send(slot)
        {
            // Publisher gone. Park the slot instead of freeing it on this thread.
            self.retired.push(err.into_inner());
        }
    }
}
