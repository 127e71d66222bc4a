//! # pose_channel
//!
//! A single-slot, latest-wins mailbox connecting one producer thread to one
//! consumer thread.
//!
//! * [`Publisher::publish`] never blocks: it drops whatever unread value is
//!   sitting in the slot and puts the new one there.
//! * [`Taker::try_take`] never blocks: it empties the slot, or returns
//!   `None` if nothing was published since the last take.
//!
//! The consumer only ever cares about the newest value, so intermediate
//! values lost under backpressure are simply gone.  Both ends hold the slot
//! lock only long enough to swap an `Option`, and a value becomes visible to
//! the taker as a whole, never half-written.
//!
//! ```rust
//! let (tx, rx) = pose_channel::mailbox();
//! tx.publish(1);
//! tx.publish(2);
//! assert_eq!(rx.try_take(), Some(2));
//! assert_eq!(rx.try_take(), None);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

// ════════════════════════════════════════════════════════════════════════════
// Shared slot
// ════════════════════════════════════════════════════════════════════════════

struct Slot<T> {
    latest:      Mutex<Option<T>>,
    published:   AtomicU64,
    overwritten: AtomicU64,
    taken:       AtomicU64,
}

/// Counters describing how the mailbox has been used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MailboxStats {
    /// Total values handed to `publish`.
    pub published:   u64,
    /// Values replaced before anyone took them.
    pub overwritten: u64,
    /// Values returned by `try_take`.
    pub taken:       u64,
}

/// Create a connected publisher/taker pair.
pub fn mailbox<T>() -> (Publisher<T>, Taker<T>) {
    let slot = Arc::new(Slot {
        latest:      Mutex::new(None),
        published:   AtomicU64::new(0),
        overwritten: AtomicU64::new(0),
        taken:       AtomicU64::new(0),
    });
    (Publisher { slot: Arc::clone(&slot) }, Taker { slot })
}

// ════════════════════════════════════════════════════════════════════════════
// Producer side
// ════════════════════════════════════════════════════════════════════════════

/// Producer end.  Not `Clone`: one producer keeps publishes totally ordered.
pub struct Publisher<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Publisher<T> {
    /// Store `value` as the latest.  Returns `true` if an unread value was
    /// replaced.
    pub fn publish(&self, value: T) -> bool {
        let previous = self.slot.latest.lock().replace(value);
        self.slot.published.fetch_add(1, Ordering::Relaxed);
        match previous {
            Some(_) => {
                self.slot.overwritten.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// False once the [`Taker`] has been dropped.
    pub fn is_connected(&self) -> bool {
        Arc::strong_count(&self.slot) > 1
    }

    pub fn stats(&self) -> MailboxStats { stats(&self.slot) }
}

// ════════════════════════════════════════════════════════════════════════════
// Consumer side
// ════════════════════════════════════════════════════════════════════════════

/// Consumer end.
pub struct Taker<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Taker<T> {
    /// Take the pending value, if any.
    pub fn try_take(&self) -> Option<T> {
        let value = self.slot.latest.lock().take();
        if value.is_some() {
            self.slot.taken.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// True if a value is waiting.  Only a hint: the producer may publish
    /// right after this returns.
    pub fn has_pending(&self) -> bool {
        self.slot.latest.lock().is_some()
    }

    /// False once the [`Publisher`] has been dropped.
    pub fn is_connected(&self) -> bool {
        Arc::strong_count(&self.slot) > 1
    }

    pub fn stats(&self) -> MailboxStats { stats(&self.slot) }
}

fn stats<T>(slot: &Slot<T>) -> MailboxStats {
    MailboxStats {
        published:   slot.published.load(Ordering::Relaxed),
        overwritten: slot.overwritten.load(Ordering::Relaxed),
        taken:       slot.taken.load(Ordering::Relaxed),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
