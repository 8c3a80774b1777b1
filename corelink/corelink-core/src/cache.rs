//! Single-slot, last-value-wins handoff between the mailbox interrupt (writer) and the consumer
//! task (reader).
//!
//! Both sides touch the slot only inside a critical section that covers nothing but the copy and
//! the flag update, so a take either sees a write completely or not at all. There is no queue:
//! a write that lands before the previous payload was taken replaces it.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use portable_atomic::{AtomicU32, Ordering};

use crate::latch::ReadinessLatch;
use crate::payload::DetectionPayload;

struct Slot {
    payload: DetectionPayload,
    unconsumed: bool,
}

pub struct DetectionCache {
    slot: Mutex<CriticalSectionRawMutex, RefCell<Slot>>,
    latch: ReadinessLatch,
    overwritten: AtomicU32,
}

impl DetectionCache {
    pub const fn new() -> Self {
        DetectionCache {
            slot: Mutex::new(RefCell::new(Slot {
                payload: DetectionPayload::empty(),
                unconsumed: false,
            })),
            latch: ReadinessLatch::new(),
            overwritten: AtomicU32::new(0),
        }
    }

    /// Write path. Delivery (interrupt) context only.
    pub fn on_message_received(&self, payload: &DetectionPayload) {
        // the latch flips in the same critical section as the slot write, so no reader can see a
        // fresh payload while the link still reads as down
        let (replaced_unconsumed, first) = self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            slot.payload.clone_from(payload);
            let replaced = core::mem::replace(&mut slot.unconsumed, true);
            (replaced, self.latch.mark_ready())
        });

        if replaced_unconsumed {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }

        if first {
            self.latch.wake();
            #[cfg(feature = "defmt")]
            defmt::info!("Cross-core link is up, first detection received");
        }
    }

    /// Read-and-clear. Task context only. Leaves `out` untouched when nothing new arrived.
    pub fn try_take(&self, out: &mut DetectionPayload) -> bool {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            if !slot.unconsumed {
                return false;
            }

            out.clone_from(&slot.payload);
            slot.unconsumed = false;
            true
        })
    }

    pub fn take(&self) -> Option<DetectionPayload> {
        let mut out = DetectionPayload::empty();
        self.try_take(&mut out).then_some(out)
    }

    /// Peeks at the unconsumed flag without clearing it. Diagnostics only.
    pub fn has_pending(&self) -> bool {
        self.slot.lock(|slot| slot.borrow().unconsumed)
    }

    pub fn has_ever_received(&self) -> bool {
        self.latch.is_ready()
    }

    pub fn latch(&self) -> &ReadinessLatch {
        &self.latch
    }

    /// Number of payloads replaced before the consumer took them
    pub fn overwritten_count(&self) -> u32 {
        self.overwritten.load(Ordering::Relaxed)
    }
}

impl Default for DetectionCache {
    fn default() -> Self {
        Self::new()
    }
}
