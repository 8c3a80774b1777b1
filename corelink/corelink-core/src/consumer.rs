use core::future::Future;

use embassy_futures::select::{Either, select};

use crate::channel::DetectionChannel;
use crate::error::LinkTimeout;
use crate::payload::DetectionPayload;

/// Facade used by the networking task. It never gets notified per message: it waits for the link
/// once, then polls for the freshest detection on its own schedule.
#[derive(Clone, Copy)]
pub struct Consumer<'c> {
    channel: &'c DetectionChannel,
}

impl<'c> Consumer<'c> {
    pub fn new(channel: &'c DetectionChannel) -> Self {
        Consumer { channel }
    }

    /// True once the peer core delivered its first message, forever after
    pub fn has_received_message(&self) -> bool {
        self.channel.cache().has_ever_received()
    }

    /// Copies the cached detection into `target` and clears it. Returns false (and leaves `target`
    /// alone) when nothing arrived since the last call.
    pub fn safe_get_and_clear_cached_detection(&self, target: &mut DetectionPayload) -> bool {
        self.channel.cache().try_take(target)
    }

    pub fn take_detection(&self) -> Option<DetectionPayload> {
        self.channel.cache().take()
    }

    pub fn has_pending(&self) -> bool {
        self.channel.cache().has_pending()
    }

    /// Waits for the first message from the peer core. Returns immediately once the link is up.
    pub async fn wait_for_link(&self) {
        self.channel.cache().latch().wait().await
    }

    /// Like [`Consumer::wait_for_link`], but gives up when `deadline` completes first, e.g. an
    /// `embassy_time::Timer`. The caller decides what the fallback is.
    pub async fn wait_for_link_or<F: Future>(&self, deadline: F) -> Result<(), LinkTimeout> {
        match select(self.wait_for_link(), deadline).await {
            Either::First(()) => Ok(()),
            // the latch may have flipped while the deadline fired
            Either::Second(_) if self.has_received_message() => Ok(()),
            Either::Second(_) => Err(LinkTimeout),
        }
    }
}
