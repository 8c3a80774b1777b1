use crate::endpoint::{Endpoint, EndpointConfig};
use crate::envelope::Envelope;
use crate::error::TransportError;
use crate::payload::DetectionPayload;
use crate::platform::MailboxPlatform;

/// Facade used by the sensor task. The task fills the payload slot in place and publishes it;
/// a busy transport drops that detection and the next cycle simply tries again.
pub struct Producer<'p, P: MailboxPlatform + ?Sized> {
    endpoint: Endpoint<'p, P>,
    peer_address: u8,
    peer_interrupt_mask: u16,
    slot: DetectionPayload,
    published: u32,
    dropped: u32,
    drop_streak: u32,
}

impl<'p, P: MailboxPlatform + ?Sized> Producer<'p, P> {
    pub fn new(endpoint: Endpoint<'p, P>, peer: &EndpointConfig) -> Self {
        Producer {
            endpoint,
            peer_address: peer.address,
            peer_interrupt_mask: peer.interrupt_mask(),
            slot: DetectionPayload::empty(),
            published: 0,
            dropped: 0,
            drop_streak: 0,
        }
    }

    /// The payload that the next [`Producer::publish`] sends. Keeps its contents between publishes.
    pub fn acquire_payload_slot(&mut self) -> &mut DetectionPayload {
        &mut self.slot
    }

    pub fn get_payload_slot(&mut self) -> &mut DetectionPayload {
        self.acquire_payload_slot()
    }

    /// Wraps the slot in an envelope and hands it to the mailbox. Not retried on failure.
    pub fn publish(&mut self) -> Result<(), TransportError> {
        let frame = Envelope::encode_parts(
            self.endpoint.config().client_id,
            self.peer_interrupt_mask,
            &self.slot,
        );

        match self.endpoint.send_frame(self.peer_address, &frame) {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                if self.drop_streak > 0 {
                    defmt::info!("Mailbox accepts detections again, {} were dropped", self.drop_streak);
                }

                self.drop_streak = 0;
                self.published += 1;
                Ok(())
            }
            Err(e) => {
                // only the first drop of a burst is logged
                #[cfg(feature = "defmt")]
                if !e.is_busy() {
                    defmt::error!("Detection {} not sent: {}", self.slot.label_id, e);
                } else if self.drop_streak == 0 {
                    defmt::warn!("Mailbox busy, dropping detections: {}", e);
                }

                self.drop_streak = self.drop_streak.saturating_add(1);
                self.dropped = self.dropped.saturating_add(1);
                Err(e)
            }
        }
    }

    pub fn endpoint(&self) -> &Endpoint<'p, P> {
        &self.endpoint
    }

    pub fn published_count(&self) -> u32 {
        self.published
    }

    /// Detections that never left this core
    pub fn dropped_count(&self) -> u32 {
        self.dropped
    }
}
