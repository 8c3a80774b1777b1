use portable_atomic::{AtomicU32, Ordering};

use crate::cache::DetectionCache;
use crate::consumer::Consumer;
use crate::endpoint::EndpointConfig;
use crate::envelope::Envelope;
use crate::platform::EnvelopeHandler;

/// Consumer-side end of the link: the detection cache plus the routing check on incoming
/// envelopes. Built once at bring-up (usually in a `static`) and handed to the consumer endpoint
/// as its receive handler.
pub struct DetectionChannel {
    cache: DetectionCache,
    producer_client: u8,
    rejected: AtomicU32,
}

impl DetectionChannel {
    /// Channel accepting envelopes sent by the client `producer_client`
    pub const fn new(producer_client: u8) -> Self {
        DetectionChannel {
            cache: DetectionCache::new(),
            producer_client,
            rejected: AtomicU32::new(0),
        }
    }

    pub const fn for_producer(producer: &EndpointConfig) -> Self {
        Self::new(producer.client_id)
    }

    pub fn consumer(&self) -> Consumer<'_> {
        Consumer::new(self)
    }

    pub fn cache(&self) -> &DetectionCache {
        &self.cache
    }

    /// Envelopes dropped because they came from another client
    pub fn rejected_count(&self) -> u32 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl EnvelopeHandler for DetectionChannel {
    fn on_envelope(&self, envelope: &Envelope) {
        if envelope.client_id != self.producer_client {
            self.rejected.fetch_add(1, Ordering::Relaxed);

            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Dropping envelope from client {} (expected {})",
                envelope.client_id,
                self.producer_client
            );
            return;
        }

        self.cache.on_message_received(&envelope.payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::PRODUCER_ENDPOINT;
    use crate::payload::DetectionPayload;

    #[test]
    fn test_accepts_only_producer_client() {
        let channel = DetectionChannel::for_producer(&PRODUCER_ENDPOINT);
        let payload = DetectionPayload::with_label(1, "down").unwrap();

        channel.on_envelope(&Envelope::new(7, 0, payload.clone()));
        assert_eq!(channel.rejected_count(), 1);
        assert!(!channel.cache().has_ever_received());

        channel.on_envelope(&Envelope::new(PRODUCER_ENDPOINT.client_id, 0, payload.clone()));
        assert_eq!(channel.cache().take(), Some(payload));
    }

    #[test]
    fn test_on_frame_decodes_and_reports_malformed_frames() {
        let channel = DetectionChannel::new(5);
        let payload = DetectionPayload::with_label(2, "top").unwrap();
        let frame = Envelope::new(5, 0x0200, payload.clone()).encode();

        assert_eq!(channel.on_frame(&frame), Ok(()));
        assert_eq!(channel.cache().take(), Some(payload));

        assert!(channel.on_frame(&frame[..10]).is_err());
        assert!(!channel.cache().has_pending());
    }
}
