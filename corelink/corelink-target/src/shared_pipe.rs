//! Mailbox transport for cores sharing RAM. Every endpoint address owns a bounded inbox that plays
//! the part of the hardware FIFO; the sender copies the frame in and rings the receiver's doorbell,
//! the receiver's interrupt handler drains the inbox into the registered [`EnvelopeHandler`].

use core::cell::RefCell;

use corelink_core::{
    ConfigError, EndpointConfig, EnvelopeHandler, Frame, MailboxPlatform, TransportError,
    endpoint::MAX_ENDPOINTS,
    error::BusyReason,
};
use embassy_sync::{
    blocking_mutex::{Mutex, raw::CriticalSectionRawMutex},
    channel::Channel,
};
use portable_atomic::{AtomicU32, Ordering};

use crate::doorbell::{Doorbell, SignalDoorbell};

/// Frames a receiver can have outstanding before senders see [`BusyReason::QueueFull`]
pub const DEFAULT_QUEUE_DEPTH: usize = 4;

struct Registry {
    configs: [Option<EndpointConfig>; MAX_ENDPOINTS],
    handlers: [Option<&'static dyn EnvelopeHandler>; MAX_ENDPOINTS],
}

/// Per endpoint delivery counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointStats {
    pub delivered: u32,
    pub malformed: u32,
    pub queued: usize,
}

pub struct SharedMemoryPipe<D: Doorbell, const DEPTH: usize = DEFAULT_QUEUE_DEPTH> {
    registry: Mutex<CriticalSectionRawMutex, RefCell<Registry>>,
    inboxes: [Channel<CriticalSectionRawMutex, Frame, DEPTH>; MAX_ENDPOINTS],
    delivered: [AtomicU32; MAX_ENDPOINTS],
    malformed: [AtomicU32; MAX_ENDPOINTS],
    doorbell: D,
}

impl<D: Doorbell, const DEPTH: usize> SharedMemoryPipe<D, DEPTH> {
    pub const fn new(doorbell: D) -> Self {
        SharedMemoryPipe {
            registry: Mutex::new(RefCell::new(Registry {
                configs: [None; MAX_ENDPOINTS],
                handlers: [None; MAX_ENDPOINTS],
            })),
            inboxes: [const { Channel::new() }; MAX_ENDPOINTS],
            delivered: [const { AtomicU32::new(0) }; MAX_ENDPOINTS],
            malformed: [const { AtomicU32::new(0) }; MAX_ENDPOINTS],
            doorbell,
        }
    }

    pub fn doorbell(&self) -> &D {
        &self.doorbell
    }

    fn index(address: u8) -> Result<usize, TransportError> {
        let index = address as usize;
        if index < MAX_ENDPOINTS {
            Ok(index)
        } else {
            Err(TransportError::UnknownEndpoint { address })
        }
    }

    /// Drains the inbox of `address` into its handler and returns how many frames were taken.
    ///
    /// Meant to be called from the receive interrupt of the core owning `address`. A call without
    /// a registered handler is a spurious interrupt and takes nothing.
    pub fn service_interrupt(&self, address: u8) -> Result<usize, TransportError> {
        let index = Self::index(address)?;
        let Some(handler) = self.registry.lock(|r| r.borrow().handlers[index]) else {
            return Ok(0);
        };

        let mut count = 0;
        while let Ok(frame) = self.inboxes[index].try_receive() {
            match handler.on_frame(&frame) {
                Ok(()) => {
                    self.delivered[index].fetch_add(1, Ordering::Relaxed);
                }
                #[allow(unused_variables)]
                Err(e) => {
                    self.malformed[index].fetch_add(1, Ordering::Relaxed);

                    #[cfg(feature = "defmt")]
                    defmt::warn!("Malformed frame for endpoint {}: {}", address, e);
                }
            }
            count += 1;
        }

        Ok(count)
    }

    /// Frames waiting in the inbox of `address`
    pub fn pending(&self, address: u8) -> usize {
        Self::index(address)
            .map(|index| self.inboxes[index].len())
            .unwrap_or(0)
    }

    pub fn stats(&self, address: u8) -> Option<EndpointStats> {
        let index = Self::index(address).ok()?;
        Some(EndpointStats {
            delivered: self.delivered[index].load(Ordering::Relaxed),
            malformed: self.malformed[index].load(Ordering::Relaxed),
            queued: self.inboxes[index].len(),
        })
    }
}

impl<const DEPTH: usize> SharedMemoryPipe<SignalDoorbell, DEPTH> {
    /// Delivery task for one endpoint: services it every time it is rung. Only returns on error.
    pub async fn deliver(&self, address: u8) -> Result<(), TransportError> {
        Self::index(address)?;

        loop {
            self.doorbell.wait(address).await;
            self.service_interrupt(address)?;
        }
    }
}

impl<D: Doorbell, const DEPTH: usize> MailboxPlatform for SharedMemoryPipe<D, DEPTH> {
    fn configure_channel(&self, config: &EndpointConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let index = config.address as usize;

        self.registry.lock(|r| {
            let mut registry = r.borrow_mut();

            match registry.configs[index] {
                Some(existing) if existing == *config => return Ok(()),
                Some(_) => {
                    return Err(ConfigError::Conflict {
                        address: config.address,
                    });
                }
                None => {}
            }

            let channel_taken = registry
                .configs
                .iter()
                .flatten()
                .any(|other| other.channel_id == config.channel_id);
            if channel_taken {
                return Err(ConfigError::ResourceUnavailable {
                    channel_id: config.channel_id,
                });
            }

            registry.configs[index] = Some(*config);
            Ok(())
        })
    }

    fn send_raw(&self, source: u8, target: u8, frame: &Frame) -> Result<(), TransportError> {
        let source_index = Self::index(source)?;
        let target_index = Self::index(target)?;

        let (source_config, target_config, target_handler) = self.registry.lock(|r| {
            let registry = r.borrow();
            (
                registry.configs[source_index],
                registry.configs[target_index],
                registry.handlers[target_index],
            )
        });

        if source_config.is_none() {
            return Err(TransportError::Uninitialized { address: source });
        }
        let Some(target_config) = target_config.filter(|_| target_handler.is_some()) else {
            return Err(TransportError::Busy(BusyReason::PeerNotReady));
        };

        self.inboxes[target_index]
            .try_send(*frame)
            .map_err(|_| TransportError::Busy(BusyReason::QueueFull))?;

        self.doorbell.ring(&target_config);
        Ok(())
    }

    fn register_receive_handler(
        &self,
        address: u8,
        handler: &'static dyn EnvelopeHandler,
    ) -> Result<(), TransportError> {
        let index = Self::index(address)?;

        self.registry.lock(|r| {
            let mut registry = r.borrow_mut();
            if registry.configs[index].is_none() {
                return Err(TransportError::Uninitialized { address });
            }

            registry.handlers[index] = Some(handler);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::doorbell::NoDoorbell;
    use corelink_core::{
        CONSUMER_ENDPOINT, DetectionChannel, DetectionPayload, Endpoint, Envelope, Orientation,
        PRODUCER_ENDPOINT, Producer,
    };
    use embassy_futures::select::{Either, select};
    use portable_atomic::AtomicBool;

    type TestPipe = SharedMemoryPipe<NoDoorbell, DEFAULT_QUEUE_DEPTH>;

    fn linked_pipe(pipe: &TestPipe, channel: &'static DetectionChannel) {
        let consumer = Endpoint::configure(pipe, CONSUMER_ENDPOINT).unwrap();
        consumer.on_receive(channel).unwrap();
    }

    #[test]
    fn test_configure_is_idempotent_and_detects_conflicts() {
        let pipe = TestPipe::new(NoDoorbell);

        assert_eq!(pipe.configure_channel(&CONSUMER_ENDPOINT), Ok(()));
        assert_eq!(pipe.configure_channel(&CONSUMER_ENDPOINT), Ok(()));

        let moved = EndpointConfig {
            channel_id: 20,
            ..CONSUMER_ENDPOINT
        };
        assert_eq!(
            pipe.configure_channel(&moved),
            Err(ConfigError::Conflict {
                address: CONSUMER_ENDPOINT.address
            })
        );

        let same_channel = EndpointConfig {
            channel_id: CONSUMER_ENDPOINT.channel_id,
            ..PRODUCER_ENDPOINT
        };
        assert_eq!(
            pipe.configure_channel(&same_channel),
            Err(ConfigError::ResourceUnavailable {
                channel_id: CONSUMER_ENDPOINT.channel_id
            })
        );

        assert_eq!(pipe.configure_channel(&PRODUCER_ENDPOINT), Ok(()));
    }

    #[test]
    fn test_send_errors() {
        static CHANNEL: DetectionChannel = DetectionChannel::for_producer(&PRODUCER_ENDPOINT);
        let pipe = TestPipe::new(NoDoorbell);
        let frame = Envelope::new(5, 0x0200, DetectionPayload::empty()).encode();

        assert_eq!(
            pipe.send_raw(PRODUCER_ENDPOINT.address, CONSUMER_ENDPOINT.address, &frame),
            Err(TransportError::Uninitialized {
                address: PRODUCER_ENDPOINT.address
            })
        );

        Endpoint::configure(&pipe, PRODUCER_ENDPOINT).unwrap();
        assert_eq!(
            pipe.send_raw(PRODUCER_ENDPOINT.address, 7, &frame),
            Err(TransportError::UnknownEndpoint { address: 7 })
        );
        assert_eq!(
            pipe.send_raw(PRODUCER_ENDPOINT.address, CONSUMER_ENDPOINT.address, &frame),
            Err(TransportError::Busy(BusyReason::PeerNotReady)),
            "consumer endpoint not configured"
        );

        assert_eq!(
            pipe.register_receive_handler(CONSUMER_ENDPOINT.address, &CHANNEL),
            Err(TransportError::Uninitialized {
                address: CONSUMER_ENDPOINT.address
            })
        );

        pipe.configure_channel(&CONSUMER_ENDPOINT).unwrap();
        assert_eq!(
            pipe.send_raw(PRODUCER_ENDPOINT.address, CONSUMER_ENDPOINT.address, &frame),
            Err(TransportError::Busy(BusyReason::PeerNotReady)),
            "consumer has no handler yet"
        );
    }

    #[test]
    fn test_publish_service_take() {
        static CHANNEL: DetectionChannel = DetectionChannel::for_producer(&PRODUCER_ENDPOINT);
        let pipe = TestPipe::new(NoDoorbell);
        linked_pipe(&pipe, &CHANNEL);

        let endpoint = Endpoint::configure(&pipe, PRODUCER_ENDPOINT).unwrap();
        let mut producer = Producer::new(endpoint, &CONSUMER_ENDPOINT);
        let consumer = CHANNEL.consumer();

        Orientation::classify(0, 0, -1000).write_into(producer.acquire_payload_slot());
        producer.publish().unwrap();
        assert!(!consumer.has_received_message(), "not delivered before the interrupt");
        assert_eq!(pipe.pending(CONSUMER_ENDPOINT.address), 1);

        assert_eq!(pipe.service_interrupt(CONSUMER_ENDPOINT.address), Ok(1));
        assert!(consumer.has_received_message());

        let mut out = DetectionPayload::empty();
        assert!(consumer.safe_get_and_clear_cached_detection(&mut out));
        assert_eq!(out, DetectionPayload::with_label(1, "down").unwrap());
        assert!(!consumer.safe_get_and_clear_cached_detection(&mut out));

        let stats = pipe.stats(CONSUMER_ENDPOINT.address).unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.queued, 0);
    }

    #[test]
    fn test_saturated_mailbox_leaves_cache_untouched() {
        static CHANNEL: DetectionChannel = DetectionChannel::for_producer(&PRODUCER_ENDPOINT);
        let pipe = TestPipe::new(NoDoorbell);
        linked_pipe(&pipe, &CHANNEL);

        let endpoint = Endpoint::configure(&pipe, PRODUCER_ENDPOINT).unwrap();
        let mut producer = Producer::new(endpoint, &CONSUMER_ENDPOINT);

        for label_id in 0..DEFAULT_QUEUE_DEPTH as u32 {
            producer.acquire_payload_slot().label_id = label_id;
            producer.publish().unwrap();
        }

        producer.acquire_payload_slot().label_id = 99;
        assert_eq!(
            producer.publish(),
            Err(TransportError::Busy(BusyReason::QueueFull))
        );
        assert_eq!(producer.dropped_count(), 1);
        assert!(!CHANNEL.cache().has_ever_received());

        assert_eq!(
            pipe.service_interrupt(CONSUMER_ENDPOINT.address),
            Ok(DEFAULT_QUEUE_DEPTH)
        );
        let taken = CHANNEL.consumer().take_detection().unwrap();
        assert_eq!(taken.label_id, DEFAULT_QUEUE_DEPTH as u32 - 1);
        assert_eq!(
            CHANNEL.cache().overwritten_count(),
            DEFAULT_QUEUE_DEPTH as u32 - 1
        );
    }

    #[test]
    fn test_malformed_frame_is_counted_and_dropped() {
        static CHANNEL: DetectionChannel = DetectionChannel::for_producer(&PRODUCER_ENDPOINT);
        let pipe = TestPipe::new(NoDoorbell);
        linked_pipe(&pipe, &CHANNEL);
        pipe.configure_channel(&PRODUCER_ENDPOINT).unwrap();

        let mut frame = Envelope::new(5, 0x0200, DetectionPayload::empty()).encode();
        // label field without its terminator
        frame[7..].fill(b'x');
        pipe.send_raw(PRODUCER_ENDPOINT.address, CONSUMER_ENDPOINT.address, &frame)
            .unwrap();

        assert_eq!(pipe.service_interrupt(CONSUMER_ENDPOINT.address), Ok(1));
        let stats = pipe.stats(CONSUMER_ENDPOINT.address).unwrap();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.delivered, 0);
        assert!(!CHANNEL.cache().has_ever_received());
    }

    #[test]
    fn test_spurious_interrupt_and_unknown_address() {
        let pipe = TestPipe::new(NoDoorbell);
        pipe.configure_channel(&CONSUMER_ENDPOINT).unwrap();

        assert_eq!(pipe.service_interrupt(CONSUMER_ENDPOINT.address), Ok(0));
        assert_eq!(
            pipe.service_interrupt(9),
            Err(TransportError::UnknownEndpoint { address: 9 })
        );
        assert_eq!(pipe.pending(9), 0);
        assert!(pipe.stats(9).is_none());
    }

    #[test]
    fn test_signal_doorbell_delivery_task() {
        static CHANNEL: DetectionChannel = DetectionChannel::for_producer(&PRODUCER_ENDPOINT);
        let pipe: SharedMemoryPipe<SignalDoorbell> = SharedMemoryPipe::new(SignalDoorbell::new());

        Endpoint::configure(&pipe, CONSUMER_ENDPOINT)
            .unwrap()
            .on_receive(&CHANNEL)
            .unwrap();
        let endpoint = Endpoint::configure(&pipe, PRODUCER_ENDPOINT).unwrap();
        let mut producer = Producer::new(endpoint, &CONSUMER_ENDPOINT);

        Orientation::TopEdge.write_into(producer.acquire_payload_slot());
        producer.publish().unwrap();

        let consumer = CHANNEL.consumer();
        let result = embassy_futures::block_on(select(
            pipe.deliver(CONSUMER_ENDPOINT.address),
            consumer.wait_for_link(),
        ));
        assert!(matches!(result, Either::Second(())));
        assert_eq!(
            consumer.take_detection(),
            Some(DetectionPayload::with_label(2, "top").unwrap())
        );

        let result = embassy_futures::block_on(pipe.deliver(MAX_ENDPOINTS as u8));
        assert_eq!(
            result,
            Err(TransportError::UnknownEndpoint {
                address: MAX_ENDPOINTS as u8
            })
        );
    }

    #[test]
    fn test_concurrent_producer_and_interrupt() {
        static CHANNEL: DetectionChannel = DetectionChannel::for_producer(&PRODUCER_ENDPOINT);
        const MESSAGES: u32 = 2_000;

        let pipe = TestPipe::new(NoDoorbell);
        linked_pipe(&pipe, &CHANNEL);
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                let endpoint = Endpoint::configure(&pipe, PRODUCER_ENDPOINT).unwrap();
                let mut producer = Producer::new(endpoint, &CONSUMER_ENDPOINT);

                for label_id in 1..=MESSAGES {
                    producer.acquire_payload_slot().label_id = label_id;
                    while producer.publish().is_err() {
                        std::thread::yield_now();
                    }
                }
                done.store(true, Ordering::Release);
            });

            // interrupt context of the consumer core
            s.spawn(|| {
                while !done.load(Ordering::Acquire) || pipe.pending(CONSUMER_ENDPOINT.address) > 0
                {
                    pipe.service_interrupt(CONSUMER_ENDPOINT.address).unwrap();
                }
            });
        });

        let stats = pipe.stats(CONSUMER_ENDPOINT.address).unwrap();
        assert_eq!(stats.delivered, MESSAGES);
        assert_eq!(
            CHANNEL.consumer().take_detection().map(|p| p.label_id),
            Some(MESSAGES),
            "last published detection wins"
        );
    }
}
