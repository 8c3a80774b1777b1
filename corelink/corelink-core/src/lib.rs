#![no_std]

//! Platform independent half of the cross-core detection link: envelope codec, mailbox endpoint,
//! detection cache with its readiness latch, and the producer/consumer facades.

mod buffer;
pub mod cache;
pub mod channel;
pub mod consumer;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod label;
pub mod latch;
pub mod orientation;
pub mod payload;
pub mod platform;
pub mod producer;

pub use cache::DetectionCache;
pub use channel::DetectionChannel;
pub use consumer::Consumer;
pub use endpoint::{CONSUMER_ENDPOINT, Endpoint, EndpointConfig, PRODUCER_ENDPOINT};
pub use envelope::{ENVELOPE_WIRE_SIZE, Envelope, Frame};
pub use error::{BusyReason, ConfigError, DecodeError, LabelError, LinkTimeout, TransportError};
pub use label::{LABEL_CAPACITY, Label};
pub use latch::ReadinessLatch;
pub use orientation::Orientation;
pub use payload::DetectionPayload;
pub use platform::{EnvelopeHandler, MailboxPlatform};
pub use producer::Producer;

pub use arbitrary_int::u4;
