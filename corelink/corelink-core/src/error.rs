//! Error types shared by the endpoint, codec and facades.

/// Why a send could not be queued right now. Never fatal: the detection is dropped and the
/// producer tries again on its next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusyReason {
    /// The peer's hardware FIFO has no free slot
    QueueFull,
    /// The peer endpoint is not configured or has no receive handler yet
    PeerNotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    #[error("transport busy: {0:?}")]
    Busy(BusyReason),
    #[error("endpoint {address} used before it was configured")]
    Uninitialized { address: u8 },
    #[error("no endpoint with address {address}")]
    UnknownEndpoint { address: u8 },
}

impl TransportError {
    /// Busy outcomes are the expected, recoverable ones
    pub const fn is_busy(&self) -> bool {
        matches!(self, TransportError::Busy(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("endpoint address {0} is out of range")]
    InvalidAddress(u8),
    #[error("client id {0} is out of range")]
    InvalidClient(u8),
    #[error("endpoint {address} is already configured differently")]
    Conflict { address: u8 },
    #[error("mailbox channel {channel_id} is not available")]
    ResourceUnavailable { channel_id: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    #[error("frame has {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("label field is not null-terminated")]
    UnterminatedLabel,
    #[error("label field is not valid UTF-8")]
    InvalidLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LabelError {
    #[error("label has {len} bytes, capacity is {capacity}")]
    TooLong { len: usize, capacity: usize },
    #[error("label contains a NUL byte")]
    InteriorNul,
}

/// The bounded startup wait ran out before the peer core sent anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("no message from the peer core before the deadline")]
pub struct LinkTimeout;
