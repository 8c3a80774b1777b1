//! Seams between the link logic and whatever moves bytes between the cores.

use crate::endpoint::EndpointConfig;
use crate::envelope::{Envelope, Frame};
use crate::error::{ConfigError, DecodeError, TransportError};

/// Receiver of envelopes for one endpoint.
///
/// Called from the asynchronous delivery context (the mailbox interrupt). Implementations must be
/// short, must not block and must never send through the transport.
pub trait EnvelopeHandler: Sync {
    fn on_envelope(&self, envelope: &Envelope);

    /// Decodes a raw mailbox frame and forwards it. Platforms call this from their interrupt handler.
    fn on_frame(&self, frame: &[u8]) -> Result<(), DecodeError> {
        let envelope = Envelope::decode(frame)?;
        self.on_envelope(&envelope);
        Ok(())
    }
}

/// Hardware (or emulated) mailbox primitive shared by the endpoints of both cores.
pub trait MailboxPlatform {
    /// Claims the channel/interrupt pair of an endpoint. Must be idempotent for identical configs.
    fn configure_channel(&self, config: &EndpointConfig) -> Result<(), ConfigError>;

    /// Pushes a frame into the inbox of `target` and asserts its interrupt. Never blocks.
    fn send_raw(&self, source: u8, target: u8, frame: &Frame) -> Result<(), TransportError>;

    /// Installs the handler invoked for every frame arriving at `address`.
    fn register_receive_handler(
        &self,
        address: u8,
        handler: &'static dyn EnvelopeHandler,
    ) -> Result<(), TransportError>;
}
