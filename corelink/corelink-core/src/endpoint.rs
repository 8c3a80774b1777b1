use arbitrary_int::u4;

use crate::envelope::{Envelope, Frame};
use crate::error::{ConfigError, TransportError};
use crate::platform::{EnvelopeHandler, MailboxPlatform};

/// Number of endpoint addresses a mailbox instance provides
pub const MAX_ENDPOINTS: usize = 5;
/// Number of client ids per endpoint
pub const MAX_CLIENTS: u8 = 8;

/// Static description of one core's mailbox interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Mailbox channel the endpoint owns
    pub channel_id: u8,
    /// Interrupt line raised on this core when a frame arrives
    pub interrupt_id: u4,
    pub priority: u8,
    /// Client id written into every envelope sent from this endpoint
    pub client_id: u8,
    /// Address other endpoints use to reach this one
    pub address: u8,
}

/// Endpoint of the networking core (consumer of detections)
pub const CONSUMER_ENDPOINT: EndpointConfig = EndpointConfig {
    channel_id: 18,
    interrupt_id: u4::new(9),
    priority: 1,
    client_id: 3,
    address: 1,
};

/// Endpoint of the sensor core (producer of detections)
pub const PRODUCER_ENDPOINT: EndpointConfig = EndpointConfig {
    channel_id: 19,
    interrupt_id: u4::new(10),
    priority: 1,
    client_id: 5,
    address: 2,
};

impl EndpointConfig {
    /// Mask selecting this endpoint's interrupt line, as carried in envelopes addressed to it
    pub fn interrupt_mask(&self) -> u16 {
        1u16 << self.interrupt_id.value()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address as usize >= MAX_ENDPOINTS {
            return Err(ConfigError::InvalidAddress(self.address));
        }
        if self.client_id >= MAX_CLIENTS {
            return Err(ConfigError::InvalidClient(self.client_id));
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EndpointConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Endpoint(addr={}, chan={}, intr={}, prio={}, client={})",
            self.address,
            self.channel_id,
            self.interrupt_id.value(),
            self.priority,
            self.client_id
        )
    }
}

/// A configured endpoint of one core. Only obtainable through [`Endpoint::configure`], so sending
/// from an endpoint that was never set up cannot happen.
pub struct Endpoint<'p, P: MailboxPlatform + ?Sized> {
    platform: &'p P,
    config: EndpointConfig,
}

impl<'p, P: MailboxPlatform + ?Sized> Endpoint<'p, P> {
    /// Claims the endpoint's channel and interrupt on the platform. Calling this again with the same
    /// config returns another handle to the same endpoint.
    ///
    /// An error here means the core has no link to its peer; bring-up code treats it as fatal.
    pub fn configure(platform: &'p P, config: EndpointConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        platform.configure_channel(&config)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Configured mailbox endpoint {}", config);

        Ok(Endpoint { platform, config })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Sends an envelope to the endpoint at `target`. Busy outcomes are returned, never retried.
    pub fn send(&self, target: u8, envelope: &Envelope) -> Result<(), TransportError> {
        self.send_frame(target, &envelope.encode())
    }

    pub fn send_frame(&self, target: u8, frame: &Frame) -> Result<(), TransportError> {
        self.platform.send_raw(self.config.address, target, frame)
    }

    /// Registers the receive callback for this endpoint. See [`EnvelopeHandler`] for the constraints
    /// on the callback.
    pub fn on_receive(&self, handler: &'static dyn EnvelopeHandler) -> Result<(), TransportError> {
        self.platform
            .register_receive_handler(self.config.address, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_masks() {
        assert_eq!(CONSUMER_ENDPOINT.interrupt_mask(), 0x0200);
        assert_eq!(PRODUCER_ENDPOINT.interrupt_mask(), 0x0400);
    }

    #[test]
    fn test_validate() {
        assert_eq!(CONSUMER_ENDPOINT.validate(), Ok(()));
        assert_eq!(PRODUCER_ENDPOINT.validate(), Ok(()));

        let bad_address = EndpointConfig {
            address: MAX_ENDPOINTS as u8,
            ..CONSUMER_ENDPOINT
        };
        assert_eq!(
            bad_address.validate(),
            Err(ConfigError::InvalidAddress(MAX_ENDPOINTS as u8))
        );

        let bad_client = EndpointConfig {
            client_id: MAX_CLIENTS,
            ..PRODUCER_ENDPOINT
        };
        assert_eq!(
            bad_client.validate(),
            Err(ConfigError::InvalidClient(MAX_CLIENTS))
        );
    }
}
