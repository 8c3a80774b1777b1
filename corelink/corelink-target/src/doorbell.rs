use corelink_core::endpoint::{EndpointConfig, MAX_ENDPOINTS};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};

/// Asserts the receive interrupt of an endpoint after a frame was queued for it.
///
/// `ring` runs on the sending core and must not block.
pub trait Doorbell: Sync {
    fn ring(&self, target: &EndpointConfig);
}

/// For setups that poll [`crate::SharedMemoryPipe::service_interrupt`] themselves
pub struct NoDoorbell;

impl Doorbell for NoDoorbell {
    fn ring(&self, _target: &EndpointConfig) {}
}

/// Doorbell for executors without a spare hardware interrupt. Each endpoint gets a signal that a
/// delivery task waits on.
pub struct SignalDoorbell {
    signals: [Signal<CriticalSectionRawMutex, ()>; MAX_ENDPOINTS],
}

impl SignalDoorbell {
    pub const fn new() -> Self {
        SignalDoorbell {
            signals: [const { Signal::new() }; MAX_ENDPOINTS],
        }
    }

    pub(crate) fn signal(&self, address: u8) -> Option<&Signal<CriticalSectionRawMutex, ()>> {
        self.signals.get(address as usize)
    }

    /// Waits until the endpoint at `address` was rung. Never resolves for unknown addresses.
    pub async fn wait(&self, address: u8) {
        match self.signal(address) {
            Some(signal) => signal.wait().await,
            None => core::future::pending().await,
        }
    }
}

impl Default for SignalDoorbell {
    fn default() -> Self {
        Self::new()
    }
}

impl Doorbell for SignalDoorbell {
    fn ring(&self, target: &EndpointConfig) {
        if let Some(signal) = self.signal(target.address) {
            signal.signal(());
        }
    }
}
