//! Bindings for dual-core Espressif chips. The cores share internal SRAM, so the
//! [`crate::SharedMemoryPipe`] is the mailbox; a software interrupt wired to the receiving core
//! plays the part of the mailbox interrupt.

use corelink_core::EndpointConfig;
use esp_hal::interrupt::software::SoftwareInterrupt;

use crate::doorbell::Doorbell;

/// Raises software interrupt `NUM` whenever a frame is queued for the endpoint it was built for.
/// Frames for other endpoints are left for their own delivery path.
pub struct SoftwareInterruptDoorbell<const NUM: u8> {
    address: u8,
}

impl<const NUM: u8> SoftwareInterruptDoorbell<NUM> {
    pub const fn new(receiver: &EndpointConfig) -> Self {
        SoftwareInterruptDoorbell {
            address: receiver.address,
        }
    }
}

impl<const NUM: u8> Doorbell for SoftwareInterruptDoorbell<NUM> {
    fn ring(&self, target: &EndpointConfig) {
        if target.address != self.address {
            return;
        }

        // safety: raising only sets the pending bit; the instance owned by the receiving core
        // stays the only one that installs a handler.
        unsafe { SoftwareInterrupt::<'static, NUM>::steal() }.raise();
    }
}

/// Clears the pending software interrupt. First thing the receive handler does.
pub fn acknowledge<const NUM: u8>() {
    // safety: see `SoftwareInterruptDoorbell::ring`
    unsafe { SoftwareInterrupt::<'static, NUM>::steal() }.reset();
}
