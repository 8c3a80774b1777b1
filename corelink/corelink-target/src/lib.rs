#![no_std]

mod doorbell;
mod shared_pipe;

pub use doorbell::{Doorbell, NoDoorbell, SignalDoorbell};
pub use shared_pipe::{DEFAULT_QUEUE_DEPTH, EndpointStats, SharedMemoryPipe};

#[cfg(feature = "time")]
mod time;
#[cfg(feature = "time")]
pub use time::wait_for_link_within;

cfg_if::cfg_if! {
    if #[cfg(any(feature = "esp32", feature = "esp32s3"))] {
        pub mod espressif;
        pub use espressif::SoftwareInterruptDoorbell;
    }
}
