use corelink_core::{Consumer, LinkTimeout};
use embassy_time::{Duration, Timer};

/// Bounded startup wait for the consumer task. What happens after a timeout is up to the caller.
pub async fn wait_for_link_within(
    consumer: &Consumer<'_>,
    timeout: Duration,
) -> Result<(), LinkTimeout> {
    let result = consumer.wait_for_link_or(Timer::after(timeout)).await;

    #[cfg(feature = "defmt")]
    if result.is_err() {
        defmt::warn!(
            "Peer core sent nothing within {} ms",
            timeout.as_millis()
        );
    }

    result
}
