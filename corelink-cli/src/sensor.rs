use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use anyhow::Context;
use corelink::{CONSUMER_ENDPOINT, Endpoint, MailboxPlatform, Orientation, PRODUCER_ENDPOINT, Producer};

/// Gravity in milli-g as reported by the simulated accelerometer
const ONE_G: i16 = 1000;
const NOISE: u64 = 120;

/// Accelerometer stand-in: holds an orientation for a few samples, then tips the board over.
pub struct SyntheticAccelerometer {
    state: u64,
    orientation: Orientation,
}

impl SyntheticAccelerometer {
    pub fn new(seed: u64) -> Self {
        SyntheticAccelerometer {
            // xorshift never leaves zero
            state: seed.max(1),
            orientation: Orientation::Up,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn noise(&mut self) -> i16 {
        (self.next_u64() % (2 * NOISE + 1)) as i16 - NOISE as i16
    }

    /// Next (x, y, z) sample in milli-g
    pub fn sample(&mut self) -> (i16, i16, i16) {
        if self.next_u64() % 4 == 0 {
            let index = (self.next_u64() % Orientation::ALL.len() as u64) as usize;
            self.orientation = Orientation::ALL[index];
        }

        let (mut x, mut y, mut z) = (self.noise(), self.noise(), self.noise());
        match self.orientation {
            Orientation::Up => z += ONE_G,
            Orientation::Down => z -= ONE_G,
            Orientation::TopEdge => y -= ONE_G,
            Orientation::BottomEdge => y += ONE_G,
            Orientation::LeftEdge => x += ONE_G,
            Orientation::RightEdge => x -= ONE_G,
        }
        (x, y, z)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProducerStats {
    pub published: u32,
    pub dropped: u32,
}

/// Sensor core: samples, classifies and publishes until `exit_flag` is raised.
pub fn spawn_sensor_thread<P: MailboxPlatform + Sync + 'static>(
    platform: &'static P,
    seed: u64,
    startup_delay: Duration,
    sample_interval: Duration,
    exit_flag: Arc<AtomicBool>,
) -> JoinHandle<anyhow::Result<ProducerStats>> {
    std::thread::spawn(move || {
        std::thread::sleep(startup_delay);

        let endpoint = Endpoint::configure(platform, PRODUCER_ENDPOINT)
            .context("Failed to configure sensor core endpoint")?;
        let mut producer = Producer::new(endpoint, &CONSUMER_ENDPOINT);
        let mut accelerometer = SyntheticAccelerometer::new(seed);

        while !exit_flag.load(Ordering::SeqCst) {
            let (x, y, z) = accelerometer.sample();
            Orientation::classify(x, y, z).write_into(producer.acquire_payload_slot());

            // busy is expected, the next sample replaces this one anyway
            if let Err(e) = producer.publish() {
                if !e.is_busy() {
                    return Err(e).context("Sensor core lost its mailbox");
                }
            }

            std::thread::sleep(sample_interval);
        }

        Ok(ProducerStats {
            published: producer.published_count(),
            dropped: producer.dropped_count(),
        })
    })
}
