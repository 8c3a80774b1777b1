//! Emulated mailbox interrupt of the networking core. The doorbell pushes the rung address into a
//! channel, a dedicated thread plays the interrupt handler and services the pipe.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use anyhow::Context;
use corelink::{Doorbell, EndpointConfig, SharedMemoryPipe};
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};

pub type SimPipe = SharedMemoryPipe<ChannelDoorbell>;

pub struct ChannelDoorbell {
    sender: Sender<u8>,
}

impl ChannelDoorbell {
    pub fn with_receiver() -> (Self, Receiver<u8>) {
        let (sender, recver) = crossbeam::channel::unbounded();
        (Self { sender }, recver)
    }
}

impl Doorbell for ChannelDoorbell {
    fn ring(&self, target: &EndpointConfig) {
        // receiver gone means the simulation is shutting down
        let _ = self.sender.send(target.address);
    }
}

/// Services the rung endpoint until `exit_flag` is raised. Returns the number of frames taken.
pub fn spawn_interrupt_thread(
    pipe: &'static SimPipe,
    doorbell_recver: Receiver<u8>,
    exit_flag: Arc<AtomicBool>,
) -> JoinHandle<anyhow::Result<usize>> {
    std::thread::spawn(move || {
        let mut serviced = 0;

        while !exit_flag.load(Ordering::SeqCst) {
            match doorbell_recver.recv_timeout(Duration::from_millis(100)) {
                Ok(address) => {
                    serviced += pipe
                        .service_interrupt(address)
                        .context("Mailbox interrupt for unknown endpoint")?;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok(serviced)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelink::{
        CONSUMER_ENDPOINT, DetectionChannel, Endpoint, Orientation, PRODUCER_ENDPOINT, Producer,
    };

    #[test]
    fn test_interrupt_thread_delivers_published_detection() {
        static CHANNEL: DetectionChannel = DetectionChannel::for_producer(&PRODUCER_ENDPOINT);

        let (doorbell, doorbell_recver) = ChannelDoorbell::with_receiver();
        let pipe: &'static SimPipe = Box::leak(Box::new(SimPipe::new(doorbell)));
        Endpoint::configure(pipe, CONSUMER_ENDPOINT)
            .unwrap()
            .on_receive(&CHANNEL)
            .unwrap();

        let exit_flag = Arc::new(AtomicBool::new(false));
        let handle = spawn_interrupt_thread(pipe, doorbell_recver, exit_flag.clone());

        let endpoint = Endpoint::configure(pipe, PRODUCER_ENDPOINT).unwrap();
        let mut producer = Producer::new(endpoint, &CONSUMER_ENDPOINT);
        Orientation::BottomEdge.write_into(producer.acquire_payload_slot());
        producer.publish().unwrap();

        let consumer = CHANNEL.consumer();
        assert!(crate::telemetry::wait_for_link(&consumer, &AtomicBool::new(false)));
        assert_eq!(consumer.take_detection().map(|p| p.label_id), Some(3));

        exit_flag.store(true, Ordering::SeqCst);
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }
}
