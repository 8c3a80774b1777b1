use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use anyhow::Context;
use corelink::{Consumer, DetectionPayload};
use serde::Serialize;

pub const APP_VERSION: &str = concat!("S-", env!("CARGO_PKG_VERSION"));

/// How often the networking core looks at the readiness latch before the link is up
const LINK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Blocks until the first detection arrived. Returns false if `exit_flag` was raised first.
pub fn wait_for_link(consumer: &Consumer<'_>, exit_flag: &AtomicBool) -> bool {
    let ticker = crossbeam::channel::tick(LINK_POLL_INTERVAL);

    loop {
        if consumer.has_received_message() {
            return true;
        }
        if exit_flag.load(Ordering::SeqCst) {
            return false;
        }
        let _ = ticker.recv();
    }
}

/// One telemetry record of the networking core
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    pub version: &'static str,
    pub event_id: u32,
    pub event: String,
    pub event_detected: bool,
    /// False when no detection arrived since the previous record and the last one is repeated
    pub fresh: bool,
}

impl Telemetry {
    pub fn from_payload(payload: &DetectionPayload, fresh: bool) -> Self {
        Telemetry {
            version: APP_VERSION,
            event_id: payload.label_id,
            event: payload.label.as_str().to_string(),
            event_detected: payload.is_event(),
            fresh,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("Failed to serialize telemetry")
    }
}

/// Turns the consumer's cached detections into telemetry records.
pub struct TelemetryReporter {
    last: DetectionPayload,
    reported: u32,
    fresh_reported: u32,
}

impl TelemetryReporter {
    pub fn new() -> Self {
        TelemetryReporter {
            last: DetectionPayload::empty(),
            reported: 0,
            fresh_reported: 0,
        }
    }

    pub fn next(&mut self, consumer: &Consumer<'_>) -> Telemetry {
        let fresh = consumer.safe_get_and_clear_cached_detection(&mut self.last);

        self.reported += 1;
        if fresh {
            self.fresh_reported += 1;
        }
        Telemetry::from_payload(&self.last, fresh)
    }

    pub fn reported(&self) -> u32 {
        self.reported
    }

    pub fn fresh_reported(&self) -> u32 {
        self.fresh_reported
    }
}

impl Default for TelemetryReporter {
    fn default() -> Self {
        Self::new()
    }
}
