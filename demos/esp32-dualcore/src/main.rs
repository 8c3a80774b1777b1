#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use corelink::{
    CONSUMER_ENDPOINT, DetectionChannel, DetectionPayload, Endpoint, Orientation,
    PRODUCER_ENDPOINT, Producer, SharedMemoryPipe, SoftwareInterruptDoorbell,
};
use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Software interrupt 0 and 1 belong to esp-rtos, 2 is the mailbox interrupt of core 0
const MAILBOX_INTERRUPT: u8 = 2;

static PIPE: SharedMemoryPipe<SoftwareInterruptDoorbell<MAILBOX_INTERRUPT>> =
    SharedMemoryPipe::new(SoftwareInterruptDoorbell::new(&CONSUMER_ENDPOINT));
static DETECTIONS: StaticCell<DetectionChannel> = StaticCell::new();

static EXECUTOR_CORE_1: static_cell::StaticCell<esp_rtos::embassy::Executor> =
    static_cell::StaticCell::new();

#[esp_rtos::main]
async fn main(spawner: Spawner) {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    let mut sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Receive path of core 0 must be complete before core 1 can send
    sw_int
        .software_interrupt2
        .set_interrupt_handler(mailbox_interrupt);
    let detections: &'static DetectionChannel =
        DETECTIONS.init(DetectionChannel::for_producer(&PRODUCER_ENDPOINT));
    let endpoint = unwrap!(Endpoint::configure(&PIPE, CONSUMER_ENDPOINT));
    unwrap!(endpoint.on_receive(detections));
    info!("Networking core endpoint ready");

    // Sensor core with its own executor
    static APP_CORE_STACK: StaticCell<esp_hal::system::Stack<8192>> = StaticCell::new();
    let app_core_stack = APP_CORE_STACK.init(esp_hal::system::Stack::new());
    esp_rtos::start_second_core(
        peripherals.CPU_CTRL,
        sw_int.software_interrupt0,
        sw_int.software_interrupt1,
        app_core_stack,
        move || {
            let executor = EXECUTOR_CORE_1.init(esp_rtos::embassy::Executor::new());
            executor.run(|spawner| {
                spawner.spawn(sensor_task()).unwrap();
            });
        },
    );

    spawner.spawn(network_task(detections)).unwrap();

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}

#[esp_hal::handler]
fn mailbox_interrupt() {
    corelink::espressif::acknowledge::<MAILBOX_INTERRUPT>();

    if let Err(e) = PIPE.service_interrupt(CONSUMER_ENDPOINT.address) {
        error!("Mailbox interrupt failed: {}", e);
    }
}

/// Core 1: classifies a tilting board every second and publishes the result
#[embassy_executor::task]
async fn sensor_task() {
    let endpoint = unwrap!(Endpoint::configure(&PIPE, PRODUCER_ENDPOINT));
    let mut producer = Producer::new(endpoint, &CONSUMER_ENDPOINT);

    // board slowly rolled over all six faces
    const SAMPLES: [(i16, i16, i16); 6] = [
        (12, -40, 1010),
        (-980, 25, 60),
        (30, -995, -20),
        (1003, 8, -45),
        (-15, 990, 70),
        (20, 35, -1000),
    ];

    for (x, y, z) in SAMPLES.into_iter().cycle() {
        Orientation::classify(x, y, z).write_into(producer.acquire_payload_slot());

        // a busy mailbox just drops this sample
        if let Err(e) = producer.publish() {
            if !e.is_busy() {
                error!("Sensor core lost its mailbox: {}", e);
            }
        }
        Timer::after(Duration::from_millis(1000)).await;
    }
}

/// Core 0: waits for the sensor core once, then reports the freshest detection
#[embassy_executor::task]
async fn network_task(detections: &'static DetectionChannel) {
    let consumer = detections.consumer();

    if corelink::wait_for_link_within(&consumer, Duration::from_secs(10))
        .await
        .is_err()
    {
        warn!("Still waiting for the sensor core");
        consumer.wait_for_link().await;
    }
    info!("Cross-core link is ready");

    let mut last = DetectionPayload::empty();
    loop {
        Timer::after(Duration::from_millis(2000)).await;

        let fresh = consumer.safe_get_and_clear_cached_detection(&mut last);
        info!(
            "telemetry event_id={} event={} event_detected={} fresh={}",
            last.label_id,
            last.label,
            last.is_event(),
            fresh
        );
    }
}
