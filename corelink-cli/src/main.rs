use std::{
    io::BufRead,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use anyhow::Context;
use colored::Colorize;
use corelink::{
    CONSUMER_ENDPOINT, Consumer, DetectionChannel, Endpoint, PRODUCER_ENDPOINT,
};
use crossbeam::{channel::Receiver, select};

use crate::{
    cli::CommandLineArgs,
    commands::AppSettings,
    interrupt::{ChannelDoorbell, SimPipe, spawn_interrupt_thread},
    sensor::{ProducerStats, spawn_sensor_thread},
    telemetry::TelemetryReporter,
};

mod cli;
mod commands;
mod interrupt;
mod sensor;
mod telemetry;

/// Longest stretch the main loop goes without checking the exit flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> anyhow::Result<()> {
    // Set CTRL-C handler
    let exit_flag = Arc::new(AtomicBool::new(false));
    let r_exit_flag = exit_flag.clone();
    ctrlc::set_handler(move || {
        println!("CTRL-C received, exiting...");
        r_exit_flag.store(true, Ordering::SeqCst);
    })?;

    let args = CommandLineArgs::parse();
    let mut settings = AppSettings {
        reporting_interval: Duration::from_millis(args.reporting_interval),
        demo_mode: args.demo_mode,
        user_led: false,
        max_messages_override: args.max_messages,
    };

    // Both cores share the pipe for the whole run
    let (doorbell, doorbell_recver) = ChannelDoorbell::with_receiver();
    let pipe: &'static SimPipe = Box::leak(Box::new(SimPipe::new(doorbell)));

    // Networking core bring-up: endpoint and receive handler before anything can arrive
    let detections: &'static DetectionChannel =
        Box::leak(Box::new(DetectionChannel::for_producer(&PRODUCER_ENDPOINT)));
    let endpoint = Endpoint::configure(pipe, CONSUMER_ENDPOINT)
        .context("Failed to configure networking core endpoint")?;
    endpoint
        .on_receive(detections)
        .context("Failed to register detection handler")?;

    let interrupt_handle = spawn_interrupt_thread(pipe, doorbell_recver, exit_flag.clone());
    let sensor_handle = spawn_sensor_thread(
        pipe,
        args.seed,
        Duration::from_millis(args.producer_delay),
        Duration::from_millis(args.sample_interval),
        exit_flag.clone(),
    );
    let command_recver = spawn_stdin_reader();

    // Print nothing before the sensor core spoke
    let consumer = detections.consumer();
    if telemetry::wait_for_link(&consumer, &exit_flag) {
        println!("{} Cross-core link is ready", "[Info]".blue());
        run_reporting(&consumer, &mut settings, &command_recver, &exit_flag)?;
    }

    exit_flag.store(true, Ordering::SeqCst);
    let producer_stats = join_worker(sensor_handle, "Sensor")?;
    join_worker(interrupt_handle, "Mailbox interrupt")?;

    print_link_stats(pipe, detections, producer_stats);
    Ok(())
}

/// Emits telemetry every reporting interval until the message limit or CTRL-C
fn run_reporting(
    consumer: &Consumer<'_>,
    settings: &mut AppSettings,
    command_recver: &Receiver<String>,
    exit_flag: &AtomicBool,
) -> anyhow::Result<()> {
    let mut reporter = TelemetryReporter::new();
    let mut command_recver = command_recver.clone();
    let mut next_report = Instant::now();

    while !exit_flag.load(Ordering::SeqCst) && reporter.reported() < settings.max_messages() {
        let now = Instant::now();
        if now >= next_report {
            println!("{}", reporter.next(consumer).to_json()?);
            next_report = now + settings.reporting_interval;
            continue;
        }

        let wait = (next_report - now).min(POLL_INTERVAL);
        let mut stdin_closed = false;
        select! {
            recv(command_recver) -> line_res => match line_res {
                Ok(line) => {
                    let ack = settings.handle_line(&line);
                    if ack.success {
                        println!("{} {}", "[Info]".blue(), ack);
                        // a new interval takes effect right away
                        next_report = next_report.min(Instant::now() + settings.reporting_interval);
                    } else {
                        println!("{} {}", "[Warn]".yellow(), ack);
                    }
                }
                Err(_) => stdin_closed = true,
            },
            default(wait) => {}
        }

        // keep reporting without commands
        if stdin_closed {
            command_recver = crossbeam::channel::never();
        }
    }

    println!(
        "{} Sent {} telemetry messages ({} with fresh detections)",
        "[Info]".blue(),
        reporter.reported(),
        reporter.fresh_reported()
    );
    Ok(())
}

/// Forwards stdin lines as runtime commands. The thread is never joined, it ends with the process.
fn spawn_stdin_reader() -> Receiver<String> {
    let (line_sender, line_recver) = crossbeam::channel::unbounded();

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_sender.send(line).is_err() {
                break;
            }
        }
    });

    line_recver
}

fn join_worker<T>(handle: JoinHandle<anyhow::Result<T>>, name: &str) -> anyhow::Result<T> {
    match handle.join() {
        Ok(result) => result.with_context(|| format!("{name} thread failed")),
        Err(e) => Err(anyhow::anyhow!("{name} thread panicked: {e:?}")),
    }
}

fn print_link_stats(pipe: &SimPipe, detections: &DetectionChannel, producer_stats: ProducerStats) {
    let delivery = pipe.stats(CONSUMER_ENDPOINT.address).unwrap_or_default();
    let cache = detections.cache();

    println!("{} Link statistics:", "[Info]".blue());
    println!("\tpublished:   {}", producer_stats.published);
    println!("\tbusy drops:  {}", producer_stats.dropped);
    println!("\tdelivered:   {}", delivery.delivered);
    println!("\tmalformed:   {}", delivery.malformed);
    println!("\toverwritten: {}", cache.overwritten_count());
    println!("\trejected:    {}", detections.rejected_count());
}
