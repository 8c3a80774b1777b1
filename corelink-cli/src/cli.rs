use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CommandLineArgs {
    /// Telemetry reporting interval of the networking core in ms
    #[clap(long, default_value_t = 2000)]
    pub reporting_interval: u64,

    /// Accelerometer sampling interval of the sensor core in ms
    #[clap(long, default_value_t = 1000)]
    pub sample_interval: u64,

    /// Delay before the sensor core sends its first detection in ms
    #[clap(long, default_value_t = 500)]
    pub producer_delay: u64,

    /// Stop after this many telemetry messages (default: 300, 6000 in demo mode)
    #[clap(long)]
    pub max_messages: Option<u32>,

    /// Start in demo mode
    #[clap(long, action)]
    pub demo_mode: bool,

    /// Seed of the synthetic accelerometer
    #[clap(long, default_value_t = 0x2545_F491)]
    pub seed: u64,
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
