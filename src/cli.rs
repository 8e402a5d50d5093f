use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use crate::codec::Width;
use crate::sim::handshake::DelayRange;

#[derive(Parser, Debug, Clone)]
#[command(name = "sort-hammer", about = "Sorting accelerator tester (simulated handshake / UART)")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Run the handshake testbench against the behavioural sorter model
    Sim(SimOpts),
    /// Talk to the FPGA sorter over a serial port
    Uart(UartOpts),
}

#[derive(Args, Debug, Clone)]
pub struct SerialOpts {
    /// Serial port (e.g. /dev/ttyUSB0 or COM3)
    pub port: String,
    /// Baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baudrate: u32,
    /// Enable RTS/CTS
    #[arg(long, default_value_t = false)]
    pub rtscts: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UartOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// Response timeout in seconds
    #[arg(long, default_value_t = 5.0)]
    pub timeout: f64,
    /// Pacing delay (ms) between value pairs; 0 sends the frame in one burst
    #[arg(long, default_value_t = 0)]
    pub pace_ms: u64,
    /// Value width in bits
    #[arg(long, default_value_t = Width::BITS10)]
    pub width: Width,
    /// Seed for the generated scenarios
    #[arg(long, default_value_t = 12345)]
    pub seed: u64,
    /// Quiet period between scenarios in milliseconds
    #[arg(long, default_value_t = 200)]
    pub settle_ms: u64,
    /// Read values from stdin instead of running the built-in scenarios
    #[arg(long, default_value_t = false)]
    pub interactive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SimOpts {
    /// Batch size of the sorter model
    #[arg(long, default_value_t = 10)]
    pub depth: usize,
    /// Data bus width in bits
    #[arg(long, default_value_t = Width::BITS8)]
    pub width: Width,
    /// Seed for generated data and handshake delays
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
    /// Edges to wait for ready/valid before calling the handshake stalled
    #[arg(long, default_value_t = 10_000)]
    pub stall_limit: u64,
    /// Wait forever on a stalled handshake
    #[arg(long, default_value_t = false)]
    pub no_stall_limit: bool,
    /// Upper bound of random inter-transfer delays added to every scenario
    #[arg(long)]
    pub delay_max: Option<u64>,
}

impl SimOpts {
    pub fn stall_limit(&self) -> Option<u64> {
        (!self.no_stall_limit).then_some(self.stall_limit)
    }

    pub fn delay_override(&self) -> Option<DelayRange> {
        self.delay_max.map(|hi| DelayRange::new(0, hi))
    }
}

impl UartOpts {
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        Duration::try_from_secs_f64(self.timeout)
            .map_err(|_| anyhow::anyhow!("timeout must be a non-negative number of seconds"))
    }
}

/// How a request frame is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    Burst,
    PerValue(Duration),
}

impl Pacing {
    pub fn from_cli(pace_ms: u64) -> Self {
        match pace_ms {
            0 => Pacing::Burst,
            ms => Pacing::PerValue(Duration::from_millis(ms)),
        }
    }
}
