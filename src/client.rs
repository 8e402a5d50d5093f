use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::cli::{Pacing, UartOpts};
use crate::codec::Width;
use crate::error::{self, HarnessError};
use crate::frame::{self, HEADER_LEN};
use crate::interactive;
use crate::port::{Channel, open_port};
use crate::rx::{Deadline, read_exactly};
use crate::scenario::{RunSummary, Scenario, ScenarioRunner, SortTarget, uart_scenarios};
use crate::tx::{hex, send_frame};

/// Request/response exchanges with the UART sorter.
pub struct SorterClient<C> {
    chan: C,
    width: Width,
    timeout: Duration,
    pacing: Pacing,
    settle: Duration,
    pub bytes_tx: u64,
    pub bytes_rx: u64,
}

impl<C: Channel> SorterClient<C> {
    pub fn new(chan: C, width: Width, timeout: Duration) -> Self {
        Self {
            chan,
            width,
            timeout,
            pacing: Pacing::Burst,
            settle: Duration::ZERO,
            bytes_tx: 0,
            bytes_rx: 0,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// One sort round trip. The header is checked as soon as it arrives so
    /// a desynced board fails fast instead of running out the clock.
    pub fn sort(&mut self, values: &[u16]) -> error::Result<Vec<u16>> {
        let request = frame::build_request(values, self.width)?;
        let start = Instant::now();
        self.bytes_tx += send_frame(&mut self.chan, &request, self.pacing)? as u64;

        let total = frame::frame_len(values.len());
        let deadline = Deadline::after(self.timeout);
        let mut response = read_exactly(&mut self.chan, HEADER_LEN, deadline)
            .map_err(|e| widen_timeout(e, Vec::new(), total))?;
        self.bytes_rx += response.len() as u64;

        let header = frame::parse_header(&response)?;
        if usize::from(header) != values.len() {
            return Err(HarnessError::LengthMismatch {
                header,
                expected: values.len(),
            });
        }

        let payload = read_exactly(&mut self.chan, total - HEADER_LEN, deadline)
            .map_err(|e| widen_timeout(e, response.clone(), total))?;
        self.bytes_rx += payload.len() as u64;
        response.extend_from_slice(&payload);

        debug!(
            len = response.len(),
            bytes = %hex(&response),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "rx frame"
        );
        frame::parse_response(&response, values.len(), self.width)
    }
}

/// Report a timeout against the whole frame, counting bytes already read.
fn widen_timeout(err: HarnessError, mut head: Vec<u8>, total: usize) -> HarnessError {
    match err {
        HarnessError::Timeout { partial, .. } => {
            head.extend_from_slice(&partial);
            HarnessError::Timeout {
                expected: total,
                partial: head,
            }
        }
        other => other,
    }
}

impl<C: Channel> SortTarget for SorterClient<C> {
    fn name(&self) -> &'static str {
        "uart"
    }

    fn width(&self) -> Width {
        self.width
    }

    fn sort(&mut self, scenario: &Scenario) -> error::Result<Vec<u16>> {
        SorterClient::sort(self, &scenario.input)
    }

    fn settle(&mut self) {
        std::thread::sleep(self.settle);
    }
}

pub fn run(opts: UartOpts) -> Result<RunSummary> {
    let timeout = opts.timeout()?;
    let port = open_port(&opts.ser)?;
    info!(
        "Connected to {} at {} baud (width={}, timeout={:?})",
        opts.ser.port, opts.ser.baudrate, opts.width, timeout
    );

    let client = SorterClient::new(port, opts.width, timeout)
        .with_pacing(Pacing::from_cli(opts.pace_ms))
        .with_settle(Duration::from_millis(opts.settle_ms));
    let mut runner = ScenarioRunner::new(client);

    let summary = if opts.interactive {
        let stdin = std::io::stdin();
        interactive::run_session(&mut runner, stdin.lock(), std::io::stdout()).context("interactive session")?
    } else {
        let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
        runner.run_all(&uart_scenarios(opts.width, &mut rng))
    };

    let c = runner.target();
    info!(bytes_tx = c.bytes_tx, bytes_rx = c.bytes_rx, "uart: done");
    Ok(summary)
}
