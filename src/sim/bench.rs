use anyhow::Result;
use futures::future::try_join;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::Simulator;
use super::handshake::{DelayRange, HandshakeDriver, HandshakeMonitor};
use super::model::InsertionSorter;
use super::reset::ResetSequencer;
use crate::cli::SimOpts;
use crate::codec::Width;
use crate::error;
use crate::scenario::{RunSummary, Scenario, ScenarioRunner, SortTarget, check_width, sim_scenarios};

/// Idle edges between scenarios.
const QUIET_EDGES: u64 = 10;

/// Handshake testbench around the behavioural sorter.
pub struct SimBench {
    sim: Simulator<InsertionSorter>,
    width: Width,
    stall_limit: Option<u64>,
    delay_override: Option<DelayRange>,
    rng: ChaCha8Rng,
}

impl SimBench {
    pub fn new(depth: usize, width: Width, seed: u64) -> Self {
        Self {
            sim: Simulator::new(InsertionSorter::new(depth, width)),
            width,
            stall_limit: None,
            delay_override: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_stall_limit(mut self, limit: Option<u64>) -> Self {
        self.stall_limit = limit;
        self
    }

    pub fn with_delay_override(mut self, delays: Option<DelayRange>) -> Self {
        self.delay_override = delays;
        self
    }

    pub fn depth(&self) -> usize {
        self.sim.dut().depth()
    }

    pub fn edges(&self) -> u64 {
        self.sim.clock().edges()
    }

    /// Reset the core, then stream `values` in and the same number out,
    /// driver and monitor running side by side.
    pub fn exchange(&mut self, values: &[u16], delays: DelayRange) -> error::Result<Vec<u16>> {
        let clock = self.sim.clock();
        let p = self.sim.ports();

        self.sim.run(ResetSequencer::new(&clock, &p).run());

        let driver =
            HandshakeDriver::new(&clock, &p.data_in, &p.valid_in, &p.ready_out).with_stall_limit(self.stall_limit);
        let monitor = HandshakeMonitor::new(&clock, &p.data_out, &p.valid_out, &p.ready_in)
            .with_stall_limit(self.stall_limit);
        // Independent streams so the two sides' pacing doesn't correlate.
        let mut tx_rng = ChaCha8Rng::seed_from_u64(self.rng.r#gen());
        let mut rx_rng = ChaCha8Rng::seed_from_u64(self.rng.r#gen());

        let start = clock.edges();
        let (_, out) = self.sim.run(try_join(
            driver.send_all(values, delays, &mut tx_rng),
            monitor.receive_all(values.len(), delays, &mut rx_rng),
        ))?;
        debug!(edges = clock.edges() - start, "exchange done");
        Ok(out)
    }
}

impl SortTarget for SimBench {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn width(&self) -> Width {
        self.width
    }

    fn sort(&mut self, scenario: &Scenario) -> error::Result<Vec<u16>> {
        check_width(scenario, self.width)?;
        let delays = self.delay_override.unwrap_or(scenario.delays);
        self.exchange(&scenario.input, delays)
    }

    fn settle(&mut self) {
        let clock = self.sim.clock();
        self.sim.run(clock.cycles(QUIET_EDGES));
    }
}

pub fn run(opts: SimOpts) -> Result<RunSummary> {
    info!(
        depth = opts.depth,
        width = %opts.width,
        seed = opts.seed,
        stall_limit = ?opts.stall_limit(),
        "sim: starting"
    );
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let scenarios = sim_scenarios(opts.depth, opts.width, &mut rng);

    let bench = SimBench::new(opts.depth, opts.width, rng.r#gen())
        .with_stall_limit(opts.stall_limit())
        .with_delay_override(opts.delay_override());
    let mut runner = ScenarioRunner::new(bench);
    let summary = runner.run_all(&scenarios);
    let bench = runner.target();
    info!(edges = bench.edges(), batch = bench.depth(), "sim: done");
    Ok(summary)
}
