use std::process::ExitCode;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{info, warn};

use crate::codec::Width;
use crate::error::{HarnessError, Result};
use crate::sim::handshake::DelayRange;
use crate::stats::Stats;
use crate::verify::{ascending, verify};

/// Something that sorts: the simulated core or the board on the UART.
pub trait SortTarget {
    fn name(&self) -> &'static str;
    fn width(&self) -> Width;
    /// Push the scenario input through and return what came back, unverified.
    fn sort(&mut self, scenario: &Scenario) -> Result<Vec<u16>>;
    /// Quiet period between scenarios.
    fn settle(&mut self) {}
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub input: Vec<u16>,
    /// Handshake pacing; ignored by the byte-stream path.
    pub delays: DelayRange,
}

impl Scenario {
    pub fn new(name: impl Into<String>, input: Vec<u16>) -> Self {
        Self {
            name: name.into(),
            input,
            delays: DelayRange::NONE,
        }
    }

    pub fn with_delays(mut self, delays: DelayRange) -> Self {
        self.delays = delays;
        self
    }

    pub fn random<R: Rng + ?Sized>(name: impl Into<String>, len: usize, width: Width, rng: &mut R) -> Self {
        let input = (0..len).map(|_| rng.gen_range(0..=width.max())).collect();
        Self::new(name, input)
    }

    pub fn expected(&self) -> Vec<u16> {
        ascending(&self.input)
    }
}

#[derive(Debug)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: Result<()>,
    pub elapsed: Duration,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<ScenarioReport>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.failed() == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

pub struct ScenarioRunner<T> {
    target: T,
    stats: Stats,
}

impl<T: SortTarget> ScenarioRunner<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            stats: Stats::new(),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn run_one(&mut self, scenario: &Scenario) -> ScenarioReport {
        info!(scenario = %scenario.name, "input:    {:?}", scenario.input);
        info!(scenario = %scenario.name, "expected: {:?}", scenario.expected());

        let start = Instant::now();
        let outcome = self.target.sort(scenario).and_then(|out| {
            info!(scenario = %scenario.name, "received: {:?}", out);
            verify(&out, &scenario.input)
        });
        let elapsed = start.elapsed();

        self.stats.add_values(scenario.input.len());
        match &outcome {
            Ok(()) => {
                self.stats.inc_pass();
                info!(scenario = %scenario.name, ?elapsed, "PASS");
            }
            Err(e) => {
                self.stats.inc_fail();
                warn!(scenario = %scenario.name, ?elapsed, "FAIL: {e}");
            }
        }
        ScenarioReport {
            name: scenario.name.clone(),
            outcome,
            elapsed,
        }
    }

    /// Run everything in order. A failing scenario never stops the rest.
    pub fn run_all(&mut self, scenarios: &[Scenario]) -> RunSummary {
        let mut summary = RunSummary::default();
        for (i, sc) in scenarios.iter().enumerate() {
            if i > 0 {
                self.target.settle();
            }
            summary.reports.push(self.run_one(sc));
        }

        self.stats.log_summary(self.target.name());
        if summary.failed() == 0 {
            info!("all {} scenario(s) passed", summary.reports.len());
        } else {
            for r in summary.reports.iter().filter(|r| !r.passed()) {
                warn!("failed: {}", r.name);
            }
            warn!("{} of {} scenario(s) failed", summary.failed(), summary.reports.len());
        }
        summary
    }
}

/// Repeat `pattern` to `len` values.
fn fit(pattern: &[u16], len: usize) -> Vec<u16> {
    pattern.iter().copied().cycle().take(len).collect()
}

fn ramp(len: usize, width: Width) -> Vec<u16> {
    let span = usize::from(width.max()) + 1;
    (0..len).map(|i| (i % span) as u16).collect()
}

/// Handshake testbench set. Every non-empty input is exactly one sorter
/// batch long.
pub fn sim_scenarios<R: Rng + ?Sized>(depth: usize, width: Width, rng: &mut R) -> Vec<Scenario> {
    let mut reversed = ramp(depth, width);
    reversed.reverse();
    let mut out = vec![
        Scenario::new("basic", fit(&[5, 2, 8, 1, 9, 3, 7, 4, 6, 0], depth)),
        Scenario::random("random delays", depth, width, rng).with_delays(DelayRange::new(0, 5)),
        Scenario::new("already sorted", ramp(depth, width)),
        Scenario::new("reverse sorted", reversed),
        Scenario::new("duplicates", fit(&[5, 2, 5, 1, 2, 3, 5, 4, 2, 1], depth)),
        Scenario::new("all same", vec![42; depth]),
        Scenario::new(
            "edge values",
            fit(&[width.max(), 0, 128, width.max(), 1, width.max() - 1, 0, 127, 200, 50], depth),
        ),
    ];
    for run in 1..=3 {
        out.push(
            Scenario::random(format!("multiple runs #{run}"), depth, width, rng)
                .with_delays(DelayRange::new(0, 2)),
        );
    }
    out.push(Scenario::new("empty", Vec::new()));
    out
}

/// UART board set.
pub fn uart_scenarios<R: Rng + ?Sized>(width: Width, rng: &mut R) -> Vec<Scenario> {
    let top = width.max();
    vec![
        Scenario::new("single value", vec![42]),
        Scenario::new("already sorted", vec![1, 2, 3, 4, 5]),
        Scenario::new("reverse sorted", vec![5, 4, 3, 2, 1]),
        Scenario::new("random order", vec![15, 3, 27, 8, 19]),
        Scenario::new("short mix", vec![5, 4, 1]),
        Scenario::new("five mix", vec![10, 20, 5, 15, 1]),
        Scenario::new("duplicates", vec![5, 2, 5, 1, 5, 2]),
        Scenario::new("max values", vec![top, 0, top / 2, top.min(256)]),
        Scenario::new("quarter points", vec![top, 0, (top / 2) + 1, top.min(256)]),
        Scenario::new("all same", vec![100, 100, 100]),
        Scenario::new("stride 5", (0..100).step_by(5).collect()),
        Scenario::new("empty", Vec::new()),
        Scenario::random("large (50 values)", 50, width, rng),
    ]
}

/// Range-check a scenario before it reaches a target.
pub fn check_width(scenario: &Scenario, width: Width) -> Result<()> {
    match scenario.input.iter().find(|&&v| v > width.max()) {
        Some(&v) => Err(HarnessError::Range {
            value: i64::from(v),
            width,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Sorts in software, optionally botching one scenario.
    struct Fake {
        botch: Option<&'static str>,
        settles: usize,
    }

    impl SortTarget for Fake {
        fn name(&self) -> &'static str {
            "fake"
        }
        fn width(&self) -> Width {
            Width::BITS10
        }
        fn sort(&mut self, sc: &Scenario) -> Result<Vec<u16>> {
            check_width(sc, self.width())?;
            if self.botch == Some(sc.name.as_str()) {
                return Err(HarnessError::LengthMismatch {
                    header: 3,
                    expected: sc.input.len(),
                });
            }
            Ok(ascending(&sc.input))
        }
        fn settle(&mut self) {
            self.settles += 1;
        }
    }

    #[test]
    fn failure_is_recorded_and_run_continues() {
        let mut runner = ScenarioRunner::new(Fake {
            botch: Some("b"),
            settles: 0,
        });
        let summary = runner.run_all(&[
            Scenario::new("a", vec![3, 1]),
            Scenario::new("b", vec![1, 2, 3, 4, 5]),
            Scenario::new("c", vec![]),
        ]);
        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.failed(), 1);
        assert!(matches!(
            summary.reports[1].outcome,
            Err(HarnessError::LengthMismatch { header: 3, expected: 5 })
        ));
        assert_eq!(runner.target().settles, 2);
        assert_eq!(runner.stats().failed, 1);
    }

    #[test]
    fn all_passing_exits_zero() {
        let mut runner = ScenarioRunner::new(Fake {
            botch: None,
            settles: 0,
        });
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let summary = runner.run_all(&uart_scenarios(Width::BITS10, &mut rng));
        assert_eq!(summary.failed(), 0);
    }

    #[test]
    fn out_of_range_input_fails_scenario() {
        let mut runner = ScenarioRunner::new(Fake {
            botch: None,
            settles: 0,
        });
        let report = runner.run_one(&Scenario::new("too big", vec![1, 1024]));
        assert!(matches!(report.outcome, Err(HarnessError::Range { value: 1024, .. })));
    }

    #[test]
    fn sim_set_matches_batch_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let set = sim_scenarios(10, Width::BITS8, &mut rng);
        for sc in &set {
            assert!(sc.input.is_empty() || sc.input.len() == 10, "{}", sc.name);
            assert!(check_width(sc, Width::BITS8).is_ok(), "{}", sc.name);
        }
        assert_eq!(set[0].input, vec![5, 2, 8, 1, 9, 3, 7, 4, 6, 0]);
        assert_eq!(set[3].input, (0..10).rev().collect::<Vec<u16>>());
        assert_eq!(set[6].input, vec![255, 0, 128, 255, 1, 254, 0, 127, 200, 50]);
    }

    #[test]
    fn generated_sets_are_reproducible() {
        let a = uart_scenarios(Width::BITS10, &mut ChaCha8Rng::seed_from_u64(7));
        let b = uart_scenarios(Width::BITS10, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a.last().map(|s| &s.input), b.last().map(|s| &s.input));
        assert!(a.iter().any(|s| s.input == vec![1023, 0, 512, 256]));
    }
}
