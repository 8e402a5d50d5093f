use std::time::Instant;

use tracing::info;

#[derive(Debug, Clone)]
pub struct Stats {
    pub passed: u64,
    pub failed: u64,
    /// Values pushed through the accelerator, passing or not.
    pub values: u64,
    t0: Instant,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            passed: 0,
            failed: 0,
            values: 0,
            t0: Instant::now(),
        }
    }
    pub fn add_values(&mut self, n: usize) {
        self.values += n as u64;
    }
    pub fn inc_pass(&mut self) {
        self.passed += 1;
    }
    pub fn inc_fail(&mut self) {
        self.failed += 1;
    }
    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }

    pub fn log_summary(&self, target: &str) {
        let dur = self.t0.elapsed().as_secs_f64().max(1e-3);
        info!(
            "[{}] passed={}/{} failed={} values={} over {:.2}s => {:.0} values/s",
            target,
            self.passed,
            self.total(),
            self.failed,
            self.values,
            dur,
            self.values as f64 / dur
        );
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}
