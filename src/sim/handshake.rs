//! Ready/valid bus-functional models.
//!
//! A transfer completes on the first rising edge where both `valid` and
//! `ready` were high. Both sides drive their own lines between edges and
//! sample the other side's lines only as latched at the edge.

use rand::Rng;
use tracing::trace;

use super::clock::Clock;
use super::signal::Signal;
use crate::error::{HarnessError, Result};

/// Inclusive range of idle edges inserted between transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayRange {
    pub lo: u64,
    pub hi: u64,
}

impl DelayRange {
    pub const NONE: DelayRange = DelayRange { lo: 0, hi: 0 };

    pub fn new(lo: u64, hi: u64) -> Self {
        Self {
            lo: lo.min(hi),
            hi: lo.max(hi),
        }
    }

    /// Number of edges to idle. A zero upper bound never touches the RNG.
    pub fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        if self.hi == 0 {
            0
        } else {
            rng.gen_range(self.lo..=self.hi)
        }
    }
}

/// Wait edge by edge until `line` was sampled high.
async fn await_high(clock: &Clock, line: &Signal, stall_limit: Option<u64>) -> Result<u64> {
    let mut waited = 0;
    loop {
        clock.rising_edge().await;
        waited += 1;
        if line.is_high() {
            return Ok(waited);
        }
        if stall_limit.is_some_and(|limit| waited >= limit) {
            return Err(HarnessError::Stalled {
                signal: line.name(),
                edges: waited,
            });
        }
    }
}

/// Pushes values into a ready/valid sink.
pub struct HandshakeDriver {
    clock: Clock,
    data: Signal,
    valid: Signal,
    ready: Signal,
    stall_limit: Option<u64>,
}

impl HandshakeDriver {
    pub fn new(clock: &Clock, data: &Signal, valid: &Signal, ready: &Signal) -> Self {
        Self {
            clock: clock.clone(),
            data: data.clone(),
            valid: valid.clone(),
            ready: ready.clone(),
            stall_limit: None,
        }
    }

    /// Give up with `Stalled` after this many edges without `ready`.
    pub fn with_stall_limit(mut self, limit: Option<u64>) -> Self {
        self.stall_limit = limit;
        self
    }

    pub async fn send(&self, value: u16) -> Result<()> {
        self.data.drive(u32::from(value));
        self.valid.drive(1);
        let waited = await_high(&self.clock, &self.ready, self.stall_limit).await;
        self.valid.drive(0);
        let waited = waited?;
        trace!(value, waited, edge = self.clock.edges(), "driver: accepted");
        Ok(())
    }

    pub async fn send_all<R: Rng + ?Sized>(&self, values: &[u16], delays: DelayRange, rng: &mut R) -> Result<()> {
        for &v in values {
            self.send(v).await?;
            let idle = delays.pick(rng);
            if idle > 0 {
                self.clock.cycles(idle).await;
            }
        }
        Ok(())
    }
}

/// Drains values from a ready/valid source.
pub struct HandshakeMonitor {
    clock: Clock,
    data: Signal,
    valid: Signal,
    ready: Signal,
    stall_limit: Option<u64>,
}

impl HandshakeMonitor {
    pub fn new(clock: &Clock, data: &Signal, valid: &Signal, ready: &Signal) -> Self {
        Self {
            clock: clock.clone(),
            data: data.clone(),
            valid: valid.clone(),
            ready: ready.clone(),
            stall_limit: None,
        }
    }

    pub fn with_stall_limit(mut self, limit: Option<u64>) -> Self {
        self.stall_limit = limit;
        self
    }

    pub async fn receive(&self) -> Result<u16> {
        self.ready.drive(1);
        let waited = await_high(&self.clock, &self.valid, self.stall_limit).await?;
        let value = self.data.sample() as u16;
        trace!(value, waited, edge = self.clock.edges(), "monitor: received");
        Ok(value)
    }

    /// Collect `count` values in arrival order. Drops `ready` while idling
    /// between transfers to apply backpressure, and always after the last.
    pub async fn receive_all<R: Rng + ?Sized>(
        &self,
        count: usize,
        delays: DelayRange,
        rng: &mut R,
    ) -> Result<Vec<u16>> {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            match self.receive().await {
                Ok(v) => values.push(v),
                Err(e) => {
                    self.ready.drive(0);
                    return Err(e);
                }
            }
            let idle = delays.pick(rng);
            if idle > 0 {
                self.ready.drive(0);
                self.clock.cycles(idle).await;
            }
        }
        self.ready.drive(0);
        Ok(values)
    }
}
