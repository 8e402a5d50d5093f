//! Cycle kernel for the handshake testbench.
//!
//! The kernel owns the clock, the pins and the design under test. Testbench
//! code is an ordinary future; whenever it cannot make progress the kernel
//! advances one rising edge: latch every pin, let the DUT react to the
//! latched values, then wake whoever waits on the clock.

use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;

pub mod bench;
pub mod clock;
pub mod handshake;
pub mod model;
pub mod reset;
pub mod signal;

pub use clock::Clock;
pub use signal::SortPorts;

/// Clocked behaviour of the accelerator. Reads latched inputs, drives
/// outputs that become visible at the next edge.
pub trait Dut {
    fn rising_edge(&mut self, ports: &SortPorts);
}

pub struct Simulator<D> {
    clock: Clock,
    ports: SortPorts,
    dut: D,
}

impl<D: Dut> Simulator<D> {
    pub fn new(dut: D) -> Self {
        Self {
            clock: Clock::new(),
            ports: SortPorts::new(),
            dut,
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    pub fn ports(&self) -> SortPorts {
        self.ports.clone()
    }

    pub fn dut(&self) -> &D {
        &self.dut
    }

    /// One rising edge.
    pub fn step(&mut self) {
        self.ports.latch();
        self.dut.rising_edge(&self.ports);
        self.clock.tick();
    }

    /// Drive `bench` to completion, stepping the clock whenever it is
    /// parked. Everything the bench waits on is edge-driven, so one poll per
    /// edge is enough. A bench that waits forever runs forever.
    pub fn run<F: Future>(&mut self, bench: F) -> F::Output {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut bench = pin!(bench);
        loop {
            if let Poll::Ready(out) = bench.as_mut().poll(&mut cx) {
                return out;
            }
            self.step();
        }
    }
}
