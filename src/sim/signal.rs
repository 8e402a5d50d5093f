use std::cell::Cell;
use std::rc::Rc;

struct Inner {
    name: &'static str,
    driven: Cell<u32>,
    sampled: Cell<u32>,
}

/// One wire. Writers `drive` it at any time; readers only ever see the
/// value latched at the last rising edge.
#[derive(Clone)]
pub struct Signal(Rc<Inner>);

impl Signal {
    pub fn new(name: &'static str) -> Self {
        Signal(Rc::new(Inner {
            name,
            driven: Cell::new(0),
            sampled: Cell::new(0),
        }))
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn drive(&self, value: u32) {
        self.0.driven.set(value);
    }

    pub fn sample(&self) -> u32 {
        self.0.sampled.get()
    }

    pub fn is_high(&self) -> bool {
        self.sample() != 0
    }

    fn latch(&self) {
        self.0.sampled.set(self.0.driven.get());
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name(), self.sample())
    }
}

/// Pins of the sorter: one ready/valid channel in, one out, and reset.
#[derive(Clone, Debug)]
pub struct SortPorts {
    pub reset: Signal,
    pub data_in: Signal,
    pub valid_in: Signal,
    pub ready_out: Signal,
    pub data_out: Signal,
    pub valid_out: Signal,
    pub ready_in: Signal,
}

impl SortPorts {
    pub fn new() -> Self {
        Self {
            reset: Signal::new("reset"),
            data_in: Signal::new("data_in"),
            valid_in: Signal::new("valid_in"),
            ready_out: Signal::new("ready_out"),
            data_out: Signal::new("data_out"),
            valid_out: Signal::new("valid_out"),
            ready_in: Signal::new("ready_in"),
        }
    }

    /// Snapshot every driven value. Called by the kernel right before an edge.
    pub(super) fn latch(&self) {
        for s in [
            &self.reset,
            &self.data_in,
            &self.valid_in,
            &self.ready_out,
            &self.data_out,
            &self.valid_out,
            &self.ready_in,
        ] {
            s.latch();
        }
    }
}

impl Default for SortPorts {
    fn default() -> Self {
        Self::new()
    }
}
