use super::Dut;
use super::signal::SortPorts;
use crate::codec::Width;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Load,
    Drain,
}

/// Behavioural model of the insertion-sort core: accepts `depth` values,
/// keeping them ordered as they arrive, then streams them out ascending and
/// goes back to accepting.
pub struct InsertionSorter {
    depth: usize,
    width: Width,
    phase: Phase,
    slots: Vec<u16>,
    next_out: usize,
}

impl InsertionSorter {
    pub fn new(depth: usize, width: Width) -> Self {
        Self {
            depth: depth.max(1),
            width,
            phase: Phase::Load,
            slots: Vec::with_capacity(depth),
            next_out: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn insert(&mut self, value: u16) {
        let at = self.slots.partition_point(|&v| v <= value);
        self.slots.insert(at, value);
    }
}

impl Dut for InsertionSorter {
    fn rising_edge(&mut self, p: &SortPorts) {
        if p.reset.is_high() {
            self.phase = Phase::Load;
            self.slots.clear();
            self.next_out = 0;
            p.ready_out.drive(0);
            p.valid_out.drive(0);
            p.data_out.drive(0);
            return;
        }

        match self.phase {
            Phase::Load => {
                if p.ready_out.is_high() && p.valid_in.is_high() {
                    self.insert(p.data_in.sample() as u16 & self.width.max());
                }
                if self.slots.len() == self.depth {
                    self.phase = Phase::Drain;
                    self.next_out = 0;
                    p.ready_out.drive(0);
                    p.valid_out.drive(1);
                    p.data_out.drive(u32::from(self.slots[0]));
                } else {
                    p.ready_out.drive(1);
                }
            }
            Phase::Drain => {
                if p.valid_out.is_high() && p.ready_in.is_high() {
                    self.next_out += 1;
                }
                match self.slots.get(self.next_out) {
                    Some(&v) => {
                        p.valid_out.drive(1);
                        p.data_out.drive(u32::from(v));
                    }
                    None => {
                        self.phase = Phase::Load;
                        self.slots.clear();
                        self.next_out = 0;
                        p.valid_out.drive(0);
                        p.ready_out.drive(1);
                    }
                }
            }
        }
    }
}
