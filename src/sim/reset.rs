use super::clock::Clock;
use super::signal::SortPorts;

/// Synchronous reset with the inputs parked at zero.
pub struct ResetSequencer {
    clock: Clock,
    ports: SortPorts,
    /// Edges with reset held high.
    pub hold: u64,
    /// Edges to wait after release before any traffic.
    pub settle: u64,
}

impl ResetSequencer {
    pub fn new(clock: &Clock, ports: &SortPorts) -> Self {
        Self {
            clock: clock.clone(),
            ports: ports.clone(),
            hold: 5,
            settle: 2,
        }
    }

    pub async fn run(&self) {
        let p = &self.ports;
        p.reset.drive(1);
        p.valid_in.drive(0);
        p.ready_in.drive(0);
        p.data_in.drive(0);
        self.clock.cycles(self.hold).await;
        p.reset.drive(0);
        self.clock.cycles(self.settle).await;
    }
}
