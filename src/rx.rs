use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{HarnessError, Result};

/// Sleep between empty polls of the channel.
pub const POLL_BACKOFF: Duration = Duration::from_millis(10);

/// Absolute point after which a receive gives up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Deadline(Instant::now() + timeout)
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.0
    }

    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }
}

/// Accumulate exactly `n` bytes or fail with `Timeout` carrying whatever
/// arrived. The only retry loop in the harness.
pub fn read_exactly<R: Read + ?Sized>(chan: &mut R, n: usize, deadline: Deadline) -> Result<Vec<u8>> {
    let mut acc = Vec::with_capacity(n);
    let mut chunk = [0u8; 256];

    while acc.len() < n {
        if deadline.expired() {
            return Err(HarnessError::Timeout {
                expected: n,
                partial: acc,
            });
        }
        let want = (n - acc.len()).min(chunk.len());
        match chan.read(&mut chunk[..want]) {
            Ok(0) => std::thread::sleep(POLL_BACKOFF.min(deadline.remaining())),
            Ok(k) => {
                trace!(got = k, have = acc.len() + k, want = n, "rx chunk");
                acc.extend_from_slice(&chunk[..k]);
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                std::thread::sleep(POLL_BACKOFF.min(deadline.remaining()))
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::mock::Scripted;
    use std::io;

    #[test]
    fn gathers_trickled_chunks() {
        let mut chan = Scripted::new([
            Some(vec![1]),
            None,
            Some(vec![2, 3]),
            None,
            None,
            Some(vec![4, 5, 6, 7]),
        ]);
        let got = read_exactly(&mut chan, 5, Deadline::after(Duration::from_secs(2))).unwrap();
        assert_eq!(got, vec![1, 2, 3, 4, 5]);
        // surplus stays in the channel for the next read
        assert_eq!(chan.reads.front(), Some(&Some(vec![6, 7])));
    }

    #[test]
    fn zero_bytes_needs_no_read() {
        let mut chan = Scripted::default();
        let got = read_exactly(&mut chan, 0, Deadline::after(Duration::ZERO)).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn silent_channel_times_out_at_deadline() {
        let timeout = Duration::from_millis(150);
        let mut chan = Scripted::new([Some(vec![0xAA, 0xBB])]);
        let start = Instant::now();
        let err = read_exactly(&mut chan, 4, Deadline::after(timeout)).unwrap_err();
        let elapsed = start.elapsed();

        match err {
            HarnessError::Timeout { expected, partial } => {
                assert_eq!(expected, 4);
                assert_eq!(partial, vec![0xAA, 0xBB]);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(elapsed >= timeout, "returned early after {elapsed:?}");
        assert!(elapsed < timeout + Duration::from_millis(200), "overshot: {elapsed:?}");
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn hard_io_error_propagates() {
        let err = read_exactly(&mut Broken, 2, Deadline::after(Duration::from_secs(1))).unwrap_err();
        assert!(matches!(err, HarnessError::Io(e) if e.kind() == io::ErrorKind::BrokenPipe));
    }
}
