use anyhow::Result;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

use crate::cli::SerialOpts;
use crate::rx::POLL_BACKOFF;

/// Byte channel to the accelerator. Reads may time out with
/// `ErrorKind::TimedOut`; the deadline reader treats that as "no data yet".
pub trait Channel: Read + Write {
    /// Drop anything still sitting in the driver buffers from a previous
    /// exchange.
    fn discard_pending(&mut self) -> io::Result<()>;
}

impl Channel for Box<dyn SerialPort> {
    fn discard_pending(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::All).map_err(io::Error::from)
    }
}

pub fn open_port(opts: &SerialOpts) -> Result<Box<dyn SerialPort>> {
    // Short read timeout: the deadline reader does the real waiting.
    let builder = serialport::new(&opts.port, opts.baudrate)
        .timeout(POLL_BACKOFF)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(if opts.rtscts {
            FlowControl::Hardware
        } else {
            FlowControl::None
        });

    let port = builder
        .open()
        .map_err(|e| anyhow::anyhow!("open {}: {}", opts.port, e))?;

    // Let the FPGA come out of whatever the DTR toggle did to it.
    std::thread::sleep(Duration::from_millis(500));
    Ok(port)
}

#[cfg(test)]
pub mod mock {
    //! In-memory channels standing in for the UART.

    use super::Channel;
    use crate::codec::Width;
    use crate::frame;
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};

    /// Replays scripted reads. `None` entries produce a `TimedOut` read.
    #[derive(Default)]
    pub struct Scripted {
        pub reads: VecDeque<Option<Vec<u8>>>,
        pub written: Vec<u8>,
        pub discards: usize,
    }

    impl Scripted {
        pub fn new(reads: impl IntoIterator<Item = Option<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into_iter().collect(),
                ..Default::default()
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Some(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.reads.push_front(Some(chunk.split_off(n)));
                    }
                    Ok(n)
                }
                Some(None) | None => Err(io::ErrorKind::TimedOut.into()),
            }
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Channel for Scripted {
        fn discard_pending(&mut self) -> io::Result<()> {
            self.discards += 1;
            Ok(())
        }
    }

    /// Software stand-in for the UART sorter: once a full request frame has
    /// been written it queues the sorted response.
    pub struct SortingEcho {
        width: Width,
        inbox: Vec<u8>,
        outbox: VecDeque<u8>,
        /// Bytes handed out per read, to exercise partial accumulation.
        pub chunk: usize,
        /// Corrupt the response header by this much.
        pub header_skew: i32,
    }

    impl SortingEcho {
        pub fn new(width: Width) -> Self {
            Self {
                width,
                inbox: Vec::new(),
                outbox: VecDeque::new(),
                chunk: 3,
                header_skew: 0,
            }
        }

        fn try_answer(&mut self) {
            let Ok(count) = frame::parse_header(&self.inbox) else {
                return;
            };
            let count = usize::from(count);
            if self.inbox.len() < frame::frame_len(count) {
                return;
            }
            let mut values = match frame::parse_response(&self.inbox, count, self.width) {
                Ok(v) => v,
                Err(_) => return,
            };
            self.inbox.drain(..frame::frame_len(count));
            values.sort_unstable();
            let Ok(mut resp) = frame::build_request(&values, self.width) else {
                return;
            };
            let header = (count as i32 + self.header_skew) as u16;
            resp[..2].copy_from_slice(&header.to_le_bytes());
            self.outbox.extend(resp);
        }
    }

    impl Read for SortingEcho {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.outbox.is_empty() {
                return Err(io::ErrorKind::TimedOut.into());
            }
            let n = buf.len().min(self.chunk).min(self.outbox.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.outbox.pop_front().unwrap_or_default();
            }
            Ok(n)
        }
    }

    impl Write for SortingEcho {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.inbox.extend_from_slice(buf);
            self.try_answer();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Channel for SortingEcho {
        fn discard_pending(&mut self) -> io::Result<()> {
            self.outbox.clear();
            Ok(())
        }
    }
}
