use std::io::Write;

use tracing::debug;

use crate::cli::Pacing;
use crate::error::Result;
use crate::frame::HEADER_LEN;
use crate::port::Channel;

/// Put a built request frame on the wire. Returns the bytes written.
pub fn send_frame<C: Channel + ?Sized>(chan: &mut C, frame: &[u8], pacing: Pacing) -> Result<usize> {
    chan.discard_pending()?;
    debug!(len = frame.len(), bytes = %hex(frame), "tx frame");

    match pacing {
        Pacing::Burst => {
            chan.write_all(frame)?;
            chan.flush()?;
        }
        Pacing::PerValue(gap) => {
            // Header first, then one value pair at a time so a slow
            // receiver FIFO never sees more than one pair in flight.
            let (header, payload) = frame.split_at(HEADER_LEN.min(frame.len()));
            chan.write_all(header)?;
            chan.flush()?;
            for pair in payload.chunks(2) {
                chan.write_all(pair)?;
                chan.flush()?;
                std::thread::sleep(gap);
            }
        }
    }
    Ok(frame.len())
}

pub fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 * bytes.len());
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}
