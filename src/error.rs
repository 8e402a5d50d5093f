use thiserror::Error;

use crate::codec::Width;

/// Failures of a single sort exchange. None of these are retried; the
/// scenario runner records them and moves on.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("value {value} out of range [0, {}] for {} bits", width.max(), width.bits())]
    Range { value: i64, width: Width },
    #[error("too many values: {0} (max 65535)")]
    TooManyValues(usize),
    #[error("incomplete response: got {} bytes, expected {expected}", partial.len())]
    Timeout { expected: usize, partial: Vec<u8> },
    #[error("length mismatch: header says {header}, expected {expected}")]
    LengthMismatch { header: u16, expected: usize },
    #[error("short frame: need {need} bytes, have {have}")]
    ShortFrame { need: usize, have: usize },
    #[error("sort failed: got {received:?}, expected {expected:?}")]
    OrderingMismatch {
        received: Vec<u16>,
        expected: Vec<u16>,
    },
    #[error("handshake stalled: {signal} not asserted after {edges} edges")]
    Stalled { signal: &'static str, edges: u64 },
    #[error("serial i/o: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
