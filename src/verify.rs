use crate::error::{HarnessError, Result};

/// Reference sort.
pub fn ascending(values: &[u16]) -> Vec<u16> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted
}

/// The accelerator is a plain value sort: equal values are
/// interchangeable, so comparing against the reference sort is enough.
pub fn verify(received: &[u16], original: &[u16]) -> Result<()> {
    let expected = ascending(original);
    if received == expected.as_slice() {
        Ok(())
    } else {
        Err(HarnessError::OrderingMismatch {
            received: received.to_vec(),
            expected,
        })
    }
}
