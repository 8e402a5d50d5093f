use crate::codec::{self, Width};
use crate::error::{HarnessError, Result};

pub const HEADER_LEN: usize = 2;
pub const MAX_COUNT: usize = u16::MAX as usize;

/// Total bytes of a frame carrying `count` values.
pub fn frame_len(count: usize) -> usize {
    HEADER_LEN + 2 * count
}

/// `[count: u16 LE][lo, hi]*count`
pub fn build_request(values: &[u16], width: Width) -> Result<Vec<u8>> {
    if values.len() > MAX_COUNT {
        return Err(HarnessError::TooManyValues(values.len()));
    }
    let mut out = Vec::with_capacity(frame_len(values.len()));
    out.extend_from_slice(&(values.len() as u16).to_le_bytes());
    for &v in values {
        out.extend_from_slice(&codec::encode(v, width)?);
    }
    Ok(out)
}

pub fn parse_header(bytes: &[u8]) -> Result<u16> {
    match bytes {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(HarnessError::ShortFrame {
            need: HEADER_LEN,
            have: bytes.len(),
        }),
    }
}

/// Decode a fully accumulated response. The header must echo the count
/// that was sent; a disagreeing header is a desync, never truncated to fit.
pub fn parse_response(bytes: &[u8], expected: usize, width: Width) -> Result<Vec<u16>> {
    let header = parse_header(bytes)?;
    if usize::from(header) != expected {
        return Err(HarnessError::LengthMismatch { header, expected });
    }
    let need = frame_len(expected);
    if bytes.len() < need {
        return Err(HarnessError::ShortFrame {
            need,
            have: bytes.len(),
        });
    }
    Ok(bytes[HEADER_LEN..need]
        .chunks_exact(2)
        .map(|pair| codec::decode([pair[0], pair[1]], width))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn request_layout() {
        let f = build_request(&[1023, 0, 512, 256], Width::BITS10).unwrap();
        assert_eq!(
            f,
            vec![4, 0, 0xFF, 0x03, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]
        );
        assert_eq!(f.len(), frame_len(4));
    }

    #[test]
    fn empty_request_is_header_only() {
        let f = build_request(&[], Width::BITS10).unwrap();
        assert_eq!(f, vec![0, 0]);
        assert_eq!(parse_response(&f, 0, Width::BITS10).unwrap(), Vec::<u16>::new());
    }

    #[test]
    fn too_many_values() {
        let values = vec![0u16; MAX_COUNT + 1];
        assert!(matches!(
            build_request(&values, Width::BITS10),
            Err(HarnessError::TooManyValues(65536))
        ));
        assert!(build_request(&values[..MAX_COUNT], Width::BITS10).is_ok());
    }

    #[test]
    fn rejects_value_before_building() {
        assert!(matches!(
            build_request(&[1, 2, 300], Width::BITS8),
            Err(HarnessError::Range { value: 300, .. })
        ));
    }

    #[test]
    fn header_disagreeing_with_request_is_mismatch() {
        let mut resp = build_request(&[1, 2, 3], Width::BITS10).unwrap();
        resp.extend_from_slice(&[4, 0, 5, 0]);
        assert!(matches!(
            parse_response(&resp, 5, Width::BITS10),
            Err(HarnessError::LengthMismatch {
                header: 3,
                expected: 5
            })
        ));
    }

    #[test]
    fn truncated_payload_is_short_frame() {
        let resp = build_request(&[7, 8, 9], Width::BITS10).unwrap();
        assert!(matches!(
            parse_response(&resp[..5], 3, Width::BITS10),
            Err(HarnessError::ShortFrame { need: 8, have: 5 })
        ));
        assert!(matches!(
            parse_header(&resp[..1]),
            Err(HarnessError::ShortFrame { need: 2, have: 1 })
        ));
    }

    proptest! {
        #[test]
        fn prop_echoed_request_roundtrips(values in prop::collection::vec(0u16..=1023, 0..300)) {
            let f = build_request(&values, Width::BITS10).unwrap();
            prop_assert_eq!(parse_response(&f, values.len(), Width::BITS10).unwrap(), values);
        }
    }
}
