//! Field specification (FSPEC) parsing.
//!
//! The FSPEC is the record-leading bitmap: in every octet the seven
//! high bits flag the presence of items FRN 1..7, 8..14, … and the low
//! bit (FX) chains to the next octet.  Each category caps the chain:
//! 14 FRNs (two octets) for CAT021, 28 FRNs (four octets) for CAT048.
//!

use crate::bits::BitCursor;
use crate::error::DecodeError;

/// Parsed field specification.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fspec {
    /// Present FRNs, ascending
    pub frns: Vec<u8>,
    /// Octets consumed
    pub octets: usize,
}

/// Decode the FSPEC at the cursor.
///
/// `max_frn` is the category's highest defined FRN; chaining past
/// ⌈max_frn/7⌉ octets is an unterminated FSPEC.
///
pub fn parse(cur: &mut BitCursor, max_frn: u8) -> Result<Fspec, DecodeError> {
    let max_octets = (max_frn as usize).div_ceil(7);
    let mut frns = Vec::new();
    let mut octets = 0;

    loop {
        let octet = cur.byte()?;
        octets += 1;
        if octets > max_octets {
            return Err(DecodeError::FspecUnterminated { max_octets });
        }

        let base = (octets - 1) * 7;
        for bit in 0..7 {
            if octet & (0x80 >> bit) != 0 {
                frns.push((base + bit + 1) as u8);
            }
        }

        // FX clear terminates the chain
        if octet & 0x01 == 0 {
            break;
        }
    }

    if frns.is_empty() {
        return Err(DecodeError::FspecEmpty);
    }
    Ok(Fspec { frns, octets })
}

/// Build the FSPEC octets selecting the given FRNs.  Test support for
/// the parse round-trip; the decoder itself never encodes.
///
#[cfg(test)]
pub fn encode(frns: &[u8]) -> Vec<u8> {
    let max = frns.iter().copied().max().unwrap_or(1) as usize;
    let octets = max.div_ceil(7);
    let mut out = vec![0u8; octets];

    for &frn in frns {
        let idx = (frn as usize - 1) / 7;
        let bit = (frn as usize - 1) % 7;
        out[idx] |= 0x80 >> bit;
    }
    // Chain everything but the last octet
    for o in out.iter_mut().take(octets - 1) {
        *o |= 0x01;
    }
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse_bytes(data: &[u8], max_frn: u8) -> Result<Fspec, DecodeError> {
        let mut cur = BitCursor::new(data);
        parse(&mut cur, max_frn)
    }

    #[test]
    fn test_single_octet() {
        let fspec = parse_bytes(&[0b1111_0100], 28).unwrap();
        assert_eq!(vec![1, 2, 3, 4, 6], fspec.frns);
        assert_eq!(1, fspec.octets);
    }

    #[test]
    fn test_chained_octets() {
        // FX set on the first octet, FRN 8 and 11 in the second
        let fspec = parse_bytes(&[0b1000_0001, 0b1001_0000], 28).unwrap();
        assert_eq!(vec![1, 8, 11], fspec.frns);
        assert_eq!(2, fspec.octets);
    }

    #[test]
    fn test_empty_fspec() {
        assert_eq!(Err(DecodeError::FspecEmpty), parse_bytes(&[0x00], 28));
    }

    #[rstest]
    #[case(14, 2)]
    #[case(28, 4)]
    fn test_unterminated_chain(#[case] max_frn: u8, #[case] max_octets: usize) {
        // Five octets, all chaining onwards
        let data = [0x01, 0x01, 0x01, 0x01, 0x01];
        assert_eq!(
            Err(DecodeError::FspecUnterminated { max_octets }),
            parse_bytes(&data, max_frn)
        );
    }

    #[test]
    fn test_truncated_chain() {
        // FX set but no following octet
        assert!(matches!(
            parse_bytes(&[0x81], 28),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[rstest]
    #[case(vec![1])]
    #[case(vec![1, 2, 3, 4, 5, 6, 7])]
    #[case(vec![7, 8])]
    #[case(vec![1, 14])]
    #[case(vec![2, 9, 15, 21, 28])]
    fn test_encode_parse_roundtrip(#[case] frns: Vec<u8>) {
        let bytes = encode(&frns);
        let fspec = parse_bytes(&bytes, 28).unwrap();
        assert_eq!(frns, fspec.frns);
        assert_eq!(bytes.len(), fspec.octets);
    }
}
