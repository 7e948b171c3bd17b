//! Data Item layout descriptors.
//!
//! Items come in five shapes; a category's UAP maps each FRN to one of
//! them so that items without field bindings can still be consumed at
//! the right length, keeping the cursor in sync for the items that
//! follow.
//!

use crate::bits::BitCursor;
use crate::error::DecodeError;

/// How an item's bytes are laid out after the FSPEC.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ItemFormat {
    /// N octets
    Fixed(usize),
    /// One or more octets chained by the low FX bit
    Extended,
    /// One REP octet then REP subrecords of the given width
    Repetitive(usize),
    /// One presence-bitmap octet then one octet per set bit
    Compound,
    /// One length octet (counting itself) then length-1 octets
    Explicit,
}

/// One entry of a category's UAP.
///
#[derive(Clone, Copy, Debug)]
pub struct ItemSpec {
    pub frn: u8,
    pub id: &'static str,
    pub format: ItemFormat,
}

impl ItemFormat {
    /// Consume an item of this shape without interpreting it.
    ///
    pub fn skip(&self, cur: &mut BitCursor) -> Result<(), DecodeError> {
        match self {
            ItemFormat::Fixed(n) => {
                cur.bytes(*n)?;
            }
            ItemFormat::Extended => loop {
                let octet = cur.byte()?;
                if octet & 0x01 == 0 {
                    break;
                }
            },
            ItemFormat::Repetitive(width) => {
                let rep = cur.byte()? as usize;
                cur.bytes(rep * width)?;
            }
            ItemFormat::Compound => {
                // Primary subfield is one octet, FX unused; each set
                // presence bit announces a one-octet subfield.  Items
                // whose compound subfields are wider than one octet
                // would need their own width table here.
                let primary = cur.byte()?;
                debug_assert_eq!(0, primary & 0x01, "chained compound primary not handled");
                let subfields = (primary & 0xFE).count_ones() as usize;
                cur.bytes(subfields)?;
            }
            ItemFormat::Explicit => {
                let len = cur.byte()? as usize;
                if len == 0 {
                    return Err(DecodeError::ItemOutOfRange {
                        field: "explicit item length",
                        value: 0.0,
                    });
                }
                cur.bytes(len - 1)?;
            }
        }
        Ok(())
    }
}

/// Decode eight 6-bit characters from the ICAO alphabet.
///
/// 0b000001..0b011010 map to 'A'..'Z', 0b110000..0b111001 to '0'..'9',
/// 0b100000 to space, anything else to '?'.  Trailing spaces are
/// trimmed.
///
pub fn sixbit_callsign(cur: &mut BitCursor) -> Result<String, DecodeError> {
    let mut callsign = String::with_capacity(8);
    for _ in 0..8 {
        let code = cur.take(6)? as u8;
        let ch = match code {
            0x01..=0x1A => (b'A' + code - 1) as char,
            0x20 => ' ',
            0x30..=0x39 => (b'0' + code - 0x30) as char,
            _ => '?',
        };
        callsign.push(ch);
    }
    Ok(callsign.trim_end().to_owned())
}
