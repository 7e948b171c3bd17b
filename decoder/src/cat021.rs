//! CAT021 - ADS-B target reports.
//!
//! Fourteen FRNs (two FSPEC octets).  The report already carries its
//! geographic position, so unlike CAT048 nothing is derived from radar
//! geometry downstream; the barometric pressure setting rides in the
//! reserved expansion field and feeds the QNH correction.
//!

use tracing::trace;

use crate::bits::BitCursor;
use crate::error::DecodeError;
use crate::item::{sixbit_callsign, ItemFormat, ItemSpec};

pub const CAT021: u8 = 21;

/// Highest FRN; caps the FSPEC at two octets.
pub const MAX_FRN: u8 = 14;

/// WGS-84 position resolution, degrees per LSB.
const POSITION_LSB: f64 = 180.0 / ((1 << 23) as f64);

/// Item order for the category.
///
pub const UAP: [ItemSpec; 14] = [
    ItemSpec { frn: 1, id: "I021/010", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 2, id: "I021/040", format: ItemFormat::Extended },
    ItemSpec { frn: 3, id: "I021/161", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 4, id: "I021/073", format: ItemFormat::Fixed(3) },
    ItemSpec { frn: 5, id: "I021/130", format: ItemFormat::Fixed(6) },
    ItemSpec { frn: 6, id: "I021/080", format: ItemFormat::Fixed(3) },
    ItemSpec { frn: 7, id: "I021/140", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 8, id: "I021/070", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 9, id: "I021/145", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 10, id: "I021/160", format: ItemFormat::Fixed(4) },
    ItemSpec { frn: 11, id: "I021/170", format: ItemFormat::Fixed(6) },
    ItemSpec { frn: 12, id: "I021/200", format: ItemFormat::Fixed(1) },
    ItemSpec { frn: 13, id: "I021/090", format: ItemFormat::Extended },
    ItemSpec { frn: 14, id: "I021/RE", format: ItemFormat::Explicit },
];

pub fn uap(frn: u8) -> Option<&'static ItemSpec> {
    (frn as usize).checked_sub(1).and_then(|i| UAP.get(i))
}

/// Raw fields decoded from one CAT021 record.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cat021Fields {
    pub sac: Option<u8>,
    pub sic: Option<u8>,
    // I021/040 descriptor
    pub atp: Option<u8>,
    pub arc: Option<u8>,
    pub rc: Option<u8>,
    pub rab: Option<u8>,
    pub dcr: Option<u8>,
    pub gbs: Option<u8>,
    pub sim: Option<u8>,
    pub tst: Option<u8>,
    pub track_number: Option<u16>,
    /// Seconds since midnight UTC, 1/128 s resolution
    pub time_s: Option<f64>,
    pub lat_deg: Option<f64>,
    pub lon_deg: Option<f64>,
    pub target_address: Option<u32>,
    /// Four octal digits
    pub mode3a: Option<String>,
    /// Quarter-FL resolution
    pub flight_level: Option<f64>,
    pub groundspeed_kt: Option<f64>,
    pub track_angle_deg: Option<f64>,
    pub callsign: Option<String>,
    /// Barometric pressure setting from the RE field, hPa
    pub bps_hpa: Option<f64>,
}

/// Run the items selected by the FSPEC against the cursor, in FRN
/// order.
///
pub fn decode_record(
    cur: &mut BitCursor,
    frns: &[u8],
    fields: &mut Cat021Fields,
) -> Result<(), DecodeError> {
    for &frn in frns {
        decode_item(frn, cur, fields).map_err(|e| {
            trace!("cat021 FRN {} failed: {}", frn, e);
            e
        })?;
    }
    Ok(())
}

fn decode_item(
    frn: u8,
    cur: &mut BitCursor,
    fields: &mut Cat021Fields,
) -> Result<(), DecodeError> {
    match frn {
        // I021/010 - data source identification
        1 => {
            fields.sac = Some(cur.byte()?);
            fields.sic = Some(cur.byte()?);
        }
        // I021/040 - target report descriptor
        2 => target_report_descriptor(cur, fields)?,
        // I021/161 - track number
        3 => {
            fields.track_number = Some((cur.take(16)? & 0x0FFF) as u16);
        }
        // I021/073 - time of message reception for position
        4 => {
            fields.time_s = Some(cur.take(24)? as f64 / 128.0);
        }
        // I021/130 - position in WGS-84 coordinates
        5 => position_wgs84(cur, fields)?,
        // I021/080 - target address
        6 => {
            fields.target_address = Some(cur.take(24)? as u32);
        }
        // I021/070 - Mode 3/A code (high bits are spare here)
        8 => {
            cur.skip(4)?;
            let code = cur.take(12)?;
            fields.mode3a = Some(format!("{:04o}", code));
        }
        // I021/145 - flight level, signed quarter-FL
        9 => {
            fields.flight_level = Some(cur.take_signed(16)? as f64 / 4.0);
        }
        // I021/160 - airborne ground vector
        10 => {
            cur.skip(1)?; // range exceeded bit
            fields.groundspeed_kt = Some(cur.take(15)? as f64 * 3600.0 / 16384.0);
            fields.track_angle_deg = Some(cur.take(16)? as f64 * 360.0 / 65536.0 % 360.0);
        }
        // I021/170 - target identification
        11 => {
            fields.callsign = Some(sixbit_callsign(cur)?);
        }
        // I021/RE - reserved expansion, may carry the BPS subfield
        14 => reserved_expansion(cur, fields)?,
        // Everything else is consumed at its declared shape
        _ => match uap(frn) {
            Some(spec) => spec.format.skip(cur)?,
            None => {
                return Err(DecodeError::UnknownFrn {
                    category: CAT021,
                    frn,
                })
            }
        },
    }
    Ok(())
}

/// I021/040, first octet and first extension bound, later extensions
/// consumed.
///
fn target_report_descriptor(
    cur: &mut BitCursor,
    fields: &mut Cat021Fields,
) -> Result<(), DecodeError> {
    fields.atp = Some(cur.take(3)? as u8);
    fields.arc = Some(cur.take(2)? as u8);
    fields.rc = Some(cur.take(1)? as u8);
    fields.rab = Some(cur.take(1)? as u8);

    let mut fx = cur.take(1)?;
    if fx == 1 {
        fields.dcr = Some(cur.take(1)? as u8);
        fields.gbs = Some(cur.take(1)? as u8);
        fields.sim = Some(cur.take(1)? as u8);
        fields.tst = Some(cur.take(1)? as u8);
        cur.skip(1)?; // SAA
        cur.skip(2)?; // CL
        fx = cur.take(1)?;
    }
    while fx == 1 {
        let octet = cur.byte()?;
        fx = u64::from(octet & 0x01);
    }
    Ok(())
}

/// I021/130: latitude and longitude as signed 24-bit fractions of
/// 180°/2^23.  A latitude outside ±90° is a semantic error; longitude
/// is normalized into [-180, 180).
///
fn position_wgs84(cur: &mut BitCursor, fields: &mut Cat021Fields) -> Result<(), DecodeError> {
    let lat = cur.take_signed(24)? as f64 * POSITION_LSB;
    let mut lon = cur.take_signed(24)? as f64 * POSITION_LSB;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(DecodeError::ItemOutOfRange {
            field: "latitude",
            value: lat,
        });
    }
    if lon >= 180.0 {
        lon -= 360.0;
    }

    fields.lat_deg = Some(lat);
    fields.lon_deg = Some(lon);
    Ok(())
}

/// Reserved expansion field: one length octet (counting itself), one
/// subfield-indicator octet, then the announced subfields.  Only the
/// barometric pressure setting is of interest; the rest of the blob is
/// stepped over.
///
fn reserved_expansion(cur: &mut BitCursor, fields: &mut Cat021Fields) -> Result<(), DecodeError> {
    let len = cur.byte()? as usize;
    if len < 2 {
        return Err(DecodeError::ItemOutOfRange {
            field: "RE field length",
            value: len as f64,
        });
    }
    let body = cur.bytes(len - 1)?;

    let mut sub = BitCursor::new(body);
    let indicator = sub.byte()?;
    if indicator & 0x80 != 0 {
        // BPS: 12 bits, LSB 0.1 hPa, offset 800
        sub.skip(4)?;
        let raw = sub.take(12)?;
        fields.bps_hpa = Some(raw as f64 * 0.1 + 800.0);
    }
    Ok(())
}
