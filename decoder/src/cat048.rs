//! CAT048 - monoradar target reports.
//!
//! The UAP below is the published item order; items without a binding
//! into the unified record are still consumed at their proper length so
//! the cursor stays in sync.  FRN 27/28 are the special-purpose and
//! reserved-expansion fields, declared-length blobs we step over.
//!

use radex_formats::FlightStatus;
use tracing::trace;

use crate::bds::{self, BdsRegister};
use crate::bits::BitCursor;
use crate::error::DecodeError;
use crate::item::{sixbit_callsign, ItemFormat, ItemSpec};

pub const CAT048: u8 = 48;

/// Highest FRN; caps the FSPEC at four octets.
pub const MAX_FRN: u8 = 28;

/// Item order for the category.
///
pub const UAP: [ItemSpec; 28] = [
    ItemSpec { frn: 1, id: "I048/010", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 2, id: "I048/140", format: ItemFormat::Fixed(3) },
    ItemSpec { frn: 3, id: "I048/020", format: ItemFormat::Extended },
    ItemSpec { frn: 4, id: "I048/040", format: ItemFormat::Fixed(4) },
    ItemSpec { frn: 5, id: "I048/070", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 6, id: "I048/090", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 7, id: "I048/130", format: ItemFormat::Compound },
    ItemSpec { frn: 8, id: "I048/220", format: ItemFormat::Fixed(3) },
    ItemSpec { frn: 9, id: "I048/240", format: ItemFormat::Fixed(6) },
    ItemSpec { frn: 10, id: "I048/250", format: ItemFormat::Repetitive(8) },
    ItemSpec { frn: 11, id: "I048/161", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 12, id: "I048/042", format: ItemFormat::Fixed(4) },
    ItemSpec { frn: 13, id: "I048/200", format: ItemFormat::Fixed(4) },
    ItemSpec { frn: 14, id: "I048/170", format: ItemFormat::Extended },
    ItemSpec { frn: 15, id: "I048/210", format: ItemFormat::Fixed(4) },
    ItemSpec { frn: 16, id: "I048/030", format: ItemFormat::Extended },
    ItemSpec { frn: 17, id: "I048/080", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 18, id: "I048/100", format: ItemFormat::Fixed(4) },
    ItemSpec { frn: 19, id: "I048/110", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 20, id: "I048/120", format: ItemFormat::Compound },
    ItemSpec { frn: 21, id: "I048/230", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 22, id: "I048/260", format: ItemFormat::Fixed(7) },
    ItemSpec { frn: 23, id: "I048/055", format: ItemFormat::Fixed(1) },
    ItemSpec { frn: 24, id: "I048/050", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 25, id: "I048/065", format: ItemFormat::Fixed(1) },
    ItemSpec { frn: 26, id: "I048/060", format: ItemFormat::Fixed(2) },
    ItemSpec { frn: 27, id: "I048/SP", format: ItemFormat::Explicit },
    ItemSpec { frn: 28, id: "I048/RE", format: ItemFormat::Explicit },
];

pub fn uap(frn: u8) -> Option<&'static ItemSpec> {
    (frn as usize).checked_sub(1).and_then(|i| UAP.get(i))
}

/// Raw fields decoded from one CAT048 record.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cat048Fields {
    pub sac: Option<u8>,
    pub sic: Option<u8>,
    /// Seconds since midnight UTC, 1/128 s resolution
    pub time_of_day_s: Option<f64>,
    pub typ: Option<u8>,
    pub sim: Option<u8>,
    pub rdp: Option<u8>,
    pub spi: Option<u8>,
    pub rab: Option<u8>,
    /// Slant range in NM
    pub rho_nm: Option<f64>,
    /// Azimuth in degrees
    pub theta_deg: Option<f64>,
    /// Four octal digits
    pub mode3a: Option<String>,
    pub mode3a_v: Option<u8>,
    pub mode3a_g: Option<u8>,
    pub mode3a_l: Option<u8>,
    /// Quarter-FL resolution
    pub flight_level: Option<f64>,
    pub fl_v: Option<u8>,
    pub fl_g: Option<u8>,
    pub aircraft_address: Option<u32>,
    pub callsign: Option<String>,
    /// MB registers in order of appearance
    pub bds: Vec<BdsRegister>,
    pub track_number: Option<u16>,
    pub calc_groundspeed_kt: Option<f64>,
    pub calc_heading_deg: Option<f64>,
    pub flight_status: Option<FlightStatus>,
}

/// Run the items selected by the FSPEC against the cursor, in FRN
/// order, filling `fields` as we go.  On error the fields decoded so
/// far are left in place for the caller to dispose of.
///
pub fn decode_record(
    cur: &mut BitCursor,
    frns: &[u8],
    fields: &mut Cat048Fields,
    faults: &mut Vec<DecodeError>,
) -> Result<(), DecodeError> {
    for &frn in frns {
        decode_item(frn, cur, fields, faults).map_err(|e| {
            trace!("cat048 FRN {} failed: {}", frn, e);
            e
        })?;
    }
    Ok(())
}

fn decode_item(
    frn: u8,
    cur: &mut BitCursor,
    fields: &mut Cat048Fields,
    faults: &mut Vec<DecodeError>,
) -> Result<(), DecodeError> {
    match frn {
        // I048/010 - data source identifier
        1 => {
            fields.sac = Some(cur.byte()?);
            fields.sic = Some(cur.byte()?);
        }
        // I048/140 - time of day, 1/128 s since midnight
        2 => {
            fields.time_of_day_s = Some(cur.take(24)? as f64 / 128.0);
        }
        // I048/020 - target report descriptor
        3 => target_report_descriptor(cur, fields)?,
        // I048/040 - measured position in polar coordinates
        4 => {
            fields.rho_nm = Some(cur.take(16)? as f64 / 256.0);
            fields.theta_deg = Some(cur.take(16)? as f64 * 360.0 / 65536.0 % 360.0);
        }
        // I048/070 - Mode 3/A code in octal representation
        5 => mode_3a_code(cur, fields)?,
        // I048/090 - flight level, signed quarter-FL
        6 => flight_level(cur, fields)?,
        // I048/220 - aircraft address
        8 => {
            fields.aircraft_address = Some(cur.take(24)? as u32);
        }
        // I048/240 - aircraft identification
        9 => {
            fields.callsign = Some(sixbit_callsign(cur)?);
        }
        // I048/250 - Mode S MB data
        10 => mode_s_mb_data(cur, fields, faults)?,
        // I048/161 - track number, 12 bits
        11 => {
            fields.track_number = Some((cur.take(16)? & 0x0FFF) as u16);
        }
        // I048/200 - calculated track velocity, polar
        13 => {
            fields.calc_groundspeed_kt = Some(cur.take(16)? as f64 * 3600.0 / 16384.0);
            fields.calc_heading_deg = Some(cur.take(16)? as f64 * 360.0 / 65536.0 % 360.0);
        }
        // I048/230 - communications/ACAS capability and flight status
        21 => comms_acas(cur, fields)?,
        // Everything else is consumed at its declared shape
        _ => match uap(frn) {
            Some(spec) => spec.format.skip(cur)?,
            None => {
                return Err(DecodeError::UnknownFrn {
                    category: CAT048,
                    frn,
                })
            }
        },
    }
    Ok(())
}

/// I048/020, first octet bound, extensions consumed.
///
fn target_report_descriptor(
    cur: &mut BitCursor,
    fields: &mut Cat048Fields,
) -> Result<(), DecodeError> {
    fields.typ = Some(cur.take(3)? as u8);
    fields.sim = Some(cur.take(1)? as u8);
    fields.rdp = Some(cur.take(1)? as u8);
    fields.spi = Some(cur.take(1)? as u8);
    fields.rab = Some(cur.take(1)? as u8);

    let mut fx = cur.take(1)?;
    while fx == 1 {
        let octet = cur.byte()?;
        fx = u64::from(octet & 0x01);
    }
    Ok(())
}

fn mode_3a_code(cur: &mut BitCursor, fields: &mut Cat048Fields) -> Result<(), DecodeError> {
    fields.mode3a_v = Some(cur.take(1)? as u8);
    fields.mode3a_g = Some(cur.take(1)? as u8);
    fields.mode3a_l = Some(cur.take(1)? as u8);
    cur.skip(1)?; // spare

    let code = cur.take(12)?;
    fields.mode3a = Some(format!("{:04o}", code));
    Ok(())
}

fn flight_level(cur: &mut BitCursor, fields: &mut Cat048Fields) -> Result<(), DecodeError> {
    fields.fl_v = Some(cur.take(1)? as u8);
    fields.fl_g = Some(cur.take(1)? as u8);
    fields.flight_level = Some(cur.take_signed(14)? as f64 / 4.0);
    Ok(())
}

/// I048/250: REP copies of 7 octets of register content plus the
/// register code octet.
///
fn mode_s_mb_data(
    cur: &mut BitCursor,
    fields: &mut Cat048Fields,
    faults: &mut Vec<DecodeError>,
) -> Result<(), DecodeError> {
    let rep = cur.byte()?;
    for _ in 0..rep {
        let data = cur.bytes(7)?;
        let code = cur.byte()?;
        let reg = bds::decode_register(data, code, faults)?;
        fields.bds.push(reg);
    }
    Ok(())
}

fn comms_acas(cur: &mut BitCursor, fields: &mut Cat048Fields) -> Result<(), DecodeError> {
    let _com = cur.take(3)?;
    let stat = cur.take(3)?;
    let _si = cur.take(1)?;
    cur.skip(1)?; // spare
    cur.skip(8)?; // MSSC/ARC/AIC/B1A/B1B

    fields.flight_status = Some(FlightStatus::from_bits(stat as u8));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fspec;

    fn decode_with_fspec(data: &[u8]) -> (Cat048Fields, Vec<DecodeError>) {
        let mut cur = BitCursor::new(data);
        let fspec = fspec::parse(&mut cur, MAX_FRN).unwrap();
        let mut fields = Cat048Fields::default();
        let mut faults = Vec::new();
        decode_record(&mut cur, &fspec.frns, &mut fields, &mut faults).unwrap();
        (fields, faults)
    }

    #[test]
    fn test_uap_is_ordered() {
        UAP.iter().enumerate().for_each(|(i, spec)| {
            assert_eq!(i + 1, spec.frn as usize);
        });
    }

    #[test]
    fn test_full_record() {
        let data = [
            0xDD, 0xD0, // FSPEC: FRN 1,2,4,5,6 | 8,9,11
            0xA0, 0x01, // I048/010
            0x05, 0xFA, 0xC0, // I048/140
            0x10, 0x00, 0x20, 0x00, // I048/040
            0x09, 0x88, // I048/070
            0x05, 0x78, // I048/090
            0x4C, 0xA1, 0xF5, // I048/220
            0x58, 0xC1, 0xF1, 0xCB, 0x3D, 0x20, // I048/240 "VLG1234"
            0x04, 0xD2, // I048/161
        ];
        let (fields, faults) = decode_with_fspec(&data);

        assert!(faults.is_empty());
        assert_eq!(Some(0xA0), fields.sac);
        assert_eq!(Some(0x01), fields.sic);
        assert_eq!(Some(3061.5), fields.time_of_day_s);
        assert_eq!(Some(16.0), fields.rho_nm);
        assert_eq!(Some(45.0), fields.theta_deg);
        assert_eq!(Some("4610".to_owned()), fields.mode3a);
        assert_eq!(Some(0), fields.mode3a_v);
        assert_eq!(Some(350.0), fields.flight_level);
        assert_eq!(Some(0x4CA1F5), fields.aircraft_address);
        assert_eq!(Some("VLG1234".to_owned()), fields.callsign);
        assert_eq!(Some(1234), fields.track_number);
    }

    #[test]
    fn test_negative_flight_level() {
        // V=0 G=0, raw -40 -> FL -10
        let data = [0x04, 0x3F, 0xD8];
        let (fields, _) = decode_with_fspec(&data);

        assert_eq!(Some(-10.0), fields.flight_level);
        assert_eq!(Some(0), fields.fl_v);
    }

    #[test]
    fn test_descriptor_with_extension() {
        // TYP=2 (SSR), SIM=0, RDP=0, SPI=1, RAB=0, FX=1; extension 0x06 (FX=0)
        let data = [0x20, 0b0100_0101, 0x06];
        let (fields, _) = decode_with_fspec(&data);

        assert_eq!(Some(2), fields.typ);
        assert_eq!(Some(1), fields.spi);
        assert_eq!(Some(0), fields.sim);
    }

    #[test]
    fn test_mb_data_registers() {
        // REP=2: empty BDS 5.0 then BDS 4.0 with MCP altitude
        let data = [
            0x01, 0x20, // FSPEC: FRN 10
            0x02, // REP
            0, 0, 0, 0, 0, 0, 0, 0x50, // empty 5.0
            0xBE, 0x80, 0, 0, 0, 0, 0, 0x40, // 4.0, MCP 32000 ft
        ];
        let (fields, faults) = decode_with_fspec(&data);

        assert!(faults.is_empty());
        assert_eq!(2, fields.bds.len());
        assert_eq!("50", fields.bds[0].code);
        assert_eq!(None, fields.bds[0].ground_speed_kt);
        assert_eq!("40", fields.bds[1].code);
        assert_eq!(Some(32000.0), fields.bds[1].mcp_fcu_alt_ft);
    }

    #[test]
    fn test_comms_acas_status() {
        // FRN 21 needs three FSPEC octets
        let data = [0x01, 0x01, 0x02, 0b0000_1000, 0x00];
        let (fields, _) = decode_with_fspec(&data);

        assert_eq!(
            Some(FlightStatus::AirborneAlert),
            fields.flight_status
        );
    }

    #[test]
    fn test_skipped_items_keep_sync() {
        // FRN 12 (cartesian, skipped) then FRN 13 (velocity, bound)
        let data = [
            0x01, 0b0000_1100, // FSPEC: FRN 12, 13
            0xDE, 0xAD, 0xBE, 0xEF, // I048/042, skipped
            0x40, 0x00, 0x40, 0x00, // I048/200
        ];
        let (fields, _) = decode_with_fspec(&data);

        let gs = fields.calc_groundspeed_kt.unwrap();
        assert!((gs - 3600.0).abs() < 1e-9);
        assert_eq!(Some(90.0), fields.calc_heading_deg);
    }

    #[test]
    fn test_unknown_frn_rejected() {
        let mut cur = BitCursor::new(&[0x00]);
        let mut fields = Cat048Fields::default();
        let mut faults = Vec::new();
        let err = decode_record(&mut cur, &[29], &mut fields, &mut faults).unwrap_err();

        assert_eq!("UNKNOWN_FRN", err.kind());
    }

    #[test]
    fn test_truncated_item_reports() {
        // FRN 4 wants four octets, only two present
        let data = [0b0001_0000, 0x8F, 0xAA];
        let mut cur = BitCursor::new(&data);
        let fspec = fspec::parse(&mut cur, MAX_FRN).unwrap();
        let mut fields = Cat048Fields::default();
        let mut faults = Vec::new();
        let err = decode_record(&mut cur, &fspec.frns, &mut fields, &mut faults).unwrap_err();

        assert_eq!("TRUNCATED", err.kind());
    }
}
