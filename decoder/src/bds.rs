//! Mode S Comm-B register decoding for I048/250.
//!
//! Each MB item is 7 octets of register content plus one octet naming
//! the register (high nibble BDS1, low nibble BDS2).  Registers 4.0,
//! 5.0 and 6.0 carry the vertical-intention, track/turn and
//! heading/speed reports; every field is guarded by a status bit and a
//! status of 0 means the field is simply not there.  Other registers
//! are recorded by code and skipped.
//!

use crate::bits::BitCursor;
use crate::error::DecodeError;

/// One decoded MB register.
///
/// Only the fields whose status bit was set (and whose value survived
/// range validation) are populated.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BdsRegister {
    /// Two-digit register code, e.g. "40"
    pub code: String,
    // BDS 4.0 - selected vertical intention
    pub mcp_fcu_alt_ft: Option<f64>,
    pub fms_alt_ft: Option<f64>,
    pub baro_setting_hpa: Option<f64>,
    pub target_alt_source: Option<u8>,
    // BDS 5.0 - track and turn report
    pub roll_angle_deg: Option<f64>,
    pub track_angle_deg: Option<f64>,
    pub ground_speed_kt: Option<f64>,
    pub track_rate_deg_s: Option<f64>,
    pub true_airspeed_kt: Option<f64>,
    // BDS 6.0 - heading and speed report
    pub magnetic_heading_deg: Option<f64>,
    pub indicated_airspeed_kt: Option<f64>,
    pub mach: Option<f64>,
    pub baro_rate_ft_min: Option<f64>,
    pub inertial_vertical_ft_min: Option<f64>,
}

/// Keep a value only when it sits inside its defined range; a stray
/// value is reported and the field suppressed, the rest of the
/// register still decodes.
///
fn checked(
    value: f64,
    lo: f64,
    hi: f64,
    register: &'static str,
    field: &'static str,
    faults: &mut Vec<DecodeError>,
) -> Option<f64> {
    if (lo..=hi).contains(&value) {
        Some(value)
    } else {
        faults.push(DecodeError::BdsFieldOutOfRange {
            register,
            field,
            value,
        });
        None
    }
}

/// Decode one 7-octet register against its declared code.
///
/// Registers other than 4.0/5.0/6.0 come back with only their code
/// set.
///
pub fn decode_register(
    data: &[u8],
    code: u8,
    faults: &mut Vec<DecodeError>,
) -> Result<BdsRegister, DecodeError> {
    debug_assert_eq!(7, data.len());
    let bds1 = (code >> 4) & 0x0F;
    let bds2 = code & 0x0F;

    let mut reg = BdsRegister {
        code: format!("{:X}{:X}", bds1, bds2),
        ..Default::default()
    };

    let mut cur = BitCursor::new(data);
    match (bds1, bds2) {
        (4, 0) => decode_bds40(&mut cur, &mut reg)?,
        (5, 0) => decode_bds50(&mut cur, &mut reg, faults)?,
        (6, 0) => decode_bds60(&mut cur, &mut reg, faults)?,
        _ => (),
    }
    Ok(reg)
}

/// BDS 4.0 - selected vertical intention.
///
fn decode_bds40(cur: &mut BitCursor, reg: &mut BdsRegister) -> Result<(), DecodeError> {
    // MCP/FCU selected altitude, LSB 16 ft
    let status = cur.take(1)?;
    let raw = cur.take(12)?;
    if status == 1 {
        reg.mcp_fcu_alt_ft = Some(raw as f64 * 16.0);
    }

    // FMS selected altitude, LSB 16 ft
    let status = cur.take(1)?;
    let raw = cur.take(12)?;
    if status == 1 {
        reg.fms_alt_ft = Some(raw as f64 * 16.0);
    }

    // Barometric pressure setting, LSB 0.1 hPa offset by 800
    let status = cur.take(1)?;
    let raw = cur.take(12)?;
    if status == 1 {
        reg.baro_setting_hpa = Some(raw as f64 * 0.1 + 800.0);
    }

    // Reserved bits 17..6, then the target altitude source
    cur.skip(12)?;
    let status = cur.take(1)?;
    let source = cur.take(2)?;
    if status == 1 {
        reg.target_alt_source = Some(source as u8);
    }
    Ok(())
}

/// BDS 5.0 - track and turn report.
///
fn decode_bds50(
    cur: &mut BitCursor,
    reg: &mut BdsRegister,
    faults: &mut Vec<DecodeError>,
) -> Result<(), DecodeError> {
    // Roll angle, signed, LSB 45/256 degree
    let status = cur.take(1)?;
    let raw = cur.take_signed(10)?;
    if status == 1 {
        let roll = raw as f64 * 45.0 / 256.0;
        reg.roll_angle_deg = checked(roll, -90.0, 90.0, "5.0", "roll angle", faults);
    }

    // True track angle, LSB 90/512 degree
    let status = cur.take(1)?;
    let raw = cur.take(10)?;
    if status == 1 {
        let track = raw as f64 * 90.0 / 512.0;
        reg.track_angle_deg = checked(track, 0.0, 360.0, "5.0", "track angle", faults);
    }

    // Ground speed, LSB 2 kt
    let status = cur.take(1)?;
    let raw = cur.take(10)?;
    if status == 1 {
        let gs = raw as f64 * 2.0;
        reg.ground_speed_kt = checked(gs, 0.0, 2046.0, "5.0", "ground speed", faults);
    }

    // Track angle rate, signed, LSB 8/256 degree/s
    let status = cur.take(1)?;
    let raw = cur.take_signed(9)?;
    if status == 1 {
        let rate = raw as f64 * 8.0 / 256.0;
        reg.track_rate_deg_s = checked(rate, -16.0, 16.0, "5.0", "track angle rate", faults);
    }

    // True airspeed, LSB 2 kt
    let status = cur.take(1)?;
    let raw = cur.take(10)?;
    if status == 1 {
        let tas = raw as f64 * 2.0;
        reg.true_airspeed_kt = checked(tas, 0.0, 2046.0, "5.0", "true airspeed", faults);
    }
    Ok(())
}

/// BDS 6.0 - heading and speed report.
///
fn decode_bds60(
    cur: &mut BitCursor,
    reg: &mut BdsRegister,
    faults: &mut Vec<DecodeError>,
) -> Result<(), DecodeError> {
    // Magnetic heading, signed, LSB 90/512 degree
    let status = cur.take(1)?;
    let raw = cur.take_signed(10)?;
    if status == 1 {
        let hdg = raw as f64 * 90.0 / 512.0;
        reg.magnetic_heading_deg = checked(hdg, -90.0, 90.0, "6.0", "magnetic heading", faults);
    }

    // Indicated airspeed, LSB 1 kt
    let status = cur.take(1)?;
    let raw = cur.take(10)?;
    if status == 1 {
        reg.indicated_airspeed_kt = checked(raw as f64, 0.0, 1023.0, "6.0", "IAS", faults);
    }

    // Mach, LSB 0.008
    let status = cur.take(1)?;
    let raw = cur.take(10)?;
    if status == 1 {
        reg.mach = checked(raw as f64 * 0.008, 0.0, 8.184, "6.0", "Mach", faults);
    }

    // Barometric altitude rate, signed, LSB 32 ft/min
    let status = cur.take(1)?;
    let raw = cur.take_signed(9)?;
    if status == 1 {
        let rate = raw as f64 * 32.0;
        reg.baro_rate_ft_min = checked(rate, -8192.0, 8192.0, "6.0", "baro rate", faults);
    }

    // Inertial vertical velocity, signed, LSB 32 ft/min
    let status = cur.take(1)?;
    let raw = cur.take_signed(10)?;
    if status == 1 {
        let ivv = raw as f64 * 32.0;
        reg.inertial_vertical_ft_min = checked(ivv, -16384.0, 16384.0, "6.0", "IVV", faults);
    }
    Ok(())
}
