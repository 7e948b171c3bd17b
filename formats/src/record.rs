//! The unified tabular record shared by both decoded categories.
//!
//! One `UnifiedRecord` is one target report, whatever the source
//! category.  Every column except `CAT` is optional: "absent" is a
//! different thing from "present with value zero", since most ASTERIX
//! fields have a valid all-zeroes encoding.  Absent fields render as
//! empty cells in CSV output.
//!

use serde::Serialize;

/// Communications/ACAS flight status (I048/230 STAT).
///
/// Rendered into the `STAT` column through its `Display` text.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum FlightStatus {
    #[strum(serialize = "No alert, no SPI, aircraft airborne")]
    AirborneNoAlert,
    #[strum(serialize = "No alert, no SPI, aircraft on ground")]
    OnGroundNoAlert,
    #[strum(serialize = "Alert, no SPI, aircraft airborne")]
    AirborneAlert,
    #[strum(serialize = "Alert, no SPI, aircraft on ground")]
    OnGroundAlert,
    #[strum(serialize = "Alert, SPI, aircraft airborne or on ground")]
    AlertSpi,
    #[strum(serialize = "No alert, SPI, aircraft airborne or on ground")]
    SpiNoAlert,
    #[strum(serialize = "Not assigned")]
    NotAssigned,
    #[strum(serialize = "Unknown")]
    Unknown,
}

impl FlightStatus {
    /// Map the three STAT bits.
    ///
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => FlightStatus::AirborneNoAlert,
            1 => FlightStatus::OnGroundNoAlert,
            2 => FlightStatus::AirborneAlert,
            3 => FlightStatus::OnGroundAlert,
            4 => FlightStatus::AlertSpi,
            5 => FlightStatus::SpiNoAlert,
            6 => FlightStatus::NotAssigned,
            _ => FlightStatus::Unknown,
        }
    }
}

/// Column names in normative export order.
///
/// CAT048 fills the polar/BDS side of the table, CAT021 the
/// descriptor (ATP..TST) side; the geographic and height columns are
/// shared.  `H_WGS84` is the radar-derived ellipsoidal height in
/// meters, only produced for CAT048.
///
pub const COLUMNS: [&str; 47] = [
    "CAT", "SAC", "SIC", "Time", "Time_sec", "LAT", "LON", "H(m)", "H(ft)", "RHO", "THETA",
    "Mode3/A", "V", "G", "L", "FL", "FL_V", "FL_G", "TA", "TI", "ModeS", "BP", "RA", "TTA", "GS",
    "TAR", "TAS", "HDG", "IAS", "MACH", "BAR", "IVV", "TN", "GS(kt)", "STAT", "TYP", "SIM", "RDP",
    "SPI", "RAB", "H_WGS84", "ATP", "ARC", "RC", "DCR", "GBS", "TST",
];

/// One decoded target report, flattened for filtering and export.
///
/// Serialization order is the column order, so serializing straight
/// into a `csv::Writer` produces the export contract.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UnifiedRecord {
    /// ASTERIX category (21 or 48)
    #[serde(rename = "CAT")]
    pub cat: u8,
    /// System Area Code
    #[serde(rename = "SAC")]
    pub sac: Option<u8>,
    /// System Identification Code
    #[serde(rename = "SIC")]
    pub sic: Option<u8>,
    /// Time of day as HH:MM:SS.mmm
    #[serde(rename = "Time")]
    pub time: Option<String>,
    /// Time of day in seconds since midnight UTC
    #[serde(rename = "Time_sec")]
    pub time_sec: Option<f64>,
    /// Latitude in degrees (decoded for CAT021, derived for CAT048)
    #[serde(rename = "LAT")]
    pub lat: Option<f64>,
    /// Longitude in degrees
    #[serde(rename = "LON")]
    pub lon: Option<f64>,
    /// QNH-corrected altitude in meters
    #[serde(rename = "H(m)")]
    pub h_m: Option<f64>,
    /// QNH-corrected altitude in feet
    #[serde(rename = "H(ft)")]
    pub h_ft: Option<f64>,
    /// Measured slant range in NM
    #[serde(rename = "RHO")]
    pub rho: Option<f64>,
    /// Measured azimuth in degrees clockwise from true north
    #[serde(rename = "THETA")]
    pub theta: Option<f64>,
    /// Mode 3/A code, four octal digits
    #[serde(rename = "Mode3/A")]
    pub mode3a: Option<String>,
    /// Mode 3/A not validated flag
    #[serde(rename = "V")]
    pub mode3a_v: Option<u8>,
    /// Mode 3/A garbled flag
    #[serde(rename = "G")]
    pub mode3a_g: Option<u8>,
    /// Mode 3/A smoothed flag
    #[serde(rename = "L")]
    pub mode3a_l: Option<u8>,
    /// Flight level in units of 100 ft (quarter-FL resolution)
    #[serde(rename = "FL")]
    pub fl: Option<f64>,
    /// Flight level not validated flag
    #[serde(rename = "FL_V")]
    pub fl_v: Option<u8>,
    /// Flight level garbled flag
    #[serde(rename = "FL_G")]
    pub fl_g: Option<u8>,
    /// 24-bit ICAO target address, 6 hex digits
    #[serde(rename = "TA")]
    pub ta: Option<String>,
    /// Target identification (callsign), up to 8 characters
    #[serde(rename = "TI")]
    pub ti: Option<String>,
    /// Mode S BDS registers seen, space-separated codes ("40 50 60")
    #[serde(rename = "ModeS")]
    pub mode_s: Option<String>,
    /// Barometric pressure setting in hPa (BDS 4.0 / CAT021 RE)
    #[serde(rename = "BP")]
    pub bp: Option<f64>,
    /// Roll angle in degrees (BDS 5.0)
    #[serde(rename = "RA")]
    pub ra: Option<f64>,
    /// True track angle in degrees (BDS 5.0)
    #[serde(rename = "TTA")]
    pub tta: Option<f64>,
    /// Ground speed in kt (BDS 5.0)
    #[serde(rename = "GS")]
    pub gs: Option<f64>,
    /// Track angle rate in degrees/s (BDS 5.0)
    #[serde(rename = "TAR")]
    pub tar: Option<f64>,
    /// True airspeed in kt (BDS 5.0)
    #[serde(rename = "TAS")]
    pub tas: Option<f64>,
    /// Heading in degrees (BDS 6.0 magnetic, else calculated)
    #[serde(rename = "HDG")]
    pub hdg: Option<f64>,
    /// Indicated airspeed in kt (BDS 6.0)
    #[serde(rename = "IAS")]
    pub ias: Option<f64>,
    /// Mach number (BDS 6.0)
    #[serde(rename = "MACH")]
    pub mach: Option<f64>,
    /// Barometric altitude rate in ft/min (BDS 6.0)
    #[serde(rename = "BAR")]
    pub bar: Option<f64>,
    /// Inertial vertical velocity in ft/min (BDS 6.0)
    #[serde(rename = "IVV")]
    pub ivv: Option<f64>,
    /// Local track number
    #[serde(rename = "TN")]
    pub tn: Option<u16>,
    /// Calculated ground speed in kt
    #[serde(rename = "GS(kt)")]
    pub gs_kt: Option<f64>,
    /// Flight status description (I048/230)
    #[serde(rename = "STAT")]
    pub stat: Option<String>,
    /// Detection type (I048/020)
    #[serde(rename = "TYP")]
    pub typ: Option<u8>,
    /// Simulated target flag
    #[serde(rename = "SIM")]
    pub sim: Option<u8>,
    /// RDP chain (I048/020)
    #[serde(rename = "RDP")]
    pub rdp: Option<u8>,
    /// Special Position Identification flag
    #[serde(rename = "SPI")]
    pub spi: Option<u8>,
    /// Report from field monitor flag
    #[serde(rename = "RAB")]
    pub rab: Option<u8>,
    /// Radar-derived WGS-84 height in meters (CAT048 only)
    #[serde(rename = "H_WGS84")]
    pub h_wgs84: Option<f64>,
    /// Address type (I021/040)
    #[serde(rename = "ATP")]
    pub atp: Option<u8>,
    /// Altitude reporting capability (I021/040)
    #[serde(rename = "ARC")]
    pub arc: Option<u8>,
    /// Range check flag (I021/040)
    #[serde(rename = "RC")]
    pub rc: Option<u8>,
    /// Differential correction flag (I021/040)
    #[serde(rename = "DCR")]
    pub dcr: Option<u8>,
    /// Ground bit set flag (I021/040)
    #[serde(rename = "GBS")]
    pub gbs: Option<u8>,
    /// Test target flag (I021/040)
    #[serde(rename = "TST")]
    pub tst: Option<u8>,
}

impl UnifiedRecord {
    /// A record carrying only its category, every other field absent.
    ///
    pub fn empty(cat: u8) -> Self {
        UnifiedRecord {
            cat,
            ..Default::default()
        }
    }

    /// Number of populated fields, the category included.
    ///
    pub fn populated(&self) -> usize {
        // Count the empty cells in the CSV rendering and subtract.
        //
        let absent = [
            self.sac.is_none(),
            self.sic.is_none(),
            self.time.is_none(),
            self.time_sec.is_none(),
            self.lat.is_none(),
            self.lon.is_none(),
            self.h_m.is_none(),
            self.h_ft.is_none(),
            self.rho.is_none(),
            self.theta.is_none(),
            self.mode3a.is_none(),
            self.mode3a_v.is_none(),
            self.mode3a_g.is_none(),
            self.mode3a_l.is_none(),
            self.fl.is_none(),
            self.fl_v.is_none(),
            self.fl_g.is_none(),
            self.ta.is_none(),
            self.ti.is_none(),
            self.mode_s.is_none(),
            self.bp.is_none(),
            self.ra.is_none(),
            self.tta.is_none(),
            self.gs.is_none(),
            self.tar.is_none(),
            self.tas.is_none(),
            self.hdg.is_none(),
            self.ias.is_none(),
            self.mach.is_none(),
            self.bar.is_none(),
            self.ivv.is_none(),
            self.tn.is_none(),
            self.gs_kt.is_none(),
            self.stat.is_none(),
            self.typ.is_none(),
            self.sim.is_none(),
            self.rdp.is_none(),
            self.spi.is_none(),
            self.rab.is_none(),
            self.h_wgs84.is_none(),
            self.atp.is_none(),
            self.arc.is_none(),
            self.rc.is_none(),
            self.dcr.is_none(),
            self.gbs.is_none(),
            self.tst.is_none(),
        ];
        COLUMNS.len() - absent.iter().filter(|a| **a).count()
    }
}
