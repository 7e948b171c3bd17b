//! Assembly of decoded category fields into unified records.
//!
//! This is where the raw item values meet the derivations: geographic
//! position from radar geometry for CAT048, QNH-corrected altitude for
//! both categories.  The assembler also keeps the last non-standard
//! barometric pressure setting seen per aircraft, so reports without a
//! BDS 4.0 register still get corrected with the aircraft's previous
//! setting while it stays below the transition altitude.
//!

use std::collections::BTreeMap;

use chrono::NaiveTime;
use tracing::debug;

use radex_formats::UnifiedRecord;

use crate::cat021::{Cat021Fields, CAT021};
use crate::cat048::{Cat048Fields, CAT048};
use crate::error::DecodeError;
use crate::geo::{CoordinateTransformer, NM_TO_METERS};
use crate::pipeline::DecodeOptions;
use crate::qnh::{CorrectedAltitude, QnhCorrector, STANDARD_QNH_HPA};

/// Render seconds-since-midnight as HH:MM:SS.mmm.
///
pub fn format_tod(secs: f64) -> String {
    let total = secs.rem_euclid(86_400.0);
    let mut whole = total.floor() as u32;
    let mut millis = ((total - whole as f64) * 1000.0).round() as u32;
    if millis == 1000 {
        whole += 1;
        millis = 0;
    }

    let t = NaiveTime::from_num_seconds_from_midnight_opt(whole % 86_400, millis * 1_000_000)
        .unwrap_or(NaiveTime::MIN);
    t.format("%H:%M:%S%.3f").to_string()
}

/// Builds one immutable `UnifiedRecord` per decoded record.
///
pub struct RecordAssembler {
    transformer: Option<CoordinateTransformer>,
    corrector: QnhCorrector,
    qnh_override: Option<f64>,
    transition_alt_ft: f64,
    /// Last non-standard barometric pressure setting per target address
    last_qnh: BTreeMap<u32, f64>,
}

impl RecordAssembler {
    pub fn new(options: &DecodeOptions) -> Self {
        RecordAssembler {
            transformer: options.radar_site.as_ref().map(CoordinateTransformer::new),
            corrector: QnhCorrector::new(options.transition_altitude_ft),
            qnh_override: options.qnh,
            transition_alt_ft: options.transition_altitude_ft,
            last_qnh: BTreeMap::new(),
        }
    }

    /// The QNH to correct this report with: an explicit option wins,
    /// otherwise the report's own (or remembered) pressure setting.
    /// Crossing the transition altitude upwards forgets the aircraft.
    ///
    fn local_qnh(&mut self, address: Option<u32>, alt_ft: f64, bp: Option<f64>) -> Option<f64> {
        if let Some(qnh) = self.qnh_override {
            return Some(qnh);
        }
        if alt_ft >= self.transition_alt_ft {
            if let Some(addr) = address {
                self.last_qnh.remove(&addr);
            }
            return None;
        }
        match bp {
            Some(bp) if bp != STANDARD_QNH_HPA => {
                if let Some(addr) = address {
                    self.last_qnh.insert(addr, bp);
                }
                Some(bp)
            }
            _ => address.and_then(|addr| self.last_qnh.get(&addr).copied()),
        }
    }

    fn correct_altitude(
        &mut self,
        flight_level: Option<f64>,
        address: Option<u32>,
        bp: Option<f64>,
    ) -> Option<CorrectedAltitude> {
        let fl = flight_level?;
        let alt_ft = fl * 100.0;
        let qnh = self.local_qnh(address, alt_ft, bp);
        Some(self.corrector.correct(alt_ft, qnh))
    }

    /// CAT048: raw fields, BDS merge, QNH correction and the radar
    /// geometry derivation.
    ///
    pub fn assemble_cat048(
        &mut self,
        f: &Cat048Fields,
        faults: &mut Vec<DecodeError>,
    ) -> UnifiedRecord {
        let mut rec = UnifiedRecord::empty(CAT048);

        rec.sac = f.sac;
        rec.sic = f.sic;
        if let Some(t) = f.time_of_day_s {
            rec.time_sec = Some(t);
            rec.time = Some(format_tod(t));
        }
        rec.typ = f.typ;
        rec.sim = f.sim;
        rec.rdp = f.rdp;
        rec.spi = f.spi;
        rec.rab = f.rab;
        rec.rho = f.rho_nm;
        rec.theta = f.theta_deg;
        rec.mode3a = f.mode3a.clone();
        rec.mode3a_v = f.mode3a_v;
        rec.mode3a_g = f.mode3a_g;
        rec.mode3a_l = f.mode3a_l;
        rec.fl = f.flight_level;
        rec.fl_v = f.fl_v;
        rec.fl_g = f.fl_g;
        rec.ta = f.aircraft_address.map(|a| format!("{:06X}", a));
        rec.ti = f.callsign.clone();
        rec.tn = f.track_number;
        rec.gs_kt = f.calc_groundspeed_kt;
        rec.stat = f.flight_status.map(|s| s.to_string());

        // Merge the MB registers; a later register of the same kind
        // overrides an earlier one.
        let mut codes: Vec<String> = Vec::new();
        for reg in &f.bds {
            if !codes.contains(&reg.code) {
                codes.push(reg.code.clone());
            }
            rec.bp = reg.baro_setting_hpa.or(rec.bp);
            rec.ra = reg.roll_angle_deg.or(rec.ra);
            rec.tta = reg.track_angle_deg.or(rec.tta);
            rec.gs = reg.ground_speed_kt.or(rec.gs);
            rec.tar = reg.track_rate_deg_s.or(rec.tar);
            rec.tas = reg.true_airspeed_kt.or(rec.tas);
            rec.hdg = reg.magnetic_heading_deg.or(rec.hdg);
            rec.ias = reg.indicated_airspeed_kt.or(rec.ias);
            rec.mach = reg.mach.or(rec.mach);
            rec.bar = reg.baro_rate_ft_min.or(rec.bar);
            rec.ivv = reg.inertial_vertical_ft_min.or(rec.ivv);
        }
        if !codes.is_empty() {
            rec.mode_s = Some(codes.join(" "));
        }
        // The magnetic heading wins over the calculated one
        if rec.hdg.is_none() {
            rec.hdg = f.calc_heading_deg;
        }

        let corrected = self.correct_altitude(f.flight_level, f.aircraft_address, rec.bp);
        if let Some(corr) = corrected {
            rec.h_ft = Some(corr.feet);
            rec.h_m = Some(corr.meters);
        }

        // Geographic derivation needs a configured radar site
        match (&self.transformer, f.rho_nm, f.theta_deg) {
            (Some(transformer), Some(rho), Some(theta)) => {
                let height_m = corrected.map(|c| c.meters).unwrap_or(0.0);
                match transformer.polar_to_geodetic(
                    rho * NM_TO_METERS,
                    theta.to_radians(),
                    height_m,
                ) {
                    Ok(g) => {
                        rec.lat = Some(g.lat);
                        rec.lon = Some(g.lon);
                        rec.h_wgs84 = Some(g.height);
                    }
                    Err(e) => faults.push(e),
                }
            }
            (None, Some(_), _) => {
                debug!("no radar site configured, geographic columns left absent");
            }
            _ => (),
        }

        rec
    }

    /// CAT021: the report already carries its position; only the QNH
    /// correction is derived, fed by the RE-field pressure setting.
    ///
    pub fn assemble_cat021(&mut self, f: &Cat021Fields) -> UnifiedRecord {
        let mut rec = UnifiedRecord::empty(CAT021);

        rec.sac = f.sac;
        rec.sic = f.sic;
        rec.atp = f.atp;
        rec.arc = f.arc;
        rec.rc = f.rc;
        rec.rab = f.rab;
        rec.dcr = f.dcr;
        rec.gbs = f.gbs;
        rec.sim = f.sim;
        rec.tst = f.tst;
        rec.tn = f.track_number;
        if let Some(t) = f.time_s {
            rec.time_sec = Some(t);
            rec.time = Some(format_tod(t));
        }
        rec.lat = f.lat_deg;
        rec.lon = f.lon_deg;
        rec.ta = f.target_address.map(|a| format!("{:06X}", a));
        rec.mode3a = f.mode3a.clone();
        rec.fl = f.flight_level;
        rec.gs_kt = f.groundspeed_kt;
        rec.hdg = f.track_angle_deg;
        rec.ti = f.callsign.clone();
        rec.bp = f.bps_hpa;

        if let Some(corr) = self.correct_altitude(f.flight_level, f.target_address, f.bps_hpa) {
            rec.h_ft = Some(corr.feet);
            rec.h_m = Some(corr.meters);
        }

        rec
    }
}

#[cfg(test)]
mod tests {
    use radex_common::BARCELONA;

    use super::*;
    use crate::bds::BdsRegister;

    fn assembler(site: bool) -> RecordAssembler {
        let options = DecodeOptions {
            radar_site: site.then_some(BARCELONA),
            ..Default::default()
        };
        RecordAssembler::new(&options)
    }

    #[test]
    fn test_format_tod() {
        assert_eq!("00:51:01.500", format_tod(3061.5));
        assert_eq!("00:00:00.000", format_tod(0.0));
        assert_eq!("23:59:59.992", format_tod(86399.9921875));
    }

    #[test]
    fn test_cat048_basics() {
        let fields = Cat048Fields {
            sac: Some(20),
            sic: Some(5),
            time_of_day_s: Some(3061.5),
            flight_level: Some(350.0),
            aircraft_address: Some(0x4CA1F5),
            callsign: Some("VLG1234".into()),
            ..Default::default()
        };
        let mut faults = Vec::new();
        let rec = assembler(false).assemble_cat048(&fields, &mut faults);

        assert_eq!(48, rec.cat);
        assert_eq!(Some("00:51:01.500".to_owned()), rec.time);
        assert_eq!(Some("4CA1F5".to_owned()), rec.ta);
        // FL350 is far above transition: pressure altitude unchanged
        assert_eq!(Some(35_000.0), rec.h_ft);
        assert!(faults.is_empty());
    }

    #[test]
    fn test_bds_merge_and_mode_s_column() {
        let fields = Cat048Fields {
            flight_level: Some(30.0),
            aircraft_address: Some(0xABCDEF),
            bds: vec![
                BdsRegister {
                    code: "40".into(),
                    baro_setting_hpa: Some(1003.25),
                    ..Default::default()
                },
                BdsRegister {
                    code: "50".into(),
                    ground_speed_kt: Some(420.0),
                    ..Default::default()
                },
                BdsRegister {
                    code: "60".into(),
                    magnetic_heading_deg: Some(12.5),
                    ..Default::default()
                },
            ],
            calc_heading_deg: Some(99.0),
            ..Default::default()
        };
        let mut faults = Vec::new();
        let rec = assembler(false).assemble_cat048(&fields, &mut faults);

        assert_eq!(Some("40 50 60".to_owned()), rec.mode_s);
        assert_eq!(Some(420.0), rec.gs);
        // BDS 6.0 heading wins over the calculated one
        assert_eq!(Some(12.5), rec.hdg);
        // 3000 ft with QNH 1003.25 -> 2727 ft
        assert!((rec.h_ft.unwrap() - 2727.0).abs() < 1e-9);
        assert!((rec.h_m.unwrap() - 2727.0 * 0.3048).abs() < 1e-9);
    }

    #[test]
    fn test_qnh_persists_per_aircraft() {
        let mut asm = assembler(false);

        // First report carries the setting
        let first = Cat048Fields {
            flight_level: Some(30.0),
            aircraft_address: Some(0x111111),
            bds: vec![BdsRegister {
                code: "40".into(),
                baro_setting_hpa: Some(1003.25),
                ..Default::default()
            }],
            ..Default::default()
        };
        // Second one from the same aircraft does not
        let second = Cat048Fields {
            flight_level: Some(20.0),
            aircraft_address: Some(0x111111),
            ..Default::default()
        };
        // A different aircraft gets no correction
        let other = Cat048Fields {
            flight_level: Some(20.0),
            aircraft_address: Some(0x222222),
            ..Default::default()
        };

        let mut faults = Vec::new();
        asm.assemble_cat048(&first, &mut faults);
        let rec = asm.assemble_cat048(&second, &mut faults);
        assert!((rec.h_ft.unwrap() - 1727.0).abs() < 1e-9);

        let rec = asm.assemble_cat048(&other, &mut faults);
        assert_eq!(Some(2000.0), rec.h_ft);
    }

    #[test]
    fn test_qnh_forgotten_above_transition() {
        let mut asm = assembler(false);
        let mut faults = Vec::new();

        let low = Cat048Fields {
            flight_level: Some(30.0),
            aircraft_address: Some(0x333333),
            bds: vec![BdsRegister {
                code: "40".into(),
                baro_setting_hpa: Some(1000.25),
                ..Default::default()
            }],
            ..Default::default()
        };
        let high = Cat048Fields {
            flight_level: Some(80.0),
            aircraft_address: Some(0x333333),
            ..Default::default()
        };
        let low_again = Cat048Fields {
            flight_level: Some(30.0),
            aircraft_address: Some(0x333333),
            ..Default::default()
        };

        asm.assemble_cat048(&low, &mut faults);
        asm.assemble_cat048(&high, &mut faults);
        let rec = asm.assemble_cat048(&low_again, &mut faults);

        // setting was forgotten at altitude
        assert_eq!(Some(3000.0), rec.h_ft);
    }

    #[test]
    fn test_cat048_geo_derivation() {
        let fields = Cat048Fields {
            rho_nm: Some(20.0),
            theta_deg: Some(90.0),
            flight_level: Some(150.0),
            ..Default::default()
        };
        let mut faults = Vec::new();
        let rec = assembler(true).assemble_cat048(&fields, &mut faults);

        assert!(faults.is_empty());
        let lon = rec.lon.unwrap();
        let lat = rec.lat.unwrap();
        assert!(lon > BARCELONA.lon);
        assert!((lat - BARCELONA.lat).abs() < 0.1);
        // derived height tracks the pressure altitude (no QNH here)
        assert!((rec.h_wgs84.unwrap() - 15_000.0 * 0.3048).abs() < 0.5);
    }

    #[test]
    fn test_cat048_no_site_no_geo() {
        let fields = Cat048Fields {
            rho_nm: Some(20.0),
            theta_deg: Some(90.0),
            ..Default::default()
        };
        let mut faults = Vec::new();
        let rec = assembler(false).assemble_cat048(&fields, &mut faults);

        assert_eq!(None, rec.lat);
        assert_eq!(None, rec.h_wgs84);
    }

    #[test]
    fn test_cat021_mapping() {
        let fields = Cat021Fields {
            sac: Some(0),
            sic: Some(200),
            gbs: Some(0),
            time_s: Some(45_000.25),
            lat_deg: Some(41.4),
            lon_deg: Some(2.3),
            target_address: Some(0x345678),
            flight_level: Some(40.0),
            callsign: Some("RYR81PG".into()),
            bps_hpa: Some(1008.25),
            ..Default::default()
        };
        let rec = assembler(false).assemble_cat021(&fields);

        assert_eq!(21, rec.cat);
        assert_eq!(Some("12:30:00.250".to_owned()), rec.time);
        assert_eq!(Some(41.4), rec.lat);
        assert_eq!(Some("345678".to_owned()), rec.ta);
        // 4000 ft with QNH 1008.25 -> 3863.5 ft
        assert!((rec.h_ft.unwrap() - 3863.5).abs() < 1e-9);
        // the radar-only columns stay absent
        assert_eq!(None, rec.rho);
        assert_eq!(None, rec.theta);
        assert_eq!(None, rec.h_wgs84);
    }
}
