//! Radar installation location module
//!
//! A radar site is described by its WGS-84 geodetic position; the height
//! combines terrain elevation and antenna height above ground.
//!

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

/// Position of a radar installation on the WGS-84 ellipsoid.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct RadarSite {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Height in meters (terrain elevation + antenna height)
    pub height: f64,
}

/// Barcelona radar (2.007 m terrain + 25.25 m antenna).
///
pub const BARCELONA: RadarSite = RadarSite {
    lat: 41.300702333,
    lon: 2.102058194,
    height: 27.257,
};

impl Default for RadarSite {
    fn default() -> Self {
        BARCELONA
    }
}

impl RadarSite {
    /// Validating constructor.
    ///
    pub fn new(lat: f64, lon: f64, height: f64) -> Result<Self> {
        if !(-90. ..=90.).contains(&lat) {
            return Err(eyre!("latitude {} out of range", lat));
        }
        if !(-180. ..=180.).contains(&lon) {
            return Err(eyre!("longitude {} out of range", lon));
        }
        Ok(RadarSite { lat, lon, height })
    }
}
