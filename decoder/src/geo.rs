//! Radar polar observations to WGS-84 geographic coordinates.
//!
//! The chain is the classical one: solve the elevation angle implied by
//! the reported altitude from the Earth-centred triangle, build the
//! target's East-North-Up offset at the radar, translate to ECEF and
//! invert back to geodetic coordinates.  The geodetic inversion is
//! iterative and bounded; a point that keeps moving after the iteration
//! cap is a `COORD_CONVERGENCE` error.
//!

use std::f64::consts::TAU;

use radex_common::RadarSite;

use crate::error::DecodeError;

/// WGS-84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 semi-minor axis in meters.
pub const WGS84_B: f64 = 6_356_752.3142;
/// WGS-84 first eccentricity squared.
pub const WGS84_E2: f64 = 0.006_694_379_990_13;

pub const NM_TO_METERS: f64 = 1852.0;
pub const FEET_TO_METERS: f64 = 0.3048;

const ALMOST_ZERO: f64 = 1e-10;
/// Convergence tolerance for the geodetic inversion, radians.
const CONVERGENCE_RAD: f64 = 1e-9;
const MAX_ITERATIONS: usize = 10;

/// WGS-84 geodetic coordinates, degrees and meters.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geodetic {
    pub lat: f64,
    pub lon: f64,
    pub height: f64,
}

/// Earth-centred earth-fixed cartesian coordinates, meters.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ecef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Prime vertical radius of curvature at a latitude (radians).
///
fn prime_vertical(lat_rad: f64) -> f64 {
    WGS84_A / (1.0 - WGS84_E2 * lat_rad.sin().powi(2)).sqrt()
}

/// Geodetic to ECEF.
///
pub fn geodetic_to_ecef(g: &Geodetic) -> Ecef {
    let lat = g.lat.to_radians();
    let lon = g.lon.to_radians();
    let nu = prime_vertical(lat);

    Ecef {
        x: (nu + g.height) * lat.cos() * lon.cos(),
        y: (nu + g.height) * lat.cos() * lon.sin(),
        z: (nu * (1.0 - WGS84_E2) + g.height) * lat.sin(),
    }
}

/// ECEF to geodetic, Bowring start then bounded refinement.
///
pub fn ecef_to_geodetic(e: &Ecef) -> Result<Geodetic, DecodeError> {
    let d_xy = e.x.hypot(e.y);

    // Near the rotation axis the longitude is arbitrary
    if d_xy < ALMOST_ZERO {
        let lat = if e.z >= 0.0 { 90.0 } else { -90.0 };
        return Ok(Geodetic {
            lat,
            lon: 0.0,
            height: e.z.abs() - WGS84_B,
        });
    }

    // Bowring's parametric start gets within micro-radians for
    // terrestrial points
    let ep2 = WGS84_E2 / (1.0 - WGS84_E2);
    let u = (e.z * WGS84_A).atan2(d_xy * WGS84_B);
    let mut lat = (e.z + ep2 * WGS84_B * u.sin().powi(3))
        .atan2(d_xy - WGS84_E2 * WGS84_A * u.cos().powi(3));

    let mut nu = prime_vertical(lat);
    let mut height = d_xy / lat.cos() - nu;

    let mut converged = false;
    for _ in 0..MAX_ITERATIONS {
        let prev = lat;
        lat = (e.z * (1.0 + height / nu))
            .atan2(d_xy * ((1.0 - WGS84_E2) + height / nu));
        nu = prime_vertical(lat);
        height = d_xy / lat.cos() - nu;

        if (lat - prev).abs() <= CONVERGENCE_RAD {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(DecodeError::CoordConvergence(MAX_ITERATIONS));
    }

    Ok(Geodetic {
        lat: lat.to_degrees(),
        lon: e.y.atan2(e.x).to_degrees(),
        height,
    })
}

/// Polar-to-geographic converter anchored at one radar site.
///
/// The East-North-Up basis and the site's ECEF position are computed
/// once at construction.
///
#[derive(Clone, Debug)]
pub struct CoordinateTransformer {
    site: Geodetic,
    site_ecef: Ecef,
    east: [f64; 3],
    north: [f64; 3],
    up: [f64; 3],
    /// Geocentric radius at the site, meters
    earth_radius: f64,
}

impl CoordinateTransformer {
    pub fn new(site: &RadarSite) -> Self {
        let site = Geodetic {
            lat: site.lat,
            lon: site.lon,
            height: site.height,
        };
        let lat = site.lat.to_radians();
        let lon = site.lon.to_radians();
        let (sl, cl) = lat.sin_cos();
        let (sn, cn) = lon.sin_cos();

        let surface = geodetic_to_ecef(&Geodetic { height: 0.0, ..site });
        let radius = (surface.x.powi(2) + surface.y.powi(2) + surface.z.powi(2)).sqrt();

        CoordinateTransformer {
            site,
            site_ecef: geodetic_to_ecef(&site),
            east: [-sn, cn, 0.0],
            north: [-sl * cn, -sl * sn, cl],
            up: [cl * cn, cl * sn, sl],
            earth_radius: radius,
        }
    }

    pub fn site(&self) -> Geodetic {
        self.site
    }

    /// Elevation angle under which a target at `height_m` appears at
    /// slant range `rho_m`, from the Earth-centred triangle.
    ///
    pub fn elevation_for_height(&self, rho_m: f64, height_m: f64) -> f64 {
        let rs = self.earth_radius + self.site.height;
        let rt = self.earth_radius + height_m;

        let sin_el = (rt.powi(2) - rs.powi(2) - rho_m.powi(2)) / (2.0 * rs * rho_m);
        sin_el.clamp(-1.0, 1.0).asin()
    }

    /// Place a target at slant range / azimuth / elevation and invert
    /// to geodetic coordinates.
    ///
    fn project(&self, rho_m: f64, theta_rad: f64, el_rad: f64) -> Result<Geodetic, DecodeError> {
        let e = rho_m * el_rad.cos() * theta_rad.sin();
        let n = rho_m * el_rad.cos() * theta_rad.cos();
        let u = rho_m * el_rad.sin();

        let ecef = Ecef {
            x: self.site_ecef.x + e * self.east[0] + n * self.north[0] + u * self.up[0],
            y: self.site_ecef.y + e * self.east[1] + n * self.north[1] + u * self.up[1],
            z: self.site_ecef.z + e * self.east[2] + n * self.north[2] + u * self.up[2],
        };
        ecef_to_geodetic(&ecef)
    }

    /// Complete transformation chain for a radar measurement: slant
    /// range in meters, azimuth in radians clockwise from true north,
    /// reported geometric altitude in meters.
    ///
    /// A zero slant range is the radar itself.
    ///
    pub fn polar_to_geodetic(
        &self,
        rho_m: f64,
        theta_rad: f64,
        height_m: f64,
    ) -> Result<Geodetic, DecodeError> {
        if rho_m < ALMOST_ZERO {
            return Ok(self.site);
        }
        let theta = theta_rad.rem_euclid(TAU);

        let mut el = self.elevation_for_height(rho_m, height_m);
        let mut out = self.project(rho_m, theta, el)?;

        // The spherical triangle leaves a small residual against the
        // ellipsoid; absorb it with a couple of Newton steps on the
        // elevation.
        for _ in 0..3 {
            let residual = height_m - out.height;
            if residual.abs() < 0.01 {
                break;
            }
            el += residual / (rho_m * el.cos()).max(1.0);
            out = self.project(rho_m, theta, el)?;
        }
        Ok(out)
    }

    /// Inverse chain: geodetic position back to slant range (meters)
    /// and azimuth (radians in [0, 2π)).
    ///
    pub fn geodetic_to_polar(&self, g: &Geodetic) -> (f64, f64) {
        let t = geodetic_to_ecef(g);
        let d = [
            t.x - self.site_ecef.x,
            t.y - self.site_ecef.y,
            t.z - self.site_ecef.z,
        ];
        let dot = |a: &[f64; 3]| a[0] * d[0] + a[1] * d[1] + a[2] * d[2];

        let e = dot(&self.east);
        let n = dot(&self.north);
        let u = dot(&self.up);

        let rho = (e.powi(2) + n.powi(2) + u.powi(2)).sqrt();
        let theta = e.atan2(n).rem_euclid(TAU);
        (rho, theta)
    }
}
