//! Sun Position Module
//!
//! Maps an instant and an observer location to a point on a sphere of fixed
//! radius around the array. Altitude and azimuth come from an [`Ephemeris`]:
//! a closed-form low-precision model by default, or the NREL SPA
//! (Solar Position Algorithm) for high-precision work.
//!
//! Azimuth follows the south-based convention (0 = south, positive toward
//! west), so that the Cartesian projection puts the sun at +z at noon in the
//! northern hemisphere.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use solar_positioning::{
    Horizon, spa,
    time::DeltaT,
    types::{RefractionCorrection, SunriseResult},
};
use std::f64::consts::PI;

use crate::error::{Result, TwinError};

// ===================== CONSTANTS =====================

/// Distance of the rendered sun from the origin, in scene units.
pub const SUN_DISTANCE: f64 = 300.0;

const DAY_MS: f64 = 1000.0 * 60.0 * 60.0 * 24.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;

/// Obliquity of the Earth's axis
const OBLIQUITY: f64 = 23.4397 * PI / 180.0;

// ===================== TYPES =====================

/// Horizontal coordinates of the sun, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Horizontal {
    /// Elevation above the horizon
    pub altitude: f64,
    /// Bearing measured from south, positive toward west
    pub azimuth: f64,
}

/// Cartesian sun position plus the angles it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
}

impl SunPosition {
    pub fn from_horizontal(h: Horizontal, radius: f64) -> Self {
        let (sin_alt, cos_alt) = h.altitude.sin_cos();
        let (sin_az, cos_az) = h.azimuth.sin_cos();
        Self {
            x: radius * cos_alt * sin_az,
            y: radius * sin_alt,
            z: radius * cos_alt * cos_az,
            altitude_deg: h.altitude.to_degrees(),
            azimuth_deg: h.azimuth.to_degrees(),
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn distance(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// The renderer switches to night-time drawing when this is true.
    pub fn is_below_horizon(&self) -> bool {
        self.y < 0.0
    }
}

// ===================== EPHEMERIS =====================

/// Source of solar altitude/azimuth for an instant and location.
pub trait Ephemeris: Send + Sync {
    fn name(&self) -> &'static str;

    fn horizontal(&self, t: DateTime<Tz>, lat: f64, lon: f64) -> Result<Horizontal>;
}

/// Closed-form low-precision solar model (mean anomaly, equation of centre,
/// sidereal time). Accurate to a fraction of a degree and defined for every
/// finite input, including out-of-range coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SunCalcEphemeris;

impl SunCalcEphemeris {
    pub fn compute(&self, t: DateTime<Tz>, lat: f64, lon: f64) -> Horizontal {
        let lw = -lon.to_radians();
        let phi = lat.to_radians();
        let d = days_since_j2000(t);

        let m = (357.5291 + 0.985_600_28 * d).to_radians();
        let l = ecliptic_longitude(m);
        let dec = (OBLIQUITY.sin() * l.sin()).asin();
        let ra = (l.sin() * OBLIQUITY.cos()).atan2(l.cos());

        let sidereal = (280.16 + 360.985_623_5 * d).to_radians() - lw;
        let h = sidereal - ra;

        Horizontal {
            azimuth: h.sin().atan2(h.cos() * phi.sin() - dec.tan() * phi.cos()),
            altitude: (phi.sin() * dec.sin() + phi.cos() * dec.cos() * h.cos()).clamp(-1.0, 1.0).asin(),
        }
    }
}

impl Ephemeris for SunCalcEphemeris {
    fn name(&self) -> &'static str {
        "suncalc"
    }

    fn horizontal(&self, t: DateTime<Tz>, lat: f64, lon: f64) -> Result<Horizontal> {
        Ok(self.compute(t, lat, lon))
    }
}

fn days_since_j2000(t: DateTime<Tz>) -> f64 {
    t.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970 - J2000
}

fn ecliptic_longitude(m: f64) -> f64 {
    let centre = (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin()).to_radians();
    let perihelion = 102.9372_f64.to_radians();
    m + centre + perihelion + PI
}

/// NREL SPA via `solar-positioning`, observer at sea level.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaEphemeris {
    /// Apply standard atmospheric refraction to the elevation
    pub refraction: bool,
}

impl Ephemeris for SpaEphemeris {
    fn name(&self) -> &'static str {
        "spa"
    }

    fn horizontal(&self, t: DateTime<Tz>, lat: f64, lon: f64) -> Result<Horizontal> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(TwinError::Ephemeris(format!("coordinates out of range: {}, {}", lat, lon)));
        }
        let delta_t = DeltaT::estimate_from_date(t.year(), t.month())
            .map_err(|e| TwinError::Ephemeris(e.to_string()))?;
        let refr = if self.refraction { Some(RefractionCorrection::standard()) } else { None };
        let pos = spa::solar_position(t, lat, lon, 0.0, delta_t, refr)
            .map_err(|e| TwinError::Ephemeris(e.to_string()))?;

        // SPA azimuth is north-based and clockwise
        Ok(Horizontal {
            altitude: pos.elevation_angle().to_radians(),
            azimuth: (pos.azimuth() - 180.0).to_radians(),
        })
    }
}

/// Selectable ephemeris backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EphemerisModel {
    #[default]
    SunCalc,
    Spa,
}

impl EphemerisModel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "suncalc" => Some(Self::SunCalc),
            "spa" => Some(Self::Spa),
            _ => None,
        }
    }

    pub fn build(self) -> Box<dyn Ephemeris> {
        match self {
            Self::SunCalc => Box::new(SunCalcEphemeris),
            Self::Spa => Box::new(SpaEphemeris { refraction: true }),
        }
    }
}

// ===================== CALCULATOR =====================

/// Sun position calculator with a fixed projection radius.
///
/// `position` is total: if the configured ephemeris rejects its input the
/// closed-form model is used instead.
pub struct SunCalculator {
    ephemeris: Box<dyn Ephemeris>,
    radius: f64,
}

impl Default for SunCalculator {
    fn default() -> Self {
        Self::new(EphemerisModel::SunCalc)
    }
}

impl SunCalculator {
    pub fn new(model: EphemerisModel) -> Self {
        Self { ephemeris: model.build(), radius: SUN_DISTANCE }
    }

    pub fn with_ephemeris(ephemeris: Box<dyn Ephemeris>) -> Self {
        Self { ephemeris, radius: SUN_DISTANCE }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn model_name(&self) -> &'static str {
        self.ephemeris.name()
    }

    pub fn position(&self, t: DateTime<Tz>, lat: f64, lon: f64) -> SunPosition {
        let lat = if lat.is_finite() { lat } else { 0.0 };
        let lon = if lon.is_finite() { lon } else { 0.0 };
        let h = match self.ephemeris.horizontal(t, lat, lon) {
            Ok(h) => h,
            Err(e) => {
                log::warn!(
                    "{} ephemeris failed for lat {} lon {}: {}; using closed-form model",
                    self.ephemeris.name(),
                    lat,
                    lon,
                    e
                );
                SunCalcEphemeris.compute(t, lat, lon)
            }
        };
        SunPosition::from_horizontal(h, self.radius)
    }
}

// ===================== SOLAR NOON =====================

/// Local solar noon (transit) for the calendar day of `date`.
///
/// Uses the SPA transit; outside SPA's domain it falls back to the mean-time
/// estimate `12:00 UTC - lon/15 h`.
pub fn solar_noon(date: DateTime<Tz>, lat: f64, lon: f64) -> DateTime<Tz> {
    let transit = DeltaT::estimate_from_date(date.year(), date.month())
        .ok()
        .and_then(|delta_t| {
            spa::sunrise_sunset_for_horizon(date, lat, lon, delta_t, Horizon::SunriseSunset).ok()
        })
        .map(|res| match res {
            SunriseResult::RegularDay { transit, .. } => transit,
            SunriseResult::AllDay { transit } => transit,
            SunriseResult::AllNight { transit } => transit,
        });

    transit.unwrap_or_else(|| {
        let tz = date.timezone();
        let midnight = Utc.from_utc_datetime(&date.date_naive().and_time(chrono::NaiveTime::MIN));
        let offset_s = ((12.0 - lon / 15.0) * 3600.0).round() as i64;
        (midnight + Duration::seconds(offset_s)).with_timezone(&tz)
    })
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    const LAT: f64 = 15.23;
    const LON: f64 = 73.52;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_suncalc_reference_value() {
        // Reference point published with the closed-form algorithm
        let t = UTC.with_ymd_and_hms(2013, 3, 5, 0, 0, 0).unwrap();
        let h = SunCalcEphemeris.compute(t, 50.5, 30.5);
        assert!(approx(h.azimuth, -2.5003175907168385, 1e-7), "azimuth {}", h.azimuth);
        assert!(approx(h.altitude, -0.7000406838781611, 1e-7), "altitude {}", h.altitude);
    }

    #[test]
    fn test_distance_constant_for_any_input() {
        let calc = SunCalculator::default();
        let lats = [-90.0, -45.0, 0.0, LAT, 89.9, 123.0, -400.0];
        let lons = [-180.0, 0.0, LON, 179.0, 720.0];

        let start = UTC.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for day in [0, 79, 171, 265, 354] {
            for hour in [0, 6, 12, 18] {
                let t = start + Duration::days(day) + Duration::hours(hour);
                for &lat in &lats {
                    for &lon in &lons {
                        let p = calc.position(t, lat, lon);
                        assert!(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
                        assert!(
                            approx(p.distance(), SUN_DISTANCE, 1e-9),
                            "distance {} at lat {} lon {}",
                            p.distance(),
                            lat,
                            lon
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_noon_above_midnight_below() {
        let calc = SunCalculator::default();
        for month in 1..=12 {
            let date = UTC.with_ymd_and_hms(2024, month, 15, 0, 0, 0).unwrap();
            let noon = solar_noon(date, LAT, LON);
            let midnight = noon + Duration::hours(12);

            let at_noon = calc.position(noon, LAT, LON);
            let at_midnight = calc.position(midnight, LAT, LON);

            assert!(at_noon.y > 0.0, "noon y {} in month {}", at_noon.y, month);
            assert!(!at_noon.is_below_horizon());
            assert!(at_midnight.y < 0.0, "midnight y {} in month {}", at_midnight.y, month);
            assert!(at_midnight.is_below_horizon());
        }
    }

    #[test]
    fn test_solar_noon_near_longitude_estimate() {
        let date = UTC.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let noon = solar_noon(date, LAT, LON);
        // 12:00 - 73.52/15 h = 07:05:50 UTC, equation of time is under 17 min
        let estimate = UTC.with_ymd_and_hms(2024, 3, 20, 7, 5, 50).unwrap();
        assert!((noon - estimate).num_minutes().abs() <= 17, "noon {}", noon);
    }

    #[test]
    fn test_spa_agrees_with_closed_form() {
        let t = UTC.with_ymd_and_hms(2024, 6, 21, 5, 0, 0).unwrap();
        let fast = SunCalcEphemeris.compute(t, LAT, LON);
        let precise = SpaEphemeris { refraction: false }.horizontal(t, LAT, LON).unwrap();

        assert!(approx(fast.altitude.to_degrees(), precise.altitude.to_degrees(), 1.0));
        assert!(approx(fast.azimuth.to_degrees(), precise.azimuth.to_degrees(), 1.0));
    }

    #[test]
    fn test_spa_out_of_range_falls_back() {
        let calc = SunCalculator::new(EphemerisModel::Spa);
        let t = UTC.with_ymd_and_hms(2024, 6, 21, 5, 0, 0).unwrap();
        let p = calc.position(t, 123.0, LON);
        let expected = SunPosition::from_horizontal(SunCalcEphemeris.compute(t, 123.0, LON), SUN_DISTANCE);
        assert_eq!(p, expected);
    }

    struct BrokenEphemeris;

    impl Ephemeris for BrokenEphemeris {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn horizontal(&self, _t: DateTime<Tz>, _lat: f64, _lon: f64) -> Result<Horizontal> {
            Err(TwinError::Ephemeris("offline".to_string()))
        }
    }

    #[test]
    fn test_custom_ephemeris_failure_stays_total() {
        let calc = SunCalculator::with_ephemeris(Box::new(BrokenEphemeris));
        let t = UTC.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let p = calc.position(t, LAT, LON);
        assert_eq!(calc.model_name(), "broken");
        assert!(approx(p.distance(), calc.radius(), 1e-9));
    }

    #[test]
    fn test_projection_axes() {
        let zenith = SunPosition::from_horizontal(Horizontal { altitude: PI / 2.0, azimuth: 0.0 }, 300.0);
        assert!(approx(zenith.y, 300.0, 1e-9));
        assert!(approx(zenith.x, 0.0, 1e-9) && approx(zenith.z, 0.0, 1e-9));

        let south = SunPosition::from_horizontal(Horizontal { altitude: 0.0, azimuth: 0.0 }, 300.0);
        assert!(approx(south.z, 300.0, 1e-9));

        let west = SunPosition::from_horizontal(Horizontal { altitude: 0.0, azimuth: PI / 2.0 }, 300.0);
        assert!(approx(west.x, 300.0, 1e-9));
    }

    #[test]
    fn test_model_names() {
        assert_eq!(EphemerisModel::from_name("spa"), Some(EphemerisModel::Spa));
        assert_eq!(EphemerisModel::from_name("suncalc"), Some(EphemerisModel::SunCalc));
        assert_eq!(EphemerisModel::from_name("noaa"), None);
        assert_eq!(SunCalculator::new(EphemerisModel::Spa).model_name(), "spa");
    }
}
