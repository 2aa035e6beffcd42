//! Data models for the dashboard query pipeline.
//!
//! Parameter types (`GeoPoint`, `HorizonDays`, `QueryParams`) are validated on
//! construction so that an invalid point or horizon never reaches a
//! coordinator. Record types are the adapted, typed form of the upstream
//! payloads; they are immutable once an adapter has produced them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---

/// Rejections raised while building query parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamsError {
    // ---
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("unsupported horizon of {0} days (expected 3, 7 or 14)")]
    UnsupportedHorizon(u32),
}

/// A geographic point. Only constructible through [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    // ---
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    // ---
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ParamsError> {
        // ---
        // NaN fails both range checks
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ParamsError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ParamsError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Number of forecast days requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum HorizonDays {
    Three,
    Seven,
    Fourteen,
}

impl HorizonDays {
    // ---
    pub const ALL: [HorizonDays; 3] = [
        HorizonDays::Three,
        HorizonDays::Seven,
        HorizonDays::Fourteen,
    ];

    pub fn days(self) -> u32 {
        match self {
            HorizonDays::Three => 3,
            HorizonDays::Seven => 7,
            HorizonDays::Fourteen => 14,
        }
    }
}

impl TryFrom<u32> for HorizonDays {
    type Error = ParamsError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            3 => Ok(HorizonDays::Three),
            7 => Ok(HorizonDays::Seven),
            14 => Ok(HorizonDays::Fourteen),
            other => Err(ParamsError::UnsupportedHorizon(other)),
        }
    }
}

impl From<HorizonDays> for u32 {
    fn from(h: HorizonDays) -> u32 {
        h.days()
    }
}

impl fmt::Display for HorizonDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// One (location, horizon) request. Structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryParams {
    // ---
    pub point: GeoPoint,
    pub horizon: HorizonDays,
}

impl QueryParams {
    // ---
    pub fn new(latitude: f64, longitude: f64, days: u32) -> Result<Self, ParamsError> {
        // ---
        Ok(Self {
            point: GeoPoint::new(latitude, longitude)?,
            horizon: HorizonDays::try_from(days)?,
        })
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.point.latitude, self.point.longitude, self.horizon
        )
    }
}

/// Per-coordinator counter identifying the most recent submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Generation(pub u64);

impl Generation {
    // ---
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A numeric field that may be absent from the upstream payload.
///
/// Serializes as the number or `null`. Aggregations must match on this rather
/// than defaulting, so a missing reading is never counted as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(into = "Option<f64>")]
pub enum Measure {
    Known(f64),
    #[default]
    Unknown,
}

impl Measure {
    // ---
    pub fn known(self) -> Option<f64> {
        match self {
            Measure::Known(v) => Some(v),
            Measure::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Measure::Unknown)
    }
}

impl From<Measure> for Option<f64> {
    fn from(m: Measure) -> Self {
        m.known()
    }
}

/// Current conditions at the queried point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    // ---
    pub observed_at: Option<DateTime<Utc>>,
    pub temperature_c: Measure,
    pub humidity_pct: Measure,
    pub wind_speed_ms: Measure,
    pub description: String,
}

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherDay {
    // ---
    pub date: NaiveDate,
    pub temp_min_c: Measure,
    pub temp_day_c: Measure,
    pub temp_max_c: Measure,
    pub rain_mm: Measure,
    /// Probability of precipitation as reported upstream.
    pub pop: Measure,
    pub humidity_pct: Measure,
}

/// One irrigation recommendation day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationDay {
    // ---
    pub date: NaiveDate,
    pub irrigation_needed: bool,
    pub recommended_mm: Measure,
    pub reason: String,
}

/// Disease risk classification, produced by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    // ---
    pub fn parse(s: &str) -> Option<RiskLevel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

/// One disease-risk day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseDay {
    // ---
    pub date: NaiveDate,
    pub risk_level: RiskLevel,
    pub humidity_pct: Measure,
    pub temperature_c: Measure,
    pub recommendation: String,
}

/// Adapted disease-risk payload: the daily records plus the service's count
/// of currently active alerts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseReport {
    // ---
    pub days: Vec<DiseaseDay>,
    pub alert_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_geo_point_bounds() {
        // ---
        assert!(GeoPoint::new(14.7167, -17.4677).is_ok());
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());

        assert_eq!(
            GeoPoint::new(90.5, 0.0),
            Err(ParamsError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            GeoPoint::new(0.0, -180.1),
            Err(ParamsError::LongitudeOutOfRange(-180.1))
        );
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_horizon_days_closed_set() {
        // ---
        for h in HorizonDays::ALL {
            assert_eq!(HorizonDays::try_from(h.days()), Ok(h));
        }
        assert_eq!(
            HorizonDays::try_from(5),
            Err(ParamsError::UnsupportedHorizon(5))
        );
        assert!(HorizonDays::try_from(0).is_err());
    }

    #[test]
    fn test_query_params_structural_equality() {
        // ---
        let a = QueryParams::new(14.7167, -17.4677, 7).unwrap();
        let b = QueryParams::new(14.7167, -17.4677, 7).unwrap();
        let c = QueryParams::new(14.7167, -17.4677, 14).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_measure_serializes_unknown_as_null() {
        // ---
        let json = serde_json::to_value([Measure::Known(2.5), Measure::Unknown]).unwrap();
        assert_eq!(json, serde_json::json!([2.5, null]));
    }

    #[test]
    fn test_risk_level_parse() {
        // ---
        assert_eq!(RiskLevel::parse("high"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse(" Medium "), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("LOW"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::parse("severe"), None);
    }

    #[test]
    fn test_generation_is_monotonic() {
        // ---
        let g = Generation::default();
        assert_eq!(g.next(), Generation(1));
        assert!(g.next().next() > g.next());
    }
}
