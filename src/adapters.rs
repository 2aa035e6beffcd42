//! Domain adapters: raw upstream JSON to typed record sequences.
//!
//! Each adapter checks that the expected top-level array is present, then maps
//! every element into a record. A missing or non-numeric field becomes
//! [`Measure::Unknown`]. Only an unparseable date rejects the payload, because
//! the date is the key that later joins the series together.
//!
//! Records come out sorted ascending by date. Duplicate dates are rejected.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    CurrentWeather, DiseaseDay, DiseaseReport, IrrigationDay, Measure, RiskLevel, WeatherDay,
};

// ---

/// The payload does not have the shape its domain expects.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdaptError {
    // ---
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Adapt a current-weather response. The snapshot may be bare or wrapped in a
/// `weather` object.
pub fn adapt_current(payload: &Value) -> Result<CurrentWeather, AdaptError> {
    // ---
    let snapshot = match payload.get("weather") {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    };
    if !snapshot.is_object() {
        return Err(AdaptError::MalformedPayload(
            "expected a weather snapshot object".to_string(),
        ));
    }

    let observed_at = snapshot
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    Ok(CurrentWeather {
        observed_at,
        temperature_c: measure(snapshot, &["temperature_celsius", "temperature"]),
        humidity_pct: measure(snapshot, &["humidity_percent", "humidity"]),
        wind_speed_ms: measure(snapshot, &["wind_speed_ms", "wind_speed"]),
        description: text(snapshot, &["weather_description", "description"]),
    })
}

/// Adapt a forecast response (`forecasts` array).
pub fn adapt_forecast(payload: &Value) -> Result<Vec<WeatherDay>, AdaptError> {
    // ---
    let items = records_array(payload, "forecasts")?;

    let mut days = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let date = record_date(item, index, &["date", "forecast_date"])?;
        days.push((
            index,
            WeatherDay {
                date,
                temp_min_c: measure(item, &["temp_min"]),
                temp_day_c: measure(item, &["temp_day"]),
                temp_max_c: measure(item, &["temp_max"]),
                rain_mm: measure(item, &["rain_mm"]),
                pop: measure(item, &["pop"]),
                humidity_pct: measure(item, &["humidity"]),
            },
        ));
    }
    order_by_date(days, |d| d.date)
}

/// Adapt an irrigation response (`recommendations` array).
pub fn adapt_irrigation(payload: &Value) -> Result<Vec<IrrigationDay>, AdaptError> {
    // ---
    let items = records_array(payload, "recommendations")?;

    let mut days = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let date = record_date(item, index, &["date"])?;
        let irrigation_needed = match item.get("irrigation_needed").and_then(Value::as_bool) {
            Some(flag) => flag,
            None => {
                debug!("Irrigation record {} has no irrigation_needed flag, assuming false", index);
                false
            }
        };
        days.push((
            index,
            IrrigationDay {
                date,
                irrigation_needed,
                recommended_mm: measure(item, &["water_amount_mm", "water_amount"]),
                reason: text(item, &["reason"]),
            },
        ));
    }
    order_by_date(days, |d| d.date)
}

/// Adapt a disease-risk response (`alerts` array plus `alert_count`).
pub fn adapt_disease(payload: &Value) -> Result<DiseaseReport, AdaptError> {
    // ---
    let items = records_array(payload, "alerts")?;

    let mut days = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let date = record_date(item, index, &["date"])?;
        let risk_level = match item.get("risk_level").and_then(Value::as_str) {
            None => RiskLevel::Low,
            Some(raw) => RiskLevel::parse(raw).unwrap_or_else(|| {
                warn!(
                    "Disease record {} has unrecognized risk level {:?}, treating as low",
                    index, raw
                );
                RiskLevel::Low
            }),
        };
        days.push((
            index,
            DiseaseDay {
                date,
                risk_level,
                humidity_pct: measure(item, &["humidity"]),
                temperature_c: measure(item, &["temperature"]),
                recommendation: text(item, &["recommendation"]),
            },
        ));
    }

    let alert_count = payload
        .get("alert_count")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok());

    Ok(DiseaseReport {
        days: order_by_date(days, |d| d.date)?,
        alert_count,
    })
}

// ---

fn records_array<'a>(payload: &'a Value, key: &str) -> Result<&'a Vec<Value>, AdaptError> {
    // ---
    match payload.get(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(AdaptError::MalformedPayload(format!(
            "'{}' is not an array",
            key
        ))),
        None => Err(AdaptError::MalformedPayload(format!(
            "missing '{}' array",
            key
        ))),
    }
}

/// First non-null value among `keys`.
fn field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find(|v| !v.is_null())
}

fn measure(item: &Value, keys: &[&str]) -> Measure {
    // ---
    match field(item, keys) {
        Some(v) => match v.as_f64() {
            Some(n) => Measure::Known(n),
            None => {
                debug!("Field {:?} is not numeric ({}), marking unknown", keys[0], v);
                Measure::Unknown
            }
        },
        None => Measure::Unknown,
    }
}

fn text(item: &Value, keys: &[&str]) -> String {
    field(item, keys)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn record_date(item: &Value, index: usize, keys: &[&str]) -> Result<NaiveDate, AdaptError> {
    // ---
    let raw = field(item, keys)
        .and_then(Value::as_str)
        .ok_or_else(|| AdaptError::InvalidRecord {
            index,
            reason: "missing date".to_string(),
        })?;

    parse_date(raw).ok_or_else(|| AdaptError::InvalidRecord {
        index,
        reason: format!("unparseable date {:?}", raw),
    })
}

/// Accepts `YYYY-MM-DD`, a naive ISO datetime, or RFC 3339; keeps the
/// calendar date only.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    // ---
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    parse_naive_datetime(raw).map(|dt| dt.date())
}

fn parse_naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive_datetime(raw).map(|dt| dt.and_utc())
}

fn order_by_date<R>(
    mut records: Vec<(usize, R)>,
    date_of: impl Fn(&R) -> NaiveDate,
) -> Result<Vec<R>, AdaptError> {
    // ---
    records.sort_by_key(|(_, r)| date_of(r));

    if let Some(pair) = records
        .windows(2)
        .find(|w| date_of(&w[0].1) == date_of(&w[1].1))
    {
        return Err(AdaptError::InvalidRecord {
            index: pair[1].0,
            reason: format!("duplicate date {}", date_of(&pair[1].1)),
        });
    }

    Ok(records.into_iter().map(|(_, r)| r).collect())
}
