//! Derived-series synthesis.
//!
//! Pure functions from an adapted record sequence to the aggregates and
//! chart-ready series the dashboard displays. Every series is indexed by the
//! record dates as given: no resampling, no interpolation. Unknown readings
//! stay `None` in the series and are left out of sums.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{DiseaseDay, DiseaseReport, IrrigationDay, Measure, RiskLevel, WeatherDay};

// ---

/// Humidity above which the dashboard warns about fungal disease.
pub const FUNGAL_HUMIDITY_PCT: f64 = 75.0;

/// Open temperature interval that favours fungal disease together with high humidity.
pub const FUNGAL_TEMP_RANGE_C: (f64, f64) = (15.0, 30.0);

/// Number of leading forecast days checked for rain before advising irrigation.
pub const DRY_SPELL_WINDOW_DAYS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point<V> {
    pub date: NaiveDate,
    pub value: V,
}

/// A named series on the record date axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series<V> {
    // ---
    pub label: &'static str,
    pub points: Vec<Point<V>>,
}

impl<V> Series<V> {
    // ---
    fn from_records<R>(
        label: &'static str,
        records: &[R],
        date: impl Fn(&R) -> NaiveDate,
        value: impl Fn(&R) -> V,
    ) -> Self {
        Series {
            label,
            points: records
                .iter()
                .map(|r| Point {
                    date: date(r),
                    value: value(r),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }
}

/// Forecast page metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetrics {
    // ---
    pub temp_min: Series<Option<f64>>,
    pub temp_day: Series<Option<f64>>,
    pub temp_max: Series<Option<f64>>,
    pub precipitation: Series<Option<f64>>,
    pub precipitation_probability: Series<Option<f64>>,
    pub humidity: Series<Option<f64>>,
    pub total_rain_mm: f64,
    pub rainy_days: u32,
    pub lowest_temp_c: Option<f64>,
    pub highest_temp_c: Option<f64>,
    /// Days with at least one unknown reading.
    pub incomplete_days: u32,
}

pub fn synthesize_forecast(days: &[WeatherDay]) -> ForecastMetrics {
    // ---
    let series = |label, value: fn(&WeatherDay) -> Measure| {
        Series::from_records(label, days, |d| d.date, |d| value(d).known())
    };

    let total_rain_mm: f64 = days.iter().filter_map(|d| d.rain_mm.known()).sum();
    let rainy_days = days
        .iter()
        .filter(|d| d.rain_mm.known().is_some_and(|mm| mm > 0.0))
        .count() as u32;

    let lowest_temp_c = days
        .iter()
        .filter_map(|d| d.temp_min_c.known())
        .reduce(f64::min);
    let highest_temp_c = days
        .iter()
        .filter_map(|d| d.temp_max_c.known())
        .reduce(f64::max);

    let incomplete_days = days
        .iter()
        .filter(|d| {
            [
                d.temp_min_c,
                d.temp_day_c,
                d.temp_max_c,
                d.rain_mm,
                d.pop,
                d.humidity_pct,
            ]
            .iter()
            .any(|m| m.is_unknown())
        })
        .count() as u32;

    ForecastMetrics {
        temp_min: series("temp_min", |d| d.temp_min_c),
        temp_day: series("temp_day", |d| d.temp_day_c),
        temp_max: series("temp_max", |d| d.temp_max_c),
        precipitation: series("rain_mm", |d| d.rain_mm),
        precipitation_probability: series("pop", |d| d.pop),
        humidity: series("humidity", |d| d.humidity_pct),
        total_rain_mm,
        rainy_days,
        lowest_temp_c,
        highest_temp_c,
        incomplete_days,
    }
}

/// Irrigation page metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationMetrics {
    // ---
    /// Bar series: recommended amount on irrigation days, 0 otherwise.
    pub water_amount: Series<Option<f64>>,
    /// Marker series on the secondary axis: 1 on irrigation days.
    pub irrigation_flag: Series<u8>,
    pub total_water_needed_mm: f64,
    pub irrigation_day_count: u32,
    /// Irrigation days whose amount was not reported.
    pub unknown_amount_days: u32,
    pub any_irrigation_needed: bool,
    pub next_irrigation_date: Option<NaiveDate>,
}

/// Water to apply on one day. `None` when irrigation is needed but the
/// amount was not reported.
pub fn water_amount(day: &IrrigationDay) -> Option<f64> {
    if day.irrigation_needed {
        day.recommended_mm.known()
    } else {
        Some(0.0)
    }
}

pub fn synthesize_irrigation(days: &[IrrigationDay]) -> IrrigationMetrics {
    // ---
    let needed = || days.iter().filter(|d| d.irrigation_needed);

    IrrigationMetrics {
        water_amount: Series::from_records("water_amount_mm", days, |d| d.date, water_amount),
        irrigation_flag: Series::from_records(
            "irrigation_needed",
            days,
            |d| d.date,
            |d| u8::from(d.irrigation_needed),
        ),
        total_water_needed_mm: days.iter().filter_map(water_amount).sum(),
        irrigation_day_count: needed().count() as u32,
        unknown_amount_days: needed().filter(|d| d.recommended_mm.is_unknown()).count() as u32,
        any_irrigation_needed: needed().next().is_some(),
        next_irrigation_date: needed().map(|d| d.date).next(),
    }
}

/// Disease page metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseMetrics {
    // ---
    pub high_risk_count: u32,
    pub medium_risk_count: u32,
    pub low_risk_count: u32,
    pub high: Series<u8>,
    pub medium: Series<u8>,
    pub low: Series<u8>,
    pub humidity: Series<Option<f64>>,
    pub temperature: Series<Option<f64>>,
    pub favorable_condition_days: u32,
    pub active_alert_count: u32,
    pub next_high_risk_date: Option<NaiveDate>,
}

/// True when humidity and temperature both sit in the fungal-disease band.
/// Unknown readings never qualify.
pub fn favors_fungal_disease(day: &DiseaseDay) -> bool {
    // ---
    let (lo, hi) = FUNGAL_TEMP_RANGE_C;
    match (day.humidity_pct.known(), day.temperature_c.known()) {
        (Some(h), Some(t)) => h > FUNGAL_HUMIDITY_PCT && t > lo && t < hi,
        _ => false,
    }
}

pub fn synthesize_disease(report: &DiseaseReport) -> DiseaseMetrics {
    // ---
    let days = report.days.as_slice();
    let count = |level: RiskLevel| days.iter().filter(|d| d.risk_level == level).count() as u32;
    let one_hot = |label, level: RiskLevel| {
        Series::from_records(label, days, |d| d.date, move |d| u8::from(d.risk_level == level))
    };

    let high_risk_count = count(RiskLevel::High);
    let medium_risk_count = count(RiskLevel::Medium);

    DiseaseMetrics {
        high_risk_count,
        medium_risk_count,
        low_risk_count: count(RiskLevel::Low),
        high: one_hot("high", RiskLevel::High),
        medium: one_hot("medium", RiskLevel::Medium),
        low: one_hot("low", RiskLevel::Low),
        humidity: Series::from_records("humidity", days, |d| d.date, |d| d.humidity_pct.known()),
        temperature: Series::from_records(
            "temperature",
            days,
            |d| d.date,
            |d| d.temperature_c.known(),
        ),
        favorable_condition_days: days.iter().filter(|d| favors_fungal_disease(d)).count() as u32,
        active_alert_count: report
            .alert_count
            .unwrap_or(high_risk_count + medium_risk_count),
        next_high_risk_date: days
            .iter()
            .find(|d| d.risk_level == RiskLevel::High)
            .map(|d| d.date),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    IrrigationLikely,
    FungalRisk,
}

/// A short notice shown on the overview page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    // ---
    pub kind: AdvisoryKind,
    pub date: NaiveDate,
    pub message: String,
}

/// Overview advisories from a forecast sequence.
pub fn advisories(days: &[WeatherDay]) -> Vec<Advisory> {
    // ---
    let mut out = Vec::new();

    let window = &days[..days.len().min(DRY_SPELL_WINDOW_DAYS)];
    let all_dry = !window.is_empty()
        && window
            .iter()
            .all(|d| d.rain_mm.known().is_some_and(|mm| mm <= 0.0));
    if let (true, Some(last)) = (all_dry, window.last()) {
        out.push(Advisory {
            kind: AdvisoryKind::IrrigationLikely,
            date: last.date,
            message: format!("No rain forecast through {}; plan irrigation", last.date),
        });
    }

    if let Some(humid) = days.iter().find(|d| {
        d.humidity_pct
            .known()
            .is_some_and(|h| h > FUNGAL_HUMIDITY_PCT)
    }) {
        out.push(Advisory {
            kind: AdvisoryKind::FungalRisk,
            date: humid.date,
            message: format!(
                "Humidity above {}% on {}; fungal disease risk",
                FUNGAL_HUMIDITY_PCT, humid.date
            ),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn create_test_date(offset: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap() + chrono::Days::new(offset as u64)
    }

    fn create_test_weather_day(offset: u32, rain: Measure, humidity: f64) -> WeatherDay {
        // ---
        WeatherDay {
            date: create_test_date(offset),
            temp_min_c: Measure::Known(20.0 + offset as f64),
            temp_day_c: Measure::Known(26.0),
            temp_max_c: Measure::Known(30.0 + offset as f64),
            rain_mm: rain,
            pop: Measure::Known(0.2),
            humidity_pct: Measure::Known(humidity),
        }
    }

    fn create_test_irrigation_day(offset: u32, needed: bool, mm: Measure) -> IrrigationDay {
        IrrigationDay {
            date: create_test_date(offset),
            irrigation_needed: needed,
            recommended_mm: mm,
            reason: String::new(),
        }
    }

    fn create_test_disease_day(offset: u32, level: RiskLevel) -> DiseaseDay {
        DiseaseDay {
            date: create_test_date(offset),
            risk_level: level,
            humidity_pct: Measure::Known(80.0),
            temperature_c: Measure::Known(22.0),
            recommendation: String::new(),
        }
    }

    #[test]
    fn test_forecast_series_aligned_to_dates() {
        // ---
        let days: Vec<WeatherDay> = (0..7)
            .map(|i| create_test_weather_day(i, Measure::Known(1.0), 60.0))
            .collect();
        let m = synthesize_forecast(&days);

        for series in [&m.temp_min, &m.temp_day, &m.temp_max, &m.precipitation] {
            assert_eq!(series.len(), 7);
            assert!(series.dates().eq(days.iter().map(|d| d.date)));
        }
        assert_eq!(m.total_rain_mm, 7.0);
        assert_eq!(m.rainy_days, 7);
        assert_eq!(m.lowest_temp_c, Some(20.0));
        assert_eq!(m.highest_temp_c, Some(36.0));
        assert_eq!(m.incomplete_days, 0);
    }

    #[test]
    fn test_forecast_unknown_is_not_zero() {
        // ---
        let days = vec![
            create_test_weather_day(0, Measure::Known(3.0), 60.0),
            create_test_weather_day(1, Measure::Unknown, 60.0),
        ];
        let m = synthesize_forecast(&days);

        assert_eq!(m.precipitation.points[1].value, None);
        assert_eq!(m.total_rain_mm, 3.0);
        assert_eq!(m.rainy_days, 1);
        assert_eq!(m.incomplete_days, 1);
    }

    #[test]
    fn test_irrigation_totals() {
        // ---
        let days = vec![
            create_test_irrigation_day(0, true, Measure::Known(12.0)),
            create_test_irrigation_day(1, false, Measure::Known(0.0)),
        ];
        let m = synthesize_irrigation(&days);

        assert_eq!(m.total_water_needed_mm, 12.0);
        assert_eq!(m.irrigation_day_count, 1);
        assert!(m.any_irrigation_needed);
        assert_eq!(m.next_irrigation_date, Some(create_test_date(0)));
        assert_eq!(m.water_amount.points[1].value, Some(0.0));
        assert_eq!(
            m.irrigation_flag.points.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![1, 0]
        );
    }

    #[test]
    fn test_irrigation_ignores_amount_on_dry_days() {
        // ---
        // A recommended amount on a day that needs no irrigation does not count
        let days = vec![
            create_test_irrigation_day(0, false, Measure::Known(8.0)),
            create_test_irrigation_day(1, false, Measure::Known(3.0)),
        ];
        let m = synthesize_irrigation(&days);

        assert_eq!(m.total_water_needed_mm, 0.0);
        assert_eq!(m.irrigation_day_count, 0);
        assert!(!m.any_irrigation_needed);
        assert_eq!(m.next_irrigation_date, None);
    }

    #[test]
    fn test_irrigation_unknown_amount_counted_separately() {
        // ---
        let days = vec![
            create_test_irrigation_day(0, true, Measure::Unknown),
            create_test_irrigation_day(1, true, Measure::Known(6.5)),
        ];
        let m = synthesize_irrigation(&days);

        assert_eq!(m.total_water_needed_mm, 6.5);
        assert_eq!(m.irrigation_day_count, 2);
        assert_eq!(m.unknown_amount_days, 1);
        assert_eq!(m.water_amount.points[0].value, None);
    }

    #[test]
    fn test_disease_counts_and_one_hot() {
        // ---
        let levels = [
            RiskLevel::High,
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::Low,
            RiskLevel::High,
            RiskLevel::Low,
            RiskLevel::Low,
        ];
        let report = DiseaseReport {
            days: levels
                .iter()
                .enumerate()
                .map(|(i, l)| create_test_disease_day(i as u32, *l))
                .collect(),
            alert_count: None,
        };
        let m = synthesize_disease(&report);

        assert_eq!(m.high_risk_count, 2);
        assert_eq!(m.medium_risk_count, 1);
        assert_eq!(m.low_risk_count, 4);
        assert_eq!(m.active_alert_count, 3);
        assert_eq!(m.next_high_risk_date, Some(create_test_date(0)));

        for i in 0..levels.len() {
            let sum = m.high.points[i].value + m.medium.points[i].value + m.low.points[i].value;
            assert_eq!(sum, 1, "day {} must be exactly one level", i);
            assert_eq!(m.high.points[i].date, m.low.points[i].date);
        }
    }

    #[test]
    fn test_disease_alert_count_from_payload_wins() {
        // ---
        let report = DiseaseReport {
            days: vec![create_test_disease_day(0, RiskLevel::High)],
            alert_count: Some(5),
        };
        assert_eq!(synthesize_disease(&report).active_alert_count, 5);
    }

    #[test]
    fn test_favorable_conditions_band() {
        // ---
        let mut day = create_test_disease_day(0, RiskLevel::Medium);
        assert!(favors_fungal_disease(&day));

        day.temperature_c = Measure::Known(30.0);
        assert!(!favors_fungal_disease(&day));

        day.temperature_c = Measure::Known(20.0);
        day.humidity_pct = Measure::Known(75.0);
        assert!(!favors_fungal_disease(&day));

        day.humidity_pct = Measure::Unknown;
        assert!(!favors_fungal_disease(&day));
    }

    #[test]
    fn test_empty_input_yields_zeroed_aggregates() {
        // ---
        let f = synthesize_forecast(&[]);
        assert!(f.temp_day.is_empty());
        assert_eq!(f.total_rain_mm, 0.0);
        assert_eq!(f.rainy_days, 0);
        assert_eq!(f.lowest_temp_c, None);

        let i = synthesize_irrigation(&[]);
        assert_eq!(i.total_water_needed_mm, 0.0);
        assert_eq!(i.irrigation_day_count, 0);
        assert!(!i.any_irrigation_needed);

        let d = synthesize_disease(&DiseaseReport {
            days: vec![],
            alert_count: None,
        });
        assert_eq!(d.high_risk_count, 0);
        assert_eq!(d.medium_risk_count, 0);
        assert_eq!(d.active_alert_count, 0);
        assert!(d.high.is_empty());

        assert!(advisories(&[]).is_empty());
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        // ---
        let days: Vec<WeatherDay> = (0..14)
            .map(|i| create_test_weather_day(i, Measure::Known(i as f64 * 0.3), 70.0))
            .collect();
        assert_eq!(synthesize_forecast(&days), synthesize_forecast(&days));

        let irrigation = vec![
            create_test_irrigation_day(0, true, Measure::Known(0.1)),
            create_test_irrigation_day(1, true, Measure::Known(0.2)),
        ];
        assert_eq!(
            synthesize_irrigation(&irrigation),
            synthesize_irrigation(&irrigation)
        );
    }

    #[test]
    fn test_advisories() {
        // ---
        let dry: Vec<WeatherDay> = (0..5)
            .map(|i| create_test_weather_day(i, Measure::Known(0.0), 60.0))
            .collect();
        let out = advisories(&dry);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, AdvisoryKind::IrrigationLikely);
        assert_eq!(out[0].date, create_test_date(2));

        let mut wet = dry.clone();
        wet[1].rain_mm = Measure::Known(4.0);
        wet[3].humidity_pct = Measure::Known(82.0);
        let out = advisories(&wet);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, AdvisoryKind::FungalRisk);
        assert_eq!(out[0].date, create_test_date(3));

        // Unknown rain is not evidence of a dry spell
        let mut unknown = dry;
        unknown[0].rain_mm = Measure::Unknown;
        assert!(advisories(&unknown).is_empty());
    }
}
