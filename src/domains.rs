//! The four remote data domains and the adapter/synthesizer pair for each.

use std::fmt::Debug;

use serde::Serialize;
use serde_json::Value;

use crate::adapters::{self, AdaptError};
use crate::models::{CurrentWeather, DiseaseReport, IrrigationDay, WeatherDay};
use crate::synth::{self, DiseaseMetrics, ForecastMetrics, IrrigationMetrics};

// ---

/// A distinct remote data source with its own record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainKind {
    WeatherCurrent,
    WeatherForecast,
    Irrigation,
    DiseaseRisk,
}

impl DomainKind {
    // ---
    /// Upstream endpoint path.
    pub fn path(self) -> &'static str {
        match self {
            DomainKind::WeatherCurrent => "/api/weather/current",
            DomainKind::WeatherForecast => "/api/weather/forecast",
            DomainKind::Irrigation => "/api/predictions/irrigation",
            DomainKind::DiseaseRisk => "/api/predictions/disease-risk",
        }
    }

    /// Whether the endpoint takes a `days` parameter.
    pub fn uses_horizon(self) -> bool {
        !matches!(self, DomainKind::WeatherCurrent)
    }

    pub fn label(self) -> &'static str {
        match self {
            DomainKind::WeatherCurrent => "current weather",
            DomainKind::WeatherForecast => "forecast",
            DomainKind::Irrigation => "irrigation",
            DomainKind::DiseaseRisk => "disease risk",
        }
    }
}

/// Binds a [`DomainKind`] to its typed records, adapter, and synthesizer.
pub trait Domain: Send + Sync + 'static {
    // ---
    const KIND: DomainKind;

    type Records: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;
    type Derived: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;

    fn adapt(payload: &Value) -> Result<Self::Records, AdaptError>;

    fn synthesize(records: &Self::Records) -> Self::Derived;
}

pub struct CurrentWeatherDomain;
pub struct ForecastDomain;
pub struct IrrigationDomain;
pub struct DiseaseDomain;

impl Domain for CurrentWeatherDomain {
    const KIND: DomainKind = DomainKind::WeatherCurrent;
    type Records = CurrentWeather;
    // A snapshot has nothing to aggregate
    type Derived = ();

    fn adapt(payload: &Value) -> Result<CurrentWeather, AdaptError> {
        adapters::adapt_current(payload)
    }

    fn synthesize(_records: &CurrentWeather) {}
}

impl Domain for ForecastDomain {
    const KIND: DomainKind = DomainKind::WeatherForecast;
    type Records = Vec<WeatherDay>;
    type Derived = ForecastMetrics;

    fn adapt(payload: &Value) -> Result<Vec<WeatherDay>, AdaptError> {
        adapters::adapt_forecast(payload)
    }

    fn synthesize(records: &Vec<WeatherDay>) -> ForecastMetrics {
        synth::synthesize_forecast(records)
    }
}

impl Domain for IrrigationDomain {
    const KIND: DomainKind = DomainKind::Irrigation;
    type Records = Vec<IrrigationDay>;
    type Derived = IrrigationMetrics;

    fn adapt(payload: &Value) -> Result<Vec<IrrigationDay>, AdaptError> {
        adapters::adapt_irrigation(payload)
    }

    fn synthesize(records: &Vec<IrrigationDay>) -> IrrigationMetrics {
        synth::synthesize_irrigation(records)
    }
}

impl Domain for DiseaseDomain {
    const KIND: DomainKind = DomainKind::DiseaseRisk;
    type Records = DiseaseReport;
    type Derived = DiseaseMetrics;

    fn adapt(payload: &Value) -> Result<DiseaseReport, AdaptError> {
        adapters::adapt_disease(payload)
    }

    fn synthesize(records: &DiseaseReport) -> DiseaseMetrics {
        synth::synthesize_disease(records)
    }
}
