//! Query-and-derive pipeline behind the agricultural weather dashboard.
//!
//! A page turns a (location, horizon) pair into one or more upstream fetches,
//! keeps only the reply for its latest submission, and derives the counts,
//! sums, and chart series it displays. Modules, leaves first:
//!
//! - `models`: parameter and record types
//! - `adapters`: raw upstream JSON to typed records
//! - `synth`: derived metrics and chart series
//! - `state`: the per-query presentation state machine
//! - `domains`: binds each remote domain to its adapter and synthesizer
//! - `fetch`: the transport seam and its `reqwest` implementation
//! - `coordinator`: generation-tagged submission and stale discard
//! - `pages`: page-level composition of coordinators
//! - `routes`: the HTTP surface a UI reads
//!
//! Sibling modules reach each other through the re-exports below rather than
//! through deep paths (EMBP gateway).

pub mod adapters;
pub mod config;
pub mod coordinator;
pub mod domains;
pub mod fetch;
pub mod models;
pub mod pages;
pub mod routes;
pub mod state;
pub mod synth;

pub use adapters::AdaptError;
pub use config::Config;
pub use coordinator::{DomainState, QueryCoordinator, Settlement, Submission};
pub use domains::{
    CurrentWeatherDomain, DiseaseDomain, Domain, DomainKind, ForecastDomain, IrrigationDomain,
};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use models::{
    CurrentWeather, DiseaseDay, DiseaseReport, Generation, GeoPoint, HorizonDays, IrrigationDay,
    Measure, ParamsError, QueryParams, RiskLevel, WeatherDay,
};
pub use pages::{IssuedQuery, PageKind, PageSnapshot, Pages};
pub use state::QueryState;
