//! Page-level orchestration.
//!
//! Each dashboard page owns the coordinators for the domains it shows. A page
//! with several domains (the overview) submits to each independently; every
//! sub-query has its own generation and can fail without affecting the
//! others.

use std::sync::Arc;

use serde::Serialize;

use crate::coordinator::{DomainState, QueryCoordinator};
use crate::domains::{
    CurrentWeatherDomain, DiseaseDomain, Domain, DomainKind, ForecastDomain, IrrigationDomain,
};
use crate::fetch::Fetcher;
use crate::models::{Generation, QueryParams};
use crate::state::QueryState;
use crate::synth::{self, Advisory};

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Overview,
    Forecast,
    Irrigation,
    Disease,
}

impl PageKind {
    // ---
    pub const ALL: [PageKind; 4] = [
        PageKind::Overview,
        PageKind::Forecast,
        PageKind::Irrigation,
        PageKind::Disease,
    ];

    pub fn parse(s: &str) -> Option<PageKind> {
        match s {
            "overview" => Some(PageKind::Overview),
            "forecast" => Some(PageKind::Forecast),
            "irrigation" => Some(PageKind::Irrigation),
            "disease" => Some(PageKind::Disease),
            _ => None,
        }
    }
}

/// One sub-query issued by a page submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssuedQuery {
    pub domain: DomainKind,
    pub generation: Generation,
}

/// Everything a page needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "lowercase")]
pub enum PageSnapshot {
    Overview {
        current: DomainState<CurrentWeatherDomain>,
        forecast: DomainState<ForecastDomain>,
        /// Built only from a `Ready` forecast; empty otherwise.
        advisories: Vec<Advisory>,
    },
    Forecast {
        forecast: DomainState<ForecastDomain>,
    },
    Irrigation {
        irrigation: DomainState<IrrigationDomain>,
    },
    Disease {
        disease: DomainState<DiseaseDomain>,
    },
}

/// Coordinators for every page. Pages never share a coordinator.
pub struct Pages {
    // ---
    overview_current: Arc<QueryCoordinator<CurrentWeatherDomain>>,
    overview_forecast: Arc<QueryCoordinator<ForecastDomain>>,
    forecast: Arc<QueryCoordinator<ForecastDomain>>,
    irrigation: Arc<QueryCoordinator<IrrigationDomain>>,
    disease: Arc<QueryCoordinator<DiseaseDomain>>,
}

impl Pages {
    // ---
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        // ---
        Self {
            overview_current: Arc::new(QueryCoordinator::new(fetcher.clone())),
            overview_forecast: Arc::new(QueryCoordinator::new(fetcher.clone())),
            forecast: Arc::new(QueryCoordinator::new(fetcher.clone())),
            irrigation: Arc::new(QueryCoordinator::new(fetcher.clone())),
            disease: Arc::new(QueryCoordinator::new(fetcher)),
        }
    }

    /// Submit `params` to every sub-query of `page`.
    pub fn submit(&self, page: PageKind, params: QueryParams) -> Vec<IssuedQuery> {
        // ---
        match page {
            PageKind::Overview => vec![
                issue(&self.overview_current, params),
                issue(&self.overview_forecast, params),
            ],
            PageKind::Forecast => vec![issue(&self.forecast, params)],
            PageKind::Irrigation => vec![issue(&self.irrigation, params)],
            PageKind::Disease => vec![issue(&self.disease, params)],
        }
    }

    /// Submit the same params to every page.
    pub fn submit_all(&self, params: QueryParams) -> Vec<IssuedQuery> {
        PageKind::ALL
            .iter()
            .flat_map(|page| self.submit(*page, params))
            .collect()
    }

    pub fn snapshot(&self, page: PageKind) -> PageSnapshot {
        // ---
        match page {
            PageKind::Overview => overview_snapshot(
                self.overview_current.state(),
                self.overview_forecast.state(),
            ),
            PageKind::Forecast => PageSnapshot::Forecast {
                forecast: self.forecast.state(),
            },
            PageKind::Irrigation => PageSnapshot::Irrigation {
                irrigation: self.irrigation.state(),
            },
            PageKind::Disease => PageSnapshot::Disease {
                disease: self.disease.state(),
            },
        }
    }

    /// Wait for the given sub-queries to settle (or be superseded), then
    /// snapshot the page.
    pub async fn settled(&self, page: PageKind, issued: &[IssuedQuery]) -> PageSnapshot {
        // ---
        for query in issued {
            match (page, query.domain) {
                (PageKind::Overview, DomainKind::WeatherCurrent) => {
                    self.overview_current.settled(query.generation).await;
                }
                (PageKind::Overview, DomainKind::WeatherForecast) => {
                    self.overview_forecast.settled(query.generation).await;
                }
                (PageKind::Forecast, _) => {
                    self.forecast.settled(query.generation).await;
                }
                (PageKind::Irrigation, _) => {
                    self.irrigation.settled(query.generation).await;
                }
                (PageKind::Disease, _) => {
                    self.disease.settled(query.generation).await;
                }
                (PageKind::Overview, _) => {}
            }
        }
        self.snapshot(page)
    }
}

fn issue<D: Domain>(coordinator: &Arc<QueryCoordinator<D>>, params: QueryParams) -> IssuedQuery {
    IssuedQuery {
        domain: D::KIND,
        generation: coordinator.submit(params).generation,
    }
}

fn overview_snapshot(
    current: DomainState<CurrentWeatherDomain>,
    forecast: DomainState<ForecastDomain>,
) -> PageSnapshot {
    // ---
    let advisories = match &forecast {
        QueryState::Ready { records, .. } => synth::advisories(records),
        _ => Vec::new(),
    };
    PageSnapshot::Overview {
        current,
        forecast,
        advisories,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::fetch::FetchError;

    /// Serves fixed payloads; the current-weather endpoint is down.
    struct CannedFetcher;

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn fetch(&self, kind: DomainKind, params: &QueryParams) -> Result<Value, FetchError> {
            // ---
            let days = params.horizon.days();
            let dates = (1..=days).map(|d| format!("2025-07-{:02}", d));
            match kind {
                DomainKind::WeatherCurrent => {
                    Err(FetchError::Transport("connection refused".into()))
                }
                DomainKind::WeatherForecast => Ok(json!({
                    "forecasts": dates
                        .map(|date| json!({ "date": date, "rain_mm": 0.0, "humidity": 80.0 }))
                        .collect::<Vec<_>>()
                })),
                DomainKind::Irrigation => Ok(json!({ "recommendations": [] })),
                DomainKind::DiseaseRisk => Ok(json!({ "alerts": [], "alert_count": 0 })),
            }
        }
    }

    fn create_test_pages() -> Pages {
        Pages::new(Arc::new(CannedFetcher))
    }

    #[test]
    fn test_page_kind_parse() {
        // ---
        for page in PageKind::ALL {
            let name = serde_json::to_value(page).unwrap();
            assert_eq!(PageKind::parse(name.as_str().unwrap()), Some(page));
        }
        assert_eq!(PageKind::parse("fields"), None);
    }

    #[tokio::test]
    async fn test_overview_partial_failure() {
        // ---
        let pages = create_test_pages();
        let params = QueryParams::new(14.7167, -17.4677, 7).unwrap();

        let issued = pages.submit(PageKind::Overview, params);
        assert_eq!(issued.len(), 2);

        match pages.settled(PageKind::Overview, &issued).await {
            PageSnapshot::Overview {
                current,
                forecast,
                advisories,
            } => {
                assert_eq!(current.status(), "failed");
                assert!(forecast.is_ready());
                // Dry and humid: both advisories
                assert_eq!(advisories.len(), 2);
            }
            other => panic!("expected overview, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pages_are_independent() {
        // ---
        let pages = create_test_pages();
        let params = QueryParams::new(14.7167, -17.4677, 3).unwrap();

        let issued = pages.submit(PageKind::Irrigation, params);
        pages.settled(PageKind::Irrigation, &issued).await;

        match pages.snapshot(PageKind::Forecast) {
            PageSnapshot::Forecast { forecast } => assert_eq!(forecast, QueryState::Idle),
            other => panic!("expected forecast, got {:?}", other),
        }
        match pages.snapshot(PageKind::Irrigation) {
            PageSnapshot::Irrigation { irrigation } => assert!(irrigation.is_ready()),
            other => panic!("expected irrigation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_all_issues_every_domain() {
        // ---
        let pages = create_test_pages();
        let params = QueryParams::new(14.7167, -17.4677, 14).unwrap();

        let issued = pages.submit_all(params);
        assert_eq!(issued.len(), 5);
        assert!(issued.iter().all(|q| q.generation == Generation(1)));
    }
}
