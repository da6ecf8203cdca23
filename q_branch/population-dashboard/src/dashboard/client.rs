//! HTTP client for the population API.
//!
//! One operation per remote endpoint. Status 200 is the only success; any
//! other status, a transport failure or an undecodable body is logged and
//! reported as `None`. There is no retry, no caching and no timeout override.

use std::future::Future;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error};

use crate::dashboard::country::{Country, PopulationYear};
use crate::dashboard::table::Table;

/// Base URL of the hosted population API.
pub const DEFAULT_API_URL: &str = "https://josh-mongodb-api.onrender.com";

/// Columns of the full listing coerced to floating point after decoding.
pub const FLOAT_COLUMNS: [&str; 6] = [
    "area",
    "landAreaKm",
    "netChange",
    "growthRate",
    "worldPercentage",
    "density",
];

/// Remote operations, one variant per endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint<'a> {
    InsertCountry,
    UpdateCountry { id: &'a str },
    DeleteCountry { id: &'a str },
    CountriesInfo,
    CountriesDensity { min: f64, max: f64 },
    MostPopulated { year: PopulationYear },
    LeastPopulated { year: PopulationYear },
    CountriesPop,
    CountryByName { name: &'a str },
    AveragePop,
    CountriesArea { min: f64, max: f64 },
    CustomAggregation { query: &'a str },
    CustomFind { query: &'a str },
    CustomDistinct { query: &'a str },
    CountAboveAverage { year: PopulationYear },
    CountBelowAverage { year: PopulationYear },
}

impl Endpoint<'_> {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::InsertCountry => Method::POST,
            Endpoint::UpdateCountry { .. } => Method::PUT,
            Endpoint::DeleteCountry { .. } => Method::DELETE,
            _ => Method::GET,
        }
    }

    /// Route name, the first path segment.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::InsertCountry => "insert_country",
            Endpoint::UpdateCountry { .. } => "update_country",
            Endpoint::DeleteCountry { .. } => "delete_country",
            Endpoint::CountriesInfo => "countries_info",
            Endpoint::CountriesDensity { .. } => "countries_density",
            Endpoint::MostPopulated { .. } => "country_most_populated",
            Endpoint::LeastPopulated { .. } => "country_least_populated",
            Endpoint::CountriesPop => "countries_pop",
            Endpoint::CountryByName { .. } => "country",
            Endpoint::AveragePop => "average_pop",
            Endpoint::CountriesArea { .. } => "countries_areas_sup1_sup2",
            Endpoint::CustomAggregation { .. } => "custom_aggregation",
            Endpoint::CustomFind { .. } => "custom_find",
            Endpoint::CustomDistinct { .. } => "custom_distinct",
            Endpoint::CountAboveAverage { .. } => "nb_countries_supavg",
            Endpoint::CountBelowAverage { .. } => "nb_countries_infavg",
        }
    }

    /// Path segments below the base URL. Parameters are single segments;
    /// a trailing empty segment yields the trailing slash of collection routes.
    pub fn segments(&self) -> Vec<String> {
        let name = self.name().to_string();
        match *self {
            Endpoint::InsertCountry
            | Endpoint::CountriesInfo
            | Endpoint::CountriesPop
            | Endpoint::AveragePop => vec![name, String::new()],
            Endpoint::UpdateCountry { id } | Endpoint::DeleteCountry { id } => {
                vec![name, id.to_string()]
            }
            Endpoint::CountryByName { name: country } => vec![name, country.to_string()],
            Endpoint::CustomAggregation { query }
            | Endpoint::CustomFind { query }
            | Endpoint::CustomDistinct { query } => vec![name, query.to_string()],
            Endpoint::CountriesDensity { min, max } | Endpoint::CountriesArea { min, max } => {
                vec![name, format_path_float(min), format_path_float(max)]
            }
            Endpoint::MostPopulated { year }
            | Endpoint::LeastPopulated { year }
            | Endpoint::CountAboveAverage { year }
            | Endpoint::CountBelowAverage { year } => vec![name, year.to_string()],
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::InsertCountry => "Error inserting data.",
            Endpoint::UpdateCountry { .. } => "Error updating data.",
            Endpoint::DeleteCountry { .. } => "Error deleting data.",
            Endpoint::CountryByName { .. } => "Country not found.",
            Endpoint::CustomAggregation { .. }
            | Endpoint::CustomFind { .. }
            | Endpoint::CustomDistinct { .. } => "Error executing query.",
            _ => "Error retrieving data.",
        }
    }
}

/// Floats keep a fractional digit in paths (`0.0`, `10.5`), as the API's
/// float routes expect.
pub fn format_path_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Internal failure of one call. Never returned to callers: it is logged
/// and collapsed into `None`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("base URL {0} cannot carry a path")]
    InvalidBaseUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("cannot decode response: {0}")]
    Decode(String),
}

/// Remote population API as seen by the pages.
///
/// Every operation returns `None` as its only failure signal.
pub trait PopulationApi: Send + Sync {
    /// POST `/insert_country/`; returns the API acknowledgement.
    fn insert_country(&self, country: &Country) -> impl Future<Output = Option<Value>> + Send;

    /// PUT `/update_country/{id}`; returns the API acknowledgement.
    fn update_country(
        &self,
        id: &str,
        country: &Country,
    ) -> impl Future<Output = Option<Value>> + Send;

    /// DELETE `/delete_country/{id}`; returns the API acknowledgement.
    fn delete_country(&self, id: &str) -> impl Future<Output = Option<Value>> + Send;

    /// GET `/countries_info/` with the numeric columns coerced to floats.
    fn countries(&self) -> impl Future<Output = Option<Table>> + Send;

    fn countries_by_density(&self, min: f64, max: f64) -> impl Future<Output = Option<Table>> + Send;

    fn most_populated(&self, year: PopulationYear) -> impl Future<Output = Option<Table>> + Send;

    fn least_populated(&self, year: PopulationYear) -> impl Future<Output = Option<Table>> + Send;

    /// GET `/countries_pop/`: names and population series 1980 to 2050.
    fn countries_population(&self) -> impl Future<Output = Option<Table>> + Send;

    fn country_by_name(&self, name: &str) -> impl Future<Output = Option<Table>> + Send;

    /// GET `/average_pop/`: world average population per year.
    fn world_average(&self) -> impl Future<Output = Option<Table>> + Send;

    fn countries_by_area(&self, min: f64, max: f64) -> impl Future<Output = Option<Table>> + Send;

    fn custom_aggregation(&self, query: &str) -> impl Future<Output = Option<Table>> + Send;

    fn custom_find(&self, query: &str) -> impl Future<Output = Option<Table>> + Send;

    fn custom_distinct(&self, query: &str) -> impl Future<Output = Option<Table>> + Send;

    /// GET `/nb_countries_supavg/{year}`; the keyed summary is returned as-is.
    fn count_above_average(&self, year: PopulationYear) -> impl Future<Output = Option<Value>> + Send;

    /// GET `/nb_countries_infavg/{year}`; the keyed summary is returned as-is.
    fn count_below_average(&self, year: PopulationYear) -> impl Future<Output = Option<Value>> + Send;
}

/// reqwest-backed [`PopulationApi`].
#[derive(Clone)]
pub struct HttpPopulationApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpPopulationApi {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry a path: {}", base_url);
        }
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of an endpoint; path parameters are percent-encoded segments.
    pub fn url(&self, endpoint: &Endpoint<'_>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }

    async fn send(&self, endpoint: Endpoint<'_>, body: Option<&Country>) -> Result<Value, ApiError> {
        let url = self.url(&endpoint)?;
        debug!(method = %endpoint.method(), url = %url, "Calling population API");

        let mut request = self.client.request(endpoint.method(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ApiError::Status(status));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_value(&self, endpoint: Endpoint<'_>, body: Option<&Country>) -> Option<Value> {
        match self.send(endpoint, body).await {
            Ok(value) => Some(value),
            Err(e) => {
                error!(endpoint = endpoint.name(), error = %e, "{}", endpoint.failure_message());
                None
            }
        }
    }

    async fn fetch_table(&self, endpoint: Endpoint<'_>) -> Option<Table> {
        let value = self.fetch_value(endpoint, None).await?;
        match Table::from_json(value) {
            Ok(table) => Some(table),
            Err(e) => {
                error!(endpoint = endpoint.name(), error = %e, "{}", endpoint.failure_message());
                None
            }
        }
    }
}

impl PopulationApi for HttpPopulationApi {
    async fn insert_country(&self, country: &Country) -> Option<Value> {
        self.fetch_value(Endpoint::InsertCountry, Some(country)).await
    }

    async fn update_country(&self, id: &str, country: &Country) -> Option<Value> {
        self.fetch_value(Endpoint::UpdateCountry { id }, Some(country))
            .await
    }

    async fn delete_country(&self, id: &str) -> Option<Value> {
        self.fetch_value(Endpoint::DeleteCountry { id }, None).await
    }

    async fn countries(&self) -> Option<Table> {
        let endpoint = Endpoint::CountriesInfo;
        let mut table = self.fetch_table(endpoint).await?;
        for column in FLOAT_COLUMNS {
            if let Err(e) = table.coerce_float(column) {
                error!(endpoint = endpoint.name(), error = %e, "{}", endpoint.failure_message());
                return None;
            }
        }
        Some(table)
    }

    async fn countries_by_density(&self, min: f64, max: f64) -> Option<Table> {
        self.fetch_table(Endpoint::CountriesDensity { min, max }).await
    }

    async fn most_populated(&self, year: PopulationYear) -> Option<Table> {
        self.fetch_table(Endpoint::MostPopulated { year }).await
    }

    async fn least_populated(&self, year: PopulationYear) -> Option<Table> {
        self.fetch_table(Endpoint::LeastPopulated { year }).await
    }

    async fn countries_population(&self) -> Option<Table> {
        self.fetch_table(Endpoint::CountriesPop).await
    }

    async fn country_by_name(&self, name: &str) -> Option<Table> {
        self.fetch_table(Endpoint::CountryByName { name }).await
    }

    async fn world_average(&self) -> Option<Table> {
        self.fetch_table(Endpoint::AveragePop).await
    }

    async fn countries_by_area(&self, min: f64, max: f64) -> Option<Table> {
        self.fetch_table(Endpoint::CountriesArea { min, max }).await
    }

    async fn custom_aggregation(&self, query: &str) -> Option<Table> {
        self.fetch_table(Endpoint::CustomAggregation { query }).await
    }

    async fn custom_find(&self, query: &str) -> Option<Table> {
        self.fetch_table(Endpoint::CustomFind { query }).await
    }

    async fn custom_distinct(&self, query: &str) -> Option<Table> {
        self.fetch_table(Endpoint::CustomDistinct { query }).await
    }

    async fn count_above_average(&self, year: PopulationYear) -> Option<Value> {
        self.fetch_value(Endpoint::CountAboveAverage { year }, None)
            .await
    }

    async fn count_below_average(&self, year: PopulationYear) -> Option<Value> {
        self.fetch_value(Endpoint::CountBelowAverage { year }, None)
            .await
    }
}
