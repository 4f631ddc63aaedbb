use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use super::{WeatherReport, parse_report};
use crate::config::WeatherConfig;
use crate::{AppError, Result};

/// Fetches weather pages through a CORS proxy
pub struct WeatherClient {
    client: Client,
    proxy_url: String,
    source_url: String,
}

/// JSON envelope returned by the proxy
#[derive(Debug, Deserialize)]
pub struct ProxyEnvelope {
    pub contents: Option<String>,
}

/// Trim and upper-case a station code
pub fn normalize_station(station: &str) -> Result<String> {
    let station = station.trim().to_ascii_uppercase();
    if station.is_empty() {
        return Err(AppError::validation("Station code cannot be empty"));
    }
    if !station.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::validation(format!(
            "Station code '{station}' must be alphanumeric"
        )));
    }
    Ok(station)
}

impl WeatherClient {
    /// Create a new client
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(concat!("approachspeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::api(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            proxy_url: config.proxy_url.clone(),
            source_url: config.source_url.clone(),
        })
    }

    /// Proxy URL for the weather page of `station`
    #[must_use]
    pub fn request_url(&self, station: &str) -> String {
        let target = self.source_url.replace("{station}", station);
        format!("{}{}", self.proxy_url, urlencoding::encode(&target))
    }

    /// Raw page HTML for `station`
    pub async fn fetch_page(&self, station: &str) -> Result<String> {
        let station = normalize_station(station)?;
        let url = self.request_url(&station);
        info!("Fetching weather page for {} via {}", station, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::api(format!("Weather proxy request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Weather proxy returned {}", status);
            return Err(AppError::api_status(
                status.as_u16(),
                format!("Weather proxy returned {status}"),
            ));
        }

        let envelope: ProxyEnvelope = response
            .json()
            .await
            .map_err(|e| AppError::api(format!("Failed to parse proxy response: {e}")))?;

        envelope
            .contents
            .ok_or_else(|| AppError::api("Proxy response has no contents"))
    }

    /// METAR and TAF for `station`
    pub async fn fetch_report(&self, station: &str) -> Result<WeatherReport> {
        let station = normalize_station(station)?;
        let page = self.fetch_page(&station).await?;
        let report = parse_report(&page, &station);
        info!(
            "Weather for {}: METAR {}, {} TAF entries",
            station,
            if report.metar.is_some() { "found" } else { "missing" },
            report.taf.len()
        );
        Ok(report)
    }
}
