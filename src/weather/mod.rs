//! Weather module
//!
//! Scrapes METAR / TAF text out of a public weather page:
//! - Proxy fetch of the page HTML
//! - TAF block segmentation and change-group classification
//! - Gust extraction from wind groups
//! - Active forecast period selection

use serde::{Deserialize, Serialize};

pub mod active;
pub mod client;
pub mod gust;
pub mod metar;
pub mod taf;

pub use active::select_active;
pub use client::WeatherClient;
pub use gust::{extract_gust, extract_gust_factor};
pub use metar::extract_metar;
pub use taf::{TafEntry, TafEntryKind, parse_forecast};

/// Everything extracted from one weather page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub station: String,
    pub metar: Option<String>,
    pub metar_gust: Option<u32>,
    pub taf: Vec<TafEntry>,
}

impl WeatherReport {
    /// Gust factor from the METAR wind group, if it reports a gust
    #[must_use]
    pub fn metar_gust_factor(&self) -> Option<u32> {
        self.metar.as_deref().and_then(extract_gust_factor)
    }
}

/// Extract METAR and TAF for `station` from a scraped page.
#[must_use]
pub fn parse_report(raw_html: &str, station: &str) -> WeatherReport {
    let metar = extract_metar(raw_html, station);
    let metar_gust = metar.as_deref().and_then(extract_gust);
    WeatherReport {
        station: station.to_string(),
        metar,
        metar_gust,
        taf: parse_forecast(raw_html, station),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report() {
        let page = "<b>TAF: KMIE</b> 121130Z 1212/1312 18012KT FM121800 20015G22KT \
                    METAR KMIE 121654Z 18015G25KT 10SM CLR";
        let report = parse_report(page, "KMIE");
        assert_eq!(report.metar.as_deref(), Some("KMIE 121654Z 18015G25KT 10SM CLR"));
        assert_eq!(report.metar_gust, Some(25));
        assert_eq!(report.metar_gust_factor(), Some(10));
        assert_eq!(report.taf.len(), 2);
    }

    #[test]
    fn test_parse_report_empty_page() {
        let report = parse_report("<html></html>", "KMIE");
        assert!(report.metar.is_none());
        assert!(report.metar_gust.is_none());
        assert!(report.metar_gust_factor().is_none());
        assert!(report.taf.is_empty());
    }
}
