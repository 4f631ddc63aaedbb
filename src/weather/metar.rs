//! METAR line extraction from scraped weather pages

use regex::Regex;
use tracing::debug;

use super::taf::normalize_html;

/// Text that ends a METAR report on the source page
const REPORT_TERMINATORS: [&str; 5] = ["TAF", "METAR", "OBSERVATION", "Copyright", "Key to Decoding"];

/// Raw METAR report for `station`, e.g. `KMIE 121654Z 18015G25KT 10SM CLR 22/12 A3001`.
///
/// The TAF issue line has the same `<station> ddhhmmZ` shape, so matches
/// directly preceded by `TAF` are skipped.
#[must_use]
pub fn extract_metar(raw_html: &str, station: &str) -> Option<String> {
    if station.is_empty() {
        return None;
    }
    let text = normalize_html(raw_html);
    let pattern = Regex::new(&format!(r"{} [0-9]{{6}}Z", regex::escape(station))).ok()?;

    let start = pattern
        .find_iter(&text)
        .map(|m| m.start())
        .find(|&start| {
            let before = text[..start].trim_end();
            !(before.ends_with("TAF") || before.ends_with("TAF:"))
        })?;

    let report = &text[start..];
    let body_start = station.len();
    let end = REPORT_TERMINATORS
        .iter()
        .filter_map(|terminator| report[body_start..].find(terminator))
        .min()
        .map_or(report.len(), |index| index + body_start);

    let metar = report[..end].trim().to_string();
    debug!(station, metar = %metar, "found METAR");
    Some(metar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_metar_after_taf() {
        let page = "<b>TAF: KMIE</b> 121130Z 1212/1312 18012KT FM121800 20015G22KT \
                    <h3>METAR</h3> KMIE 121654Z 18015G25KT 10SM CLR 22/12 A3001 <p>Copyright</p>";
        assert_eq!(
            extract_metar(page, "KMIE").as_deref(),
            Some("KMIE 121654Z 18015G25KT 10SM CLR 22/12 A3001")
        );
    }

    #[test]
    fn test_extract_metar_before_taf() {
        let page = "<pre>KIND 121654Z 19012KT 10SM FEW250 27/14 A3002</pre>\
                    <pre>TAF KIND 121720Z 1218/1324 19012KT</pre>";
        assert_eq!(
            extract_metar(page, "KIND").as_deref(),
            Some("KIND 121654Z 19012KT 10SM FEW250 27/14 A3002")
        );
    }

    #[test]
    fn test_no_metar() {
        assert!(extract_metar("<b>TAF: KMIE</b> 121130Z 1212/1312", "KMIE").is_none());
        assert!(extract_metar("nothing here", "KMIE").is_none());
        assert!(extract_metar("KMIE 121654Z 18015KT", "").is_none());
    }
}
