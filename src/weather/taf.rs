//! TAF extraction from scraped weather pages
//!
//! This is best-effort text scraping, not a TAF grammar: the page is flattened
//! to text, the forecast block is located by marker strings, and change groups
//! are split and classified by prefix. Unexpected input yields fewer entries or
//! entries without timestamps, never an error.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gust::extract_gust;

/// Text that ends the forecast block on the source page
const BLOCK_TERMINATORS: [&str; 4] = ["METAR", "OBSERVATION", "Copyright", "Key to Decoding"];

/// Terminators closer than this to the block start are part of the start marker
const TERMINATOR_SEARCH_OFFSET: usize = 10;

/// Lines this short are page noise
const MIN_LINE_CHARS: usize = 6;

/// Kind of a forecast line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TafEntryKind {
    /// `TAF <station> ...` line
    Header,
    /// Base period or any unrecognized group
    Base,
    /// `FMddhhmm`
    Fm,
    /// `TEMPO ddhh/ddhh`
    Tempo,
    /// `BECMG ddhh/ddhh`
    Becmg,
}

impl fmt::Display for TafEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TafEntryKind::Header => "HEADER",
            TafEntryKind::Base => "BASE",
            TafEntryKind::Fm => "FM",
            TafEntryKind::Tempo => "TEMPO",
            TafEntryKind::Becmg => "BECMG",
        };
        f.write_str(name)
    }
}

/// One forecast line in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TafEntry {
    pub raw_text: String,
    pub kind: TafEntryKind,
    /// Day of month the group starts
    pub day: Option<u8>,
    /// UTC hour the group starts
    pub hour: Option<u8>,
    /// Gust in knots
    pub gust: Option<u32>,
}

impl fmt::Display for TafEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6}", self.kind.to_string())?;
        match (self.day, self.hour) {
            (Some(day), Some(hour)) => write!(f, " {day:02}/{hour:02}Z")?,
            _ => write!(f, "       ")?,
        }
        write!(f, "  {}", self.raw_text)?;
        if let Some(gust) = self.gust {
            write!(f, "  [gust {gust} kt]")?;
        }
        Ok(())
    }
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// `FMddhhmm` or `BECMG ddhh/ddhh`, used when no `TAF <station>` header exists
fn block_start_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"FM[0-9]{6}|BECMG [0-9]{4}/[0-9]{4}").unwrap())
}

fn change_group_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"FM[0-9]{6}|BECMG [0-9]{4}/[0-9]{4}|TEMPO [0-9]{4}/[0-9]{4}|PROB[0-9]{2} [0-9]{4}/[0-9]{4}",
        )
        .unwrap()
    })
}

/// Replace markup tags with spaces and collapse whitespace runs.
///
/// Entities such as `&nbsp;` are left as they are.
#[must_use]
pub fn normalize_html(raw_html: &str) -> String {
    let without_tags = tag_pattern().replace_all(raw_html, " ");
    whitespace_pattern().replace_all(&without_tags, " ").into_owned()
}

fn locate_block<'a>(text: &'a str, station: &str) -> Option<&'a str> {
    let start = text
        .find(&format!("TAF: {station}"))
        .or_else(|| text.find(&format!("TAF {station}")))
        .or_else(|| block_start_pattern().find(text).map(|m| m.start()))?;
    let block = &text[start..];

    let end = BLOCK_TERMINATORS
        .iter()
        .filter_map(|terminator| {
            block
                .match_indices(terminator)
                .map(|(index, _)| index)
                .find(|index| *index >= TERMINATOR_SEARCH_OFFSET)
        })
        .min()
        .unwrap_or(block.len());

    Some(&block[..end])
}

fn positional_number(line: &str, start: usize) -> Option<u8> {
    line.get(start..start + 2)?.parse().ok()
}

fn classify(line: &str, index: usize) -> (TafEntryKind, Option<u8>, Option<u8>) {
    if line.starts_with("FM") {
        (TafEntryKind::Fm, positional_number(line, 2), positional_number(line, 4))
    } else if line.starts_with("TEMPO") {
        (TafEntryKind::Tempo, positional_number(line, 6), positional_number(line, 8))
    } else if line.starts_with("BECMG") {
        (TafEntryKind::Becmg, positional_number(line, 6), positional_number(line, 8))
    } else if line.starts_with("TAF") || index == 0 {
        (TafEntryKind::Header, None, None)
    } else {
        (TafEntryKind::Base, None, None)
    }
}

/// Extract the TAF for `station` from a scraped weather page.
///
/// Returns an empty vector when the page holds no recognizable forecast.
#[must_use]
pub fn parse_forecast(raw_html: &str, station: &str) -> Vec<TafEntry> {
    let text = normalize_html(raw_html);
    let Some(block) = locate_block(&text, station) else {
        debug!(station, "no TAF block found");
        return Vec::new();
    };

    let split = change_group_pattern().replace_all(block, "\n${0}");
    let entries: Vec<TafEntry> = split
        .split('\n')
        .map(str::trim)
        .filter(|line| line.chars().count() >= MIN_LINE_CHARS)
        .enumerate()
        .map(|(index, line)| {
            let (kind, day, hour) = classify(line, index);
            TafEntry {
                raw_text: line.to_string(),
                kind,
                day,
                hour,
                gust: extract_gust(line),
            }
        })
        .collect();

    debug!(station, entries = entries.len(), "parsed TAF");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE_PAGE: &str = "<b>TAF: KMIE</b> 121130Z 1212/1312 18012KT FM121800 20015G22KT \
         BECMG 1300/1302 22010KT METAR KMIE 121654Z 18015G25KT";

    #[test]
    fn test_parse_sample_page() {
        let entries = parse_forecast(SAMPLE_PAGE, "KMIE");
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].kind, TafEntryKind::Header);
        assert!(entries[0].raw_text.contains("121130Z 1212/1312 18012KT"));
        assert_eq!(entries[0].gust, None);

        assert_eq!(entries[1].kind, TafEntryKind::Fm);
        assert_eq!(entries[1].day, Some(12));
        assert_eq!(entries[1].hour, Some(18));
        assert_eq!(entries[1].gust, Some(22));

        assert_eq!(entries[2].kind, TafEntryKind::Becmg);
        assert_eq!(entries[2].day, Some(13));
        assert_eq!(entries[2].hour, Some(0));
        assert_eq!(entries[2].gust, None);

        assert!(entries.iter().all(|e| !e.raw_text.contains("METAR")));
        assert!(entries.iter().all(|e| !e.raw_text.contains("121654Z")));
    }

    #[test]
    fn test_parse_is_repeatable() {
        assert_eq!(
            parse_forecast(SAMPLE_PAGE, "KMIE"),
            parse_forecast(SAMPLE_PAGE, "KMIE")
        );
    }

    #[rstest]
    #[case("<html><body>No forecast available for this station.</body></html>")]
    #[case("")]
    #[case("<p>METAR KMIE 121654Z 18015KT 10SM CLR</p>")]
    fn test_no_forecast_yields_empty(#[case] page: &str) {
        assert!(parse_forecast(page, "KMIE").is_empty());
    }

    #[test]
    fn test_station_without_colon_and_tempo_prob_groups() {
        let page = "<pre>TAF KIND 121720Z 1218/1324 19012KT P6SM SCT050\n\
                    TEMPO 1220/1224 VRB10G20KT\n\
                    PROB30 1302/1306 -TSRA\n\
                    FM130600 22015G28KT</pre><p>Copyright 2024</p>";
        let entries = parse_forecast(page, "KIND");
        let kinds: Vec<TafEntryKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TafEntryKind::Header,
                TafEntryKind::Tempo,
                TafEntryKind::Base,
                TafEntryKind::Fm
            ]
        );
        assert_eq!((entries[1].day, entries[1].hour), (Some(12), Some(20)));
        assert_eq!(entries[1].gust, Some(20));
        assert_eq!(entries[2].day, None);
        assert_eq!((entries[3].day, entries[3].hour), (Some(13), Some(6)));
        assert!(!entries[3].raw_text.contains("Copyright"));
    }

    #[test]
    fn test_fallback_start_marker() {
        let page = "<div>forecast: FM121800 20015G22KT P6SM FM130000 24010KT</div>";
        let entries = parse_forecast(page, "KXYZ");
        assert_eq!(entries.len(), 2);
        // FM prefix takes priority over the first-line header rule
        assert_eq!(entries[0].kind, TafEntryKind::Fm);
        assert_eq!(entries[1].kind, TafEntryKind::Fm);
        assert_eq!(entries[1].day, Some(13));
    }

    #[test]
    fn test_non_ascii_digits_are_not_markers() {
        let arabic_fm = "FM\u{0661}\u{0662}\u{0661}\u{0668}\u{0660}\u{0660}";
        let page = format!("TAF: KMIE 121130Z 1212/1312 18012KT {arabic_fm} 20015KT");
        let entries = parse_forecast(&page, "KMIE");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, TafEntryKind::Header);

        assert!(parse_forecast(&format!("{arabic_fm} 20015KT"), "KXYZ").is_empty());
    }

    #[test]
    fn test_becmg_fallback_start() {
        let page = "BECMG 1300/1302 22010KT";
        let entries = parse_forecast(page, "KXYZ");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, TafEntryKind::Becmg);
    }

    #[test]
    fn test_bare_marker_line_is_kept() {
        let page = "TAF: KMIE 121130Z 1212/1312 18012KT FM121800 FM130000 24010KT";
        let entries = parse_forecast(page, "KMIE");
        // "FM121800" alone is 8 characters and kept
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].raw_text, "FM121800");
    }

    #[test]
    fn test_truncated_positional_fields_become_none() {
        assert_eq!(classify("FM12 garbage", 1), (TafEntryKind::Fm, Some(12), None));
        assert_eq!(classify("TEMPO", 1), (TafEntryKind::Tempo, None, None));
        assert_eq!(classify("BECMG xx00/1302", 1), (TafEntryKind::Becmg, None, Some(0)));
        assert_eq!(classify("SCT050 BKN100", 1), (TafEntryKind::Base, None, None));
        assert_eq!(classify("SCT050 BKN100", 0), (TafEntryKind::Header, None, None));
    }

    #[test]
    fn test_terminator_inside_start_marker_is_ignored() {
        // "METAR" at offset < 10 must not cut the block
        let page = "TAF KMIE METAR-like 1212/1312 18012KT";
        let entries = parse_forecast(page, "KMIE");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].raw_text.ends_with("18012KT"));
    }

    #[test]
    fn test_normalize_html() {
        assert_eq!(
            normalize_html("<p>TAF:\n\t<b>KMIE</b></p>&nbsp;x"),
            " TAF: KMIE &nbsp;x"
        );
    }

    #[test]
    fn test_entry_display() {
        let entries = parse_forecast(SAMPLE_PAGE, "KMIE");
        let line = entries[1].to_string();
        assert!(line.starts_with("FM"));
        assert!(line.contains("12/18Z"));
        assert!(line.contains("[gust 22 kt]"));
    }
}
