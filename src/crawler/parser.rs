//! Sitemap parser for extracting location entries
//!
//! Sitemaps and sitemap indexes list their entries in `<loc>` elements. This
//! module extracts those entries in document order:
//! - Well-formed XML is read with quick-xml, namespace-agnostic
//! - Malformed XML falls back to a plain `<loc>…</loc>` text scan
//!
//! Parsing never fails; unusable content simply yields no locations.

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::OnceLock;

/// Extracts every location listed in a sitemap body
///
/// # Arguments
///
/// * `raw` - The raw response body
///
/// # Returns
///
/// The trimmed, non-empty location strings in document order
///
/// # Example
///
/// ```
/// use sumi_sift::crawler::parse_sitemap;
///
/// let xml = br#"<?xml version="1.0"?>
/// <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/a</loc></url>
///   <url><loc>https://example.com/b</loc></url>
/// </urlset>"#;
///
/// assert_eq!(
///     parse_sitemap(xml),
///     vec!["https://example.com/a", "https://example.com/b"]
/// );
/// ```
pub fn parse_sitemap(raw: &[u8]) -> Vec<String> {
    match parse_xml(raw) {
        Ok(locations) => locations,
        Err(reason) => {
            tracing::debug!("Malformed sitemap ({}), using fallback scan", reason);
            scan_locations(raw)
        }
    }
}

/// Strict XML pass; any well-formedness problem aborts it
fn parse_xml(raw: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut locations = Vec::new();
    let mut depth: usize = 0;
    let mut loc_depth: Option<usize> = None;
    let mut current = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                if loc_depth.is_none() && is_loc(e.local_name().as_ref()) {
                    loc_depth = Some(depth);
                    current.clear();
                }
            }
            Ok(Event::End(ref e)) => {
                if loc_depth == Some(depth) && is_loc(e.local_name().as_ref()) {
                    let location = current.trim();
                    if !location.is_empty() {
                        locations.push(location.to_string());
                    }
                    loc_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(ref e)) => {
                if loc_depth.is_some() {
                    let text = e.unescape().map_err(|err| err.to_string())?;
                    current.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if loc_depth.is_some() {
                    current.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.to_string()),
            _ => {}
        }
        buf.clear();
    }

    if depth > 0 {
        return Err(format!("{} unclosed element(s) at end of input", depth));
    }

    Ok(locations)
}

fn is_loc(local_name: &[u8]) -> bool {
    local_name.ends_with(b"loc")
}

/// Lenient pass over arbitrary bytes
fn scan_locations(raw: &[u8]) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"<loc>(.*?)</loc>").expect("loc regex is valid"));

    let text = String::from_utf8_lossy(raw);
    re.captures_iter(&text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
