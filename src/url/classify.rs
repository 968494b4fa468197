use crate::state::UrlKind;
use url::Url;

/// Path suffixes that mark a location as another sitemap
const SITEMAP_SUFFIXES: &[&str] = &[".xml", ".smap"];

/// Classifies a sitemap location as a nested sitemap or a content page
///
/// A location is a sitemap when its path ends in `.xml` or `.smap`
/// (ASCII case-insensitive). Query strings and fragments are ignored.
/// Locations that do not parse as URLs are judged on the raw string with
/// any `?` or `#` suffix removed, so the function is total.
///
/// # Examples
///
/// ```
/// use sumi_sift::state::UrlKind;
/// use sumi_sift::url::classify;
///
/// assert_eq!(classify("http://x/sitemap_2.xml"), UrlKind::Sitemap);
/// assert_eq!(classify("http://x/products/widget"), UrlKind::Page);
/// ```
pub fn classify(location: &str) -> UrlKind {
    let location = location.trim();

    let path = match Url::parse(location) {
        Ok(url) => url.path().to_string(),
        Err(_) => {
            let end = location.find(['?', '#']).unwrap_or(location.len());
            location[..end].to_string()
        }
    };

    if has_sitemap_suffix(&path) {
        UrlKind::Sitemap
    } else {
        UrlKind::Page
    }
}

fn has_sitemap_suffix(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    SITEMAP_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}
