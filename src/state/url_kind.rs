/// URL kind and ledger record definitions
///
/// Every URL found in a sitemap is either another sitemap to expand or a
/// content page to collect.
use std::fmt;

/// What a discovered URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UrlKind {
    /// A nested sitemap (or sitemap index) that will be expanded
    Sitemap,

    /// A terminal content page
    Page,
}

impl UrlKind {
    /// Returns true if URLs of this kind are expanded further
    pub fn is_sitemap(&self) -> bool {
        matches!(self, Self::Sitemap)
    }

    /// Converts the kind to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::Page => "page",
        }
    }

    /// Parses a kind from its database string representation
    ///
    /// Returns None if the string doesn't match any known kind.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "sitemap" => Some(Self::Sitemap),
            "page" => Some(Self::Page),
            _ => None,
        }
    }

    /// Returns all kinds, in reporting order
    pub fn all_kinds() -> [Self; 2] {
        [Self::Sitemap, Self::Page]
    }
}

impl fmt::Display for UrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// A URL recorded in the ledger
///
/// Records are append-only: once inserted, no field changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUrl {
    /// Absolute URL, the identity key
    pub url: String,

    /// Sitemap or page, fixed at insertion
    pub kind: UrlKind,

    /// Sitemap nesting depth at which the URL was first recorded
    pub level: u32,

    /// Sitemap whose listing produced this record
    pub parent: Option<String>,

    /// Run that inserted the record
    pub discovered_run: i64,

    /// RFC 3339 insertion time
    pub discovered_at: String,
}

impl DiscoveredUrl {
    /// Creates a record stamped with the current time
    pub fn new(
        url: impl Into<String>,
        kind: UrlKind,
        level: u32,
        parent: Option<&str>,
        discovered_run: i64,
    ) -> Self {
        Self {
            url: url.into(),
            kind,
            level,
            parent: parent.map(str::to_string),
            discovered_run,
            discovered_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_string_roundtrip() {
        for kind in UrlKind::all_kinds() {
            assert_eq!(UrlKind::from_db_string(kind.to_db_string()), Some(kind));
        }
        assert_eq!(UrlKind::from_db_string("index"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(UrlKind::Sitemap.to_string(), "sitemap");
        assert_eq!(UrlKind::Page.to_string(), "page");
    }

    #[test]
    fn test_new_record() {
        let record = DiscoveredUrl::new(
            "https://example.com/a",
            UrlKind::Page,
            2,
            Some("https://example.com/sitemap.xml"),
            7,
        );

        assert_eq!(record.level, 2);
        assert_eq!(record.discovered_run, 7);
        assert_eq!(
            record.parent.as_deref(),
            Some("https://example.com/sitemap.xml")
        );
        assert!(chrono::DateTime::parse_from_rfc3339(&record.discovered_at).is_ok());
    }
}
