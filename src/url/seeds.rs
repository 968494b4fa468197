use crate::config::DiscoveryConfig;
use crate::{UrlError, UrlResult};
use url::Url;

/// Builds the seed sitemap URLs for a site
///
/// Each conventional path is resolved against the base URL with standard
/// relative-reference rules, then any explicit seeds are appended.
/// Duplicates are dropped, keeping the first occurrence.
///
/// # Examples
///
/// ```
/// use sumi_sift::url::build_seed_urls;
///
/// let seeds = build_seed_urls(
///     "https://www.example.com/",
///     &["sitemap.xml".to_string(), "sitemaps/sitemap.xml".to_string()],
///     &[],
/// )
/// .unwrap();
///
/// assert_eq!(seeds, vec![
///     "https://www.example.com/sitemap.xml",
///     "https://www.example.com/sitemaps/sitemap.xml",
/// ]);
/// ```
pub fn build_seed_urls(
    base_url: &str,
    seed_paths: &[String],
    extra_seeds: &[String],
) -> UrlResult<Vec<String>> {
    let base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(UrlError::InvalidScheme(base.scheme().to_string()));
    }

    let mut seeds: Vec<String> = Vec::with_capacity(seed_paths.len() + extra_seeds.len());

    for path in seed_paths {
        let joined = base.join(path.trim()).map_err(|e| UrlError::Seed {
            base: base_url.to_string(),
            path: path.clone(),
            message: e.to_string(),
        })?;
        push_unique(&mut seeds, joined.to_string());
    }

    for seed in extra_seeds {
        let parsed = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        push_unique(&mut seeds, parsed.to_string());
    }

    Ok(seeds)
}

/// Builds seeds straight from the discovery section of the configuration
pub fn seeds_from_config(config: &DiscoveryConfig) -> UrlResult<Vec<String>> {
    build_seed_urls(&config.base_url, &config.seed_paths, &config.seeds)
}

fn push_unique(seeds: &mut Vec<String>, url: String) {
    if !seeds.contains(&url) {
        seeds.push(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conventional_paths() -> Vec<String> {
        vec![
            "sitemap.xml".to_string(),
            "sitemap_index.xml".to_string(),
            "sitemaps/sitemap.xml".to_string(),
        ]
    }

    #[test]
    fn test_conventional_seeds() {
        let seeds = build_seed_urls("https://www.example.com", &conventional_paths(), &[]).unwrap();

        assert_eq!(
            seeds,
            vec![
                "https://www.example.com/sitemap.xml",
                "https://www.example.com/sitemap_index.xml",
                "https://www.example.com/sitemaps/sitemap.xml",
            ]
        );
    }

    #[test]
    fn test_relative_join_follows_base_directory() {
        // Without a trailing slash the last segment is replaced
        let seeds =
            build_seed_urls("https://example.com/blog", &["sitemap.xml".to_string()], &[]).unwrap();
        assert_eq!(seeds, vec!["https://example.com/sitemap.xml"]);

        let seeds =
            build_seed_urls("https://example.com/blog/", &["sitemap.xml".to_string()], &[]).unwrap();
        assert_eq!(seeds, vec!["https://example.com/blog/sitemap.xml"]);
    }

    #[test]
    fn test_extra_seeds_appended_without_duplicates() {
        let seeds = build_seed_urls(
            "https://example.com/",
            &["sitemap.xml".to_string()],
            &[
                "https://example.com/sitemap.xml".to_string(),
                "https://cdn.example.com/news.xml".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(
            seeds,
            vec![
                "https://example.com/sitemap.xml",
                "https://cdn.example.com/news.xml",
            ]
        );
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(
            build_seed_urls("not a url", &conventional_paths(), &[]),
            Err(UrlError::Parse(_))
        ));
        assert!(matches!(
            build_seed_urls("mailto:someone@example.com", &conventional_paths(), &[]),
            Err(UrlError::InvalidScheme(_))
        ));
    }
}
