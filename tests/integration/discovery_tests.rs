//! Integration tests for sitemap discovery
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! discovery cycle end-to-end against a file-backed ledger.

use std::path::Path;
use std::time::Duration;
use sumi_sift::config::{
    Config, DiscoveryConfig, OutputConfig, RetrievalConfig, UserAgentConfig,
};
use sumi_sift::crawler::Coordinator;
use sumi_sift::output::generate_summary;
use sumi_sift::storage::{Ledger, PageTextStore, RunStatus, RunStore, SqliteStorage};
use sumi_sift::UrlKind;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at the mock server
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        discovery: DiscoveryConfig {
            base_url: format!("{}/", base_url),
            seed_paths: vec![
                "sitemap.xml".to_string(),
                "sitemap_index.xml".to_string(),
                "sitemaps/sitemap.xml".to_string(),
            ],
            seeds: vec![],
            max_concurrent_fetches: 4,
            fetch_timeout_ms: 2_000,
            max_depth: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().to_string(),
            summary_path: db_path.with_extension("md").to_string_lossy().to_string(),
        },
        retrieval: RetrievalConfig::default(),
    }
}

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("  <url><loc>{}</loc></url>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        entries
    )
}

fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("  <sitemap><loc>{}</loc></sitemap>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>",
        entries
    )
}

async fn mount_xml(server: &MockServer, route: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_discovery_and_rerun() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sift.db");

    // The seed index is fetched once per run; the branches only on the first
    mount_xml(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/posts.xml", base), format!("{}/pages.xml", base)]),
        2,
    )
    .await;
    mount_xml(
        &server,
        "/posts.xml",
        sitemap_index(&[format!("{}/posts-2024.xml", base)]),
        1,
    )
    .await;
    mount_xml(
        &server,
        "/posts-2024.xml",
        urlset(&[format!("{}/blog/one", base), format!("{}/blog/two", base)]),
        1,
    )
    .await;
    mount_xml(
        &server,
        "/pages.xml",
        urlset(&[format!("{}/about", base), format!("{}/blog/one", base)]),
        1,
    )
    .await;

    let config = create_test_config(&base, &db_path);

    let first = {
        let mut coordinator =
            Coordinator::new(config.clone(), "hash-1").expect("Failed to create coordinator");
        let report = coordinator
            .run(CancellationToken::new())
            .await
            .expect("Discovery failed");

        let run = coordinator.storage().get_run(coordinator.run_id()).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        report
    };

    assert_eq!(
        first.pages,
        vec![
            format!("{}/about", base),
            format!("{}/blog/one", base),
            format!("{}/blog/two", base),
        ]
    );
    assert!(!first.cancelled);
    // sitemap_index.xml and sitemaps/sitemap.xml are 404 on this site
    assert_eq!(first.stats.failed_fetches, 2);
    assert_eq!(first.stats.sitemaps_fetched, 4);

    {
        let storage = SqliteStorage::new(&db_path).unwrap();
        assert_eq!(storage.count_by_kind(UrlKind::Page).unwrap(), 3);
        assert_eq!(storage.count_by_kind(UrlKind::Sitemap).unwrap(), 3);

        let level = |url: String| storage.get(&url).unwrap().unwrap().level;
        assert_eq!(level(format!("{}/posts.xml", base)), 0);
        assert_eq!(level(format!("{}/posts-2024.xml", base)), 1);
        assert_eq!(level(format!("{}/blog/two", base)), 2);
        assert_eq!(level(format!("{}/about", base)), 1);
    }

    let mut coordinator = Coordinator::new(config, "hash-1").expect("Failed to create coordinator");
    let second = coordinator
        .run(CancellationToken::new())
        .await
        .expect("Second discovery failed");

    assert_eq!(second.pages, first.pages);
    assert_eq!(second.stats.inserted, 0);
    assert_eq!(second.stats.replayed, 3);

    let summary = generate_summary(coordinator.storage()).unwrap();
    assert_eq!(summary.total_urls, 6);
    assert_eq!(summary.first_level_sitemaps.len(), 2);
    assert_eq!(summary.nested_sitemaps, vec![format!("{}/posts-2024.xml", base)]);
}

#[tokio::test]
async fn test_malformed_sitemap_over_http() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sift.db");

    mount_xml(
        &server,
        "/sitemap.xml",
        format!(
            "<urlset><loc>{0}/a</loc><broken><loc>{0}/b</loc></urlset>",
            base
        ),
        1,
    )
    .await;

    let mut coordinator =
        Coordinator::new(create_test_config(&base, &db_path), "hash").unwrap();
    let report = coordinator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(report.pages, vec![format!("{}/a", base), format!("{}/b", base)]);
}

#[tokio::test]
async fn test_slow_branch_times_out() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sift.db");

    mount_xml(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/fast.xml", base), format!("{}/slow.xml", base)]),
        1,
    )
    .await;
    mount_xml(
        &server,
        "/fast.xml",
        urlset(&[format!("{}/one", base), format!("{}/two", base)]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(urlset(&[format!("{}/never", base)]))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config(&base, &db_path);
    config.discovery.fetch_timeout_ms = 300;

    let mut coordinator = Coordinator::new(config, "hash").unwrap();
    let report = coordinator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(report.pages, vec![format!("{}/one", base), format!("{}/two", base)]);
    assert!(report
        .sitemaps_visited
        .contains(&format!("{}/slow.xml", base)));
    assert!(!coordinator
        .storage()
        .is_expanded(&format!("{}/slow.xml", base))
        .unwrap());
}

#[tokio::test]
async fn test_cancelled_run_is_interrupted() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sift.db");

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(urlset(&[format!("{}/late", base)]))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config(&base, &db_path);
    config.discovery.fetch_timeout_ms = 60_000;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let mut coordinator = Coordinator::new(config, "hash").unwrap();
    let report = coordinator.run(cancel).await.unwrap();

    assert!(report.cancelled);
    assert!(report.pages.is_empty());

    let run = coordinator.storage().get_run(coordinator.run_id()).unwrap();
    assert_eq!(run.status, RunStatus::Interrupted);
}

#[tokio::test]
async fn test_retrieve_page_text() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sift.db");

    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/guide", base), format!("{}/gone", base)]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    "<html><head><title>Guide</title></head><body>\
                     <header>Logo</header><h1>Install</h1><p>Run the installer.</p>\
                     <footer>Legal</footer></body></html>",
                )
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let mut coordinator =
        Coordinator::new(create_test_config(&base, &db_path), "hash").unwrap();
    let report = coordinator.run(CancellationToken::new()).await.unwrap();
    assert_eq!(report.pages.len(), 2);

    let retrieval = coordinator
        .retrieve(&report.pages, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(retrieval.retrieved, 1);
    assert_eq!(retrieval.failed, 1);

    let stored = coordinator
        .storage()
        .get_page_text(&format!("{}/guide", base))
        .unwrap()
        .unwrap();
    assert_eq!(stored.text, "Guide\nInstall\nRun the installer.");
}

#[tokio::test]
async fn test_unopenable_store_is_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("missing").join("nested").join("sift.db");

    let result = Coordinator::new(create_test_config(&server.uri(), &db_path), "hash");

    assert!(result.is_err());
}
