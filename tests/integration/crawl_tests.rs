//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! (and a compare run) through the built-in static-HTML renderer.

use site_link_audit::compare::{run_compare, DiffKind};
use site_link_audit::config::{CompareBy, CompareConfig, Config};
use site_link_audit::output::{MarkdownReportWriter, ReportWriter, SqliteReportWriter};
use site_link_audit::{run_crawl, CrawlPhase, FetchStatus, LinkStatus};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration seeded at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::for_start_url(base_url);
    config.crawl.delay_ms = 0;
    config.network.timeout_ms = 2000;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

/// Builds an HTML page whose anchors point at the given hrefs
fn html_page(title: &str, hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href.trim_start_matches('/')))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

async fn mount_page(server: &MockServer, route: &str, title: &str, hrefs: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html_page(title, hrefs), "text/html"))
        .mount(server)
        .await;
}

async fn mount_never_fetched(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html_page("Never", &[]), "text/html"))
        .expect(0)
        .mount(server)
        .await;
}

/// Answers every link resolution HEAD with 200
async fn mount_head_ok(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_depth_zero_crawls_only_the_seed() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", "Home", &["/a", "/b"]).await;
    mount_never_fetched(&server, "/a").await;
    mount_never_fetched(&server, "/b").await;

    let mut config = create_test_config(&server.uri());
    config.crawl.max_depth = 0;
    config.crawl.max_pages = 1;

    let report = run_crawl(config).await.unwrap();

    assert_eq!(report.pages().len(), 1);
    assert_eq!(report.pages()[0].title, "Home");
    assert_eq!(report.pages()[0].fetch_status, FetchStatus::Status(200));
    assert_eq!(report.links().len(), 2);
    assert!(report
        .links()
        .iter()
        .all(|l| l.http_status == LinkStatus::Status(200)));
    assert_eq!(report.run.phase, CrawlPhase::Completed);
}

#[tokio::test]
async fn test_per_page_link_cap() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", "Home", &["/p1", "/p2", "/p3", "/p4", "/p5"]).await;
    for route in ["/p1", "/p2", "/p3"] {
        mount_page(&server, route, route, &[]).await;
    }
    mount_never_fetched(&server, "/p4").await;
    mount_never_fetched(&server, "/p5").await;

    let mut config = create_test_config(&server.uri());
    config.crawl.max_links_per_page = 3;
    config.crawl.max_depth = 1;

    let report = run_crawl(config).await.unwrap();

    let seed_links: Vec<_> = report
        .links()
        .iter()
        .filter(|l| l.source_url == report.pages()[0].url)
        .collect();
    assert_eq!(seed_links.len(), 5);

    let resolved = seed_links
        .iter()
        .filter(|l| l.http_status == LinkStatus::Status(200))
        .count();
    let skipped = seed_links
        .iter()
        .filter(|l| l.http_status == LinkStatus::SkippedPageLimit)
        .count();
    assert_eq!(resolved, 3);
    assert_eq!(skipped, 2);

    // seed plus the three resolved children
    assert_eq!(report.pages().len(), 4);
    assert!(report.pages().iter().all(|p| !p.url.ends_with("/p4")));
    assert_eq!(report.run.phase, CrawlPhase::Exhausted);
}

#[tokio::test]
async fn test_robots_disallowed_page_is_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"))
        .mount(&server)
        .await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", "Home", &["/private", "/public"]).await;
    mount_page(&server, "/public", "Public", &[]).await;
    mount_never_fetched(&server, "/private").await;
    mount_never_fetched(&server, "/private/child").await;

    let mut config = create_test_config(&server.uri());
    config.crawl.max_depth = 3;

    let report = run_crawl(config).await.unwrap();

    let private = report
        .pages()
        .iter()
        .find(|p| p.url.ends_with("/private"))
        .expect("blocked page is still recorded");
    assert_eq!(private.fetch_status, FetchStatus::Blocked);
    assert_eq!(private.link_count, 0);
    assert_eq!(private.final_url, None);

    assert!(report.links().iter().all(|l| !l.source_url.ends_with("/private")));
    assert!(report
        .links()
        .iter()
        .all(|l| !l.raw_href.contains("/private/child")));
    assert_eq!(report.pages().len(), 3);
}

#[tokio::test]
async fn test_link_timeout_records_error_and_continues() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", "Home", &["/slow", "/fast"]).await;

    let mut config = create_test_config(&server.uri());
    config.crawl.max_depth = 0;
    config.network.timeout_ms = 300;

    let report = run_crawl(config).await.unwrap();

    let links = report.links();
    assert_eq!(links.len(), 2);
    assert_eq!(
        links[0].http_status,
        LinkStatus::Error {
            reason: "timeout".to_string()
        }
    );
    assert_eq!(links[0].http_status.to_string(), "ERR");
    assert_eq!(links[1].http_status, LinkStatus::Status(200));
}

#[tokio::test]
async fn test_redirected_link_records_final_url() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new", base_url).as_str()),
        )
        .mount(&server)
        .await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", "Home", &["/old"]).await;

    let mut config = create_test_config(&base_url);
    config.crawl.max_depth = 0;

    let report = run_crawl(config).await.unwrap();

    let link = &report.links()[0];
    assert_eq!(link.absolute_url.as_deref(), Some(format!("{}/old", base_url).as_str()));
    assert_eq!(link.resolved_url.as_deref(), Some(format!("{}/new", base_url).as_str()));
    assert_eq!(link.http_status, LinkStatus::Status(200));
}

#[tokio::test]
async fn test_crawl_report_written_to_disk() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", "Home", &["/a", "https://elsewhere.test/"]).await;
    mount_page(&server, "/a", "A", &["/"]).await;

    let mut config = create_test_config(&server.uri());
    config.network.resolve_links = false;

    let report = run_crawl(config).await.unwrap();
    assert_eq!(report.pages().len(), 2);
    assert!(report
        .links()
        .iter()
        .all(|l| l.http_status == LinkStatus::NotResolved));

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("report.db");
    let md_path = dir.path().join("report.md");
    SqliteReportWriter::new(&db_path).write(&report).unwrap();
    MarkdownReportWriter::new(&md_path).write(&report).unwrap();

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let pages: i64 = conn
        .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
        .unwrap();
    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))
        .unwrap();
    assert_eq!(pages, 2);
    assert_eq!(links, 3);

    let markdown = std::fs::read_to_string(&md_path).unwrap();
    assert!(markdown.contains("# Site Link Audit Summary"));
}

#[tokio::test]
async fn test_compare_baseline_against_upgraded() {
    let baseline = MockServer::start().await;
    let upgraded = MockServer::start().await;
    mount_head_ok(&baseline).await;
    mount_head_ok(&upgraded).await;

    mount_page(&baseline, "/", "Old home", &["/about", "/blog"]).await;
    mount_page(&baseline, "/about", "About", &["/"]).await;
    mount_page(&baseline, "/blog", "Blog", &[]).await;

    mount_page(&upgraded, "/", "New home", &["/about", "/shop"]).await;
    mount_page(&upgraded, "/about", "About", &["/"]).await;
    mount_page(&upgraded, "/blog", "Blog", &[]).await;
    mount_never_fetched(&upgraded, "/shop").await;

    let mut config = create_test_config(&baseline.uri());
    config.crawl.max_depth = 1;
    config.compare = Some(CompareConfig {
        baseline_url: baseline.uri(),
        upgraded_url: upgraded.uri(),
        compare_by: CompareBy::FinalUrl,
    });

    let report = run_compare(config).await.unwrap();

    assert_eq!(report.pages.len(), 3);
    assert_eq!(report.run.phase, CrawlPhase::Exhausted);

    let home = &report.pages[0];
    assert_eq!(home.baseline_title, "Old home");
    assert_eq!(home.upgraded_title, "New home");
    let kinds: Vec<_> = home.diffs.iter().map(|d| (d.kind, d.link_text.as_str())).collect();
    assert_eq!(
        kinds,
        vec![(DiffKind::Missing, "blog"), (DiffKind::Extra, "shop")]
    );

    assert!(report.pages[1].diffs.is_empty());
    assert_eq!(report.totals().total(), 2);
}
