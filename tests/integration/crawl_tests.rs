//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawl
//! and download cycles against an embedded frontier in a temporary
//! directory.

use crawlbox::archive::Archive;
use crawlbox::config::Config;
use crawlbox::{encode_url, Crawler, Frontier, Partition};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration whose state lives under `dir`
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let mut config = Config::for_base_url(base_url);
    config.crawl.exclude_keywords = vec!["admin".to_string()];
    config.frontier.endpoint = dir.join("frontier").to_string_lossy().into_owned();
    config.workers.max_workers = 10;
    config.workers.request_timeout_secs = 2;
    config.reporting.stats_interval_secs = 1;
    config.reporting.backup_interval_secs = 1;
    config.output.archive_dir = dir.join("downloaded").to_string_lossy().into_owned();
    config.output.links_dir = dir.join("links").to_string_lossy().into_owned();
    config
}

async fn sorted_keys(crawler: &Crawler, partition: Partition) -> Vec<String> {
    let mut keys = crawler.frontier().list_keys(partition).await.unwrap();
    keys.sort();
    keys
}

/// Mounts a small site:
///
/// ```text
/// /       -> /page1, /page2, /page1?x=1, other host, /admin/secret
/// /page1  -> /, /page3
/// /page2  -> always 404
/// /page3  -> no links
/// ```
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(
                    r#"<html><body>
                    <a href="/page1">Page 1</a>
                    <a href="page2">Page 2</a>
                    <a href="/page1?x=1">Page 1 again</a>
                    <a href="http://other.test/elsewhere">Elsewhere</a>
                    <a href="/admin/secret">Admin</a>
                    </body></html>"#,
                ),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(r#"<a href="/">Home</a><a href="/page3#top">Page 3</a>"#),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(4)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>The end</p>"))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_scope() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(create_test_config(&base, dir.path()))
        .await
        .unwrap();
    crawler.crawl().await.unwrap();

    assert_eq!(
        sorted_keys(&crawler, Partition::Done).await,
        vec![
            format!("{}/", base),
            format!("{}/page1", base),
            format!("{}/page3", base)
        ]
    );
    assert_eq!(
        sorted_keys(&crawler, Partition::Trash).await,
        vec![format!("{}/page2", base)]
    );
    assert!(sorted_keys(&crawler, Partition::Todo).await.is_empty());

    let trash = crawler
        .frontier()
        .list_entries(Partition::Trash)
        .await
        .unwrap();
    assert_eq!(trash[&format!("{}/page2", base)], 4);

    assert_eq!(crawler.stats().parsed(), 3);
    assert_eq!(crawler.stats().done(), 3);
    assert_eq!(crawler.stats().trash(), 1);
    assert_eq!(crawler.stats().todo(), 0);

    let database = dir
        .path()
        .join("frontier")
        .join(format!("{}.db", encode_url(&base)));
    assert!(database.exists());
}

#[tokio::test]
async fn test_recrawl_makes_no_requests() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&base, dir.path());

    Crawler::new(config.clone())
        .await
        .unwrap()
        .crawl()
        .await
        .unwrap();

    // A second process over the same frontier finds the seed already done
    let again = Crawler::new(config).await.unwrap();
    assert_eq!(again.stats().done(), 3);
    assert_eq!(again.stats().trash(), 1);
    again.crawl().await.unwrap();

    assert_eq!(again.stats().parsed(), 0);
    assert_eq!(sorted_keys(&again, Partition::Done).await.len(), 3);
}

#[tokio::test]
async fn test_resume_picks_up_pending_todo() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/left-over"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>resumed</p>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&base, dir.path());

    // An interrupted run left the seed done and one URL pending
    {
        let crawler = Crawler::new(config.clone()).await.unwrap();
        let mut done = crawlbox::frontier::Entries::new();
        done.insert(format!("{}/", base), 1);
        crawler.frontier().upsert(Partition::Done, &done).await.unwrap();
        let mut todo = crawlbox::frontier::Entries::new();
        todo.insert(format!("{}/left-over", base), 2);
        crawler.frontier().upsert(Partition::Todo, &todo).await.unwrap();
    }

    let crawler = Crawler::new(config).await.unwrap();
    assert_eq!(crawler.stats().todo(), 1);
    crawler.crawl().await.unwrap();

    let done = crawler
        .frontier()
        .list_entries(Partition::Done)
        .await
        .unwrap();
    assert_eq!(done[&format!("{}/left-over", base)], 3);
}

#[tokio::test]
async fn test_download_mode() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(r#"<a href="/not-followed">x</a>"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/already"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/not-followed"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let unreachable = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&base, dir.path());
    let archive = Archive::new(&config.output.archive_dir);

    // Archived by an earlier run
    let already = format!("{}/already", base);
    std::fs::create_dir_all(archive.dir()).unwrap();
    std::fs::write(archive.file_path(&already, ".html"), b"old").unwrap();

    let doc = format!("{}/doc", base);
    let report = format!("{}/report", base);
    let urls = vec![
        doc.clone(),
        report.clone(),
        already.clone(),
        unreachable.clone(),
        String::new(),
    ];

    let crawler = Crawler::new(config).await.unwrap();
    crawler.download(&urls).await.unwrap();

    assert!(archive.file_path(&doc, ".html").exists());
    assert!(archive.file_path(&report, ".pdf").exists());

    let mut expected_done = vec![doc, report, already];
    expected_done.sort();
    assert_eq!(sorted_keys(&crawler, Partition::Done).await, expected_done);
    assert_eq!(
        sorted_keys(&crawler, Partition::Trash).await,
        vec![unreachable]
    );
    assert!(sorted_keys(&crawler, Partition::Todo).await.is_empty());
    assert_eq!(crawler.stats().parsed(), 2);
}

#[tokio::test]
async fn test_dump_after_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(create_test_config(&base, dir.path()))
        .await
        .unwrap();
    crawler.crawl().await.unwrap();

    let path = crawler.dump().await.unwrap();
    assert_eq!(
        path,
        dir.path()
            .join("links")
            .join(format!("{}.txt", encode_url(&base)))
    );

    let contents = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("{}/", base),
            format!("{}/page1", base),
            format!("{}/page3", base)
        ]
    );
}
