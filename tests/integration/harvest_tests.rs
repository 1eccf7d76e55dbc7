//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a sitemap, category pages and posts,
//! and exercise a full harvest end-to-end.

use lesson_harvest::cache::{DiskStore, MemoryStore};
use lesson_harvest::config::Config;
use lesson_harvest::crawler::{ChannelProgress, Harvester, NoProgress, ProgressEvent};
use lesson_harvest::HarvestError;
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("lesson_harvest=debug"))
        .with_test_writer()
        .try_init();
}

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::new(
        format!("{}/category-sitemap.xml", base_url),
        format!("{}/category/finnish-.*", regex::escape(base_url)),
    );
    config.retry.initial_interval_ms = 1;
    config.retry.max_interval_ms = Some(5);
    config.retry.max_elapsed_secs = 5;
    config.retry.max_attempts = Some(3);
    config.retry.jitter = false;
    config
}

fn memory_harvester(config: Config) -> Harvester {
    Harvester::new(config, Arc::new(MemoryStore::new())).expect("Failed to create harvester")
}

fn sitemap(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>\n", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}</urlset>"#,
        entries
    )
}

fn category_html(title: &str, post_urls: &[String]) -> String {
    let links: String = post_urls
        .iter()
        .map(|url| format!(r#"<h2><a class="entry_title" href="{}">Post</a></h2>"#, url))
        .collect();
    format!(
        r#"<html><body><h1 class="archive_title">{}</h1>{}</body></html>"#,
        title, links
    )
}

fn post_html(title: &str, paragraph: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="post_title">{}</h1>
        <article id="post_body">
            <p>{}</p>
            <ul><li>Share</li></ul>
            <table>
                <tr><th>Finnish</th><th>English</th></tr>
                <tr><td>kissa</td><td>cat</td></tr>
                <tr><td>koira</td><td>dog</td></tr>
            </table>
        </article>
        </body></html>"#,
        title, paragraph
    )
}

async fn mount_html(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let sitemap_body = sitemap(&[
        format!("{}/category/finnish-verbs/", base_url),
        format!("{}/category/news/", base_url),
        format!("{}/category/finnish-cases/", base_url),
    ]);
    Mock::given(method("GET"))
        .and(path("/category-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_html(
        &mock_server,
        "/category/finnish-verbs/",
        200,
        category_html(
            "Finnish Verbs",
            &[
                format!("{}/verb-types/", base_url),
                format!("{}/imperfect/", base_url),
            ],
        ),
    )
    .await;
    mount_html(
        &mock_server,
        "/category/finnish-cases/",
        200,
        category_html(
            "Finnish Cases",
            &["/inessive/".to_string(), "/gone/".to_string()],
        ),
    )
    .await;

    mount_html(&mock_server, "/verb-types/", 200, post_html("Verb Types", "Six types.")).await;
    mount_html(&mock_server, "/imperfect/", 200, post_html("Imperfect", "Past tense.")).await;
    mount_html(&mock_server, "/inessive/", 200, post_html("Inessive", "In something.")).await;
    mount_html(&mock_server, "/gone/", 404, "Not found".to_string()).await;

    let harvester = memory_harvester(create_test_config(&base_url));
    let records = harvester.run(&NoProgress).await.expect("Harvest failed");

    assert_eq!(records.len(), 2);

    assert_eq!(records[0].category, "Finnish Verbs");
    assert_eq!(records[0].posts.len(), 2);
    assert_eq!(records[0].posts[0].title, "Verb Types");
    assert_eq!(records[0].posts[1].title, "Imperfect");

    let verb_types = &records[0].posts[0];
    assert!(verb_types.content.starts_with("# Verb Types"));
    assert!(verb_types.content.contains("Six types."));
    assert!(verb_types
        .content
        .contains("| Finnish | English |\n| --- | --- |\n| kissa | cat |\n| koira | dog |"));
    assert!(!verb_types.content.contains("Share"));
    assert_eq!(verb_types.text, "# Verb Types\n\nSix types.");
    assert_eq!(verb_types.tables.len(), 1);
    assert_eq!(verb_types.tables[0].shape(), (2, 2));
    assert_eq!(
        verb_types.tables[0].column("English"),
        Some(vec!["cat", "dog"])
    );

    // Relative post links resolve against the category page; the 404 post
    // becomes an empty placeholder
    assert_eq!(records[1].category, "Finnish Cases");
    assert_eq!(records[1].posts.len(), 2);
    assert_eq!(records[1].posts[0].title, "Inessive");
    assert!(records[1].posts[1].is_empty());
}

#[tokio::test]
async fn test_memoized_fetch_hits_network_once() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/category-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = memory_harvester(create_test_config(&base_url));
    let url = format!("{}/category-sitemap.xml", base_url);

    let first = harvester.fetch_text_cached(&url).await.unwrap();
    let second = harvester.fetch_text_cached(&url).await.unwrap();
    assert_eq!(first, second);

    // MockServer verifies `.expect(1)` when dropped
}

#[tokio::test]
async fn test_disk_cache_is_shared_between_runs() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let cache_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/category-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap(&[format!(
            "{}/category/finnish-verbs/",
            base_url
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Category pages are not memoized
    Mock::given(method("GET"))
        .and(path("/category/finnish-verbs/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(category_html(
            "Finnish Verbs",
            &[format!("{}/verb-types/", base_url)],
        )))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/verb-types/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(post_html("Verb Types", "Six types.")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut results = Vec::new();
    for _ in 0..2 {
        let store = DiskStore::open(cache_dir.path()).unwrap();
        let harvester =
            Harvester::new(create_test_config(&base_url), Arc::new(store)).unwrap();
        results.push(harvester.run(&NoProgress).await.unwrap());
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[1][0].posts[0].title, "Verb Types");
}

#[tokio::test]
async fn test_failed_post_placeholder_is_cached() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/gone-post/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let harvester = Harvester::new(create_test_config(&base_url), store.clone()).unwrap();
    let url = format!("{}/gone-post/", base_url);

    assert!(harvester.post(&url).await.unwrap().is_empty());
    assert!(harvester.post(&url).await.unwrap().is_empty());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_category_page_with_error_status() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/category/finnish-missing/", 404, "gone".to_string()).await;

    let harvester = memory_harvester(create_test_config(&base_url));
    let page = harvester
        .category_page(&format!("{}/category/finnish-missing/", base_url))
        .await
        .expect("Non-2xx category pages must not fail");

    assert_eq!(page.title, "");
    assert!(page.post_urls.is_empty());

    let record = harvester
        .scrape_category(&format!("{}/category/finnish-missing/", base_url))
        .await
        .unwrap();
    assert_eq!(record.category, "");
    assert!(record.posts.is_empty());
}

#[tokio::test]
async fn test_sitemap_failure_is_retried_then_tolerated() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/category-sitemap.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let harvester = memory_harvester(create_test_config(&base_url));
    let records = harvester.run(&NoProgress).await.unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_sitemap_recovers_after_transient_error() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/category-sitemap.xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/category-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap(&[format!(
            "{}/category/finnish-a/",
            base_url
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = memory_harvester(create_test_config(&base_url));
    assert_eq!(
        harvester.sitemap_urls().await,
        vec![format!("{}/category/finnish-a/", base_url)]
    );
}

#[tokio::test]
async fn test_missing_post_body_aborts_harvest() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/category-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap(&[format!(
            "{}/category/finnish-verbs/",
            base_url
        )])))
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/category/finnish-verbs/",
        200,
        category_html("Finnish Verbs", &[format!("{}/redesigned/", base_url)]),
    )
    .await;
    mount_html(
        &mock_server,
        "/redesigned/",
        200,
        r#"<h1 class="post_title">Redesigned</h1><main><p>New layout</p></main>"#.to_string(),
    )
    .await;

    let harvester = memory_harvester(create_test_config(&base_url));
    let err = harvester.run(&NoProgress).await.unwrap_err();

    assert!(matches!(
        err,
        HarvestError::MissingElement { ref selector, .. } if selector == "article#post_body"
    ));
}

#[tokio::test]
async fn test_many_categories_keep_sitemap_order() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let count = 20;

    let locs: Vec<String> = (0..count)
        .map(|i| format!("{}/category/finnish-{}/", base_url, i))
        .collect();
    Mock::given(method("GET"))
        .and(path("/category-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap(&locs)))
        .mount(&mock_server)
        .await;

    for i in 0..count {
        // Earlier categories answer more slowly
        Mock::given(method("GET"))
            .and(path(format!("/category/finnish-{}/", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(category_html(&format!("Category {}", i), &[]))
                    .set_delay(std::time::Duration::from_millis(((count - i) * 5) as u64)),
            )
            .mount(&mock_server)
            .await;
    }

    let (progress, mut events) = ChannelProgress::new();
    let harvester = memory_harvester(create_test_config(&base_url));
    let records = harvester.run(&progress).await.unwrap();

    assert_eq!(records.len(), count);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.category, format!("Category {}", i));
        assert!(record.posts.is_empty());
    }

    let mut advanced = 0;
    let mut finished = false;
    while let Ok(event) = events.try_recv() {
        match event {
            ProgressEvent::Advanced { total, .. } => {
                assert_eq!(total, count);
                advanced += 1;
            }
            ProgressEvent::Finished { total } => {
                assert_eq!(total, count);
                finished = true;
            }
            ProgressEvent::Started { total } => assert_eq!(total, count),
        }
    }
    assert_eq!(advanced, count);
    assert!(finished);
}
