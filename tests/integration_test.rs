use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use webcrawler::config::Config;
use webcrawler::crawler::{CrawlController, CrawlerConfig, MemorySink};
use clap::Parser;

async fn page(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_unbounded_crawl_of_finite_site() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    let uri = server.uri();
    page(&server, "/", 200, &format!(
        r#"<html><body>
            <a href="{uri}/docs">Docs</a>
            <a href="{uri}/blog">Blog</a>
            <a href="/relative/is/ignored">Rel</a>
            <a href="{uri}/docs">Docs again</a>
        </body></html>"#
    )).await;
    page(&server, "/docs", 200, &format!(r#"<a href="{uri}/gone">Gone</a>"#)).await;
    page(&server, "/blog", 202, "no links here").await;
    page(&server, "/gone", 404, "").await;

    let sink = Arc::new(MemorySink::new());
    let controller = CrawlController::new(Arc::new(CrawlerConfig::new().with_workers(2, 4)), sink.clone());
    let handle = controller.start(&format!("{}/", uri), None)?;
    let state = handle.wait().await;

    assert_eq!(state.pages_fetched(), 4);
    assert_eq!(state.failed_fetches(), 1);
    assert_eq!(state.depth_cutoffs(), 0);

    let root = sink.pages_for(&format!("{}/", uri));
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].to_string(), format!("{uri}/\n\t{uri}/docs\n\t{uri}/blog\n"));

    let docs = sink.pages_for(&format!("{}/docs", uri));
    assert_eq!(docs[0].depth, 1);
    assert_eq!(docs[0].links, vec![format!("{}/gone", uri)]);

    let gone = sink.pages_for(&format!("{}/gone", uri));
    assert_eq!(gone[0].depth, 2);
    assert!(gone[0].links.is_empty());
    assert_eq!(sink.diagnostics().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cli_config_drives_a_crawl() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    let uri = server.uri();
    page(&server, "/start", 200, &format!(r#"<a href="{uri}/next">next</a>"#)).await;
    page(&server, "/next", 200, &format!(r#"<a href="{uri}/start">back</a>"#)).await;

    let seed = format!("{}/start", uri);
    let cfg = Config::try_parse_from(["webcrawler", "-n", "3", seed.as_str(), "--core-workers", "2", "--max-workers", "2"])?;
    cfg.validate()?;

    let sink = Arc::new(MemorySink::new());
    let controller = CrawlController::new(Arc::new(cfg.crawler_config()), sink.clone());
    let state = controller.start(&cfg.seed, cfg.max_depth)?.wait().await;

    // start -> next -> start -> next, then the depth 4 child is cut off
    assert_eq!(state.pages_fetched(), 4);
    assert_eq!(state.deepest_fetch(), 3);
    assert_eq!(state.depth_cutoffs(), 1);
    assert_eq!(sink.pages_for(&seed).len(), 2);
    Ok(())
}
