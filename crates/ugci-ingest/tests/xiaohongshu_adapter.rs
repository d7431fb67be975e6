//! `XiaohongshuAdapter` against a local `wiremock` server.

use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ugci_core::{ContentType, MarketRegion, Platform, TimeWindow};
use ugci_ingest::{AdapterSettings, PlatformAdapter, XiaohongshuAdapter};

fn note(id: &str, hours_ago: i64, media_type: &str) -> Value {
    json!({
        "id": id,
        "description": "#穿搭 #OOTD daily look",
        "create_time": (Utc::now() - Duration::hours(hours_ago))
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        "media_type": media_type,
        "author": {"id": format!("a-{id}"), "username": "redbook", "follower_count": 8_000},
        "views": 500, "likes": 40, "comments": 3, "shares": 1, "saves": 12
    })
}

fn window() -> TimeWindow {
    TimeWindow::validation(Utc::now(), 168).expect("168h window")
}

#[tokio::test]
async fn disabled_adapter_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = XiaohongshuAdapter::new(&AdapterSettings::local(server.uri()), false).unwrap();
    assert!(!adapter.is_enabled());

    let ids = ["x".to_owned()];
    for report in [
        adapter.discover_posts(&ids, &window()).await,
        adapter.monitor_watchlist(&ids).await,
        adapter.recapture_posts(&ids).await,
    ] {
        assert_eq!(report.platform, Some(Platform::Xiaohongshu));
        assert!(report.posts.is_empty());
        assert!(report.skipped.is_empty());
    }
}

#[tokio::test]
async fn search_maps_media_types_and_region() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/notes"))
        .and(query_param("keyword", "穿搭"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [note("n1", 2, "video"), note("n2", 4, "carousel"), note("n3", 6, "image")]
        })))
        .mount(&server)
        .await;

    let adapter = XiaohongshuAdapter::new(&AdapterSettings::local(server.uri()), true).unwrap();
    let report = adapter.discover_posts(&["穿搭".to_owned()], &window()).await;

    let types: Vec<ContentType> = report.posts.iter().map(|p| p.content_type).collect();
    assert_eq!(
        types,
        vec![ContentType::Video, ContentType::Carousel, ContentType::Image]
    );
    assert!(report
        .posts
        .iter()
        .all(|p| p.creator.region == MarketRegion::China && p.platform == Platform::Xiaohongshu));
    assert_eq!(report.posts[0].hashtags, vec!["穿搭", "ootd"]);
}

#[tokio::test]
async fn creator_notes_and_recapture() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/a-1/notes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [note("n9", 400, "video")]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/n9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": note("n9", 400, "video")})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = XiaohongshuAdapter::new(&AdapterSettings::local(server.uri()), true).unwrap();

    let watched = adapter.monitor_watchlist(&["a-1".to_owned()]).await;
    assert_eq!(watched.posts.len(), 1);

    let recaptured = adapter
        .recapture_posts(&["n9".to_owned(), "gone".to_owned()])
        .await;
    assert_eq!(recaptured.posts.len(), 1);
    assert_eq!(recaptured.posts[0].capture_count, 2);
    assert_eq!(recaptured.skipped.len(), 1);
    assert!(recaptured.skipped[0].reason.contains("404"));
}
