use chrono::{Duration, TimeZone};
use ugci_core::{ContentPost, ContentType, CreatorProfile, DiscoveryConfig, MarketRegion};
use ugci_ingest::IngestReport;

use super::*;
use crate::collect;
use crate::discover::{discover, parse_posts};

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["ugci-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["ugci-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn discover_defaults() {
    let cli = Cli::try_parse_from(["ugci-cli", "discover", "--input", "posts.json"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Discover {
            input,
            window,
            min_confidence,
            now,
            ..
        }) => {
            assert_eq!(input, PathBuf::from("posts.json"));
            assert!(window.is_none());
            assert!((min_confidence - 0.7).abs() < f64::EPSILON);
            assert!(now.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn discover_accepts_window_floor_and_clock() {
    let cli = Cli::try_parse_from([
        "ugci-cli",
        "discover",
        "--input",
        "posts.json",
        "--window",
        "validation",
        "--min-confidence",
        "0.5",
        "--config",
        "custom.yaml",
        "--now",
        "2025-09-01T18:00:00Z",
    ])
    .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Discover {
            window,
            min_confidence,
            config,
            now,
            ..
        }) => {
            assert_eq!(window, Some(WindowKind::Validation));
            assert!((min_confidence - 0.5).abs() < f64::EPSILON);
            assert_eq!(config, PathBuf::from("custom.yaml"));
            assert_eq!(now, Some(Utc.with_ymd_and_hms(2025, 9, 1, 18, 0, 0).unwrap()));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn discover_rejects_unknown_window() {
    let result = Cli::try_parse_from([
        "ugci-cli", "discover", "--input", "p.json", "--window", "monthly",
    ]);
    assert!(result.is_err());
}

#[test]
fn collect_takes_repeated_and_comma_separated_platforms() {
    let cli = Cli::try_parse_from([
        "ugci-cli",
        "collect",
        "--platform",
        "tiktok,xiaohongshu",
        "--keyword",
        "skincare",
        "--keyword",
        "#glowup",
        "--dry-run",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            ref platforms,
            ref keywords,
            window: WindowKind::EarlyDetection,
            dry_run: true,
        }) if platforms == &[Platform::Tiktok, Platform::Xiaohongshu]
            && keywords == &["skincare", "#glowup"]
    ));
}

#[test]
fn collect_requires_a_keyword() {
    let result = Cli::try_parse_from(["ugci-cli", "collect", "--platform", "tiktok"]);
    assert!(result.is_err());
}

#[test]
fn recapture_collects_post_ids() {
    let cli = Cli::try_parse_from([
        "ugci-cli",
        "recapture",
        "--platform",
        "tiktok",
        "--post-id",
        "a",
        "--post-id",
        "b",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Recapture {
            platform: Platform::Tiktok,
            ref post_ids,
            dry_run: false,
        }) if post_ids == &["a", "b"]
    ));
}

#[test]
fn watch_requires_creator_ids() {
    assert!(Cli::try_parse_from(["ugci-cli", "watch", "--platform", "tiktok"]).is_err());
    assert!(Cli::try_parse_from([
        "ugci-cli",
        "watch",
        "--platform",
        "xiaohongshu",
        "--creator-id",
        "u1"
    ])
    .is_ok());
}

// -------------------------------------------------------------------------
// Offline discovery
// -------------------------------------------------------------------------

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 18, 0, 0).unwrap()
}

fn skincare_post(i: usize, posted: DateTime<Utc>) -> ContentPost {
    let region = if i % 2 == 0 { MarketRegion::Us } else { MarketRegion::China };
    let creator = CreatorProfile::new(
        format!("creator-{}", i % 2),
        format!("creator{}", i % 2),
        Platform::Tiktok,
        80_000,
        0.07,
        region,
    )
    .unwrap();
    ContentPost::new(
        format!("post-{i:02}"),
        creator,
        ContentType::Video,
        "#SkinCare #GlowUp",
        ["#SkinCare", "#GlowUp"],
        posted,
        now() - Duration::hours(12),
    )
    .with_counts(2_000, 150, 20, 10, 5)
}

#[test]
fn parse_posts_accepts_free_text_hashtags() {
    let raw = r##"[{
        "post_id": "p1",
        "creator": {
            "creator_id": "c1",
            "username": "@c1",
            "platform": "tiktok",
            "follower_count": 1000,
            "avg_engagement_rate": 0.05,
            "region": "us"
        },
        "platform": "tiktok",
        "content_type": "video",
        "caption": "morning routine",
        "hashtags": "#SkinCare and #GlowUp",
        "timestamp": "2025-09-01T10:00:00Z",
        "views": 10,
        "first_seen": "2025-09-01T11:00:00Z",
        "last_captured": "2025-09-01T11:00:00Z"
    }]"##;
    let posts = parse_posts(raw).expect("posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].hashtags, vec!["skincare", "glowup"]);
    assert_eq!(posts[0].capture_count, 1);
}

#[test]
fn parse_posts_rejects_non_arrays() {
    let err = parse_posts(r#"{"post_id": "p1"}"#).unwrap_err();
    assert!(err.to_string().contains("JSON array"));
}

#[test]
fn discover_reports_single_skincare_cluster() {
    let posts: Vec<ContentPost> = (0..12)
        .map(|i| skincare_post(i, now() - Duration::hours(13)))
        .collect();
    let report =
        discover(posts, &DiscoveryConfig::default(), None, 0.5, now()).expect("report");

    assert_eq!(report.clusters_found, 1);
    assert_eq!(report.clusters[0].post_ids.len(), 12);
    assert_eq!(report.proof_tiles_generated, 1);
    assert!(report.tiles[0].headline.contains("skincare"));
    assert!(report.tiles[0].headline.contains("glowup"));
}

#[test]
fn discover_window_drops_old_posts() {
    // Six posts inside the 48h early-detection window, six a week old.
    let posts: Vec<ContentPost> = (0..12)
        .map(|i| {
            let age = if i < 6 { Duration::hours(5) } else { Duration::days(7) };
            skincare_post(i, now() - age)
        })
        .collect();
    let report = discover(
        posts,
        &DiscoveryConfig::default(),
        Some(WindowKind::EarlyDetection),
        0.0,
        now(),
    )
    .expect("report");
    assert_eq!(report.clusters_found, 1);
    assert_eq!(report.clusters[0].post_ids.len(), 6);
}

#[test]
fn discover_reports_unrepresentable_window() {
    let mut config = DiscoveryConfig::default();
    config.windows.saturation_hours = u32::MAX;
    let posts = vec![skincare_post(0, now())];
    let err = discover(posts, &config, Some(WindowKind::Saturation), 0.0, now()).unwrap_err();
    assert!(err.to_string().contains("window_hours"), "{err}");
}

#[test]
fn discover_surfaces_invalid_floor() {
    assert!(discover(Vec::new(), &DiscoveryConfig::default(), None, 1.5, now()).is_err());
}

#[test]
fn summary_counts_fetched_posts_and_skips() {
    let mut report = IngestReport::new(Platform::Tiktok);
    report.push_post(skincare_post(0, now()));
    report.skip(Platform::Tiktok, "broken", "missing author id");

    let json = serde_json::to_value(collect::summarize(&report, None)).expect("json");
    assert_eq!(json["platform"], "tiktok");
    assert_eq!(json["fetched"], 1);
    assert!(json["inserted"].is_null());
    assert_eq!(json["skipped"][0]["key"], "broken");
}
