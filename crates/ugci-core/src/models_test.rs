use chrono::{Duration, TimeZone, Utc};

use super::*;

fn creator(id: &str, followers: u64) -> CreatorProfile {
    CreatorProfile::new(
        id,
        format!("user_{id}"),
        Platform::Tiktok,
        followers,
        0.05,
        MarketRegion::Us,
    )
        .unwrap()
}

fn post_at(first_seen: DateTime<Utc>) -> ContentPost {
    ContentPost::new(
        "p1",
        creator("c1", 50_000),
        ContentType::Video,
        "morning routine",
        ["#SkinCare", "GlowUp"],
        first_seen,
        first_seen,
    )
}

#[test]
fn platform_round_trips_through_display_and_from_str() {
    for platform in Platform::ALL {
        let parsed: Platform = platform.to_string().parse().unwrap();
        assert_eq!(parsed, *platform);
    }
}

#[test]
fn enum_parsing_is_case_insensitive() {
    assert_eq!("TikTok".parse::<Platform>().unwrap(), Platform::Tiktok);
    assert_eq!(" Validated ".parse::<TrendStatus>().unwrap(), TrendStatus::Validated);
}

#[test]
fn unknown_variant_reports_kind_and_value() {
    let err = "myspace".parse::<Platform>().unwrap_err();
    assert!(
        matches!(
            err,
            CoreError::UnknownVariant { kind: "platform", ref value } if value == "myspace"
        ),
        "unexpected error: {err:?}"
    );
}

#[test]
fn enums_serialize_lowercase() {
    assert_eq!(serde_json::to_string(&MarketRegion::China).unwrap(), "\"china\"");
    assert_eq!(serde_json::to_string(&UrgencyLevel::High).unwrap(), "\"high\"");
    let status: TrendStatus = serde_json::from_str("\"validating\"").unwrap();
    assert_eq!(status, TrendStatus::Validating);
}

#[test]
fn tier_boundaries() {
    assert_eq!(CreatorTier::from_follower_count(0), CreatorTier::Nano);
    assert_eq!(CreatorTier::from_follower_count(9_999), CreatorTier::Nano);
    assert_eq!(CreatorTier::from_follower_count(10_000), CreatorTier::Micro);
    assert_eq!(CreatorTier::from_follower_count(99_999), CreatorTier::Micro);
    assert_eq!(CreatorTier::from_follower_count(100_000), CreatorTier::Mid);
    assert_eq!(CreatorTier::from_follower_count(999_999), CreatorTier::Mid);
    assert_eq!(CreatorTier::from_follower_count(1_000_000), CreatorTier::Macro);
}

#[test]
fn mid_tier_helper_follows_follower_count() {
    assert!(creator("a", 250_000).is_mid_tier());
    assert!(!creator("b", 2_000).is_mid_tier());
}

#[test]
fn creator_rejects_out_of_range_engagement_rate() {
    let err = CreatorProfile::new("c", "c", Platform::Douyin, 10, 1.5, MarketRegion::China)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidField { field: "avg_engagement_rate", .. }));

    let err = CreatorProfile::new("c", "c", Platform::Douyin, 10, f64::NAN, MarketRegion::China)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidField { .. }));
}

#[test]
fn normalize_hashtags_strips_lowercases_and_keeps_duplicates() {
    let tags = normalize_hashtags(["#SkinCare", "  ##GlowUp ", "#", "", "skincare"]);
    assert_eq!(tags, vec!["skincare", "glowup", "skincare"]);
}

#[test]
fn hashtags_from_text_only_takes_hash_tokens() {
    let tags = hashtags_from_text("loving this #SkinCare routine #glowup today");
    assert_eq!(tags, vec!["skincare", "glowup"]);
}

#[test]
fn constructor_normalizes_hashtags_and_inherits_platform() {
    let post = post_at(Utc::now());
    assert_eq!(post.hashtags, vec!["skincare", "glowup"]);
    assert_eq!(post.platform, Platform::Tiktok);
    assert_eq!(post.capture_count, 1);
    assert_eq!(post.last_captured, post.first_seen);
}

#[test]
fn engagement_rate_excludes_saves() {
    let post = post_at(Utc::now()).with_counts(1000, 50, 5, 10, 100);
    assert!((post.engagement_rate() - 0.065).abs() < 1e-12);
    assert_eq!(post.total_engagement(), 165);
}

#[test]
fn engagement_rate_is_zero_without_views() {
    let post = post_at(Utc::now()).with_counts(0, 50, 5, 10, 0);
    assert!(post.engagement_rate().abs() < f64::EPSILON);
}

#[test]
fn velocity_uses_hours_since_first_seen() {
    let first_seen = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let post = post_at(first_seen).with_counts(1000, 100, 0, 0, 0);
    let now = first_seen + Duration::hours(4);
    assert!((post.hours_since_first_seen_at(now) - 4.0).abs() < 1e-9);
    assert!((post.velocity_at(now) - 25.0).abs() < 1e-9);
}

#[test]
fn velocity_is_zero_when_no_time_has_passed_or_clock_skews() {
    let first_seen = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let post = post_at(first_seen).with_counts(1000, 100, 0, 0, 0);
    assert!(post.velocity_at(first_seen).abs() < f64::EPSILON);

    let before = first_seen - Duration::hours(2);
    assert!(post.hours_since_first_seen_at(before).abs() < f64::EPSILON);
    assert!(post.velocity_at(before).abs() < f64::EPSILON);
}

#[test]
fn recaptured_bumps_count_and_timestamp() {
    let first_seen = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let post = post_at(first_seen);
    let later = first_seen + Duration::hours(6);
    let again = post.recaptured(later);
    assert_eq!(again.capture_count, 2);
    assert_eq!(again.last_captured, later);
    assert_eq!(again.first_seen, first_seen);
    assert_eq!(post.capture_count, 1);
}

#[test]
fn deserialize_accepts_hashtag_list_or_caption_text() {
    let json = r#"{
        "post_id": "p9",
        "creator": {
            "creator_id": "c9", "username": "nine", "platform": "xiaohongshu",
            "follower_count": 1200, "avg_engagement_rate": 0.1, "region": "china"
        },
        "platform": "xiaohongshu",
        "content_type": "carousel",
        "caption": "x",
        "hashtags": "new look #OOTD #ootd and more",
        "timestamp": "2025-03-01T00:00:00Z",
        "first_seen": "2025-03-01T01:00:00Z",
        "last_captured": "2025-03-01T01:00:00Z"
    }"#;
    let post: ContentPost = serde_json::from_str(json).unwrap();
    assert_eq!(post.hashtags, vec!["ootd", "ootd"]);
    assert_eq!(post.capture_count, 1);
    assert_eq!(post.views, 0);

    let json = json.replace(
        r#""new look #OOTD #ootd and more""#,
        r##"["#Street", "Style"]"##,
    );
    let post: ContentPost = serde_json::from_str(&json).unwrap();
    assert_eq!(post.hashtags, vec!["street", "style"]);
}
