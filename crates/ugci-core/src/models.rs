use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::CoreError;

/// Declares a closed, string-labelled enum with `as_str`, `Display` and a
/// case-insensitive `FromStr`.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    other => Err($crate::CoreError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use labelled_enum;

labelled_enum! {
    /// Social platform a post or creator lives on.
    Platform, "platform" {
        Tiktok => "tiktok",
        Xiaohongshu => "xiaohongshu",
        Rednote => "rednote",
        Douyin => "douyin",
        Instagram => "instagram",
    }
}

labelled_enum! {
    ContentType, "content type" {
        Video => "video",
        Image => "image",
        Text => "text",
        Carousel => "carousel",
    }
}

labelled_enum! {
    MarketRegion, "market region" {
        Us => "us",
        Uk => "uk",
        China => "china",
        Japan => "japan",
        Korea => "korea",
        Global => "global",
    }
}

labelled_enum! {
    /// Audience-size bucket. Always derived from `follower_count`.
    CreatorTier, "creator tier" {
        /// Fewer than 10k followers.
        Nano => "nano",
        /// 10k to 100k.
        Micro => "micro",
        /// 100k to 1M.
        Mid => "mid",
        /// 1M and above.
        Macro => "macro",
    }
}

labelled_enum! {
    /// Lifecycle of a trend signal.
    ///
    /// The validator only ever emits `Emerging`, `Validating` and `Validated`.
    /// `Saturated` and `Declining` are reachable solely through an explicit
    /// status update from outside the validator.
    TrendStatus, "trend status" {
        Emerging => "emerging",
        Validating => "validating",
        Validated => "validated",
        Saturated => "saturated",
        Declining => "declining",
    }
}

labelled_enum! {
    UrgencyLevel, "urgency level" {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl CreatorTier {
    #[must_use]
    pub fn from_follower_count(follower_count: u64) -> Self {
        match follower_count {
            0..10_000 => CreatorTier::Nano,
            10_000..100_000 => CreatorTier::Micro,
            100_000..1_000_000 => CreatorTier::Mid,
            _ => CreatorTier::Macro,
        }
    }
}

impl TrendStatus {
    /// `true` for statuses that still warrant attention (validating or validated).
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, TrendStatus::Validating | TrendStatus::Validated)
    }
}

/// A creator as observed on the post that carried them.
///
/// The profile is a snapshot embedded by value in each [`ContentPost`]; two
/// posts from the same creator may carry slightly different follower counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorProfile {
    pub creator_id: String,
    pub username: String,
    pub platform: Platform,
    pub follower_count: u64,
    /// Historical engagement rate in `[0.0, 1.0]`.
    pub avg_engagement_rate: f64,
    #[serde(default)]
    pub follower_growth_rate: f64,
    pub region: MarketRegion,
}

impl CreatorProfile {
    /// Build a profile, rejecting an `avg_engagement_rate` outside `[0.0, 1.0]`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidField`] for an out-of-range or non-finite rate.
    pub fn new(
        creator_id: impl Into<String>,
        username: impl Into<String>,
        platform: Platform,
        follower_count: u64,
        avg_engagement_rate: f64,
        region: MarketRegion,
    ) -> Result<Self, CoreError> {
        if !(0.0..=1.0).contains(&avg_engagement_rate) {
            return Err(CoreError::InvalidField {
                field: "avg_engagement_rate",
                reason: format!("{avg_engagement_rate} is outside [0, 1]"),
            });
        }

        Ok(Self {
            creator_id: creator_id.into(),
            username: username.into(),
            platform,
            follower_count,
            avg_engagement_rate,
            follower_growth_rate: 0.0,
            region,
        })
    }

    #[must_use]
    pub fn tier(&self) -> CreatorTier {
        CreatorTier::from_follower_count(self.follower_count)
    }

    #[must_use]
    pub fn is_mid_tier(&self) -> bool {
        self.tier() == CreatorTier::Mid
    }
}

/// A single piece of user-generated content, normalized across platforms.
///
/// `timestamp` is the platform-reported creation time. `first_seen` and
/// `last_captured` are when ingestion observed the post, and drive velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPost {
    pub post_id: String,
    pub creator: CreatorProfile,
    pub platform: Platform,
    pub content_type: ContentType,
    pub caption: String,
    /// Lowercase, without leading `#`. Duplicates are kept and count.
    #[serde(default, deserialize_with = "deserialize_hashtags")]
    pub hashtags: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub saves: u64,
    pub first_seen: DateTime<Utc>,
    pub last_captured: DateTime<Utc>,
    #[serde(default = "default_capture_count")]
    pub capture_count: u32,
}

fn default_capture_count() -> u32 {
    1
}

impl ContentPost {
    /// Build a freshly observed post with zeroed counters.
    ///
    /// The post inherits its platform from the creator, its hashtags are
    /// normalized, and `last_captured` starts equal to `first_seen`.
    pub fn new<I, S>(
        post_id: impl Into<String>,
        creator: CreatorProfile,
        content_type: ContentType,
        caption: impl Into<String>,
        hashtags: I,
        timestamp: DateTime<Utc>,
        first_seen: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            post_id: post_id.into(),
            platform: creator.platform,
            creator,
            content_type,
            caption: caption.into(),
            hashtags: normalize_hashtags(hashtags),
            timestamp,
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            saves: 0,
            first_seen,
            last_captured: first_seen,
            capture_count: 1,
        }
    }

    #[must_use]
    pub fn with_counts(
        mut self,
        views: u64,
        likes: u64,
        comments: u64,
        shares: u64,
        saves: u64,
    ) -> Self {
        self.views = views;
        self.likes = likes;
        self.comments = comments;
        self.shares = shares;
        self.saves = saves;
        self
    }

    /// Copy of this post marking one more observation at `now`.
    #[must_use]
    pub fn recaptured(&self, now: DateTime<Utc>) -> Self {
        let mut post = self.clone();
        post.capture_count = post.capture_count.saturating_add(1);
        post.last_captured = now;
        post
    }

    /// Likes, comments, shares and saves.
    #[must_use]
    pub fn total_engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.comments)
            .saturating_add(self.shares)
            .saturating_add(self.saves)
    }

    /// `(likes + comments + shares) / views`; saves are excluded. `0.0` with no views.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn engagement_rate(&self) -> f64 {
        if self.views == 0 {
            return 0.0;
        }
        let interactions = self
            .likes
            .saturating_add(self.comments)
            .saturating_add(self.shares);
        interactions as f64 / self.views as f64
    }

    #[must_use]
    pub fn hours_since_first_seen(&self) -> f64 {
        self.hours_since_first_seen_at(Utc::now())
    }

    /// Hours between `first_seen` and `now`, floored at zero for clock skew.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hours_since_first_seen_at(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.first_seen).num_milliseconds();
        (millis as f64 / 3_600_000.0).max(0.0)
    }

    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity_at(Utc::now())
    }

    /// Engagements per hour since first observed. `0.0` when no time has passed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn velocity_at(&self, now: DateTime<Utc>) -> f64 {
        let hours = self.hours_since_first_seen_at(now);
        if hours == 0.0 {
            return 0.0;
        }
        self.total_engagement() as f64 / hours
    }
}

/// Normalize raw hashtags: trim, strip leading `#`, lowercase, drop empties.
///
/// Order and duplicates are preserved.
pub fn normalize_hashtags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().trim_start_matches('#').trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Pull `#tag` tokens out of free text, in order.
#[must_use]
pub fn hashtags_from_text(text: &str) -> Vec<String> {
    normalize_hashtags(text.split_whitespace().filter(|word| word.starts_with('#')))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HashtagsInput {
    Text(String),
    List(Vec<String>),
}

fn deserialize_hashtags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match HashtagsInput::deserialize(deserializer)? {
        HashtagsInput::Text(text) => hashtags_from_text(&text),
        HashtagsInput::List(tags) => normalize_hashtags(tags),
    })
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
