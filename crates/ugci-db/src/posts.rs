//! Database operations for `posts`.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use ugci_core::{ContentPost, CreatorProfile, Platform};

use crate::{parse_label, to_i64, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `posts` table, creator profile flattened.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub post_id: String,
    pub platform: String,
    pub content_type: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub posted_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub saves: i64,
    pub first_seen: DateTime<Utc>,
    pub last_captured: DateTime<Utc>,
    pub capture_count: i32,
    pub creator_id: String,
    pub creator_username: String,
    pub creator_platform: String,
    pub creator_follower_count: i64,
    pub creator_avg_engagement_rate: f64,
    pub creator_follower_growth_rate: f64,
    pub creator_region: String,
}

impl PostRow {
    /// Rebuild the domain post.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] for an unknown enum label or a negative counter.
    pub fn into_content_post(self) -> Result<ContentPost, DbError> {
        let key = self.post_id.as_str();
        let counter =
            |value: i64| u64::try_from(value).map_err(|e| DbError::decode("posts", key, e));

        let creator = CreatorProfile {
            creator_id: self.creator_id.clone(),
            username: self.creator_username.clone(),
            platform: parse_label("posts", key, &self.creator_platform)?,
            follower_count: counter(self.creator_follower_count)?,
            avg_engagement_rate: self.creator_avg_engagement_rate,
            follower_growth_rate: self.creator_follower_growth_rate,
            region: parse_label("posts", key, &self.creator_region)?,
        };

        Ok(ContentPost {
            post_id: self.post_id.clone(),
            creator,
            platform: parse_label("posts", key, &self.platform)?,
            content_type: parse_label("posts", key, &self.content_type)?,
            caption: self.caption.clone(),
            hashtags: self.hashtags.clone(),
            timestamp: self.posted_at,
            views: counter(self.views)?,
            likes: counter(self.likes)?,
            comments: counter(self.comments)?,
            shares: counter(self.shares)?,
            saves: counter(self.saves)?,
            first_seen: self.first_seen,
            last_captured: self.last_captured,
            capture_count: u32::try_from(self.capture_count.max(1))
                .map_err(|e| DbError::decode("posts", key, e))?,
        })
    }
}

const POST_COLUMNS: &str = "post_id, platform, content_type, caption, hashtags, posted_at, \
     views, likes, comments, shares, saves, first_seen, last_captured, capture_count, \
     creator_id, creator_username, creator_platform, creator_follower_count, \
     creator_avg_engagement_rate, creator_follower_growth_rate, creator_region";

// ---------------------------------------------------------------------------
// posts operations
// ---------------------------------------------------------------------------

/// Insert new posts and refresh the growth fields of known ones.
///
/// A repeat of a stored `post_id` only updates the engagement counters and
/// `last_captured`, and counts as one more capture. Everything else keeps its
/// first-seen value. Returns how many posts were newly inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written then.
pub async fn upsert_posts(pool: &PgPool, posts: &[ContentPost]) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for post in posts {
        let was_insert: bool = sqlx::query_scalar::<_, bool>(
            "INSERT INTO posts \
                 (post_id, platform, content_type, caption, hashtags, posted_at, \
                  views, likes, comments, shares, saves, first_seen, last_captured, capture_count, \
                  creator_id, creator_username, creator_platform, creator_follower_count, \
                  creator_avg_engagement_rate, creator_follower_growth_rate, creator_region) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18, $19, $20, $21) \
             ON CONFLICT (post_id) DO UPDATE SET \
                 views         = EXCLUDED.views, \
                 likes         = EXCLUDED.likes, \
                 comments      = EXCLUDED.comments, \
                 shares        = EXCLUDED.shares, \
                 saves         = EXCLUDED.saves, \
                 last_captured = EXCLUDED.last_captured, \
                 capture_count = posts.capture_count + 1, \
                 updated_at    = NOW() \
             RETURNING (xmax = 0)",
        )
        .bind(&post.post_id)
        .bind(post.platform.as_str())
        .bind(post.content_type.as_str())
        .bind(&post.caption)
        .bind(&post.hashtags)
        .bind(post.timestamp)
        .bind(to_i64(post.views))
        .bind(to_i64(post.likes))
        .bind(to_i64(post.comments))
        .bind(to_i64(post.shares))
        .bind(to_i64(post.saves))
        .bind(post.first_seen)
        .bind(post.last_captured)
        .bind(i32::try_from(post.capture_count).unwrap_or(i32::MAX))
        .bind(&post.creator.creator_id)
        .bind(&post.creator.username)
        .bind(post.creator.platform.as_str())
        .bind(to_i64(post.creator.follower_count))
        .bind(post.creator.avg_engagement_rate)
        .bind(post.creator.follower_growth_rate)
        .bind(post.creator.region.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if was_insert {
            inserted += 1;
        }
    }

    tx.commit().await?;
    tracing::debug!(total = posts.len(), inserted, "upserted posts");
    Ok(inserted)
}

/// Stored posts on `platforms` published within `[start, end]`, oldest first.
///
/// An empty `platforms` slice matches every platform. Rows that no longer
/// decode are logged and left out.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts_in_window<'e>(
    executor: impl PgExecutor<'e>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    platforms: &[Platform],
) -> Result<Vec<ContentPost>, DbError> {
    let labels: Vec<String> = platforms.iter().map(|p| p.as_str().to_owned()).collect();
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE posted_at BETWEEN $1 AND $2 \
           AND (cardinality($3::text[]) = 0 OR platform = ANY($3)) \
         ORDER BY posted_at, post_id"
    ))
    .bind(start)
    .bind(end)
    .bind(&labels)
    .fetch_all(executor)
    .await?;

    let total = rows.len();
    let posts: Vec<ContentPost> = rows
        .into_iter()
        .filter_map(|row| match row.into_content_post() {
            Ok(post) => Some(post),
            Err(err) => {
                tracing::warn!(error = %err, "skipping undecodable post row");
                None
            }
        })
        .collect();
    tracing::debug!(total, decoded = posts.len(), "loaded posts in window");
    Ok(posts)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_posts<'e>(executor: impl PgExecutor<'e>) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
        .fetch_one(executor)
        .await?;
    Ok(count)
}
