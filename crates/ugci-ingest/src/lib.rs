//! Platform adapters that pull UGC posts into the normalized data model.
//!
//! Each adapter talks to one platform's JSON API and returns an
//! [`IngestReport`]: the posts it could convert plus a reason for every
//! request or item it had to skip.

pub mod adapter;
pub mod error;
pub mod hashtags;
pub mod manager;
pub mod rate_limit;
pub mod report;
pub mod tiktok;
pub mod xiaohongshu;

mod http;

pub use adapter::{AdapterSettings, PlatformAdapter};
pub use error::IngestError;
pub use hashtags::extract_hashtags;
pub use manager::{Adapter, IngestionManager};
pub use report::{IngestReport, SkippedItem};
pub use tiktok::TikTokAdapter;
pub use xiaohongshu::XiaohongshuAdapter;
