use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::discovery::WindowSettings;
use crate::models::{labelled_enum, ContentPost};
use crate::CoreError;

labelled_enum! {
    /// Named span of history a discovery run looks at.
    WindowKind, "window kind" {
        EarlyDetection => "early_detection",
        Validation => "validation",
        Saturation => "saturation",
    }
}

/// A bounded span `[start, end]` tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: WindowKind,
}

impl TimeWindow {
    /// Window of `hours` ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidField`] when the start would fall outside
    /// the representable date range.
    pub fn ending_at(kind: WindowKind, now: DateTime<Utc>, hours: u32) -> Result<Self, CoreError> {
        let start = now
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .ok_or_else(|| CoreError::InvalidField {
                field: "window_hours",
                reason: format!("{hours}h {kind} window before {now} is out of range"),
            })?;
        Ok(Self {
            start,
            end: now,
            kind,
        })
    }

    /// # Errors
    ///
    /// See [`TimeWindow::ending_at`].
    pub fn early_detection(now: DateTime<Utc>, hours: u32) -> Result<Self, CoreError> {
        Self::ending_at(WindowKind::EarlyDetection, now, hours)
    }

    /// # Errors
    ///
    /// See [`TimeWindow::ending_at`].
    pub fn validation(now: DateTime<Utc>, hours: u32) -> Result<Self, CoreError> {
        Self::ending_at(WindowKind::Validation, now, hours)
    }

    /// # Errors
    ///
    /// See [`TimeWindow::ending_at`].
    pub fn saturation(now: DateTime<Utc>, hours: u32) -> Result<Self, CoreError> {
        Self::ending_at(WindowKind::Saturation, now, hours)
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }
}

/// Builds windows from configured durations and filters posts into them.
#[derive(Debug, Clone)]
pub struct WindowManager {
    settings: WindowSettings,
}

impl WindowManager {
    #[must_use]
    pub fn new(settings: WindowSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn hours_for(&self, kind: WindowKind) -> u32 {
        match kind {
            WindowKind::EarlyDetection => self.settings.early_detection_hours,
            WindowKind::Validation => self.settings.validation_hours,
            WindowKind::Saturation => self.settings.saturation_hours,
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidField`] if the configured span reaches past
    /// the representable date range.
    pub fn create_window(
        &self,
        kind: WindowKind,
        now: DateTime<Utc>,
    ) -> Result<TimeWindow, CoreError> {
        TimeWindow::ending_at(kind, now, self.hours_for(kind))
    }

    /// Keep the posts whose platform `timestamp` falls inside `window`.
    #[must_use]
    pub fn filter_posts_in_window(
        &self,
        posts: &[ContentPost],
        window: &TimeWindow,
    ) -> Vec<ContentPost> {
        let kept: Vec<ContentPost> = posts
            .iter()
            .filter(|post| window.contains(post.timestamp))
            .cloned()
            .collect();

        tracing::debug!(
            window = %window.kind,
            kept = kept.len(),
            total = posts.len(),
            "filtered posts into window"
        );

        kept
    }
}
