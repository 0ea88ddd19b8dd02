//! Exercise domain types.

use chrono::{DateTime, Utc};

use dailyrep_core::ExerciseId;

/// An exercise in the coaching library, with an uploaded demo video.
///
/// The three video paths point at the same clip encoded for different
/// browsers; any of them may be missing if the upload only carried some
/// formats.
#[derive(Debug, Clone)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub description: String,
    /// Path under the media directory, e.g. `videos/squat.mp4`.
    pub video_mp4: Option<String>,
    pub video_webm: Option<String>,
    pub video_ogg: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exercise {
    /// Whether at least one playable video source exists.
    #[must_use]
    pub const fn has_video(&self) -> bool {
        self.video_mp4.is_some() || self.video_webm.is_some() || self.video_ogg.is_some()
    }
}
