use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presence-only endorsement of a review by a member. At most one per
/// (review, member) pair; the paired `like_count` on the review is
/// maintained by the same store operation that flips this relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub review_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(review_id: &str, user_id: &str) -> Self {
        Like {
            review_id: review_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeResult {
    Liked,
    Unliked,
}
