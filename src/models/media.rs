use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An image attached to a review. `url` is whatever the blob store
/// returned on upload and is the handle used to delete the blob again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewImage {
    pub id: String,
    pub review_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
