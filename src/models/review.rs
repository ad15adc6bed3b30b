use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::comment::CommentResponse;

/// Travel region a review is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Seoul,
    Incheon,
    Gyeonggi,
    Gangwon,
    Chungcheong,
    Jeolla,
    Gyeongsang,
    Busan,
    Jeju,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub area: Area,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cost: i64,
    pub suggests: Vec<String>,
    pub tags: Vec<String>,
    pub is_edited: bool,
    pub like_count: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Shared by create and update; an update replaces every field.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 50000))]
    pub content: String,
    pub area: Area,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(range(min = 0))]
    pub cost: i64,
    #[serde(default)]
    pub suggests: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The externally visible review aggregate: scalar fields, counters,
/// attached image URLs and the organized comment tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub area: Area,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cost: i64,
    pub suggests: Vec<String>,
    pub tags: Vec<String>,
    pub is_edited: bool,
    pub like_count: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub image_urls: Vec<String>,
    pub comments: Vec<CommentResponse>,
}

impl ReviewResponse {
    /// Pure projection; nothing here touches the store.
    pub fn assemble(
        review: &Review,
        image_urls: Vec<String>,
        comments: Vec<CommentResponse>,
    ) -> Self {
        ReviewResponse {
            id: review.id.clone(),
            author_id: review.author_id.clone(),
            title: review.title.clone(),
            content: review.content.clone(),
            area: review.area,
            start_date: review.start_date,
            end_date: review.end_date,
            cost: review.cost,
            suggests: review.suggests.clone(),
            tags: review.tags.clone(),
            is_edited: review.is_edited,
            like_count: review.like_count,
            view_count: review.view_count,
            created_at: review.created_at,
            image_urls,
            comments,
        }
    }
}

/// Summary row for list endpoints; no comment tree attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewListResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub area: Area,
    pub tags: Vec<String>,
    pub like_count: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewListResponse {
    fn from(review: &Review) -> Self {
        ReviewListResponse {
            id: review.id.clone(),
            author_id: review.author_id.clone(),
            title: review.title.clone(),
            area: review.area,
            tags: review.tags.clone(),
            like_count: review.like_count,
            view_count: review.view_count,
            created_at: review.created_at,
        }
    }
}
