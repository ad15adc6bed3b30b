use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::models::member::Member;
use crate::services::organizer::{CommentNode, Threaded};

/// A single comment record as the store keeps it. `parent_id` is set
/// for replies and must point at a root comment of the same review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub review_id: String,
    pub author_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
}

impl Threaded for Comment {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub parent_id: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Comment as rendered inside a review view, with author fields
/// resolved and replies nested one level deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub review_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub author_name: Option<String>,
    pub author_profile_image: Option<String>,
    pub content: String,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub replies: Vec<CommentResponse>,
}

impl CommentResponse {
    pub fn from_node(node: &CommentNode<Comment>, members: &HashMap<String, Member>) -> Self {
        let comment = &node.record;
        let author = members.get(&comment.author_id);

        CommentResponse {
            id: comment.id.clone(),
            review_id: comment.review_id.clone(),
            parent_id: comment.parent_id.clone(),
            author_id: comment.author_id.clone(),
            author_name: author.map(|m| m.nickname.clone()),
            author_profile_image: author.and_then(|m| m.profile_image.clone()),
            content: comment.content.clone(),
            is_edited: comment.is_edited,
            created_at: comment.created_at,
            replies: node
                .replies
                .iter()
                .map(|reply| CommentResponse::from_node(reply, members))
                .collect(),
        }
    }
}
