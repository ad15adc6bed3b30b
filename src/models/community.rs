use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::models::member::Member;
use crate::services::organizer::{CommentNode, Threaded};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunityType {
    Free,
    Question,
    Companion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: String,
    pub author_id: String,
    pub post_type: CommunityType,
    pub title: String,
    pub content: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Community comments share the two-level thread shape with review
/// comments and go through the same organizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityComment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
}

impl Threaded for CommunityComment {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    pub post_type: CommunityType,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 50000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 50000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostCommentRequest {
    pub parent_id: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePostCommentRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCommentResponse {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub author_name: Option<String>,
    pub author_profile_image: Option<String>,
    pub content: String,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub replies: Vec<PostCommentResponse>,
}

impl PostCommentResponse {
    pub fn from_node(
        node: &CommentNode<CommunityComment>,
        members: &HashMap<String, Member>,
    ) -> Self {
        let comment = &node.record;
        let author = members.get(&comment.author_id);

        PostCommentResponse {
            id: comment.id.clone(),
            post_id: comment.post_id.clone(),
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
                .map(|reply| PostCommentResponse::from_node(reply, members))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub id: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub author_profile_image: Option<String>,
    pub post_type: CommunityType,
    pub title: String,
    pub content: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<PostCommentResponse>,
}

impl PostDetailResponse {
    pub fn assemble(
        post: &CommunityPost,
        author: Option<&Member>,
        comments: Vec<PostCommentResponse>,
    ) -> Self {
        PostDetailResponse {
            id: post.id.clone(),
            author_id: post.author_id.clone(),
            author_name: author.map(|m| m.nickname.clone()),
            author_profile_image: author.and_then(|m| m.profile_image.clone()),
            post_type: post.post_type,
            title: post.title.clone(),
            content: post.content.clone(),
            view_count: post.view_count,
            created_at: post.created_at,
            comments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub id: String,
    pub author_id: String,
    pub post_type: CommunityType,
    pub title: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&CommunityPost> for PostListResponse {
    fn from(post: &CommunityPost) -> Self {
        PostListResponse {
            id: post.id.clone(),
            author_id: post.author_id.clone(),
            post_type: post.post_type,
            title: post.title.clone(),
            view_count: post.view_count,
            created_at: post.created_at,
        }
    }
}
