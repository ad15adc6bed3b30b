use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::community::{
        CommunityComment, CommunityPost, CommunityType, CreatePostCommentRequest,
        CreatePostRequest, PostCommentResponse, PostDetailResponse, PostListResponse,
        UpdatePostCommentRequest, UpdatePostRequest,
    },
    services::{organizer, store::Store},
};

/// Community posts reuse the review engine's thread shape: comments
/// nest exactly one level and go through the same organizer. Comment
/// moderation here is always author-only.
#[derive(Clone)]
pub struct CommunityService {
    store: Arc<Store>,
}

impl CommunityService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create_post(
        &self,
        author_id: &str,
        request: CreatePostRequest,
    ) -> Result<PostDetailResponse> {
        request.validate()?;
        if !self.store.member_exists(author_id) {
            return Err(AppError::not_found("Member", author_id));
        }

        let post = CommunityPost {
            id: Store::next_id(),
            author_id: author_id.to_string(),
            post_type: request.post_type,
            title: request.title,
            content: request.content,
            view_count: 0,
            created_at: Utc::now(),
        };
        debug!("Member {} created community post {}", author_id, post.id);
        self.store.insert_post(post.clone());

        let author = self.store.get_member(author_id);
        Ok(PostDetailResponse::assemble(&post, author.as_ref(), Vec::new()))
    }

    /// Detail view with "visit" intent; bumps the post's view counter.
    pub async fn get_post_detail(&self, post_id: &str) -> Result<PostDetailResponse> {
        self.store
            .increment_post_view_count(post_id)
            .ok_or_else(|| AppError::not_found("Post", post_id))?;
        self.post_view(post_id).await
    }

    /// Assembles the post view without recording a visit.
    pub async fn post_view(&self, post_id: &str) -> Result<PostDetailResponse> {
        let post = self
            .store
            .get_post(post_id)
            .ok_or_else(|| AppError::not_found("Post", post_id))?;

        let comments = self.store.comments_for_post(post_id);
        let members = self.store.members_by_ids(
            comments
                .iter()
                .map(|c| c.author_id.as_str())
                .chain(std::iter::once(post.author_id.as_str())),
        );
        let comment_views: Vec<PostCommentResponse> = organizer::organize(&comments)
            .iter()
            .map(|node| PostCommentResponse::from_node(node, &members))
            .collect();

        let author = members.get(&post.author_id);
        Ok(PostDetailResponse::assemble(&post, author, comment_views))
    }

    pub async fn list_posts(
        &self,
        post_type: Option<CommunityType>,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<PostListResponse>> {
        Ok(self
            .store
            .list_posts(post_type, page, per_page)
            .iter()
            .map(PostListResponse::from)
            .collect())
    }

    pub async fn update_post(
        &self,
        post_id: &str,
        requester_id: &str,
        request: UpdatePostRequest,
    ) -> Result<PostDetailResponse> {
        request.validate()?;

        let post = self
            .store
            .get_post(post_id)
            .ok_or_else(|| AppError::not_found("Post", post_id))?;
        if post.author_id != requester_id {
            return Err(AppError::Unauthorized(format!(
                "member {} is not the author of post {}",
                requester_id, post_id
            )));
        }

        self.store.update_post(post_id, |post| {
            post.title = request.title;
            post.content = request.content;
        });
        self.post_view(post_id).await
    }

    pub async fn delete_post(&self, post_id: &str, requester_id: &str) -> Result<()> {
        let post = self
            .store
            .get_post(post_id)
            .ok_or_else(|| AppError::not_found("Post", post_id))?;
        if post.author_id != requester_id {
            return Err(AppError::Unauthorized(format!(
                "member {} is not the author of post {}",
                requester_id, post_id
            )));
        }

        info!("Deleting community post {} and its comments", post_id);
        self.store.delete_post(post_id);
        Ok(())
    }

    pub async fn create_comment(
        &self,
        post_id: &str,
        author_id: &str,
        request: CreatePostCommentRequest,
    ) -> Result<PostDetailResponse> {
        request.validate()?;
        if !self.store.member_exists(author_id) {
            return Err(AppError::not_found("Member", author_id));
        }
        if self.store.get_post(post_id).is_none() {
            return Err(AppError::not_found("Post", post_id));
        }

        if let Some(parent_id) = &request.parent_id {
            let parent = self
                .store
                .get_post_comment(parent_id)
                .ok_or_else(|| AppError::not_found("Comment", parent_id))?;
            if parent.parent_id.is_some() {
                return Err(AppError::InvalidHierarchy(format!(
                    "comment {} is itself a reply; replies to replies are not allowed",
                    parent_id
                )));
            }
            if parent.post_id != post_id {
                return Err(AppError::CrossReviewReference(format!(
                    "parent comment {} belongs to post {}, not post {}",
                    parent_id, parent.post_id, post_id
                )));
            }
        }

        let comment = CommunityComment {
            id: Store::next_id(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            parent_id: request.parent_id,
            content: request.content,
            is_edited: false,
            created_at: Utc::now(),
        };
        self.store.insert_post_comment(comment);

        self.post_view(post_id).await
    }

    pub async fn update_comment(
        &self,
        comment_id: &str,
        requester_id: &str,
        request: UpdatePostCommentRequest,
    ) -> Result<PostDetailResponse> {
        request.validate()?;

        let comment = self
            .store
            .get_post_comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        if comment.author_id != requester_id {
            return Err(AppError::Unauthorized(format!(
                "member {} is not the author of comment {}",
                requester_id, comment_id
            )));
        }

        self.store.update_post_comment(comment_id, |comment| {
            comment.content = request.content;
            comment.is_edited = true;
        });
        self.post_view(&comment.post_id).await
    }

    pub async fn delete_comment(&self, comment_id: &str, requester_id: &str) -> Result<()> {
        let comment = self
            .store
            .get_post_comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        if comment.author_id != requester_id {
            return Err(AppError::Unauthorized(format!(
                "member {} is not the author of comment {}",
                requester_id, comment_id
            )));
        }

        if comment.parent_id.is_none() {
            self.store.delete_post_comment_cascade(comment_id);
        } else {
            self.store.delete_post_comment(comment_id);
        }
        Ok(())
    }
}
