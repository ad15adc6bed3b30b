use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::{
        comment::CommentResponse,
        like::LikeResult,
        review::{Area, Review, ReviewListResponse, ReviewRequest, ReviewResponse},
    },
    services::{media::MediaService, organizer, store::Store},
};

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<Store>,
    media: MediaService,
}

impl ReviewService {
    pub fn new(store: Arc<Store>, media: MediaService) -> Self {
        Self { store, media }
    }

    pub async fn post_review(&self, author_id: &str, request: ReviewRequest) -> Result<ReviewResponse> {
        request.validate()?;
        debug!("Posting review '{}' by member {}", request.title, author_id);

        if !self.store.member_exists(author_id) {
            return Err(AppError::not_found("Member", author_id));
        }

        let review = Review {
            id: Store::next_id(),
            author_id: author_id.to_string(),
            title: request.title,
            content: request.content,
            area: request.area,
            start_date: request.start_date,
            end_date: request.end_date,
            cost: request.cost,
            suggests: request.suggests,
            tags: request.tags,
            is_edited: false,
            like_count: 0,
            view_count: 0,
            created_at: Utc::now(),
        };
        self.store.insert_review(review.clone());

        // A fresh review has no comments yet.
        Ok(ReviewResponse::assemble(&review, Vec::new(), Vec::new()))
    }

    /// Detail view with "visit" intent: the view counter is recorded
    /// before assembly. Re-fetches after a mutation go through
    /// [`ReviewService::review_view`] instead so they never inflate the
    /// counter.
    pub async fn get_review_detail(&self, review_id: &str) -> Result<ReviewResponse> {
        self.record_view(review_id).await?;
        self.review_view(review_id).await
    }

    /// Assembles the externally visible review aggregate: scalar
    /// fields, current counters, image URLs and the organized comment
    /// tree. No side effects.
    pub async fn review_view(&self, review_id: &str) -> Result<ReviewResponse> {
        let review = self
            .store
            .get_review(review_id)
            .ok_or_else(|| AppError::not_found("Review", review_id))?;

        let comments = self.store.comments_for_review(review_id);
        let members = self
            .store
            .members_by_ids(comments.iter().map(|c| c.author_id.as_str()));
        let tree = organizer::organize(&comments);
        let comment_views: Vec<CommentResponse> = tree
            .iter()
            .map(|node| CommentResponse::from_node(node, &members))
            .collect();

        let image_urls = self
            .store
            .images_for_review(review_id)
            .into_iter()
            .map(|image| image.url)
            .collect();

        Ok(ReviewResponse::assemble(&review, image_urls, comment_views))
    }

    pub async fn update_review(
        &self,
        review_id: &str,
        requester_id: &str,
        request: ReviewRequest,
    ) -> Result<ReviewResponse> {
        request.validate()?;

        let review = self
            .store
            .get_review(review_id)
            .ok_or_else(|| AppError::not_found("Review", review_id))?;
        if review.author_id != requester_id {
            return Err(AppError::Unauthorized(format!(
                "member {} is not the author of review {}",
                requester_id, review_id
            )));
        }

        self.store.update_review(review_id, |review| {
            review.title = request.title;
            review.content = request.content;
            review.area = request.area;
            review.start_date = request.start_date;
            review.end_date = request.end_date;
            review.cost = request.cost;
            review.suggests = request.suggests;
            review.tags = request.tags;
            review.is_edited = true;
        });

        self.review_view(review_id).await
    }

    pub async fn delete_review(&self, review_id: &str, requester_id: &str) -> Result<()> {
        let review = self
            .store
            .get_review(review_id)
            .ok_or_else(|| AppError::not_found("Review", review_id))?;
        if review.author_id != requester_id {
            return Err(AppError::Unauthorized(format!(
                "member {} is not the author of review {}",
                requester_id, review_id
            )));
        }

        info!("Deleting review {} and its dependents", review_id);
        if let Some(images) = self.store.delete_review(review_id) {
            self.media.release_blobs(&images).await?;
        }
        Ok(())
    }

    pub async fn list_reviews(
        &self,
        page: usize,
        per_page: usize,
        area: Option<Area>,
    ) -> Result<Vec<ReviewListResponse>> {
        Ok(self
            .store
            .list_reviews(page, per_page, area)
            .iter()
            .map(ReviewListResponse::from)
            .collect())
    }

    pub async fn search_by_tag(
        &self,
        tag: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<ReviewListResponse>> {
        Ok(self
            .store
            .reviews_by_tag(tag, page, per_page)
            .iter()
            .map(ReviewListResponse::from)
            .collect())
    }

    pub async fn top_reviews(&self, limit: usize) -> Result<Vec<ReviewListResponse>> {
        Ok(self
            .store
            .top_reviews_by_likes(limit)
            .iter()
            .map(ReviewListResponse::from)
            .collect())
    }

    /// Flips the caller's like on a review. The relation and the
    /// denormalized `like_count` move together inside one store
    /// operation; this method never reads the counter to write it back.
    pub async fn toggle_like(&self, review_id: &str, user_id: &str) -> Result<LikeResult> {
        if !self.store.member_exists(user_id) {
            return Err(AppError::not_found("Member", user_id));
        }
        if self.store.get_review(review_id).is_none() {
            return Err(AppError::not_found("Review", review_id));
        }

        let result = self
            .store
            .toggle_like(review_id, user_id)
            .ok_or_else(|| AppError::not_found("Review", review_id))?;
        debug!("Member {} toggled review {}: {:?}", user_id, review_id, result);
        Ok(result)
    }

    /// Unconditional view bump, no per-viewer deduplication. Returns
    /// the new count.
    pub async fn record_view(&self, review_id: &str) -> Result<i64> {
        self.store
            .increment_view_count(review_id)
            .ok_or_else(|| AppError::not_found("Review", review_id))
    }

    /// Diagnostic reconciliation: does the denormalized counter match
    /// the number of like relations? Never called on a request path.
    pub async fn verify_like_count(&self, review_id: &str) -> Result<bool> {
        let review = self
            .store
            .get_review(review_id)
            .ok_or_else(|| AppError::not_found("Review", review_id))?;
        Ok(review.like_count == self.store.count_like_relations(review_id) as i64)
    }
}
