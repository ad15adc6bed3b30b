use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::{
        comment::{Comment, CommentResponse, CreateCommentRequest, UpdateCommentRequest},
        review::ReviewResponse,
    },
    services::{organizer, review::ReviewService, store::Store},
};

/// Who may edit or delete a comment. The upstream product history
/// carries both rules, so the choice is configuration rather than
/// code; see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationPolicy {
    /// Only the review's author may curate its comment thread.
    ReviewAuthor,
    /// Only the comment's own author may touch it.
    CommentAuthor,
}

impl ModerationPolicy {
    pub fn permits(&self, review_author: &str, comment_author: &str, requester: &str) -> bool {
        match self {
            ModerationPolicy::ReviewAuthor => requester == review_author,
            ModerationPolicy::CommentAuthor => requester == comment_author,
        }
    }
}

impl FromStr for ModerationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "review_author" => Ok(ModerationPolicy::ReviewAuthor),
            "comment_author" => Ok(ModerationPolicy::CommentAuthor),
            other => Err(format!("unknown comment moderation policy '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<Store>,
    reviews: ReviewService,
    policy: ModerationPolicy,
}

impl CommentService {
    pub fn new(store: Arc<Store>, reviews: ReviewService, policy: ModerationPolicy) -> Self {
        Self { store, reviews, policy }
    }

    /// Posts a comment (or a reply) on a review and responds with the
    /// re-derived review view. Replies are validated before any write:
    /// the parent must exist, must itself be a root comment, and must
    /// belong to the same review.
    pub async fn create_comment(
        &self,
        review_id: &str,
        author_id: &str,
        request: CreateCommentRequest,
    ) -> Result<ReviewResponse> {
        request.validate()?;
        debug!("Member {} commenting on review {}", author_id, review_id);

        if !self.store.member_exists(author_id) {
            return Err(AppError::not_found("Member", author_id));
        }
        if self.store.get_review(review_id).is_none() {
            return Err(AppError::not_found("Review", review_id));
        }

        if let Some(parent_id) = &request.parent_id {
            let parent = self
                .store
                .get_comment(parent_id)
                .ok_or_else(|| AppError::not_found("Comment", parent_id))?;
            if parent.parent_id.is_some() {
                return Err(AppError::InvalidHierarchy(format!(
                    "comment {} is itself a reply; replies to replies are not allowed",
                    parent_id
                )));
            }
            if parent.review_id != review_id {
                return Err(AppError::CrossReviewReference(format!(
                    "parent comment {} belongs to review {}, not review {}",
                    parent_id, parent.review_id, review_id
                )));
            }
        }

        let comment = Comment {
            id: Store::next_id(),
            review_id: review_id.to_string(),
            author_id: author_id.to_string(),
            parent_id: request.parent_id,
            content: request.content,
            is_edited: false,
            created_at: Utc::now(),
        };
        self.store.insert_comment(comment);

        // Mutation response: re-derive the tree without recording a view.
        self.reviews.review_view(review_id).await
    }

    /// Rewrites a comment's content. `is_edited` is set unconditionally,
    /// even when the new content equals the old; update is not a
    /// no-op-detecting operation.
    pub async fn update_comment(
        &self,
        comment_id: &str,
        requester_id: &str,
        request: UpdateCommentRequest,
    ) -> Result<ReviewResponse> {
        request.validate()?;

        let comment = self
            .store
            .get_comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        self.authorize(&comment, requester_id)?;

        self.store.update_comment(comment_id, |comment| {
            comment.content = request.content;
            comment.is_edited = true;
        });

        self.reviews.review_view(&comment.review_id).await
    }

    /// Deletes a comment. A root comment takes all of its replies with
    /// it; a reply is removed alone.
    pub async fn delete_comment(&self, comment_id: &str, requester_id: &str) -> Result<()> {
        let comment = self
            .store
            .get_comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        self.authorize(&comment, requester_id)?;

        if comment.parent_id.is_none() {
            let removed = self.store.delete_comment_cascade(comment_id);
            info!("Deleted root comment {} and {} replies", comment_id, removed - 1);
        } else {
            self.store.delete_comment(comment_id);
            debug!("Deleted reply {}", comment_id);
        }
        Ok(())
    }

    /// The organized two-level tree for one review, in creation order.
    pub async fn organize_comments(&self, review_id: &str) -> Result<Vec<CommentResponse>> {
        if self.store.get_review(review_id).is_none() {
            return Err(AppError::not_found("Review", review_id));
        }

        let comments = self.store.comments_for_review(review_id);
        let members = self
            .store
            .members_by_ids(comments.iter().map(|c| c.author_id.as_str()));
        Ok(organizer::organize(&comments)
            .iter()
            .map(|node| CommentResponse::from_node(node, &members))
            .collect())
    }

    fn authorize(&self, comment: &Comment, requester_id: &str) -> Result<()> {
        if !self.store.member_exists(requester_id) {
            return Err(AppError::not_found("Member", requester_id));
        }
        let review = self
            .store
            .get_review(&comment.review_id)
            .ok_or_else(|| AppError::not_found("Review", &comment.review_id))?;

        if !self
            .policy
            .permits(&review.author_id, &comment.author_id, requester_id)
        {
            return Err(AppError::Unauthorized(format!(
                "member {} may not modify comment {} under the {:?} policy",
                requester_id, comment.id, self.policy
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::Member;
    use crate::models::review::{Area, ReviewRequest};
    use crate::services::media::{InMemoryBlobStore, MediaService};
    use chrono::NaiveDate;

    fn setup(policy: ModerationPolicy) -> (Arc<Store>, ReviewService, CommentService) {
        let store = Arc::new(Store::new());
        let media = MediaService::new(store.clone(), Arc::new(InMemoryBlobStore::new()));
        let reviews = ReviewService::new(store.clone(), media);
        let comments = CommentService::new(store.clone(), reviews.clone(), policy);
        (store, reviews, comments)
    }

    fn seed_member(store: &Store, id: &str) {
        store.insert_member(Member {
            id: id.to_string(),
            nickname: format!("user-{}", id),
            email: format!("{}@example.com", id),
            profile_image: None,
            created_at: Utc::now(),
        });
    }

    async fn seed_review(store: &Store, reviews: &ReviewService, author: &str) -> String {
        seed_member(store, author);
        let request = ReviewRequest {
            title: "weekend trip".to_string(),
            content: "two days by the coast".to_string(),
            area: Area::Busan,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            cost: 180_000,
            suggests: vec![],
            tags: vec![],
        };
        reviews.post_review(author, request).await.unwrap().id
    }

    fn comment_request(content: &str, parent: Option<&str>) -> CreateCommentRequest {
        CreateCommentRequest {
            parent_id: parent.map(str::to_string),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn posting_a_comment_returns_the_review_with_the_tree() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;
        seed_member(&store, "reader");

        let view = comments
            .create_comment(&review_id, "reader", comment_request("first!", None))
            .await
            .unwrap();

        assert_eq!(view.comments.len(), 1);
        assert_eq!(view.comments[0].content, "first!");
        assert!(!view.comments[0].is_edited);
        // a comment post is not a visit
        assert_eq!(view.view_count, 0);
    }

    #[tokio::test]
    async fn a_reply_nests_under_its_root() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;
        seed_member(&store, "reader");

        let view = comments
            .create_comment(&review_id, "author", comment_request("root", None))
            .await
            .unwrap();
        let root_id = view.comments[0].id.clone();

        let view = comments
            .create_comment(&review_id, "reader", comment_request("reply", Some(&root_id)))
            .await
            .unwrap();

        assert_eq!(view.comments.len(), 1);
        assert_eq!(view.comments[0].replies.len(), 1);
        assert_eq!(view.comments[0].replies[0].content, "reply");
    }

    #[tokio::test]
    async fn replying_to_a_reply_is_rejected() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;

        let view = comments
            .create_comment(&review_id, "author", comment_request("root", None))
            .await
            .unwrap();
        let root_id = view.comments[0].id.clone();
        let view = comments
            .create_comment(&review_id, "author", comment_request("reply", Some(&root_id)))
            .await
            .unwrap();
        let reply_id = view.comments[0].replies[0].id.clone();

        let result = comments
            .create_comment(&review_id, "author", comment_request("too deep", Some(&reply_id)))
            .await;
        assert!(matches!(result, Err(AppError::InvalidHierarchy(_))));
    }

    #[tokio::test]
    async fn a_parent_from_another_review_is_rejected() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let first = seed_review(&store, &reviews, "author").await;
        let second = seed_review(&store, &reviews, "other").await;

        let view = comments
            .create_comment(&first, "author", comment_request("on the first", None))
            .await
            .unwrap();
        let foreign_parent = view.comments[0].id.clone();

        let result = comments
            .create_comment(&second, "author", comment_request("wrong thread", Some(&foreign_parent)))
            .await;
        assert!(matches!(result, Err(AppError::CrossReviewReference(_))));
    }

    #[tokio::test]
    async fn missing_parent_review_or_member_fail_not_found() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;

        assert!(matches!(
            comments
                .create_comment("missing-review", "author", comment_request("x", None))
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            comments
                .create_comment(&review_id, "ghost", comment_request("x", None))
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            comments
                .create_comment(&review_id, "author", comment_request("x", Some("missing-parent")))
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_marks_the_comment_edited_even_without_changes() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;

        let view = comments
            .create_comment(&review_id, "author", comment_request("same words", None))
            .await
            .unwrap();
        let comment_id = view.comments[0].id.clone();

        let view = comments
            .update_comment(
                &comment_id,
                "author",
                UpdateCommentRequest { content: "same words".to_string() },
            )
            .await
            .unwrap();

        assert!(view.comments[0].is_edited);
        assert_eq!(view.comments[0].content, "same words");
    }

    #[tokio::test]
    async fn review_author_policy_blocks_the_comment_author() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;
        seed_member(&store, "reader");

        let view = comments
            .create_comment(&review_id, "reader", comment_request("mine", None))
            .await
            .unwrap();
        let comment_id = view.comments[0].id.clone();

        // Under this policy only the review author curates the thread.
        assert!(matches!(
            comments
                .update_comment(
                    &comment_id,
                    "reader",
                    UpdateCommentRequest { content: "edited".to_string() },
                )
                .await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(comments
            .update_comment(
                &comment_id,
                "author",
                UpdateCommentRequest { content: "curated".to_string() },
            )
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn comment_author_policy_blocks_everyone_else() {
        let (store, reviews, comments) = setup(ModerationPolicy::CommentAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;
        seed_member(&store, "reader");

        let view = comments
            .create_comment(&review_id, "reader", comment_request("mine", None))
            .await
            .unwrap();
        let comment_id = view.comments[0].id.clone();

        assert!(matches!(
            comments.delete_comment(&comment_id, "author").await,
            Err(AppError::Unauthorized(_))
        ));
        comments.delete_comment(&comment_id, "reader").await.unwrap();
        assert!(store.get_comment(&comment_id).is_none());
    }

    #[tokio::test]
    async fn deleting_a_root_removes_its_replies_too() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;

        let view = comments
            .create_comment(&review_id, "author", comment_request("root", None))
            .await
            .unwrap();
        let root_id = view.comments[0].id.clone();
        for i in 0..3 {
            comments
                .create_comment(&review_id, "author", comment_request(&format!("reply {}", i), Some(&root_id)))
                .await
                .unwrap();
        }
        comments
            .create_comment(&review_id, "author", comment_request("unrelated", None))
            .await
            .unwrap();
        assert_eq!(store.count_comments_for_review(&review_id), 5);

        comments.delete_comment(&root_id, "author").await.unwrap();

        // root plus its three replies are gone, the unrelated root stays
        assert_eq!(store.count_comments_for_review(&review_id), 1);
    }

    #[tokio::test]
    async fn deleting_a_reply_leaves_the_root_in_place() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;

        let view = comments
            .create_comment(&review_id, "author", comment_request("root", None))
            .await
            .unwrap();
        let root_id = view.comments[0].id.clone();
        let view = comments
            .create_comment(&review_id, "author", comment_request("reply", Some(&root_id)))
            .await
            .unwrap();
        let reply_id = view.comments[0].replies[0].id.clone();

        comments.delete_comment(&reply_id, "author").await.unwrap();

        let organized = comments.organize_comments(&review_id).await.unwrap();
        assert_eq!(organized.len(), 1);
        assert!(organized[0].replies.is_empty());
        assert!(store.get_comment(&root_id).is_some());
    }

    #[tokio::test]
    async fn organize_surfaces_a_racing_orphan_at_top_level() {
        let (store, reviews, comments) = setup(ModerationPolicy::ReviewAuthor);
        let review_id = seed_review(&store, &reviews, "author").await;

        let view = comments
            .create_comment(&review_id, "author", comment_request("root", None))
            .await
            .unwrap();
        let root_id = view.comments[0].id.clone();
        comments
            .create_comment(&review_id, "author", comment_request("reply", Some(&root_id)))
            .await
            .unwrap();

        // a racing request deleted the parent row out from under the reply
        store.delete_comment(&root_id);

        let organized = comments.organize_comments(&review_id).await.unwrap();
        assert_eq!(organized.len(), 1);
        assert_eq!(organized[0].content, "reply");
    }

    #[test]
    fn moderation_policy_parses_from_config_strings() {
        assert_eq!(
            "review_author".parse::<ModerationPolicy>().unwrap(),
            ModerationPolicy::ReviewAuthor
        );
        assert_eq!(
            "comment_author".parse::<ModerationPolicy>().unwrap(),
            ModerationPolicy::CommentAuthor
        );
        assert!("somebody_else".parse::<ModerationPolicy>().is_err());
    }
}
