//! In-process record store shared by every service. Plays the role the
//! spec assigns to the persistence collaborator: durable keyed records
//! with lookup/insert/delete/update, plus the atomic primitives the
//! counter paths need. DashMap entry guards give per-row locking, so a
//! check-then-act on one key serializes against concurrent writers of
//! that key without any application-level lock.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::models::{
    calendar::Calendar,
    comment::Comment,
    community::{CommunityComment, CommunityPost, CommunityType},
    like::{Like, LikeResult},
    media::ReviewImage,
    member::Member,
    review::{Area, Review},
};

/// Comment rows carry a store-assigned insertion sequence, the analogue
/// of a database identity column. Listing by review returns rows in
/// that order, which is what gives the organizer its deterministic
/// "creation order" input.
#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    record: T,
}

#[derive(Default)]
pub struct Store {
    members: DashMap<String, Member>,
    reviews: DashMap<String, Review>,
    comments: DashMap<String, Sequenced<Comment>>,
    likes: DashMap<(String, String), Like>,
    posts: DashMap<String, CommunityPost>,
    post_comments: DashMap<String, Sequenced<CommunityComment>>,
    calendars: DashMap<String, Calendar>,
    images: RwLock<HashMap<String, Vec<ReviewImage>>>,
    seq: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    pub fn next_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    // ---- members ----

    pub fn insert_member(&self, member: Member) {
        self.members.insert(member.id.clone(), member);
    }

    pub fn get_member(&self, id: &str) -> Option<Member> {
        self.members.get(id).map(|m| m.clone())
    }

    pub fn member_exists(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.members.iter().any(|m| m.email == email)
    }

    /// Author records for the given ids, for response enrichment.
    /// Unknown ids are simply absent from the result.
    pub fn members_by_ids<'a, I>(&self, ids: I) -> HashMap<String, Member>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut members = HashMap::new();
        for id in ids {
            if members.contains_key(id) {
                continue;
            }
            if let Some(member) = self.get_member(id) {
                members.insert(id.to_string(), member);
            }
        }
        members
    }

    // ---- reviews ----

    pub fn insert_review(&self, review: Review) {
        self.reviews.insert(review.id.clone(), review);
    }

    pub fn get_review(&self, id: &str) -> Option<Review> {
        self.reviews.get(id).map(|r| r.clone())
    }

    pub fn update_review<F>(&self, id: &str, apply: F) -> Option<Review>
    where
        F: FnOnce(&mut Review),
    {
        let mut entry = self.reviews.get_mut(id)?;
        apply(&mut entry);
        Some(entry.clone())
    }

    /// Removes the review together with its comments, likes and image
    /// records. Returns the image records so the caller can release the
    /// blobs behind them.
    pub fn delete_review(&self, id: &str) -> Option<Vec<ReviewImage>> {
        self.reviews.remove(id)?;
        self.comments.retain(|_, c| c.record.review_id != id);
        self.likes.retain(|(review_id, _), _| review_id != id);
        let images = self.images.write().remove(id).unwrap_or_default();
        Some(images)
    }

    pub fn list_reviews(&self, page: usize, per_page: usize, area: Option<Area>) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|r| area.map_or(true, |a| r.area == a))
            .map(|r| r.clone())
            .collect();
        Self::page_newest_first(&mut reviews, page, per_page)
    }

    pub fn reviews_by_tag(&self, tag: &str, page: usize, per_page: usize) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|r| r.tags.iter().any(|t| t == tag))
            .map(|r| r.clone())
            .collect();
        Self::page_newest_first(&mut reviews, page, per_page)
    }

    pub fn top_reviews_by_likes(&self, limit: usize) -> Vec<Review> {
        let mut reviews: Vec<Review> = self.reviews.iter().map(|r| r.clone()).collect();
        reviews.sort_by(|a, b| {
            b.like_count
                .cmp(&a.like_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        reviews.truncate(limit);
        reviews
    }

    fn page_newest_first(reviews: &mut Vec<Review>, page: usize, per_page: usize) -> Vec<Review> {
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        reviews
            .iter()
            .skip(page.saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect()
    }

    // ---- counters ----

    /// Unconditional view-count bump, applied under the row's exclusive
    /// guard. Returns the new count.
    pub fn increment_view_count(&self, review_id: &str) -> Option<i64> {
        let mut review = self.reviews.get_mut(review_id)?;
        review.view_count += 1;
        Some(review.view_count)
    }

    fn adjust_like_count(&self, review_id: &str, delta: i64) -> Option<i64> {
        let mut review = self.reviews.get_mut(review_id)?;
        review.like_count = (review.like_count + delta).max(0);
        Some(review.like_count)
    }

    // ---- likes ----

    /// Flips the (review, user) like relation and applies the paired
    /// counter delta in the same operation. The entry guard serializes
    /// concurrent toggles for the same pair, so a pair can never end up
    /// doubly liked. Returns `None` if the review vanished underneath.
    pub fn toggle_like(&self, review_id: &str, user_id: &str) -> Option<LikeResult> {
        let key = (review_id.to_string(), user_id.to_string());
        match self.likes.entry(key) {
            Entry::Occupied(entry) => {
                entry.remove();
                self.adjust_like_count(review_id, -1)?;
                Some(LikeResult::Unliked)
            }
            Entry::Vacant(entry) => {
                entry.insert(Like::new(review_id, user_id));
                self.adjust_like_count(review_id, 1)?;
                Some(LikeResult::Liked)
            }
        }
    }

    pub fn like_exists(&self, review_id: &str, user_id: &str) -> bool {
        self.likes
            .contains_key(&(review_id.to_string(), user_id.to_string()))
    }

    /// Diagnostic only: the number of like relations for a review, for
    /// reconciliation against the denormalized counter. Not part of any
    /// request path.
    pub fn count_like_relations(&self, review_id: &str) -> usize {
        self.likes
            .iter()
            .filter(|entry| entry.key().0 == review_id)
            .count()
    }

    // ---- review comments ----

    pub fn insert_comment(&self, comment: Comment) {
        let seq = self.next_seq();
        self.comments
            .insert(comment.id.clone(), Sequenced { seq, record: comment });
    }

    pub fn get_comment(&self, id: &str) -> Option<Comment> {
        self.comments.get(id).map(|c| c.record.clone())
    }

    pub fn update_comment<F>(&self, id: &str, apply: F) -> Option<Comment>
    where
        F: FnOnce(&mut Comment),
    {
        let mut entry = self.comments.get_mut(id)?;
        apply(&mut entry.record);
        Some(entry.record.clone())
    }

    /// Deletes a single comment row. Used for replies.
    pub fn delete_comment(&self, id: &str) -> bool {
        self.comments.remove(id).is_some()
    }

    /// Deletes a root comment and every reply pointing at it. Returns
    /// the number of rows removed.
    pub fn delete_comment_cascade(&self, root_id: &str) -> usize {
        let before = self.comments.len();
        self.comments
            .retain(|id, c| id != root_id && c.record.parent_id.as_deref() != Some(root_id));
        before - self.comments.len()
    }

    /// All comments for a review in creation order.
    pub fn comments_for_review(&self, review_id: &str) -> Vec<Comment> {
        let mut rows: Vec<Sequenced<Comment>> = self
            .comments
            .iter()
            .filter(|c| c.record.review_id == review_id)
            .map(|c| c.clone())
            .collect();
        rows.sort_by_key(|c| c.seq);
        rows.into_iter().map(|c| c.record).collect()
    }

    pub fn count_comments_for_review(&self, review_id: &str) -> usize {
        self.comments
            .iter()
            .filter(|c| c.record.review_id == review_id)
            .count()
    }

    // ---- community posts ----

    pub fn insert_post(&self, post: CommunityPost) {
        self.posts.insert(post.id.clone(), post);
    }

    pub fn get_post(&self, id: &str) -> Option<CommunityPost> {
        self.posts.get(id).map(|p| p.clone())
    }

    pub fn update_post<F>(&self, id: &str, apply: F) -> Option<CommunityPost>
    where
        F: FnOnce(&mut CommunityPost),
    {
        let mut entry = self.posts.get_mut(id)?;
        apply(&mut entry);
        Some(entry.clone())
    }

    pub fn delete_post(&self, id: &str) -> bool {
        if self.posts.remove(id).is_none() {
            return false;
        }
        self.post_comments.retain(|_, c| c.record.post_id != id);
        true
    }

    pub fn increment_post_view_count(&self, post_id: &str) -> Option<i64> {
        let mut post = self.posts.get_mut(post_id)?;
        post.view_count += 1;
        Some(post.view_count)
    }

    pub fn list_posts(
        &self,
        post_type: Option<CommunityType>,
        page: usize,
        per_page: usize,
    ) -> Vec<CommunityPost> {
        let mut posts: Vec<CommunityPost> = self
            .posts
            .iter()
            .filter(|p| post_type.map_or(true, |t| p.post_type == t))
            .map(|p| p.clone())
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        posts
            .into_iter()
            .skip(page.saturating_mul(per_page))
            .take(per_page)
            .collect()
    }

    // ---- community comments ----

    pub fn insert_post_comment(&self, comment: CommunityComment) {
        let seq = self.next_seq();
        self.post_comments
            .insert(comment.id.clone(), Sequenced { seq, record: comment });
    }

    pub fn get_post_comment(&self, id: &str) -> Option<CommunityComment> {
        self.post_comments.get(id).map(|c| c.record.clone())
    }

    pub fn update_post_comment<F>(&self, id: &str, apply: F) -> Option<CommunityComment>
    where
        F: FnOnce(&mut CommunityComment),
    {
        let mut entry = self.post_comments.get_mut(id)?;
        apply(&mut entry.record);
        Some(entry.record.clone())
    }

    pub fn delete_post_comment(&self, id: &str) -> bool {
        self.post_comments.remove(id).is_some()
    }

    pub fn delete_post_comment_cascade(&self, root_id: &str) -> usize {
        let before = self.post_comments.len();
        self.post_comments
            .retain(|id, c| id != root_id && c.record.parent_id.as_deref() != Some(root_id));
        before - self.post_comments.len()
    }

    pub fn comments_for_post(&self, post_id: &str) -> Vec<CommunityComment> {
        let mut rows: Vec<Sequenced<CommunityComment>> = self
            .post_comments
            .iter()
            .filter(|c| c.record.post_id == post_id)
            .map(|c| c.clone())
            .collect();
        rows.sort_by_key(|c| c.seq);
        rows.into_iter().map(|c| c.record).collect()
    }

    // ---- calendars ----

    pub fn insert_calendar(&self, calendar: Calendar) {
        self.calendars.insert(calendar.id.clone(), calendar);
    }

    pub fn get_calendar(&self, id: &str) -> Option<Calendar> {
        self.calendars.get(id).map(|c| c.clone())
    }

    pub fn update_calendar<F>(&self, id: &str, apply: F) -> Option<Calendar>
    where
        F: FnOnce(&mut Calendar),
    {
        let mut entry = self.calendars.get_mut(id)?;
        apply(&mut entry);
        Some(entry.clone())
    }

    /// Stops are embedded in the calendar row, so removing the row
    /// removes the whole itinerary.
    pub fn delete_calendar(&self, id: &str) -> bool {
        self.calendars.remove(id).is_some()
    }

    pub fn calendars_by_author(&self, author_id: &str, page: usize, per_page: usize) -> Vec<Calendar> {
        let mut calendars: Vec<Calendar> = self
            .calendars
            .iter()
            .filter(|c| c.author_id == author_id)
            .map(|c| c.clone())
            .collect();
        calendars.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        calendars
            .into_iter()
            .skip(page.saturating_mul(per_page))
            .take(per_page)
            .collect()
    }

    pub fn recent_calendars(&self, limit: usize) -> Vec<Calendar> {
        let mut calendars: Vec<Calendar> = self.calendars.iter().map(|c| c.clone()).collect();
        calendars.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        calendars.truncate(limit);
        calendars
    }

    // ---- review images ----

    pub fn add_image(&self, image: ReviewImage) {
        self.images
            .write()
            .entry(image.review_id.clone())
            .or_default()
            .push(image);
    }

    pub fn images_for_review(&self, review_id: &str) -> Vec<ReviewImage> {
        self.images
            .read()
            .get(review_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn remove_image(&self, review_id: &str, image_id: &str) -> Option<ReviewImage> {
        let mut images = self.images.write();
        let list = images.get_mut(review_id)?;
        let position = list.iter().position(|i| i.id == image_id)?;
        Some(list.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(id: &str) -> Member {
        Member {
            id: id.to_string(),
            nickname: format!("user-{}", id),
            email: format!("{}@example.com", id),
            profile_image: None,
            created_at: Utc::now(),
        }
    }

    fn review(id: &str, author: &str) -> Review {
        Review {
            id: id.to_string(),
            author_id: author.to_string(),
            title: "trip".to_string(),
            content: "notes".to_string(),
            area: Area::Seoul,
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            cost: 100_000,
            suggests: vec![],
            tags: vec![],
            is_edited: false,
            like_count: 0,
            view_count: 0,
            created_at: Utc::now(),
        }
    }

    fn comment(id: &str, review_id: &str, parent: Option<&str>) -> Comment {
        Comment {
            id: id.to_string(),
            review_id: review_id.to_string(),
            author_id: "m1".to_string(),
            parent_id: parent.map(str::to_string),
            content: "hello".to_string(),
            is_edited: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn comments_come_back_in_insertion_order() {
        let store = Store::new();
        store.insert_comment(comment("c1", "r1", None));
        store.insert_comment(comment("c2", "r1", Some("c1")));
        store.insert_comment(comment("c3", "r1", None));
        store.insert_comment(comment("x", "other", None));

        let ids: Vec<String> = store
            .comments_for_review("r1")
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn cascade_delete_removes_root_and_replies_only() {
        let store = Store::new();
        store.insert_comment(comment("root", "r1", None));
        store.insert_comment(comment("re1", "r1", Some("root")));
        store.insert_comment(comment("re2", "r1", Some("root")));
        store.insert_comment(comment("other", "r1", None));

        assert_eq!(store.delete_comment_cascade("root"), 3);
        assert_eq!(store.count_comments_for_review("r1"), 1);
        assert!(store.get_comment("other").is_some());
    }

    #[test]
    fn toggle_pairs_relation_and_counter() {
        let store = Store::new();
        store.insert_member(member("m1"));
        store.insert_review(review("r1", "m1"));

        assert_eq!(store.toggle_like("r1", "m1"), Some(LikeResult::Liked));
        assert!(store.like_exists("r1", "m1"));
        assert_eq!(store.get_review("r1").unwrap().like_count, 1);

        assert_eq!(store.toggle_like("r1", "m1"), Some(LikeResult::Unliked));
        assert!(!store.like_exists("r1", "m1"));
        assert_eq!(store.get_review("r1").unwrap().like_count, 0);
    }

    #[test]
    fn toggle_on_missing_review_reports_none() {
        let store = Store::new();
        assert_eq!(store.toggle_like("nope", "m1"), None);
    }

    #[test]
    fn concurrent_toggles_for_distinct_users_apply_every_delta() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(Store::new());
        store.insert_review(review("r1", "m1"));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    let user = format!("u{}", i);
                    // odd users end up liked, even users end up neutral
                    store.toggle_like("r1", &user);
                    if i % 2 == 0 {
                        store.toggle_like("r1", &user);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let review = store.get_review("r1").unwrap();
        assert_eq!(review.like_count, 8);
        assert_eq!(store.count_like_relations("r1") as i64, review.like_count);
    }

    #[test]
    fn deleting_a_review_clears_dependent_rows() {
        let store = Store::new();
        store.insert_member(member("m1"));
        store.insert_review(review("r1", "m1"));
        store.insert_comment(comment("c1", "r1", None));
        store.toggle_like("r1", "m1");
        store.add_image(ReviewImage {
            id: "i1".to_string(),
            review_id: "r1".to_string(),
            url: "mem://i1".to_string(),
            created_at: Utc::now(),
        });

        let images = store.delete_review("r1").unwrap();
        assert_eq!(images.len(), 1);
        assert!(store.get_review("r1").is_none());
        assert_eq!(store.count_comments_for_review("r1"), 0);
        assert_eq!(store.count_like_relations("r1"), 0);
    }
}
