use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::media::ReviewImage,
    services::store::Store,
};

/// The blob collaborator: takes bytes, hands back a retrievable URL,
/// deletes by that URL. The surrounding deployment decides what sits
/// behind it (S3, a CDN, ...); the service only needs this seam.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String>;
    async fn delete(&self, url: &str) -> Result<()>;
}

/// Process-local blob store for development and tests.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        InMemoryBlobStore::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("mem://{}", key);
        self.blobs.insert(url.clone(), bytes);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.blobs.remove(url);
        Ok(())
    }
}

#[derive(Clone)]
pub struct MediaService {
    store: Arc<Store>,
    blobs: Arc<dyn BlobStore>,
}

impl MediaService {
    pub fn new(store: Arc<Store>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Streams uploaded bytes to the blob store and records the
    /// resulting URL against the review.
    pub async fn upload_review_image(
        &self,
        review_id: &str,
        requester_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ReviewImage> {
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
        if bytes.is_empty() {
            return Err(AppError::FileUpload("empty upload".to_string()));
        }

        let key = format!("reviews/{}/{}-{}", review_id, Uuid::new_v4(), filename);
        let url = self.blobs.put(&key, bytes).await?;
        debug!("Stored image for review {} at {}", review_id, url);

        let image = ReviewImage {
            id: Store::next_id(),
            review_id: review_id.to_string(),
            url,
            created_at: Utc::now(),
        };
        self.store.add_image(image.clone());
        Ok(image)
    }

    pub async fn delete_review_image(
        &self,
        review_id: &str,
        image_id: &str,
        requester_id: &str,
    ) -> Result<()> {
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

        let image = self
            .store
            .remove_image(review_id, image_id)
            .ok_or_else(|| AppError::not_found("Image", image_id))?;
        self.blobs.delete(&image.url).await
    }

    /// Releases the blobs behind already-removed image records, e.g.
    /// after a review delete. Store rows are gone at this point, so a
    /// blob failure is logged rather than resurrected.
    pub async fn release_blobs(&self, images: &[ReviewImage]) -> Result<()> {
        for image in images {
            if let Err(e) = self.blobs.delete(&image.url).await {
                warn!("Failed to delete blob {}: {}", image.url, e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::Member;
    use crate::models::review::{Area, Review};
    use chrono::NaiveDate;

    fn seed(store: &Store) -> String {
        store.insert_member(Member {
            id: "m1".to_string(),
            nickname: "author".to_string(),
            email: "author@example.com".to_string(),
            profile_image: None,
            created_at: Utc::now(),
        });
        let review = Review {
            id: "r1".to_string(),
            author_id: "m1".to_string(),
            title: "trip".to_string(),
            content: "notes".to_string(),
            area: Area::Gangwon,
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            cost: 90_000,
            suggests: vec![],
            tags: vec![],
            is_edited: false,
            like_count: 0,
            view_count: 0,
            created_at: Utc::now(),
        };
        store.insert_review(review);
        "r1".to_string()
    }

    #[tokio::test]
    async fn upload_records_a_url_and_delete_releases_it() {
        let store = Arc::new(Store::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let media = MediaService::new(store.clone(), blobs.clone());
        let review_id = seed(&store);

        let image = media
            .upload_review_image(&review_id, "m1", "beach.jpg", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(image.url.starts_with("mem://"));
        assert_eq!(store.images_for_review(&review_id).len(), 1);
        assert_eq!(blobs.len(), 1);

        media
            .delete_review_image(&review_id, &image.id, "m1")
            .await
            .unwrap();
        assert!(store.images_for_review(&review_id).is_empty());
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn only_the_review_author_may_manage_images() {
        let store = Arc::new(Store::new());
        let media = MediaService::new(store.clone(), Arc::new(InMemoryBlobStore::new()));
        let review_id = seed(&store);

        let result = media
            .upload_review_image(&review_id, "intruder", "x.jpg", vec![1])
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
