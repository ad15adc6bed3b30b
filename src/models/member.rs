use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub nickname: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterMemberRequest {
    #[validate(length(min = 1, max = 40))]
    pub nickname: String,
    #[validate(email)]
    pub email: String,
    pub profile_image: Option<String>,
}
