use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::member::{Member, RegisterMemberRequest},
    services::store::Store,
};

#[derive(Clone)]
pub struct MemberService {
    store: Arc<Store>,
}

impl MemberService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn register(&self, request: RegisterMemberRequest) -> Result<Member> {
        request.validate()?;
        if self.store.email_taken(&request.email) {
            return Err(AppError::Conflict(format!(
                "email {} is already registered",
                request.email
            )));
        }
        debug!("Registering member {}", request.nickname);

        let member = Member {
            id: Store::next_id(),
            nickname: request.nickname,
            email: request.email,
            profile_image: request.profile_image,
            created_at: Utc::now(),
        };
        self.store.insert_member(member.clone());
        Ok(member)
    }

    pub async fn get_member(&self, member_id: &str) -> Result<Member> {
        self.store
            .get_member(member_id)
            .ok_or_else(|| AppError::not_found("Member", member_id))
    }
}
