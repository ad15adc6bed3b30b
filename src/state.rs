use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        calendar::CalendarService, comment::CommentService, community::CommunityService,
        media::MediaService, member::MemberService, review::ReviewService, store::Store,
    },
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    /// The record store every service reads and writes through.
    pub store: Arc<Store>,

    pub member_service: MemberService,
    pub review_service: ReviewService,
    pub comment_service: CommentService,
    pub community_service: CommunityService,
    pub calendar_service: CalendarService,
    pub media_service: MediaService,
}
