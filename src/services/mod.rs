pub mod calendar;
pub mod comment;
pub mod community;
pub mod media;
pub mod member;
pub mod organizer;
pub mod review;
pub mod store;

// Re-export the service types the rest of the crate wires together
pub use calendar::CalendarService;
pub use comment::CommentService;
pub use community::CommunityService;
pub use media::MediaService;
pub use member::MemberService;
pub use review::ReviewService;
pub use store::Store;
