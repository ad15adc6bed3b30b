pub mod calendar;
pub mod comment;
pub mod community;
pub mod like;
pub mod media;
pub mod member;
pub mod review;
