pub mod calendars;
pub mod comments;
pub mod communities;
pub mod diagnostics;
pub mod media;
pub mod members;
pub mod reviews;
