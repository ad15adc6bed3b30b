use serde::{Deserialize, Serialize};
use std::env;

use crate::services::comment::ModerationPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub log_level: String,

    // Listing defaults
    pub default_reviews_per_page: usize,

    // Who may edit or delete a comment: the review's author or the
    // comment's author. See DESIGN.md; pending product clarification.
    pub comment_moderation_policy: ModerationPolicy,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "wayfarer=debug,tower_http=debug".to_string()),

            default_reviews_per_page: env::var("DEFAULT_REVIEWS_PER_PAGE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            comment_moderation_policy: env::var("COMMENT_MODERATION_POLICY")
                .unwrap_or_else(|_| "review_author".to_string())
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_environment() {
        let config = Config::from_env().unwrap();

        assert!(!config.log_level.is_empty());
        assert!(config.default_reviews_per_page > 0);
        assert_eq!(config.comment_moderation_policy, ModerationPolicy::ReviewAuthor);
    }
}
