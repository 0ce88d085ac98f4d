use app::{auth::Tokens, database::Database};

use crate::rate_limit::RateLimit;

pub struct RocketState {
    pub db: Database,
    pub tokens: Tokens,
    pub rate_limit: RateLimit,
}
