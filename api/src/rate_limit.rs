use std::sync::Arc;

use app::user;
use dashmap::{mapref::entry::Entry, DashMap};
use std::time::Duration;

/// Sliding per-user request counter. Each accepted request increments the counter and schedules
/// the matching decrement `span` later.
pub struct RateLimit {
    limit: usize,
    span: Duration,
    counter: Arc<DashMap<user::Id, usize>>,
}

impl RateLimit {
    pub fn new(limit: usize, span: Duration) -> Self {
        Self {
            limit,
            span,
            counter: Arc::new(Default::default()),
        }
    }

    /// Returns true if the user should be rate limited, false otherwise.
    pub fn limit(&self, user_id: user::Id) -> bool {
        match self.counter.entry(user_id) {
            Entry::Occupied(mut count) => {
                let count = count.get_mut();
                if *count >= self.limit {
                    true
                } else {
                    *count += 1;
                    self.decrement_later(user_id);
                    false
                }
            }
            Entry::Vacant(e) => {
                e.insert(1);
                self.decrement_later(user_id);
                false
            }
        }
    }

    fn decrement_later(&self, user_id: user::Id) {
        let counter = Arc::clone(&self.counter);
        let span = self.span;
        tokio::spawn(async move {
            tokio::time::sleep(span).await;
            match counter.entry(user_id) {
                Entry::Occupied(mut e) => {
                    let v = e.get_mut();
                    *v -= 1;
                    if *v == 0 {
                        e.remove();
                    }
                }
                Entry::Vacant(_) => {
                    log::error!(
                        "entry should not be vacant, this is a bug. user id {:?}",
                        user_id
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn counts_the_first_request() {
        let limiter = RateLimit::new(1, Duration::from_secs(60));
        let user_id = user::Id(Uuid::new_v4());
        assert!(!limiter.limit(user_id));
        assert!(limiter.limit(user_id));
    }

    #[tokio::test]
    async fn users_are_limited_independently() {
        let limiter = RateLimit::new(1, Duration::from_secs(60));
        let first = user::Id(Uuid::new_v4());
        let second = user::Id(Uuid::new_v4());
        assert!(!limiter.limit(first));
        assert!(!limiter.limit(second));
    }
}
