use std::time::Duration;

use app::auth::Tokens;
use app::database::{self, run_migrations};
#[cfg(debug_assertions)]
use app::database::seed_development_data;
use rocket::{launch, Build, Rocket};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct Config {
    database_url: Url,
    token_secret: String,
    rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize)]
struct RateLimitConfig {
    limit: usize,
    span: Duration,
}

impl RateLimitConfig {
    fn into_rate_limit(self) -> api::RateLimit {
        api::RateLimit::new(self.limit, self.span)
    }
}

#[launch]
async fn rocket() -> _ {
    start_server().await
}

async fn start_server() -> Rocket<Build> {
    env_logger::init();

    let rocket = Rocket::build();
    let config: Config = rocket.figment().extract().unwrap();

    let db = database::connect(&config.database_url).await;
    let tokens = Tokens::new(config.token_secret.as_bytes());

    run_migrations(&db).await;
    #[cfg(debug_assertions)]
    seed_development_data(&db).await;

    api::register(rocket, db, tokens, config.rate_limit.into_rate_limit())
}
