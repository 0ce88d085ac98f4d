use okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket::{
    async_trait,
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use rocket_okapi::{
    gen::OpenApiGenerator,
    request::{OpenApiFromRequest, RequestHeaderInput},
};
use thiserror::Error;

use crate::state::RocketState;

const AUTH_HEADER: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// Request guard for authenticated routes. Succeeds only for a well-formed bearer token that the
/// token service accepts; the wrapped grant identifies the caller.
pub struct AuthGuard(app::auth::Grant);

impl AuthGuard {
    pub fn grant(&self) -> &app::auth::Grant {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    AuthFailed(#[from] app::auth::AuthError),
    #[error("missing bearer token")]
    MissingToken,
    #[error("rate limit exceeded")]
    RateLimited,
}

#[async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match bearer_token(req) {
            Some(token) => token,
            None => return Outcome::Error((Status::Unauthorized, Error::MissingToken)),
        };
        let state = req.rocket().state::<RocketState>().unwrap();
        match state.tokens.validate(token) {
            Ok(grant) => {
                if state.rate_limit.limit(grant.user_id) {
                    log::info!("rate limiting user {:?}", grant.user_id);
                    Outcome::Error((Status::TooManyRequests, Error::RateLimited))
                } else {
                    Outcome::Success(AuthGuard(grant))
                }
            }
            Err(e) => Outcome::Error((Status::Unauthorized, e.into())),
        }
    }
}

fn bearer_token<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    req.headers()
        .get_one(AUTH_HEADER)?
        .strip_prefix(BEARER_PREFIX)
}

impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        let security_scheme = SecurityScheme {
            description: Some("Requires a bearer token issued by /api/login or /api/register.".to_owned()),
            data: SecuritySchemeData::Http {
                scheme: "bearer".to_owned(),
                bearer_format: Some("JWT".to_owned()),
            },
            extensions: Object::default(),
        };
        let mut security_req = SecurityRequirement::new();
        security_req.insert(AUTH_HEADER.to_owned(), Vec::new());
        Ok(RequestHeaderInput::Security(
            AUTH_HEADER.to_owned(),
            security_scheme,
            security_req,
        ))
    }
}
