use chrono::{Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::user;

mod entities;

pub use entities::{AuthError, Claims, Grant, PasswordHash};

const TOKEN_VALIDITY_HOURS: i64 = 24;

/// Issues and validates the bearer tokens used by the API. The signing secret is loaded once at
/// startup and injected here; no other code touches it.
pub struct Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Tokens {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, user_id: user::Id) -> String {
        self.issue_with_expiry(
            user_id,
            (Utc::now() + Duration::hours(TOKEN_VALIDITY_HOURS)).timestamp(),
        )
    }

    fn issue_with_expiry(&self, user_id: user::Id, exp: i64) -> String {
        let claims = Claims {
            sub: user_id.0.to_string(),
            exp: exp as usize,
        };
        // Encoding only fails on a malformed key, which `new` cannot produce.
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding).unwrap()
    }

    pub fn validate(&self, token: &str) -> Result<Grant, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Invalid,
        })?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::Invalid)?;
        Ok(Grant {
            user_id: user::Id(user_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Tokens {
        Tokens::new(b"test-secret")
    }

    #[test]
    fn issued_token_validates() {
        let tokens = tokens();
        let user_id = user::Id(Uuid::new_v4());
        let token = tokens.issue(user_id);
        let grant = tokens.validate(&token).unwrap();
        assert_eq!(grant.user_id, user_id);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = tokens();
        let mut token = tokens.issue(user::Id(Uuid::new_v4()));
        token.push('x');
        assert!(matches!(tokens.validate(&token), Err(AuthError::Invalid)));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = Tokens::new(b"other-secret").issue(user::Id(Uuid::new_v4()));
        assert!(matches!(
            tokens().validate(&token),
            Err(AuthError::Invalid)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = tokens();
        // Well past the default validation leeway.
        let exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = tokens.issue_with_expiry(user::Id(Uuid::new_v4()), exp);
        assert!(matches!(tokens.validate(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            tokens().validate("not-a-token"),
            Err(AuthError::Invalid)
        ));
    }
}
