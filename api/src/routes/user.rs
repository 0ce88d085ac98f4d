//! Routes for registration, login, and user information.

use rocket::{get, post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use app::{auth, user};

use crate::{
    access,
    error::{self, JsonResult},
    state::RocketState,
};

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct UserModel {
    /// Unique user identifier.
    id: Uuid,
    /// Registered user email.
    email: String,
    /// Display name.
    name: String,
    /// Current balance in cents.
    balance_cents: i64,
    /// NFC tag bound to this user, if any.
    nfc_id: Option<String>,
}

impl UserModel {
    pub(super) fn from_entity(user: &user::User) -> Self {
        Self {
            id: user.id.0,
            email: user.email.0.clone(),
            name: user.name.clone(),
            balance_cents: user.balance.0,
            nfc_id: user.nfc_tag.as_ref().map(|tag| tag.0.clone()),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct SessionResponse {
    /// Bearer token for authenticated requests, valid for 24 hours.
    token: String,
    user: UserModel,
}

/// Error during registration or login.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please retry.
    Unknown,
    /// The email is missing or malformed.
    InvalidEmail,
    /// The display name is missing.
    InvalidName,
    /// The password is missing.
    InvalidPassword,
    /// The email is already registered.
    EmailTaken,
    /// Wrong email or password.
    InvalidCredentials,
    /// The NFC tag id is missing.
    InvalidNfcTag,
    /// The NFC tag is bound to another user.
    NfcTagTaken,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct RegisterRequest {
    email: String,
    name: String,
    password: String,
}

/// Create an account. The new account starts with a zero balance.
#[openapi(tag = "User")]
#[post("/register", data = "<req>")]
pub(super) async fn register(
    state: &State<RocketState>,
    req: Json<RegisterRequest>,
) -> JsonResult<SessionResponse, Error> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(error::bad_request(
            Error::InvalidEmail,
            "a valid email is required".to_owned(),
        ));
    }
    if req.name.trim().is_empty() {
        return Err(error::bad_request(
            Error::InvalidName,
            "a display name is required".to_owned(),
        ));
    }
    if req.password.is_empty() {
        return Err(error::bad_request(
            Error::InvalidPassword,
            "a password is required".to_owned(),
        ));
    }
    let password_hash = auth::PasswordHash::generate(&req.password);
    let user = user::create(
        &state.db,
        user::Email(email.to_owned()),
        req.name.trim().to_owned(),
        password_hash,
    )
    .await
    .map_err(|e| match e {
        user::Error::EmailTaken => {
            error::bad_request(Error::EmailTaken, "email is already in use".to_owned())
        }
        _ => error::internal_server_error(Error::Unknown, e.to_string()),
    })?;
    Ok(Json(SessionResponse {
        token: state.tokens.issue(user.id),
        user: UserModel::from_entity(&user),
    }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

/// Log in with email and password.
#[openapi(tag = "User")]
#[post("/login", data = "<req>")]
pub(super) async fn login(
    state: &State<RocketState>,
    req: Json<LoginRequest>,
) -> JsonResult<SessionResponse, Error> {
    let user = user::login(&state.db, req.email.trim(), &req.password)
        .await
        .map_err(|e| match e {
            user::Error::InvalidCredentials => error::unauthorized(
                Error::InvalidCredentials,
                "invalid email or password".to_owned(),
            ),
            _ => error::internal_server_error(Error::Unknown, e.to_string()),
        })?;
    Ok(Json(SessionResponse {
        token: state.tokens.issue(user.id),
        user: UserModel::from_entity(&user),
    }))
}

/// Get the calling user's record, including the current balance.
#[openapi(tag = "User")]
#[get("/profile")]
pub(super) async fn profile(
    guard: access::AuthGuard,
    state: &State<RocketState>,
) -> Option<Json<UserModel>> {
    user::get(&state.db, guard.grant().user_id)
        .await
        .map(|user| Json(UserModel::from_entity(&user)))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct NfcRegisterRequest {
    nfc_id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct NfcRegisterResponse {
    nfc_id: String,
}

/// Bind an NFC tag to the calling user. Re-registering your own tag succeeds.
#[openapi(tag = "User")]
#[post("/register-nfc", data = "<req>")]
pub(super) async fn register_nfc(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    req: Json<NfcRegisterRequest>,
) -> JsonResult<NfcRegisterResponse, Error> {
    let nfc_id = req.nfc_id.trim();
    if nfc_id.is_empty() {
        return Err(error::bad_request(
            Error::InvalidNfcTag,
            "an NFC tag id is required".to_owned(),
        ));
    }
    user::set_nfc_tag(guard.grant(), &state.db, user::NfcTag(nfc_id.to_owned()))
        .await
        .map_err(|e| match e {
            user::Error::NfcTagTaken => error::bad_request(
                Error::NfcTagTaken,
                "NFC tag is already in use by another user".to_owned(),
            ),
            _ => error::internal_server_error(Error::Unknown, e.to_string()),
        })?;
    Ok(Json(NfcRegisterResponse {
        nfc_id: nfc_id.to_owned(),
    }))
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct SearchResult {
    id: Uuid,
    name: String,
    email: String,
}

/// Search users by name or email. Queries shorter than two characters return nothing; the caller
/// is never included in the results.
#[openapi(tag = "User")]
#[get("/users/search?<q>")]
pub(super) async fn search(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    q: Option<String>,
) -> Json<Vec<SearchResult>> {
    let query = q.unwrap_or_default();
    Json(
        user::search(guard.grant(), &state.db, query.trim())
            .await
            .into_iter()
            .map(|user| SearchResult {
                id: user.id.0,
                name: user.name,
                email: user.email.0,
            })
            .collect(),
    )
}
