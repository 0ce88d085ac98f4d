//! Routes for QR payment codes and NFC tag lookup.

use rocket::{get, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

use app::{qr, user};

use crate::{
    access,
    error::{self, JsonResult},
    state::RocketState,
};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// The calling user no longer exists.
    UserNotFound,
    /// The QR payload could not be encoded.
    EncodeFailed,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct QrResponse {
    /// The payload encoded in the QR code.
    qr_data: String,
    /// Base64-encoded PNG of the QR code.
    qr_image: String,
    user_name: String,
}

/// Generate a QR code other users can scan to pay the calling user.
#[openapi(tag = "QR")]
#[get("/generate-qr")]
pub(super) async fn generate(
    guard: access::AuthGuard,
    state: &State<RocketState>,
) -> JsonResult<QrResponse, Error> {
    let user = user::get(&state.db, guard.grant().user_id)
        .await
        .ok_or_else(|| error::not_found(Error::UserNotFound, "user not found".to_owned()))?;
    let code = qr::payment_code(&user)
        .map_err(|e| error::internal_server_error(Error::EncodeFailed, e.to_string()))?;
    Ok(Json(QrResponse {
        qr_data: code.data,
        qr_image: code.image,
        user_name: user.name,
    }))
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct NfcLookupResponse {
    user_id: Uuid,
    name: String,
    nfc_id: String,
}

/// Resolve the user a physical NFC tag is bound to.
#[openapi(tag = "QR")]
#[get("/pay-by-nfc/<nfc_id>")]
pub(super) async fn pay_by_nfc(
    state: &State<RocketState>,
    nfc_id: String,
) -> Option<Json<NfcLookupResponse>> {
    user::find_by_nfc(&state.db, &user::NfcTag(nfc_id))
        .await
        .map(|user| {
            Json(NfcLookupResponse {
                user_id: user.id.0,
                name: user.name,
                // The tag is present by construction of the lookup.
                nfc_id: user.nfc_tag.unwrap().0,
            })
        })
}
