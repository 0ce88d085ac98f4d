//! Routes for moving money: recharges, payments, and transaction history.

use chrono::{DateTime, Utc};
use rocket::{get, post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use app::{ledger, money::Cents, user};

use crate::{
    access,
    error::{self, JsonResult},
    state::RocketState,
};

/// Error while moving money.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please retry.
    Unknown,
    /// The amount must be positive.
    InvalidAmount,
    /// Sender and recipient are the same account.
    SelfTransfer,
    /// The recipient does not exist.
    RecipientNotFound,
    /// The sender's balance does not cover the amount.
    InsufficientFunds,
    /// The recipient's balance cannot hold the amount.
    BalanceLimitExceeded,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct RechargeRequest {
    /// Amount to add to the balance, in cents.
    amount_cents: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct RechargeResponse {
    new_balance_cents: i64,
    transaction_id: Uuid,
}

/// Add funds to the calling user's balance.
#[openapi(tag = "Payments")]
#[post("/recharge", data = "<req>")]
pub(super) async fn recharge(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    req: Json<RechargeRequest>,
) -> JsonResult<RechargeResponse, Error> {
    ledger::recharge(guard.grant(), &state.db, Cents(req.amount_cents))
        .await
        .map(|receipt| {
            Json(RechargeResponse {
                new_balance_cents: receipt.new_balance.0,
                transaction_id: receipt.transaction_id.0,
            })
        })
        .map_err(map_ledger_error)
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub(super) enum PaymentMethod {
    Transfer,
    Qr,
    Nfc,
}

impl PaymentMethod {
    fn into_method(self) -> ledger::Method {
        match self {
            PaymentMethod::Transfer => ledger::Method::Transfer,
            PaymentMethod::Qr => ledger::Method::Qr,
            PaymentMethod::Nfc => ledger::Method::Nfc,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct PaymentRequest {
    /// Recipient user id.
    to_user: Uuid,
    /// Amount to pay, in cents.
    amount_cents: i64,
    description: String,
    /// How the recipient was selected.
    method: PaymentMethod,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct PaymentResponse {
    transaction_id: Uuid,
    new_balance_cents: i64,
    /// Display name of the recipient.
    recipient: String,
}

/// Pay another user from the calling user's balance.
#[openapi(tag = "Payments")]
#[post("/pay", data = "<req>")]
pub(super) async fn pay(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    req: Json<PaymentRequest>,
) -> JsonResult<PaymentResponse, Error> {
    let req = req.into_inner();
    ledger::transfer(
        guard.grant(),
        &state.db,
        user::Id(req.to_user),
        Cents(req.amount_cents),
        req.description,
        req.method.into_method(),
    )
    .await
    .map(|transfer| {
        Json(PaymentResponse {
            transaction_id: transfer.transaction_id.0,
            new_balance_cents: transfer.new_balance.0,
            recipient: transfer.recipient_name,
        })
    })
    .map_err(map_ledger_error)
}

fn map_ledger_error(e: ledger::Error) -> crate::error::JsonError<Error> {
    match e {
        ledger::Error::InvalidAmount => {
            error::bad_request(Error::InvalidAmount, "amount must be positive".to_owned())
        }
        ledger::Error::SelfTransfer => error::bad_request(
            Error::SelfTransfer,
            "cannot transfer to yourself".to_owned(),
        ),
        ledger::Error::RecipientNotFound => {
            error::not_found(Error::RecipientNotFound, "recipient not found".to_owned())
        }
        ledger::Error::InsufficientFunds(_) => {
            error::bad_request(Error::InsufficientFunds, "insufficient funds".to_owned())
        }
        ledger::Error::BalanceOverflow(_) => error::bad_request(
            Error::BalanceLimitExceeded,
            "balance limit exceeded".to_owned(),
        ),
        ledger::Error::ConcurrencyConflict(_) => error::concurrency_error(Error::Unknown),
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct TransactionModel {
    id: Uuid,
    /// Sending user, absent for recharges.
    from_user: Option<Uuid>,
    from_name: String,
    to_user: Uuid,
    to_name: String,
    amount_cents: i64,
    description: String,
    /// Payment method tag: "transfer", "qr", "nfc", or "recharge".
    method: &'static str,
    created_at: DateTime<Utc>,
}

impl TransactionModel {
    fn from_entity(entry: ledger::HistoryEntry) -> Self {
        Self {
            id: entry.entry.id.0,
            from_user: match entry.entry.from {
                ledger::Party::System => None,
                ledger::Party::Account(id) => Some(id.0),
            },
            from_name: entry.from_name,
            to_user: entry.entry.to.0,
            to_name: entry.to_name,
            amount_cents: entry.entry.amount.0,
            description: entry.entry.description,
            method: entry.entry.method.as_str(),
            created_at: entry.entry.created,
        }
    }
}

/// List the calling user's most recent transactions, newest first, capped at 50.
#[openapi(tag = "Payments")]
#[get("/transactions")]
pub(super) async fn transactions(
    guard: access::AuthGuard,
    state: &State<RocketState>,
) -> Json<Vec<TransactionModel>> {
    Json(
        ledger::history(guard.grant(), &state.db)
            .await
            .into_iter()
            .map(TransactionModel::from_entity)
            .collect(),
    )
}
