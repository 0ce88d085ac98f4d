use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::money::Cents;

#[derive(Debug, Clone)]
pub struct Email(pub String);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(pub Uuid);

/// The identifier of a physical NFC tag bound to a user. Unique across users once assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfcTag(pub String);

#[derive(Debug)]
pub struct User {
    pub id: Id,
    pub email: Email,
    pub name: String,
    pub balance: Cents,
    pub nfc_tag: Option<NfcTag>,
    pub created: DateTime<Utc>,
}
