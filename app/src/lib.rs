pub mod auth;
mod balance;
mod concurrency;
pub mod database;
pub mod ledger;
pub mod money;
pub mod qr;
pub mod user;
