pub mod auth;
pub mod crypto;
pub mod engagement;
pub mod filter;
pub mod log;
pub mod marker;
pub mod notification;
pub mod party;
pub mod user;
