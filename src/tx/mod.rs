//! Transaction construction, signing and submission for inscription mints

pub mod gas;
pub mod nonce;
mod sender;

pub use nonce::{resolve_start, NonceCursor};
pub use sender::TransactionSender;
