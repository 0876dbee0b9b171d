//! Single-flight coordinator for short-lived tokens that are renewed with a
//! longer-lived refresh credential.
//!
//! A [`Session`] sequences calls to a [`Storage`] and a [`Refresher`]: it
//! restores the stored pair, refreshes it when the token is expired (or when
//! asked to), persists the result and fans it out to every concurrent caller.

pub mod config;
pub mod errors;
pub mod refresher;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod token;

pub use config::{ConfigLocation, SessionConfig};
pub use errors::{Error, SessionError};
pub use refresher::Refresher;
pub use session::{RefreshTokenOf, Session, SessionErrorOf, SessionResult};
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
pub use token::{AutoRefreshPolicy, Expirable, RefreshCredential, RefreshablePair, Token, TokenPair};

#[cfg(test)]
mod tests;
