mod envelope;
mod expirable;
mod policy;

pub use envelope::{Token, TokenPair};
pub use expirable::{Expirable, RefreshCredential, RefreshablePair};
pub use policy::AutoRefreshPolicy;
