pub mod auth;

pub use auth::{optional_auth, required_auth, AuthPolicy, CallerIdentity};
