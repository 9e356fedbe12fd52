// handlers/public/mod.rs - routes reachable without a credential
//
// /get-cards sits behind the optional auth layer: anonymous callers are
// served, but a credential that is present must be valid.

pub mod accounts;
pub mod feed;
pub mod images;
pub mod service;

pub use accounts::{sign_in, sign_up};
pub use feed::get_cards;
pub use images::{create_image, get_image, load_image};
pub use service::{health, root};
