// handlers/protected/mod.rs - routes that require a valid credential
//
// The required auth layer inserts `Extension<Identity>` before these run.

pub mod cards;

pub use cards::post_a_card;
