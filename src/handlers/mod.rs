// handlers/mod.rs - handlers grouped by authentication tier
//
// public:    no credential needed, or an optional one (/get-cards)
// protected: credential required (/post-a-card)

pub mod protected;
pub mod public;
