pub mod image;
pub mod listing;
pub mod user;

pub use image::NewImage;
pub use listing::{ListingRow, NewListing};
pub use user::User;
