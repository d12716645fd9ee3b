//! Request extractors.

pub mod payload;
pub mod upload;
pub mod user;

pub use payload::Payload;
pub use user::User;
