//! Data models for courtside

mod booking;
mod court;
mod ids;
mod user;

pub use booking::*;
pub use court::*;
pub use ids::*;
pub use user::*;
