pub mod auth;
pub mod booking;
pub mod catalog;
pub mod users;

pub use auth::{TokenKind, TokenPair, TokenService};
pub use booking::BookingService;
pub use catalog::CatalogService;
pub use users::UserService;
